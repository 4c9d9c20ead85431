//! Vertex types

use bytemuck::{Pod, Zeroable};

/// Vertex with position and normal.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct VertexPN {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl VertexPN {
    pub const fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }

    /// Size of one vertex in bytes.
    pub const STRIDE: wgpu::BufferAddress = std::mem::size_of::<VertexPN>() as wgpu::BufferAddress;

    /// Position attribute bound to the given shader location.
    pub const fn position_attribute(location: u32) -> wgpu::VertexAttribute {
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: location,
            format: wgpu::VertexFormat::Float32x3,
        }
    }

    /// Normal attribute bound to the given shader location.
    pub const fn normal_attribute(location: u32) -> wgpu::VertexAttribute {
        wgpu::VertexAttribute {
            offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            shader_location: location,
            format: wgpu::VertexFormat::Float32x3,
        }
    }

    /// Buffer layout over the given attributes.
    pub fn layout(attributes: &[wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: Self::STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}
