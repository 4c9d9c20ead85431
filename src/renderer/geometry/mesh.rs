//! Mesh geometry
//!
//! Primitive generators and GPU mesh upload.

use super::{Geometry, MeshData};
use crate::context::WgpuContext;
use crate::core::buffer::{IndexBuffer, VertexBuffer};
use glam::Vec3;
use std::f32::consts::PI;

/// A mesh uploaded to GPU buffers.
pub struct GpuMesh {
    vertex_buffer: VertexBuffer,
    index_buffer: IndexBuffer,
}

impl GpuMesh {
    /// Upload mesh data.
    pub fn upload(ctx: &WgpuContext, mesh: &MeshData, label: Option<&str>) -> Self {
        let vertices = mesh.vertices();
        Self {
            vertex_buffer: VertexBuffer::new(ctx, &vertices, label),
            index_buffer: IndexBuffer::new_u32(ctx, &mesh.indices, label),
        }
    }
}

impl Geometry for GpuMesh {
    fn vertex_buffer(&self) -> &VertexBuffer {
        &self.vertex_buffer
    }

    fn index_buffer(&self) -> &IndexBuffer {
        &self.index_buffer
    }
}

/// Axis-aligned cube centered at the origin.
pub fn generate_cube(half_extent: f32) -> MeshData {
    let h = half_extent;
    // (normal, four corners counter-clockwise when seen from outside)
    let faces: [(Vec3, [Vec3; 4]); 6] = [
        (
            Vec3::Z,
            [
                Vec3::new(-h, -h, h),
                Vec3::new(h, -h, h),
                Vec3::new(h, h, h),
                Vec3::new(-h, h, h),
            ],
        ),
        (
            Vec3::NEG_Z,
            [
                Vec3::new(h, -h, -h),
                Vec3::new(-h, -h, -h),
                Vec3::new(-h, h, -h),
                Vec3::new(h, h, -h),
            ],
        ),
        (
            Vec3::Y,
            [
                Vec3::new(-h, h, h),
                Vec3::new(h, h, h),
                Vec3::new(h, h, -h),
                Vec3::new(-h, h, -h),
            ],
        ),
        (
            Vec3::NEG_Y,
            [
                Vec3::new(-h, -h, -h),
                Vec3::new(h, -h, -h),
                Vec3::new(h, -h, h),
                Vec3::new(-h, -h, h),
            ],
        ),
        (
            Vec3::X,
            [
                Vec3::new(h, -h, h),
                Vec3::new(h, -h, -h),
                Vec3::new(h, h, -h),
                Vec3::new(h, h, h),
            ],
        ),
        (
            Vec3::NEG_X,
            [
                Vec3::new(-h, -h, -h),
                Vec3::new(-h, -h, h),
                Vec3::new(-h, h, h),
                Vec3::new(-h, h, -h),
            ],
        ),
    ];

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, corners) in faces {
        let base = positions.len() as u32;
        positions.extend_from_slice(&corners);
        normals.extend_from_slice(&[normal; 4]);
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData::new(positions, normals, indices)
}

/// Flat rectangle in the XZ plane facing +Y.
pub fn generate_plane(half_width: f32, half_depth: f32) -> MeshData {
    let positions = vec![
        Vec3::new(-half_width, 0.0, -half_depth),
        Vec3::new(half_width, 0.0, -half_depth),
        Vec3::new(half_width, 0.0, half_depth),
        Vec3::new(-half_width, 0.0, half_depth),
    ];
    let normals = vec![Vec3::Y; 4];
    let indices = vec![0, 2, 1, 0, 3, 2];
    MeshData::new(positions, normals, indices)
}

/// Small UV sphere used to visualize the light position.
pub fn generate_point_light_marker(radius: f32, segments: u32) -> MeshData {
    let segments = segments.max(3);
    let rings = (segments / 2).max(2);

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    for ring in 0..=rings {
        let phi = PI * ring as f32 / rings as f32;
        let y = phi.cos();
        let ring_radius = phi.sin();

        for segment in 0..=segments {
            let theta = 2.0 * PI * segment as f32 / segments as f32;
            let normal = Vec3::new(ring_radius * theta.cos(), y, ring_radius * theta.sin());
            positions.push(normal * radius);
            normals.push(normal);
        }
    }

    let mut indices = Vec::new();
    for ring in 0..rings {
        for segment in 0..segments {
            let current = ring * (segments + 1) + segment;
            let next = current + segments + 1;

            indices.extend_from_slice(&[current, current + 1, next]);
            indices.extend_from_slice(&[current + 1, next + 1, next]);
        }
    }

    MeshData::new(positions, normals, indices)
}
