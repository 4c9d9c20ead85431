//! Geometry module
//!
//! CPU-side mesh data shared by both render backends, plus GPU upload.

mod mesh;

pub use mesh::{generate_cube, generate_plane, generate_point_light_marker, GpuMesh};

use crate::core::buffer::{IndexBuffer, VertexBuffer};
use crate::core::vertex::VertexPN;
use glam::Vec3;

/// Opaque reference to a mesh uploaded to a render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub(crate) usize);

impl MeshHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Immutable triangle mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Triangle list; every three indices form one counter-clockwise triangle.
    pub indices: Vec<u32>,
    /// Number of triangles.
    pub primitive_count: u32,
}

impl MeshData {
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>, indices: Vec<u32>) -> Self {
        debug_assert_eq!(positions.len(), normals.len());
        debug_assert_eq!(indices.len() % 3, 0);
        let primitive_count = (indices.len() / 3) as u32;
        Self {
            positions,
            normals,
            indices,
            primitive_count,
        }
    }

    /// Interleave positions and normals into GPU vertices.
    pub fn vertices(&self) -> Vec<VertexPN> {
        self.positions
            .iter()
            .zip(&self.normals)
            .map(|(p, n)| VertexPN::new(p.to_array(), n.to_array()))
            .collect()
    }

    /// Iterate over triangles as vertex index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
    }
}

/// Trait for drawable GPU geometry.
pub trait Geometry {
    /// Get the vertex buffer.
    fn vertex_buffer(&self) -> &VertexBuffer;

    /// Get the index buffer.
    fn index_buffer(&self) -> &IndexBuffer;

    /// Draw the geometry using the given render pass.
    fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer().slice());
        render_pass.set_index_buffer(self.index_buffer().slice(), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_buffer().count(), 0, 0..1);
    }
}
