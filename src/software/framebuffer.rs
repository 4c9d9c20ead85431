//! CPU color framebuffer

use crate::renderer::geometry::MeshHandle;
use glam::Vec4;

/// Color, depth and mesh-id planes of the visible image.
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    color: Vec<Vec4>,
    depth: Vec<f32>,
    mesh: Vec<Option<MeshHandle>>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![Vec4::ZERO; len],
            depth: vec![1.0; len],
            mesh: vec![None; len],
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn clear(&mut self, color: [f32; 4], depth: f32) {
        self.color.fill(Vec4::from_array(color));
        self.depth.fill(depth);
        self.mesh.fill(None);
    }

    pub fn depth(&self, x: u32, y: u32) -> f32 {
        self.depth[self.index(x, y)]
    }

    pub fn color(&self, x: u32, y: u32) -> Vec4 {
        self.color[self.index(x, y)]
    }

    /// Mesh that produced the pixel, if any.
    pub fn mesh(&self, x: u32, y: u32) -> Option<MeshHandle> {
        self.mesh[self.index(x, y)]
    }

    pub(crate) fn write(&mut self, x: u32, y: u32, depth: f32, color: Vec4, mesh: MeshHandle) {
        let i = self.index(x, y);
        self.depth[i] = depth;
        self.color[i] = color;
        self.mesh[i] = Some(mesh);
    }

    /// Color plane quantized to RGBA8, row by row from the top.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.color
            .iter()
            .flat_map(|c| {
                c.clamp(Vec4::ZERO, Vec4::ONE)
                    .to_array()
                    .map(|v| (v * 255.0).round() as u8)
            })
            .collect()
    }
}
