//! Software renderer
//!
//! A deterministic CPU implementation of both passes. It follows the GPU
//! renderer's conventions (clip depth in `[0, 1]`, counter-clockwise front
//! faces, texel-exact shadow lookups) and is used for headless rendering,
//! tests and benchmarks.

pub mod framebuffer;
pub mod passes;
pub mod raster;
pub mod target;

pub use framebuffer::Framebuffer;
pub use target::{BoundTarget, DepthTargetReader, DepthTargetWriter, SoftwareDepthTarget};

use crate::config::DepthEncoding;
use crate::core::tracker::ResourceTracker;
use crate::error::{RenderError, Result};
use crate::frame::RenderBackend;
use crate::renderer::camera::Viewport;
use crate::renderer::geometry::{MeshData, MeshHandle};
use crate::renderer::params::{DrawItem, GlobalState, ShadingPassParams, ShadowPassParams};
use std::sync::Arc;

/// Texture unit the shading pass reads the depth target from.
const SHADOW_MAP_UNIT: u32 = 0;

/// CPU implementation of [`RenderBackend`].
pub struct SoftwareRenderer {
    state: GlobalState,
    sampling_encoding: DepthEncoding,
    meshes: Vec<Arc<MeshData>>,
    depth_target: SoftwareDepthTarget,
    back: Framebuffer,
    front: Framebuffer,
    bound: BoundTarget,
    tracker: ResourceTracker,
    in_frame: bool,
}

impl SoftwareRenderer {
    pub fn new(width: u32, height: u32, encoding: DepthEncoding) -> Self {
        let tracker = ResourceTracker::new();
        let viewport = Viewport::new(width, height);
        Self {
            state: GlobalState::new(viewport, [0.0, 0.0, 0.0, 1.0]),
            sampling_encoding: encoding,
            meshes: Vec::new(),
            depth_target: SoftwareDepthTarget::new(encoding, tracker.clone()),
            back: Framebuffer::new(width, height),
            front: Framebuffer::new(width, height),
            bound: BoundTarget::Screen,
            tracker,
            in_frame: false,
        }
    }

    /// Limit the depth target size; larger rebuilds fail as an allocation would.
    pub fn with_max_target_dimension(mut self, max_dimension: u32) -> Self {
        let encoding = self.depth_target.encoding();
        self.depth_target =
            SoftwareDepthTarget::new(encoding, self.tracker.clone()).with_max_dimension(max_dimension);
        self
    }

    /// Read the depth target with a different encoding than it is written with.
    pub fn with_sampling_encoding(mut self, encoding: DepthEncoding) -> Self {
        self.sampling_encoding = encoding;
        self
    }

    /// The most recently presented frame.
    pub fn last_frame(&self) -> &Framebuffer {
        &self.front
    }

    pub fn depth_target(&self) -> &SoftwareDepthTarget {
        &self.depth_target
    }

    /// Image currently receiving draws.
    pub fn bound_target(&self) -> BoundTarget {
        self.bound
    }

    pub fn global_state(&self) -> &GlobalState {
        &self.state
    }
}

impl RenderBackend for SoftwareRenderer {
    fn name(&self) -> &'static str {
        "software"
    }

    fn encoding(&self) -> DepthEncoding {
        self.depth_target.encoding()
    }

    fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    fn apply_global_state(&mut self, state: &GlobalState) -> Result<()> {
        if state.viewport != self.state.viewport && !state.viewport.is_empty() {
            let Viewport { width, height } = state.viewport;
            self.back = Framebuffer::new(width, height);
            self.front = Framebuffer::new(width, height);
        }
        self.state = *state;
        Ok(())
    }

    fn upload_mesh(&mut self, mesh: Arc<MeshData>) -> Result<MeshHandle> {
        self.meshes.push(mesh);
        Ok(MeshHandle(self.meshes.len() - 1))
    }

    fn rebuild_depth_target(&mut self, width: u32, height: u32) -> Result<()> {
        self.depth_target.rebuild(width, height)
    }

    fn begin_frame(&mut self) -> Result<()> {
        self.back.clear(self.state.clear_color, 1.0);
        self.in_frame = true;
        Ok(())
    }

    fn shadow_pass(&mut self, draws: &[DrawItem], params: &ShadowPassParams) -> Result<usize> {
        let mut writer = self.depth_target.bind_as_render_target(&mut self.bound)?;
        Ok(passes::render_shadow_map(
            &mut writer,
            &self.meshes,
            draws,
            params,
            &self.state,
        ))
    }

    fn shading_pass(&mut self, draws: &[DrawItem], params: &ShadingPassParams) -> Result<usize> {
        let reader = self
            .depth_target
            .bind_as_readable_texture(SHADOW_MAP_UNIT, self.sampling_encoding)?;
        Ok(passes::render_shading(
            &mut self.back,
            &reader,
            &self.meshes,
            draws,
            params,
            &self.state,
        ))
    }

    fn present(&mut self) -> Result<()> {
        if !self.in_frame {
            return Err(RenderError::resource("no frame in flight"));
        }
        std::mem::swap(&mut self.back, &mut self.front);
        self.in_frame = false;
        Ok(())
    }

    fn destroy(&mut self) {
        self.depth_target.release();
        self.meshes.clear();
        self.in_frame = false;
        tracing::info!("Destroyed software renderer");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::geometry::generate_plane;
    use glam::{Mat4, Vec3, Vec4};

    #[test]
    fn test_shadow_pass_restores_screen_binding() {
        let mut renderer = SoftwareRenderer::new(8, 8, DepthEncoding::Native);
        renderer.rebuild_depth_target(8, 8).unwrap();
        let plane = renderer
            .upload_mesh(Arc::new(generate_plane(1.0, 1.0)))
            .unwrap();
        let draws = [DrawItem {
            mesh: plane,
            model: Mat4::IDENTITY,
            color: Vec4::ONE,
            casts_shadow: true,
        }];
        let params = ShadowPassParams {
            light_view: Mat4::look_at_rh(Vec3::new(0.0, 3.0, 0.0), Vec3::ZERO, Vec3::Z),
            light_projection: Mat4::perspective_rh(1.5, 1.0, 1.0, 10.0),
        };
        renderer.begin_frame().unwrap();
        assert_eq!(renderer.shadow_pass(&draws, &params).unwrap(), 1);
        assert_eq!(renderer.bound_target(), BoundTarget::Screen);
    }

    #[test]
    fn test_shadow_pass_without_target_fails() {
        let mut renderer = SoftwareRenderer::new(8, 8, DepthEncoding::Native);
        let params = ShadowPassParams {
            light_view: Mat4::IDENTITY,
            light_projection: Mat4::IDENTITY,
        };
        let err = renderer.shadow_pass(&[], &params).unwrap_err();
        assert!(matches!(err, RenderError::RenderResource(_)));
        assert_eq!(renderer.bound_target(), BoundTarget::Screen);
    }

    #[test]
    fn test_present_swaps_buffers() {
        let mut renderer = SoftwareRenderer::new(2, 2, DepthEncoding::Native);
        let mut state = *renderer.global_state();
        state.clear_color = [1.0, 0.0, 0.0, 1.0];
        renderer.apply_global_state(&state).unwrap();
        assert!(renderer.present().is_err());
        renderer.begin_frame().unwrap();
        renderer.present().unwrap();
        assert_eq!(renderer.last_frame().color(1, 1), Vec4::new(1.0, 0.0, 0.0, 1.0));
    }
}
