//! Render backend abstraction
//!
//! The orchestrator drives a frame through this trait; the GPU and software
//! renderers both implement it with the same pass structure.

use crate::config::DepthEncoding;
use crate::core::tracker::ResourceTracker;
use crate::error::Result;
use crate::renderer::geometry::{MeshData, MeshHandle};
use crate::renderer::params::{DrawItem, GlobalState, ShadingPassParams, ShadowPassParams};
use std::sync::Arc;

/// A renderer that can execute the two passes of a frame.
///
/// A frame is `begin_frame`, `shadow_pass`, `shading_pass`, `present`, in that
/// order. The shading pass reads what the shadow pass of the same frame wrote.
pub trait RenderBackend {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Encoding the depth target is written with.
    fn encoding(&self) -> DepthEncoding;

    /// Tracker counting live depth-target allocations.
    fn tracker(&self) -> &ResourceTracker;

    /// Apply viewport, clear colour and pipeline state.
    fn apply_global_state(&mut self, state: &GlobalState) -> Result<()>;

    /// Make a mesh available to both passes.
    fn upload_mesh(&mut self, mesh: Arc<MeshData>) -> Result<MeshHandle>;

    /// Reallocate the depth target at the given size.
    fn rebuild_depth_target(&mut self, width: u32, height: u32) -> Result<()>;

    /// Acquire the output image for a new frame.
    fn begin_frame(&mut self) -> Result<()>;

    /// Render shadow casters into the depth target. Returns the number of draws.
    fn shadow_pass(&mut self, draws: &[DrawItem], params: &ShadowPassParams) -> Result<usize>;

    /// Render the visible image. Returns the number of draws.
    fn shading_pass(&mut self, draws: &[DrawItem], params: &ShadingPassParams) -> Result<usize>;

    /// Finish the frame and make it visible.
    fn present(&mut self) -> Result<()>;

    /// Release every resource. The backend is unusable afterwards.
    fn destroy(&mut self);
}
