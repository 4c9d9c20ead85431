//! Frame orchestration
//!
//! [`FrameOrchestrator`] owns the cameras, the scene and the animation state,
//! and drives a [`RenderBackend`] through the shadow pass, the shading pass
//! and presentation once per frame.

mod backend;
mod scene;

pub use backend::RenderBackend;
pub use scene::Scene;

use crate::config::SceneConfig;
use crate::error::{RenderError, Result};
use crate::renderer::camera::{Camera, Viewport};
use crate::renderer::light::LightingParameters;
use crate::renderer::params::{DrawItem, GlobalState, ShadingPassParams, ShadowPassParams};
use crate::renderer::shadow::{verify_depth_codec, ShadowTransformBundle};
use glam::Vec3;
use std::time::Instant;

/// Outcome of [`FrameOrchestrator::render_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Rendered,
    /// Nothing was presented; the next frame retries.
    Skipped,
}

/// Wrap `degrees` into `[0, 360)`.
///
/// `rem_euclid` rounds tiny negative inputs up to exactly 360.
fn wrap_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Drives a backend through create, resize, render and destroy.
pub struct FrameOrchestrator<B: RenderBackend> {
    backend: B,
    config: SceneConfig,
    eye: Camera,
    light: Camera,
    shadow: ShadowTransformBundle,
    lighting: LightingParameters,
    scene: Scene,
    state: GlobalState,
    angle: f32,
    target_stale: bool,
    destroyed: bool,
}

impl<B: RenderBackend> FrameOrchestrator<B> {
    /// Validate `config`, build both cameras and upload the scene.
    ///
    /// Nothing is drawn until the first [`Self::resize`] provides a viewport.
    pub fn create(mut backend: B, config: SceneConfig) -> Result<Self> {
        config.validate()?;
        if backend.encoding() != config.encoding {
            return Err(RenderError::EncodingMismatch {
                written: backend.encoding(),
                read: config.encoding,
            });
        }
        if cfg!(debug_assertions) {
            verify_depth_codec(backend.encoding(), config.encoding)?;
        }

        let lighting = config.lighting();
        let eye = Camera::new(
            lighting.eye_position,
            Vec3::ZERO,
            Vec3::Y,
            config.near,
            config.far,
        )?;
        let light = Camera::new(
            lighting.light_position,
            Vec3::ZERO,
            Vec3::Y,
            config.near,
            config.far,
        )?;

        let scene = Scene::upload(&mut backend, &config)?;
        let state = GlobalState::new(Viewport::new(0, 0), config.clear_color);
        backend.apply_global_state(&state)?;

        tracing::info!(
            "Created {} frame orchestrator ({} depth, bias {})",
            backend.name(),
            config.encoding,
            config.depth_bias
        );

        Ok(Self {
            shadow: ShadowTransformBundle::new(light.view_matrix(), light.projection_matrix()),
            angle: wrap_degrees(config.initial_angle),
            backend,
            config,
            eye,
            light,
            lighting,
            scene,
            state,
            target_stale: true,
            destroyed: false,
        })
    }

    /// Adapt to a new framebuffer size. Zero sizes are ignored.
    ///
    /// A failed depth-target rebuild is not an error here; the frame loop
    /// retries it.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            tracing::debug!("Ignoring resize to {}x{}", width, height);
            return Ok(());
        }

        let viewport = Viewport::new(width, height);
        self.eye.set_viewport(viewport);
        self.light.set_viewport(viewport);
        self.shadow =
            ShadowTransformBundle::new(self.light.view_matrix(), self.light.projection_matrix());
        self.state.viewport = viewport;
        self.backend.apply_global_state(&self.state)?;

        tracing::info!("Resized to {}x{}", width, height);
        self.rebuild_target();
        Ok(())
    }

    fn rebuild_target(&mut self) -> bool {
        let Viewport { width, height } = self.state.viewport;
        match self.backend.rebuild_depth_target(width, height) {
            Ok(()) => self.target_stale = false,
            Err(e) => {
                tracing::warn!("Depth target rebuild failed: {}", e);
                self.target_stale = true;
            }
        }
        !self.target_stale
    }

    /// Advance the animation by `dt` seconds and render one frame.
    pub fn render_frame(&mut self, dt: f32) -> Result<FrameStatus> {
        if self.destroyed {
            return Err(RenderError::resource("frame orchestrator was destroyed"));
        }

        self.angle = wrap_degrees(self.angle + self.config.rotation_speed * dt);

        if self.state.viewport.is_empty() {
            return Ok(FrameStatus::Skipped);
        }
        if self.target_stale && !self.rebuild_target() {
            tracing::warn!("Skipping frame: depth target unavailable");
            return Ok(FrameStatus::Skipped);
        }

        let draws = self.scene.draws(self.angle);
        match self.draw(&draws) {
            Ok(()) => Ok(FrameStatus::Rendered),
            Err(RenderError::RenderResource(msg)) => {
                tracing::warn!("Skipping frame: {}", msg);
                self.target_stale = true;
                Ok(FrameStatus::Skipped)
            }
            Err(RenderError::SurfaceLost) => {
                tracing::warn!("Skipping frame: surface lost");
                Ok(FrameStatus::Skipped)
            }
            Err(e) => Err(e),
        }
    }

    fn draw(&mut self, draws: &[DrawItem]) -> Result<()> {
        self.backend.begin_frame()?;

        let start = Instant::now();
        let shadow_params = ShadowPassParams {
            light_view: self.light.view_matrix(),
            light_projection: self.light.projection_matrix(),
        };
        let shadow_draws = self.backend.shadow_pass(draws, &shadow_params)?;
        let shadow_time = start.elapsed();

        let shading_params = ShadingPassParams {
            eye_view: self.eye.view_matrix(),
            eye_projection: self.eye.projection_matrix(),
            shadow: self.shadow,
            lighting: self.lighting,
        };
        let shading_draws = self.backend.shading_pass(draws, &shading_params)?;

        self.backend.present()?;
        tracing::debug!(
            "Frame at {:.1}°: shadow pass {} draws in {:?}, shading pass {} draws in {:?}",
            self.angle,
            shadow_draws,
            shadow_time,
            shading_draws,
            start.elapsed() - shadow_time
        );
        Ok(())
    }

    /// Release all backend resources. Further frames fail.
    pub fn destroy(&mut self) {
        if !self.destroyed {
            self.backend.destroy();
            self.destroyed = true;
            tracing::info!("Destroyed {} frame orchestrator", self.backend.name());
        }
    }

    /// Current cube rotation in degrees, in `[0, 360)`.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn set_angle(&mut self, degrees: f32) {
        self.angle = wrap_degrees(degrees);
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn eye(&self) -> &Camera {
        &self.eye
    }

    pub fn light(&self) -> &Camera {
        &self.light
    }

    pub fn shadow_transforms(&self) -> &ShadowTransformBundle {
        &self.shadow
    }

    /// Whether the depth target must be rebuilt before the next frame.
    pub fn is_target_stale(&self) -> bool {
        self.target_stale
    }
}
