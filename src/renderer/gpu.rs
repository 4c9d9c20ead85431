//! GPU renderer
//!
//! Runs both passes with wgpu, either into a window surface or into an
//! offscreen texture that can be read back.

use super::camera::Viewport;
use super::geometry::{GpuMesh, MeshData, MeshHandle};
use super::params::{DrawItem, GlobalState, ShadingPassParams, ShadowPassParams};
use super::shading::ShadingPass;
use super::shadow::{GpuDepthTarget, ShadowMapPass};
use crate::config::DepthEncoding;
use crate::context::WgpuContext;
use crate::core::render_states::ClearState;
use crate::core::texture::{DepthTexture, Texture2D};
use crate::core::tracker::ResourceTracker;
use crate::error::{RenderError, Result};
use crate::frame::RenderBackend;
use std::sync::Arc;

enum Output {
    Surface {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    Offscreen(Texture2D),
}

struct InFlightFrame {
    encoder: wgpu::CommandEncoder,
    view: wgpu::TextureView,
    surface_texture: Option<wgpu::SurfaceTexture>,
}

/// wgpu implementation of [`RenderBackend`].
pub struct GpuRenderer {
    ctx: WgpuContext,
    output: Output,
    color_format: wgpu::TextureFormat,
    eye_depth: DepthTexture,
    depth_target: GpuDepthTarget,
    shadow_pass: ShadowMapPass,
    shading_pass: ShadingPass,
    meshes: Vec<GpuMesh>,
    state: GlobalState,
    tracker: ResourceTracker,
    frame: Option<InFlightFrame>,
}

impl GpuRenderer {
    /// Color format of offscreen output.
    pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// Render into a window surface. The surface is configured with `config`.
    pub fn with_surface(
        ctx: &WgpuContext,
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
        encoding: DepthEncoding,
    ) -> Result<Self> {
        surface.configure(&ctx.device, &config);
        let viewport = Viewport::new(config.width, config.height);
        let format = config.format;
        Self::build(ctx, Output::Surface { surface, config }, format, viewport, encoding)
    }

    /// Render into an offscreen texture of `width` x `height`.
    pub fn headless(
        ctx: &WgpuContext,
        width: u32,
        height: u32,
        encoding: DepthEncoding,
    ) -> Result<Self> {
        let texture = Self::offscreen_texture(ctx, width, height)?;
        let viewport = Viewport::new(width, height);
        Self::build(
            ctx,
            Output::Offscreen(texture),
            Self::OFFSCREEN_FORMAT,
            viewport,
            encoding,
        )
    }

    fn offscreen_texture(ctx: &WgpuContext, width: u32, height: u32) -> Result<Texture2D> {
        Texture2D::new(
            ctx,
            width.max(1),
            height.max(1),
            Self::OFFSCREEN_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            Some("offscreen color"),
        )
    }

    fn build(
        ctx: &WgpuContext,
        output: Output,
        color_format: wgpu::TextureFormat,
        viewport: Viewport,
        encoding: DepthEncoding,
    ) -> Result<Self> {
        let state = GlobalState::new(viewport, [0.0, 0.0, 0.0, 1.0]);
        let tracker = ResourceTracker::new();
        let shadow_pass = ShadowMapPass::new(ctx, encoding, &state)?;
        let shading_pass = ShadingPass::new(ctx, encoding, color_format, &state)?;
        let eye_depth = DepthTexture::new(
            ctx,
            viewport.width.max(1),
            viewport.height.max(1),
            Some("eye depth"),
        )?;

        tracing::info!(
            "Created GPU renderer ({:?}, {} depth) at {}x{}",
            color_format,
            encoding,
            viewport.width,
            viewport.height
        );

        Ok(Self {
            ctx: ctx.clone(),
            output,
            color_format,
            eye_depth,
            depth_target: GpuDepthTarget::new(ctx, encoding, tracker.clone()),
            shadow_pass,
            shading_pass,
            meshes: Vec::new(),
            state,
            tracker,
            frame: None,
        })
    }

    pub fn context(&self) -> &WgpuContext {
        &self.ctx
    }

    /// Read the last presented offscreen frame as tightly packed RGBA8 rows.
    pub fn read_frame(&self) -> Result<Vec<u8>> {
        match &self.output {
            Output::Offscreen(texture) => texture.read_rgba8(&self.ctx),
            Output::Surface { .. } => Err(RenderError::resource(
                "surface output cannot be read back",
            )),
        }
    }

    fn resize_output(&mut self, viewport: Viewport) -> Result<()> {
        match &mut self.output {
            Output::Surface { surface, config } => {
                config.width = viewport.width;
                config.height = viewport.height;
                surface.configure(&self.ctx.device, config);
            }
            Output::Offscreen(texture) => {
                *texture = Self::offscreen_texture(&self.ctx, viewport.width, viewport.height)?;
            }
        }
        self.eye_depth
            .resize(&self.ctx, viewport.width, viewport.height)
    }
}

impl RenderBackend for GpuRenderer {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn encoding(&self) -> DepthEncoding {
        self.depth_target.encoding()
    }

    fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    fn apply_global_state(&mut self, state: &GlobalState) -> Result<()> {
        if state.viewport != self.state.viewport && !state.viewport.is_empty() {
            self.resize_output(state.viewport)?;
        }
        if self.state.pipeline_differs(state) {
            let encoding = self.depth_target.encoding();
            self.shadow_pass = ShadowMapPass::new(&self.ctx, encoding, state)?;
            self.shading_pass = ShadingPass::new(&self.ctx, encoding, self.color_format, state)?;
        }
        self.state = *state;
        Ok(())
    }

    fn upload_mesh(&mut self, mesh: Arc<MeshData>) -> Result<MeshHandle> {
        let handle = MeshHandle(self.meshes.len());
        let label = format!("mesh {}", handle.index());
        self.meshes
            .push(GpuMesh::upload(&self.ctx, &mesh, Some(&label)));
        Ok(handle)
    }

    fn rebuild_depth_target(&mut self, width: u32, height: u32) -> Result<()> {
        self.depth_target.rebuild(width, height)
    }

    fn begin_frame(&mut self) -> Result<()> {
        self.frame = None;
        let (view, surface_texture) = match &mut self.output {
            Output::Surface { surface, config } => match surface.get_current_texture() {
                Ok(texture) => {
                    let view = texture
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default());
                    (view, Some(texture))
                }
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    surface.configure(&self.ctx.device, config);
                    return Err(RenderError::SurfaceLost);
                }
                Err(wgpu::SurfaceError::Timeout) => {
                    tracing::warn!("Surface acquire timed out");
                    return Err(RenderError::SurfaceLost);
                }
                Err(e) => {
                    tracing::error!("Surface error: {:?}", e);
                    return Err(RenderError::resource(format!("surface error: {e}")));
                }
            },
            Output::Offscreen(texture) => (
                texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default()),
                None,
            ),
        };

        self.frame = Some(InFlightFrame {
            encoder: self.ctx.create_encoder(Some("frame encoder")),
            view,
            surface_texture,
        });
        Ok(())
    }

    fn shadow_pass(&mut self, draws: &[DrawItem], params: &ShadowPassParams) -> Result<usize> {
        let frame = self
            .frame
            .as_mut()
            .ok_or_else(|| RenderError::resource("no frame in flight"))?;
        self.shadow_pass.render(
            &self.ctx,
            &mut frame.encoder,
            &self.depth_target,
            &self.meshes,
            draws,
            params,
        )
    }

    fn shading_pass(&mut self, draws: &[DrawItem], params: &ShadingPassParams) -> Result<usize> {
        let clear = ClearState::color_and_depth(self.state.clear_color, 1.0);
        let frame = self
            .frame
            .as_mut()
            .ok_or_else(|| RenderError::resource("no frame in flight"))?;
        self.shading_pass.render(
            &self.ctx,
            &mut frame.encoder,
            &frame.view,
            &self.eye_depth,
            clear,
            &self.depth_target,
            &self.meshes,
            draws,
            params,
        )
    }

    fn present(&mut self) -> Result<()> {
        let frame = self
            .frame
            .take()
            .ok_or_else(|| RenderError::resource("no frame in flight"))?;
        self.ctx.submit([frame.encoder.finish()]);
        if let Some(surface_texture) = frame.surface_texture {
            surface_texture.present();
        }
        Ok(())
    }

    fn destroy(&mut self) {
        self.frame = None;
        self.depth_target.release();
        self.meshes.clear();
        tracing::info!("Destroyed GPU renderer");
    }
}
