//! Window host
//!
//! Opens a winit window, creates the surface and device, and maps window
//! events onto [`FrameOrchestrator`]: creation to `create`, resizes to
//! `resize`, redraws to `render_frame`, and closing to `destroy`.

pub mod settings;

pub use settings::WindowSettings;

use crate::config::SceneConfig;
use crate::context::WgpuContext;
use crate::frame::FrameOrchestrator;
use crate::renderer::gpu::GpuRenderer;
use anyhow::Context as _;
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// Open a window and render the scene until it is closed.
pub fn run(settings: WindowSettings, config: SceneConfig) -> anyhow::Result<()> {
    config.validate()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        settings,
        config,
        running: None,
        last_frame_time: Instant::now(),
        error: None,
    };
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct Running {
    window: Arc<Window>,
    frame: FrameOrchestrator<GpuRenderer>,
}

struct App {
    settings: WindowSettings,
    config: SceneConfig,
    running: Option<Running>,
    last_frame_time: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn start(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Running> {
        let window_attrs = winit::window::WindowAttributes::default()
            .with_title(&self.settings.title)
            .with_inner_size(self.settings.inner_size())
            .with_resizable(self.settings.resizable);

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .context("failed to create window")?,
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;
        tracing::info!("Using adapter: {:?}", adapter.get_info().name);

        let ctx = pollster::block_on(WgpuContext::from_adapter(&adapter))?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: self.settings.present_mode(),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let renderer =
            GpuRenderer::with_surface(&ctx, surface, surface_config, self.config.encoding)?;
        let mut frame = FrameOrchestrator::create(renderer, self.config.clone())?;
        frame.resize(size.width, size.height)?;

        Ok(Running { window, frame })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{:#}", error);
        if let Some(running) = &mut self.running {
            running.frame.destroy();
        }
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(running) => {
                self.running = Some(running);
                self.last_frame_time = Instant::now();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(running) = &mut self.running else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                running.frame.destroy();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Err(e) = running.frame.resize(size.width, size.height) {
                    self.fail(event_loop, e.into());
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.last_frame_time).as_secs_f32();
                self.last_frame_time = now;

                if let Err(e) = running.frame.render_frame(dt) {
                    self.fail(event_loop, e.into());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = &self.running {
            running.window.request_redraw();
        }
    }
}
