//! shadowmap
//!
//! Two-pass shadow mapping built on wgpu: the scene's depth is rendered from a
//! point light into an offscreen depth target, then the scene is rendered from
//! the eye and each fragment is lit or shadowed by comparing its light-space
//! depth with the stored one.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **context** - Core wgpu wrapper (Device, Queue)
//! 2. **core** - GPU primitives (buffers, textures, pipelines, shader reflection)
//! 3. **renderer** - Transforms, cameras, geometry, the shadow and shading passes, and the GPU renderer
//! 4. **software** - CPU renderer with the same passes, for headless use and tests
//! 5. **frame** - Frame orchestration over either renderer
//! 6. **window** - Window host with winit (feature = "window")
//!
//! # Example
//!
//! ```no_run
//! use shadowmap::{DepthEncoding, FrameOrchestrator, SceneConfig, SoftwareRenderer};
//!
//! let backend = SoftwareRenderer::new(256, 256, DepthEncoding::Native);
//! let mut frame = FrameOrchestrator::create(backend, SceneConfig::default())?;
//! frame.resize(256, 256)?;
//! frame.render_frame(1.0 / 60.0)?;
//! let pixels = frame.backend().last_frame().to_rgba8();
//! # Ok::<(), shadowmap::RenderError>(())
//! ```

pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod frame;
pub mod renderer;
pub mod software;

#[cfg(feature = "window")]
pub mod window;

// Re-export commonly used types
pub use config::{DepthEncoding, SceneConfig};
pub use context::WgpuContext;
pub use error::{RenderError, Result};
pub use frame::{FrameOrchestrator, FrameStatus, RenderBackend, Scene};

pub use crate::core::{
    BindingSlot, ClearState, CullState, DepthCompare, DepthState, DepthTexture,
    DynamicUniformBuffer, IndexBuffer, PipelineBuilder, ResourceTracker, ShaderProgram,
    ShaderReflection, Texture2D, UniformBuffer, VertexBuffer, VertexPN,
};

pub use renderer::{
    Attenuation, Camera, DrawItem, DrawTransforms, GlobalState, GpuMesh, GpuRenderer,
    LightingParameters, MeshData, MeshHandle, ShadingModel, ShadingPassParams,
    ShadowPassParams, ShadowTransformBundle, Viewport,
};

pub use software::{Framebuffer, SoftwareRenderer};

#[cfg(feature = "window")]
pub use window::WindowSettings;

// Re-export glam for convenience
pub use glam;
