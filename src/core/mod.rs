//! Core rendering abstractions
//!
//! This module provides mid-level abstractions over wgpu primitives.

pub mod buffer;
pub mod pipeline;
pub mod render_states;
pub mod shader;
pub mod texture;
pub mod tracker;
pub mod vertex;

pub use buffer::{DynamicUniformBuffer, IndexBuffer, UniformBuffer, VertexBuffer};
pub use pipeline::PipelineBuilder;
pub use render_states::{ClearState, CullState, DepthCompare, DepthState};
pub use shader::{BindingSlot, ShaderProgram, ShaderReflection};
pub use texture::{DepthTexture, Texture2D};
pub use tracker::{ResourceTracker, TrackedResource};
pub use vertex::VertexPN;
