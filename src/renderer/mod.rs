//! High-level rendering
//!
//! Cameras, transforms, geometry, and the two passes of shadow mapping.

pub mod camera;
pub mod geometry;
pub mod gpu;
pub mod light;
pub mod params;
pub mod shading;
pub mod shadow;
pub mod transform;

pub use camera::{Camera, Viewport};
pub use geometry::{
    generate_cube, generate_plane, generate_point_light_marker, Geometry, GpuMesh, MeshData,
    MeshHandle,
};
pub use gpu::GpuRenderer;
pub use light::{Attenuation, LightingParameters};
pub use params::{DrawItem, GlobalState, ShadingPassParams, ShadowPassParams};
pub use shading::{ShadingModel, ShadingPass};
pub use shadow::{
    classify_depth, shadow_visibility, GpuDepthTarget, ShadowClass, ShadowMapPass,
    ShadowSampler, ShadowTransformBundle,
};
pub use transform::DrawTransforms;
