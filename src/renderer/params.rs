//! Per-frame parameters
//!
//! Passes receive everything they need through these structs; nothing is read
//! from shared mutable state.

use super::camera::Viewport;
use super::geometry::MeshHandle;
use super::light::LightingParameters;
use super::shadow::ShadowTransformBundle;
use super::transform::DrawTransforms;
use crate::core::render_states::{CullState, DepthCompare};
use glam::{Mat4, Vec4};

/// One mesh to draw this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub mesh: MeshHandle,
    pub model: Mat4,
    pub color: Vec4,
    /// Whether the mesh is rendered into the shadow map.
    pub casts_shadow: bool,
}

/// Inputs of the shadow-map pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowPassParams {
    pub light_view: Mat4,
    pub light_projection: Mat4,
}

/// Inputs of the shading pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingPassParams {
    pub eye_view: Mat4,
    pub eye_projection: Mat4,
    pub shadow: ShadowTransformBundle,
    pub lighting: LightingParameters,
}

/// Pipeline state fixed between resizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalState {
    pub viewport: Viewport,
    pub clear_color: [f32; 4],
    pub cull: CullState,
    pub depth_compare: DepthCompare,
}

impl GlobalState {
    pub fn new(viewport: Viewport, clear_color: [f32; 4]) -> Self {
        Self {
            viewport,
            clear_color,
            cull: CullState::Back,
            depth_compare: DepthCompare::LessEqual,
        }
    }

    /// Whether switching to `other` changes anything baked into pipelines.
    pub fn pipeline_differs(&self, other: &GlobalState) -> bool {
        self.cull != other.cull || self.depth_compare != other.depth_compare
    }
}

/// A draw item with its transforms resolved for one camera.
#[derive(Debug, Clone, Copy)]
pub struct PreparedDraw {
    pub item: DrawItem,
    pub transforms: DrawTransforms,
}

/// Resolve per-draw transforms, skipping draws whose model-view cannot be inverted.
pub fn prepare_draws(
    draws: &[DrawItem],
    view: Mat4,
    projection: Mat4,
    shadow_casters_only: bool,
) -> Vec<PreparedDraw> {
    draws
        .iter()
        .filter(|item| !shadow_casters_only || item.casts_shadow)
        .filter_map(
            |item| match DrawTransforms::new(item.model, view, projection) {
                Ok(transforms) => Some(PreparedDraw {
                    item: *item,
                    transforms,
                }),
                Err(e) => {
                    tracing::warn!("Skipping draw of mesh {}: {}", item.mesh.index(), e);
                    None
                }
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn item(model: Mat4, casts_shadow: bool) -> DrawItem {
        DrawItem {
            mesh: MeshHandle(0),
            model,
            color: Vec4::ONE,
            casts_shadow,
        }
    }

    #[test]
    fn test_degenerate_draw_is_skipped() {
        let draws = [
            item(Mat4::IDENTITY, true),
            item(Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0)), true),
            item(Mat4::from_translation(Vec3::X), true),
        ];
        let prepared = prepare_draws(&draws, Mat4::IDENTITY, Mat4::IDENTITY, false);
        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[1].item.model, Mat4::from_translation(Vec3::X));
    }

    #[test]
    fn test_shadow_casters_filter() {
        let draws = [item(Mat4::IDENTITY, true), item(Mat4::IDENTITY, false)];
        assert_eq!(prepare_draws(&draws, Mat4::IDENTITY, Mat4::IDENTITY, true).len(), 1);
        assert_eq!(prepare_draws(&draws, Mat4::IDENTITY, Mat4::IDENTITY, false).len(), 2);
    }
}
