//! Shadow mapping module
//!
//! The light renders scene depth into a depth target; the shading pass then
//! projects each fragment into that target and compares depths.

pub mod codec;
mod pass;
mod target;

pub use codec::{pack_depth, unpack_depth, verify_depth_codec, PACKED_DEPTH_TOLERANCE};
pub use pass::ShadowMapPass;
pub use target::GpuDepthTarget;

use glam::{Mat4, Vec2, Vec4};

/// Matrices that take a world-space point into the light's shadow map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowTransformBundle {
    pub light_view: Mat4,
    pub light_projection: Mat4,
    pub bias: Mat4,
    /// `bias * light_projection * light_view`
    pub combined: Mat4,
}

impl ShadowTransformBundle {
    pub fn new(light_view: Mat4, light_projection: Mat4) -> Self {
        let bias = Self::bias_matrix();
        Self {
            light_view,
            light_projection,
            bias,
            combined: bias * light_projection * light_view,
        }
    }

    /// Maps clip x/y from `[-1, 1]` onto texture coordinates in `[0, 1]`.
    ///
    /// Texture v grows downwards like framebuffer rows. Clip depth is already in
    /// `[0, 1]` and passes through unchanged.
    pub fn bias_matrix() -> Mat4 {
        Mat4::from_cols(
            Vec4::new(0.5, 0.0, 0.0, 0.0),
            Vec4::new(0.0, -0.5, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(0.5, 0.5, 0.0, 1.0),
        )
    }

    /// Shadow-map coordinate of a world-space position, before perspective divide.
    pub fn shadow_coord(&self, world_position: Vec4) -> Vec4 {
        self.combined * world_position
    }
}

/// Outcome of comparing a fragment against the shadow map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowClass {
    Lit,
    Occluded,
}

impl ShadowClass {
    /// Multiplier applied to the diffuse and specular terms.
    pub fn visibility(&self) -> f32 {
        match self {
            ShadowClass::Lit => 1.0,
            ShadowClass::Occluded => 0.0,
        }
    }
}

/// Compare a fragment's light-space depth with the stored depth.
///
/// A stored depth of exactly zero marks a texel nothing was rendered to.
pub fn classify_depth(own_depth: f32, stored_depth: f32, bias: f32) -> ShadowClass {
    if own_depth > stored_depth + bias && stored_depth > 0.0 {
        ShadowClass::Occluded
    } else {
        ShadowClass::Lit
    }
}

/// Read access to a rendered shadow map.
pub trait ShadowSampler {
    /// Texel dimensions of the map.
    fn size(&self) -> (u32, u32);

    /// Decoded depth stored at a texel.
    fn texel_depth(&self, x: u32, y: u32) -> f32;

    /// Decoded depth at texture coordinates in `[0, 1)`.
    fn depth_at(&self, uv: Vec2) -> f32 {
        let (width, height) = self.size();
        let x = ((uv.x * width as f32) as u32).min(width.saturating_sub(1));
        let y = ((uv.y * height as f32) as u32).min(height.saturating_sub(1));
        self.texel_depth(x, y)
    }
}

/// Classify a fragment given its shadow-map coordinate.
///
/// Fragments behind the light (`w <= 0`) are occluded. Fragments projecting
/// outside the map have no depth to compare against and are lit.
pub fn shadow_visibility<S: ShadowSampler + ?Sized>(
    sampler: &S,
    shadow_coord: Vec4,
    bias: f32,
) -> ShadowClass {
    if shadow_coord.w <= 0.0 {
        return ShadowClass::Occluded;
    }
    let projected = shadow_coord.truncate() / shadow_coord.w;
    let uv = projected.truncate();
    if uv.x < 0.0 || uv.x >= 1.0 || uv.y < 0.0 || uv.y >= 1.0 {
        return ShadowClass::Lit;
    }
    classify_depth(projected.z, sampler.depth_at(uv), bias)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    struct UniformMap {
        size: (u32, u32),
        depth: f32,
    }

    impl ShadowSampler for UniformMap {
        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn texel_depth(&self, _x: u32, _y: u32) -> f32 {
            self.depth
        }
    }

    #[test]
    fn test_classify_depth() {
        assert_eq!(classify_depth(0.6, 0.4, 0.01), ShadowClass::Occluded);
        assert_eq!(classify_depth(0.3, 0.4, 0.01), ShadowClass::Lit);
        assert_eq!(classify_depth(0.405, 0.4, 0.01), ShadowClass::Lit);
        assert_eq!(classify_depth(0.9, 0.0, 0.01), ShadowClass::Lit);
    }

    #[test]
    fn test_behind_light_is_occluded() {
        let map = UniformMap {
            size: (4, 4),
            depth: 1.0,
        };
        let coord = Vec4::new(0.5, 0.5, 0.1, -1.0);
        assert_eq!(shadow_visibility(&map, coord, 0.01), ShadowClass::Occluded);
    }

    #[test]
    fn test_outside_map_is_lit() {
        let map = UniformMap {
            size: (4, 4),
            depth: 0.1,
        };
        for uv in [(-0.1, 0.5), (0.5, 1.0), (1.5, 1.5)] {
            let coord = Vec4::new(uv.0, uv.1, 0.9, 1.0);
            assert_eq!(shadow_visibility(&map, coord, 0.01), ShadowClass::Lit);
        }
    }

    #[test]
    fn test_perspective_divide_applied() {
        let map = UniformMap {
            size: (4, 4),
            depth: 0.4,
        };
        // (0.5, 0.5, 0.6) after dividing by w = 2
        let coord = Vec4::new(1.0, 1.0, 1.2, 2.0);
        assert_eq!(shadow_visibility(&map, coord, 0.01), ShadowClass::Occluded);
    }

    #[test]
    fn test_bias_matrix_maps_clip_corners() {
        let bias = ShadowTransformBundle::bias_matrix();
        let top_left = bias * Vec4::new(-1.0, 1.0, 0.25, 1.0);
        let bottom_right = bias * Vec4::new(1.0, -1.0, 0.75, 1.0);
        assert!(top_left.abs_diff_eq(Vec4::new(0.0, 0.0, 0.25, 1.0), 1e-6));
        assert!(bottom_right.abs_diff_eq(Vec4::new(1.0, 1.0, 0.75, 1.0), 1e-6));
    }

    #[test]
    fn test_combined_matches_product() {
        let view = Mat4::look_at_rh(Vec3::new(3.0, 6.0, 3.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh(1.0, 1.0, 1.0, 20.0);
        let bundle = ShadowTransformBundle::new(view, projection);
        let expected = ShadowTransformBundle::bias_matrix() * projection * view;
        assert!(bundle.combined.abs_diff_eq(expected, 1e-6));
    }
}
