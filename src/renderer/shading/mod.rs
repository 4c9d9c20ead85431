//! Shading model
//!
//! Blinn-Phong point-light shading evaluated in view space, modulated by the
//! shadow classification. `shading.wgsl` evaluates the same expression on the GPU.

mod pass;

pub use pass::ShadingPass;

use super::light::{Attenuation, LightingParameters};
use glam::{Mat4, Vec3, Vec4};

/// Lighting terms resolved into the eye's view space for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingModel {
    pub light_position_view: Vec3,
    pub light_color: Vec3,
    pub ambient: f32,
    pub attenuation: Attenuation,
    pub shininess: f32,
    pub specular_strength: f32,
}

impl ShadingModel {
    pub fn new(lighting: &LightingParameters, eye_view: Mat4) -> Self {
        Self {
            light_position_view: eye_view.transform_point3(lighting.light_position),
            light_color: lighting.light_color.truncate(),
            ambient: lighting.ambient,
            attenuation: lighting.attenuation,
            shininess: lighting.shininess,
            specular_strength: lighting.specular_strength,
        }
    }

    /// Color of a fragment at `position` (view space) with unit `normal`.
    ///
    /// `visibility` is 1 for lit fragments and 0 for shadowed ones; shadowed
    /// fragments keep only the ambient term.
    pub fn shade(&self, position: Vec3, normal: Vec3, base: Vec4, visibility: f32) -> Vec4 {
        let normal = normal.normalize_or_zero();
        let to_light = self.light_position_view - position;
        let distance = to_light.length();
        let light_dir = to_light.normalize_or_zero();
        let eye_dir = (-position).normalize_or_zero();

        let attenuation = self.attenuation.factor(distance);
        let diffuse = normal.dot(light_dir).max(0.0);
        let specular = if diffuse > 0.0 {
            let half_vector = (light_dir + eye_dir).normalize_or_zero();
            normal.dot(half_vector).max(0.0).powf(self.shininess) * self.specular_strength
        } else {
            0.0
        };

        let base_rgb = base.truncate();
        let scattered = base_rgb * self.light_color * diffuse * attenuation;
        let reflected = self.light_color * specular * attenuation;
        let ambient = base_rgb * self.ambient;
        let rgb = (ambient + visibility * (scattered + reflected)).clamp(Vec3::ZERO, Vec3::ONE);
        rgb.extend(base.w)
    }

    /// Color of a fully shadowed fragment.
    pub fn ambient_color(&self, base: Vec4) -> Vec4 {
        (base.truncate() * self.ambient)
            .clamp(Vec3::ZERO, Vec3::ONE)
            .extend(base.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ShadingModel {
        ShadingModel {
            light_position_view: Vec3::new(0.0, 2.0, -2.0),
            light_color: Vec3::ONE,
            ambient: 0.3,
            attenuation: Attenuation::default(),
            shininess: 1.0,
            specular_strength: 12.0,
        }
    }

    #[test]
    fn test_shadowed_fragment_is_ambient_only() {
        let base = Vec4::new(0.2, 0.7, 0.9, 1.0);
        let color = model().shade(Vec3::new(0.0, 0.0, -2.0), Vec3::Y, base, 0.0);
        assert!(color.abs_diff_eq(model().ambient_color(base), 1e-6));
    }

    #[test]
    fn test_lit_fragment_is_brighter() {
        let base = Vec4::new(0.2, 0.7, 0.9, 1.0);
        let lit = model().shade(Vec3::new(0.0, 0.0, -2.0), Vec3::Y, base, 1.0);
        let dark = model().shade(Vec3::new(0.0, 0.0, -2.0), Vec3::Y, base, 0.0);
        assert!(lit.truncate().cmpge(dark.truncate()).all());
        assert!(lit.x > dark.x);
    }

    #[test]
    fn test_facing_away_has_no_specular() {
        let base = Vec4::new(0.5, 0.5, 0.5, 1.0);
        let color = model().shade(Vec3::new(0.0, 0.0, -2.0), Vec3::NEG_Y, base, 1.0);
        assert!(color.abs_diff_eq(model().ambient_color(base), 1e-6));
    }

    #[test]
    fn test_alpha_comes_from_base() {
        let base = Vec4::new(1.0, 0.0, 1.0, 0.25);
        let color = model().shade(Vec3::new(0.0, 0.0, -2.0), Vec3::Y, base, 1.0);
        assert_eq!(color.w, 0.25);
        assert!(color.truncate().max_element() <= 1.0);
    }

    #[test]
    fn test_light_moves_into_view_space() {
        let lighting = LightingParameters::default();
        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0));
        let shading = ShadingModel::new(&lighting, view);
        assert_eq!(shading.light_position_view, Vec3::new(3.0, 6.0, -2.0));
    }
}
