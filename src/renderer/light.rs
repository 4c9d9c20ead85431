//! Point light parameters
//!
//! The scene has a single point light. Its parameters are gathered once per
//! frame into [`LightingParameters`] and handed to the shading pass.

use glam::{Vec3, Vec4};

/// Attenuation factors for the point light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    /// Constant attenuation factor (default: 1.0).
    pub constant: f32,
    /// Linear attenuation factor.
    pub linear: f32,
    /// Quadratic attenuation factor.
    pub quadratic: f32,
}

impl Attenuation {
    /// Create a new attenuation.
    pub fn new(constant: f32, linear: f32, quadratic: f32) -> Self {
        Self {
            constant,
            linear,
            quadratic,
        }
    }

    /// No attenuation (constant intensity).
    pub fn none() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Light intensity factor at `distance`.
    pub fn factor(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }

    /// Convert to array.
    pub fn to_array(&self) -> [f32; 3] {
        [self.constant, self.linear, self.quadratic]
    }
}

impl Default for Attenuation {
    fn default() -> Self {
        Self::new(1.0, 0.5, 0.25)
    }
}

/// Everything the shading pass needs to light a fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingParameters {
    pub light_color: Vec4,
    /// World-space light position.
    pub light_position: Vec3,
    /// World-space eye position.
    pub eye_position: Vec3,
    pub ambient: f32,
    pub attenuation: Attenuation,
    pub shininess: f32,
    pub specular_strength: f32,
    /// Tolerance added to the stored depth before comparing.
    pub depth_bias: f32,
}

impl Default for LightingParameters {
    fn default() -> Self {
        Self {
            light_color: Vec4::ONE,
            light_position: Vec3::new(3.0, 6.0, 3.0),
            eye_position: Vec3::new(0.0, 5.0, 4.0),
            ambient: 0.3,
            attenuation: Attenuation::default(),
            shininess: 1.0,
            specular_strength: 12.0,
            depth_bias: 0.01,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attenuation_factor() {
        let att = Attenuation::default();
        assert_eq!(att.factor(0.0), 1.0);
        // 1 / (1 + 0.5 * 2 + 0.25 * 4)
        assert!((att.factor(2.0) - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(Attenuation::none().factor(100.0), 1.0);
    }
}
