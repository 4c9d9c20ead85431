//! Scene configuration
//!
//! All tunable scene parameters live in [`SceneConfig`]. Every field has a
//! default, so a JSON file only needs to name the values it overrides:
//!
//! ```json
//! { "encoding": "packed", "depth_bias": 0.005, "light_position": [2.0, 8.0, 2.0] }
//! ```

use crate::error::{RenderError, Result};
use crate::renderer::light::{Attenuation, LightingParameters};
use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// How light-space depth is stored in the depth target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthEncoding {
    /// Hardware depth texture, sampled directly.
    #[default]
    Native,
    /// Depth packed into the four 8-bit channels of a color texture.
    Packed,
}

impl fmt::Display for DepthEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepthEncoding::Native => f.write_str("native"),
            DepthEncoding::Packed => f.write_str("packed"),
        }
    }
}

/// Scene parameters shared by both render backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub light_position: [f32; 3],
    pub light_color: [f32; 4],
    pub eye_position: [f32; 3],
    pub floor_color: [f32; 4],
    pub cube_color: [f32; 4],
    /// Translation applied to the floor before its (3, 1, 4) scale.
    pub floor_position: [f32; 3],
    pub cube_half_extent: f32,
    pub near: f32,
    pub far: f32,
    /// Epsilon added to the stored depth before the occlusion comparison.
    pub depth_bias: f32,
    pub encoding: DepthEncoding,
    pub ambient: f32,
    /// `[constant, linear, quadratic]`
    pub attenuation: [f32; 3],
    pub shininess: f32,
    pub specular_strength: f32,
    /// Cube rotation speed in degrees per second.
    pub rotation_speed: f32,
    /// Cube rotation at creation, in degrees.
    pub initial_angle: f32,
    pub show_light_marker: bool,
    pub clear_color: [f32; 4],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            light_position: [3.0, 6.0, 3.0],
            light_color: [1.0, 1.0, 1.0, 1.0],
            eye_position: [0.0, 5.0, 4.0],
            floor_color: [0.2, 0.709_803_9, 0.898_039_2, 1.0],
            cube_color: [1.0, 0.0, 1.0, 1.0],
            floor_position: [0.0, -4.0, 0.0],
            cube_half_extent: 1.0,
            near: 1.0,
            far: 20.0,
            depth_bias: 0.01,
            encoding: DepthEncoding::Native,
            ambient: 0.3,
            attenuation: [1.0, 0.5, 0.25],
            shininess: 1.0,
            specular_strength: 12.0,
            rotation_speed: 40.0,
            initial_angle: 45.0,
            show_light_marker: false,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl SceneConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check that all values are usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.near > 0.0) {
            return Err(RenderError::InvalidConfig(format!(
                "near plane must be positive, got {}",
                self.near
            )));
        }
        if !(self.far > self.near) {
            return Err(RenderError::InvalidConfig(format!(
                "far plane {} must lie beyond near plane {}",
                self.far, self.near
            )));
        }
        if !(self.depth_bias >= 0.0) {
            return Err(RenderError::InvalidConfig(format!(
                "depth bias must be non-negative, got {}",
                self.depth_bias
            )));
        }
        if !(self.cube_half_extent > 0.0) {
            return Err(RenderError::InvalidConfig(format!(
                "cube half extent must be positive, got {}",
                self.cube_half_extent
            )));
        }
        let positions = [self.light_position, self.eye_position];
        if positions.iter().flatten().any(|v| !v.is_finite()) {
            return Err(RenderError::InvalidConfig(
                "light and eye positions must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the depth encoding.
    pub fn encoding(mut self, encoding: DepthEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the depth bias.
    pub fn depth_bias(mut self, bias: f32) -> Self {
        self.depth_bias = bias;
        self
    }

    /// Set the light position.
    pub fn light_position(mut self, position: Vec3) -> Self {
        self.light_position = position.to_array();
        self
    }

    /// Set the eye position.
    pub fn eye_position(mut self, position: Vec3) -> Self {
        self.eye_position = position.to_array();
        self
    }

    /// Show or hide the light marker sphere.
    pub fn show_light_marker(mut self, show: bool) -> Self {
        self.show_light_marker = show;
        self
    }

    /// Build the lighting parameters described by this configuration.
    pub fn lighting(&self) -> LightingParameters {
        let [constant, linear, quadratic] = self.attenuation;
        LightingParameters {
            light_color: Vec4::from_array(self.light_color),
            light_position: Vec3::from_array(self.light_position),
            eye_position: Vec3::from_array(self.eye_position),
            ambient: self.ambient,
            attenuation: Attenuation::new(constant, linear, quadratic),
            shininess: self.shininess,
            specular_strength: self.specular_strength,
            depth_bias: self.depth_bias,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_demo_scene() {
        let config = SceneConfig::default();
        assert_eq!(config.light_position, [3.0, 6.0, 3.0]);
        assert_eq!(config.eye_position, [0.0, 5.0, 4.0]);
        assert_eq!(config.near, 1.0);
        assert_eq!(config.far, 20.0);
        assert_eq!(config.depth_bias, 0.01);
        assert_eq!(config.encoding, DepthEncoding::Native);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            SceneConfig::from_json_str(r#"{ "encoding": "packed", "depth_bias": 0.005 }"#)
                .unwrap();
        assert_eq!(config.encoding, DepthEncoding::Packed);
        assert_eq!(config.depth_bias, 0.005);
        assert_eq!(config.light_position, [3.0, 6.0, 3.0]);
        assert_eq!(config.cube_color, [1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_rejects_bad_planes() {
        let err = SceneConfig::from_json_str(r#"{ "near": 0.0 }"#).unwrap_err();
        assert!(matches!(err, RenderError::InvalidConfig(_)));

        let err = SceneConfig::from_json_str(r#"{ "near": 5.0, "far": 2.0 }"#).unwrap_err();
        assert!(matches!(err, RenderError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_negative_bias() {
        let config = SceneConfig::new().depth_bias(-0.1);
        assert!(matches!(
            config.validate(),
            Err(RenderError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        let err = SceneConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, RenderError::Json(_)));
    }

    #[test]
    fn test_lighting_from_config() {
        let lighting = SceneConfig::default().lighting();
        assert_eq!(lighting.light_position, Vec3::new(3.0, 6.0, 3.0));
        assert_eq!(lighting.attenuation.linear, 0.5);
        assert_eq!(lighting.attenuation.quadratic, 0.25);
        assert_eq!(lighting.ambient, 0.3);
    }
}
