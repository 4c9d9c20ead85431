//! Demo scene
//!
//! A floor plane, a rotating cube and an optional marker at the light.

use super::backend::RenderBackend;
use crate::config::SceneConfig;
use crate::error::Result;
use crate::renderer::geometry::{
    generate_cube, generate_plane, generate_point_light_marker, MeshHandle,
};
use crate::renderer::params::DrawItem;
use crate::renderer::transform::{multiply, rotate, scale, translate};
use glam::{Mat4, Vec3, Vec4};
use std::sync::Arc;

const FLOOR_HALF_EXTENT: f32 = 2.0;
const FLOOR_SCALE: Vec3 = Vec3::new(3.0, 1.0, 4.0);
const MARKER_RADIUS: f32 = 0.1;
const MARKER_SEGMENTS: u32 = 12;

/// Meshes and static transforms of the scene.
#[derive(Debug, Clone)]
pub struct Scene {
    floor: MeshHandle,
    cube: MeshHandle,
    marker: Option<MeshHandle>,
    floor_model: Mat4,
    marker_model: Mat4,
    floor_color: Vec4,
    cube_color: Vec4,
}

impl Scene {
    /// Generate the scene meshes and upload them to `backend`.
    pub fn upload<B: RenderBackend + ?Sized>(backend: &mut B, config: &SceneConfig) -> Result<Self> {
        let floor = backend.upload_mesh(Arc::new(generate_plane(
            FLOOR_HALF_EXTENT,
            FLOOR_HALF_EXTENT,
        )))?;
        let cube = backend.upload_mesh(Arc::new(generate_cube(config.cube_half_extent)))?;
        let marker = if config.show_light_marker {
            Some(backend.upload_mesh(Arc::new(generate_point_light_marker(
                MARKER_RADIUS,
                MARKER_SEGMENTS,
            )))?)
        } else {
            None
        };

        Ok(Self {
            floor,
            cube,
            marker,
            floor_model: multiply(
                scale(FLOOR_SCALE),
                translate(Vec3::from_array(config.floor_position)),
            ),
            marker_model: translate(Vec3::from_array(config.light_position)),
            floor_color: Vec4::from_array(config.floor_color),
            cube_color: Vec4::from_array(config.cube_color),
        })
    }

    pub fn floor(&self) -> MeshHandle {
        self.floor
    }

    pub fn cube(&self) -> MeshHandle {
        self.cube
    }

    pub fn marker(&self) -> Option<MeshHandle> {
        self.marker
    }

    pub fn floor_color(&self) -> Vec4 {
        self.floor_color
    }

    /// Draw list with the cube rotated `angle` degrees about Y.
    pub fn draws(&self, angle: f32) -> Vec<DrawItem> {
        let mut draws = vec![
            DrawItem {
                mesh: self.floor,
                model: self.floor_model,
                color: self.floor_color,
                casts_shadow: true,
            },
            DrawItem {
                mesh: self.cube,
                model: rotate(Vec3::Y, angle),
                color: self.cube_color,
                casts_shadow: true,
            },
        ];
        if let Some(marker) = self.marker {
            draws.push(DrawItem {
                mesh: marker,
                model: self.marker_model,
                color: Vec4::ONE,
                casts_shadow: false,
            });
        }
        draws
    }
}
