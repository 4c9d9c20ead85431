//! Transform utilities
//!
//! Matrix helpers shared by both passes. All matrices are column-major, right
//! handed, and project depth into the `[0, 1]` clip range.

use crate::error::{RenderError, Result};
use glam::{Mat3, Mat4, Vec3};

const DETERMINANT_EPSILON: f32 = 1e-12;

/// Perspective frustum from explicit near-plane extents.
pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    let depth = near - far;
    Mat4::from_cols(
        [2.0 * near / width, 0.0, 0.0, 0.0].into(),
        [0.0, 2.0 * near / height, 0.0, 0.0].into(),
        [
            (right + left) / width,
            (top + bottom) / height,
            far / depth,
            -1.0,
        ]
        .into(),
        [0.0, 0.0, near * far / depth, 0.0].into(),
    )
}

/// Near-plane extents `(left, right, bottom, top)` for a viewport aspect ratio.
///
/// The longer viewport axis always spans `[-1, 1]`.
pub fn frustum_extents(aspect: f32) -> (f32, f32, f32, f32) {
    if aspect < 1.0 {
        (-aspect, aspect, -1.0, 1.0)
    } else {
        (-1.0, 1.0, -1.0 / aspect, 1.0 / aspect)
    }
}

/// Perspective projection for a `width` x `height` viewport.
pub fn viewport_projection(width: u32, height: u32, near: f32, far: f32) -> Mat4 {
    let aspect = width as f32 / height.max(1) as f32;
    let (left, right, bottom, top) = frustum_extents(aspect);
    frustum(left, right, bottom, top, near, far)
}

/// View matrix looking from `eye` towards `target`.
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Result<Mat4> {
    let forward = target - eye;
    if forward.length_squared() <= f32::EPSILON {
        return Err(RenderError::degenerate("look_at eye and target coincide"));
    }
    if forward.normalize().cross(up).length_squared() <= f32::EPSILON {
        return Err(RenderError::degenerate(
            "look_at up vector is parallel to the view direction",
        ));
    }
    Ok(Mat4::look_at_rh(eye, target, up))
}

pub fn scale(v: Vec3) -> Mat4 {
    Mat4::from_scale(v)
}

pub fn translate(v: Vec3) -> Mat4 {
    Mat4::from_translation(v)
}

/// Rotation of `degrees` about `axis`. A zero axis yields the identity.
pub fn rotate(axis: Vec3, degrees: f32) -> Mat4 {
    match axis.try_normalize() {
        Some(axis) => Mat4::from_axis_angle(axis, degrees.to_radians()),
        None => Mat4::IDENTITY,
    }
}

/// `a * b`: applies `b` first, then `a`.
pub fn multiply(a: Mat4, b: Mat4) -> Mat4 {
    a * b
}

pub fn invert(m: Mat4) -> Result<Mat4> {
    let det = m.determinant();
    if !det.is_finite() || det.abs() < DETERMINANT_EPSILON {
        return Err(RenderError::degenerate(format!(
            "matrix is not invertible (determinant {det})"
        )));
    }
    Ok(m.inverse())
}

pub fn transpose(m: Mat4) -> Mat4 {
    m.transpose()
}

/// Inverse-transpose of the upper 3x3 of a model-view matrix.
pub fn normal_matrix(model_view: Mat4) -> Result<Mat3> {
    Ok(Mat3::from_mat4(transpose(invert(model_view)?)))
}

/// Matrices needed to draw one mesh from one camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawTransforms {
    pub model: Mat4,
    pub model_view: Mat4,
    pub mvp: Mat4,
    pub normal_matrix: Mat3,
}

impl DrawTransforms {
    pub fn new(model: Mat4, view: Mat4, projection: Mat4) -> Result<Self> {
        let model_view = multiply(view, model);
        Ok(Self {
            model,
            model_view,
            mvp: multiply(projection, model_view),
            normal_matrix: normal_matrix(model_view)?,
        })
    }
}
