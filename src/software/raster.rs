//! Triangle rasterizer
//!
//! Clips against the near plane, maps to window coordinates with the same
//! conventions as wgpu (y down, pixel centers at +0.5) and interpolates
//! varyings perspective-correctly.

use crate::core::render_states::CullState;
use glam::{Vec3, Vec4};

/// Per-vertex values interpolated across a triangle.
pub trait Varying: Copy {
    fn scaled(self, factor: f32) -> Self;
    fn plus(self, other: Self) -> Self;

    fn lerp(self, other: Self, t: f32) -> Self {
        self.scaled(1.0 - t).plus(other.scaled(t))
    }
}

impl Varying for () {
    fn scaled(self, _factor: f32) -> Self {}
    fn plus(self, _other: Self) -> Self {}
}

impl Varying for Vec3 {
    fn scaled(self, factor: f32) -> Self {
        self * factor
    }

    fn plus(self, other: Self) -> Self {
        self + other
    }
}

impl<A: Varying, B: Varying> Varying for (A, B) {
    fn scaled(self, factor: f32) -> Self {
        (self.0.scaled(factor), self.1.scaled(factor))
    }

    fn plus(self, other: Self) -> Self {
        (self.0.plus(other.0), self.1.plus(other.1))
    }
}

/// Output of the vertex stage.
#[derive(Debug, Clone, Copy)]
pub struct ClipVertex<V> {
    pub clip: Vec4,
    pub varying: V,
}

impl<V: Varying> ClipVertex<V> {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            clip: self.clip.lerp(other.clip, t),
            varying: self.varying.lerp(other.varying, t),
        }
    }
}

/// A covered pixel.
#[derive(Debug, Clone, Copy)]
pub struct Fragment<V> {
    pub x: u32,
    pub y: u32,
    /// Normalized device depth in `[0, 1]`.
    pub depth: f32,
    pub front_facing: bool,
    pub varying: V,
}

/// Clip a triangle against the near plane (`z >= 0` in clip space).
///
/// Returns up to four vertices forming a convex polygon.
fn clip_near<V: Varying>(triangle: &[ClipVertex<V>; 3]) -> Vec<ClipVertex<V>> {
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let current = &triangle[i];
        let next = &triangle[(i + 1) % 3];
        let current_inside = current.clip.z >= 0.0;
        let next_inside = next.clip.z >= 0.0;
        if current_inside {
            out.push(*current);
        }
        if current_inside != next_inside {
            let t = current.clip.z / (current.clip.z - next.clip.z);
            out.push(current.lerp(next, t));
        }
    }
    out
}

struct ScreenVertex<V> {
    x: f32,
    y: f32,
    z: f32,
    inv_w: f32,
    varying: V,
}

fn to_screen<V: Varying>(vertex: &ClipVertex<V>, width: u32, height: u32) -> ScreenVertex<V> {
    let inv_w = 1.0 / vertex.clip.w;
    let ndc = vertex.clip.truncate() * inv_w;
    ScreenVertex {
        x: (ndc.x + 1.0) * 0.5 * width as f32,
        y: (1.0 - ndc.y) * 0.5 * height as f32,
        z: ndc.z,
        inv_w,
        varying: vertex.varying,
    }
}

fn edge(ax: f32, ay: f32, bx: f32, by: f32, px: f32, py: f32) -> f32 {
    (bx - ax) * (py - ay) - (by - ay) * (px - ax)
}

/// Rasterize one triangle into a `width` x `height` target.
///
/// `emit` is called once per covered pixel center; depth testing is left to
/// the caller.
pub fn rasterize_triangle<V, F>(
    triangle: [ClipVertex<V>; 3],
    width: u32,
    height: u32,
    cull: CullState,
    emit: &mut F,
) where
    V: Varying,
    F: FnMut(Fragment<V>),
{
    let polygon = clip_near(&triangle);
    if polygon.len() < 3 {
        return;
    }
    if polygon.iter().any(|v| v.clip.w <= f32::EPSILON) {
        return;
    }

    let screen: Vec<ScreenVertex<V>> = polygon
        .iter()
        .map(|v| to_screen(v, width, height))
        .collect();
    for i in 1..screen.len() - 1 {
        fill(&screen[0], &screen[i], &screen[i + 1], width, height, cull, emit);
    }
}

fn fill<V, F>(
    a: &ScreenVertex<V>,
    b: &ScreenVertex<V>,
    c: &ScreenVertex<V>,
    width: u32,
    height: u32,
    cull: CullState,
    emit: &mut F,
) where
    V: Varying,
    F: FnMut(Fragment<V>),
{
    let area = edge(a.x, a.y, b.x, b.y, c.x, c.y);
    if area.abs() <= f32::EPSILON {
        return;
    }
    // Window y points down, so counter-clockwise triangles have negative area.
    let front_facing = area < 0.0;
    if cull.culls(front_facing) {
        return;
    }

    let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
    let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
    let max_x = (a.x.max(b.x).max(c.x).ceil() as i64).clamp(0, width as i64) as u32;
    let max_y = (a.y.max(b.y).max(c.y).ceil() as i64).clamp(0, height as i64) as u32;

    for y in min_y..max_y {
        let py = y as f32 + 0.5;
        for x in min_x..max_x {
            let px = x as f32 + 0.5;
            let w0 = edge(b.x, b.y, c.x, c.y, px, py) / area;
            let w1 = edge(c.x, c.y, a.x, a.y, px, py) / area;
            let w2 = edge(a.x, a.y, b.x, b.y, px, py) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            let depth = w0 * a.z + w1 * b.z + w2 * c.z;
            if !(0.0..=1.0).contains(&depth) {
                continue;
            }

            let p0 = w0 * a.inv_w;
            let p1 = w1 * b.inv_w;
            let p2 = w2 * c.inv_w;
            let norm = 1.0 / (p0 + p1 + p2);
            let varying = a
                .varying
                .scaled(p0 * norm)
                .plus(b.varying.scaled(p1 * norm))
                .plus(c.varying.scaled(p2 * norm));

            emit(Fragment {
                x,
                y,
                depth,
                front_facing,
                varying,
            });
        }
    }
}
