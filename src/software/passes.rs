//! Software shadow-map and shading passes
//!
//! Vertex stage, rasterization and fragment stage of both passes on the CPU.
//! The fragment stage uses the same [`ShadingModel`] and [`shadow_visibility`]
//! functions the WGSL shaders mirror.

use super::framebuffer::Framebuffer;
use super::raster::{rasterize_triangle, ClipVertex, Fragment};
use super::target::{DepthTargetReader, DepthTargetWriter};
use crate::renderer::geometry::MeshData;
use crate::renderer::params::{
    prepare_draws, DrawItem, GlobalState, ShadingPassParams, ShadowPassParams,
};
use crate::renderer::shading::ShadingModel;
use crate::renderer::shadow::shadow_visibility;
use glam::Vec3;
use std::sync::Arc;

/// Render shadow casters into the bound depth target. Returns the number of draws.
pub fn render_shadow_map(
    target: &mut DepthTargetWriter<'_>,
    meshes: &[Arc<MeshData>],
    draws: &[DrawItem],
    params: &ShadowPassParams,
    state: &GlobalState,
) -> usize {
    let (width, height) = target.size();
    let prepared = prepare_draws(draws, params.light_view, params.light_projection, true);

    let mut drawn = 0;
    for draw in &prepared {
        let Some(mesh) = meshes.get(draw.item.mesh.index()) else {
            tracing::warn!("Shadow pass: unknown mesh {}", draw.item.mesh.index());
            continue;
        };
        let clip: Vec<_> = mesh
            .positions
            .iter()
            .map(|p| ClipVertex {
                clip: draw.transforms.mvp * p.extend(1.0),
                varying: (),
            })
            .collect();

        for [a, b, c] in mesh.triangles() {
            rasterize_triangle(
                [clip[a], clip[b], clip[c]],
                width,
                height,
                state.cull,
                &mut |fragment: Fragment<()>| {
                    let stored = target.depth(fragment.x, fragment.y);
                    if state.depth_compare.passes(fragment.depth, stored) {
                        target.store(fragment.x, fragment.y, fragment.depth);
                    }
                },
            );
        }
        drawn += 1;
    }
    drawn
}

/// Varyings of the shading pass: world position, then view position and normal.
type ShadingVarying = (Vec3, (Vec3, Vec3));

/// Render the visible image, testing each fragment against `shadow_map`.
/// Returns the number of draws.
pub fn render_shading(
    framebuffer: &mut Framebuffer,
    shadow_map: &DepthTargetReader<'_>,
    meshes: &[Arc<MeshData>],
    draws: &[DrawItem],
    params: &ShadingPassParams,
    state: &GlobalState,
) -> usize {
    let (width, height) = framebuffer.size();
    let model = ShadingModel::new(&params.lighting, params.eye_view);
    let bias = params.lighting.depth_bias;
    let prepared = prepare_draws(draws, params.eye_view, params.eye_projection, false);

    let mut drawn = 0;
    for draw in &prepared {
        let Some(mesh) = meshes.get(draw.item.mesh.index()) else {
            tracing::warn!("Shading pass: unknown mesh {}", draw.item.mesh.index());
            continue;
        };
        let transforms = &draw.transforms;
        let clip: Vec<ClipVertex<ShadingVarying>> = mesh
            .positions
            .iter()
            .zip(&mesh.normals)
            .map(|(p, n)| {
                let position = p.extend(1.0);
                ClipVertex {
                    clip: transforms.mvp * position,
                    varying: (
                        (transforms.model * position).truncate(),
                        (
                            (transforms.model_view * position).truncate(),
                            transforms.normal_matrix * *n,
                        ),
                    ),
                }
            })
            .collect();

        let handle = draw.item.mesh;
        let base = draw.item.color;
        for [a, b, c] in mesh.triangles() {
            rasterize_triangle(
                [clip[a], clip[b], clip[c]],
                width,
                height,
                state.cull,
                &mut |fragment: Fragment<ShadingVarying>| {
                    let stored = framebuffer.depth(fragment.x, fragment.y);
                    if !state.depth_compare.passes(fragment.depth, stored) {
                        return;
                    }
                    let (world, (view, normal)) = fragment.varying;
                    let coord = params.shadow.shadow_coord(world.extend(1.0));
                    let visibility = shadow_visibility(shadow_map, coord, bias).visibility();
                    let color = model.shade(view, normal, base, visibility);
                    framebuffer.write(fragment.x, fragment.y, fragment.depth, color, handle);
                },
            );
        }
        drawn += 1;
    }
    drawn
}
