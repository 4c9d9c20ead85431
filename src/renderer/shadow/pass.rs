//! Shadow-map pass
//!
//! Renders every shadow-casting draw from the light into the depth target.

use super::target::GpuDepthTarget;
use crate::config::DepthEncoding;
use crate::context::WgpuContext;
use crate::core::buffer::DynamicUniformBuffer;
use crate::core::pipeline::PipelineBuilder;
use crate::core::render_states::DepthState;
use crate::core::shader::ShaderProgram;
use crate::core::vertex::VertexPN;
use crate::error::Result;
use crate::renderer::geometry::{Geometry, GpuMesh};
use crate::renderer::params::{prepare_draws, DrawItem, GlobalState, ShadowPassParams};

const SHADER: &str = include_str!("../../shaders/shadow.wgsl");

/// Per-draw uniform for the depth pass.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ShadowDrawUniform {
    light_mvp: [[f32; 4]; 4],
}

/// Light-space depth pass.
pub struct ShadowMapPass {
    encoding: DepthEncoding,
    pipeline: wgpu::RenderPipeline,
    draw_uniforms: DynamicUniformBuffer<ShadowDrawUniform>,
    draw_group: u32,
}

impl ShadowMapPass {
    /// Create the pass for the given encoding and pipeline state.
    pub fn new(ctx: &WgpuContext, encoding: DepthEncoding, state: &GlobalState) -> Result<Self> {
        let program = ShaderProgram::new(ctx, "shadow map shader", SHADER)?;
        let reflection = program.reflection();
        let (draw_group, draw_binding) = reflection.resource("draw")?;
        let attributes = [VertexPN::position_attribute(
            reflection.vertex_input("position")?,
        )];

        let draw_uniforms = DynamicUniformBuffer::new(
            ctx,
            draw_binding,
            wgpu::ShaderStages::VERTEX,
            8,
            "shadow draw uniforms",
        );

        let builder = PipelineBuilder::new(ctx)
            .label("shadow map pipeline")
            .shader(&program)
            .vertex_layout(VertexPN::layout(&attributes))
            .bind_group_layout(draw_group, draw_uniforms.bind_group_layout())
            .depth(DepthState::with_compare(state.depth_compare))
            .cull(state.cull);

        let pipeline = match encoding {
            DepthEncoding::Native => builder.fragment_entry("fs_native").build_depth_only()?,
            DepthEncoding::Packed => builder
                .fragment_entry("fs_packed")
                .color_format(GpuDepthTarget::PACKED_FORMAT)
                .build()?,
        };

        Ok(Self {
            encoding,
            pipeline,
            draw_uniforms,
            draw_group,
        })
    }

    pub fn encoding(&self) -> DepthEncoding {
        self.encoding
    }

    /// Record the pass into `encoder`. Returns the number of meshes drawn.
    pub fn render(
        &mut self,
        ctx: &WgpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &GpuDepthTarget,
        meshes: &[GpuMesh],
        draws: &[DrawItem],
        params: &ShadowPassParams,
    ) -> Result<usize> {
        let prepared = prepare_draws(draws, params.light_view, params.light_projection, true);
        let uniforms: Vec<ShadowDrawUniform> = prepared
            .iter()
            .map(|draw| ShadowDrawUniform {
                light_mvp: draw.transforms.mvp.to_cols_array_2d(),
            })
            .collect();
        self.draw_uniforms.write_all(ctx, &uniforms);

        let mut pass = target.bind_as_render_target(encoder)?;
        pass.set_pipeline(&self.pipeline);

        let mut drawn = 0;
        for (slot, draw) in prepared.iter().enumerate() {
            let Some(mesh) = meshes.get(draw.item.mesh.index()) else {
                tracing::warn!("Shadow pass: unknown mesh {}", draw.item.mesh.index());
                continue;
            };
            pass.set_bind_group(
                self.draw_group,
                self.draw_uniforms.bind_group(),
                &[self.draw_uniforms.offset(slot)],
            );
            mesh.draw(&mut pass);
            drawn += 1;
        }

        Ok(drawn)
    }
}
