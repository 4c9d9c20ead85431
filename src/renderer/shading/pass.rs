//! Shading pass
//!
//! Renders the scene from the eye, sampling the depth target to decide which
//! fragments the light can see.

use super::ShadingModel;
use crate::config::DepthEncoding;
use crate::context::WgpuContext;
use crate::core::buffer::{DynamicUniformBuffer, UniformBuffer};
use crate::core::pipeline::PipelineBuilder;
use crate::core::render_states::{ClearState, DepthState};
use crate::core::shader::ShaderProgram;
use crate::core::texture::DepthTexture;
use crate::core::vertex::VertexPN;
use crate::error::Result;
use crate::renderer::geometry::{Geometry, GpuMesh};
use crate::renderer::params::{prepare_draws, DrawItem, GlobalState, ShadingPassParams};
use crate::renderer::shadow::GpuDepthTarget;
use glam::Mat4;

const SHADING_SHADER: &str = include_str!("../../shaders/shading.wgsl");
const NATIVE_SAMPLING: &str = include_str!("../../shaders/shadow_sample_native.wgsl");
const PACKED_SAMPLING: &str = include_str!("../../shaders/shadow_sample_packed.wgsl");

/// Shading shader source with the sampling code for `encoding` appended.
pub fn shading_source(encoding: DepthEncoding) -> String {
    let sampling = match encoding {
        DepthEncoding::Native => NATIVE_SAMPLING,
        DepthEncoding::Packed => PACKED_SAMPLING,
    };
    format!("{SHADING_SHADER}\n{sampling}")
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct FrameUniform {
    shadow_matrix: [[f32; 4]; 4],
    light_color: [f32; 4],
    light_position: [f32; 4],
    attenuation: [f32; 4],
    params: [f32; 4],
}

impl FrameUniform {
    fn new(params: &ShadingPassParams) -> Self {
        let model = ShadingModel::new(&params.lighting, params.eye_view);
        let [constant, linear, quadratic] = model.attenuation.to_array();
        Self {
            shadow_matrix: params.shadow.combined.to_cols_array_2d(),
            light_color: params.lighting.light_color.to_array(),
            light_position: model.light_position_view.extend(1.0).to_array(),
            attenuation: [constant, linear, quadratic, model.ambient],
            params: [
                model.shininess,
                model.specular_strength,
                params.lighting.depth_bias,
                0.0,
            ],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct DrawUniform {
    mvp: [[f32; 4]; 4],
    model_view: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    base_color: [f32; 4],
}

/// Eye pass that applies lighting and the shadow test.
pub struct ShadingPass {
    encoding: DepthEncoding,
    pipeline: wgpu::RenderPipeline,
    frame_uniform: UniformBuffer<FrameUniform>,
    frame_group: u32,
    draw_uniforms: DynamicUniformBuffer<DrawUniform>,
    draw_group: u32,
    shadow_layout: wgpu::BindGroupLayout,
    shadow_group: u32,
    shadow_binding: u32,
    /// Bind group for the depth target, tagged with the target generation.
    shadow_bind_group: Option<(u64, wgpu::BindGroup)>,
}

impl ShadingPass {
    /// Create the pass writing into `color_format`.
    pub fn new(
        ctx: &WgpuContext,
        encoding: DepthEncoding,
        color_format: wgpu::TextureFormat,
        state: &GlobalState,
    ) -> Result<Self> {
        let source = shading_source(encoding);
        let program = ShaderProgram::new(ctx, "shading shader", &source)?;
        let reflection = program.reflection();
        let (frame_group, frame_binding) = reflection.resource("frame")?;
        let (draw_group, draw_binding) = reflection.resource("draw")?;
        let (shadow_group, shadow_binding) = reflection.resource("shadow_map")?;
        let attributes = [
            VertexPN::position_attribute(reflection.vertex_input("position")?),
            VertexPN::normal_attribute(reflection.vertex_input("normal")?),
        ];

        let frame_uniform = UniformBuffer::new(
            ctx,
            &bytemuck::Zeroable::zeroed(),
            frame_binding,
            Some("shading frame uniform"),
        );
        let draw_uniforms = DynamicUniformBuffer::new(
            ctx,
            draw_binding,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            8,
            "shading draw uniforms",
        );
        let shadow_layout = ctx.capture("shadow map layout", |device| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("shadow map layout"),
                entries: &[GpuDepthTarget::layout_entry(shadow_binding)],
            })
        })?;

        let pipeline = PipelineBuilder::new(ctx)
            .label("shading pipeline")
            .shader(&program)
            .vertex_layout(VertexPN::layout(&attributes))
            .bind_group_layout(frame_group, frame_uniform.bind_group_layout())
            .bind_group_layout(draw_group, draw_uniforms.bind_group_layout())
            .bind_group_layout(shadow_group, &shadow_layout)
            .color_format(color_format)
            .depth(DepthState::with_compare(state.depth_compare))
            .cull(state.cull)
            .build()?;

        Ok(Self {
            encoding,
            pipeline,
            frame_uniform,
            frame_group,
            draw_uniforms,
            draw_group,
            shadow_layout,
            shadow_group,
            shadow_binding,
            shadow_bind_group: None,
        })
    }

    pub fn encoding(&self) -> DepthEncoding {
        self.encoding
    }

    /// Record the pass into `encoder`. Returns the number of meshes drawn.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        ctx: &WgpuContext,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        depth: &DepthTexture,
        clear: ClearState,
        target: &GpuDepthTarget,
        meshes: &[GpuMesh],
        draws: &[DrawItem],
        params: &ShadingPassParams,
    ) -> Result<usize> {
        let stale = !matches!(
            &self.shadow_bind_group,
            Some((generation, _)) if *generation == target.generation()
        );
        if stale {
            let bind_group = target.bind_as_readable_texture(
                &self.shadow_layout,
                self.shadow_binding,
                self.encoding,
            )?;
            self.shadow_bind_group = Some((target.generation(), bind_group));
        }
        let Some((_, shadow_bind_group)) = &self.shadow_bind_group else {
            return Ok(0);
        };

        self.frame_uniform.update(ctx, &FrameUniform::new(params));

        let prepared = prepare_draws(draws, params.eye_view, params.eye_projection, false);
        let uniforms: Vec<DrawUniform> = prepared
            .iter()
            .map(|draw| DrawUniform {
                mvp: draw.transforms.mvp.to_cols_array_2d(),
                model_view: draw.transforms.model_view.to_cols_array_2d(),
                model: draw.transforms.model.to_cols_array_2d(),
                normal_matrix: Mat4::from_mat3(draw.transforms.normal_matrix).to_cols_array_2d(),
                base_color: draw.item.color.to_array(),
            })
            .collect();
        self.draw_uniforms.write_all(ctx, &uniforms);

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shading pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: clear.color_load_op(),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth.view(),
                depth_ops: Some(wgpu::Operations {
                    load: clear.depth_load_op(),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(self.frame_group, self.frame_uniform.bind_group(), &[]);
        pass.set_bind_group(self.shadow_group, shadow_bind_group, &[]);

        let mut drawn = 0;
        for (slot, draw) in prepared.iter().enumerate() {
            let Some(mesh) = meshes.get(draw.item.mesh.index()) else {
                tracing::warn!("Shading pass: unknown mesh {}", draw.item.mesh.index());
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shader::ShaderReflection;

    #[test]
    fn test_both_variants_validate() {
        for encoding in [DepthEncoding::Native, DepthEncoding::Packed] {
            let reflection = ShaderReflection::from_wgsl("shading", &shading_source(encoding))
                .unwrap_or_else(|e| panic!("{encoding} variant: {e}"));
            assert_eq!(reflection.resource("frame").unwrap(), (0, 0));
            assert_eq!(reflection.resource("draw").unwrap(), (1, 0));
            assert_eq!(reflection.resource("shadow_map").unwrap(), (2, 0));
            assert_eq!(reflection.vertex_input("position").unwrap(), 0);
            assert_eq!(reflection.vertex_input("normal").unwrap(), 1);
        }
    }

    #[test]
    fn test_both_variants_translate_to_glsl() {
        use naga::back::glsl;
        use naga::valid::{Capabilities, ValidationFlags, Validator};

        // The GL backend goes through GLSL, which has no texel fetch from
        // depth textures.
        for encoding in [DepthEncoding::Native, DepthEncoding::Packed] {
            let module = naga::front::wgsl::parse_str(&shading_source(encoding)).unwrap();
            let info = Validator::new(ValidationFlags::all(), Capabilities::all())
                .validate(&module)
                .unwrap();
            let pipeline_options = glsl::PipelineOptions {
                shader_stage: naga::ShaderStage::Fragment,
                entry_point: "fs_main".to_string(),
                multiview: None,
            };
            let options = glsl::Options::default();
            let mut out = String::new();
            let mut writer = glsl::Writer::new(
                &mut out,
                &module,
                &info,
                &options,
                &pipeline_options,
                naga::proc::BoundsCheckPolicies::default(),
            )
            .unwrap_or_else(|e| panic!("{encoding} variant: {e}"));
            writer
                .write()
                .unwrap_or_else(|e| panic!("{encoding} variant: {e}"));
            assert!(out.contains("texelFetch"));
        }
    }

    #[test]
    fn test_uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 128);
        assert_eq!(std::mem::size_of::<DrawUniform>(), 272);
    }
}
