//! Render pipeline builder
//!
//! Provides a builder pattern for creating wgpu render pipelines.

use crate::context::WgpuContext;
use crate::core::render_states::{CullState, DepthState};
use crate::core::shader::ShaderProgram;
use crate::core::texture::DepthTexture;
use crate::error::{RenderError, Result};

/// Builder for creating render pipelines.
pub struct PipelineBuilder<'a> {
    ctx: &'a WgpuContext,
    label: Option<&'a str>,
    program: Option<&'a ShaderProgram>,
    vertex_entry: &'a str,
    fragment_entry: &'a str,
    vertex_layouts: Vec<wgpu::VertexBufferLayout<'a>>,
    bind_group_layouts: Vec<(u32, &'a wgpu::BindGroupLayout)>,
    color_format: Option<wgpu::TextureFormat>,
    depth_state: DepthState,
    cull_state: CullState,
}

impl<'a> PipelineBuilder<'a> {
    /// Create a new pipeline builder.
    pub fn new(ctx: &'a WgpuContext) -> Self {
        Self {
            ctx,
            label: None,
            program: None,
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
            vertex_layouts: Vec::new(),
            bind_group_layouts: Vec::new(),
            color_format: None,
            depth_state: DepthState::default(),
            cull_state: CullState::Back,
        }
    }

    /// Set the pipeline label.
    pub fn label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    /// Set the shader program.
    pub fn shader(mut self, program: &'a ShaderProgram) -> Self {
        self.program = Some(program);
        self
    }

    /// Set the fragment shader entry point.
    pub fn fragment_entry(mut self, entry: &'a str) -> Self {
        self.fragment_entry = entry;
        self
    }

    /// Add a vertex buffer layout.
    pub fn vertex_layout(mut self, layout: wgpu::VertexBufferLayout<'a>) -> Self {
        self.vertex_layouts.push(layout);
        self
    }

    /// Add a bind group layout for the given group index.
    ///
    /// Groups may be added in any order but must cover `0..n` without gaps.
    pub fn bind_group_layout(mut self, group: u32, layout: &'a wgpu::BindGroupLayout) -> Self {
        self.bind_group_layouts.push((group, layout));
        self
    }

    /// Set the color target format.
    pub fn color_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.color_format = Some(format);
        self
    }

    /// Set the depth state.
    pub fn depth(mut self, state: DepthState) -> Self {
        self.depth_state = state;
        self
    }

    /// Set the cull state.
    pub fn cull(mut self, state: CullState) -> Self {
        self.cull_state = state;
        self
    }

    fn ordered_layouts(&self) -> Result<Vec<&'a wgpu::BindGroupLayout>> {
        let mut layouts = self.bind_group_layouts.clone();
        layouts.sort_by_key(|(group, _)| *group);
        for (expected, (group, _)) in layouts.iter().enumerate() {
            if *group != expected as u32 {
                return Err(RenderError::resource(format!(
                    "pipeline '{}' has no bind group layout for group {expected}",
                    self.label.unwrap_or("unnamed")
                )));
            }
        }
        Ok(layouts.into_iter().map(|(_, layout)| layout).collect())
    }

    /// Build a depth-only render pipeline (no color output).
    /// Used for shadow map generation.
    pub fn build_depth_only(mut self) -> Result<wgpu::RenderPipeline> {
        self.color_format = None;
        self.build()
    }

    /// Build the render pipeline.
    ///
    /// Without a color format the pipeline writes depth only.
    pub fn build(self) -> Result<wgpu::RenderPipeline> {
        let program = self
            .program
            .ok_or_else(|| RenderError::resource("shader program is required"))?;

        for entry in [self.vertex_entry, self.fragment_entry] {
            if !program.reflection().has_entry_point(entry) {
                return Err(RenderError::resource(format!(
                    "shader has no entry point '{entry}'"
                )));
            }
        }

        let bind_group_layouts = self.ordered_layouts()?;

        let color_targets = match self.color_format {
            Some(format) => vec![Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            None => Vec::new(),
        };

        let label = self.label.unwrap_or("render pipeline");
        let pipeline = self.ctx.capture(label, |device| {
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: self.label,
                bind_group_layouts: &bind_group_layouts,
                immediate_size: 0,
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: self.label,
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: program.module(),
                    entry_point: Some(self.vertex_entry),
                    buffers: &self.vertex_layouts,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: program.module(),
                    entry_point: Some(self.fragment_entry),
                    targets: &color_targets,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: self.cull_state.to_wgpu(),
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: Some(self.depth_state.to_wgpu(DepthTexture::FORMAT)),
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview_mask: None,
                cache: None,
            })
        })?;

        Ok(pipeline)
    }
}
