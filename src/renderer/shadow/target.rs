//! GPU depth target
//!
//! Owns the light-space depth image. It is rebuilt whenever the viewport size
//! changes, so its size always matches the visible framebuffer.

use crate::config::DepthEncoding;
use crate::context::WgpuContext;
use crate::core::texture::{DepthTexture, Texture2D};
use crate::core::tracker::{ResourceTracker, TrackedResource};
use crate::error::{RenderError, Result};

struct DepthAllocation {
    depth: DepthTexture,
    /// RGBA8 color image holding packed depth; only in packed mode.
    packed: Option<Texture2D>,
    _token: TrackedResource,
}

/// Offscreen render target for the shadow-map pass.
pub struct GpuDepthTarget {
    ctx: WgpuContext,
    encoding: DepthEncoding,
    tracker: ResourceTracker,
    allocation: Option<DepthAllocation>,
    generation: u64,
}

impl GpuDepthTarget {
    /// Color format used for packed depth.
    pub const PACKED_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// Create an unallocated target. Call [`Self::rebuild`] before use.
    pub fn new(ctx: &WgpuContext, encoding: DepthEncoding, tracker: ResourceTracker) -> Self {
        Self {
            ctx: ctx.clone(),
            encoding,
            tracker,
            allocation: None,
            generation: 0,
        }
    }

    /// Release the current image and allocate one of `width` x `height`.
    ///
    /// On failure the target is left unallocated.
    pub fn rebuild(&mut self, width: u32, height: u32) -> Result<()> {
        self.allocation = None;
        self.generation += 1;

        let max = self.ctx.max_texture_dimension();
        if width == 0 || height == 0 || width > max || height > max {
            return Err(RenderError::resource(format!(
                "cannot allocate {width}x{height} depth target (device limit {max})"
            )));
        }

        let depth = DepthTexture::new(&self.ctx, width, height, Some("shadow depth target"))?;
        let packed = match self.encoding {
            DepthEncoding::Native => None,
            DepthEncoding::Packed => Some(Texture2D::new(
                &self.ctx,
                width,
                height,
                Self::PACKED_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                Some("shadow packed depth target"),
            )?),
        };

        self.allocation = Some(DepthAllocation {
            depth,
            packed,
            _token: self.tracker.track(),
        });
        tracing::info!(
            "Rebuilt {} depth target at {}x{}",
            self.encoding,
            width,
            height
        );
        Ok(())
    }

    fn allocation(&self) -> Result<&DepthAllocation> {
        self.allocation
            .as_ref()
            .ok_or_else(|| RenderError::resource("depth target is not allocated"))
    }

    /// Begin a pass that renders into this target.
    ///
    /// Depth is cleared to 1.0 and, in packed mode, color to zero. The previous
    /// target becomes current again when the returned pass is dropped.
    pub fn bind_as_render_target<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
    ) -> Result<wgpu::RenderPass<'e>> {
        let allocation = self.allocation()?;

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment<'_>>> = allocation
            .packed
            .iter()
            .map(|packed| {
                Some(wgpu::RenderPassColorAttachment {
                    view: packed.view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })
            })
            .collect();

        let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shadow map pass"),
            color_attachments: &color_attachments,
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: allocation.depth.view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        Ok(pass)
    }

    /// Layout entry describing how the shading pass reads this target.
    ///
    /// Both encodings are bound as unfilterable float textures. A depth image
    /// bound this way reads its depth in the red channel, which keeps texel
    /// fetches from depth valid on backends without depth `textureLoad`.
    pub fn layout_entry(unit: u32) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding: unit,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        }
    }

    /// Bind group exposing the stored depth at binding `unit`.
    ///
    /// Fails with [`RenderError::EncodingMismatch`] when the reader expects a
    /// different encoding than the one this target writes.
    pub fn bind_as_readable_texture(
        &self,
        layout: &wgpu::BindGroupLayout,
        unit: u32,
        expected: DepthEncoding,
    ) -> Result<wgpu::BindGroup> {
        if expected != self.encoding {
            return Err(RenderError::EncodingMismatch {
                written: self.encoding,
                read: expected,
            });
        }
        let allocation = self.allocation()?;
        let view = match &allocation.packed {
            Some(packed) => packed.view(),
            None => allocation.depth.view(),
        };

        self.ctx.capture("shadow map bind group", |device| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("shadow map bind group"),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: unit,
                    resource: wgpu::BindingResource::TextureView(view),
                }],
            })
        })
    }

    /// Current size, if allocated.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.allocation.as_ref().map(|a| a.depth.size())
    }

    pub fn encoding(&self) -> DepthEncoding {
        self.encoding
    }

    /// Incremented on every rebuild; bind groups from older generations are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drop the image.
    pub fn release(&mut self) {
        self.allocation = None;
    }
}
