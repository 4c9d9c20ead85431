//! CPU depth target
//!
//! Same contract as the GPU target: rebuilt on every resize, written through a
//! scoped writer and read through an encoding-checked reader.

use crate::config::DepthEncoding;
use crate::core::tracker::{ResourceTracker, TrackedResource};
use crate::error::{RenderError, Result};
use crate::renderer::shadow::{pack_depth, unpack_depth, ShadowSampler};

/// Which image the software renderer currently draws into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundTarget {
    /// The visible framebuffer.
    #[default]
    Screen,
    /// The light-space depth target.
    DepthTarget,
}

enum DepthImage {
    Native {
        depth: Vec<f32>,
    },
    Packed {
        texels: Vec<[u8; 4]>,
        depth: Vec<f32>,
    },
}

struct DepthAllocation {
    width: u32,
    height: u32,
    image: DepthImage,
    _token: TrackedResource,
}

fn try_alloc<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|e| RenderError::resource(format!("depth target allocation failed: {e}")))?;
    v.resize(len, value);
    Ok(v)
}

/// Offscreen depth image for the software shadow pass.
pub struct SoftwareDepthTarget {
    encoding: DepthEncoding,
    tracker: ResourceTracker,
    max_dimension: u32,
    allocation: Option<DepthAllocation>,
}

impl SoftwareDepthTarget {
    /// Largest width or height accepted by default.
    pub const DEFAULT_MAX_DIMENSION: u32 = 8192;

    pub fn new(encoding: DepthEncoding, tracker: ResourceTracker) -> Self {
        Self {
            encoding,
            tracker,
            max_dimension: Self::DEFAULT_MAX_DIMENSION,
            allocation: None,
        }
    }

    /// Limit the accepted width and height.
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Release the current image and allocate one of `width` x `height`.
    pub fn rebuild(&mut self, width: u32, height: u32) -> Result<()> {
        self.allocation = None;

        let max = self.max_dimension;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(RenderError::resource(format!(
                "cannot allocate {width}x{height} depth target (limit {max})"
            )));
        }

        let len = width as usize * height as usize;
        let image = match self.encoding {
            DepthEncoding::Native => DepthImage::Native {
                depth: try_alloc(len, 1.0)?,
            },
            DepthEncoding::Packed => DepthImage::Packed {
                texels: try_alloc(len, [0; 4])?,
                depth: try_alloc(len, 1.0)?,
            },
        };

        self.allocation = Some(DepthAllocation {
            width,
            height,
            image,
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

    /// Make this target current in `slot` and clear it.
    ///
    /// The previous value of `slot` is restored when the writer drops.
    pub fn bind_as_render_target<'a>(
        &'a mut self,
        slot: &'a mut BoundTarget,
    ) -> Result<DepthTargetWriter<'a>> {
        let allocation = self
            .allocation
            .as_mut()
            .ok_or_else(|| RenderError::resource("depth target is not allocated"))?;

        match &mut allocation.image {
            DepthImage::Native { depth } => depth.fill(1.0),
            DepthImage::Packed { texels, depth } => {
                texels.fill([0; 4]);
                depth.fill(1.0);
            }
        }

        let previous = std::mem::replace(slot, BoundTarget::DepthTarget);
        Ok(DepthTargetWriter {
            allocation,
            slot,
            previous,
        })
    }

    /// Read access to the stored depth through texture unit `unit`.
    pub fn bind_as_readable_texture(
        &self,
        unit: u32,
        expected: DepthEncoding,
    ) -> Result<DepthTargetReader<'_>> {
        if expected != self.encoding {
            return Err(RenderError::EncodingMismatch {
                written: self.encoding,
                read: expected,
            });
        }
        let allocation = self
            .allocation
            .as_ref()
            .ok_or_else(|| RenderError::resource("depth target is not allocated"))?;
        Ok(DepthTargetReader { allocation, unit })
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        self.allocation.as_ref().map(|a| (a.width, a.height))
    }

    pub fn encoding(&self) -> DepthEncoding {
        self.encoding
    }

    pub fn release(&mut self) {
        self.allocation = None;
    }
}

/// Scoped write access to a bound depth target.
pub struct DepthTargetWriter<'a> {
    allocation: &'a mut DepthAllocation,
    slot: &'a mut BoundTarget,
    previous: BoundTarget,
}

impl DepthTargetWriter<'_> {
    pub fn size(&self) -> (u32, u32) {
        (self.allocation.width, self.allocation.height)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.allocation.width as usize + x as usize
    }

    /// Depth currently stored for the depth test.
    pub fn depth(&self, x: u32, y: u32) -> f32 {
        let i = self.index(x, y);
        match &self.allocation.image {
            DepthImage::Native { depth } | DepthImage::Packed { depth, .. } => depth[i],
        }
    }

    /// Store a fragment that passed the depth test.
    pub fn store(&mut self, x: u32, y: u32, depth: f32) {
        let i = self.index(x, y);
        match &mut self.allocation.image {
            DepthImage::Native { depth: plane } => plane[i] = depth,
            DepthImage::Packed {
                texels,
                depth: plane,
            } => {
                plane[i] = depth;
                texels[i] = pack_depth(depth);
            }
        }
    }
}

impl Drop for DepthTargetWriter<'_> {
    fn drop(&mut self) {
        *self.slot = self.previous;
    }
}

/// Read access to a depth target, decoding packed texels on load.
pub struct DepthTargetReader<'a> {
    allocation: &'a DepthAllocation,
    unit: u32,
}

impl DepthTargetReader<'_> {
    /// Texture unit this reader was bound to.
    pub fn unit(&self) -> u32 {
        self.unit
    }
}

impl ShadowSampler for DepthTargetReader<'_> {
    fn size(&self) -> (u32, u32) {
        (self.allocation.width, self.allocation.height)
    }

    fn texel_depth(&self, x: u32, y: u32) -> f32 {
        let i = y as usize * self.allocation.width as usize + x as usize;
        match &self.allocation.image {
            DepthImage::Native { depth } => depth[i],
            DepthImage::Packed { texels, .. } => unpack_depth(texels[i]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::shadow::PACKED_DEPTH_TOLERANCE;

    #[test]
    fn test_rebuild_keeps_one_live_allocation() {
        let tracker = ResourceTracker::new();
        let mut target = SoftwareDepthTarget::new(DepthEncoding::Native, tracker.clone());
        target.rebuild(64, 32).unwrap();
        target.rebuild(128, 96).unwrap();
        assert_eq!(tracker.live(), 1);
        assert_eq!(target.size(), Some((128, 96)));
        target.release();
        assert_eq!(tracker.live(), 0);
    }

    #[test]
    fn test_rebuild_rejects_bad_sizes() {
        let tracker = ResourceTracker::new();
        let mut target =
            SoftwareDepthTarget::new(DepthEncoding::Native, tracker.clone()).with_max_dimension(64);
        target.rebuild(32, 32).unwrap();
        assert!(matches!(
            target.rebuild(0, 32),
            Err(RenderError::RenderResource(_))
        ));
        assert_eq!(target.size(), None);
        assert!(target.rebuild(65, 32).is_err());
        assert_eq!(tracker.live(), 0);
    }

    #[test]
    fn test_writer_restores_slot() {
        let mut target = SoftwareDepthTarget::new(DepthEncoding::Native, ResourceTracker::new());
        target.rebuild(4, 4).unwrap();
        let mut slot = BoundTarget::Screen;
        {
            let mut writer = target.bind_as_render_target(&mut slot).unwrap();
            writer.store(1, 2, 0.25);
        }
        assert_eq!(slot, BoundTarget::Screen);
    }

    #[test]
    fn test_unallocated_bind_leaves_slot() {
        let mut target = SoftwareDepthTarget::new(DepthEncoding::Native, ResourceTracker::new());
        let mut slot = BoundTarget::Screen;
        assert!(target.bind_as_render_target(&mut slot).is_err());
        assert_eq!(slot, BoundTarget::Screen);
    }

    #[test]
    fn test_packed_read_back() {
        let mut target = SoftwareDepthTarget::new(DepthEncoding::Packed, ResourceTracker::new());
        target.rebuild(4, 4).unwrap();
        let mut slot = BoundTarget::Screen;
        target
            .bind_as_render_target(&mut slot)
            .unwrap()
            .store(2, 3, 0.4);

        let reader = target
            .bind_as_readable_texture(1, DepthEncoding::Packed)
            .unwrap();
        assert_eq!(reader.unit(), 1);
        assert!((reader.texel_depth(2, 3) - 0.4).abs() <= PACKED_DEPTH_TOLERANCE);
        assert_eq!(reader.texel_depth(0, 0), 0.0);
    }

    #[test]
    fn test_mismatched_reader_is_rejected() {
        let mut target = SoftwareDepthTarget::new(DepthEncoding::Packed, ResourceTracker::new());
        target.rebuild(4, 4).unwrap();
        let err = target
            .bind_as_readable_texture(0, DepthEncoding::Native)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            RenderError::EncodingMismatch {
                written: DepthEncoding::Packed,
                read: DepthEncoding::Native
            }
        ));
    }
}
