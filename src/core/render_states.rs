//! Render state configurations
//!
//! Provides convenient structs for configuring render pipeline states.

/// Clear state for render targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearState {
    /// Color to clear to (RGBA), or None to not clear.
    pub color: Option<[f32; 4]>,
    /// Depth value to clear to (0.0-1.0), or None to not clear.
    pub depth: Option<f32>,
}

impl ClearState {
    /// Create a clear state that clears both color and depth.
    pub fn color_and_depth(color: [f32; 4], depth: f32) -> Self {
        Self {
            color: Some(color),
            depth: Some(depth),
        }
    }

    /// Get the wgpu load operation for color.
    pub fn color_load_op(&self) -> wgpu::LoadOp<wgpu::Color> {
        match self.color {
            Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            }),
            None => wgpu::LoadOp::Load,
        }
    }

    /// Get the wgpu load operation for depth.
    pub fn depth_load_op(&self) -> wgpu::LoadOp<f32> {
        match self.depth {
            Some(d) => wgpu::LoadOp::Clear(d),
            None => wgpu::LoadOp::Load,
        }
    }
}

impl Default for ClearState {
    fn default() -> Self {
        Self::color_and_depth([0.0, 0.0, 0.0, 1.0], 1.0)
    }
}

/// Depth comparison used by both passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthCompare {
    Less,
    #[default]
    LessEqual,
    Always,
}

impl DepthCompare {
    /// Whether a fragment at `incoming` depth passes against `stored`.
    pub fn passes(&self, incoming: f32, stored: f32) -> bool {
        match self {
            DepthCompare::Less => incoming < stored,
            DepthCompare::LessEqual => incoming <= stored,
            DepthCompare::Always => true,
        }
    }

    /// Convert to wgpu compare function.
    pub fn to_wgpu(&self) -> wgpu::CompareFunction {
        match self {
            DepthCompare::Less => wgpu::CompareFunction::Less,
            DepthCompare::LessEqual => wgpu::CompareFunction::LessEqual,
            DepthCompare::Always => wgpu::CompareFunction::Always,
        }
    }
}

/// Depth test configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthState {
    /// Whether to write to the depth buffer.
    pub write: bool,
    /// Comparison function for depth test.
    pub compare: DepthCompare,
}

impl DepthState {
    /// Depth testing enabled with writes.
    pub fn read_write() -> Self {
        Self {
            write: true,
            compare: DepthCompare::LessEqual,
        }
    }

    /// Depth testing with writes and an explicit comparison.
    pub fn with_compare(compare: DepthCompare) -> Self {
        Self {
            write: true,
            compare,
        }
    }

    /// Convert to wgpu depth stencil state.
    pub fn to_wgpu(&self, format: wgpu::TextureFormat) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format,
            depth_write_enabled: self.write,
            depth_compare: self.compare.to_wgpu(),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }
}

impl Default for DepthState {
    fn default() -> Self {
        Self::read_write()
    }
}

/// Cull mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullState {
    /// No culling.
    None,
    /// Cull front faces.
    Front,
    /// Cull back faces.
    #[default]
    Back,
}

impl CullState {
    /// Convert to wgpu cull mode.
    pub fn to_wgpu(&self) -> Option<wgpu::Face> {
        match self {
            CullState::None => None,
            CullState::Front => Some(wgpu::Face::Front),
            CullState::Back => Some(wgpu::Face::Back),
        }
    }

    /// Whether a triangle facing the given way is discarded.
    pub fn culls(&self, front_facing: bool) -> bool {
        match self {
            CullState::None => false,
            CullState::Front => front_facing,
            CullState::Back => !front_facing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_less_equal_accepts_ties() {
        assert!(DepthCompare::LessEqual.passes(0.5, 0.5));
        assert!(!DepthCompare::Less.passes(0.5, 0.5));
        assert!(!DepthCompare::LessEqual.passes(0.6, 0.5));
    }

    #[test]
    fn test_back_face_culling() {
        assert!(CullState::Back.culls(false));
        assert!(!CullState::Back.culls(true));
        assert!(!CullState::None.culls(false));
    }
}
