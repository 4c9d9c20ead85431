//! Window settings

use winit::dpi::LogicalSize;

/// How the host window is opened and presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSettings {
    pub title: String,
    /// Logical size `(width, height)` the window opens at.
    pub size: (u32, u32),
    pub resizable: bool,
    /// Wait for vertical sync when presenting.
    pub vsync: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "shadowmap".to_string(),
            size: (800, 600),
            resizable: true,
            vsync: true,
        }
    }
}

impl WindowSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub(crate) fn inner_size(&self) -> LogicalSize<u32> {
        LogicalSize::new(self.size.0.max(1), self.size.1.max(1))
    }

    /// Surface present mode for the vsync setting.
    pub(crate) fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_mode_follows_vsync() {
        let settings = WindowSettings::new();
        assert_eq!(settings.present_mode(), wgpu::PresentMode::AutoVsync);
        assert_eq!(
            settings.vsync(false).present_mode(),
            wgpu::PresentMode::AutoNoVsync
        );
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let size = WindowSettings::new().size(0, 300).inner_size();
        assert_eq!((size.width, size.height), (1, 300));
    }
}
