//! Shared setup for the shadowmap benchmarks.

use shadowmap::{DepthEncoding, FrameOrchestrator, SceneConfig, SoftwareRenderer};

/// Software orchestrator for the demo scene, resized to `size` x `size`.
pub fn software_frame(size: u32, encoding: DepthEncoding) -> FrameOrchestrator<SoftwareRenderer> {
    let backend = SoftwareRenderer::new(size, size, encoding);
    let config = SceneConfig::default().encoding(encoding);
    let mut frame = match FrameOrchestrator::create(backend, config) {
        Ok(frame) => frame,
        Err(e) => panic!("failed to create benchmark scene: {e}"),
    };
    if let Err(e) = frame.resize(size, size) {
        panic!("failed to size benchmark scene: {e}");
    }
    frame
}

/// Evenly spaced depths in `[0, 1]`.
pub fn depth_samples(n: usize) -> Vec<f32> {
    (0..n).map(|i| i as f32 / (n - 1).max(1) as f32).collect()
}
