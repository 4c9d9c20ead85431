//! GPU renderer tests
//!
//! These need a GPU adapter and are ignored by default:
//! `cargo test --test gpu_headless -- --ignored`
//!
//! Each test returns early when no adapter can be created.

use shadowmap::{
    DepthEncoding, FrameOrchestrator, FrameStatus, GpuRenderer, RenderBackend, RenderError,
    SceneConfig, WgpuContext,
};

const SIZE: u32 = 128;

fn context() -> Option<WgpuContext> {
    match WgpuContext::new_headless() {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            eprintln!("skipping: {e}");
            None
        }
    }
}

fn render(ctx: &WgpuContext, encoding: DepthEncoding) -> Vec<u8> {
    let renderer = GpuRenderer::headless(ctx, SIZE, SIZE, encoding).unwrap();
    let config = SceneConfig::default().encoding(encoding);
    let mut frame = FrameOrchestrator::create(renderer, config).unwrap();
    frame.resize(SIZE, SIZE).unwrap();
    frame.set_angle(45.0);
    assert_eq!(frame.render_frame(0.0).unwrap(), FrameStatus::Rendered);
    frame.backend().read_frame().unwrap()
}

#[test]
#[ignore = "requires a GPU adapter"]
fn test_gpu_frame_draws_scene() {
    let Some(ctx) = context() else { return };
    let pixels = render(&ctx, DepthEncoding::Native);
    assert_eq!(pixels.len(), (SIZE * SIZE * 4) as usize);
    // Something other than the black clear colour was drawn.
    assert!(pixels.chunks_exact(4).any(|p| p[0] > 0 || p[1] > 0 || p[2] > 0));
}

#[test]
#[ignore = "requires a GPU adapter"]
fn test_gpu_encodings_agree() {
    let Some(ctx) = context() else { return };
    let native = render(&ctx, DepthEncoding::Native);
    let packed = render(&ctx, DepthEncoding::Packed);
    let differing = native
        .chunks_exact(4)
        .zip(packed.chunks_exact(4))
        .filter(|(a, b)| a != b)
        .count();
    assert!(differing <= (SIZE * SIZE / 100) as usize, "{differing} pixels differ");
}

#[test]
#[ignore = "requires a GPU adapter"]
fn test_gpu_resize_keeps_one_target() {
    let Some(ctx) = context() else { return };
    let renderer = GpuRenderer::headless(&ctx, SIZE, SIZE, DepthEncoding::Native).unwrap();
    let mut frame = FrameOrchestrator::create(renderer, SceneConfig::default()).unwrap();
    frame.resize(64, 48).unwrap();
    frame.resize(96, 80).unwrap();
    assert_eq!(frame.backend().tracker().live(), 1);
    assert_eq!(frame.render_frame(0.016).unwrap(), FrameStatus::Rendered);
    assert_eq!(frame.backend().read_frame().unwrap().len(), 96 * 80 * 4);
}

#[test]
#[ignore = "requires a GPU adapter"]
fn test_gpu_rejected_creation_is_resource_error() {
    let Some(ctx) = context() else { return };
    let result = ctx.capture("empty texture", |device| {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("empty texture"),
            size: wgpu::Extent3d {
                width: 0,
                height: 0,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    });
    assert!(matches!(result, Err(RenderError::RenderResource(_))));
}

#[test]
#[ignore = "requires a GPU adapter"]
fn test_gpu_oversized_output_fails_at_startup() {
    let Some(ctx) = context() else { return };
    let too_large = ctx.max_texture_dimension() + 1;
    for encoding in [DepthEncoding::Native, DepthEncoding::Packed] {
        let result = GpuRenderer::headless(&ctx, too_large, 4, encoding);
        assert!(matches!(result, Err(RenderError::RenderResource(_))));
    }
}

#[test]
#[ignore = "requires a GPU adapter"]
fn test_gpu_failed_rebuild_skips_then_recovers() {
    let Some(ctx) = context() else { return };
    let renderer = GpuRenderer::headless(&ctx, SIZE, SIZE, DepthEncoding::Native).unwrap();
    let mut frame = FrameOrchestrator::create(renderer, SceneConfig::default()).unwrap();
    frame.resize(SIZE, SIZE).unwrap();

    let too_large = ctx.max_texture_dimension() + 1;
    let err = frame
        .backend_mut()
        .rebuild_depth_target(too_large, SIZE)
        .unwrap_err();
    assert!(matches!(err, RenderError::RenderResource(_)));
    assert_eq!(frame.backend().tracker().live(), 0);

    assert_eq!(frame.render_frame(0.0).unwrap(), FrameStatus::Skipped);
    assert!(frame.is_target_stale());
    assert_eq!(frame.render_frame(0.0).unwrap(), FrameStatus::Rendered);
    assert_eq!(frame.backend().tracker().live(), 1);
}
