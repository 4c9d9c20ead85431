//! End-to-end tests on the software renderer
//!
//! Renders the demo scene (floor, cube, light at (3, 6, 3)) and inspects the
//! shadow the cube casts on the floor.

use glam::Vec4;
use shadowmap::renderer::shadow::{shadow_visibility, ShadowClass};
use shadowmap::software::{BoundTarget, SoftwareDepthTarget};
use shadowmap::{
    DepthEncoding, FrameOrchestrator, FrameStatus, Framebuffer, RenderBackend, RenderError,
    ResourceTracker, SceneConfig, SoftwareRenderer,
};

const SIZE: u32 = 256;

fn scene(encoding: DepthEncoding) -> FrameOrchestrator<SoftwareRenderer> {
    let backend = SoftwareRenderer::new(SIZE, SIZE, encoding);
    let config = SceneConfig::default().encoding(encoding);
    let mut frame = FrameOrchestrator::create(backend, config).expect("scene should build");
    frame.resize(SIZE, SIZE).expect("resize should succeed");
    frame
}

/// Render at 45° and then one 40°/s step of 25 ms later (46°).
fn two_frames(
    encoding: DepthEncoding,
) -> (FrameOrchestrator<SoftwareRenderer>, Framebuffer, Framebuffer) {
    let mut frame = scene(encoding);
    frame.set_angle(45.0);
    assert_eq!(frame.render_frame(0.0).unwrap(), FrameStatus::Rendered);
    let first = frame.backend().last_frame().clone();

    assert_eq!(frame.render_frame(0.025).unwrap(), FrameStatus::Rendered);
    assert!((frame.angle() - 46.0).abs() < 1e-3);
    let second = frame.backend().last_frame().clone();
    (frame, first, second)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FloorPixel {
    Other,
    Shadowed,
    Lit,
}

fn classify_floor(
    frame: &FrameOrchestrator<SoftwareRenderer>,
    image: &Framebuffer,
) -> Vec<FloorPixel> {
    let floor = frame.scene().floor();
    let ambient = (frame.scene().floor_color().truncate() * frame.config().ambient).extend(1.0);
    let (width, height) = image.size();
    let mut pixels = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let class = if image.mesh(x, y) != Some(floor) {
                FloorPixel::Other
            } else if image.color(x, y).abs_diff_eq(ambient, 1e-5) {
                FloorPixel::Shadowed
            } else {
                FloorPixel::Lit
            };
            pixels.push(class);
        }
    }
    pixels
}

fn count(pixels: &[FloorPixel], class: FloorPixel) -> usize {
    pixels.iter().filter(|p| **p == class).count()
}

#[test]
fn test_cube_casts_shadow_on_floor() {
    let (frame, first, _) = two_frames(DepthEncoding::Native);
    let pixels = classify_floor(&frame, &first);
    assert!(count(&pixels, FloorPixel::Shadowed) > 0, "no shadowed floor pixels");
    assert!(count(&pixels, FloorPixel::Lit) > count(&pixels, FloorPixel::Shadowed));
}

#[test]
fn test_shadow_moves_with_cube() {
    let (frame, first, second) = two_frames(DepthEncoding::Native);
    let a = classify_floor(&frame, &first);
    let b = classify_floor(&frame, &second);
    assert!(count(&a, FloorPixel::Shadowed) > 0);
    assert!(count(&b, FloorPixel::Shadowed) > 0);

    let changed = a
        .iter()
        .zip(&b)
        .filter(|(p, q)| (**p == FloorPixel::Shadowed) != (**q == FloorPixel::Shadowed))
        .count();
    assert!(changed > 0, "shadow mask did not change between 45° and 46°");
}

#[test]
fn test_floor_colors_stable_between_frames() {
    let (frame, first, second) = two_frames(DepthEncoding::Native);
    let a = classify_floor(&frame, &first);
    let b = classify_floor(&frame, &second);
    let (width, _) = first.size();

    let mut compared = 0;
    for (i, (p, q)) in a.iter().zip(&b).enumerate() {
        if p == q && *p != FloorPixel::Other {
            let (x, y) = ((i as u32) % width, (i as u32) / width);
            assert_eq!(first.color(x, y), second.color(x, y), "pixel ({x}, {y})");
            compared += 1;
        }
    }
    assert!(compared > 0);
}

#[test]
fn test_packed_matches_native() {
    let (native_frame, native, _) = two_frames(DepthEncoding::Native);
    let (packed_frame, packed, _) = two_frames(DepthEncoding::Packed);
    let a = classify_floor(&native_frame, &native);
    let b = classify_floor(&packed_frame, &packed);

    let shadowed = count(&b, FloorPixel::Shadowed);
    assert!(shadowed > 0);
    let differing = a.iter().zip(&b).filter(|(p, q)| p != q).count();
    assert!(differing <= shadowed / 100, "{differing} pixels differ");
}

#[test]
fn test_resizes_leave_one_live_target() {
    let mut frame = scene(DepthEncoding::Native);
    frame.resize(128, 96).unwrap();
    frame.resize(200, 150).unwrap();
    assert_eq!(frame.backend().tracker().live(), 1);
    assert_eq!(frame.backend().depth_target().size(), Some((200, 150)));

    assert_eq!(frame.render_frame(0.016).unwrap(), FrameStatus::Rendered);
    assert_eq!(frame.backend().last_frame().size(), (200, 150));
}

#[test]
fn test_writer_guard_restores_on_error() {
    fn fail_midway(
        target: &mut SoftwareDepthTarget,
        slot: &mut BoundTarget,
    ) -> shadowmap::Result<()> {
        let mut writer = target.bind_as_render_target(slot)?;
        writer.store(0, 0, 0.5);
        Err(RenderError::DegenerateTransform("simulated failure".to_string()))
    }

    let mut target = SoftwareDepthTarget::new(DepthEncoding::Packed, ResourceTracker::new());
    target.rebuild(4, 4).unwrap();
    let mut slot = BoundTarget::Screen;
    assert!(fail_midway(&mut target, &mut slot).is_err());
    assert_eq!(slot, BoundTarget::Screen);
}

#[test]
fn test_encoding_mismatch_is_fatal() {
    let backend = SoftwareRenderer::new(64, 64, DepthEncoding::Native)
        .with_sampling_encoding(DepthEncoding::Packed);
    let mut frame = FrameOrchestrator::create(backend, SceneConfig::default()).unwrap();
    frame.resize(64, 64).unwrap();
    let err = frame.render_frame(0.016).unwrap_err();
    assert!(matches!(
        err,
        RenderError::EncodingMismatch {
            written: DepthEncoding::Native,
            read: DepthEncoding::Packed
        }
    ));
}

#[test]
fn test_stored_depth_classification() {
    for encoding in [DepthEncoding::Native, DepthEncoding::Packed] {
        let mut target = SoftwareDepthTarget::new(encoding, ResourceTracker::new());
        target.rebuild(4, 4).unwrap();
        let mut slot = BoundTarget::Screen;
        target.bind_as_render_target(&mut slot).unwrap().store(2, 2, 0.4);

        let reader = target.bind_as_readable_texture(0, encoding).unwrap();
        let at = |depth: f32| Vec4::new(0.5, 0.5, depth, 1.0);
        assert_eq!(shadow_visibility(&reader, at(0.6), 0.01), ShadowClass::Occluded);
        assert_eq!(shadow_visibility(&reader, at(0.3), 0.01), ShadowClass::Lit);
        assert_eq!(
            shadow_visibility(&reader, Vec4::new(0.5, 0.5, 0.6, 0.0), 0.01),
            ShadowClass::Occluded
        );
        drop(reader);

        target.bind_as_render_target(&mut slot).unwrap().store(2, 2, 0.0);
        let reader = target.bind_as_readable_texture(0, encoding).unwrap();
        assert_eq!(shadow_visibility(&reader, at(0.6), 0.01), ShadowClass::Lit);
    }
}
