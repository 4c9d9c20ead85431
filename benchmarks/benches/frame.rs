//! Renderer benchmarks (criterion - wall-clock time).
//!
//! Run all:    cargo bench --manifest-path benchmarks/Cargo.toml --bench frame
//! Filter:     cargo bench --manifest-path benchmarks/Cargo.toml --bench frame -- codec

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shadowmap::renderer::shadow::{pack_depth, unpack_depth};
use shadowmap::renderer::{generate_cube, generate_point_light_marker};
use shadowmap::DepthEncoding;
use shadowmap_bench::*;

// ---------------------------------------------------------------------------
// Software frame
// ---------------------------------------------------------------------------

fn bench_software_frame(c: &mut Criterion) {
    for encoding in [DepthEncoding::Native, DepthEncoding::Packed] {
        let mut group = c.benchmark_group(format!("software_frame/{encoding}"));
        for &size in &[256u32, 512] {
            let mut frame = software_frame(size, encoding);
            group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
                b.iter(|| frame.render_frame(black_box(1.0 / 60.0)));
            });
        }
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// Depth codec
// ---------------------------------------------------------------------------

fn bench_codec(c: &mut Criterion) {
    let depths = depth_samples(4096);
    let packed: Vec<[u8; 4]> = depths.iter().map(|&d| pack_depth(d)).collect();

    let mut group = c.benchmark_group("codec");
    group.bench_function("pack_4096", |b| {
        b.iter(|| {
            depths
                .iter()
                .map(|&d| pack_depth(black_box(d)))
                .fold(0u32, |acc, t| acc.wrapping_add(t[0] as u32))
        });
    });
    group.bench_function("unpack_4096", |b| {
        b.iter(|| {
            packed
                .iter()
                .map(|&t| unpack_depth(black_box(t)))
                .sum::<f32>()
        });
    });
    group.finish();
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

fn bench_geometry(c: &mut Criterion) {
    let mut group = c.benchmark_group("geometry");
    group.bench_function("cube", |b| b.iter(|| generate_cube(black_box(1.0))));
    for &segments in &[12u32, 48] {
        group.bench_with_input(
            BenchmarkId::new("light_marker", segments),
            &segments,
            |b, &segments| b.iter(|| generate_point_light_marker(black_box(0.1), segments)),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_software_frame, bench_codec, bench_geometry);
criterion_main!(benches);
