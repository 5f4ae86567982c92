use criterion::{black_box, criterion_group, criterion_main, Criterion};
use curtain_transition_core::{Path, PathLerpMode};

fn long_path(segments: usize) -> Path {
    let mut path = Path::new();
    for i in 0..segments {
        let x = 250.0 + i as f32 * 100.0;
        let y = if i % 2 == 0 { 80.0 } else { -80.0 };
        path.add_segment([x, y, 0.0], false);
    }
    path
}

fn bake_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_bake");
    for segments in [1, 8, 32] {
        let mut path = long_path(segments);
        group.bench_function(format!("{segments}_segments"), |b| {
            b.iter(|| {
                path.update_spaced_points();
                black_box(path.spaced_points().len())
            })
        });
    }
    group.finish();
}

fn evaluate_benchmark(c: &mut Criterion) {
    let baked = long_path(8);
    let mut dynamic = long_path(8);
    dynamic.set_lerp_mode(PathLerpMode::Dynamic);
    c.bench_function("path_position_baked", |b| {
        b.iter(|| black_box(baked.evaluate_position(black_box(0.61))))
    });
    c.bench_function("path_position_dynamic", |b| {
        b.iter(|| black_box(dynamic.evaluate_position(black_box(0.61))))
    });
}

criterion_group!(benches, bake_benchmark, evaluate_benchmark);
criterion_main!(benches);
