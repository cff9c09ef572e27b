use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use surround_view::{
    compositor::{compose_radial, CompositorConfig, RadialLayout},
    pattern, CalibrationStore, CameraId, CompositionMode, Frame, Intrinsics, PerCamera,
    SurroundView,
};

const SIZES: [(usize, usize); 2] = [(320, 240), (640, 480)];

fn frames(width: usize, height: usize) -> PerCamera<Frame> {
    PerCamera::from_fn(|_| pattern::test_grid([width, height].into()).unwrap())
}

fn calibration(width: usize, height: usize) -> Arc<CalibrationStore> {
    let (w, h) = (width as f64, height as f64);
    let mut store = CalibrationStore::with_search_dirs(Vec::<&str>::new());
    for camera in CameraId::ALL {
        let mut intrinsics = Intrinsics::pinhole(w * 0.5, w * 0.5, w / 2.0, h / 2.0);
        intrinsics.d = [0.05, -0.01, 0.0, 0.0];
        intrinsics.xi = if camera.is_side() { 0.9 } else { 0.0 };
        store.set_intrinsics(camera, intrinsics);
    }
    Arc::new(store)
}

fn bench_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("SurroundView");
    group.sample_size(10);

    for (width, height) in SIZES.iter() {
        let parameter_string = format!("{}x{}", width, height);
        let frames = frames(*width, *height);
        let view = SurroundView::builder()
            .calibration(calibration(*width, *height))
            .build()
            .unwrap();

        for mode in CompositionMode::ALL {
            group.bench_with_input(
                BenchmarkId::new(mode.name(), &parameter_string),
                &frames,
                |b, i| b.iter(|| view.compose(black_box(mode), black_box(i))),
            );
        }
    }
    group.finish();
}

fn bench_blending(c: &mut Criterion) {
    let mut group = c.benchmark_group("Compositor");

    let frames = PerCamera::from_fn(|_| pattern::checkerboard([400, 300].into(), 20).ok());
    let layout = RadialLayout::default();
    let config = CompositorConfig::default();

    group.bench_function("radial_1200x1200", |b| {
        b.iter(|| compose_radial(black_box(&frames), black_box(&layout), black_box(&config)))
    });
    group.finish();
}

criterion_group!(benches, bench_modes, bench_blending);
criterion_main!(benches);
