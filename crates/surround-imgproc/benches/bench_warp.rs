use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use surround_image::Image;
use surround_imgproc::{
    calibration::{
        distortion::{generate_correction_map_polynomial, PolynomialDistortion},
        fisheye::{generate_correction_map_fisheye, KannalaBrandtDistortion},
        CameraIntrinsic,
    },
    interpolation::{remap, InterpolationMode},
    warp::{get_perspective_transform, warp_cylindrical, warp_perspective},
};

const SIZES: [(usize, usize); 3] = [(320, 240), (640, 480), (1280, 720)];

fn bench_warp_perspective(c: &mut Criterion) {
    let mut group = c.benchmark_group("WarpPerspective");

    for (width, height) in SIZES.iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);

        let image_size = [*width, *height].into();
        let image = Image::<u8, 3>::new(image_size, vec![0u8; width * height * 3]).unwrap();
        let output = Image::<u8, 3>::from_size_val(image_size, 0).unwrap();

        let (w, h) = (*width as f32, *height as f32);
        let m = get_perspective_transform(
            &[[0.0, h], [w, h], [0.15 * w, 0.3 * h], [0.85 * w, 0.3 * h]],
            &[[0.25 * w, h], [0.75 * w, h], [0.75 * w, 0.2 * h], [0.25 * w, 0.2 * h]],
        )
        .unwrap();

        group.bench_with_input(
            BenchmarkId::new("bird_eye_quad", &parameter_string),
            &(&image, &output, m),
            |b, i| {
                let (src, mut dst, m) = (i.0.clone(), i.1.clone(), i.2);
                b.iter(|| {
                    warp_perspective(
                        black_box(&src),
                        black_box(&mut dst),
                        black_box(&m),
                        black_box(InterpolationMode::Bilinear),
                    )
                })
            },
        );
    }
    group.finish();
}

fn bench_undistort(c: &mut Criterion) {
    let mut group = c.benchmark_group("Undistort");

    for (width, height) in SIZES.iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);

        let image_size = [*width, *height].into();
        let image = Image::<u8, 3>::new(image_size, vec![0u8; width * height * 3]).unwrap();
        let output = Image::<u8, 3>::from_size_val(image_size, 0).unwrap();

        let k = CameraIntrinsic {
            fx: *width as f64,
            fy: *height as f64,
            cx: *width as f64 / 2.0,
            cy: *height as f64 / 2.0,
        };

        group.bench_with_input(
            BenchmarkId::new("polynomial_map", &parameter_string),
            &(k, image_size),
            |b, i| {
                let distortion = PolynomialDistortion::from_opencv_coefficients(&[-0.1, 0.01, 0.0, 0.0]);
                b.iter(|| {
                    generate_correction_map_polynomial(
                        black_box(&i.0),
                        black_box(&i.0.scaled_focal(0.6)),
                        black_box(&distortion),
                        black_box(&i.1),
                    )
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("fisheye_map_remap", &parameter_string),
            &(&image, &output, k),
            |b, i| {
                let (src, mut dst, k) = (i.0.clone(), i.1.clone(), i.2);
                let distortion = KannalaBrandtDistortion::from([0.05, -0.01, 0.0, 0.0]);
                b.iter(|| {
                    let (map_x, map_y) = generate_correction_map_fisheye(
                        &k,
                        &k.scaled_focal(0.45),
                        &distortion,
                        &src.size(),
                    )
                    .unwrap();
                    remap(
                        black_box(&src),
                        black_box(&mut dst),
                        &map_x,
                        &map_y,
                        InterpolationMode::Bilinear,
                    )
                })
            },
        );
    }
    group.finish();
}

fn bench_warp_cylindrical(c: &mut Criterion) {
    let mut group = c.benchmark_group("WarpCylindrical");

    for (width, height) in SIZES.iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);
        let image = Image::<u8, 3>::new([*width, *height].into(), vec![0u8; width * height * 3]).unwrap();
        let focal = *width as f32 * 0.5;

        group.bench_with_input(
            BenchmarkId::new("nearest", &parameter_string),
            &image,
            |b, i| b.iter(|| warp_cylindrical(black_box(i), black_box(focal))),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_warp_perspective,
    bench_undistort,
    bench_warp_cylindrical
);
criterion_main!(benches);
