//! Benchmarks for the color operator evaluators.
//!
//! Run with: `cargo bench -p vfx-bench`

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use vfx_color::aces2::{Aces2Params, OutputTransform};
use vfx_core::{BitDepth, PixelBuf, PixelBufMut};
use vfx_math::primaries::{rgb_to_rgb_matrix, ACES_AP0, ACES_AP1, REC709};
use vfx_math::sse_math;
use vfx_ops::log_op::{LogOpData, LogParams, LogRenderer};
use vfx_ops::lut1d::{InversionQuality, Lut1DOpData, Lut1DRenderer};
use vfx_ops::matrix::{MatrixOpData, MatrixRenderer};
use vfx_ops::CpuOp;

const PIXELS: usize = 64 * 1024;

/// Grey-ish RGBA ramp in `[0, 1]`.
fn ramp_f32(n: usize) -> Vec<f32> {
    (0..n)
        .flat_map(|i| {
            let x = i as f32 / n as f32;
            [x, x * 0.9 + 0.05, x * 0.8 + 0.1, 1.0]
        })
        .collect()
}

fn gamma_lut(n: usize) -> Lut1DOpData {
    let values = (0..n)
        .flat_map(|i| {
            let v = (i as f32 / (n - 1) as f32).powf(1.0 / 2.2);
            [v, v, v]
        })
        .collect();
    Lut1DOpData::from_values(values, false, false).unwrap()
}

/// Runs `op` from `src` into a scratch buffer of the same size.
fn run_f32(op: &dyn CpuOp, src: &[f32], dst: &mut [f32]) {
    op.apply(PixelBuf::f32(src).unwrap(), PixelBufMut::f32(dst).unwrap())
        .unwrap();
}

/// 1D LUT forward, inverse and integer lookup.
fn bench_lut1d(c: &mut Criterion) {
    let mut group = c.benchmark_group("lut1d");
    group.throughput(Throughput::Elements(PIXELS as u64));

    let src = ramp_f32(PIXELS);
    let mut dst = vec![0.0f32; src.len()];

    for size in [256, 4096] {
        let data = gamma_lut(size);
        let fwd = Lut1DRenderer::new(&data.finalize().unwrap(), BitDepth::F32, BitDepth::F32).unwrap();
        group.bench_with_input(BenchmarkId::new("forward_f32", size), &src, |b, s| {
            b.iter(|| run_f32(&fwd, black_box(s), &mut dst))
        });

        let exact = data.inverse().finalize().unwrap();
        let inv = Lut1DRenderer::new(&exact, BitDepth::F32, BitDepth::F32).unwrap();
        group.bench_with_input(BenchmarkId::new("inverse_exact", size), &src, |b, s| {
            b.iter(|| run_f32(&inv, black_box(s), &mut dst))
        });

        let fast = data
            .inverse()
            .with_inversion_quality(InversionQuality::Fast)
            .finalize()
            .unwrap();
        let inv = Lut1DRenderer::new(&fast, BitDepth::F32, BitDepth::F32).unwrap();
        group.bench_with_input(BenchmarkId::new("inverse_fast", size), &src, |b, s| {
            b.iter(|| run_f32(&inv, black_box(s), &mut dst))
        });
    }

    let data = gamma_lut(256).finalize().unwrap();
    let lookup = Lut1DRenderer::new(&data, BitDepth::U8, BitDepth::U8).unwrap();
    let src8: Vec<u8> = (0..PIXELS * 4).map(|i| (i % 256) as u8).collect();
    let mut dst8 = vec![0u8; src8.len()];
    group.bench_function("u8_lookup", |b| {
        b.iter(|| {
            lookup
                .apply(PixelBuf::u8(black_box(&src8)).unwrap(), PixelBufMut::u8(&mut dst8).unwrap())
                .unwrap()
        })
    });

    group.finish();
}

/// Lin-to-log shaper and camera log.
fn bench_log(c: &mut Criterion) {
    let mut group = c.benchmark_group("log");
    group.throughput(Throughput::Elements(PIXELS as u64));

    let src = ramp_f32(PIXELS);
    let mut dst = vec![0.0f32; src.len()];

    let shaper = LogOpData::lin_to_log(2.0, LogParams::new(0.05, 0.62, 1.0, 0.006));
    let op = LogRenderer::new(&shaper.finalize().unwrap(), BitDepth::F32, BitDepth::F32).unwrap();
    group.bench_function("lin_to_log", |b| b.iter(|| run_f32(&op, black_box(&src), &mut dst)));

    let acescct = LogParams::new(1.0 / 17.52, 9.72 / 17.52, 1.0, 0.0).with_lin_break(0.0078125);
    let camera = LogOpData::camera(2.0, acescct);
    let op = LogRenderer::new(&camera.finalize().unwrap(), BitDepth::F32, BitDepth::F32).unwrap();
    group.bench_function("camera", |b| b.iter(|| run_f32(&op, black_box(&src), &mut dst)));

    group.finish();
}

/// Diagonal scale/offset against a full 4x4 matrix.
fn bench_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix");
    group.throughput(Throughput::Elements(PIXELS as u64));

    let src = ramp_f32(PIXELS);
    let mut dst = vec![0.0f32; src.len()];

    let diag = MatrixOpData::scale_offset([1.5, 1.2, 0.8, 1.0], [0.01, 0.0, -0.01, 0.0]);
    let op = MatrixRenderer::new(&diag.finalize().unwrap(), BitDepth::F32, BitDepth::F32).unwrap();
    group.bench_function("diag", |b| b.iter(|| run_f32(&op, black_box(&src), &mut dst)));

    let m = rgb_to_rgb_matrix(&ACES_AP0, &ACES_AP1).unwrap();
    let rows = m.transpose().to_cols_array_2d();
    let full = MatrixOpData::from_rows_offset(
        [
            [rows[0][0], rows[0][1], rows[0][2], 0.0],
            [rows[1][0], rows[1][1], rows[1][2], 0.0],
            [rows[2][0], rows[2][1], rows[2][2], 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
        [0.0; 4],
    );
    let op = MatrixRenderer::new(&full.finalize().unwrap(), BitDepth::F32, BitDepth::F32).unwrap();
    group.bench_function("full", |b| b.iter(|| run_f32(&op, black_box(&src), &mut dst)));

    group.finish();
}

/// Fast transcendentals against the standard library.
fn bench_sse_math(c: &mut Criterion) {
    let mut group = c.benchmark_group("sse_math");
    const N: usize = 10_000;
    group.throughput(Throughput::Elements(N as u64));

    let values: Vec<f32> = (1..=N).map(|i| i as f32 / N as f32 * 8.0).collect();

    group.bench_function("log2_fast", |b| {
        b.iter(|| values.iter().map(|&v| sse_math::fast_log2(black_box(v))).sum::<f32>())
    });
    group.bench_function("log2_std", |b| {
        b.iter(|| values.iter().map(|&v| black_box(v).log2()).sum::<f32>())
    });

    group.bench_function("exp2_fast", |b| {
        b.iter(|| values.iter().map(|&v| sse_math::fast_exp2(black_box(v))).sum::<f32>())
    });
    group.bench_function("exp2_std", |b| {
        b.iter(|| values.iter().map(|&v| black_box(v).exp2()).sum::<f32>())
    });

    group.bench_function("pow_fast", |b| {
        b.iter(|| values.iter().map(|&v| sse_math::fast_pow(black_box(v), 2.4)).sum::<f32>())
    });
    group.bench_function("pow_std", |b| {
        b.iter(|| values.iter().map(|&v| black_box(v).powf(2.4)).sum::<f32>())
    });

    group.bench_function("atan2_fast", |b| {
        b.iter(|| values.iter().map(|&v| sse_math::fast_atan2(black_box(v) - 4.0, 1.5)).sum::<f32>())
    });
    group.bench_function("atan2_std", |b| {
        b.iter(|| values.iter().map(|&v| (black_box(v) - 4.0).atan2(1.5)).sum::<f32>())
    });

    group.bench_function("sincos_fast", |b| {
        b.iter(|| {
            values
                .iter()
                .map(|&v| {
                    let (s, c) = sse_math::fast_sincos(black_box(v));
                    s + c
                })
                .sum::<f32>()
        })
    });
    group.bench_function("sincos_std", |b| {
        b.iter(|| {
            values
                .iter()
                .map(|&v| {
                    let (s, c) = black_box(v).sin_cos();
                    s + c
                })
                .sum::<f32>()
        })
    });

    group.bench_function("log2_x4", |b| {
        b.iter(|| {
            values
                .chunks_exact(4)
                .map(|c| sse_math::log2_x4(black_box([c[0], c[1], c[2], c[3]]))[0])
                .sum::<f32>()
        })
    });

    group.finish();
}

/// ACES 2.0 output transform, SDR and HDR.
fn bench_aces2(c: &mut Criterion) {
    let mut group = c.benchmark_group("aces2");
    const N: usize = 4096;
    group.throughput(Throughput::Elements(N as u64));

    let pixels: Vec<[f32; 3]> = (0..N)
        .map(|i| {
            let x = i as f32 / N as f32 * 4.0;
            [x, x * 0.7, x * 0.3]
        })
        .collect();

    for peak in [100.0f32, 1000.0] {
        let params = Aces2Params::new(peak, &REC709, &ACES_AP0).unwrap();
        let ot = OutputTransform::new(params);
        group.bench_with_input(BenchmarkId::new("output_transform_fwd", peak as u32), &pixels, |b, px| {
            b.iter(|| px.iter().map(|&p| ot.forward(black_box(p))[1]).sum::<f32>())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_lut1d,
    bench_log,
    bench_matrix,
    bench_sse_math,
    bench_aces2,
);

criterion_main!(benches);
