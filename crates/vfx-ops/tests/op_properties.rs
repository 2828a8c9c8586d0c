//! Round-trip and reference tests for matrix, log and fixed-function ops.
//!
//! Everything goes through `CpuOp::apply` on f32 RGBA buffers, the way a
//! processor chain would call it.

use vfx_core::{BitDepth, PixelBuf, PixelBufMut};
use vfx_math::primaries::{rgb_to_rgb_matrix, ACES_AP0, ACES_AP1, REC2020, REC709};
use vfx_ops::fixed_function::{FixedFunctionOpData, FixedFunctionRenderer, FixedFunctionStyle};
use vfx_ops::log_op::{LogOpData, LogParams, LogRenderer};
use vfx_ops::lut1d::{Lut1DOpData, Lut1DRenderer};
use vfx_ops::matrix::{MatrixOpData, MatrixRenderer};
use vfx_ops::{CpuOp, Direction};

/// 2^-14
const LOG_TOL: f32 = 1.0 / 16384.0;

fn run(op: &dyn CpuOp, src: &[f32]) -> Vec<f32> {
    let mut dst = vec![0.0f32; src.len()];
    op.apply(PixelBuf::f32(src).unwrap(), PixelBufMut::f32(&mut dst).unwrap()).unwrap();
    dst
}

fn matrix(data: &MatrixOpData) -> MatrixRenderer {
    MatrixRenderer::new(data, BitDepth::F32, BitDepth::F32).unwrap()
}

fn log(data: &LogOpData) -> LogRenderer {
    LogRenderer::new(data, BitDepth::F32, BitDepth::F32).unwrap()
}

fn fixed(style: FixedFunctionStyle, params: &[f64]) -> (FixedFunctionRenderer, FixedFunctionRenderer) {
    let data = FixedFunctionOpData::new(style, params.to_vec()).unwrap();
    let fwd = FixedFunctionRenderer::new(&data, BitDepth::F32, BitDepth::F32).unwrap();
    let inv = FixedFunctionRenderer::new(&data.inverse(), BitDepth::F32, BitDepth::F32).unwrap();
    (fwd, inv)
}

/// Deterministic values in `[0, 1)`.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn pixels(n: usize, seed: u64) -> Vec<f32> {
    let mut rng = Lcg(seed);
    (0..n * 4).map(|_| rng.next() as f32).collect()
}

// ============================================================================
// Matrix
// ============================================================================

fn rows_of(m: &vfx_math::glam::DMat3) -> [[f64; 4]; 4] {
    let mut rows = [[0.0; 4]; 4];
    for (i, row) in rows.iter_mut().enumerate().take(3) {
        let r = m.row(i);
        *row = [r.x, r.y, r.z, 0.0];
    }
    rows[3][3] = 1.0;
    rows
}

#[test]
fn matrix_scale_offset_reference() {
    let data = MatrixOpData::scale_offset([2.0, 3.0, 4.0, 1.0], [0.1, 0.2, 0.3, 0.0]);
    let out = run(&matrix(&data), &[0.5, 0.5, 0.5, 1.0]);
    assert_eq!(out, [1.1, 1.7, 2.3, 1.0]);
}

#[test]
fn matrix_inverse_roundtrip() {
    let mut cases = vec![
        rows_of(&rgb_to_rgb_matrix(&ACES_AP0, &REC709).unwrap()),
        rows_of(&rgb_to_rgb_matrix(&ACES_AP1, &REC2020).unwrap()),
    ];
    // diagonally dominant, so never singular
    let mut rng = Lcg(7);
    for _ in 0..8 {
        let mut m = [[0.0; 4]; 4];
        for (i, row) in m.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = if i == j { 1.5 + rng.next() } else { rng.next() - 0.5 };
            }
        }
        cases.push(m);
    }

    let src = pixels(64, 3);
    for rows in cases {
        let fwd = MatrixOpData::from_rows_offset(rows, [0.01, -0.02, 0.03, 0.0]);
        let inv = fwd.clone().with_direction(Direction::Inverse).finalize().unwrap();
        let back = run(&matrix(&inv), &run(&matrix(&fwd), &src));
        for (b, s) in back.iter().zip(&src) {
            assert!((b - s).abs() < 1e-5, "{rows:?}: {s} -> {b}");
        }
    }
}

#[test]
fn matrix_compose_matches_chain() {
    let a = MatrixOpData::from_rows_offset(rows_of(&rgb_to_rgb_matrix(&ACES_AP0, &ACES_AP1).unwrap()), [0.0; 4]);
    let b = MatrixOpData::scale_offset([1.1, 0.9, 1.0, 1.0], [0.01, 0.0, -0.01, 0.0]);
    let ab = a.compose(&b).unwrap();

    let src = pixels(32, 11);
    let chained = run(&matrix(&b), &run(&matrix(&a), &src));
    for (x, y) in run(&matrix(&ab), &src).iter().zip(&chained) {
        assert!((x - y).abs() < 1e-5);
    }
}

// ============================================================================
// Log
// ============================================================================

#[test]
fn antilog_recovers_log10_input() {
    let src = [0.0367126f32, 0.5, 1.0, 0.0];
    let back = run(&log(&LogOpData::antilog10()), &run(&log(&LogOpData::log10()), &src));
    for c in 0..3 {
        assert!(((back[c] - src[c]) / src[c]).abs() < LOG_TOL, "{} -> {}", src[c], back[c]);
    }
    assert_eq!(back[3], 0.0);
}

#[test]
fn log_antilog_over_float_range() {
    // log-spaced from just above the smallest normal float up to 1e6
    let lo = (2.0 * f32::MIN_POSITIVE).log10();
    let src: Vec<f32> = (0..=256)
        .flat_map(|i| {
            let x = 10f32.powf(lo + (6.0 - lo) * i as f32 / 256.0).max(2.0 * f32::MIN_POSITIVE);
            [x, x, x, 1.0]
        })
        .collect();

    for base in [2.0, 10.0] {
        let data = LogOpData::with_base(base);
        let back = run(&log(&data.inverse()), &run(&log(&data), &src));
        for (g, w) in back.iter().zip(&src) {
            assert!(((g - w) / w).abs() < LOG_TOL, "base {base}: {w} -> {g}");
        }
    }
}

#[test]
fn camera_log_roundtrip() {
    let params = LogParams::new(0.25, 0.6, 5.5, 0.05).with_lin_break(0.0105);
    let data = LogOpData::camera(10.0, params).finalize().unwrap();
    let src: Vec<f32> = (0..=100)
        .flat_map(|i| {
            let x = -0.05 + 4.0 * i as f32 / 100.0;
            [x, x * 0.5, x * 2.0, 1.0]
        })
        .collect();
    let back = run(&log(&data.inverse()), &run(&log(&data), &src));
    for (g, w) in back.iter().zip(&src) {
        assert!((g - w).abs() < 1e-3 * w.abs().max(1.0), "{w} -> {g}");
    }
}

// ============================================================================
// Fixed function
// ============================================================================

fn assert_roundtrip(style: FixedFunctionStyle, params: &[f64], src: &[f32], tol: f32) {
    let (fwd, inv) = fixed(style, params);
    let back = run(&inv, &run(&fwd, src));
    for (g, w) in back.iter().zip(src) {
        assert!((g - w).abs() <= tol * w.abs().max(1.0), "{style}: {w} -> {g}");
    }
}

#[test]
fn colour_model_roundtrips() {
    use FixedFunctionStyle::*;

    let rgb = pixels(200, 5);
    assert_roundtrip(HsvToRgb, &[], &run(&fixed(RgbToHsv, &[]).0, &rgb), 1e-5);
    assert_roundtrip(RgbToHsv, &[], &rgb, 1e-5);

    // XYZ with Y bounded away from zero
    let xyz: Vec<f32> = rgb
        .chunks(4)
        .flat_map(|p| [p[0] * 0.9 + 0.05, p[1] * 0.9 + 0.05, p[2] * 0.9 + 0.05, p[3]])
        .collect();
    for style in [XyzToXyy, XyzToUvy, XyzToLuv] {
        assert_roundtrip(style, &[], &xyz, 1e-5);
    }
}

#[test]
fn transfer_curve_roundtrips() {
    use FixedFunctionStyle::*;

    let gamma_log = [0.0, 0.25, 0.5, 1.0, 0.0, 10.0, 1.0, 1.102_06, 1.0, 0.0];
    let double_log = [10.0, 0.25, 0.5, -1.0, 0.0, -1.0, 1.25, 1.0, 1.0, 1.0, 0.5, 1.0, 0.0];

    let src: Vec<f32> = pixels(200, 9).iter().map(|v| v * 2.0 - 0.25).collect();
    assert_roundtrip(LinToPq, &[], &src, 1e-4);
    assert_roundtrip(LinToGammaLog, &gamma_log, &src, 1e-5);
    assert_roundtrip(LinToDoubleLog, &double_log, &src, 1e-5);

    // the inverse styles undo the forward ones in the other order too
    let (fwd, inv) = fixed(PqToLin, &[]);
    let codes: Vec<f32> = pixels(100, 13);
    let back = run(&inv, &run(&fwd, &codes));
    for (g, w) in back.iter().zip(&codes) {
        assert!((g - w).abs() < 1e-4, "{w} -> {g}");
    }
}

// ============================================================================
// Chains
// ============================================================================

#[test]
fn mixed_chain_roundtrip() {
    let to_ap1 = MatrixOpData::from_rows_offset(rows_of(&rgb_to_rgb_matrix(&ACES_AP0, &ACES_AP1).unwrap()), [0.0; 4]);
    let shaper = LogOpData::lin_to_log(2.0, LogParams::new(1.0 / 20.0, 0.6, 1.0, 0.0001));
    let curve: Vec<f32> = (0..1024).map(|i| (i as f32 / 1023.0).powf(0.8)).collect();
    let lut = Lut1DOpData::from_values(curve.iter().flat_map(|&v| [v, v, v]).collect(), false, false).unwrap();

    let forward: Vec<Box<dyn CpuOp>> = vec![
        Box::new(matrix(&to_ap1)),
        Box::new(log(&shaper)),
        Box::new(Lut1DRenderer::new(&lut, BitDepth::F32, BitDepth::F32).unwrap()),
    ];
    let inverse: Vec<Box<dyn CpuOp>> = vec![
        Box::new(Lut1DRenderer::new(&lut.inverse().finalize().unwrap(), BitDepth::F32, BitDepth::F32).unwrap()),
        Box::new(log(&shaper.inverse())),
        Box::new(matrix(&to_ap1.with_direction(Direction::Inverse).finalize().unwrap())),
    ];

    // near-neutral colours stay positive in AP1 and inside the shaper's
    // [0, 1] output range
    let mut rng = Lcg(17);
    let src: Vec<f32> = (0..256)
        .flat_map(|_| {
            let g = 0.02 + 0.45 * rng.next() as f32;
            let mut px = [0.0f32, 0.0, 0.0, 1.0];
            for c in &mut px[..3] {
                *c = g * (0.9 + 0.2 * rng.next() as f32);
            }
            px
        })
        .collect();
    let mut buf = src.clone();
    for op in forward.iter().chain(&inverse) {
        op.apply_in_place(PixelBufMut::f32(&mut buf).unwrap()).unwrap();
    }
    for (g, w) in buf.iter().zip(&src) {
        assert!((g - w).abs() < 1e-3 * w.max(0.1), "{w} -> {g}");
    }
}

#[cfg(feature = "parallel")]
#[test]
fn tiled_chain_matches_serial() {
    use vfx_ops::parallel::apply_tiled;

    let op = log(&LogOpData::lin_to_log(10.0, LogParams::new(0.3, 0.7, 1.0, 0.01)));
    let src = pixels(10_000, 23);

    let mut serial = src.clone();
    op.apply_in_place(PixelBufMut::f32(&mut serial).unwrap()).unwrap();
    for tile in [1, 100, 128, 1000, 20_000] {
        let mut tiled = src.clone();
        apply_tiled(&op, PixelBufMut::f32(&mut tiled).unwrap(), tile).unwrap();
        assert_eq!(tiled, serial, "tile {tile}");
    }
}
