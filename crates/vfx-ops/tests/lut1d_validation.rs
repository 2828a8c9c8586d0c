//! 1D LUT validation tests.
//!
//! Runs whole LUTs through the public evaluator API on typed buffers:
//! depth rescaling, forward/inverse pairs, hue adjustment and the
//! clamping and flat-spot behaviour of inverse LUTs.

use vfx_core::{f16, BitDepth, PixelBuf, PixelBufMut};
use vfx_ops::lut1d::{HueAdjust, InversionQuality, Lut1DOpData, Lut1DRenderer, HALF_DOMAIN_LENGTH};
use vfx_ops::CpuOp;

const DEPTHS: [BitDepth; 6] = [
    BitDepth::U8,
    BitDepth::U10,
    BitDepth::U12,
    BitDepth::U16,
    BitDepth::F16,
    BitDepth::F32,
];

// ============================================================================
// Helpers
// ============================================================================

/// Owned storage for one bit depth.
enum Storage {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F16(Vec<f16>),
    F32(Vec<f32>),
}

impl Storage {
    /// Raw values converted into the element type of `depth`.
    fn from_values(depth: BitDepth, v: &[f32]) -> Self {
        match depth {
            BitDepth::U8 => Storage::U8(v.iter().map(|&x| x as u8).collect()),
            BitDepth::U10 | BitDepth::U12 | BitDepth::U16 => {
                Storage::U16(v.iter().map(|&x| x as u16).collect())
            }
            BitDepth::F16 => Storage::F16(v.iter().map(|&x| f16::from_f32(x)).collect()),
            BitDepth::F32 => Storage::F32(v.to_vec()),
        }
    }

    fn zeroed(depth: BitDepth, len: usize) -> Self {
        Self::from_values(depth, &vec![0.0; len])
    }

    fn buf(&self, depth: BitDepth) -> PixelBuf<'_> {
        match self {
            Storage::U8(d) => PixelBuf::u8(d).unwrap(),
            Storage::U16(d) => PixelBuf::with_u16(depth, d).unwrap(),
            Storage::F16(d) => PixelBuf::f16(d).unwrap(),
            Storage::F32(d) => PixelBuf::f32(d).unwrap(),
        }
    }

    fn buf_mut(&mut self, depth: BitDepth) -> PixelBufMut<'_> {
        match self {
            Storage::U8(d) => PixelBufMut::u8(d).unwrap(),
            Storage::U16(d) => PixelBufMut::with_u16(depth, d).unwrap(),
            Storage::F16(d) => PixelBufMut::f16(d).unwrap(),
            Storage::F32(d) => PixelBufMut::f32(d).unwrap(),
        }
    }

    fn to_f32(&self) -> Vec<f32> {
        match self {
            Storage::U8(d) => d.iter().map(|&x| x as f32).collect(),
            Storage::U16(d) => d.iter().map(|&x| x as f32).collect(),
            Storage::F16(d) => d.iter().map(|x| x.to_f32()).collect(),
            Storage::F32(d) => d.clone(),
        }
    }
}

/// Applies `op` to raw input values and returns raw output values.
fn run(op: &Lut1DRenderer, in_depth: BitDepth, out_depth: BitDepth, src: &[f32]) -> Vec<f32> {
    let input = Storage::from_values(in_depth, src);
    let mut output = Storage::zeroed(out_depth, src.len());
    op.apply(input.buf(in_depth), output.buf_mut(out_depth)).unwrap();
    output.to_f32()
}

fn run_f32(op: &Lut1DRenderer, src: &[f32]) -> Vec<f32> {
    run(op, BitDepth::F32, BitDepth::F32, src)
}

/// Same values in R, G and B.
fn ramp(v: &[f32]) -> Lut1DOpData {
    let values = v.iter().flat_map(|&x| [x, x, x]).collect();
    Lut1DOpData::from_values(values, false, false).unwrap()
}

fn grey(v: &[f32], alpha: f32) -> Vec<f32> {
    v.iter().flat_map(|&x| [x, x, x, alpha]).collect()
}

/// Distance between two floats in units in the last place.
fn ulps(a: f32, b: f32) -> u32 {
    if a == b {
        return 0;
    }
    (a.to_bits() as i64 - b.to_bits() as i64).unsigned_abs() as u32
}

// ============================================================================
// Identity and depth rescaling
// ============================================================================

#[test]
fn identity_rescales_every_depth_pair() {
    for in_depth in DEPTHS {
        let in_range = in_depth.range();
        let length = in_range as usize + 1;
        let lut = Lut1DOpData::identity(length).unwrap();

        // every code up to 1023, then a stride through the rest
        let inputs: Vec<f32> = if in_depth.is_float() {
            (0..=64).map(|i| i as f32 / 64.0).collect()
        } else {
            (0..length).filter(|&i| i < 1024 || i % 97 == 0).map(|i| i as f32).chain([in_range]).collect()
        };
        let src: Vec<f32> = inputs.iter().flat_map(|&x| [x, x, x, in_range]).collect();

        for out_depth in DEPTHS {
            let out_range = out_depth.range();
            let op = Lut1DRenderer::new(&lut, in_depth, out_depth).unwrap();
            let out = run(&op, in_depth, out_depth, &src);

            for (i, &x) in inputs.iter().enumerate() {
                let want = x / in_range * out_range;
                for c in 0..3 {
                    let got = out[i * 4 + c];
                    let ok = if out_depth.is_float() {
                        (got - want).abs() <= 1e-3 * want.abs() + 1e-6
                    } else {
                        (got - want.round()).abs() <= 1.0
                    };
                    assert!(ok, "{in_depth} -> {out_depth}: {x} gave {got}, want {want}");
                }
                // alpha is rescaled the same way
                let a = out[i * 4 + 3];
                assert!((a - out_range).abs() <= 1e-3 * out_range, "{in_depth} -> {out_depth}: alpha {a}");
            }
        }
    }
}

// ============================================================================
// Forward / inverse pairs
// ============================================================================

fn gamma_ramp(n: usize, gamma: f32) -> Lut1DOpData {
    let v: Vec<f32> = (0..n).map(|i| (i as f32 / (n - 1) as f32).powf(gamma)).collect();
    ramp(&v)
}

#[test]
fn inverse_undoes_forward_float() {
    let lut = gamma_ramp(33, 1.8);
    let fwd = Lut1DRenderer::new(&lut, BitDepth::F32, BitDepth::F32).unwrap();
    let inv = Lut1DRenderer::new(&lut.inverse().finalize().unwrap(), BitDepth::F32, BitDepth::F32).unwrap();

    let inputs: Vec<f32> = (0..=200).map(|i| 0.1 + 0.9 * i as f32 / 200.0).collect();
    let back = run_f32(&inv, &run_f32(&fwd, &grey(&inputs, 1.0)));
    for (i, &x) in inputs.iter().enumerate() {
        for c in 0..3 {
            let got = back[i * 4 + c];
            assert!(ulps(got, x) <= 50, "{x} -> {got} ({} ulps)", ulps(got, x));
        }
        assert_eq!(back[i * 4 + 3], 1.0);
    }
}

#[test]
fn inverse_undoes_forward_integer() {
    let lut = gamma_ramp(65, 0.6);
    let fwd = Lut1DRenderer::new(&lut, BitDepth::U16, BitDepth::F32).unwrap();
    let inv = Lut1DRenderer::new(&lut.inverse().finalize().unwrap(), BitDepth::F32, BitDepth::U16).unwrap();

    let codes: Vec<f32> = (0..=65535u32).step_by(251).map(|c| c as f32).collect();
    let mid = run(&fwd, BitDepth::U16, BitDepth::F32, &grey(&codes, 65535.0));
    let back = run(&inv, BitDepth::F32, BitDepth::U16, &mid);
    for (i, &code) in codes.iter().enumerate() {
        for c in 0..3 {
            let got = back[i * 4 + c];
            assert!((got - code).abs() <= 1.0, "{code} -> {got}");
        }
    }
}

#[test]
fn fast_inverse_tracks_exact() {
    let lut = gamma_ramp(17, 2.2).with_file_output_depth(BitDepth::U16);
    let exact = Lut1DRenderer::new(&lut.inverse().finalize().unwrap(), BitDepth::F32, BitDepth::F32).unwrap();
    let fast = Lut1DRenderer::new(
        &lut.inverse().with_inversion_quality(InversionQuality::Fast),
        BitDepth::F32,
        BitDepth::F32,
    )
    .unwrap();

    let src = grey(&(0..=100).map(|i| i as f32 / 100.0).collect::<Vec<_>>(), 0.5);
    for (e, f) in run_f32(&exact, &src).iter().zip(run_f32(&fast, &src)) {
        assert!((e - f).abs() < 1e-3, "{e} vs {f}");
    }
}

// ============================================================================
// Aliasing
// ============================================================================

#[test]
fn in_place_matches_separate_output() {
    let lut = gamma_ramp(256, 2.2);
    let hue = lut.clone().with_hue_adjust(HueAdjust::Dw3);
    let src: Vec<f32> = (0..600).map(|i| (i % 37) as f32 / 36.0 * ((i % 5) as f32 * 0.3 + 0.1)).collect();

    for data in [&lut, &hue] {
        for in_depth in [BitDepth::F32, BitDepth::F16] {
            let op = Lut1DRenderer::new(data, in_depth, in_depth).unwrap();
            let separate = run(&op, in_depth, in_depth, &src);

            let mut shared = Storage::from_values(in_depth, &src);
            op.apply_in_place(shared.buf_mut(in_depth)).unwrap();
            assert_eq!(shared.to_f32(), separate, "{} {in_depth}", op.kind());
        }

        let codes: Vec<f32> = src.iter().map(|v| (v * 255.0).min(255.0)).collect();
        let op = Lut1DRenderer::new(data, BitDepth::U8, BitDepth::U8).unwrap();
        let separate = run(&op, BitDepth::U8, BitDepth::U8, &codes);
        let mut shared = Storage::from_values(BitDepth::U8, &codes);
        op.apply_in_place(shared.buf_mut(BitDepth::U8)).unwrap();
        assert_eq!(shared.to_f32(), separate, "{}", op.kind());
    }
}

// ============================================================================
// Hue adjust
// ============================================================================

#[test]
fn hue_adjust_keeps_channel_order() {
    let lut = gamma_ramp(64, 0.45).with_hue_adjust(HueAdjust::Dw3);
    let fwd = Lut1DRenderer::new(&lut, BitDepth::F32, BitDepth::F32).unwrap();
    let inv = Lut1DRenderer::new(&lut.inverse().finalize().unwrap(), BitDepth::F32, BitDepth::F32).unwrap();

    let mut src = Vec::new();
    for i in 0..7 {
        for j in 0..7 {
            for k in 0..7 {
                src.extend([i as f32 / 6.0, j as f32 / 6.0 * 0.9 + 0.05, k as f32 / 6.0 * 0.8 + 0.1, 1.0]);
            }
        }
    }

    for op in [&fwd, &inv] {
        let out = run_f32(op, &src);
        for (p, q) in src.chunks(4).zip(out.chunks(4)) {
            for (a, b) in [(0, 1), (1, 2), (0, 2)] {
                if p[a] > p[b] {
                    assert!(q[a] >= q[b] - 1e-6, "{}: {p:?} -> {q:?}", op.kind());
                } else if p[a] < p[b] {
                    assert!(q[a] <= q[b] + 1e-6, "{}: {p:?} -> {q:?}", op.kind());
                }
            }
        }
    }
}

#[test]
fn half_domain_hue_adjust() {
    // 60x² + 10x on every finite half, exact on representable inputs
    let curve = |x: f32| 60.0 * x * x + 10.0 * x;
    let values: Vec<f32> = (0..HALF_DOMAIN_LENGTH)
        .flat_map(|code| {
            let x = f16::from_bits(code as u16).to_f32();
            let v = if x.is_finite() { curve(x) } else { 0.0 };
            [v, v, v]
        })
        .collect();
    let plain = Lut1DOpData::from_values(values, true, false).unwrap();
    let adjusted = plain.clone().with_hue_adjust(HueAdjust::Dw3);

    let src = [0.0625f32, 0.1875, 1.125, 0.5];

    let op = Lut1DRenderer::new(&plain, BitDepth::F32, BitDepth::F32).unwrap();
    let out = run_f32(&op, &src);
    assert!((out[1] - curve(0.1875)).abs() < 1e-5);

    let op = Lut1DRenderer::new(&adjusted, BitDepth::F32, BitDepth::F32).unwrap();
    assert_eq!(op.kind(), "half_code_hue");
    let out = run_f32(&op, &src);

    let (lo, hi) = (curve(0.0625), curve(1.125));
    let hue = (0.1875 - 0.0625) / (1.125 - 0.0625);
    let mid = hue * (hi - lo) + lo;
    assert!((out[0] - lo).abs() < 1e-5 * hi);
    assert!((out[1] - mid).abs() < 1e-5 * hi, "{} vs {mid}", out[1]);
    assert!((out[2] - hi).abs() < 1e-5 * hi);
    assert_eq!(out[3], 0.5);
    // the correction moves green well away from the plain curve
    assert!(out[1] > 2.0 * curve(0.1875));
}

// ============================================================================
// Reference values
// ============================================================================

#[test]
fn forward_saturates_and_keeps_alpha() {
    let op = Lut1DRenderer::new(&ramp(&[0.1, 0.6, 1.1]), BitDepth::F32, BitDepth::F32).unwrap();
    let out = run_f32(&op, &[-0.1, -0.2, -10.0, 0.0, 0.5, 1.0, 1.1, 0.0, 10.1, 55.0, 2.3, 0.0]);
    let want = [0.1, 0.1, 0.1, 0.0, 0.6, 1.1, 1.1, 0.0, 1.1, 1.1, 1.1, 0.0];
    for (o, w) in out.iter().zip(want) {
        assert!((o - w).abs() < 1e-5, "{out:?}");
    }
}

#[test]
fn inverse_clamps_to_lut_range() {
    // starts at 30 and ends at 210, with a reversal after 70
    let codes = [30.0f32, 40.0, 60.0, 65.0, 70.0, 50.0, 60.0, 70.0, 100.0, 190.0, 200.0, 210.0];
    let lut = ramp(&codes.map(|c| c / 255.0)).with_file_output_depth(BitDepth::U8).inverse();

    let src: Vec<f32> = [0.0f32, 10.0, 30.0, 0.0, 35.0, 202.0, 210.0, 0.0, -10.0, 255.0, 355.0, 0.0]
        .iter()
        .map(|c| c / 255.0)
        .collect();
    let want = [0.0f32, 0.0, 0.0, 0.0, 2979.0, 60769.0, 65535.0, 0.0, 0.0, 65535.0, 65535.0, 0.0];

    let exact = Lut1DRenderer::new(&lut.finalize().unwrap(), BitDepth::F32, BitDepth::U16).unwrap();
    assert_eq!(run(&exact, BitDepth::F32, BitDepth::U16, &src), want);

    let fast = lut.with_inversion_quality(InversionQuality::Fast);
    let fast = Lut1DRenderer::new(&fast, BitDepth::F32, BitDepth::U16).unwrap();
    assert_eq!(run(&fast, BitDepth::F32, BitDepth::U16, &src), want);
}

#[test]
fn inverse_flat_start_and_end() {
    // decreasing red, increasing green and blue, flat runs at both ends
    let rows: [[f32; 3]; 9] = [
        [900.0, 70.0, 70.0],
        [900.0, 70.0, 120.0],
        [900.0, 120.0, 300.0],
        [900.0, 300.0, 450.0],
        [450.0, 450.0, 900.0],
        [300.0, 900.0, 900.0],
        [120.0, 900.0, 900.0],
        [70.0, 900.0, 900.0],
        [70.0, 900.0, 900.0],
    ];
    let values = rows.iter().flatten().map(|v| v / 1023.0).collect();
    let lut = Lut1DOpData::from_values(values, false, false)
        .unwrap()
        .with_file_output_depth(BitDepth::U10)
        .inverse()
        .finalize()
        .unwrap();
    let op = Lut1DRenderer::new(&lut, BitDepth::U10, BitDepth::U16).unwrap();

    let codes = [1023.0f32, 900.0, 800.0, 500.0, 450.0, 330.0, 150.0, 120.0, 80.0, 70.0, 60.0, 0.0];
    let want: [[f32; 3]; 12] = [
        [24576.0, 40959.0, 32768.0],
        [24576.0, 40959.0, 32768.0],
        [26396.0, 39139.0, 30947.0],
        [31857.0, 33678.0, 25486.0],
        [32768.0, 32768.0, 24576.0],
        [39321.0, 26214.0, 18022.0],
        [47786.0, 17749.0, 9557.0],
        [49151.0, 16384.0, 8192.0],
        [55705.0, 9830.0, 1638.0],
        [57343.0, 8192.0, 0.0],
        [57343.0, 8192.0, 0.0],
        [57343.0, 8192.0, 0.0],
    ];

    let out = run(&op, BitDepth::U10, BitDepth::U16, &grey(&codes, 0.0));
    for (i, w) in want.iter().enumerate() {
        assert_eq!(&out[i * 4..i * 4 + 3], w, "input {}", codes[i]);
        assert_eq!(out[i * 4 + 3], 0.0);
    }
}

#[test]
fn inverse_lands_on_flat_spot_edge() {
    // the drop to 0.08 is flattened to 0.10 before inversion
    let lut = ramp(&[0.09, 0.09, 0.10, 0.08, 0.2, 0.4, 0.6, 0.8, 1.0]).inverse().finalize().unwrap();
    let op = Lut1DRenderer::new(&lut, BitDepth::F32, BitDepth::F32).unwrap();

    let out = run_f32(&op, &[0.09, 0.05, 0.095, 1.0]);
    let step = 1.0 / 8.0;
    // at and below the flat start the result is the first index past it
    assert!((out[0] - step).abs() < 1e-6, "{out:?}");
    assert!((out[1] - step).abs() < 1e-6, "{out:?}");
    // halfway between entries 1 and 2
    assert!((out[2] - 1.5 * step).abs() < 1e-5, "{out:?}");
    assert_eq!(out[3], 1.0);
}
