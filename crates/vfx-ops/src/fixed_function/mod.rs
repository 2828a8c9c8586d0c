//! Fixed-function operators.
//!
//! A fixed-function op is a style tag and a short parameter vector. Each
//! style names one hard-coded formula and one direction:
//!
//! | style                          | params | kernel                          |
//! |--------------------------------|--------|---------------------------------|
//! | `AcesRedMod03*`/`AcesRedMod10*`| 0      | [`aces::RedMod`]                |
//! | `AcesGlow03*`/`AcesGlow10*`    | 0 or 2 | [`aces::Glow`]                  |
//! | `AcesDarkToDim10*`             | 0      | [`aces::Surround`]              |
//! | `AcesGamutComp13*`             | 7      | [`aces::GamutComp13`]           |
//! | `AcesOutputTransform20*`       | 9      | [`aces2::Aces2Kernel`]          |
//! | `AcesRgbToJmh20`/`AcesJmhToRgb20` | 8   | [`aces2::Aces2Kernel`]          |
//! | `AcesToneScaleCompress20*`     | 1      | [`aces2::Aces2Kernel`]          |
//! | `AcesGamutCompress20*`         | 9      | [`aces2::Aces2Kernel`]          |
//! | `Rec2100Surround*`             | 1      | [`aces::Surround`]              |
//! | HSV, xyY, uvY, L*u*v*          | 0      | [`color`]                       |
//! | `LinToPq`/`PqToLin`            | 0      | [`curves::lin_to_pq`]           |
//! | `LinToGammaLog`/`GammaLogToLin`| 10     | [`curves::GammaLog`]            |
//! | `LinToDoubleLog`/`DoubleLogToLin` | 13  | [`curves::DoubleLog`]           |
//!
//! Alpha passes through untouched.
//!
//! # Example
//!
//! ```rust
//! use vfx_core::{BitDepth, PixelBuf, PixelBufMut};
//! use vfx_ops::fixed_function::{FixedFunctionOpData, FixedFunctionRenderer, FixedFunctionStyle};
//! use vfx_ops::CpuOp;
//!
//! let data = FixedFunctionOpData::new(FixedFunctionStyle::XyzToXyy, vec![]).unwrap();
//! let op = FixedFunctionRenderer::new(&data, BitDepth::F32, BitDepth::F32).unwrap();
//! let src = [0.25f32, 0.5, 0.25, 1.0];
//! let mut dst = [0.0f32; 4];
//! op.apply(PixelBuf::f32(&src).unwrap(), PixelBufMut::f32(&mut dst).unwrap()).unwrap();
//! assert_eq!(dst, [0.25, 0.5, 0.5, 1.0]);
//! ```

pub mod aces;
pub mod aces2;
pub mod color;
pub mod curves;

use std::fmt;

use tracing::debug;
use vfx_core::BitDepth;

use self::aces::{GamutComp13, Glow, RedMod, Surround};
use self::aces2::Aces2Kernel;
use self::curves::{DoubleLog, GammaLog};
use crate::op::{CpuOp, DepthScale};
use crate::shader::{ShaderBuilder, ShaderText};
use crate::{OpsError, OpsResult};

type Rgb = [f32; 3];

// ============================================================================
// Styles
// ============================================================================

/// A fixed-function formula and its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum FixedFunctionStyle {
    AcesRedMod03Fwd,
    AcesRedMod03Inv,
    AcesRedMod10Fwd,
    AcesRedMod10Inv,
    AcesGlow03Fwd,
    AcesGlow03Inv,
    AcesGlow10Fwd,
    AcesGlow10Inv,
    AcesDarkToDim10Fwd,
    AcesDarkToDim10Inv,
    AcesGamutComp13Fwd,
    AcesGamutComp13Inv,
    AcesOutputTransform20Fwd,
    AcesOutputTransform20Inv,
    AcesRgbToJmh20,
    AcesJmhToRgb20,
    AcesToneScaleCompress20Fwd,
    AcesToneScaleCompress20Inv,
    AcesGamutCompress20Fwd,
    AcesGamutCompress20Inv,
    Rec2100SurroundFwd,
    Rec2100SurroundInv,
    RgbToHsv,
    HsvToRgb,
    XyzToXyy,
    XyyToXyz,
    XyzToUvy,
    UvyToXyz,
    XyzToLuv,
    LuvToXyz,
    LinToPq,
    PqToLin,
    LinToGammaLog,
    GammaLogToLin,
    LinToDoubleLog,
    DoubleLogToLin,
}

impl FixedFunctionStyle {
    /// Every style.
    pub const ALL: [Self; 36] = [
        Self::AcesRedMod03Fwd,
        Self::AcesRedMod03Inv,
        Self::AcesRedMod10Fwd,
        Self::AcesRedMod10Inv,
        Self::AcesGlow03Fwd,
        Self::AcesGlow03Inv,
        Self::AcesGlow10Fwd,
        Self::AcesGlow10Inv,
        Self::AcesDarkToDim10Fwd,
        Self::AcesDarkToDim10Inv,
        Self::AcesGamutComp13Fwd,
        Self::AcesGamutComp13Inv,
        Self::AcesOutputTransform20Fwd,
        Self::AcesOutputTransform20Inv,
        Self::AcesRgbToJmh20,
        Self::AcesJmhToRgb20,
        Self::AcesToneScaleCompress20Fwd,
        Self::AcesToneScaleCompress20Inv,
        Self::AcesGamutCompress20Fwd,
        Self::AcesGamutCompress20Inv,
        Self::Rec2100SurroundFwd,
        Self::Rec2100SurroundInv,
        Self::RgbToHsv,
        Self::HsvToRgb,
        Self::XyzToXyy,
        Self::XyyToXyz,
        Self::XyzToUvy,
        Self::UvyToXyz,
        Self::XyzToLuv,
        Self::LuvToXyz,
        Self::LinToPq,
        Self::PqToLin,
        Self::LinToGammaLog,
        Self::GammaLogToLin,
        Self::LinToDoubleLog,
        Self::DoubleLogToLin,
    ];

    /// Style name without the direction.
    pub fn name(self) -> &'static str {
        use FixedFunctionStyle::*;
        match self {
            AcesRedMod03Fwd | AcesRedMod03Inv => "ACES_RedMod03",
            AcesRedMod10Fwd | AcesRedMod10Inv => "ACES_RedMod10",
            AcesGlow03Fwd | AcesGlow03Inv => "ACES_Glow03",
            AcesGlow10Fwd | AcesGlow10Inv => "ACES_Glow10",
            AcesDarkToDim10Fwd | AcesDarkToDim10Inv => "ACES_DarkToDim10",
            AcesGamutComp13Fwd | AcesGamutComp13Inv => "ACES_GamutComp13",
            AcesOutputTransform20Fwd | AcesOutputTransform20Inv => "ACES_OutputTransform20",
            AcesRgbToJmh20 => "RGB_TO_JMh_20",
            AcesJmhToRgb20 => "JMh_TO_RGB_20",
            AcesToneScaleCompress20Fwd | AcesToneScaleCompress20Inv => "ACES_ToneScaleCompress20",
            AcesGamutCompress20Fwd | AcesGamutCompress20Inv => "ACES_GamutCompress20",
            Rec2100SurroundFwd | Rec2100SurroundInv => "REC2100_Surround",
            RgbToHsv => "RGB_TO_HSV",
            HsvToRgb => "HSV_TO_RGB",
            XyzToXyy => "XYZ_TO_xyY",
            XyyToXyz => "xyY_TO_XYZ",
            XyzToUvy => "XYZ_TO_uvY",
            UvyToXyz => "uvY_TO_XYZ",
            XyzToLuv => "XYZ_TO_LUV",
            LuvToXyz => "LUV_TO_XYZ",
            LinToPq => "Lin_TO_PQ",
            PqToLin => "PQ_TO_Lin",
            LinToGammaLog => "Lin_TO_GammaLog",
            GammaLogToLin => "GammaLog_TO_Lin",
            LinToDoubleLog => "Lin_TO_DoubleLog",
            DoubleLogToLin => "DoubleLog_TO_Lin",
        }
    }

    /// Name with ` (Forward)` or ` (Inverse)` for styles that carry a
    /// direction, as used in validation messages and shader comments.
    pub fn detailed_name(self) -> String {
        match self.direction_suffix() {
            Some(dir) => format!("{} ({dir})", self.name()),
            None => self.name().to_string(),
        }
    }

    fn direction_suffix(self) -> Option<&'static str> {
        use FixedFunctionStyle::*;
        match self {
            AcesRedMod03Fwd | AcesRedMod10Fwd | AcesGlow03Fwd | AcesGlow10Fwd
            | AcesDarkToDim10Fwd | AcesGamutComp13Fwd | AcesOutputTransform20Fwd
            | AcesToneScaleCompress20Fwd | AcesGamutCompress20Fwd | Rec2100SurroundFwd => {
                Some("Forward")
            }
            AcesRedMod03Inv | AcesRedMod10Inv | AcesGlow03Inv | AcesGlow10Inv
            | AcesDarkToDim10Inv | AcesGamutComp13Inv | AcesOutputTransform20Inv
            | AcesToneScaleCompress20Inv | AcesGamutCompress20Inv | Rec2100SurroundInv => {
                Some("Inverse")
            }
            _ => None,
        }
    }

    /// The style that undoes this one.
    pub fn inverse(self) -> Self {
        use FixedFunctionStyle::*;
        match self {
            AcesRedMod03Fwd => AcesRedMod03Inv,
            AcesRedMod03Inv => AcesRedMod03Fwd,
            AcesRedMod10Fwd => AcesRedMod10Inv,
            AcesRedMod10Inv => AcesRedMod10Fwd,
            AcesGlow03Fwd => AcesGlow03Inv,
            AcesGlow03Inv => AcesGlow03Fwd,
            AcesGlow10Fwd => AcesGlow10Inv,
            AcesGlow10Inv => AcesGlow10Fwd,
            AcesDarkToDim10Fwd => AcesDarkToDim10Inv,
            AcesDarkToDim10Inv => AcesDarkToDim10Fwd,
            AcesGamutComp13Fwd => AcesGamutComp13Inv,
            AcesGamutComp13Inv => AcesGamutComp13Fwd,
            AcesOutputTransform20Fwd => AcesOutputTransform20Inv,
            AcesOutputTransform20Inv => AcesOutputTransform20Fwd,
            AcesRgbToJmh20 => AcesJmhToRgb20,
            AcesJmhToRgb20 => AcesRgbToJmh20,
            AcesToneScaleCompress20Fwd => AcesToneScaleCompress20Inv,
            AcesToneScaleCompress20Inv => AcesToneScaleCompress20Fwd,
            AcesGamutCompress20Fwd => AcesGamutCompress20Inv,
            AcesGamutCompress20Inv => AcesGamutCompress20Fwd,
            Rec2100SurroundFwd => Rec2100SurroundInv,
            Rec2100SurroundInv => Rec2100SurroundFwd,
            RgbToHsv => HsvToRgb,
            HsvToRgb => RgbToHsv,
            XyzToXyy => XyyToXyz,
            XyyToXyz => XyzToXyy,
            XyzToUvy => UvyToXyz,
            UvyToXyz => XyzToUvy,
            XyzToLuv => LuvToXyz,
            LuvToXyz => XyzToLuv,
            LinToPq => PqToLin,
            PqToLin => LinToPq,
            LinToGammaLog => GammaLogToLin,
            GammaLogToLin => LinToGammaLog,
            LinToDoubleLog => DoubleLogToLin,
            DoubleLogToLin => LinToDoubleLog,
        }
    }

    /// Whether the style runs the forward formula of its pair.
    pub fn is_forward(self) -> bool {
        use FixedFunctionStyle::*;
        match self.direction_suffix() {
            Some(dir) => dir == "Forward",
            None => matches!(
                self,
                AcesRgbToJmh20
                    | RgbToHsv
                    | XyzToXyy
                    | XyzToUvy
                    | XyzToLuv
                    | LinToPq
                    | LinToGammaLog
                    | LinToDoubleLog
            ),
        }
    }
}

impl fmt::Display for FixedFunctionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detailed_name())
    }
}

// ============================================================================
// Op Data
// ============================================================================

const GAMUT_COMP13_NAMES: [&str; 7] = [
    "lim_cyan",
    "lim_magenta",
    "lim_yellow",
    "thr_cyan",
    "thr_magenta",
    "thr_yellow",
    "power",
];

/// Style and parameters of a fixed-function operator.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedFunctionOpData {
    style: FixedFunctionStyle,
    params: Vec<f64>,
}

impl FixedFunctionOpData {
    /// Validated op data.
    pub fn new(style: FixedFunctionStyle, params: Vec<f64>) -> OpsResult<Self> {
        let data = Self { style, params };
        data.validate()?;
        Ok(data)
    }

    /// Style.
    pub fn style(&self) -> FixedFunctionStyle {
        self.style
    }

    /// Parameters.
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Never: every style reshapes values.
    pub fn is_identity(&self) -> bool {
        false
    }

    /// Never.
    pub fn is_no_op(&self) -> bool {
        false
    }

    /// Checks the parameter count and ranges for the style.
    pub fn validate(&self) -> OpsResult<()> {
        use FixedFunctionStyle::*;
        let p = &self.params;
        match self.style {
            AcesGamutComp13Fwd | AcesGamutComp13Inv => {
                self.check_count(7)?;
                for (i, name) in GAMUT_COMP13_NAMES.iter().enumerate() {
                    let (low, high) = match i {
                        0..=2 => (1.001, 65504.0),
                        3..=5 => (0.0, 0.9995),
                        _ => (1.0, 65504.0),
                    };
                    check_bounds(name, p[i], low, high)?;
                }
            }
            AcesOutputTransform20Fwd | AcesOutputTransform20Inv | AcesGamutCompress20Fwd
            | AcesGamutCompress20Inv => {
                self.check_count(9)?;
                check_peak(p[0])?;
            }
            AcesToneScaleCompress20Fwd | AcesToneScaleCompress20Inv => {
                self.check_count(1)?;
                check_peak(p[0])?;
            }
            AcesRgbToJmh20 | AcesJmhToRgb20 => self.check_count(8)?,
            Rec2100SurroundFwd | Rec2100SurroundInv => {
                self.check_count(1)?;
                if p[0] < 0.01 {
                    return Err(invalid(format!("Parameter {} is less than lower bound 0.01", p[0])));
                }
                if p[0] > 100.0 {
                    return Err(invalid(format!("Parameter {} is greater than upper bound 100", p[0])));
                }
            }
            LinToDoubleLog | DoubleLogToLin => {
                self.check_count(13)?;
                if !(p[0] > 0.0) {
                    return Err(invalid(format!("Log base {} is not greater than zero.", p[0])));
                }
                if p[1] > p[2] {
                    return Err(invalid(format!(
                        "First break point {} is larger than the second break point {}.",
                        p[1], p[2]
                    )));
                }
            }
            LinToGammaLog | GammaLogToLin => {
                self.check_count(10)?;
                if !(p[5] > 0.0) {
                    return Err(invalid(format!("Log base {} is not greater than zero.", p[5])));
                }
                if !(p[0] < p[1]) {
                    return Err(invalid(format!(
                        "Mirror point {} is not smaller than the break point {}.",
                        p[0], p[1]
                    )));
                }
                if p[2] == 0.0 {
                    return Err(invalid("Gamma power is zero.".into()));
                }
            }
            AcesGlow03Fwd | AcesGlow03Inv | AcesGlow10Fwd | AcesGlow10Inv => {
                if p.len() != 2 {
                    self.check_count(0)?;
                }
            }
            _ => self.check_count(0)?,
        }
        Ok(())
    }

    fn check_count(&self, expected: usize) -> OpsResult<()> {
        if self.params.len() != expected {
            return Err(invalid(format!(
                "The style '{}' must have {expected} parameters but {} found.",
                self.style.detailed_name(),
                self.params.len()
            )));
        }
        Ok(())
    }

    /// Same parameters, opposite style.
    pub fn inverse(&self) -> Self {
        Self { style: self.style.inverse(), params: self.params.clone() }
    }

    /// `other` undoes `self`.
    ///
    /// A Rec.2100 surround also pairs with itself when the gammas are
    /// reciprocal.
    pub fn is_inverse(&self, other: &Self) -> bool {
        use FixedFunctionStyle::*;
        if matches!(self.style, Rec2100SurroundFwd | Rec2100SurroundInv)
            && self.style == other.style
            && self.params.len() == 1
            && other.params.len() == 1
        {
            return self.params[0] == 1.0 / other.params[0];
        }
        *other == self.inverse()
    }
}

fn invalid(msg: String) -> OpsError {
    OpsError::InvalidParameter(msg)
}

fn check_bounds(name: &str, v: f64, low: f64, high: f64) -> OpsResult<()> {
    if v < low || v > high {
        return Err(invalid(format!("Parameter {v} ({name}) is outside valid range [{low},{high}]")));
    }
    Ok(())
}

fn check_peak(v: f64) -> OpsResult<()> {
    check_bounds("peak_luminance", v, 1.0, 10000.0)?;
    if v.fract() != 0.0 {
        return Err(invalid(format!(
            "Parameter {v} (peak_luminance) cannot include any fractional component"
        )));
    }
    Ok(())
}

// ============================================================================
// Kernels
// ============================================================================

/// Per-pixel formula and its shader form for the color space conversions.
#[derive(Clone, Copy)]
struct Conversion {
    eval: fn(Rgb) -> Rgb,
    emit: fn(&mut ShaderText, &str),
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Conversion")
    }
}

#[derive(Debug, Clone)]
enum Kernel {
    RedMod(RedMod, bool),
    Glow(Glow, bool),
    Surround(Surround),
    GamutComp13(GamutComp13, bool),
    Aces2(Box<Aces2Kernel>),
    Conversion(Conversion),
    Pq(bool),
    GammaLog(GammaLog, bool),
    DoubleLog(DoubleLog, bool),
}

impl Kernel {
    fn new(data: &FixedFunctionOpData) -> OpsResult<Self> {
        use FixedFunctionStyle::*;
        let p = data.params();
        let forward = data.style.is_forward();
        let conv = |eval: fn(Rgb) -> Rgb, emit: fn(&mut ShaderText, &str)| {
            Kernel::Conversion(Conversion { eval, emit })
        };
        Ok(match data.style {
            AcesRedMod03Fwd | AcesRedMod03Inv => Kernel::RedMod(RedMod::V03, forward),
            AcesRedMod10Fwd | AcesRedMod10Inv => Kernel::RedMod(RedMod::V10, forward),
            AcesGlow03Fwd | AcesGlow03Inv => Kernel::Glow(Glow::V03.with_params(p), forward),
            AcesGlow10Fwd | AcesGlow10Inv => Kernel::Glow(Glow::V10.with_params(p), forward),
            AcesDarkToDim10Fwd | AcesDarkToDim10Inv => {
                Kernel::Surround(Surround::dark_to_dim(forward))
            }
            Rec2100SurroundFwd | Rec2100SurroundInv => {
                Kernel::Surround(Surround::rec2100(p[0], forward))
            }
            AcesGamutComp13Fwd | AcesGamutComp13Inv => {
                Kernel::GamutComp13(GamutComp13::new(p), forward)
            }
            AcesOutputTransform20Fwd | AcesOutputTransform20Inv => {
                Kernel::Aces2(Box::new(Aces2Kernel::output_transform(p, forward)?))
            }
            AcesRgbToJmh20 => Kernel::Aces2(Box::new(Aces2Kernel::rgb_to_jmh(p)?)),
            AcesJmhToRgb20 => Kernel::Aces2(Box::new(Aces2Kernel::jmh_to_rgb(p)?)),
            AcesToneScaleCompress20Fwd | AcesToneScaleCompress20Inv => {
                Kernel::Aces2(Box::new(Aces2Kernel::tonescale_compress(p, forward)?))
            }
            AcesGamutCompress20Fwd | AcesGamutCompress20Inv => {
                Kernel::Aces2(Box::new(Aces2Kernel::gamut_compress(p, forward)?))
            }
            RgbToHsv => conv(color::rgb_to_hsv, color::emit_rgb_to_hsv),
            HsvToRgb => conv(color::hsv_to_rgb, color::emit_hsv_to_rgb),
            XyzToXyy => conv(color::xyz_to_xyy, color::emit_xyz_to_xyy),
            XyyToXyz => conv(color::xyy_to_xyz, color::emit_xyy_to_xyz),
            XyzToUvy => conv(color::xyz_to_uvy, color::emit_xyz_to_uvy),
            UvyToXyz => conv(color::uvy_to_xyz, color::emit_uvy_to_xyz),
            XyzToLuv => conv(color::xyz_to_luv, color::emit_xyz_to_luv),
            LuvToXyz => conv(color::luv_to_xyz, color::emit_luv_to_xyz),
            LinToPq | PqToLin => Kernel::Pq(forward),
            LinToGammaLog | GammaLogToLin => Kernel::GammaLog(GammaLog::new(p), forward),
            LinToDoubleLog | DoubleLogToLin => Kernel::DoubleLog(DoubleLog::new(p), forward),
        })
    }

    #[inline]
    fn eval(&self, rgb: Rgb) -> Rgb {
        match self {
            Kernel::RedMod(k, true) => k.fwd(rgb),
            Kernel::RedMod(k, false) => k.inv(rgb),
            Kernel::Glow(k, true) => k.fwd(rgb),
            Kernel::Glow(k, false) => k.inv(rgb),
            Kernel::Surround(k) => k.apply(rgb),
            Kernel::GamutComp13(k, true) => k.fwd(rgb),
            Kernel::GamutComp13(k, false) => k.inv(rgb),
            Kernel::Aces2(k) => k.apply(rgb),
            Kernel::Conversion(c) => (c.eval)(rgb),
            Kernel::Pq(true) => rgb.map(curves::lin_to_pq),
            Kernel::Pq(false) => rgb.map(curves::pq_to_lin),
            Kernel::GammaLog(k, true) => rgb.map(|v| k.fwd(v)),
            Kernel::GammaLog(k, false) => rgb.map(|v| k.inv(v)),
            Kernel::DoubleLog(k, true) => rgb.map(|v| k.fwd(v)),
            Kernel::DoubleLog(k, false) => rgb.map(|v| k.inv(v)),
        }
    }

    fn emit(&self, builder: &mut dyn ShaderBuilder, ss: &mut ShaderText, px: &str) -> OpsResult<()> {
        match self {
            Kernel::RedMod(k, forward) => k.emit(ss, px, *forward),
            Kernel::Glow(k, forward) => k.emit(ss, px, *forward),
            Kernel::Surround(k) => k.emit(ss, px),
            Kernel::GamutComp13(k, forward) => k.emit(ss, px, *forward),
            Kernel::Aces2(k) => k.emit(builder, ss, px)?,
            Kernel::Conversion(c) => (c.emit)(ss, px),
            Kernel::Pq(forward) => curves::emit_pq(ss, px, *forward),
            Kernel::GammaLog(k, forward) => k.emit(ss, px, *forward),
            Kernel::DoubleLog(k, forward) => k.emit(ss, px, *forward),
        }
        Ok(())
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// CPU evaluator for a fixed-function operator.
#[derive(Debug, Clone)]
pub struct FixedFunctionRenderer {
    kernel: Kernel,
    scale: DepthScale,
    in_depth: BitDepth,
    out_depth: BitDepth,
}

impl FixedFunctionRenderer {
    /// Builds the evaluator for `in_depth` to `out_depth`.
    pub fn new(data: &FixedFunctionOpData, in_depth: BitDepth, out_depth: BitDepth) -> OpsResult<Self> {
        data.validate()?;
        let kernel = Kernel::new(data)?;
        debug!(
            style = %data.style,
            params = data.params.len(),
            ?in_depth,
            ?out_depth,
            "fixed function renderer built"
        );
        Ok(Self { kernel, scale: DepthScale::new(in_depth, out_depth), in_depth, out_depth })
    }
}

impl CpuOp for FixedFunctionRenderer {
    fn name(&self) -> &'static str {
        "fixed_function"
    }

    fn input_depth(&self) -> BitDepth {
        self.in_depth
    }

    fn output_depth(&self) -> BitDepth {
        self.out_depth
    }

    fn process(&self, block: &mut [[f32; 4]]) {
        self.scale.normalize(block);
        for px in block.iter_mut() {
            let [r, g, b] = self.kernel.eval([px[0], px[1], px[2]]);
            *px = [r, g, b, px[3]];
        }
        self.scale.denormalize(block);
    }
}

// ============================================================================
// Shader
// ============================================================================

impl FixedFunctionOpData {
    /// Emits the style's formula into the builder's function body. ACES 2
    /// styles also add helper functions and hue table textures.
    pub fn emit_shader(&self, builder: &mut dyn ShaderBuilder) -> OpsResult<()> {
        self.validate()?;
        let kernel = Kernel::new(self)?;
        let px = builder.pixel_name().to_string();
        let mut ss = ShaderText::new(builder.language());

        ss.blank();
        ss.line(format!("// Add FixedFunction '{}' processing", self.style.detailed_name()));
        ss.blank();
        ss.line("{");
        ss.indent();
        kernel.emit(builder, &mut ss, &px)?;
        ss.dedent();
        ss.line("}");

        builder.add_to_function_code(ss.as_str());
        Ok(())
    }
}
