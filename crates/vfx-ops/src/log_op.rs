//! Logarithmic operators.
//!
//! One op data type covers the whole family. The base and the per-channel
//! parameters decide which kernel the renderer runs:
//!
//! | data                               | forward        | inverse        |
//! |------------------------------------|----------------|----------------|
//! | default params, base 2 or 10       | `Log`          | `AntiLog`      |
//! | affine params (or any other base)  | `Lin2Log`      | `Log2Lin`      |
//! | params with a linear-side break    | `CameraLin2Log`| `CameraLog2Lin`|
//!
//! Per channel:
//!
//! ```text
//! Log            out = log2(max(in, MIN)) * log_scale
//! AntiLog        out = exp2(in * log2(base))
//! Lin2Log        out = log2(max(MIN, in * m + b)) * (k / log2(base)) + kb
//! Log2Lin        out = (exp2((in - kb) * log2(base) / k) - b) / m
//! CameraLin2Log  in < lin_break ? linear_slope * in + linear_offset : Lin2Log(in)
//! CameraLog2Lin  in < log_break ? (in - linear_offset) / linear_slope : Log2Lin(in)
//! ```
//!
//! `MIN` is the smallest normal `f32`. The camera toe is placed so that the
//! two segments meet with the same value and slope at the break. Alpha
//! passes through untouched.
//!
//! # Example
//!
//! ```rust
//! use vfx_core::{BitDepth, PixelBuf, PixelBufMut};
//! use vfx_ops::log_op::{LogOpData, LogRenderer};
//! use vfx_ops::CpuOp;
//!
//! let op = LogRenderer::new(&LogOpData::log10(), BitDepth::F32, BitDepth::F32).unwrap();
//! let src = [100.0f32, 10.0, 1.0, 0.5];
//! let mut dst = [0.0f32; 4];
//! op.apply(PixelBuf::f32(&src).unwrap(), PixelBufMut::f32(&mut dst).unwrap()).unwrap();
//! assert!((dst[0] - 2.0).abs() < 1e-4);
//! assert_eq!(dst[3], 0.5);
//! ```

use tracing::debug;
use vfx_core::BitDepth;
use vfx_math::simd::{clamp_x4, scale_offset_x4, scale_x4};
use vfx_math::sse_math::{exp2_x4, log2_x4};

use crate::op::{CpuOp, DepthScale, Direction};
use crate::shader::{ShaderBuilder, ShaderText};
use crate::{OpsError, OpsResult};

/// Smallest value fed to a logarithm.
const MIN_VALUE: f32 = f32::MIN_POSITIVE;

const LOG2_10: f32 = std::f32::consts::LOG2_10;
const LOG10_2: f32 = std::f32::consts::LOG10_2;

// ============================================================================
// Parameters
// ============================================================================

/// Per-channel log parameters.
///
/// `out = log_side_slope * log_base(lin_side_slope * in + lin_side_offset) + log_side_offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogParams {
    /// Log side slope (k).
    pub log_side_slope: f64,
    /// Log side offset (kb).
    pub log_side_offset: f64,
    /// Linear side slope (m).
    pub lin_side_slope: f64,
    /// Linear side offset (b).
    pub lin_side_offset: f64,
    /// Linear side break. Present for camera curves only.
    pub lin_side_break: Option<f64>,
    /// Slope of the camera toe. Derived from the break when `None`.
    pub linear_slope: Option<f64>,
}

impl Default for LogParams {
    fn default() -> Self {
        Self {
            log_side_slope: 1.0,
            log_side_offset: 0.0,
            lin_side_slope: 1.0,
            lin_side_offset: 0.0,
            lin_side_break: None,
            linear_slope: None,
        }
    }
}

impl LogParams {
    /// Affine parameters without a break.
    pub fn new(log_side_slope: f64, log_side_offset: f64, lin_side_slope: f64, lin_side_offset: f64) -> Self {
        Self {
            log_side_slope,
            log_side_offset,
            lin_side_slope,
            lin_side_offset,
            lin_side_break: None,
            linear_slope: None,
        }
    }

    /// Sets the linear side break, turning the curve into a camera curve.
    pub fn with_lin_break(mut self, lin_break: f64) -> Self {
        self.lin_side_break = Some(lin_break);
        self
    }

    /// Forces the toe slope instead of deriving it.
    pub fn with_linear_slope(mut self, slope: f64) -> Self {
        self.linear_slope = Some(slope);
        self
    }

    fn is_default(&self) -> bool {
        *self == Self::default()
    }

    fn validate(&self, base: f64) -> OpsResult<()> {
        if self.lin_side_slope == 0.0 {
            return Err(OpsError::InvalidParameter(format!(
                "Log: Invalid linear side slope value '{}', linear side slope cannot be 0.",
                self.lin_side_slope
            )));
        }
        if self.log_side_slope == 0.0 {
            return Err(OpsError::InvalidParameter(format!(
                "Log: Invalid log side slope value '{}', log side slope cannot be 0.",
                self.log_side_slope
            )));
        }
        if self.linear_slope.is_some() && self.lin_side_break.is_none() {
            return Err(OpsError::InvalidParameter(
                "Log: LinSideBreak has to be defined before linearSlope".into(),
            ));
        }
        if self.lin_side_break.is_some() {
            self.camera_segment(base)?;
        }
        Ok(())
    }

    /// Toe of a camera curve, `None` without a break.
    pub fn camera_segment(&self, base: f64) -> OpsResult<Option<CameraSegment>> {
        let Some(lin_break) = self.lin_side_break else {
            return Ok(None);
        };
        let arg = self.lin_side_slope * lin_break + self.lin_side_offset;
        if !(arg > 0.0) {
            return Err(OpsError::InvalidParameter(format!(
                "Log: linear side break {lin_break} maps to {arg}, the logarithm needs a positive value"
            )));
        }
        let linear_slope = self
            .linear_slope
            .unwrap_or(self.log_side_slope * self.lin_side_slope / (arg * base.ln()));
        let log_break = self.log_side_slope * arg.log2() / base.log2() + self.log_side_offset;
        let seg = CameraSegment {
            lin_break,
            log_break,
            linear_slope,
            linear_offset: log_break - linear_slope * lin_break,
        };
        if seg.linear_slope == 0.0 || !seg.linear_slope.is_finite() {
            return Err(OpsError::InvalidParameter(format!(
                "Log: camera toe slope {} is not usable",
                seg.linear_slope
            )));
        }
        Ok(Some(seg))
    }
}

/// Linear toe of a camera curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSegment {
    /// Break on the linear side.
    pub lin_break: f64,
    /// The same break on the log side.
    pub log_break: f64,
    /// Slope of the toe.
    pub linear_slope: f64,
    /// Offset of the toe.
    pub linear_offset: f64,
}

// ============================================================================
// Op Data
// ============================================================================

/// Base, per-channel parameters and direction of a log operator.
#[derive(Debug, Clone, PartialEq)]
pub struct LogOpData {
    base: f64,
    params: [LogParams; 3],
    direction: Direction,
}

impl Default for LogOpData {
    fn default() -> Self {
        Self::log10()
    }
}

impl LogOpData {
    /// `log2(in)`.
    pub fn log2() -> Self {
        Self::with_base(2.0)
    }

    /// `log10(in)`.
    pub fn log10() -> Self {
        Self::with_base(10.0)
    }

    /// `log_base(in)`.
    pub fn with_base(base: f64) -> Self {
        Self { base, params: [LogParams::default(); 3], direction: Direction::Forward }
    }

    /// `2^in`.
    pub fn antilog2() -> Self {
        Self::log2().with_direction(Direction::Inverse)
    }

    /// `10^in`.
    pub fn antilog10() -> Self {
        Self::log10().with_direction(Direction::Inverse)
    }

    /// Lin to log with the same parameters on every channel.
    pub fn lin_to_log(base: f64, params: LogParams) -> Self {
        Self { base, params: [params; 3], direction: Direction::Forward }
    }

    /// Log to lin with the same parameters on every channel.
    pub fn log_to_lin(base: f64, params: LogParams) -> Self {
        Self::lin_to_log(base, params).with_direction(Direction::Inverse)
    }

    /// Camera lin to log. `params` must carry a linear side break.
    pub fn camera(base: f64, params: LogParams) -> Self {
        Self::lin_to_log(base, params)
    }

    /// Lin to log with per-channel parameters.
    pub fn from_channels(base: f64, params: [LogParams; 3]) -> Self {
        Self { base, params, direction: Direction::Forward }
    }

    /// Same data with another direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Log base.
    pub fn base(&self) -> f64 {
        self.base
    }

    /// Red, green and blue parameters.
    pub fn params(&self) -> &[LogParams; 3] {
        &self.params
    }

    /// Direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Same parameters on every channel.
    pub fn all_channels_equal(&self) -> bool {
        self.params[0] == self.params[1] && self.params[0] == self.params[2]
    }

    /// Plain `log_base(in)` without affine terms.
    pub fn is_simple_log(&self) -> bool {
        self.params.iter().all(LogParams::is_default)
    }

    /// Plain base 2 logarithm.
    pub fn is_log2(&self) -> bool {
        self.is_simple_log() && self.base == 2.0
    }

    /// Plain base 10 logarithm.
    pub fn is_log10(&self) -> bool {
        self.is_simple_log() && self.base == 10.0
    }

    /// Has a linear toe.
    pub fn is_camera(&self) -> bool {
        self.params[0].lin_side_break.is_some()
    }

    /// Never: a logarithm always reshapes values.
    pub fn is_identity(&self) -> bool {
        false
    }

    /// Never.
    pub fn is_no_op(&self) -> bool {
        false
    }

    /// Same data, opposite direction.
    pub fn inverse(&self) -> Self {
        self.clone().with_direction(self.direction.inverse())
    }

    /// `other` undoes `self`.
    pub fn is_inverse(&self, other: &Self) -> bool {
        self.base == other.base
            && self.params == other.params
            && self.direction == other.direction.inverse()
    }

    /// Checks the base and the parameters.
    pub fn validate(&self) -> OpsResult<()> {
        if self.base == 1.0 {
            return Err(OpsError::InvalidParameter(format!(
                "Log: Invalid base value '{}', base cannot be 1.",
                self.base
            )));
        }
        if !(self.base > 0.0) || !self.base.is_finite() {
            return Err(OpsError::InvalidParameter(format!(
                "Log: Invalid base value '{}', base must be greater than 0.",
                self.base
            )));
        }
        let breaks = self.params.iter().filter(|p| p.lin_side_break.is_some()).count();
        if breaks != 0 && breaks != 3 {
            return Err(OpsError::InvalidParameter(
                "Log: Red, green & blue parameters must have the same size.".into(),
            ));
        }
        self.params.iter().try_for_each(|p| p.validate(self.base))
    }

    /// Validates and stores the derived toe slope of a camera curve.
    pub fn finalize(&self) -> OpsResult<Self> {
        self.validate()?;
        let mut out = self.clone();
        for p in out.params.iter_mut() {
            if let Some(seg) = p.camera_segment(self.base)? {
                p.linear_slope = Some(seg.linear_slope);
            }
        }
        Ok(out)
    }

    fn camera_segments(&self) -> OpsResult<[CameraSegment; 3]> {
        let mut segs = [CameraSegment { lin_break: 0.0, log_break: 0.0, linear_slope: 1.0, linear_offset: 0.0 }; 3];
        for (seg, p) in segs.iter_mut().zip(&self.params) {
            *seg = p
                .camera_segment(self.base)?
                .ok_or_else(|| OpsError::InvalidParameter("Log: camera curve without a break".into()))?;
        }
        Ok(segs)
    }

    fn kernel_kind(&self) -> KernelKind {
        match (self.direction, self.is_log2() || self.is_log10(), self.is_camera()) {
            (Direction::Forward, true, _) => KernelKind::Log,
            (Direction::Inverse, true, _) => KernelKind::AntiLog,
            (Direction::Forward, false, false) => KernelKind::Lin2Log,
            (Direction::Inverse, false, false) => KernelKind::Log2Lin,
            (Direction::Forward, false, true) => KernelKind::CameraLin2Log,
            (Direction::Inverse, false, true) => KernelKind::CameraLog2Lin,
        }
    }

    fn channel<F: Fn(&LogParams) -> f64>(&self, f: F) -> [f32; 3] {
        [f(&self.params[0]) as f32, f(&self.params[1]) as f32, f(&self.params[2]) as f32]
    }
}

// ============================================================================
// Renderer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KernelKind {
    Log,
    AntiLog,
    Lin2Log,
    Log2Lin,
    CameraLin2Log,
    CameraLog2Lin,
}

impl KernelKind {
    fn name(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::AntiLog => "antilog",
            Self::Lin2Log => "lin_to_log",
            Self::Log2Lin => "log_to_lin",
            Self::CameraLin2Log => "camera_lin_to_log",
            Self::CameraLog2Lin => "camera_log_to_lin",
        }
    }
}

/// `log2(max(MIN, in * m + b)) * k + kb`
#[derive(Debug, Clone, Copy)]
struct Lin2Log {
    m: [f32; 4],
    b: [f32; 4],
    k: [f32; 4],
    kb: [f32; 4],
}

impl Lin2Log {
    fn new(data: &LogOpData) -> Self {
        let log2_base = data.base.log2();
        let m = data.channel(|p| p.lin_side_slope);
        let b = data.channel(|p| p.lin_side_offset);
        let k = data.channel(|p| p.log_side_slope / log2_base);
        let kb = data.channel(|p| p.log_side_offset);
        Self { m: lanes(m, 1.0), b: lanes(b, 0.0), k: lanes(k, 1.0), kb: lanes(kb, 0.0) }
    }

    #[inline]
    fn eval(&self, px: [f32; 4]) -> [f32; 4] {
        let t = clamp_x4(scale_offset_x4(px, self.m, self.b), MIN_VALUE, f32::INFINITY);
        scale_offset_x4(log2_x4(t), self.k, self.kb)
    }
}

/// `(exp2((in - kb) * kinv) - b) * minv`
#[derive(Debug, Clone, Copy)]
struct Log2Lin {
    minus_kb: [f32; 4],
    kinv: [f32; 4],
    minus_b: [f32; 4],
    minv: [f32; 4],
}

impl Log2Lin {
    fn new(data: &LogOpData) -> Self {
        let log2_base = data.base.log2();
        let kinv = data.channel(|p| log2_base / p.log_side_slope);
        let minus_kb = data.channel(|p| -p.log_side_offset);
        let minus_b = data.channel(|p| -p.lin_side_offset);
        let minv = data.channel(|p| 1.0 / p.lin_side_slope);
        Self {
            minus_kb: lanes(minus_kb, 0.0),
            kinv: lanes(kinv, 1.0),
            minus_b: lanes(minus_b, 0.0),
            minv: lanes(minv, 1.0),
        }
    }

    #[inline]
    fn eval(&self, px: [f32; 4]) -> [f32; 4] {
        let t = scale_x4(scale_offset_x4(px, ONE, self.minus_kb), self.kinv);
        scale_x4(scale_offset_x4(exp2_x4(t), ONE, self.minus_b), self.minv)
    }
}

/// Toe constants in `f32`, one lane per channel.
#[derive(Debug, Clone, Copy)]
struct Toe {
    lin_break: [f32; 3],
    log_break: [f32; 3],
    slope: [f32; 3],
    slope_inv: [f32; 3],
    offset: [f32; 3],
}

impl Toe {
    fn new(segs: &[CameraSegment; 3]) -> Self {
        Self {
            lin_break: segs.map(|s| s.lin_break as f32),
            log_break: segs.map(|s| s.log_break as f32),
            slope: segs.map(|s| s.linear_slope as f32),
            slope_inv: segs.map(|s| (1.0 / s.linear_slope) as f32),
            offset: segs.map(|s| s.linear_offset as f32),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Kernel {
    Log { scale: f32 },
    AntiLog { log2_base: f32 },
    Lin2Log(Lin2Log),
    Log2Lin(Log2Lin),
    CameraLin2Log(Lin2Log, Toe),
    CameraLog2Lin(Log2Lin, Toe),
}

const ONE: [f32; 4] = [1.0; 4];

#[inline]
fn lanes(rgb: [f32; 3], a: f32) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], a]
}

/// CPU evaluator for a log operator.
#[derive(Debug, Clone)]
pub struct LogRenderer {
    kernel: Kernel,
    scale: DepthScale,
    in_depth: BitDepth,
    out_depth: BitDepth,
}

impl LogRenderer {
    /// Builds the evaluator for `in_depth` to `out_depth`.
    pub fn new(data: &LogOpData, in_depth: BitDepth, out_depth: BitDepth) -> OpsResult<Self> {
        data.validate()?;
        let kind = data.kernel_kind();
        let kernel = match kind {
            KernelKind::Log => Kernel::Log { scale: if data.is_log2() { 1.0 } else { LOG10_2 } },
            KernelKind::AntiLog => Kernel::AntiLog { log2_base: if data.is_log2() { 1.0 } else { LOG2_10 } },
            KernelKind::Lin2Log => Kernel::Lin2Log(Lin2Log::new(data)),
            KernelKind::Log2Lin => Kernel::Log2Lin(Log2Lin::new(data)),
            KernelKind::CameraLin2Log => Kernel::CameraLin2Log(Lin2Log::new(data), Toe::new(&data.camera_segments()?)),
            KernelKind::CameraLog2Lin => Kernel::CameraLog2Lin(Log2Lin::new(data), Toe::new(&data.camera_segments()?)),
        };
        debug!(base = data.base, kernel = kind.name(), ?in_depth, ?out_depth, "log renderer built");
        Ok(Self { kernel, scale: DepthScale::new(in_depth, out_depth), in_depth, out_depth })
    }

    #[inline]
    fn eval(&self, px: [f32; 4]) -> [f32; 4] {
        let out = match &self.kernel {
            Kernel::Log { scale } => {
                let t = clamp_x4(px, MIN_VALUE, f32::INFINITY);
                scale_x4(log2_x4(t), [*scale; 4])
            }
            Kernel::AntiLog { log2_base } => exp2_x4(scale_x4(px, [*log2_base; 4])),
            Kernel::Lin2Log(k) => k.eval(px),
            Kernel::Log2Lin(k) => k.eval(px),
            Kernel::CameraLin2Log(k, toe) => {
                let log = k.eval(px);
                let mut out = log;
                for c in 0..3 {
                    if px[c] < toe.lin_break[c] {
                        out[c] = toe.slope[c] * px[c] + toe.offset[c];
                    }
                }
                out
            }
            Kernel::CameraLog2Lin(k, toe) => {
                let lin = k.eval(px);
                let mut out = lin;
                for c in 0..3 {
                    if px[c] < toe.log_break[c] {
                        out[c] = (px[c] - toe.offset[c]) * toe.slope_inv[c];
                    }
                }
                out
            }
        };
        [out[0], out[1], out[2], px[3]]
    }
}

impl CpuOp for LogRenderer {
    fn name(&self) -> &'static str {
        "log"
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
            *px = self.eval(*px);
        }
        self.scale.denormalize(block);
    }
}

// ============================================================================
// Shader
// ============================================================================

impl LogOpData {
    /// Emits the kernel selected by the data into the builder's function body.
    pub fn emit_shader(&self, builder: &mut dyn ShaderBuilder) -> OpsResult<()> {
        self.validate()?;
        let mut ss = ShaderText::new(builder.language());
        let rgb = format!("{}.rgb", builder.pixel_name());
        let base = self.base as f32;
        let kind = self.kernel_kind();

        let title = match kind {
            KernelKind::Log => "Log",
            KernelKind::AntiLog => "Log 'Anti-Log'",
            KernelKind::Lin2Log => "Log 'Lin to Log'",
            KernelKind::Log2Lin => "Log 'Log to Lin'",
            KernelKind::CameraLin2Log => "Log 'Camera Lin to Log'",
            KernelKind::CameraLog2Lin => "Log 'Camera Log to Lin'",
        };
        ss.blank();
        ss.line(format!("// Add {title} processing"));
        ss.blank();
        ss.line("{");
        ss.indent();

        let ln_base = self.base.ln();
        match kind {
            KernelKind::Log => {
                ss.line(format!("{rgb} = max({}, {rgb});", ss.float3_splat(MIN_VALUE)));
                if self.is_log2() {
                    ss.line(format!("{rgb} = log2({rgb});"));
                } else {
                    ss.line(format!("{rgb} = log({rgb}) * {};", ss.float3_splat((1.0 / ln_base) as f32)));
                }
            }
            KernelKind::AntiLog => {
                ss.line(format!("{rgb} = pow({}, {rgb});", ss.float3_splat(base)));
            }
            KernelKind::Lin2Log | KernelKind::CameraLin2Log => {
                ss.declare_float3("minValue", [MIN_VALUE; 3]);
                ss.declare_float3("lin_slope", self.channel(|p| p.lin_side_slope));
                ss.declare_float3("lin_offset", self.channel(|p| p.lin_side_offset));
                ss.declare_float3("log_slope", self.channel(|p| p.log_side_slope / ln_base));
                ss.declare_float3("log_offset", self.channel(|p| p.log_side_offset));
                if kind == KernelKind::Lin2Log {
                    ss.line(format!("{rgb} = max(minValue, {rgb} * lin_slope + lin_offset);"));
                    ss.line(format!("{rgb} = log_slope * log({rgb}) + log_offset;"));
                } else {
                    let toe = Toe::new(&self.camera_segments()?);
                    ss.declare_float3("linear_break", toe.lin_break);
                    ss.declare_float3("linear_segment_slope", toe.slope);
                    ss.declare_float3("linear_segment_offset", toe.offset);
                    let below = ss.float3_greater_than("linear_break", &rgb);
                    ss.line(format!("{} = {below};", ss.float3_decl("isBelowBreak")));
                    ss.line(format!(
                        "{} = {rgb} * linear_segment_slope + linear_segment_offset;",
                        ss.float3_decl("linSeg")
                    ));
                    ss.line(format!("{} = max(minValue, {rgb} * lin_slope + lin_offset);", ss.float3_decl("logSeg")));
                    ss.line("logSeg = log_slope * log(logSeg) + log_offset;");
                    ss.line(format!("{rgb} = {};", ss.lerp("logSeg", "linSeg", "isBelowBreak")));
                }
            }
            KernelKind::Log2Lin | KernelKind::CameraLog2Lin => {
                ss.declare_float3("log_slopeinv", self.channel(|p| 1.0 / p.log_side_slope));
                ss.declare_float3("lin_slopeinv", self.channel(|p| 1.0 / p.lin_side_slope));
                ss.declare_float3("lin_offset", self.channel(|p| p.lin_side_offset));
                ss.declare_float3("log_base", [base; 3]);
                ss.declare_float3("log_offset", self.channel(|p| p.log_side_offset));
                if kind == KernelKind::Log2Lin {
                    ss.line(format!("{rgb} = ({rgb} - log_offset) * log_slopeinv;"));
                    ss.line(format!("{rgb} = pow(log_base, {rgb});"));
                    ss.line(format!("{rgb} = lin_slopeinv * ({rgb} - lin_offset);"));
                } else {
                    let toe = Toe::new(&self.camera_segments()?);
                    ss.declare_float3("log_break", toe.log_break);
                    ss.declare_float3("linear_segment_offset", toe.offset);
                    ss.declare_float3("linear_segment_slopeinv", toe.slope_inv);
                    let below = ss.float3_greater_than("log_break", &rgb);
                    ss.line(format!("{} = {below};", ss.float3_decl("isBelowBreak")));
                    ss.line(format!(
                        "{} = ({rgb} - linear_segment_offset) * linear_segment_slopeinv;",
                        ss.float3_decl("linSeg")
                    ));
                    ss.line(format!("{} = ({rgb} - log_offset) * log_slopeinv;", ss.float3_decl("logSeg")));
                    ss.line("logSeg = pow(log_base, logSeg);");
                    ss.line("logSeg = lin_slopeinv * (logSeg - lin_offset);");
                    ss.line(format!("{rgb} = {};", ss.lerp("logSeg", "linSeg", "isBelowBreak")));
                }
            }
        }

        ss.dedent();
        ss.line("}");
        builder.add_to_function_code(ss.as_str());
        Ok(())
    }
}
