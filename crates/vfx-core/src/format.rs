//! Bit depth registry and storage formats.
//!
//! Every pixel evaluator is parameterised by an input and an output
//! [`BitDepth`]. The depth supplies the nominal maximum (`range`) used to
//! normalise integer codes, and the in-memory element type ([`DataFormat`]).
//!
//! # Usage
//!
//! ```rust
//! use vfx_core::format::{BitDepth, DataFormat};
//!
//! // 10-bit codes are right-justified in a u16 container
//! assert_eq!(BitDepth::U10.range(), 1023.0);
//! assert_eq!(BitDepth::U10.storage_format(), DataFormat::U16);
//!
//! // float depths are nominally [0, 1]
//! assert_eq!(BitDepth::F16.range(), 1.0);
//! ```

/// Bit depth of a pixel channel.
///
/// Integer formats:
/// - `U8` - 8-bit unsigned [0, 255]
/// - `U10` - 10-bit unsigned [0, 1023], stored in `u16`
/// - `U12` - 12-bit unsigned [0, 4095], stored in `u16`
/// - `U16` - 16-bit unsigned [0, 65535]
///
/// Floating-point formats:
/// - `F16` - IEEE 754 binary16
/// - `F32` - IEEE 754 binary32
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitDepth {
    /// 8-bit unsigned integer.
    U8,
    /// 10-bit unsigned integer.
    U10,
    /// 12-bit unsigned integer.
    U12,
    /// 16-bit unsigned integer.
    U16,
    /// 16-bit half-precision float.
    F16,
    /// 32-bit single-precision float.
    #[default]
    F32,
}

impl BitDepth {
    /// All supported depths, integer first.
    pub const ALL: [BitDepth; 6] = [
        BitDepth::U8,
        BitDepth::U10,
        BitDepth::U12,
        BitDepth::U16,
        BitDepth::F16,
        BitDepth::F32,
    ];

    /// Number of bits per channel.
    #[inline]
    pub const fn bits(&self) -> u32 {
        match self {
            Self::U8 => 8,
            Self::U10 => 10,
            Self::U12 => 12,
            Self::U16 => 16,
            Self::F16 => 16,
            Self::F32 => 32,
        }
    }

    /// Whether this is a floating-point format.
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::F16 | Self::F32)
    }

    /// Whether this is an integer format.
    #[inline]
    pub const fn is_integer(&self) -> bool {
        !self.is_float()
    }

    /// Nominal maximum value: the integer code for 1.0, or 1.0 for floats.
    #[inline]
    pub const fn range(&self) -> f32 {
        match self {
            Self::U8 => 255.0,
            Self::U10 => 1023.0,
            Self::U12 => 4095.0,
            Self::U16 => 65535.0,
            Self::F16 | Self::F32 => 1.0,
        }
    }

    /// Same as [`range`](Self::range) in double precision.
    #[inline]
    pub const fn range_f64(&self) -> f64 {
        match self {
            Self::U8 => 255.0,
            Self::U10 => 1023.0,
            Self::U12 => 4095.0,
            Self::U16 => 65535.0,
            Self::F16 | Self::F32 => 1.0,
        }
    }

    /// Number of distinct input codes when the depth is used as a lookup
    /// index: `range + 1` for integers, 65536 for half floats.
    ///
    /// Returns `None` for `F32`, which is always interpolated.
    #[inline]
    pub const fn lookup_size(&self) -> Option<usize> {
        match self {
            Self::U8 => Some(256),
            Self::U10 => Some(1024),
            Self::U12 => Some(4096),
            Self::U16 => Some(65536),
            Self::F16 => Some(65536),
            Self::F32 => None,
        }
    }

    /// Returns the in-memory element type for this depth.
    #[inline]
    pub const fn storage_format(&self) -> DataFormat {
        match self {
            Self::U8 => DataFormat::U8,
            Self::U10 | Self::U12 | Self::U16 => DataFormat::U16,
            Self::F16 => DataFormat::F16,
            Self::F32 => DataFormat::F32,
        }
    }

    /// Bytes needed per channel in storage format.
    #[inline]
    pub const fn bytes_per_channel(&self) -> usize {
        self.storage_format().bytes_per_channel()
    }

    /// Parse from CLF bit depth string ("8i", "10i", "12i", "16i", "16f", "32f").
    ///
    /// # Example
    /// ```rust
    /// use vfx_core::BitDepth;
    /// assert_eq!(BitDepth::from_clf_str("10i"), Some(BitDepth::U10));
    /// assert_eq!(BitDepth::from_clf_str("32f"), Some(BitDepth::F32));
    /// ```
    pub fn from_clf_str(s: &str) -> Option<Self> {
        match s {
            "8i" => Some(Self::U8),
            "10i" => Some(Self::U10),
            "12i" => Some(Self::U12),
            "16i" => Some(Self::U16),
            "16f" => Some(Self::F16),
            "32f" => Some(Self::F32),
            _ => None,
        }
    }

    /// Returns CLF bit depth string.
    pub fn clf_str(&self) -> &'static str {
        match self {
            Self::U8 => "8i",
            Self::U10 => "10i",
            Self::U12 => "12i",
            Self::U16 => "16i",
            Self::F16 => "16f",
            Self::F32 => "32f",
        }
    }
}

impl std::fmt::Display for BitDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::U8 => write!(f, "8-bit"),
            Self::U10 => write!(f, "10-bit"),
            Self::U12 => write!(f, "12-bit"),
            Self::U16 => write!(f, "16-bit"),
            Self::F16 => write!(f, "half"),
            Self::F32 => write!(f, "float"),
        }
    }
}

/// Runtime element type of a channel in memory.
///
/// `BitDepth::U10` and `BitDepth::U12` both use `DataFormat::U16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataFormat {
    /// 8-bit unsigned integer.
    U8,
    /// 16-bit unsigned integer.
    #[default]
    U16,
    /// 16-bit half-precision float.
    F16,
    /// 32-bit single-precision float.
    F32,
}

impl DataFormat {
    /// Number of bytes per channel.
    #[inline]
    pub const fn bytes_per_channel(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 | Self::F16 => 2,
            Self::F32 => 4,
        }
    }

    /// Short name for display.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::F16 => "f16",
            Self::F32 => "f32",
        }
    }
}

impl std::fmt::Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
