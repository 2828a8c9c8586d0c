//! # vfx-color
//!
//! The ACES 2 color appearance model and the display rendering stages built
//! on it.
//!
//! - **JMh** - a CAM16-derived lightness / colorfulness / hue space
//! - **Tonescale** - scene to display luminance mapping for a given peak
//! - **Chroma compression** - colorfulness rolloff that follows the tonescale
//! - **Gamut compression** - soft mapping toward the limiting gamut hull
//!
//! # Architecture
//!
//! ```text
//!        vfx-ops (fixed-function evaluators)
//!                  |
//!              vfx-color
//!                  |
//!              vfx-math (primaries, matrices)
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use vfx_color::aces2::{Aces2Params, OutputTransform};
//! use vfx_color::math::primaries::{ACES_AP0, REC709};
//!
//! let params = Aces2Params::new(100.0, &REC709, &ACES_AP0).unwrap();
//! let ot = OutputTransform::new(params);
//!
//! let display = ot.forward([0.18, 0.18, 0.18]);
//! assert!(display[1] > 0.0 && display[1] < 1.0);
//! ```
//!
//! # Dependencies
//!
//! - [`vfx-math`] - chromaticities and RGB/XYZ matrices
//!
//! # Used By
//!
//! - `vfx-ops` - the `ACES_*_20` fixed-function styles

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod aces2;

pub use error::{ColorError, ColorResult};

pub use vfx_math as math;
