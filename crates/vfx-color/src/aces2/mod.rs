//! ACES 2.0 display rendering.
//!
//! # Pipeline
//!
//! ```text
//! encoding RGB -> JMh -> Tonescale -> Chroma Compress -> Gamut Compress -> limiting RGB
//! ```
//!
//! # Key Components
//!
//! - **JMh**: CAM16-derived lightness (J), colorfulness (M) and hue (h)
//! - **Tonescale**: scene to display luminance for a configurable peak
//! - **Chroma Compression**: colorfulness rolloff that follows the tonescale
//! - **Gamut Compression**: soft mapping toward the limiting gamut hull
//! - **Tables**: per-degree reach, cusp and upper hull gamma lookups
//!
//! Each stage is also usable on its own; the `ACES_*_20` fixed-function
//! styles in `vfx-ops` call them individually.

mod cam;
mod chroma;
mod common;
mod gamut;
mod tables;
mod tonescale;
mod transform;

pub use cam::*;
pub use chroma::*;
pub use common::*;
pub use gamut::*;
pub use tables::*;
pub use tonescale::*;
pub use transform::*;
