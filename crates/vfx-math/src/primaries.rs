//! Color primaries and RGB/XYZ matrix generation.
//!
//! A set of primaries is four CIE xy chromaticities: red, green, blue and
//! the white point. The RGB to XYZ matrix has the XYZ of each primary as a
//! column, each column scaled so that RGB (1, 1, 1) lands on the white
//! point with Y = 1.
//!
//! Matrices are built in double precision with [`glam::DMat3`] and handed
//! out either as `DMat3` or as row-major `[f32; 9]` for the hot paths.
//!
//! ```rust
//! use vfx_math::primaries::{rgb_to_xyz_matrix, ACES_AP0};
//!
//! let m = rgb_to_xyz_matrix(&ACES_AP0).unwrap();
//! let white = m * vfx_math::glam::DVec3::ONE;
//! assert!((white.y - 1.0).abs() < 1e-12);
//! ```

use glam::{DMat3, DVec3};

/// RGB primaries plus white point as xy chromaticities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primaries {
    /// Red primary (x, y) chromaticity
    pub r: (f64, f64),
    /// Green primary (x, y) chromaticity
    pub g: (f64, f64),
    /// Blue primary (x, y) chromaticity
    pub b: (f64, f64),
    /// White point (x, y) chromaticity
    pub w: (f64, f64),
}

impl Primaries {
    /// Builds primaries from eight floats `[rx, ry, gx, gy, bx, by, wx, wy]`,
    /// the layout used by fixed-function parameter vectors.
    pub fn from_params(p: &[f64]) -> Option<Self> {
        if p.len() < 8 {
            return None;
        }
        Some(Self {
            r: (p[0], p[1]),
            g: (p[2], p[3]),
            b: (p[4], p[5]),
            w: (p[6], p[7]),
        })
    }

    /// The eight floats of [`from_params`](Self::from_params).
    pub fn to_params(&self) -> [f64; 8] {
        [
            self.r.0, self.r.1, self.g.0, self.g.1, self.b.0, self.b.1, self.w.0, self.w.1,
        ]
    }

    /// White point as XYZ (Y=1).
    #[inline]
    pub fn white_xyz(&self) -> DVec3 {
        xy_to_xyz(self.w.0, self.w.1)
    }
}

/// ACES AP0 primaries (ACES2065-1), ACES white point.
pub const ACES_AP0: Primaries = Primaries {
    r: (0.7347, 0.2653),
    g: (0.0000, 1.0000),
    b: (0.0001, -0.0770),
    w: (0.32168, 0.33767),
};

/// ACES AP1 primaries (ACEScg), ACES white point.
pub const ACES_AP1: Primaries = Primaries {
    r: (0.7130, 0.2930),
    g: (0.1650, 0.8300),
    b: (0.1280, 0.0440),
    w: (0.32168, 0.33767),
};

/// Rec.709 / sRGB primaries, D65.
pub const REC709: Primaries = Primaries {
    r: (0.6400, 0.3300),
    g: (0.3000, 0.6000),
    b: (0.1500, 0.0600),
    w: (0.3127, 0.3290),
};

/// P3 primaries with D65 white.
pub const P3_D65: Primaries = Primaries {
    r: (0.6800, 0.3200),
    g: (0.2650, 0.6900),
    b: (0.1500, 0.0600),
    w: (0.3127, 0.3290),
};

/// Rec.2020 primaries, D65.
pub const REC2020: Primaries = Primaries {
    r: (0.7080, 0.2920),
    g: (0.1700, 0.7970),
    b: (0.1310, 0.0460),
    w: (0.3127, 0.3290),
};

/// Sharpened cone space used by the ACES 2 appearance model, equal-energy white.
pub const CAM16_ACES: Primaries = Primaries {
    r: (0.8336, 0.1735),
    g: (2.3854, -1.4659),
    b: (0.087, -0.125),
    w: (1.0 / 3.0, 1.0 / 3.0),
};

/// Converts xy chromaticity to XYZ with Y=1.
#[inline]
pub fn xy_to_xyz(x: f64, y: f64) -> DVec3 {
    if y.abs() < 1e-12 {
        return DVec3::ZERO;
    }
    DVec3::new(x / y, 1.0, (1.0 - x - y) / y)
}

/// RGB to XYZ matrix, `None` when the primaries are collinear.
pub fn rgb_to_xyz_matrix(p: &Primaries) -> Option<DMat3> {
    let r = xy_to_xyz(p.r.0, p.r.1);
    let g = xy_to_xyz(p.g.0, p.g.1);
    let b = xy_to_xyz(p.b.0, p.b.1);

    let m = DMat3::from_cols(r, g, b);
    if m.determinant().abs() < 1e-12 {
        return None;
    }

    // M * S = W
    let s = m.inverse() * p.white_xyz();
    Some(DMat3::from_cols(r * s.x, g * s.y, b * s.z))
}

/// XYZ to RGB matrix, the inverse of [`rgb_to_xyz_matrix`].
pub fn xyz_to_rgb_matrix(p: &Primaries) -> Option<DMat3> {
    rgb_to_xyz_matrix(p).map(|m| m.inverse())
}

/// RGB to RGB through XYZ without chromatic adaptation.
pub fn rgb_to_rgb_matrix(src: &Primaries, dst: &Primaries) -> Option<DMat3> {
    Some(xyz_to_rgb_matrix(dst)? * rgb_to_xyz_matrix(src)?)
}

/// Row-major single-precision copy of a `DMat3`.
pub fn to_rows_f32(m: &DMat3) -> [f32; 9] {
    let r0 = m.row(0);
    let r1 = m.row(1);
    let r2 = m.row(2);
    [
        r0.x as f32, r0.y as f32, r0.z as f32,
        r1.x as f32, r1.y as f32, r1.z as f32,
        r2.x as f32, r2.y as f32, r2.z as f32,
    ]
}
