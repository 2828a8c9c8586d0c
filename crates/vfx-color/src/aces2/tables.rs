//! Hue-indexed lookup tables.
//!
//! Every table samples one value per whole degree of hue. The 360 samples
//! sit at indices `1..=360`; index 0 repeats hue 359 and index 361 repeats
//! hue 0 so interpolation never needs to wrap:
//!
//! ```text
//! index:  0     1    2   ...  360   361
//! hue:   -1     0    1   ...  359   360
//! ```

use tracing::debug;

use super::cam::{jmh_to_rgb, rgb_to_jmh, JMhParams};
use super::common::*;
use super::gamut::{find_gamut_boundary_intersection, get_focus_gain};

// ============================================================================
// Table Constants
// ============================================================================

/// Number of hue samples
pub const TABLE_NOMINAL_SIZE: usize = 360;

/// Index of the sample for hue 0
pub const TABLE_BASE_INDEX: usize = 1;

/// Samples plus the two wrap entries
pub const TABLE_TOTAL_SIZE: usize = TABLE_NOMINAL_SIZE + 2;

/// Unit cube corners in hue order: R, Y, G, C, B, M.
const CUSP_CORNERS: [F3; 6] = [
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 1.0, 1.0],
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 1.0],
];

/// Splits a hue into the lower table index and the blend toward the next.
#[inline]
fn hue_slot(hue: f32) -> (usize, f32) {
    let h = wrap_to_360(hue);
    let base = (h as usize).min(TABLE_NOMINAL_SIZE - 1);
    (base + TABLE_BASE_INDEX, h - base as f32)
}

// ============================================================================
// Table Types
// ============================================================================

/// One float per hue degree.
#[derive(Debug, Clone, PartialEq)]
pub struct Table1D {
    /// `TABLE_TOTAL_SIZE` entries including the wrap copies
    pub data: Vec<f32>,
}

impl Table1D {
    /// Samples `f` at every whole hue and fills the wrap entries.
    pub fn from_fn(mut f: impl FnMut(f32) -> f32) -> Self {
        let mut data = vec![0.0; TABLE_TOTAL_SIZE];
        for i in 0..TABLE_NOMINAL_SIZE {
            data[i + TABLE_BASE_INDEX] = f(i as f32);
        }
        data[0] = data[TABLE_NOMINAL_SIZE];
        data[TABLE_NOMINAL_SIZE + 1] = data[TABLE_BASE_INDEX];
        Self { data }
    }

    /// Value at a hue in degrees, linearly interpolated.
    #[inline]
    pub fn lookup(&self, hue: f32) -> f32 {
        let (i, t) = hue_slot(hue);
        lerp(self.data[i], self.data[i + 1], t)
    }
}

/// Three floats per hue degree: cusp J, cusp M and the inverse upper hull
/// gamma.
#[derive(Debug, Clone, PartialEq)]
pub struct Table3D {
    /// `TABLE_TOTAL_SIZE` entries including the wrap copies
    pub data: Vec<F3>,
}

impl Table3D {
    /// Value at a hue in degrees, linearly interpolated.
    #[inline]
    pub fn lookup(&self, hue: f32) -> F3 {
        let (i, t) = hue_slot(hue);
        lerp_f3(&self.data[i], &self.data[i + 1], t)
    }

    fn wrap(&mut self) {
        self.data[0] = self.data[TABLE_NOMINAL_SIZE];
        self.data[TABLE_NOMINAL_SIZE + 1] = self.data[TABLE_BASE_INDEX];
    }
}

// ============================================================================
// Reach Table
// ============================================================================

/// Largest M at `limit_j_max` per hue that keeps every channel of
/// `params`' RGB non-negative.
pub fn make_reach_m_table(params: &JMhParams, limit_j_max: f32) -> Table1D {
    let outside = |m: f32, hue: f32| any_below_zero(&jmh_to_rgb(&[limit_j_max, m, hue], params));

    let table = Table1D::from_fn(|hue| {
        let mut low = 0.0f32;
        let mut high = low + REACH_SEARCH_STEP;
        let mut found = false;
        while !found && high < REACH_SEARCH_LIMIT {
            found = outside(high, hue);
            if !found {
                low = high;
                high += REACH_SEARCH_STEP;
            }
        }
        while high - low > REACH_ACCURACY {
            let sample = (high + low) / 2.0;
            if outside(sample, hue) {
                high = sample;
            } else {
                low = sample;
            }
        }
        high
    });
    debug!(limit_j_max, "reach table built");
    table
}

// ============================================================================
// Cusp Table
// ============================================================================

/// Cube corners of the peak-scaled limiting gamut, sorted by hue.
///
/// Entries `1..=6` hold the corners starting at the smallest hue. Entry 0 is
/// the last corner shifted down 360 degrees and entry 7 the first shifted up,
/// so hues are strictly increasing across the whole array.
pub fn build_cusp_corners(params: &JMhParams, peak_luminance: f32) -> ([F3; 8], [F3; 8]) {
    let scale = peak_luminance / REFERENCE_LUMINANCE;
    let rgb = CUSP_CORNERS.map(|c| mult_f_f3(scale, &c));
    let jmh = rgb.map(|c| rgb_to_jmh(&c, params));

    let min_index = (0..6)
        .min_by(|&a, &b| jmh[a][2].total_cmp(&jmh[b][2]))
        .unwrap_or(0);

    let mut rgb_corners = [[0.0; 3]; 8];
    let mut jmh_corners = [[0.0; 3]; 8];
    for i in 0..6 {
        rgb_corners[i + 1] = rgb[(i + min_index) % 6];
        jmh_corners[i + 1] = jmh[(i + min_index) % 6];
    }
    rgb_corners[0] = rgb_corners[6];
    rgb_corners[7] = rgb_corners[1];
    jmh_corners[0] = jmh_corners[6];
    jmh_corners[7] = jmh_corners[1];
    jmh_corners[0][2] -= 360.0;
    jmh_corners[7][2] += 360.0;

    (rgb_corners, jmh_corners)
}

/// Cusp J and M at `hue`, found by bisecting the cube edge that spans it.
fn find_cusp_for_hue(hue: f32, rgb_corners: &[F3; 8], jmh_corners: &[F3; 8], params: &JMhParams) -> F2 {
    let upper = (1..8).find(|&k| jmh_corners[k][2] > hue).unwrap_or(7);
    let lower = upper - 1;

    if jmh_corners[lower][2] == hue {
        return [jmh_corners[lower][0], jmh_corners[lower][1]];
    }

    let edge_lo = &rgb_corners[lower];
    let edge_hi = &rgb_corners[upper];
    let mut lower_t = 0.0f32;
    let mut upper_t = 1.0f32;

    // Hue grows from the lower corner to the upper one along the edge
    let mut iterations = 0;
    while upper_t - lower_t > CUSP_EDGE_ACCURACY && iterations < 64 {
        let t = (lower_t + upper_t) / 2.0;
        let sample = rgb_to_jmh(&lerp_f3(edge_lo, edge_hi, t), params);
        let mut d = sample[2] - hue;
        if d > 180.0 {
            d -= 360.0;
        } else if d <= -180.0 {
            d += 360.0;
        }
        if d > 0.0 {
            upper_t = t;
        } else {
            lower_t = t;
        }
        iterations += 1;
    }

    let jmh = rgb_to_jmh(&lerp_f3(edge_lo, edge_hi, (lower_t + upper_t) / 2.0), params);
    [jmh[0], jmh[1]]
}

/// Cusp of the peak-scaled limiting gamut per hue.
///
/// The gamma column is left at 1 and filled by [`fill_upper_hull_gamma`].
pub fn make_gamut_cusp_table(params: &JMhParams, peak_luminance: f32) -> Table3D {
    let (rgb_corners, jmh_corners) = build_cusp_corners(params, peak_luminance);
    let mut table = Table3D { data: vec![[0.0; 3]; TABLE_TOTAL_SIZE] };
    for i in 0..TABLE_NOMINAL_SIZE {
        let jm = find_cusp_for_hue(i as f32, &rgb_corners, &jmh_corners, params);
        table.data[i + TABLE_BASE_INDEX] = [jm[0], jm[1], 1.0];
    }
    table.wrap();
    table
}

// ============================================================================
// Upper Hull Gamma
// ============================================================================

/// Inputs of the upper hull fit shared by every hue.
#[derive(Debug, Clone, Copy)]
pub struct HullFit {
    /// Peak luminance in cd/m²
    pub peak_luminance: f32,
    /// J of the peak luminance
    pub limit_j_max: f32,
    /// J of display mid grey
    pub mid_j: f32,
    /// Focus distance
    pub focus_dist: f32,
    /// Inverse of the lower hull gamma
    pub lower_hull_gamma_inv: f32,
}

fn gamma_fits(
    cusp: &F2,
    tests: &[F3; 3],
    gamma_top: f32,
    fit: &HullFit,
    limit: &JMhParams,
) -> bool {
    let focus_j = lerp(
        cusp[0],
        fit.mid_j,
        (CUSP_MID_BLEND - cusp[0] / fit.limit_j_max).min(1.0),
    );
    tests.iter().all(|test| {
        let slope_gain = fit.limit_j_max * fit.focus_dist * get_focus_gain(test[0], cusp[0], fit.limit_j_max);
        let approx = find_gamut_boundary_intersection(
            test,
            cusp,
            focus_j,
            fit.limit_j_max,
            slope_gain,
            1.0 / gamma_top,
            fit.lower_hull_gamma_inv,
        );
        let rgb = jmh_to_rgb(&[approx[0], approx[1], test[2]], limit);
        any_above_one(&mult_f_f3(REFERENCE_LUMINANCE / fit.peak_luminance, &rgb))
    })
}

/// Fits the upper hull gamma per hue and stores its inverse in the third
/// column of `table`.
///
/// The fitted gamma is the smallest one for which the approximate boundary
/// at three heights above the cusp lies just outside the real gamut.
pub fn fill_upper_hull_gamma(table: &mut Table3D, fit: &HullFit, limit: &JMhParams) {
    for i in 0..TABLE_NOMINAL_SIZE {
        let hue = i as f32;
        let entry = table.data[i + TABLE_BASE_INDEX];
        let cusp = [entry[0], entry[1]];
        let tests = GAMMA_TEST_POSITIONS
            .map(|pos| [cusp[0] + (fit.limit_j_max - cusp[0]) * pos, cusp[1], hue]);

        let mut low = GAMMA_MINIMUM;
        let mut high = low + GAMMA_SEARCH_STEP;
        while high < GAMMA_MAXIMUM && !gamma_fits(&cusp, &tests, high, fit, limit) {
            low = high;
            high += GAMMA_SEARCH_STEP;
        }
        while high - low > GAMMA_ACCURACY {
            let sample = (high + low) / 2.0;
            if gamma_fits(&cusp, &tests, sample, fit, limit) {
                high = sample;
            } else {
                low = sample;
            }
        }
        table.data[i + TABLE_BASE_INDEX][2] = 1.0 / high;
    }
    table.wrap();
    debug!(peak = fit.peak_luminance, "cusp and upper hull gamma table built");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aces2::cam::y_to_j;
    use vfx_math::primaries::{ACES_AP1, REC709};

    #[test]
    fn test_table1d_wrap_and_lookup() {
        let t = Table1D::from_fn(|h| h);
        assert_eq!(t.data.len(), TABLE_TOTAL_SIZE);
        assert_eq!(t.data[0], 359.0);
        assert_eq!(t.data[TABLE_TOTAL_SIZE - 1], 0.0);
        assert_eq!(t.lookup(180.0), 180.0);
        assert!((t.lookup(10.25) - 10.25).abs() < 1e-5);
        assert!((t.lookup(370.5) - 10.5).abs() < 1e-4);
        // Between 359 and 360 the table blends back toward hue 0
        assert!((t.lookup(359.5) - 179.5).abs() < 1e-3);
    }

    #[test]
    fn test_cusp_corners_sorted() {
        let p = JMhParams::new(&REC709).unwrap();
        let (_, jmh) = build_cusp_corners(&p, 100.0);
        for k in 1..8 {
            assert!(jmh[k][2] > jmh[k - 1][2], "corner hues not increasing at {k}: {jmh:?}");
        }
        assert!(jmh[1][2] >= 0.0 && jmh[6][2] < 360.0);
    }

    #[test]
    fn test_cusp_table_hues_match() {
        let p = JMhParams::new(&REC709).unwrap();
        let table = make_gamut_cusp_table(&p, 100.0);
        for i in (0..360).step_by(15) {
            let [j, m, _] = table.data[i + TABLE_BASE_INDEX];
            assert!(j > 0.0 && m > 0.0, "hue {i}: J {j} M {m}");
            let back = jmh_to_rgb(&[j, m, i as f32], &p);
            // A cusp lies on the cube surface: max channel 1, min channel 0
            let max = back[0].max(back[1]).max(back[2]);
            let min = back[0].min(back[1]).min(back[2]);
            assert!((max - 1.0).abs() < 1e-2, "hue {i}: {back:?}");
            assert!(min.abs() < 1e-2, "hue {i}: {back:?}");
        }
    }

    #[test]
    fn test_reach_table_edges() {
        let p = JMhParams::new(&ACES_AP1).unwrap();
        let limit_j_max = y_to_j(100.0, &p);
        let table = make_reach_m_table(&p, limit_j_max);
        for i in (0..360).step_by(30) {
            let m = table.data[i + TABLE_BASE_INDEX];
            assert!(m > 0.0 && m < REACH_SEARCH_LIMIT + REACH_SEARCH_STEP);
            let hue = i as f32;
            let inside = jmh_to_rgb(&[limit_j_max, m - 0.05, hue], &p);
            assert!(!any_below_zero(&inside), "hue {i}: {inside:?}");
        }
    }
}
