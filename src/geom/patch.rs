//! Patch evaluation over a structured control lattice.
//!
//! The lattice is a row-major grid of `s_divisions` columns by `t_divisions`
//! rows spanning normalized `(u, v)` space `[0, 1] x [0, 1]`. Two evaluators
//! are provided:
//!
//! - **Bilinear**: the ruled patch between the four corners of the cell that
//!   contains `(u, v)` (C0 across cells).
//! - **Bezier**: a tensor-product Bezier patch over a window of cells around
//!   `(u, v)`, which trades wider support for smoother continuity.

use super::Point3;

/// Lattice invariants violated at construction time.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("control grid needs at least 2x2 divisions, got {s_divisions}x{t_divisions}")]
    TooFewDivisions {
        s_divisions: usize,
        t_divisions: usize,
    },
    #[error(
        "control grid has {actual} points but {s_divisions}x{t_divisions} divisions require {expected}"
    )]
    PointCountMismatch {
        s_divisions: usize,
        t_divisions: usize,
        expected: usize,
        actual: usize,
    },
}

// ============================================================================
// Control grid
// ============================================================================

/// Borrowed, validated view of a control lattice.
#[derive(Debug, Clone, Copy)]
pub struct ControlGrid<'a> {
    points: &'a [Point3],
    s_divisions: usize,
    t_divisions: usize,
}

impl<'a> ControlGrid<'a> {
    /// Validate `points` as an `s_divisions x t_divisions` lattice.
    ///
    /// # Errors
    /// Fails when either dimension is below 2 or when `points.len()` is not
    /// exactly `s_divisions * t_divisions`.
    pub fn new(
        points: &'a [Point3],
        s_divisions: usize,
        t_divisions: usize,
    ) -> Result<Self, PatchError> {
        if s_divisions < 2 || t_divisions < 2 {
            return Err(PatchError::TooFewDivisions {
                s_divisions,
                t_divisions,
            });
        }
        let expected = s_divisions.checked_mul(t_divisions).unwrap_or(usize::MAX);
        if points.len() != expected {
            return Err(PatchError::PointCountMismatch {
                s_divisions,
                t_divisions,
                expected,
                actual: points.len(),
            });
        }
        Ok(Self {
            points,
            s_divisions,
            t_divisions,
        })
    }

    #[must_use]
    pub const fn s_divisions(&self) -> usize {
        self.s_divisions
    }

    #[must_use]
    pub const fn t_divisions(&self) -> usize {
        self.t_divisions
    }

    #[must_use]
    pub const fn points(&self) -> &'a [Point3] {
        self.points
    }

    /// Control point at `column`, `row`. Both must be in range.
    #[must_use]
    pub fn point(&self, column: usize, row: usize) -> Point3 {
        self.points[column + row * self.s_divisions]
    }
}

/// The undeformed lattice: a unit plane centered on the gate, z = 0.
///
/// Column `i`, row `j` sits at `(i / (s - 1) - 0.5, j / (t - 1) - 0.5, 0)`.
#[must_use]
pub fn identity_lattice(s_divisions: usize, t_divisions: usize) -> Vec<Point3> {
    let s_step = 1.0 / (s_divisions.max(2) - 1) as f64;
    let t_step = 1.0 / (t_divisions.max(2) - 1) as f64;
    (0..t_divisions)
        .flat_map(|row| {
            (0..s_divisions).map(move |column| {
                Point3::new(
                    column as f64 * s_step - 0.5,
                    row as f64 * t_step - 0.5,
                    0.0,
                )
            })
        })
        .collect()
}

// ============================================================================
// Cell search
// ============================================================================

/// Locate the pair of consecutive lattice lines bracketing `w`.
///
/// Lines are spaced `1 / (divisions - 1)` apart. Coordinates before the first
/// line map to the first cell; coordinates at or past the last line (and NaN)
/// map to the last cell. Always returns `(low, low + 1)` for `divisions >= 2`.
#[must_use]
pub fn find_boundary_cell(w: f64, divisions: usize) -> (usize, usize) {
    let divisions = divisions.max(2);
    let step = 1.0 / (divisions - 1) as f64;

    let hit = (0..divisions - 1).find(|&i| {
        let start = step * i as f64;
        w >= start && w < start + step
    });
    if let Some(i) = hit {
        return (i, i + 1);
    }

    if w < 0.0 {
        return (0, 1);
    }

    (divisions - 2, divisions - 1)
}

// ============================================================================
// Bilinear
// ============================================================================

/// Evaluate the bilinear patch of the cell containing `(u, v)`.
#[must_use]
pub fn bilinear_point(grid: &ControlGrid<'_>, u: f64, v: f64) -> Point3 {
    let (min_x, max_x) = find_boundary_cell(u, grid.s_divisions);
    let (min_y, max_y) = find_boundary_cell(v, grid.t_divisions);

    let factor_x = (grid.s_divisions - 1) as f64;
    let factor_y = (grid.t_divisions - 1) as f64;
    let u_local = local_fraction(u, min_x, max_x, factor_x);
    let v_local = local_fraction(v, min_y, max_y, factor_y);

    let p1 = grid.point(min_x, min_y);
    let p2 = grid.point(min_x, max_y);
    let p3 = grid.point(max_x, min_y);
    let p4 = grid.point(max_x, max_y);

    // Edges along v first, then across u.
    let p21 = p1 + (p2 - p1) * v_local;
    let p43 = p3 + (p4 - p3) * v_local;
    p21 + (p43 - p21) * u_local
}

fn local_fraction(w: f64, low: usize, high: usize, factor: f64) -> f64 {
    let start = low as f64 / factor;
    let end = high as f64 / factor;
    (w - start) / (end - start)
}

// ============================================================================
// Bezier
// ============================================================================

/// Sub-rectangle of the lattice treated as one Bezier patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BezierWindow {
    /// First column of the window.
    pub offset_s: usize,
    /// First row of the window.
    pub offset_t: usize,
    /// Number of columns (patch order along u).
    pub width_s: usize,
    /// Number of rows (patch order along v).
    pub width_t: usize,
}

impl BezierWindow {
    /// The whole lattice as a single window.
    #[must_use]
    pub const fn full(grid: &ControlGrid<'_>) -> Self {
        Self {
            offset_s: 0,
            offset_t: 0,
            width_s: grid.s_divisions,
            width_t: grid.t_divisions,
        }
    }

    /// Window of control points around `(u, v)`, returned together with
    /// `(u, v)` renormalized over it.
    ///
    /// With `max_recursion == 0` this is the classified cell. Otherwise each
    /// axis spans nodes `low - max_recursion ..= low + max_recursion`, where
    /// `low` is the lower cell line, clamped to the lattice.
    #[must_use]
    pub fn around(
        grid: &ControlGrid<'_>,
        u: f64,
        v: f64,
        max_recursion: usize,
    ) -> (Self, f64, f64) {
        let (offset_s, width_s, u_local) = widen_axis(u, grid.s_divisions, max_recursion);
        let (offset_t, width_t, v_local) = widen_axis(v, grid.t_divisions, max_recursion);
        (
            Self {
                offset_s,
                offset_t,
                width_s,
                width_t,
            },
            u_local,
            v_local,
        )
    }
}

fn widen_axis(w: f64, divisions: usize, margin: usize) -> (usize, usize, f64) {
    let (low, high) = find_boundary_cell(w, divisions);
    let (first, last) = if margin == 0 {
        (low, high)
    } else {
        (
            low.saturating_sub(margin),
            high.saturating_add(margin).min(divisions) - 1,
        )
    };

    let factor = (divisions - 1) as f64;
    let local = local_fraction(w, first, last, factor);
    (first, last - first + 1, local)
}

/// Evaluate the tensor-product Bezier patch spanned by `window` at `(u, v)`,
/// where `(u, v)` is already normalized over the window.
#[must_use]
pub fn bezier_point(grid: &ControlGrid<'_>, u: f64, v: f64, window: BezierWindow) -> Point3 {
    let degree_s = window.width_s.saturating_sub(1);
    let degree_t = window.width_t.saturating_sub(1);

    let mut x = 0.0;
    let mut y = 0.0;
    let mut z = 0.0;
    for s in 0..window.width_s {
        let bu = bernstein(s, degree_s, u);
        for t in 0..window.width_t {
            let weight = bu * bernstein(t, degree_t, v);
            let p = grid.point(window.offset_s + s, window.offset_t + t);
            x += p.x * weight;
            y += p.y * weight;
            z += p.z * weight;
        }
    }
    Point3::new(x, y, z)
}

/// Bernstein basis polynomial `C(degree, i) * s^i * (1 - s)^(degree - i)`.
#[must_use]
pub fn bernstein(i: usize, degree: usize, s: f64) -> f64 {
    if i > degree {
        return 0.0;
    }
    binomial(degree, i) * powi(s, i) * powi(1.0 - s, degree - i)
}

fn powi(base: f64, exp: usize) -> f64 {
    base.powi(i32::try_from(exp).unwrap_or(i32::MAX))
}

/// Binomial coefficient `n choose k` in floating point.
#[must_use]
pub fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut result = 1.0;
    for i in 0..k {
        result = result * (n - i) as f64 / (i + 1) as f64;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binomial_matches_factorial_formula() {
        fn fac(n: usize) -> f64 {
            (1..=n).map(|v| v as f64).product()
        }
        for n in 0..20 {
            for k in 0..=n {
                let expected = fac(n) / (fac(k) * fac(n - k));
                assert!((binomial(n, k) - expected).abs() <= expected * 1e-12);
            }
        }
        assert_eq!(binomial(3, 4), 0.0);
    }

    #[test]
    fn test_bernstein_partition_of_unity() {
        for degree in 0..8 {
            for step in 0..=10 {
                let s = f64::from(step) / 10.0;
                let sum: f64 = (0..=degree).map(|i| bernstein(i, degree, s)).sum();
                assert!((sum - 1.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_bernstein_endpoints() {
        assert_eq!(bernstein(0, 3, 0.0), 1.0);
        assert_eq!(bernstein(3, 3, 1.0), 1.0);
        assert_eq!(bernstein(1, 3, 0.0), 0.0);
    }

    #[test]
    fn test_boundary_cell_interior_and_edges() {
        assert_eq!(find_boundary_cell(0.0, 3), (0, 1));
        assert_eq!(find_boundary_cell(0.49, 3), (0, 1));
        assert_eq!(find_boundary_cell(0.5, 3), (1, 2));
        assert_eq!(find_boundary_cell(1.0, 3), (1, 2));
        assert_eq!(find_boundary_cell(-0.2, 3), (0, 1));
        assert_eq!(find_boundary_cell(7.0, 5), (3, 4));
        assert_eq!(find_boundary_cell(f64::NAN, 4), (2, 3));
    }

    #[test]
    fn test_identity_lattice_layout() {
        let pts = identity_lattice(3, 2);
        assert_eq!(pts.len(), 6);
        assert_eq!(pts[0], Point3::new(-0.5, -0.5, 0.0));
        assert_eq!(pts[1], Point3::new(0.0, -0.5, 0.0));
        assert_eq!(pts[5], Point3::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn test_grid_rejects_bad_sizes() {
        let pts = identity_lattice(3, 3);
        assert!(matches!(
            ControlGrid::new(&pts, 3, 2),
            Err(PatchError::PointCountMismatch { expected: 6, actual: 9, .. })
        ));
        assert!(matches!(
            ControlGrid::new(&pts[..3], 3, 1),
            Err(PatchError::TooFewDivisions { .. })
        ));
        assert!(ControlGrid::new(&[], 2, 2).is_err());
    }

    #[test]
    fn test_window_zero_margin_is_the_cell() {
        let pts = identity_lattice(5, 5);
        let grid = ControlGrid::new(&pts, 5, 5).unwrap();
        let (window, u, v) = BezierWindow::around(&grid, 0.3, 0.6, 0);
        assert_eq!(
            window,
            BezierWindow {
                offset_s: 1,
                offset_t: 2,
                width_s: 2,
                width_t: 2,
            }
        );
        assert!((u - 0.2).abs() < 1e-12);
        assert!((v - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_window_margin_is_centred_on_low_line() {
        let pts = identity_lattice(9, 9);
        let grid = ControlGrid::new(&pts, 9, 9).unwrap();
        let (window, u, v) = BezierWindow::around(&grid, 0.53, 0.47, 1);
        assert_eq!(
            window,
            BezierWindow {
                offset_s: 3,
                offset_t: 2,
                width_s: 3,
                width_t: 3,
            }
        );
        assert!((u - 0.62).abs() < 1e-12);
        assert!((v - 0.88).abs() < 1e-12);

        // Upper edge: the window stops at the last line.
        let (window, _, _) = BezierWindow::around(&grid, 0.95, 0.05, 2);
        assert_eq!((window.offset_s, window.width_s), (5, 4));
        assert_eq!((window.offset_t, window.width_t), (0, 3));
    }

    #[test]
    fn test_window_clamps_to_grid() {
        let pts = identity_lattice(5, 4);
        let grid = ControlGrid::new(&pts, 5, 4).unwrap();
        let (window, u, v) = BezierWindow::around(&grid, 0.1, 0.9, 10);
        assert_eq!(window, BezierWindow::full(&grid));
        assert!((u - 0.1).abs() < 1e-12);
        assert!((v - 0.9).abs() < 1e-12);
    }
}
