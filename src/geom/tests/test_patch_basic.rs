//! Tests for lattice cell search and patch evaluation.

use crate::geom::{
    BezierWindow, ControlGrid, Point3, Tolerance, Vec3, bezier_point, bilinear_point,
    find_boundary_cell, identity_lattice,
};

// ============================================================================
// Helpers
// ============================================================================

/// Identity lattice with a deterministic wobble on every control point.
fn wobbly_lattice(s_divisions: usize, t_divisions: usize) -> Vec<Point3> {
    identity_lattice(s_divisions, t_divisions)
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            let k = i as f64;
            Point3::new(
                p.x + 0.03 * (k * 1.7).sin(),
                p.y + 0.02 * (k * 0.9).cos(),
                0.1 * (k * 0.3).sin(),
            )
        })
        .collect()
}

fn samples(count: usize) -> impl Iterator<Item = f64> {
    (0..=count).map(move |i| i as f64 / count as f64)
}

// ============================================================================
// Cell search
// ============================================================================

#[test]
fn test_boundary_cell_brackets_every_coordinate() {
    for divisions in 2..=12 {
        let step = 1.0 / (divisions - 1) as f64;
        for w in samples(97) {
            let (low, high) = find_boundary_cell(w, divisions);
            assert_eq!(high, low + 1, "D={divisions} w={w}");
            assert!(high < divisions);
            assert!(step * low as f64 <= w + 1e-12, "D={divisions} w={w}");
            assert!(w <= step * high as f64 + 1e-12, "D={divisions} w={w}");
        }
    }
}

#[test]
fn test_boundary_cell_out_of_range() {
    for divisions in 2..=6 {
        assert_eq!(find_boundary_cell(-0.05, divisions), (0, 1));
        assert_eq!(find_boundary_cell(-10.0, divisions), (0, 1));
        assert_eq!(find_boundary_cell(1.05, divisions), (divisions - 2, divisions - 1));
        assert_eq!(find_boundary_cell(f64::INFINITY, divisions), (divisions - 2, divisions - 1));
    }
}

// ============================================================================
// Bilinear
// ============================================================================

#[test]
fn test_bilinear_reproduces_control_points() {
    let tol = Tolerance::LOOSE;
    let (s, t) = (5, 4);
    let lattice = wobbly_lattice(s, t);
    let grid = ControlGrid::new(&lattice, s, t).unwrap();

    for row in 0..t {
        for column in 0..s {
            let u = column as f64 / (s - 1) as f64;
            let v = row as f64 / (t - 1) as f64;
            let p = bilinear_point(&grid, u, v);
            assert!(
                tol.approx_eq_point3(p, grid.point(column, row)),
                "node ({column}, {row}): {p:?}"
            );
        }
    }
}

#[test]
fn test_bilinear_identity_lattice_is_identity() {
    let lattice = identity_lattice(4, 6);
    let grid = ControlGrid::new(&lattice, 4, 6).unwrap();
    for u in samples(13) {
        for v in samples(11) {
            let p = bilinear_point(&grid, u, v);
            assert!(Tolerance::LOOSE.approx_eq_point3(p, Point3::new(u - 0.5, v - 0.5, 0.0)));
        }
    }
}

#[test]
fn test_bilinear_extrapolates_in_gate_band() {
    // Slightly outside [0, 1] the edge cell is extended linearly.
    let lattice = identity_lattice(3, 3);
    let grid = ControlGrid::new(&lattice, 3, 3).unwrap();
    let p = bilinear_point(&grid, -0.04, 1.03);
    assert!(Tolerance::LOOSE.approx_eq_point3(p, Point3::new(-0.54, 0.53, 0.0)));
}

// ============================================================================
// Bezier
// ============================================================================

#[test]
fn test_bezier_two_by_two_matches_bilinear() {
    let lattice = wobbly_lattice(2, 2);
    let grid = ControlGrid::new(&lattice, 2, 2).unwrap();
    let window = BezierWindow::full(&grid);
    for u in samples(8) {
        for v in samples(8) {
            let a = bezier_point(&grid, u, v, window);
            let b = bilinear_point(&grid, u, v);
            assert!(Tolerance::LOOSE.approx_eq_point3(a, b), "({u}, {v})");
        }
    }
}

#[test]
fn test_bezier_zero_recursion_matches_bilinear() {
    let lattice = wobbly_lattice(6, 5);
    let grid = ControlGrid::new(&lattice, 6, 5).unwrap();
    for u in samples(17) {
        for v in samples(15) {
            let (window, lu, lv) = BezierWindow::around(&grid, u, v, 0);
            let a = bezier_point(&grid, lu, lv, window);
            let b = bilinear_point(&grid, u, v);
            assert!(Tolerance::LOOSE.approx_eq_point3(a, b), "({u}, {v})");
        }
    }
}

#[test]
fn test_bezier_has_linear_precision() {
    let lattice = identity_lattice(7, 7);
    let grid = ControlGrid::new(&lattice, 7, 7).unwrap();
    for recursion in [1, 2, 10] {
        for u in samples(9) {
            for v in samples(9) {
                let (window, lu, lv) = BezierWindow::around(&grid, u, v, recursion);
                let p = bezier_point(&grid, lu, lv, window);
                assert!(
                    Tolerance::LOOSE.approx_eq_point3(p, Point3::new(u - 0.5, v - 0.5, 0.0)),
                    "r={recursion} ({u}, {v}): {p:?}"
                );
            }
        }
    }
}

#[test]
fn test_bezier_interpolates_window_corners() {
    let lattice = wobbly_lattice(5, 5);
    let grid = ControlGrid::new(&lattice, 5, 5).unwrap();
    let window = BezierWindow::full(&grid);

    let tol = Tolerance::LOOSE;
    assert!(tol.approx_eq_point3(bezier_point(&grid, 0.0, 0.0, window), grid.point(0, 0)));
    assert!(tol.approx_eq_point3(bezier_point(&grid, 1.0, 0.0, window), grid.point(4, 0)));
    assert!(tol.approx_eq_point3(bezier_point(&grid, 0.0, 1.0, window), grid.point(0, 4)));
    assert!(tol.approx_eq_point3(bezier_point(&grid, 1.0, 1.0, window), grid.point(4, 4)));
}

#[test]
fn test_bezier_window_grows_with_recursion() {
    let lattice = identity_lattice(9, 9);
    let grid = ControlGrid::new(&lattice, 9, 9).unwrap();
    let (narrow, _, _) = BezierWindow::around(&grid, 0.5, 0.5, 1);
    let (wide, _, _) = BezierWindow::around(&grid, 0.5, 0.5, 3);
    assert_eq!(narrow.width_s, 3);
    assert_eq!(wide.width_s, 7);
    assert_eq!(wide.offset_s, 1);
}

#[test]
fn test_bezier_window_weights_neighbouring_nodes() {
    // Lift one interior node of a 9x9 identity lattice. With one ring of
    // recursion the sample sits in a quadratic window over columns 3..=5 and
    // rows 2..=4, renormalized to (0.62, 0.88), so the lifted node enters with
    // weight B(1,2,0.62) * B(1,2,0.88) = 0.4712 * 0.2112.
    let mut lattice = identity_lattice(9, 9);
    let lift = Vec3::new(0.1, 0.05, 0.2);
    lattice[4 + 3 * 9] = lattice[4 + 3 * 9] + lift;
    let grid = ControlGrid::new(&lattice, 9, 9).unwrap();

    let (window, lu, lv) = BezierWindow::around(&grid, 0.53, 0.47, 1);
    let p = bezier_point(&grid, lu, lv, window);

    let weight = 0.4712 * 0.2112;
    let expected = Point3::new(0.03, -0.03, 0.0) + lift * weight;
    assert!(Tolerance::LOOSE.approx_eq_point3(p, expected), "{p:?} vs {expected:?}");
}
