//! Ellipsoidal influence regions that modulate deformation strength.
//!
//! Each region is the unit sphere of a local frame. Points inside the
//! falloff-free core get full weight, points in the falloff band get a linear
//! ramp down to zero at the sphere boundary, and points outside get nothing.

use super::{Point3, Transform};

/// Local distances at or below this count as the region's center.
const CENTER_EPSILON: f64 = 0.0001;

/// Falloffs below this are treated as a hard-edged region.
const FALLOFF_EPSILON: f64 = 0.0001;

/// Accumulated weight at which a point counts as fully influenced.
const FULL_WEIGHT: f64 = 0.9999;

/// One influence region, prepared for per-point evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Influencer {
    /// World-to-local transform of the region.
    pub inverse: Transform,
    /// World-space center of the region.
    pub position: Point3,
    /// Width of the falloff band, as a fraction of the unit radius.
    pub falloff: f64,
    /// Longest basis axis in world space; a cheap bounding radius.
    pub max_axis_length: f64,
}

impl Influencer {
    #[must_use]
    pub const fn new(
        inverse: Transform,
        position: Point3,
        falloff: f64,
        max_axis_length: f64,
    ) -> Self {
        Self {
            inverse,
            position,
            falloff,
            max_axis_length,
        }
    }

    /// Build an influencer from the region's local-to-world matrix.
    ///
    /// Returns `None` when the matrix cannot be inverted.
    #[must_use]
    pub fn from_world_matrix(matrix: Transform, falloff: f64) -> Option<Self> {
        let inverse = matrix.inverse()?;
        let position = Point3::ORIGIN + matrix.translation();
        let max_axis_length = (0..3)
            .map(|axis| matrix.axis(axis).length())
            .fold(0.0_f64, f64::max);
        Some(Self::new(inverse, position, falloff, max_axis_length))
    }

    /// Contribution of this region alone, before accumulation.
    #[must_use]
    pub fn contribution(&self, point: Point3) -> f64 {
        if point.distance_to(self.position) > self.max_axis_length {
            return 0.0;
        }

        let length = self.inverse.apply_point(point).to_vec3().length();
        if length >= 1.0 {
            return 0.0;
        }

        if length <= CENTER_EPSILON
            || self.falloff < FALLOFF_EPSILON
            || length < 1.0 - self.falloff
        {
            1.0
        } else {
            1.0 - (length - (1.0 - self.falloff)) / self.falloff
        }
    }
}

/// Combined weight of `point` against every region.
///
/// Contributions add up; as soon as the running total reaches 0.9999 the
/// point is fully influenced and 1.0 is returned. An empty list yields 0.0.
#[must_use]
pub fn influence_weight(point: Point3, influencers: &[Influencer]) -> f64 {
    let mut total = 0.0;
    for influencer in influencers {
        let contribution = influencer.contribution(point);
        if contribution >= 1.0 {
            return 1.0;
        }
        total += contribution;
        if total >= FULL_WEIGHT {
            return 1.0;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Vec3;

    fn sphere_at(center: Vec3, radius: f64, falloff: f64) -> Influencer {
        let matrix = Transform::translate(center) * Transform::scale(radius, radius, radius);
        Influencer::from_world_matrix(matrix, falloff).unwrap()
    }

    #[test]
    fn test_from_world_matrix_picks_longest_axis() {
        let matrix = Transform::translate(Vec3::new(1.0, 2.0, 3.0))
            * Transform::scale(1.0, 4.0, 2.0);
        let influencer = Influencer::from_world_matrix(matrix, 0.5).unwrap();
        assert_eq!(influencer.position, Point3::new(1.0, 2.0, 3.0));
        assert!((influencer.max_axis_length - 4.0).abs() < 1e-12);
        assert!(Influencer::from_world_matrix(Transform::scale(0.0, 1.0, 1.0), 0.5).is_none());
    }

    #[test]
    fn test_core_gets_full_weight() {
        let region = sphere_at(Vec3::ZERO, 2.0, 0.5);
        assert_eq!(influence_weight(Point3::ORIGIN, &[region]), 1.0);
        // Local distance 0.4 < 1 - falloff.
        assert_eq!(influence_weight(Point3::new(0.8, 0.0, 0.0), &[region]), 1.0);
    }

    #[test]
    fn test_falloff_band_ramps_linearly() {
        let region = sphere_at(Vec3::ZERO, 1.0, 0.5);
        let w = influence_weight(Point3::new(0.75, 0.0, 0.0), &[region]);
        assert!((w - 0.5).abs() < 1e-12);
        let w = influence_weight(Point3::new(0.9, 0.0, 0.0), &[region]);
        assert!((w - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_outside_region_is_zero() {
        let region = sphere_at(Vec3::ZERO, 1.0, 0.5);
        assert_eq!(influence_weight(Point3::new(1.5, 0.0, 0.0), &[region]), 0.0);
        assert_eq!(influence_weight(Point3::new(1.0, 0.0, 0.0), &[region]), 0.0);
        assert_eq!(influence_weight(Point3::ORIGIN, &[]), 0.0);
    }

    #[test]
    fn test_hard_edge_when_falloff_is_tiny() {
        let region = sphere_at(Vec3::ZERO, 1.0, 0.0);
        assert_eq!(influence_weight(Point3::new(0.99, 0.0, 0.0), &[region]), 1.0);
    }

    #[test]
    fn test_overlapping_ramps_accumulate_and_saturate() {
        let a = sphere_at(Vec3::ZERO, 1.0, 1.0);
        let b = sphere_at(Vec3::new(1.0, 0.0, 0.0), 1.0, 1.0);
        // Halfway between both centers each ramp gives 0.5.
        let w = influence_weight(Point3::new(0.5, 0.0, 0.0), &[a, b]);
        assert_eq!(w, 1.0);
        // Each ramp gives 0.4 here; the sum stays below saturation.
        let c = sphere_at(Vec3::new(1.2, 0.0, 0.0), 1.0, 1.0);
        let w = influence_weight(Point3::new(0.6, 0.0, 0.0), &[a, c]);
        assert!((w - 0.8).abs() < 1e-12);
    }
}
