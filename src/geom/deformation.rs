//! Camera-space lattice deformation of individual points.
//!
//! A point is projected into the camera gate, remapped through the control
//! lattice, projected back and blended with its original position:
//!
//! 1. Weight = envelope, scaled by the influence regions when there are any.
//! 2. Negligible weight leaves the point untouched.
//! 3. Project; divide by depth unless the camera is orthographic.
//! 4. Map gate coordinates to normalized `(u, v)`.
//! 5. Points outside the gate (plus the gate offset band) stay untouched.
//! 6. Evaluate the lattice (bilinear, or Bezier over a window of cells).
//! 7. Scale back to gate units and restore the projected depth.
//! 8. Undo the perspective divide with the same depth.
//! 9. Unproject.
//! 10. Blend with the original position by weight.
//!
//! Points never depend on each other, so ranges can be evaluated in any order.
//!
//! # Example
//!
//! ```ignore
//! use camera_lattice_engine::geom::*;
//!
//! let lattice = identity_lattice(4, 4);
//! let grid = ControlGrid::new(&lattice, 4, 4)?;
//! let frame = ProjectionFrame::from_object_and_camera(object, camera)?;
//! let gate = FilmGate::perspective(1.06, 0.71);
//! let options = DeformOptions::new().behaviour(Behaviour::Bezier).max_recursion(2);
//! let deformation = LatticeDeformation::new(grid, frame, gate, options, &[])?;
//! let moved = deformation.deform_point(Point3::new(0.0, 0.0, -5.0)).position();
//! ```

use serde::{Deserialize, Serialize};

use super::influence::{Influencer, influence_weight};
use super::patch::{BezierWindow, ControlGrid, PatchError, bezier_point, bilinear_point};
use super::{FilmGate, Point3, Transform};

/// Weights below this leave the point untouched.
const MIN_WEIGHT: f64 = 0.00001;

/// Weights above this take the deformed position as is.
const FULL_WEIGHT: f64 = 0.9999;

// ============================================================================
// Error types
// ============================================================================

/// Configuration errors. A pass that hits one writes no output.
#[derive(Debug, thiserror::Error)]
pub enum DeformationError {
    #[error(transparent)]
    Grid(#[from] PatchError),

    #[error("output buffer holds {output} points but the input has {input}")]
    PointCountMismatch { input: usize, output: usize },

    #[error("film aperture must be finite and non-zero (horizontal {horizontal}, vertical {vertical})")]
    InvalidAperture { horizontal: f64, vertical: f64 },

    #[error("{name} must be finite, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("{0} matrix is not invertible")]
    SingularMatrix(&'static str),
}

// ============================================================================
// Options
// ============================================================================

/// Lattice interpolation strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Behaviour {
    /// Bilinear patch of the containing cell.
    #[default]
    Linear,
    /// Tensor-product Bezier patch over a window of cells.
    Bezier,
}

impl Behaviour {
    /// Map a host enum index (0 = linear, 1 = bezier).
    #[must_use]
    pub const fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::Linear),
            1 => Some(Self::Bezier),
            _ => None,
        }
    }
}

/// Scalar settings of a deformation pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeformOptions {
    /// Interpolation strategy.
    pub behaviour: Behaviour,
    /// Bezier window margin, in cells around the containing cell.
    pub max_recursion: usize,
    /// Tolerance band around the `[0, 1]` gate that still deforms.
    pub gate_offset: f64,
    /// Global deformation strength.
    pub envelope: f64,
    /// Points per work chunk. Zero means a single chunk.
    pub chunk_size: usize,
}

impl Default for DeformOptions {
    fn default() -> Self {
        Self {
            behaviour: Behaviour::Linear,
            max_recursion: 10,
            gate_offset: 0.05,
            envelope: 1.0,
            chunk_size: 1024,
        }
    }
}

impl DeformOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn behaviour(mut self, behaviour: Behaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    #[must_use]
    pub const fn max_recursion(mut self, max_recursion: usize) -> Self {
        self.max_recursion = max_recursion;
        self
    }

    #[must_use]
    pub const fn gate_offset(mut self, gate_offset: f64) -> Self {
        self.gate_offset = gate_offset;
        self
    }

    #[must_use]
    pub const fn envelope(mut self, envelope: f64) -> Self {
        self.envelope = envelope;
        self
    }

    #[must_use]
    pub const fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// # Errors
    /// Fails on a non-finite envelope or gate offset.
    pub fn validate(&self) -> Result<(), DeformationError> {
        for (name, value) in [("envelope", self.envelope), ("gate offset", self.gate_offset)] {
            if !value.is_finite() {
                return Err(DeformationError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Projection frame
// ============================================================================

/// Matrices of one pass: into camera space, back out, and to world space for
/// influence lookups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionFrame {
    pub projection: Transform,
    pub inverse_projection: Transform,
    pub world: Transform,
}

impl ProjectionFrame {
    #[must_use]
    pub const fn new(projection: Transform, inverse_projection: Transform, world: Transform) -> Self {
        Self {
            projection,
            inverse_projection,
            world,
        }
    }

    /// Frame for an object seen through a camera, both given as
    /// local-to-world matrices.
    ///
    /// # Errors
    /// Fails when either matrix is singular.
    pub fn from_object_and_camera(
        object: Transform,
        camera: Transform,
    ) -> Result<Self, DeformationError> {
        let camera_inverse = camera
            .inverse()
            .ok_or(DeformationError::SingularMatrix("camera"))?;
        let object_inverse = object
            .inverse()
            .ok_or(DeformationError::SingularMatrix("object"))?;
        Ok(Self::new(
            camera_inverse * object,
            object_inverse * camera,
            object,
        ))
    }
}

impl Default for ProjectionFrame {
    fn default() -> Self {
        Self::new(Transform::identity(), Transform::identity(), Transform::identity())
    }
}

// ============================================================================
// Kernel
// ============================================================================

/// What happened to a single point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointOutcome {
    /// Moved (possibly partially) toward its lattice position.
    Deformed(Point3),
    /// Weight too small to matter; the input is kept.
    Unweighted(Point3),
    /// Projected outside the gate band; the input is kept.
    OutsideGate(Point3),
}

impl PointOutcome {
    /// Final position, whatever the outcome.
    #[must_use]
    pub const fn position(self) -> Point3 {
        match self {
            Self::Deformed(p) | Self::Unweighted(p) | Self::OutsideGate(p) => p,
        }
    }
}

/// Read-only inputs of a pass, shared by every point.
#[derive(Debug, Clone, Copy)]
pub struct LatticeDeformation<'a> {
    grid: ControlGrid<'a>,
    frame: ProjectionFrame,
    gate: FilmGate,
    options: DeformOptions,
    influencers: &'a [Influencer],
}

impl<'a> LatticeDeformation<'a> {
    /// # Errors
    /// Fails on an unusable gate or non-finite options.
    pub fn new(
        grid: ControlGrid<'a>,
        frame: ProjectionFrame,
        gate: FilmGate,
        options: DeformOptions,
        influencers: &'a [Influencer],
    ) -> Result<Self, DeformationError> {
        gate.validate()?;
        options.validate()?;
        Ok(Self {
            grid,
            frame,
            gate,
            options,
            influencers,
        })
    }

    #[must_use]
    pub const fn options(&self) -> &DeformOptions {
        &self.options
    }

    #[must_use]
    pub const fn influencers(&self) -> &'a [Influencer] {
        self.influencers
    }

    /// Effective weight of `point`: envelope, modulated by influence regions.
    #[must_use]
    pub fn weight(&self, point: Point3) -> f64 {
        if self.influencers.is_empty() {
            self.options.envelope
        } else {
            let world_point = self.frame.world.apply_point(point);
            self.options.envelope * influence_weight(world_point, self.influencers)
        }
    }

    /// Run the full per-point pipeline.
    #[must_use]
    pub fn deform_point(&self, point: Point3) -> PointOutcome {
        let weight = self.weight(point);
        if weight < MIN_WEIGHT {
            return PointOutcome::Unweighted(point);
        }

        let mut projected = self.frame.projection.apply_point(point);
        let depth = -projected.z;
        if !self.gate.orthographic {
            projected = projected.scaled(1.0 / depth);
        }

        let u = projected.x / self.gate.horizontal_aperture + 0.5;
        let v = projected.y / self.gate.vertical_aperture + 0.5;

        // NaN (a point on the camera plane) fails the range check too.
        let band = self.options.gate_offset;
        let gate = -band..=1.0 + band;
        if !gate.contains(&u) || !gate.contains(&v) {
            return PointOutcome::OutsideGate(point);
        }

        let lattice_point = match self.options.behaviour {
            Behaviour::Linear => bilinear_point(&self.grid, u, v),
            Behaviour::Bezier => {
                let (window, u, v) =
                    BezierWindow::around(&self.grid, u, v, self.options.max_recursion);
                bezier_point(&self.grid, u, v, window)
            }
        };

        let mut camera_point = Point3::new(
            lattice_point.x * self.gate.horizontal_aperture,
            lattice_point.y * self.gate.vertical_aperture,
            projected.z,
        );
        if !self.gate.orthographic {
            camera_point = camera_point.scaled(depth);
        }

        let deformed = self.frame.inverse_projection.apply_point(camera_point);
        if weight > FULL_WEIGHT {
            PointOutcome::Deformed(deformed)
        } else {
            PointOutcome::Deformed(point + (deformed - point) * weight)
        }
    }
}
