//! Camera gate resolution.
//!
//! Turns camera settings into the normalized gate extents used by the point
//! kernel, and into the placement of the lattice plane in front of the camera.
//! Film apertures are in inches, focal lengths in millimeters.

use serde::{Deserialize, Serialize};

use super::Tolerance;
use super::deformation::DeformationError;

const MM_PER_INCH: f64 = 25.4;
const INCH_PER_MM: f64 = 0.03937;

/// Lattice plane depth offset past the near clip plane (orthographic).
const ORTHO_PLANE_OFFSET: f64 = 0.04;
/// Lattice plane depth offset past the near clip plane (perspective).
const PERSPECTIVE_PLANE_OFFSET: f64 = 0.0001;

/// Extents of the camera-normalized gate and the projection mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilmGate {
    pub horizontal_aperture: f64,
    pub vertical_aperture: f64,
    pub orthographic: bool,
}

impl FilmGate {
    #[must_use]
    pub const fn new(horizontal_aperture: f64, vertical_aperture: f64, orthographic: bool) -> Self {
        Self {
            horizontal_aperture,
            vertical_aperture,
            orthographic,
        }
    }

    #[must_use]
    pub const fn perspective(horizontal_aperture: f64, vertical_aperture: f64) -> Self {
        Self::new(horizontal_aperture, vertical_aperture, false)
    }

    #[must_use]
    pub const fn orthographic(width: f64) -> Self {
        Self::new(width, width, true)
    }

    /// # Errors
    /// Fails when either extent is non-finite or zero.
    pub fn validate(&self) -> Result<(), DeformationError> {
        let usable = |extent: f64| {
            extent.is_finite() && !Tolerance::ZERO_LENGTH.is_zero_length(extent)
        };
        if usable(self.horizontal_aperture) && usable(self.vertical_aperture) {
            Ok(())
        } else {
            Err(DeformationError::InvalidAperture {
                horizontal: self.horizontal_aperture,
                vertical: self.vertical_aperture,
            })
        }
    }
}

/// Camera settings as a host exposes them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraParameters {
    /// Focal length in millimeters.
    pub focal_length: f64,
    /// Horizontal film aperture in inches.
    pub horizontal_film_aperture: f64,
    /// Vertical film aperture in inches.
    pub vertical_film_aperture: f64,
    pub orthographic: bool,
    pub orthographic_width: f64,
    pub near_clip_plane: f64,
}

impl Default for CameraParameters {
    /// 35mm lens on a 1.417" x 0.945" back.
    fn default() -> Self {
        Self {
            focal_length: 35.0,
            horizontal_film_aperture: 1.417,
            vertical_film_aperture: 0.945,
            orthographic: false,
            orthographic_width: 30.0,
            near_clip_plane: 0.1,
        }
    }
}

/// Transform of the lattice plane in camera space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatticePlacement {
    pub scale_x: f64,
    pub scale_y: f64,
    pub translate_z: f64,
}

impl CameraParameters {
    /// Gate extents at unit distance from the camera.
    ///
    /// # Errors
    /// Returns [`DeformationError::InvalidAperture`] when the resulting
    /// extents are zero or non-finite (for instance a zero focal length).
    pub fn film_gate(&self) -> Result<FilmGate, DeformationError> {
        let gate = if self.orthographic {
            FilmGate::orthographic(self.orthographic_width)
        } else {
            let extent = |aperture: f64| {
                let half_fov = (0.5 * aperture / (self.focal_length * INCH_PER_MM)).atan();
                half_fov.tan() * 2.0
            };
            FilmGate::perspective(
                extent(self.horizontal_film_aperture),
                extent(self.vertical_film_aperture),
            )
        };
        gate.validate()?;
        Ok(gate)
    }

    /// Scale and depth that fit the lattice plane to the gate, just past the
    /// near clip plane so it stays visible.
    #[must_use]
    pub fn lattice_placement(&self) -> LatticePlacement {
        let (scale_x, scale_y, offset) = if self.orthographic {
            (
                self.orthographic_width,
                self.orthographic_width,
                ORTHO_PLANE_OFFSET,
            )
        } else {
            let scale = |aperture: f64| {
                let fov = 2.0 * (0.5 * aperture * MM_PER_INCH / self.focal_length).atan();
                2.0 * (fov / 2.0).tan() * self.near_clip_plane
            };
            (
                scale(self.horizontal_film_aperture),
                scale(self.vertical_film_aperture),
                PERSPECTIVE_PLANE_OFFSET,
            )
        };
        LatticePlacement {
            scale_x,
            scale_y,
            translate_z: -self.near_clip_plane - offset,
        }
    }
}
