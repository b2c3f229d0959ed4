//! Point-set evaluation driver.
//!
//! Splits the point range into contiguous chunks and runs the kernel on each
//! one, in parallel when the `parallel` feature is enabled. Every output slot
//! is written by exactly one chunk and depends only on the matching input, so
//! the result is identical for any chunk size or thread count.

use super::deformation::{DeformOptions, DeformationError, LatticeDeformation, ProjectionFrame};
use super::diagnostics::DeformationDiagnostics;
use super::influence::Influencer;
use super::patch::ControlGrid;
use super::{FilmGate, Point3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Deform `points` and return the new positions.
///
/// This is the one-shot entry point: it validates the configuration, splits
/// the work by `options.chunk_size` and returns the deformed points in input
/// order together with the pass diagnostics.
///
/// # Errors
/// Configuration errors only (unusable gate, non-finite options). Nothing is
/// produced when one is raised.
pub fn deform_points(
    points: &[Point3],
    influencers: &[Influencer],
    grid: ControlGrid<'_>,
    frame: &ProjectionFrame,
    gate: FilmGate,
    options: &DeformOptions,
) -> Result<(Vec<Point3>, DeformationDiagnostics), DeformationError> {
    let deformation = LatticeDeformation::new(grid, *frame, gate, *options, influencers)?;
    let mut output = vec![Point3::ORIGIN; points.len()];
    let diagnostics = deform_points_into(points, &mut output, &deformation, options.chunk_size)?;
    Ok((output, diagnostics))
}

/// Deform `points` into a caller-owned buffer of the same length.
///
/// `chunk_size == 0` processes everything as one chunk.
///
/// # Errors
/// [`DeformationError::PointCountMismatch`] when the buffer length differs
/// from the input; `output` is left untouched in that case.
pub fn deform_points_into(
    points: &[Point3],
    output: &mut [Point3],
    deformation: &LatticeDeformation<'_>,
    chunk_size: usize,
) -> Result<DeformationDiagnostics, DeformationError> {
    if points.len() != output.len() {
        return Err(DeformationError::PointCountMismatch {
            input: points.len(),
            output: output.len(),
        });
    }

    let mut diagnostics = if points.is_empty() {
        DeformationDiagnostics::new()
    } else {
        let chunk = effective_chunk_size(points.len(), chunk_size);
        deform_chunks(points, output, deformation, chunk)
    };
    diagnostics.influencer_count = deformation.influencers().len();

    log::debug!("lattice deformation pass: {}", diagnostics.summary());
    Ok(diagnostics)
}

/// Deform `points` where they are, for hosts that reuse one buffer.
///
/// Each slot is read once and overwritten with its own result, so the
/// outcome matches [`deform_points_into`].
pub fn deform_points_in_place(
    points: &mut [Point3],
    deformation: &LatticeDeformation<'_>,
    chunk_size: usize,
) -> DeformationDiagnostics {
    let mut diagnostics = if points.is_empty() {
        DeformationDiagnostics::new()
    } else {
        let chunk = effective_chunk_size(points.len(), chunk_size);
        deform_chunks_in_place(points, deformation, chunk)
    };
    diagnostics.influencer_count = deformation.influencers().len();

    log::debug!("lattice deformation pass (in place): {}", diagnostics.summary());
    diagnostics
}

fn effective_chunk_size(len: usize, chunk_size: usize) -> usize {
    if chunk_size == 0 { len } else { chunk_size.min(len) }
}

fn deform_chunk(
    input: &[Point3],
    output: &mut [Point3],
    deformation: &LatticeDeformation<'_>,
) -> DeformationDiagnostics {
    let mut diagnostics = DeformationDiagnostics {
        chunk_count: 1,
        ..DeformationDiagnostics::default()
    };
    for (slot, &point) in output.iter_mut().zip(input) {
        let outcome = deformation.deform_point(point);
        diagnostics.record(&outcome);
        *slot = outcome.position();
    }
    diagnostics
}

#[cfg(feature = "parallel")]
fn deform_chunks(
    points: &[Point3],
    output: &mut [Point3],
    deformation: &LatticeDeformation<'_>,
    chunk: usize,
) -> DeformationDiagnostics {
    output
        .par_chunks_mut(chunk)
        .zip(points.par_chunks(chunk))
        .map(|(out, input)| deform_chunk(input, out, deformation))
        .reduce(DeformationDiagnostics::default, DeformationDiagnostics::merged)
}

#[cfg(not(feature = "parallel"))]
fn deform_chunks(
    points: &[Point3],
    output: &mut [Point3],
    deformation: &LatticeDeformation<'_>,
    chunk: usize,
) -> DeformationDiagnostics {
    output
        .chunks_mut(chunk)
        .zip(points.chunks(chunk))
        .map(|(out, input)| deform_chunk(input, out, deformation))
        .fold(DeformationDiagnostics::default(), DeformationDiagnostics::merged)
}

fn deform_chunk_in_place(
    points: &mut [Point3],
    deformation: &LatticeDeformation<'_>,
) -> DeformationDiagnostics {
    let mut diagnostics = DeformationDiagnostics {
        chunk_count: 1,
        ..DeformationDiagnostics::default()
    };
    for slot in points.iter_mut() {
        let outcome = deformation.deform_point(*slot);
        diagnostics.record(&outcome);
        *slot = outcome.position();
    }
    diagnostics
}

#[cfg(feature = "parallel")]
fn deform_chunks_in_place(
    points: &mut [Point3],
    deformation: &LatticeDeformation<'_>,
    chunk: usize,
) -> DeformationDiagnostics {
    points
        .par_chunks_mut(chunk)
        .map(|slice| deform_chunk_in_place(slice, deformation))
        .reduce(DeformationDiagnostics::default, DeformationDiagnostics::merged)
}

#[cfg(not(feature = "parallel"))]
fn deform_chunks_in_place(
    points: &mut [Point3],
    deformation: &LatticeDeformation<'_>,
    chunk: usize,
) -> DeformationDiagnostics {
    points
        .chunks_mut(chunk)
        .map(|slice| deform_chunk_in_place(slice, deformation))
        .fold(DeformationDiagnostics::default(), DeformationDiagnostics::merged)
}
