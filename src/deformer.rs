//! Host-facing camera lattice deformer.
//!
//! Bundles everything a host node evaluates on each pass: the envelope
//! cutoff, camera gate resolution, the cached influence topology, lattice
//! validation and the projection frame, before handing off to
//! [`deform_points_into`].

use crate::geom::{
    CameraParameters, ControlGrid, DeformMetrics, DeformOptions, DeformationDiagnostics,
    DeformationError, InfluenceSource, InfluenceTopology, InfluenceTopologyStats,
    LatticeDeformation, Point3, ProjectionFrame, TimingBucket, Transform, deform_points_into,
};

/// Envelopes below this skip the pass entirely.
const ENVELOPE_CUTOFF: f64 = 0.01;

/// Per-pass inputs read from the host.
#[derive(Debug, Clone, Copy)]
pub struct DeformerInputs<'a> {
    /// Local-to-world matrix of the deformed object.
    pub object_matrix: Transform,
    /// Local-to-world matrix of the reference camera.
    pub camera_matrix: Transform,
    pub camera: CameraParameters,
    /// Control lattice, `s_divisions` columns by `t_divisions` rows.
    pub lattice: &'a [Point3],
    pub s_divisions: usize,
    pub t_divisions: usize,
    pub options: DeformOptions,
}

impl<'a> DeformerInputs<'a> {
    /// Inputs with identity matrices, the default camera and default options.
    #[must_use]
    pub fn new(lattice: &'a [Point3], s_divisions: usize, t_divisions: usize) -> Self {
        Self {
            object_matrix: Transform::identity(),
            camera_matrix: Transform::identity(),
            camera: CameraParameters::default(),
            lattice,
            s_divisions,
            t_divisions,
            options: DeformOptions::default(),
        }
    }

    #[must_use]
    pub const fn object_matrix(mut self, matrix: Transform) -> Self {
        self.object_matrix = matrix;
        self
    }

    #[must_use]
    pub const fn camera_matrix(mut self, matrix: Transform) -> Self {
        self.camera_matrix = matrix;
        self
    }

    #[must_use]
    pub const fn camera(mut self, camera: CameraParameters) -> Self {
        self.camera = camera;
        self
    }

    #[must_use]
    pub const fn options(mut self, options: DeformOptions) -> Self {
        self.options = options;
        self
    }
}

/// Stateful deformer: owns the influence topology cache and timing hooks.
#[derive(Debug, Default)]
pub struct CameraLatticeDeformer {
    topology: InfluenceTopology,
    metrics: DeformMetrics,
}

impl CameraLatticeDeformer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Call whenever influence connections are added or removed.
    pub fn mark_influence_topology_dirty(&mut self) {
        self.topology.mark_dirty();
    }

    #[must_use]
    pub fn topology_stats(&self) -> InfluenceTopologyStats {
        self.topology.stats()
    }

    /// Run one pass over `points`.
    ///
    /// With an envelope below 0.01 the points are returned unchanged and the
    /// rest of the inputs are not inspected.
    ///
    /// # Errors
    /// Any configuration error: unusable camera gate, malformed lattice,
    /// singular camera or object matrix, non-finite options.
    pub fn deform(
        &mut self,
        inputs: &DeformerInputs<'_>,
        influence: &impl InfluenceSource,
        points: &[Point3],
    ) -> Result<(Vec<Point3>, DeformationDiagnostics), DeformationError> {
        let options = inputs.options;
        if options.envelope < ENVELOPE_CUTOFF {
            log::debug!(
                "envelope {} below cutoff, passing {} points through",
                options.envelope,
                points.len()
            );
            let diagnostics = DeformationDiagnostics {
                point_count: points.len(),
                unweighted_count: points.len(),
                ..DeformationDiagnostics::default()
            };
            return Ok((points.to_vec(), diagnostics));
        }

        self.metrics.begin();

        let gate = inputs.camera.film_gate()?;
        let snapshot = self
            .metrics
            .time(TimingBucket::Influence, || self.topology.snapshot(influence));
        let grid = ControlGrid::new(inputs.lattice, inputs.s_divisions, inputs.t_divisions)?;
        let frame = ProjectionFrame::from_object_and_camera(inputs.object_matrix, inputs.camera_matrix)?;
        let deformation = LatticeDeformation::new(grid, frame, gate, options, &snapshot.influencers)?;

        let mut output = vec![Point3::ORIGIN; points.len()];
        let mut diagnostics = self.metrics.time(TimingBucket::Deformation, || {
            deform_points_into(points, &mut output, &deformation, options.chunk_size)
        })?;
        for warning in snapshot.warnings {
            diagnostics.add_warning(warning);
        }
        if diagnostics.has_warnings() {
            log::warn!(
                "lattice deformation finished with {} warning(s): {}",
                diagnostics.warnings.len(),
                diagnostics.summary()
            );
        }
        diagnostics.timing = self.metrics.end();

        Ok((output, diagnostics))
    }
}
