mod cache;
mod camera;
mod core;
mod deformation;
mod diagnostics;
mod evaluate;
mod influence;
mod metrics;
mod patch;

pub use cache::{
    InfluencePorts, InfluenceSnapshot, InfluenceSource, InfluenceTopology, InfluenceTopologyStats,
};
pub use camera::{CameraParameters, FilmGate, LatticePlacement};
pub use core::{Point3, Tolerance, Transform, Vec3};
pub use deformation::{
    Behaviour, DeformOptions, DeformationError, LatticeDeformation, PointOutcome, ProjectionFrame,
};
pub use diagnostics::DeformationDiagnostics;
pub use evaluate::{deform_points, deform_points_in_place, deform_points_into};
pub use influence::{Influencer, influence_weight};
pub use metrics::{DeformMetrics, DeformTimingReport, TimingBucket};
pub use patch::{
    BezierWindow, ControlGrid, PatchError, bernstein, bezier_point, bilinear_point, binomial,
    find_boundary_cell, identity_lattice,
};

#[cfg(test)]
mod tests;
