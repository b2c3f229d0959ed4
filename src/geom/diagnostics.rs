//! Per-pass diagnostics for lattice deformation.
//!
//! Every deformation pass reports how many points took each path through the
//! kernel, how the work was split, and any recoverable problems found in the
//! influence data. Diagnostics from independent chunks are summed with
//! [`DeformationDiagnostics::merge`].
//!
//! # Example
//!
//! ```ignore
//! use camera_lattice_engine::geom::deform_points;
//!
//! let (points, diagnostics) = deform_points(&input, &[], grid, &frame, gate, &options)?;
//!
//! if diagnostics.outside_gate_count > 0 {
//!     println!("{} points missed the gate", diagnostics.outside_gate_count);
//! }
//! for warning in &diagnostics.warnings {
//!     eprintln!("Warning: {}", warning);
//! }
//! ```

use std::fmt;

use serde::Serialize;

use super::DeformTimingReport;
use super::deformation::PointOutcome;

/// Counters and warnings collected during one deformation pass.
///
/// The three outcome counters always add up to `point_count`.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DeformationDiagnostics {
    /// Points processed.
    pub point_count: usize,
    /// Points moved toward the lattice.
    pub deformed_count: usize,
    /// Points skipped because their weight was negligible.
    pub unweighted_count: usize,
    /// Points that projected outside the gate band.
    pub outside_gate_count: usize,
    /// Work chunks the pass was split into.
    pub chunk_count: usize,
    /// Influence regions active during the pass.
    pub influencer_count: usize,
    /// Timing breakdown, present only when metrics are enabled.
    pub timing: Option<DeformTimingReport>,
    /// Recoverable problems, mostly degenerate influence data.
    pub warnings: Vec<String>,
}

impl DeformationDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one kernel outcome.
    pub fn record(&mut self, outcome: &PointOutcome) {
        self.point_count += 1;
        match outcome {
            PointOutcome::Deformed(_) => self.deformed_count += 1,
            PointOutcome::Unweighted(_) => self.unweighted_count += 1,
            PointOutcome::OutsideGate(_) => self.outside_gate_count += 1,
        }
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Sums the counters of `other` into this one and appends its warnings.
    ///
    /// `influencer_count` is a property of the pass, not of a chunk, so the
    /// larger of the two is kept. `timing` from `other` is ignored.
    pub fn merge(&mut self, other: &DeformationDiagnostics) {
        self.point_count += other.point_count;
        self.deformed_count += other.deformed_count;
        self.unweighted_count += other.unweighted_count;
        self.outside_gate_count += other.outside_gate_count;
        self.chunk_count += other.chunk_count;
        self.influencer_count = self.influencer_count.max(other.influencer_count);
        self.warnings.extend(other.warnings.iter().cloned());
    }

    /// Owned variant of [`merge`](Self::merge), for reductions.
    #[must_use]
    pub fn merged(mut self, other: DeformationDiagnostics) -> Self {
        self.merge(&other);
        self
    }

    /// Short summary for log lines.
    ///
    /// Format: `"P:{points} D:{deformed} [skips...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("P:{} D:{}", self.point_count, self.deformed_count)];
        if self.unweighted_count > 0 {
            parts.push(format!("unweighted:{}", self.unweighted_count));
        }
        if self.outside_gate_count > 0 {
            parts.push(format!("outside:{}", self.outside_gate_count));
        }
        if self.influencer_count > 0 {
            parts.push(format!("influencers:{}", self.influencer_count));
        }
        parts.push(format!("chunks:{}", self.chunk_count));
        parts.join(" ")
    }
}

impl fmt::Display for DeformationDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Deformation Diagnostics:")?;
        writeln!(f, "  Points: {}", self.point_count)?;
        writeln!(f, "  Deformed: {}", self.deformed_count)?;

        if self.unweighted_count > 0 || self.outside_gate_count > 0 {
            writeln!(f, "  Skipped:")?;
            if self.unweighted_count > 0 {
                writeln!(f, "    - Below weight threshold: {}", self.unweighted_count)?;
            }
            if self.outside_gate_count > 0 {
                writeln!(f, "    - Outside gate: {}", self.outside_gate_count)?;
            }
        }

        writeln!(f, "  Chunks: {}", self.chunk_count)?;
        if self.influencer_count > 0 {
            writeln!(f, "  Influencers: {}", self.influencer_count)?;
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {}", warning)?;
            }
        }

        if let Some(ref timing) = self.timing {
            writeln!(f, "  Timing: {} ms total", timing.total_ms())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point3;

    #[test]
    fn test_add_warning() {
        let mut diag = DeformationDiagnostics::default();
        assert!(!diag.has_warnings());
        diag.add_warning("influence slot 2 is singular");
        diag.add_warning(String::from("influence slot 5 has no falloff"));
        assert!(diag.has_warnings());
        assert_eq!(diag.warnings.len(), 2);
        assert!(diag.to_string().contains("slot 5"));
    }

    #[test]
    fn test_record_counts_each_outcome() {
        let mut diag = DeformationDiagnostics::new();
        diag.record(&PointOutcome::Deformed(Point3::ORIGIN));
        diag.record(&PointOutcome::Deformed(Point3::ORIGIN));
        diag.record(&PointOutcome::Unweighted(Point3::ORIGIN));
        diag.record(&PointOutcome::OutsideGate(Point3::ORIGIN));

        assert_eq!(diag.point_count, 4);
        assert_eq!(diag.deformed_count, 2);
        assert_eq!(diag.unweighted_count, 1);
        assert_eq!(diag.outside_gate_count, 1);
        assert!(!diag.has_warnings());
    }

    #[test]
    fn test_merge() {
        let mut a = DeformationDiagnostics {
            point_count: 10,
            deformed_count: 8,
            outside_gate_count: 2,
            chunk_count: 1,
            influencer_count: 2,
            warnings: vec!["first".to_string()],
            ..Default::default()
        };
        let b = DeformationDiagnostics {
            point_count: 5,
            deformed_count: 4,
            unweighted_count: 1,
            chunk_count: 1,
            influencer_count: 2,
            warnings: vec!["second".to_string()],
            ..Default::default()
        };

        a.merge(&b);
        assert_eq!(a.point_count, 15);
        assert_eq!(a.deformed_count, 12);
        assert_eq!(a.unweighted_count, 1);
        assert_eq!(a.outside_gate_count, 2);
        assert_eq!(a.chunk_count, 2);
        assert_eq!(a.influencer_count, 2);
        assert_eq!(a.warnings, vec!["first", "second"]);
    }

    #[test]
    fn test_summary_and_display() {
        let diag = DeformationDiagnostics {
            point_count: 100,
            deformed_count: 90,
            outside_gate_count: 10,
            chunk_count: 4,
            warnings: vec!["influence slot 3 has no matrix".to_string()],
            ..Default::default()
        };

        let summary = diag.summary();
        assert!(summary.contains("P:100"));
        assert!(summary.contains("D:90"));
        assert!(summary.contains("outside:10"));
        assert!(!summary.contains("unweighted"));

        let output = format!("{}", diag);
        assert!(output.contains("Outside gate: 10"));
        assert!(output.contains("Chunks: 4"));
        assert!(output.contains("slot 3"));
    }
}
