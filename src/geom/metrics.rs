//! Opt-in timing hooks for deformation passes.
//!
//! Timing is only collected when the `metrics` feature is enabled and the
//! target is not WASM (`std::time::Instant` is unavailable there). Otherwise
//! every call compiles down to running the closure.
//!
//! # Usage
//!
//! ```ignore
//! use camera_lattice_engine::geom::{DeformMetrics, TimingBucket};
//!
//! let mut metrics = DeformMetrics::default();
//! metrics.begin();
//!
//! let snapshot = metrics.time(TimingBucket::Influence, || topology.snapshot(&ports));
//! let result = metrics.time(TimingBucket::Deformation, || deform_points_into(...));
//!
//! if let Some(report) = metrics.end() {
//!     println!("Deformation: {} ns", report.deformation_ns);
//! }
//! ```

use serde::Serialize;

/// Phases of a deformation pass that can be timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Influence snapshot: slot lookup and matrix inversion.
    Influence,
    /// Point loop, including chunk scheduling.
    Deformation,
}

/// Cumulative nanoseconds per bucket.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DeformTimingReport {
    pub influence_ns: u64,
    pub deformation_ns: u64,
}

impl DeformTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.influence_ns.saturating_add(self.deformation_ns)
    }

    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }
}

/// Accumulator for timing a pass.
///
/// Call [`begin`](Self::begin) to reset, wrap phases with
/// [`time`](Self::time), and collect with [`end`](Self::end), which returns
/// `None` whenever metrics are compiled out.
#[derive(Debug, Default)]
pub struct DeformMetrics {
    #[cfg(all(feature = "metrics", not(target_arch = "wasm32")))]
    report: DeformTimingReport,
}

impl DeformMetrics {
    pub fn begin(&mut self) {
        #[cfg(all(feature = "metrics", not(target_arch = "wasm32")))]
        {
            self.report = DeformTimingReport::default();
        }
    }

    #[must_use]
    pub fn end(&self) -> Option<DeformTimingReport> {
        #[cfg(all(feature = "metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Runs `f`, adding its wall time to `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            // Cap at u64::MAX
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            self.add_to_bucket(bucket, nanos);
            result
        }

        #[cfg(not(all(feature = "metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }

    #[cfg(all(feature = "metrics", not(target_arch = "wasm32")))]
    fn add_to_bucket(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = match bucket {
            TimingBucket::Influence => &mut self.report.influence_ns,
            TimingBucket::Deformation => &mut self.report.deformation_ns,
        };
        *slot = slot.saturating_add(nanos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_report_total() {
        let report = DeformTimingReport {
            influence_ns: 1000,
            deformation_ns: 5000,
        };
        assert_eq!(report.total_ns(), 6000);
        assert!((report.total_ms() - 0.006).abs() < 1e-9);
    }

    #[test]
    fn test_time_returns_closure_result() {
        let mut metrics = DeformMetrics::default();
        metrics.begin();
        let result = metrics.time(TimingBucket::Deformation, || 42);
        assert_eq!(result, 42);
    }

    #[test]
    fn test_end_matches_feature() {
        let mut metrics = DeformMetrics::default();
        metrics.begin();
        metrics.time(TimingBucket::Influence, || ());
        let report = metrics.end();
        if cfg!(all(feature = "metrics", not(target_arch = "wasm32"))) {
            assert!(report.is_some());
        } else {
            assert!(report.is_none());
        }
    }
}
