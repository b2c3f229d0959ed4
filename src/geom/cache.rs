//! Influence topology caching.
//!
//! Influence regions arrive through two parallel slot arrays on the host:
//! one falloff value and one world matrix per region, addressed by sparse
//! logical indices. Resolving which slots are connected is comparatively
//! expensive and only changes when the host rewires them, so the connected
//! index list is cached until [`InfluenceTopology::mark_dirty`] is called.
//! Slot values (animated matrices in particular) are re-read on every pass.
//!
//! # Example
//! ```ignore
//! let mut ports = InfluencePorts::new();
//! ports.connect(0, 0.25, region_matrix);
//!
//! let mut topology = InfluenceTopology::default();
//! let snapshot = topology.snapshot(&ports);
//! assert_eq!(snapshot.influencers.len(), 1);
//!
//! ports.disconnect(0);
//! topology.mark_dirty();
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use super::Transform;
use super::influence::Influencer;

/// Host-side view of the influence slot arrays.
pub trait InfluenceSource {
    /// Number of populated falloff slots.
    fn falloff_count(&self) -> usize;
    /// Number of populated matrix slots.
    fn matrix_count(&self) -> usize;
    /// Logical indices of the connected regions, in host order.
    fn connected_indices(&self) -> Vec<usize>;
    fn falloff(&self, index: usize) -> Option<f64>;
    fn matrix(&self, index: usize) -> Option<Transform>;
}

/// In-memory slot arrays.
#[derive(Debug, Clone, Default)]
pub struct InfluencePorts {
    falloffs: BTreeMap<usize, f64>,
    matrices: BTreeMap<usize, Transform>,
}

impl InfluencePorts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate both slots of one region.
    pub fn connect(&mut self, index: usize, falloff: f64, matrix: Transform) {
        self.falloffs.insert(index, falloff);
        self.matrices.insert(index, matrix);
    }

    pub fn set_falloff(&mut self, index: usize, falloff: f64) {
        self.falloffs.insert(index, falloff);
    }

    pub fn set_matrix(&mut self, index: usize, matrix: Transform) {
        self.matrices.insert(index, matrix);
    }

    pub fn disconnect(&mut self, index: usize) {
        self.falloffs.remove(&index);
        self.matrices.remove(&index);
    }
}

impl InfluenceSource for InfluencePorts {
    fn falloff_count(&self) -> usize {
        self.falloffs.len()
    }

    fn matrix_count(&self) -> usize {
        self.matrices.len()
    }

    // Regions are enumerated through the falloff slots.
    fn connected_indices(&self) -> Vec<usize> {
        self.falloffs.keys().copied().collect()
    }

    fn falloff(&self, index: usize) -> Option<f64> {
        self.falloffs.get(&index).copied()
    }

    fn matrix(&self, index: usize) -> Option<Transform> {
        self.matrices.get(&index).copied()
    }
}

/// Immutable set of influencers for one pass.
#[derive(Debug, Clone, Default)]
pub struct InfluenceSnapshot {
    pub influencers: Arc<[Influencer]>,
    pub warnings: Vec<String>,
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InfluenceTopologyStats {
    /// Connected index list recomputations.
    pub rebuild_count: usize,
    /// Snapshots taken.
    pub snapshot_count: usize,
    /// Indices currently cached.
    pub cached_indices: usize,
}

/// Cached connected-index list plus dirty flag.
#[derive(Debug)]
pub struct InfluenceTopology {
    dirty: bool,
    indices: Vec<usize>,
    rebuild_count: usize,
    snapshot_count: usize,
}

impl Default for InfluenceTopology {
    fn default() -> Self {
        Self {
            dirty: true,
            indices: Vec::new(),
            rebuild_count: 0,
            snapshot_count: 0,
        }
    }
}

impl InfluenceTopology {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the next snapshot to re-resolve connected slots.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub fn stats(&self) -> InfluenceTopologyStats {
        InfluenceTopologyStats {
            rebuild_count: self.rebuild_count,
            snapshot_count: self.snapshot_count,
            cached_indices: self.indices.len(),
        }
    }

    /// Build this pass's influencers from `source`.
    ///
    /// A falloff/matrix count mismatch disables influence for the pass.
    /// Slots with a missing value or a singular matrix are skipped. Both
    /// cases are logged and reported in the snapshot warnings.
    pub fn snapshot(&mut self, source: &impl InfluenceSource) -> InfluenceSnapshot {
        self.snapshot_count += 1;

        let falloffs = source.falloff_count();
        let matrices = source.matrix_count();
        if falloffs != matrices {
            let warning = format!(
                "influence connections are inconsistent ({falloffs} falloffs, {matrices} matrices); ignoring influence regions"
            );
            log::warn!("{warning}");
            return InfluenceSnapshot {
                influencers: Arc::from(Vec::new()),
                warnings: vec![warning],
            };
        }

        if self.dirty {
            self.indices = source.connected_indices();
            self.dirty = false;
            self.rebuild_count += 1;
            log::debug!(
                "influence topology rebuilt: {} connected slots",
                self.indices.len()
            );
        }

        let mut warnings = Vec::new();
        let mut influencers = Vec::with_capacity(self.indices.len());
        for &index in &self.indices {
            let (Some(falloff), Some(matrix)) = (source.falloff(index), source.matrix(index)) else {
                let warning = format!("influence slot {index} is incomplete; skipped");
                log::warn!("{warning}");
                warnings.push(warning);
                continue;
            };
            match Influencer::from_world_matrix(matrix, falloff) {
                Some(influencer) => influencers.push(influencer),
                None => {
                    let warning = format!("influence slot {index} has a singular matrix; skipped");
                    log::warn!("{warning}");
                    warnings.push(warning);
                }
            }
        }

        InfluenceSnapshot {
            influencers: Arc::from(influencers),
            warnings,
        }
    }
}
