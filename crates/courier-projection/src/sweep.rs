//! Completion tracking for "delete all" sweeps.
//!
//! A sweep is issued as one delete request per entity. Deletes may come
//! back in any order; a sweep completes once every id it captured has been
//! observed deleted. Entities that appear while a sweep is running are not
//! part of it.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use courier_shared::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SweepId(pub u64);

impl std::fmt::Display for SweepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sweep-{}", self.0)
    }
}

/// Returned when a sweep starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepHandle {
    pub id: SweepId,
    /// Number of deletes still outstanding. Zero means already complete.
    pub pending: usize,
}

#[derive(Debug, Clone)]
struct DeleteSweep {
    requested: usize,
    pending: HashSet<EntityId>,
}

#[derive(Debug, Clone, Default)]
pub struct SweepTracker {
    next_id: u64,
    sweeps: BTreeMap<SweepId, DeleteSweep>,
}

impl SweepTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a sweep over `ids`. An empty sweep is complete at once
    /// and is not retained.
    pub fn begin<I>(&mut self, ids: I) -> SweepHandle
    where
        I: IntoIterator<Item = EntityId>,
    {
        self.next_id += 1;
        let id = SweepId(self.next_id);
        let pending: HashSet<EntityId> = ids.into_iter().collect();
        let handle = SweepHandle {
            id,
            pending: pending.len(),
        };

        if pending.is_empty() {
            debug!(sweep = %id, "Empty delete sweep completed immediately");
            return handle;
        }

        info!(sweep = %id, requested = pending.len(), "Delete sweep started");
        self.sweeps.insert(
            id,
            DeleteSweep {
                requested: pending.len(),
                pending,
            },
        );
        handle
    }

    /// Record that `entity` was deleted. Returns the sweeps this completed.
    pub fn observe_deleted(&mut self, entity: &EntityId) -> Vec<SweepId> {
        let mut completed = Vec::new();
        for (id, sweep) in self.sweeps.iter_mut() {
            if sweep.pending.remove(entity) && sweep.pending.is_empty() {
                completed.push(*id);
            }
        }
        for id in &completed {
            if let Some(sweep) = self.sweeps.remove(id) {
                info!(sweep = %id, deleted = sweep.requested, "Delete sweep completed");
            }
        }
        completed
    }

    /// Outstanding deletes of a running sweep.
    pub fn pending(&self, id: SweepId) -> Option<usize> {
        self.sweeps.get(&id).map(|s| s.pending.len())
    }

    pub fn is_running(&self, id: SweepId) -> bool {
        self.sweeps.contains_key(&id)
    }

    pub fn active_count(&self) -> usize {
        self.sweeps.len()
    }

    /// Ids still awaited by any sweep.
    pub fn awaited(&self) -> HashSet<EntityId> {
        self.sweeps
            .values()
            .flat_map(|s| s.pending.iter().copied())
            .collect()
    }

    /// Drop every running sweep without completing it.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.sweeps.len();
        if dropped > 0 {
            info!(dropped, "Cancelled running delete sweeps");
        }
        self.sweeps.clear();
        dropped
    }
}
