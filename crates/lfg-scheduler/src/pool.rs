//! Instance pool — fixed set of dungeon instance slots.
//!
//! Slots are created once at startup and never added or removed. Each
//! slot moves Idle → Occupied on assignment and Occupied → Idle on
//! release, accumulating usage statistics as parties complete.
//!
//! The pool itself is not synchronized; it lives inside the
//! coordinator's shared state and is only touched under its lock.

use lfg_core::{InstanceState, InstanceSummary};
use tracing::debug;

/// One dungeon instance slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DungeonInstance {
    id: usize,
    state: InstanceState,
    parties_served: u64,
    total_time_served: u64,
}

impl DungeonInstance {
    fn new(id: usize) -> Self {
        Self {
            id,
            state: InstanceState::Idle,
            parties_served: 0,
            total_time_served: 0,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.state == InstanceState::Occupied
    }

    fn summary(&self) -> InstanceSummary {
        InstanceSummary {
            id: self.id,
            parties_served: self.parties_served,
            total_time_served_secs: self.total_time_served,
        }
    }
}

/// Ordered, fixed-size set of dungeon instances.
#[derive(Debug, Clone, Default)]
pub struct InstancePool {
    slots: Vec<DungeonInstance>,
}

impl InstancePool {
    /// Create a pool of `size` idle instances with ids `0..size`.
    pub fn new(size: usize) -> Self {
        Self {
            slots: (0..size).map(DungeonInstance::new).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DungeonInstance> {
        self.slots.iter()
    }

    /// Mark an idle instance as occupied by a party.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range or the instance is already
    /// occupied. Both mean the caller skipped the free-slot check under
    /// the coordinator lock.
    pub fn assign(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        assert!(
            slot.state == InstanceState::Idle,
            "instance {index} assigned while occupied"
        );
        slot.state = InstanceState::Occupied;
        debug!(instance = index, "instance occupied");
    }

    /// Return an occupied instance to idle and record the completed run.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range or the instance is idle.
    pub fn release(&mut self, index: usize, duration_secs: u64) {
        let slot = &mut self.slots[index];
        assert!(
            slot.state == InstanceState::Occupied,
            "instance {index} released while idle"
        );
        slot.state = InstanceState::Idle;
        slot.parties_served += 1;
        slot.total_time_served += duration_secs;
        debug!(instance = index, duration_secs, "instance released");
    }

    /// `(index, state)` for every slot, in index order.
    pub fn snapshot(&self) -> Vec<(usize, InstanceState)> {
        self.slots.iter().map(|s| (s.id, s.state)).collect()
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_occupied()).count()
    }

    pub fn summaries(&self) -> Vec<InstanceSummary> {
        self.slots.iter().map(DungeonInstance::summary).collect()
    }
}
