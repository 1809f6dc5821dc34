//! Shared types used across LFG crates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Tanks consumed by one party.
pub const PARTY_TANKS: u64 = 1;
/// Healers consumed by one party.
pub const PARTY_HEALERS: u64 = 1;
/// DPS consumed by one party.
pub const PARTY_DPS: u64 = 3;

/// A role a queued player can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Tank,
    Healer,
    Dps,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Tank => "tank",
            Role::Healer => "healer",
            Role::Dps => "dps",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    /// Role names are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tank" => Ok(Role::Tank),
            "healer" => Ok(Role::Healer),
            "dps" => Ok(Role::Dps),
            _ => Err(CoreError::UnknownRole(s.to_string())),
        }
    }
}

/// Players waiting for a party, counted per role.
///
/// Players are fungible: only the counts matter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleQueue {
    pub tanks: u64,
    pub healers: u64,
    pub dps: u64,
}

impl RoleQueue {
    pub fn new(tanks: u64, healers: u64, dps: u64) -> Self {
        Self {
            tanks,
            healers,
            dps,
        }
    }

    /// Current count for one role.
    pub fn count(&self, role: Role) -> u64 {
        match role {
            Role::Tank => self.tanks,
            Role::Healer => self.healers,
            Role::Dps => self.dps,
        }
    }

    /// Add `amount` players of `role` to the queue.
    pub fn add(&mut self, role: Role, amount: u64) {
        let slot = match role {
            Role::Tank => &mut self.tanks,
            Role::Healer => &mut self.healers,
            Role::Dps => &mut self.dps,
        };
        *slot = slot.saturating_add(amount);
    }

    /// True when at least one full party (1T + 1H + 3D) is queued.
    pub fn has_party(&self) -> bool {
        self.tanks >= PARTY_TANKS && self.healers >= PARTY_HEALERS && self.dps >= PARTY_DPS
    }

    /// Number of complete parties the current counts could produce.
    pub fn parties_available(&self) -> u64 {
        (self.tanks / PARTY_TANKS)
            .min(self.healers / PARTY_HEALERS)
            .min(self.dps / PARTY_DPS)
    }

    /// Remove one party's worth of players.
    ///
    /// # Panics
    ///
    /// Panics if no full party is queued. Callers check `has_party` under
    /// the same lock first.
    pub fn take_party(&mut self) {
        assert!(
            self.has_party(),
            "take_party called on a queue without a full party: {self}"
        );
        self.tanks -= PARTY_TANKS;
        self.healers -= PARTY_HEALERS;
        self.dps -= PARTY_DPS;
    }
}

impl fmt::Display for RoleQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T, {}H, {}D", self.tanks, self.healers, self.dps)
    }
}

/// Occupancy of a single dungeon instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceState {
    Idle,
    Occupied,
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceState::Idle => f.write_str("empty"),
            InstanceState::Occupied => f.write_str("active"),
        }
    }
}

/// Point-in-time view of the shared simulation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub queue: RoleQueue,
    /// `(index, state)` for every instance, in index order.
    pub instances: Vec<(usize, InstanceState)>,
    pub active_parties: usize,
    /// Initial seeding is complete.
    pub quiescent: bool,
    /// The party former has exited; no further additions are accepted.
    pub closed: bool,
}

impl StatusSnapshot {
    pub fn occupied(&self) -> usize {
        self.instances
            .iter()
            .filter(|(_, state)| *state == InstanceState::Occupied)
            .count()
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Queue: {} ({} parties available)",
            self.queue,
            self.queue.parties_available()
        )?;
        writeln!(f, "Active parties: {}", self.active_parties)?;
        for (id, state) in &self.instances {
            writeln!(f, "Instance {id}: {state}")?;
        }
        Ok(())
    }
}

/// Lifetime statistics for one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSummary {
    pub id: usize,
    pub parties_served: u64,
    pub total_time_served_secs: u64,
}

/// Report produced once the simulation has permanently quiesced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalReport {
    pub instances: Vec<InstanceSummary>,
    pub remaining: RoleQueue,
}

impl FinalReport {
    pub fn parties_served(&self) -> u64 {
        self.instances.iter().map(|i| i.parties_served).sum()
    }

    /// Render the human-readable summary.
    pub fn render_text(&self) -> String {
        let mut out = String::from("--- Final Instance Summary ---\n");
        for instance in &self.instances {
            out.push_str(&format!(
                "Instance {}: Served {} parties. Total time active: {}s.\n",
                instance.id, instance.parties_served, instance.total_time_served_secs
            ));
        }
        out.push_str(&format!("Remaining players in queue: {}\n", self.remaining));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("TANK".parse::<Role>().unwrap(), Role::Tank);
        assert_eq!("Healer".parse::<Role>().unwrap(), Role::Healer);
        assert_eq!("dPs".parse::<Role>().unwrap(), Role::Dps);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = "mage".parse::<Role>().unwrap_err();
        assert_eq!(err, CoreError::UnknownRole("mage".to_string()));
    }

    #[test]
    fn has_party_needs_every_role() {
        assert!(RoleQueue::new(1, 1, 3).has_party());
        assert!(!RoleQueue::new(0, 1, 3).has_party());
        assert!(!RoleQueue::new(1, 0, 3).has_party());
        assert!(!RoleQueue::new(1, 1, 2).has_party());
    }

    #[test]
    fn take_party_consumes_one_party() {
        let mut queue = RoleQueue::new(2, 3, 7);
        queue.take_party();
        assert_eq!(queue, RoleQueue::new(1, 2, 4));
    }

    #[test]
    #[should_panic(expected = "without a full party")]
    fn take_party_panics_on_short_queue() {
        let mut queue = RoleQueue::new(1, 1, 2);
        queue.take_party();
    }

    #[test]
    fn parties_available_is_limited_by_scarcest_role() {
        assert_eq!(RoleQueue::new(5, 2, 30).parties_available(), 2);
        assert_eq!(RoleQueue::new(5, 5, 7).parties_available(), 2);
        assert_eq!(RoleQueue::default().parties_available(), 0);
    }

    #[test]
    fn add_targets_named_role() {
        let mut queue = RoleQueue::default();
        queue.add(Role::Dps, 3);
        queue.add(Role::Tank, 1);
        assert_eq!(queue.count(Role::Dps), 3);
        assert_eq!(queue.count(Role::Tank), 1);
        assert_eq!(queue.count(Role::Healer), 0);
    }

    #[test]
    fn report_text_lists_instances_and_remaining_queue() {
        let report = FinalReport {
            instances: vec![
                InstanceSummary {
                    id: 0,
                    parties_served: 2,
                    total_time_served_secs: 9,
                },
                InstanceSummary {
                    id: 1,
                    parties_served: 0,
                    total_time_served_secs: 0,
                },
            ],
            remaining: RoleQueue::new(1, 0, 2),
        };
        let text = report.render_text();
        assert!(text.contains("Instance 0: Served 2 parties. Total time active: 9s."));
        assert!(text.contains("Instance 1: Served 0 parties. Total time active: 0s."));
        assert!(text.contains("Remaining players in queue: 1T, 0H, 2D"));
        assert_eq!(report.parties_served(), 2);
    }

    #[test]
    fn status_display_shows_available_parties_and_instances() {
        let status = StatusSnapshot {
            queue: RoleQueue::new(3, 2, 9),
            instances: vec![(0, InstanceState::Occupied), (1, InstanceState::Idle)],
            active_parties: 1,
            quiescent: true,
            closed: false,
        };
        let text = status.to_string();
        assert!(text.contains("Queue: 3T, 2H, 9D (2 parties available)"));
        assert!(text.contains("Active parties: 1"));
        assert!(text.contains("Instance 0: active"));
        assert!(text.contains("Instance 1: empty"));
        assert_eq!(status.occupied(), 1);
    }

    #[test]
    fn report_serializes_to_json() {
        let report = FinalReport {
            instances: vec![],
            remaining: RoleQueue::new(0, 0, 1),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["remaining"]["dps"], 1);
    }
}
