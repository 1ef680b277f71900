//! Per-user stats sink
//!
//! Numeric counters accumulated independently of state mutation. NPC
//! factions never appear here; the stats collaborator aggregates these
//! deltas across rooms and ticks.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::UserId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub energy_harvested: u64,
    pub energy_construction: u64,
    pub energy_repair: u64,
    pub energy_upgrade: u64,
    /// Energy drained while charging spawns
    pub energy_spawn: u64,
    pub creeps_produced: u64,
    pub creeps_lost: u64,
    pub power_processed: u64,
}

/// Accumulates per-user counters for one room-tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSink {
    pub users: AHashMap<UserId, UserStats>,
}

impl StatsSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, user: &UserId) -> &mut UserStats {
        self.users.entry(user.clone()).or_default()
    }

    pub fn energy_harvested(&mut self, user: &UserId, amount: u64) {
        self.entry(user).energy_harvested += amount;
    }

    pub fn energy_construction(&mut self, user: &UserId, amount: u64) {
        self.entry(user).energy_construction += amount;
    }

    pub fn energy_repair(&mut self, user: &UserId, amount: u64) {
        self.entry(user).energy_repair += amount;
    }

    pub fn energy_upgrade(&mut self, user: &UserId, amount: u64) {
        self.entry(user).energy_upgrade += amount;
    }

    pub fn energy_spawn(&mut self, user: &UserId, amount: u64) {
        self.entry(user).energy_spawn += amount;
    }

    pub fn creep_produced(&mut self, user: &UserId) {
        self.entry(user).creeps_produced += 1;
    }

    pub fn creep_lost(&mut self, user: &UserId) {
        self.entry(user).creeps_lost += 1;
    }

    pub fn power_processed(&mut self, user: &UserId, amount: u64) {
        self.entry(user).power_processed += amount;
    }

    /// Fold another room's delta into this one
    pub fn merge(&mut self, other: StatsSink) {
        for (user, stats) in other.users {
            let entry = self.entry(&user);
            entry.energy_harvested += stats.energy_harvested;
            entry.energy_construction += stats.energy_construction;
            entry.energy_repair += stats.energy_repair;
            entry.energy_upgrade += stats.energy_upgrade;
            entry.energy_spawn += stats.energy_spawn;
            entry.creeps_produced += stats.creeps_produced;
            entry.creeps_lost += stats.creeps_lost;
            entry.power_processed += stats.power_processed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let user = UserId::new("alice");
        let mut sink = StatsSink::new();
        sink.energy_harvested(&user, 4);
        sink.energy_harvested(&user, 6);
        sink.creep_produced(&user);
        assert_eq!(sink.users[&user].energy_harvested, 10);
        assert_eq!(sink.users[&user].creeps_produced, 1);
    }

    #[test]
    fn test_merge_sums_per_user() {
        let user = UserId::new("alice");
        let mut a = StatsSink::new();
        a.energy_upgrade(&user, 15);
        let mut b = StatsSink::new();
        b.energy_upgrade(&user, 5);
        b.creep_lost(&user);
        a.merge(b);
        assert_eq!(a.users[&user].energy_upgrade, 20);
        assert_eq!(a.users[&user].creeps_lost, 1);
    }
}
