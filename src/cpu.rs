//! Per-core finish-time vector and idle-time accounting (spec §4.1).
//!
//! The source keeps a `CpuInfo` object and deep-copies it with
//! `copy.deepcopy` for the scheduler's dry run. Here `CpuState` is a small
//! `Clone`-able value type instead (spec §9 rearchitecture note), so the
//! dry-run snapshot is just `cpu_state.clone()`.

use crate::error::{SpotError, SpotResult};
use crate::task::{ServiceId, Time};

/// Per-core finish-time vector, idle accounting, and task placement for one
/// computational spot.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuState {
    finish: Vec<Time>,
    running: Vec<Option<ServiceId>>,
    idle_time: Time,
}

impl CpuState {
    /// Create a state for `num_cores` cores, all idle from time zero.
    pub fn new(num_cores: usize) -> Self {
        Self {
            finish: vec![0.0; num_cores],
            running: vec![None; num_cores],
            idle_time: 0.0,
        }
    }

    pub fn num_cores(&self) -> usize {
        self.finish.len()
    }

    pub fn finish_time(&self, core: usize) -> Time {
        self.finish[core]
    }

    pub fn running(&self, core: usize) -> Option<ServiceId> {
        self.running[core]
    }

    /// Number of cores currently bound to `service` (spec §4.2's "VM
    /// availability" check: `serv_count` in the source).
    pub fn count_running(&self, service: ServiceId) -> usize {
        self.running.iter().filter(|r| **r == Some(service)).count()
    }

    /// Total accumulated idle time.
    pub fn idle(&self) -> Time {
        self.idle_time
    }

    /// Credit idle time for every core that has gone idle by `now`, and pull
    /// those cores' finish times up to `now`. Idempotent: calling twice with
    /// the same `now` is a no-op the second time.
    pub fn advance(&mut self, now: Time) {
        for k in 0..self.finish.len() {
            if self.finish[k] < now {
                self.idle_time += now - self.finish[k];
                self.finish[k] = now;
                self.running[k] = None;
            }
        }
    }

    /// Returns `(k*, num_free)`: the earliest-available core (smallest index
    /// wins ties) and the count of cores free at `now`, after advancing.
    /// `(None, 0)` if even the earliest core isn't free yet.
    pub fn earliest_core(&mut self, now: Time) -> (Option<usize>, usize) {
        self.advance(now);
        let num_free = self.finish.iter().filter(|&&f| f <= now).count();
        let k_star = self
            .finish
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(k, _)| k);
        match k_star {
            Some(k) if self.finish[k] <= now => (Some(k), num_free),
            _ => (None, 0),
        }
    }

    /// Find the core currently running `service`, if any (used by the
    /// scheduler's fallback-to-existing-occupant rule, spec §4.2).
    pub fn core_running(&self, service: ServiceId) -> Option<usize> {
        self.running.iter().position(|r| *r == Some(service))
    }

    /// Among cores currently running `service`, the one that frees soonest
    /// (the dry run's fallback-to-existing-occupant target once the VM
    /// availability cap for that service is already saturated, spec §4.2).
    pub fn earliest_core_running(&self, service: ServiceId) -> Option<(usize, Time)> {
        self.running
            .iter()
            .enumerate()
            .filter(|(_, r)| **r == Some(service))
            .map(|(k, _)| (k, self.finish[k]))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Smallest finish time across all cores (the next core to free up).
    pub fn next_available_core(&self) -> usize {
        self.finish
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(k, _)| k)
            .unwrap_or(0)
    }

    /// Bind `service` to `core` until `finish_time`. Fails if the core is
    /// still busy past the requested finish time (spec §4.1, §7: logical
    /// misuse, fatal).
    pub fn assign(&mut self, core: usize, finish_time: Time, service: ServiceId) -> SpotResult<()> {
        if core >= self.finish.len() {
            return Err(SpotError::CoreOutOfRange {
                core,
                num_cores: self.finish.len(),
            });
        }
        if self.finish[core] > finish_time {
            return Err(SpotError::CoreBusy { core });
        }
        self.running[core] = Some(service);
        self.finish[core] = finish_time;
        Ok(())
    }
}
