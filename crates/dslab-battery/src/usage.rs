//! CPU usage counters of an accounting unit.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// CPU time consumed by a single process of an app during the accounting window.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Copy, Default)]
pub struct ProcessUsage {
    /// CPU time in user mode in µs.
    #[serde(default)]
    pub user_time_us: u64,
    /// CPU time in kernel mode in µs.
    #[serde(default)]
    pub system_time_us: u64,
    /// Time spent in foreground in µs.
    #[serde(default)]
    pub foreground_time_us: u64,
}

impl ProcessUsage {
    /// Creates process usage record.
    pub fn new(user_time_us: u64, system_time_us: u64, foreground_time_us: u64) -> Self {
        Self {
            user_time_us,
            system_time_us,
            foreground_time_us,
        }
    }

    /// Cost of the process used to find the process with the highest drain (saturates at `u64::MAX`).
    pub fn cost(&self) -> u64 {
        self.user_time_us
            .saturating_add(self.system_time_us)
            .saturating_add(self.foreground_time_us)
    }
}

/// Usage counters of a single accounting unit (app identified by `uid`) collected over an accounting window.
///
/// Processes are kept in the order they were added (or listed in the source document),
/// which matters when looking for the process with the highest drain.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct UsageSample {
    /// Accounting unit identifier.
    pub uid: u32,
    /// CPU time in user mode in µs.
    #[serde(default)]
    pub user_time_us: u64,
    /// CPU time in kernel mode in µs.
    #[serde(default)]
    pub system_time_us: u64,
    /// Time in µs spent at each speed step, indexed by cluster and then by step.
    #[serde(default)]
    pub time_at_speed_us: Vec<Vec<u64>>,
    /// Time in ms the cluster was active, one entry per cluster.
    /// Missing or empty when the collector does not track cluster times.
    #[serde(default)]
    pub cluster_times_ms: Option<Vec<u64>>,
    /// CPU active time in ms that is not broken into cluster/step buckets.
    #[serde(default)]
    pub active_time_ms: u64,
    /// Per-process usage keyed by process name.
    #[serde(default)]
    pub processes: IndexMap<String, ProcessUsage>,
}

impl UsageSample {
    /// Creates empty usage sample for the given uid.
    pub fn new(uid: u32) -> Self {
        Self {
            uid,
            ..Default::default()
        }
    }

    /// Sets user and system CPU time in µs.
    pub fn cpu_time_us(mut self, user_time_us: u64, system_time_us: u64) -> Self {
        self.user_time_us = user_time_us;
        self.system_time_us = system_time_us;
        self
    }

    /// Sets time in µs spent at each speed step of the given cluster.
    pub fn time_at_speed(mut self, cluster: usize, times_us: Vec<u64>) -> Self {
        if self.time_at_speed_us.len() <= cluster {
            self.time_at_speed_us.resize(cluster + 1, Vec::new());
        }
        self.time_at_speed_us[cluster] = times_us;
        self
    }

    /// Sets per-cluster active times in ms.
    pub fn cluster_times(mut self, times_ms: Vec<u64>) -> Self {
        self.cluster_times_ms = Some(times_ms);
        self
    }

    /// Sets CPU active time in ms.
    pub fn active_time(mut self, active_time_ms: u64) -> Self {
        self.active_time_ms = active_time_ms;
        self
    }

    /// Adds process usage record (replaces the record with the same name keeping its position).
    pub fn process<S: Into<String>>(mut self, name: S, usage: ProcessUsage) -> Self {
        self.processes.insert(name.into(), usage);
        self
    }

    /// Returns time in µs spent at the given cluster speed step, or 0 if the sample has no such counter.
    pub fn time_at_cpu_speed(&self, cluster: usize, step: usize) -> u64 {
        self.time_at_speed_us
            .get(cluster)
            .and_then(|steps| steps.get(step))
            .copied()
            .unwrap_or(0)
    }

    /// Returns per-cluster active times, or `None` if they are not available.
    pub fn cpu_cluster_times(&self) -> Option<&[u64]> {
        match &self.cluster_times_ms {
            Some(times) if !times.is_empty() => Some(times),
            _ => None,
        }
    }

    /// Returns total (user + system) CPU time in ms.
    pub fn cpu_time_ms(&self) -> u64 {
        self.user_time_us.saturating_add(self.system_time_us) / 1000
    }
}
