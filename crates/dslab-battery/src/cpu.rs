//! CPU power calculator.

use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;

use crate::calculator::PowerCalculator;
use crate::config::EstimatorConfig;
use crate::consumer::{format_charge, AppBatteryConsumerBuilder, PowerComponent, UsageDuration};
use crate::power_profile::PowerProfile;
use crate::usage::UsageSample;

const MICROSEC_IN_HR: f64 = 60. * 60. * 1000. * 1000.;

/// Non-fatal problem detected in the input data during the estimation.
#[derive(Debug, PartialEq, Eq, Serialize, Clone)]
pub enum CpuAnomaly {
    /// The sample has per-cluster times for a different number of clusters than the power profile.
    /// Cluster times are ignored in this case.
    ClusterCountMismatch {
        /// Number of clusters in the power profile.
        profile_clusters: usize,
        /// Number of cluster times in the sample.
        sample_clusters: usize,
    },
    /// Foreground time is ahead of the total CPU time by more than the configured threshold.
    /// CPU time statistics were probably not gathered yet.
    ForegroundAheadOfCpuTime {
        /// Total CPU time in ms from user and system times.
        cpu_time_ms: u64,
        /// Foreground time in ms summed over the app processes.
        foreground_time_ms: u64,
    },
}

/// Result of CPU usage estimation for a single app.
#[derive(Debug, PartialEq, Serialize, Clone)]
pub struct CpuEstimate {
    consumed_power_mah: f64,
    cpu_time_ms: u64,
    foreground_time_ms: u64,
    package_with_highest_drain: Option<String>,
    anomalies: Vec<CpuAnomaly>,
}

impl CpuEstimate {
    /// Returns charge in mAh consumed by CPU.
    pub fn consumed_power_mah(&self) -> f64 {
        self.consumed_power_mah
    }

    /// Returns total CPU time in ms (never less than the foreground time).
    pub fn cpu_time_ms(&self) -> u64 {
        self.cpu_time_ms
    }

    /// Returns foreground CPU time in ms summed over all app processes.
    pub fn foreground_time_ms(&self) -> u64 {
        self.foreground_time_ms
    }

    /// Returns the name of the process with the highest CPU cost.
    pub fn package_with_highest_drain(&self) -> Option<&str> {
        self.package_with_highest_drain.as_deref()
    }

    /// Returns problems detected in the input data.
    pub fn anomalies(&self) -> &[CpuAnomaly] {
        &self.anomalies
    }
}

/// Estimates CPU battery drain from the time spent at each cluster speed step.
///
/// The consumed charge is computed as the sum of:
/// - time at each speed step multiplied by the core current at this step,
/// - CPU active time multiplied by the CPU active current,
/// - per-cluster active times multiplied by the corresponding cluster currents (if available).
///
/// The power profile is shared and never modified, so the same profile can be used by many calculators
/// and estimations running concurrently.
#[derive(Clone)]
pub struct CpuPowerCalculator {
    profile: Arc<PowerProfile>,
    config: EstimatorConfig,
}

impl CpuPowerCalculator {
    /// Creates calculator with default config.
    pub fn new(profile: Arc<PowerProfile>) -> Self {
        Self::with_config(profile, EstimatorConfig::default())
    }

    /// Creates calculator with the given config.
    pub fn with_config(profile: Arc<PowerProfile>, config: EstimatorConfig) -> Self {
        Self { profile, config }
    }

    /// Returns the used power profile.
    pub fn profile(&self) -> &PowerProfile {
        &self.profile
    }

    /// Estimates CPU usage of the app described by `sample`.
    ///
    /// Never fails: inconsistent inputs are handled by documented fallbacks and reported as anomalies.
    pub fn estimate(&self, sample: &UsageSample) -> CpuEstimate {
        let uid = sample.uid;
        let verbose = self.config.verbose;
        let mut anomalies = Vec::new();

        let mut cpu_time_ms = sample.cpu_time_ms();
        let num_clusters = self.profile.num_cpu_clusters();

        let mut cpu_power_ma_us = 0.;
        for cluster in 0..num_clusters {
            for step in 0..self.profile.num_speed_steps_in_cpu_cluster(cluster) {
                let time_us = sample.time_at_cpu_speed(cluster, step);
                let step_power = time_us as f64 * self.profile.average_power_for_cpu_core(cluster, step);
                if verbose {
                    debug!(
                        "uid {}: cpu cluster #{} step #{} time_us={} power={}",
                        uid,
                        cluster,
                        step,
                        time_us,
                        format_charge(step_power / MICROSEC_IN_HR)
                    );
                }
                cpu_power_ma_us += step_power;
            }
        }
        cpu_power_ma_us += sample.active_time_ms as f64 * 1000. * self.profile.cpu_active_power();

        if let Some(cluster_times) = sample.cpu_cluster_times() {
            if cluster_times.len() == num_clusters {
                for (cluster, time_ms) in cluster_times.iter().enumerate() {
                    let power = *time_ms as f64 * 1000. * self.profile.average_power_for_cpu_cluster(cluster);
                    if verbose {
                        debug!(
                            "uid {}: cpu cluster #{} cluster_time_ms={} power={}",
                            uid,
                            cluster,
                            time_ms,
                            format_charge(power / MICROSEC_IN_HR)
                        );
                    }
                    cpu_power_ma_us += power;
                }
            } else {
                warn!(
                    "uid {}: cpu cluster count mismatch: power profile has {}, sample has {}",
                    uid,
                    num_clusters,
                    cluster_times.len()
                );
                anomalies.push(CpuAnomaly::ClusterCountMismatch {
                    profile_clusters: num_clusters,
                    sample_clusters: cluster_times.len(),
                });
            }
        }
        let cpu_power_mah = cpu_power_ma_us / MICROSEC_IN_HR;

        if verbose && (cpu_time_ms != 0 || cpu_power_mah != 0.) {
            debug!(
                "uid {}: cpu time={} ms power={}",
                uid,
                cpu_time_ms,
                format_charge(cpu_power_mah)
            );
        }

        let (foreground_time_ms, package_with_highest_drain) = self.scan_processes(sample);

        if foreground_time_ms > cpu_time_ms {
            if foreground_time_ms - cpu_time_ms > self.config.foreground_lag_warning_ms {
                warn!(
                    "uid {}: cpu time {} ms is more than {} ms behind foreground time {} ms",
                    uid, cpu_time_ms, self.config.foreground_lag_warning_ms, foreground_time_ms
                );
                anomalies.push(CpuAnomaly::ForegroundAheadOfCpuTime {
                    cpu_time_ms,
                    foreground_time_ms,
                });
            }
            cpu_time_ms = foreground_time_ms;
        }

        CpuEstimate {
            consumed_power_mah: cpu_power_mah,
            cpu_time_ms,
            foreground_time_ms,
            package_with_highest_drain,
            anomalies,
        }
    }

    /// Returns the total foreground time in ms and the name of the process with the highest cost.
    ///
    /// The first process becomes the leader. A synthetic leader (with name starting with the configured prefix)
    /// is replaced by the next process regardless of its cost. Otherwise a process replaces the leader only if
    /// its cost is strictly greater and it is not synthetic itself.
    fn scan_processes(&self, sample: &UsageSample) -> (u64, Option<String>) {
        let prefix = self.config.synthetic_process_prefix.as_str();
        let mut foreground_time_ms: u64 = 0;
        let mut leader: Option<(&str, u64)> = None;
        for (name, usage) in sample.processes.iter() {
            foreground_time_ms = foreground_time_ms.saturating_add(usage.foreground_time_us / 1000);
            let cost = usage.cost();
            let replace = match leader {
                None => true,
                Some((leader_name, _)) if leader_name.starts_with(prefix) => true,
                Some((_, highest_cost)) => highest_cost < cost && !name.starts_with(prefix),
            };
            if replace {
                leader = Some((name.as_str(), cost));
            }
        }
        (foreground_time_ms, leader.map(|(name, _)| name.to_string()))
    }
}

impl PowerCalculator for CpuPowerCalculator {
    fn component(&self) -> PowerComponent {
        PowerComponent::Cpu
    }

    fn calculate_app(&self, app: &mut AppBatteryConsumerBuilder, sample: &UsageSample) {
        let estimate = self.estimate(sample);
        app.set_consumed_power(PowerComponent::Cpu, estimate.consumed_power_mah)
            .set_usage_duration_ms(UsageDuration::Cpu, estimate.cpu_time_ms)
            .set_usage_duration_ms(UsageDuration::CpuForeground, estimate.foreground_time_ms)
            .set_package_with_highest_drain(estimate.package_with_highest_drain);
    }
}
