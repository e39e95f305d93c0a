//! Device power profile.

use serde::{Deserialize, Serialize};

/// Power characteristics of a single CPU cluster (a group of cores sharing a frequency-scaling domain).
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct CpuClusterProfile {
    /// Average current in mA drawn by the cluster while any of its cores is active.
    pub cluster_power: f64,
    /// Average current in mA drawn by a core of the cluster at each speed step.
    pub core_power: Vec<f64>,
    /// Core frequencies in kHz for each speed step.
    /// Informational only, should have the same length as `core_power` if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_speeds: Option<Vec<u64>>,
}

impl CpuClusterProfile {
    /// Creates cluster profile.
    ///
    /// * `cluster_power` - Current in mA attributed to the active cluster.
    /// * `core_power` - Current in mA of a single core at each speed step.
    pub fn new(cluster_power: f64, core_power: Vec<f64>) -> Self {
        Self {
            cluster_power,
            core_power,
            core_speeds: None,
        }
    }

    /// Attaches core frequencies in kHz for each speed step.
    pub fn with_speeds(mut self, core_speeds: Vec<u64>) -> Self {
        self.core_speeds = Some(core_speeds);
        self
    }
}

/// Holds raw power profile parsed from YAML file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
struct RawPowerProfile {
    pub cpu_active: Option<f64>,
    pub clusters: Option<Vec<CpuClusterProfile>>,
}

/// Average current draw of the device CPU in different states.
///
/// The profile is a read-only table that is fully built before any estimation and is shared between
/// all estimations (see [`CpuPowerCalculator`](crate::cpu::CpuPowerCalculator)).
/// All currents are in mA.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct PowerProfile {
    cpu_active: f64,
    clusters: Vec<CpuClusterProfile>,
}

impl PowerProfile {
    /// Creates power profile with given CPU active current and no clusters.
    pub fn new(cpu_active: f64) -> Self {
        Self {
            cpu_active,
            clusters: Vec::new(),
        }
    }

    /// Appends CPU cluster to the profile.
    pub fn cluster(mut self, cluster: CpuClusterProfile) -> Self {
        self.clusters.push(cluster);
        self
    }

    /// Parses power profile from YAML string and validates it.
    pub fn from_yaml(s: &str) -> Result<Self, String> {
        let raw: RawPowerProfile =
            serde_yaml::from_str(s).map_err(|e| format!("Can't parse power profile: {}", e))?;
        let profile = Self {
            cpu_active: raw.cpu_active.unwrap_or(0.),
            clusters: raw.clusters.unwrap_or_default(),
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Reads power profile from YAML file.
    pub fn from_file(file_name: &str) -> Result<Self, String> {
        let data = std::fs::read_to_string(file_name).map_err(|e| format!("Can't read file {}: {}", file_name, e))?;
        Self::from_yaml(&data).map_err(|e| format!("{} (file {})", e, file_name))
    }

    /// Checks that all currents are finite non-negative values and speed tables are consistent.
    pub fn validate(&self) -> Result<(), String> {
        check_current("cpu_active", self.cpu_active)?;
        for (i, cluster) in self.clusters.iter().enumerate() {
            check_current(&format!("cluster #{} power", i), cluster.cluster_power)?;
            for (step, power) in cluster.core_power.iter().enumerate() {
                check_current(&format!("cluster #{} step #{} core power", i, step), *power)?;
            }
            if let Some(speeds) = &cluster.core_speeds {
                if speeds.len() != cluster.core_power.len() {
                    return Err(format!(
                        "cluster #{} has {} core speeds but {} core power values",
                        i,
                        speeds.len(),
                        cluster.core_power.len()
                    ));
                }
            }
        }
        Ok(())
    }

    /// Returns the number of CPU clusters.
    pub fn num_cpu_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Returns the number of speed steps of the given cluster.
    pub fn num_speed_steps_in_cpu_cluster(&self, cluster: usize) -> usize {
        self.clusters[cluster].core_power.len()
    }

    /// Returns the average current of a single core of the cluster running at the given speed step.
    pub fn average_power_for_cpu_core(&self, cluster: usize, step: usize) -> f64 {
        self.clusters[cluster].core_power[step]
    }

    /// Returns the average current attributed to the active cluster itself.
    pub fn average_power_for_cpu_cluster(&self, cluster: usize) -> f64 {
        self.clusters[cluster].cluster_power
    }

    /// Returns the average current of the active CPU not attributed to any cluster or speed step.
    pub fn cpu_active_power(&self) -> f64 {
        self.cpu_active
    }

    /// Returns cluster profiles.
    pub fn clusters(&self) -> &[CpuClusterProfile] {
        &self.clusters
    }
}

fn check_current(what: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0. {
        return Err(format!("{} should be a finite non-negative current, got {}", what, value));
    }
    Ok(())
}
