//! Estimator configuration.

use serde::{Deserialize, Serialize};

/// Holds raw estimator config parsed from YAML file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
struct RawEstimatorConfig {
    pub verbose: Option<bool>,
    pub synthetic_process_prefix: Option<String>,
    pub foreground_lag_warning_ms: Option<u64>,
}

/// Represents estimator configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct EstimatorConfig {
    /// Whether to log a detailed breakdown of each estimation at debug level.
    pub verbose: bool,
    /// Name prefix of synthetic process entries (wakelocks, aggregates, etc),
    /// which never stay the process with the highest drain if any other process is present.
    pub synthetic_process_prefix: String,
    /// A warning is logged if the foreground time is ahead of the CPU time by more than this value in ms.
    pub foreground_lag_warning_ms: u64,
}

impl EstimatorConfig {
    /// Creates config with default values.
    pub fn new() -> Self {
        Self {
            verbose: false,
            synthetic_process_prefix: "*".to_string(),
            foreground_lag_warning_ms: 10000,
        }
    }

    /// Returns a copy of config with verbose logging turned on or off.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Parses config from YAML string (uses default values if some parameters are absent).
    pub fn from_yaml(s: &str) -> Result<Self, String> {
        let raw: RawEstimatorConfig =
            serde_yaml::from_str(s).map_err(|e| format!("Can't parse estimator config: {}", e))?;
        let default = Self::new();
        let config = Self {
            verbose: raw.verbose.unwrap_or(default.verbose),
            synthetic_process_prefix: raw
                .synthetic_process_prefix
                .unwrap_or(default.synthetic_process_prefix),
            foreground_lag_warning_ms: raw
                .foreground_lag_warning_ms
                .unwrap_or(default.foreground_lag_warning_ms),
        };
        if config.synthetic_process_prefix.is_empty() {
            return Err("synthetic_process_prefix should not be empty".to_string());
        }
        Ok(config)
    }

    /// Reads config from YAML file.
    pub fn from_file(file_name: &str) -> Result<Self, String> {
        let data = std::fs::read_to_string(file_name).map_err(|e| format!("Can't read file {}: {}", file_name, e))?;
        Self::from_yaml(&data).map_err(|e| format!("{} (file {})", e, file_name))
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EstimatorConfig::from_yaml("{}").unwrap();
        assert_eq!(config, EstimatorConfig::default());
        assert!(!config.verbose);
        assert_eq!(config.synthetic_process_prefix, "*");
        assert_eq!(config.foreground_lag_warning_ms, 10000);
    }

    #[test]
    fn test_overrides() {
        let config = EstimatorConfig::from_yaml(
            "verbose: true\nsynthetic_process_prefix: '#'\nforeground_lag_warning_ms: 500",
        )
        .unwrap();
        assert!(config.verbose);
        assert_eq!(config.synthetic_process_prefix, "#");
        assert_eq!(config.foreground_lag_warning_ms, 500);
    }

    #[test]
    fn test_empty_prefix_is_rejected() {
        assert!(EstimatorConfig::from_yaml("synthetic_process_prefix: ''").is_err());
        assert!(EstimatorConfig::from_yaml("verbose: maybe").is_err());
    }

    #[test]
    fn test_max_lag_threshold() {
        let config = EstimatorConfig::from_yaml("foreground_lag_warning_ms: 18446744073709551615").unwrap();
        assert_eq!(config.foreground_lag_warning_ms, u64::MAX);
    }
}
