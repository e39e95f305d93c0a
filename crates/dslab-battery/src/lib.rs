#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod calculator;
pub mod config;
pub mod consumer;
pub mod cpu;
pub mod estimator;
pub mod power_profile;
pub mod usage;

pub use calculator::PowerCalculator;
pub use config::EstimatorConfig;
pub use consumer::{format_charge, AppBatteryConsumer, PowerComponent, UsageDuration};
pub use cpu::{CpuAnomaly, CpuEstimate, CpuPowerCalculator};
pub use estimator::{BatteryUsageEstimator, BatteryUsageStats};
pub use power_profile::{CpuClusterProfile, PowerProfile};
pub use usage::{ProcessUsage, UsageSample};
