//! Battery usage estimator combining power calculators.

use log::debug;
use serde::Serialize;

use crate::calculator::PowerCalculator;
use crate::consumer::{format_charge, AppBatteryConsumer, AppBatteryConsumerBuilder};
use crate::usage::UsageSample;

/// Battery usage of all estimated apps.
#[derive(Debug, PartialEq, Serialize, Clone)]
pub struct BatteryUsageStats {
    apps: Vec<AppBatteryConsumer>,
    total_consumed_power: f64,
}

impl BatteryUsageStats {
    /// Returns app consumers sorted by consumed charge in descending order.
    pub fn apps(&self) -> &[AppBatteryConsumer] {
        &self.apps
    }

    /// Returns consumer for the given uid.
    pub fn app(&self, uid: u32) -> Option<&AppBatteryConsumer> {
        self.apps.iter().find(|app| app.uid() == uid)
    }

    /// Returns charge in mAh consumed by all apps.
    pub fn total_consumed_power(&self) -> f64 {
        self.total_consumed_power
    }
}

/// Estimates battery usage of apps by invoking a set of power calculators
/// (one per device component) and combining their results.
#[derive(Clone, Default)]
pub struct BatteryUsageEstimator {
    calculators: Vec<Box<dyn PowerCalculator>>,
}

impl BatteryUsageEstimator {
    /// Creates estimator without calculators.
    pub fn new() -> Self {
        Self { calculators: Vec::new() }
    }

    /// Adds power calculator.
    pub fn add_calculator(&mut self, calculator: Box<dyn PowerCalculator>) {
        self.calculators.push(calculator);
    }

    /// Adds power calculator (builder style).
    pub fn calculator(mut self, calculator: Box<dyn PowerCalculator>) -> Self {
        self.add_calculator(calculator);
        self
    }

    /// Returns the number of registered calculators.
    pub fn calculator_count(&self) -> usize {
        self.calculators.len()
    }

    /// Estimates battery usage of a single app.
    pub fn estimate_app(&self, sample: &UsageSample) -> AppBatteryConsumer {
        let mut builder = AppBatteryConsumerBuilder::new(sample.uid);
        for calculator in &self.calculators {
            calculator.calculate_app(&mut builder, sample);
        }
        builder.build()
    }

    /// Estimates battery usage of all apps.
    ///
    /// Apps are sorted by consumed charge in descending order, apps with equal charge keep their input order.
    pub fn estimate(&self, samples: &[UsageSample]) -> BatteryUsageStats {
        let mut apps: Vec<AppBatteryConsumer> = samples.iter().map(|s| self.estimate_app(s)).collect();
        apps.sort_by(|a, b| b.total_consumed_power().total_cmp(&a.total_consumed_power()));
        let total_consumed_power: f64 = apps.iter().map(|app| app.total_consumed_power()).sum();
        debug!(
            "estimated {} apps with {} calculators, total charge {} mAh",
            apps.len(),
            self.calculators.len(),
            format_charge(total_consumed_power)
        );
        BatteryUsageStats {
            apps,
            total_consumed_power,
        }
    }
}
