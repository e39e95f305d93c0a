//! Battery consumers built from per-component estimates.

use std::collections::BTreeMap;

use serde::Serialize;

/// Device component whose power consumption is attributed to apps.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Clone, Copy)]
pub enum PowerComponent {
    /// CPU cores and clusters.
    Cpu,
    /// Network radios.
    Network,
    /// Display panel.
    Display,
}

/// Kind of usage duration tracked for an app.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Clone, Copy)]
pub enum UsageDuration {
    /// Total CPU time.
    Cpu,
    /// CPU time spent in foreground.
    CpuForeground,
}

/// Battery usage attributed to a single app (accounting unit).
#[derive(Debug, PartialEq, Serialize, Clone)]
pub struct AppBatteryConsumer {
    uid: u32,
    consumed_power: BTreeMap<PowerComponent, f64>,
    usage_durations: BTreeMap<UsageDuration, u64>,
    package_with_highest_drain: Option<String>,
}

impl AppBatteryConsumer {
    /// Returns app uid.
    pub fn uid(&self) -> u32 {
        self.uid
    }

    /// Returns charge in mAh consumed by the given component (zero if it was not estimated).
    pub fn consumed_power(&self, component: PowerComponent) -> f64 {
        self.consumed_power.get(&component).copied().unwrap_or(0.)
    }

    /// Returns charge in mAh consumed by all components.
    pub fn total_consumed_power(&self) -> f64 {
        self.consumed_power.values().sum()
    }

    /// Returns usage duration in ms of the given kind (zero if it was not estimated).
    pub fn usage_duration_ms(&self, kind: UsageDuration) -> u64 {
        self.usage_durations.get(&kind).copied().unwrap_or(0)
    }

    /// Returns the name of the app process with the highest drain, if any.
    pub fn package_with_highest_drain(&self) -> Option<&str> {
        self.package_with_highest_drain.as_deref()
    }
}

/// Collects the results of power calculators for a single app.
pub struct AppBatteryConsumerBuilder {
    uid: u32,
    consumed_power: BTreeMap<PowerComponent, f64>,
    usage_durations: BTreeMap<UsageDuration, u64>,
    package_with_highest_drain: Option<String>,
}

impl AppBatteryConsumerBuilder {
    /// Creates builder for the given app.
    pub fn new(uid: u32) -> Self {
        Self {
            uid,
            consumed_power: BTreeMap::new(),
            usage_durations: BTreeMap::new(),
            package_with_highest_drain: None,
        }
    }

    /// Returns app uid.
    pub fn uid(&self) -> u32 {
        self.uid
    }

    /// Sets charge in mAh consumed by the component.
    pub fn set_consumed_power(&mut self, component: PowerComponent, mah: f64) -> &mut Self {
        self.consumed_power.insert(component, mah);
        self
    }

    /// Sets usage duration in ms.
    pub fn set_usage_duration_ms(&mut self, kind: UsageDuration, duration_ms: u64) -> &mut Self {
        self.usage_durations.insert(kind, duration_ms);
        self
    }

    /// Sets the name of the app process with the highest drain.
    pub fn set_package_with_highest_drain(&mut self, name: Option<String>) -> &mut Self {
        self.package_with_highest_drain = name;
        self
    }

    /// Builds immutable consumer.
    pub fn build(self) -> AppBatteryConsumer {
        AppBatteryConsumer {
            uid: self.uid,
            consumed_power: self.consumed_power,
            usage_durations: self.usage_durations,
            package_with_highest_drain: self.package_with_highest_drain,
        }
    }
}

/// Formats charge in mAh with precision depending on its magnitude.
pub fn format_charge(mah: f64) -> String {
    if mah == 0. {
        return "0".to_string();
    }
    let precision = if mah < 0.00001 {
        8
    } else if mah < 0.0001 {
        7
    } else if mah < 0.001 {
        6
    } else if mah < 0.01 {
        5
    } else if mah < 0.1 {
        4
    } else if mah < 1. {
        3
    } else if mah < 10. {
        2
    } else if mah < 100. {
        1
    } else {
        0
    };
    format!("{:.*}", precision, mah)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_charge() {
        assert_eq!(format_charge(0.), "0");
        assert_eq!(format_charge(0.000001234), "0.00000123");
        assert_eq!(format_charge(0.00005), "0.0000500");
        assert_eq!(format_charge(0.0005), "0.000500");
        assert_eq!(format_charge(0.005), "0.00500");
        assert_eq!(format_charge(0.05), "0.0500");
        assert_eq!(format_charge(0.5), "0.500");
        assert_eq!(format_charge(5.), "5.00");
        assert_eq!(format_charge(12.34), "12.3");
        assert_eq!(format_charge(1234.4), "1234");
    }

    #[test]
    fn test_builder() {
        let mut builder = AppBatteryConsumerBuilder::new(7);
        builder
            .set_consumed_power(PowerComponent::Cpu, 1.5)
            .set_consumed_power(PowerComponent::Network, 0.25)
            .set_usage_duration_ms(UsageDuration::Cpu, 300)
            .set_package_with_highest_drain(Some("app".to_string()));
        let consumer = builder.build();
        assert_eq!(consumer.uid(), 7);
        assert_eq!(consumer.consumed_power(PowerComponent::Cpu), 1.5);
        assert_eq!(consumer.consumed_power(PowerComponent::Display), 0.);
        assert_eq!(consumer.total_consumed_power(), 1.75);
        assert_eq!(consumer.usage_duration_ms(UsageDuration::Cpu), 300);
        assert_eq!(consumer.usage_duration_ms(UsageDuration::CpuForeground), 0);
        assert_eq!(consumer.package_with_highest_drain(), Some("app"));
    }
}
