use std::sync::Arc;

use approx::assert_abs_diff_eq;

use dslab_battery::calculator::PowerCalculator;
use dslab_battery::consumer::{AppBatteryConsumerBuilder, PowerComponent, UsageDuration};
use dslab_battery::cpu::CpuPowerCalculator;
use dslab_battery::estimator::BatteryUsageEstimator;
use dslab_battery::power_profile::{CpuClusterProfile, PowerProfile};
use dslab_battery::usage::{ProcessUsage, UsageSample};

const HOUR_US: u64 = 3_600_000_000;

/// Attributes a constant charge per app for testing calculator composition.
#[derive(Clone)]
struct ConstantNetworkCalculator {
    mah: f64,
}

impl PowerCalculator for ConstantNetworkCalculator {
    fn component(&self) -> PowerComponent {
        PowerComponent::Network
    }

    fn calculate_app(&self, app: &mut AppBatteryConsumerBuilder, _sample: &UsageSample) {
        app.set_consumed_power(self.component(), self.mah);
    }
}

fn cpu_calculator() -> Box<dyn PowerCalculator> {
    let profile = PowerProfile::new(0.).cluster(CpuClusterProfile::new(0., vec![2., 4.]));
    Box::new(CpuPowerCalculator::new(Arc::new(profile)))
}

#[test]
fn test_no_calculators() {
    let estimator = BatteryUsageEstimator::new();
    let app = estimator.estimate_app(&UsageSample::new(1).time_at_speed(0, vec![HOUR_US]));
    assert_eq!(app.uid(), 1);
    assert_eq!(app.total_consumed_power(), 0.);
    assert_eq!(app.package_with_highest_drain(), None);
}

#[test]
fn test_cpu_calculator_fills_consumer() {
    let estimator = BatteryUsageEstimator::new().calculator(cpu_calculator());
    let sample = UsageSample::new(10001)
        .cpu_time_us(2_000_000, 1_000_000)
        .time_at_speed(0, vec![HOUR_US, HOUR_US])
        .process("com.example", ProcessUsage::new(2_000_000, 1_000_000, 500_000))
        .process("*wakelock*", ProcessUsage::new(0, 0, 0));
    let app = estimator.estimate_app(&sample);
    assert_abs_diff_eq!(app.consumed_power(PowerComponent::Cpu), 6.);
    assert_eq!(app.usage_duration_ms(UsageDuration::Cpu), 3000);
    assert_eq!(app.usage_duration_ms(UsageDuration::CpuForeground), 500);
    assert_eq!(app.package_with_highest_drain(), Some("com.example"));
}

#[test]
fn test_components_are_summed() {
    let mut estimator = BatteryUsageEstimator::new();
    estimator.add_calculator(cpu_calculator());
    estimator.add_calculator(Box::new(ConstantNetworkCalculator { mah: 0.5 }));
    assert_eq!(estimator.calculator_count(), 2);

    let app = estimator.estimate_app(&UsageSample::new(7).time_at_speed(0, vec![0, HOUR_US]));
    assert_abs_diff_eq!(app.consumed_power(PowerComponent::Cpu), 4.);
    assert_abs_diff_eq!(app.consumed_power(PowerComponent::Network), 0.5);
    assert_abs_diff_eq!(app.consumed_power(PowerComponent::Display), 0.);
    assert_abs_diff_eq!(app.total_consumed_power(), 4.5);
}

#[test]
fn test_apps_are_sorted_by_drain() {
    let estimator = BatteryUsageEstimator::new()
        .calculator(cpu_calculator())
        .calculator(Box::new(ConstantNetworkCalculator { mah: 1. }));
    let samples = vec![
        UsageSample::new(1).time_at_speed(0, vec![HOUR_US]),
        UsageSample::new(2).time_at_speed(0, vec![0, HOUR_US]),
        UsageSample::new(3),
        UsageSample::new(4).time_at_speed(0, vec![HOUR_US * 2]),
    ];
    let stats = estimator.estimate(&samples);
    let uids: Vec<u32> = stats.apps().iter().map(|app| app.uid()).collect();
    // uids 2 and 4 consume the same charge and keep their input order
    assert_eq!(uids, vec![2, 4, 1, 3]);
    assert_abs_diff_eq!(stats.total_consumed_power(), 3. + 5. + 5. + 1.);
    assert_abs_diff_eq!(stats.app(3).unwrap().total_consumed_power(), 1.);
    assert!(stats.app(5).is_none());
}

#[test]
fn test_cloned_estimator_gives_same_results() {
    let estimator = BatteryUsageEstimator::new()
        .calculator(cpu_calculator())
        .calculator(Box::new(ConstantNetworkCalculator { mah: 0.25 }));
    let copy = estimator.clone();
    let samples = vec![UsageSample::new(1).time_at_speed(0, vec![123_456_789, 987_654_321])];
    assert_eq!(estimator.estimate(&samples), copy.estimate(&samples));
}
