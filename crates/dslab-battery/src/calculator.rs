//! Power calculator trait.

use dyn_clone::{clone_trait_object, DynClone};

use crate::consumer::{AppBatteryConsumerBuilder, PowerComponent};
use crate::usage::UsageSample;

/// A calculator estimating the battery drain of a single device component for an app.
///
/// Calculators for different components are composed by
/// [`BatteryUsageEstimator`](crate::estimator::BatteryUsageEstimator), which invokes each of them
/// for every app and sums up the results.
pub trait PowerCalculator: DynClone {
    /// Returns the component this calculator estimates.
    fn component(&self) -> PowerComponent;

    /// Estimates component usage for the app described by `sample` and stores the results in `app`.
    fn calculate_app(&self, app: &mut AppBatteryConsumerBuilder, sample: &UsageSample);
}

clone_trait_object!(PowerCalculator);
