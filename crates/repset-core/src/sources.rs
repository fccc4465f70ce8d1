//! External data-source interfaces.
//!
//! These collaborators are consumed, not implemented, by the core; hosts
//! wire platform providers (wearable SDK, health store) behind them.

use chrono::{DateTime, Utc};

use crate::health::HrSample;
use crate::subscribers::SubscriptionId;

/// A stream of heart-rate samples from the platform.
///
/// Samples are assumed to arrive in non-decreasing timestamp order.
pub trait BiometricSource: Send + Sync {
    fn subscribe(&self, callback: Box<dyn Fn(HrSample) + Send>) -> SubscriptionId;
    /// Synchronous: no callback runs after this returns.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Active-energy query, polled periodically by the orchestrator.
///
/// Results are treated as monotonically non-decreasing; the orchestrator
/// ignores decreases. `None` means the backing store cannot answer.
pub trait CalorieSource: Send + Sync {
    fn active_calories(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<f64>;
}

/// Calorie source estimating a fixed burn rate. Useful for hosts without a
/// health store and for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedRateCalorieSource {
    pub calories_per_minute: f64,
}

impl CalorieSource for FixedRateCalorieSource {
    fn active_calories(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<f64> {
        let minutes = (end - start).num_seconds().max(0) as f64 / 60.0;
        Some(minutes * self.calories_per_minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn fixed_rate_scales_with_elapsed_time() {
        let source = FixedRateCalorieSource {
            calories_per_minute: 6.0,
        };
        let start = Utc::now();
        let burned = source
            .active_calories(start, start + Duration::minutes(10))
            .unwrap();
        assert!((burned - 60.0).abs() < f64::EPSILON);
    }
}
