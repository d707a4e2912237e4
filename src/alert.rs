use crate::models::{Alert, AlertLevel};

#[derive(Debug, Clone, Copy)]
pub struct AlertTier {
    /// Exclusive upper bound, in tenths of the recent average.
    pub upper_tenths: u32,
    pub level: AlertLevel,
}

/// Relative distance under which a forecast is treated as equal to a tier bound.
const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// Evaluated top-down; anything past the last tier is critical.
pub const ALERT_TIERS: [AlertTier; 3] = [
    AlertTier {
        upper_tenths: 11,
        level: AlertLevel::Low,
    },
    AlertTier {
        upper_tenths: 13,
        level: AlertLevel::Medium,
    },
    AlertTier {
        upper_tenths: 16,
        level: AlertLevel::High,
    },
];

impl AlertTier {
    pub fn multiplier(&self) -> f64 {
        f64::from(self.upper_tenths) / 10.0
    }

    /// `forecast < recent * multiplier`. A forecast within rounding distance
    /// of the bound counts as reaching it, so boundaries go to the next tier.
    fn admits(&self, recent_average: f64, forecast_average: f64) -> bool {
        let bound = recent_average * self.multiplier();
        bound - forecast_average > bound.abs() * BOUNDARY_TOLERANCE
    }
}

pub fn classify(recent_average: f64, forecast_average: f64) -> Alert {
    let level = ALERT_TIERS
        .iter()
        .find(|tier| tier.admits(recent_average, forecast_average))
        .map(|tier| tier.level)
        .unwrap_or(AlertLevel::Critical);

    Alert {
        level,
        recommendation: level.recommendation(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_increase_is_routine() {
        let alert = classify(100.0, 105.0);
        assert_eq!(alert.level, AlertLevel::Low);
        assert_eq!(alert.recommendation, "Routine monitoring.");
    }

    #[test]
    fn boundaries_fall_into_the_next_tier() {
        assert_eq!(classify(100.0, 110.0).level, AlertLevel::Medium);
        assert_eq!(classify(100.0, 130.0).level, AlertLevel::High);
        assert_eq!(classify(100.0, 160.0).level, AlertLevel::Critical);
        assert_eq!(classify(40.0, 44.0).level, AlertLevel::Medium);
        assert_eq!(classify(40.0, 52.0).level, AlertLevel::High);
        assert_eq!(classify(40.0, 64.0).level, AlertLevel::Critical);
    }

    #[test]
    fn values_just_below_boundaries_stay_in_tier() {
        assert_eq!(classify(100.0, 109.999).level, AlertLevel::Low);
        assert_eq!(classify(100.0, 129.999).level, AlertLevel::Medium);
        assert_eq!(classify(100.0, 159.999).level, AlertLevel::High);
    }

    #[test]
    fn boundaries_with_inexact_products_fall_into_the_next_tier() {
        assert_eq!(classify(15.91, 20.683).level, AlertLevel::High);
        assert_eq!(classify(24.05, 31.265).level, AlertLevel::High);
        assert_eq!(classify(31.82, 41.366).level, AlertLevel::High);
        assert_eq!(classify(0.3, 0.33).level, AlertLevel::Medium);
    }

    #[test]
    fn every_tier_bound_belongs_to_the_next_tier() {
        for i in 1..20_000 {
            let recent = f64::from(i) * 0.37;
            for (index, tier) in ALERT_TIERS.iter().enumerate() {
                let expected = ALERT_TIERS
                    .get(index + 1)
                    .map(|next| next.level)
                    .unwrap_or(AlertLevel::Critical);
                let forecast = recent * tier.multiplier();
                assert_eq!(
                    classify(recent, forecast).level,
                    expected,
                    "recent {recent} forecast {forecast}"
                );
            }
        }
    }

    #[test]
    fn scenario_levels() {
        assert_eq!(classify(100.0, 110.0).level, AlertLevel::Medium);
        assert_eq!(classify(100.0, 150.0).level, AlertLevel::High);
        assert_eq!(
            classify(100.0, 150.0).recommendation,
            "Activate vector-control brigades."
        );
        assert_eq!(classify(100.0, 200.0).level, AlertLevel::Critical);
    }

    #[test]
    fn zero_history_is_critical() {
        assert_eq!(classify(0.0, 0.0).level, AlertLevel::Critical);
        assert_eq!(classify(0.0, 3.0).level, AlertLevel::Critical);
    }

    #[test]
    fn decreasing_forecast_is_low() {
        assert_eq!(classify(100.0, 0.0).level, AlertLevel::Low);
    }

    #[test]
    fn levels_increase_monotonically_with_forecast() {
        let mut previous = AlertLevel::Low;
        for step in 0..=400 {
            let forecast = step as f64 * 0.5;
            let level = classify(100.0, forecast).level;
            assert!(level >= previous, "level dropped at forecast {forecast}");
            previous = level;
        }
        assert_eq!(previous, AlertLevel::Critical);
    }

    #[test]
    fn tiers_are_ordered() {
        assert!(ALERT_TIERS
            .windows(2)
            .all(|pair| pair[0].multiplier() < pair[1].multiplier()
                && pair[0].level < pair[1].level));
    }
}
