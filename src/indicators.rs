use crate::models::{ForecastPoint, Indicators, SeriesPoint};

pub const RECENT_WINDOW: usize = 12;

/// Recent average over the last observed weeks and forecast average over the
/// trailing `horizon` forecast rows (the future weeks).
pub fn compute_indicators(
    series: &[SeriesPoint],
    forecast: &[ForecastPoint],
    horizon: usize,
) -> Indicators {
    let recent = &series[series.len().saturating_sub(RECENT_WINDOW)..];
    let future = &forecast[forecast.len().saturating_sub(horizon)..];

    Indicators {
        recent_average: mean(recent.iter().map(|point| point.value)),
        forecast_average: mean(future.iter().map(|point| point.point_estimate)),
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let count = values.len();
    if count == 0 {
        0.0
    } else {
        values.sum::<f64>() / count as f64
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::*;

    fn week(index: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 7).unwrap() + Duration::weeks(index)
    }

    fn series(values: &[f64]) -> Vec<SeriesPoint> {
        values
            .iter()
            .enumerate()
            .map(|(index, &value)| SeriesPoint {
                timestamp: week(index as i64),
                value,
            })
            .collect()
    }

    fn forecast(estimates: &[f64]) -> Vec<ForecastPoint> {
        estimates
            .iter()
            .enumerate()
            .map(|(index, &estimate)| ForecastPoint {
                timestamp: week(index as i64),
                point_estimate: estimate,
                lower_bound: estimate - 1.0,
                upper_bound: estimate + 1.0,
            })
            .collect()
    }

    #[test]
    fn recent_average_uses_last_twelve_observations() {
        let mut values = vec![1000.0; 8];
        values.extend(std::iter::repeat(10.0).take(12));
        let indicators = compute_indicators(&series(&values), &forecast(&[0.0; 4]), 4);
        assert_eq!(indicators.recent_average, 10.0);
    }

    #[test]
    fn short_series_averages_everything_available() {
        let indicators = compute_indicators(&series(&[2.0, 4.0, 6.0]), &forecast(&[1.0; 4]), 4);
        assert_eq!(indicators.recent_average, 4.0);
    }

    #[test]
    fn forecast_average_uses_trailing_horizon_rows() {
        let estimates = [50.0, 50.0, 50.0, 10.0, 20.0, 30.0, 40.0];
        let indicators = compute_indicators(&series(&[1.0]), &forecast(&estimates), 4);
        assert_eq!(indicators.forecast_average, 25.0);
    }

    #[test]
    fn observed_values_drive_recent_average_not_fitted_ones() {
        let observed = series(&[10.0, 10.0]);
        let fitted = forecast(&[99.0, 99.0, 12.0]);
        let indicators = compute_indicators(&observed, &fitted, 1);
        assert_eq!(indicators.recent_average, 10.0);
        assert_eq!(indicators.forecast_average, 12.0);
    }

    #[test]
    fn empty_inputs_average_to_zero() {
        let indicators = compute_indicators(&[], &[], 4);
        assert_eq!(indicators.recent_average, 0.0);
        assert_eq!(indicators.forecast_average, 0.0);
    }
}
