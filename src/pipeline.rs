use tracing::{debug, info};

use crate::alert;
use crate::dataset::{self, Dataset};
use crate::error::{Result, WarningError};
use crate::forecast::{self, Forecaster};
use crate::indicators;
use crate::models::Assessment;

/// Filter, adapt, fit, forecast, and classify one region.
pub fn assess_region<F: Forecaster>(
    dataset: &Dataset,
    region: &str,
    forecaster: &F,
    horizon: usize,
) -> Result<Assessment> {
    let records = dataset::filter_by_region(dataset.records(), region);
    let series = dataset::to_series(&records);

    let Some(last_observed) = series.last().map(|point| point.timestamp) else {
        return Err(WarningError::EmptySeries {
            region: region.to_string(),
        });
    };
    if series.len() < 2 {
        return Err(WarningError::model_fit(format!(
            "region '{region}' needs at least 2 weekly observations, found {}",
            series.len()
        )));
    }

    debug!(region, points = series.len(), "fitting forecast model");
    let model = forecaster.fit(&series)?;

    let mut timestamps: Vec<_> = series.iter().map(|point| point.timestamp).collect();
    timestamps.extend(forecast::future_weeks(last_observed, horizon));
    let forecast = forecaster.predict(&model, &timestamps)?;
    if forecast.len() != timestamps.len() {
        return Err(WarningError::model_fit(format!(
            "forecaster returned {} rows for {} timestamps",
            forecast.len(),
            timestamps.len()
        )));
    }

    let indicators = indicators::compute_indicators(&series, &forecast, horizon);
    let alert = alert::classify(indicators.recent_average, indicators.forecast_average);

    info!(
        region,
        horizon,
        recent_average = indicators.recent_average,
        forecast_average = indicators.forecast_average,
        level = %alert.level,
        "region assessed"
    );

    Ok(Assessment {
        region: region.to_string(),
        horizon,
        series,
        forecast,
        indicators,
        alert,
    })
}
