//! Weekly case forecasting.
//!
//! The pipeline only sees the [`Forecaster`] trait. [`SeasonalForecaster`] is the
//! production model: an additive regression of a linear trend plus yearly and
//! weekly Fourier seasonality, fitted by ridge least squares, with an 80%
//! prediction interval around every point.

use std::f64::consts::PI;

use chrono::{Datelike, Duration, NaiveDate};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::{Result, WarningError};
use crate::models::{ForecastPoint, SeriesPoint};

const YEAR_DAYS: f64 = 365.25;
const WEEK_DAYS: f64 = 7.0;
/// Two-sided normal quantile for an 80% interval.
const Z_80: f64 = 1.281_551_565_544_600_4;
const JITTER: f64 = 1e-8;

pub trait Forecaster {
    type Model;

    fn fit(&self, series: &[SeriesPoint]) -> Result<Self::Model>;

    fn predict(&self, model: &Self::Model, timestamps: &[NaiveDate]) -> Result<Vec<ForecastPoint>>;
}

/// The `horizon` Sundays strictly after `last_observed`.
pub fn future_weeks(last_observed: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    let until_sunday = 7 - i64::from(last_observed.weekday().num_days_from_sunday());
    let first = last_observed + Duration::days(until_sunday);
    (0..horizon)
        .map(|week| first + Duration::weeks(week as i64))
        .collect()
}

#[derive(Debug, Clone)]
pub struct SeasonalForecaster {
    pub yearly_order: usize,
    pub weekly_order: usize,
    /// Ridge penalty on the seasonal coefficients.
    pub seasonality_penalty: f64,
}

impl Default for SeasonalForecaster {
    fn default() -> Self {
        Self {
            yearly_order: 10,
            weekly_order: 3,
            seasonality_penalty: 0.01,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeasonalModel {
    origin: NaiveDate,
    span_days: f64,
    scale: f64,
    /// Weekly Fourier order actually fitted; zero when every observation
    /// falls on the same weekday.
    weekly_order: usize,
    coefficients: DVector<f64>,
    covariance: DMatrix<f64>,
    sigma: f64,
}

impl SeasonalForecaster {
    fn width(&self, weekly_order: usize) -> usize {
        2 + 2 * (self.yearly_order + weekly_order)
    }

    fn features(
        &self,
        origin: NaiveDate,
        span_days: f64,
        weekly_order: usize,
        timestamp: NaiveDate,
    ) -> Vec<f64> {
        let offset = (timestamp - origin).num_days() as f64;
        let epoch_days = f64::from(timestamp.num_days_from_ce() - EPOCH_DAYS_FROM_CE);

        let mut row = Vec::with_capacity(self.width(weekly_order));
        row.push(1.0);
        row.push(offset / span_days);
        push_fourier(&mut row, epoch_days, YEAR_DAYS, self.yearly_order);
        push_fourier(&mut row, epoch_days, WEEK_DAYS, weekly_order);
        row
    }

    /// Weekly terms are only identifiable when the history spans more than
    /// one weekday; otherwise they are constant and collinear with the intercept.
    fn effective_weekly_order(&self, series: &[SeriesPoint]) -> usize {
        let first = series[0].timestamp.weekday();
        if series.iter().all(|point| point.timestamp.weekday() == first) {
            0
        } else {
            self.weekly_order
        }
    }

    fn penalties(&self, weekly_order: usize) -> DVector<f64> {
        DVector::from_fn(self.width(weekly_order), |index, _| {
            if index < 2 {
                JITTER
            } else {
                self.seasonality_penalty + JITTER
            }
        })
    }
}

/// 1970-01-01 as days from the common era.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn push_fourier(row: &mut Vec<f64>, days: f64, period: f64, order: usize) {
    for k in 1..=order {
        let angle = 2.0 * PI * k as f64 * days / period;
        row.push(angle.sin());
        row.push(angle.cos());
    }
}

impl Forecaster for SeasonalForecaster {
    type Model = SeasonalModel;

    fn fit(&self, series: &[SeriesPoint]) -> Result<SeasonalModel> {
        if series.len() < 2 {
            return Err(WarningError::model_fit(format!(
                "at least 2 observations are required, got {}",
                series.len()
            )));
        }
        if let Some(pair) = series.windows(2).find(|pair| pair[1].timestamp <= pair[0].timestamp) {
            return Err(WarningError::model_fit(format!(
                "timestamps must be strictly increasing ({} is followed by {})",
                pair[0].timestamp, pair[1].timestamp
            )));
        }
        if series.iter().any(|point| !point.value.is_finite()) {
            return Err(WarningError::model_fit("series contains non-finite values"));
        }

        let origin = series[0].timestamp;
        let span_days = (series[series.len() - 1].timestamp - origin).num_days() as f64;
        let scale = series
            .iter()
            .map(|point| point.value.abs())
            .fold(0.0_f64, f64::max);
        let scale = if scale > 0.0 { scale } else { 1.0 };

        let weekly_order = self.effective_weekly_order(series);
        let n = series.len();
        let p = self.width(weekly_order);
        let rows: Vec<Vec<f64>> = series
            .iter()
            .map(|point| self.features(origin, span_days, weekly_order, point.timestamp))
            .collect();
        let design = DMatrix::from_fn(n, p, |i, j| rows[i][j]);
        let target = DVector::from_iterator(n, series.iter().map(|point| point.value / scale));

        let normal = design.tr_mul(&design) + DMatrix::from_diagonal(&self.penalties(weekly_order));
        let cholesky = normal
            .cholesky()
            .ok_or_else(|| WarningError::model_fit("normal equations are not positive definite"))?;
        let coefficients = cholesky.solve(&design.tr_mul(&target));

        let residuals = &target - &design * &coefficients;
        let dof = n.saturating_sub(2).max(1) as f64;
        let sigma = (residuals.norm_squared() / dof).sqrt();

        debug!(
            points = n,
            parameters = p,
            weekly_order,
            sigma = sigma * scale,
            "seasonal model fitted"
        );

        Ok(SeasonalModel {
            origin,
            span_days,
            scale,
            weekly_order,
            coefficients,
            covariance: cholesky.inverse(),
            sigma,
        })
    }

    fn predict(&self, model: &SeasonalModel, timestamps: &[NaiveDate]) -> Result<Vec<ForecastPoint>> {
        if model.coefficients.len() != self.width(model.weekly_order) {
            return Err(WarningError::model_fit(
                "model was fitted with a different seasonality configuration",
            ));
        }

        let forecast = timestamps
            .iter()
            .map(|&timestamp| {
                let x = DVector::from_vec(self.features(
                    model.origin,
                    model.span_days,
                    model.weekly_order,
                    timestamp,
                ));
                let estimate = x.dot(&model.coefficients) * model.scale;
                let leverage = x.dot(&(&model.covariance * &x)).max(0.0);
                let half_width = Z_80 * model.sigma * (1.0 + leverage).sqrt() * model.scale;

                // Case counts cannot go below zero.
                ForecastPoint {
                    timestamp,
                    point_estimate: estimate.max(0.0),
                    lower_bound: (estimate - half_width).max(0.0),
                    upper_bound: (estimate + half_width).max(0.0),
                }
            })
            .collect();

        Ok(forecast)
    }
}
