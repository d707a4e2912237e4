use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseRecord {
    pub region: String,
    pub week_start: NaiveDate,
    pub case_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: NaiveDate,
    pub value: f64,
}

/// Observed weekly values for one region, ascending by timestamp.
pub type Series = Vec<SeriesPoint>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub timestamp: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Indicators {
    pub recent_average: f64,
    pub forecast_average: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertLevel {
    pub fn label(self) -> &'static str {
        match self {
            AlertLevel::Low => "LOW",
            AlertLevel::Medium => "MEDIUM",
            AlertLevel::High => "HIGH",
            AlertLevel::Critical => "CRITICAL",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            AlertLevel::Low => "Routine monitoring.",
            AlertLevel::Medium => "Reinforce epidemiological surveillance.",
            AlertLevel::High => "Activate vector-control brigades.",
            AlertLevel::Critical => "Declare a health emergency and apply intensive control.",
        }
    }

    /// Banner colour used by the dashboard.
    pub fn color(self) -> &'static str {
        match self {
            AlertLevel::Low => "#2e7d32",
            AlertLevel::Medium => "#f9a825",
            AlertLevel::High => "#ef6c00",
            AlertLevel::Critical => "#c62828",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            AlertLevel::Low => "🟢",
            AlertLevel::Medium => "🟡",
            AlertLevel::High => "🟠",
            AlertLevel::Critical => "🔴",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub recommendation: &'static str,
}

/// Everything produced by one run of the pipeline for a region.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub region: String,
    pub horizon: usize,
    pub series: Series,
    pub forecast: Vec<ForecastPoint>,
    pub indicators: Indicators,
    pub alert: Alert,
}

impl Assessment {
    pub fn last_observed(&self) -> Option<NaiveDate> {
        self.series.last().map(|point| point.timestamp)
    }

    /// Forecast rows past the last observed week.
    pub fn future_points(&self) -> &[ForecastPoint] {
        let start = self.forecast.len().saturating_sub(self.horizon);
        &self.forecast[start..]
    }
}
