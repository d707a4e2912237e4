//! Single-page dashboard.
//!
//! Every request for `/` reruns the full pipeline for the selected region and
//! renders metrics, the alert banner, and the chart into one self-contained page.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::alert::ALERT_TIERS;
use crate::chart;
use crate::dataset::Dataset;
use crate::error::WarningError;
use crate::forecast::SeasonalForecaster;
use crate::indicators::RECENT_WINDOW;
use crate::models::{AlertLevel, Assessment};
use crate::pipeline;

#[derive(Debug)]
pub struct DashboardState {
    pub dataset: Arc<Dataset>,
    pub forecaster: SeasonalForecaster,
    pub horizon: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub region: Option<String>,
}

pub fn router(state: Arc<DashboardState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: Arc<DashboardState>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %listener.local_addr()?, "dashboard listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn index(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Html<String>, (StatusCode, String)> {
    let regions = state.dataset.regions();
    let Some(selected) = query.region.or_else(|| regions.first().cloned()) else {
        return Ok(Html(render_page(&regions, "", &Panel::NoRegions)));
    };

    let worker_state = Arc::clone(&state);
    let region = selected.clone();
    // Fitting and chart rendering are CPU-bound; keep them off the async workers.
    let outcome = tokio::task::spawn_blocking(move || {
        pipeline::assess_region(
            &worker_state.dataset,
            &region,
            &worker_state.forecaster,
            worker_state.horizon,
        )
        .map(|assessment| {
            let chart = chart::render_svg(&assessment).map_err(|err| {
                warn!(region = %region, error = %err, "chart rendering failed");
                err.to_string()
            });
            (assessment, chart)
        })
    })
    .await
    .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let panel = match outcome {
        Ok((assessment, chart)) => Panel::Assessment {
            assessment: Box::new(assessment),
            chart,
        },
        Err(err) => {
            warn!(region = %selected, error = %err, "region could not be assessed");
            Panel::Failure(err)
        }
    };

    Ok(Html(render_page(&regions, &selected, &panel)))
}

#[derive(Debug)]
pub enum Panel {
    NoRegions,
    Failure(WarningError),
    Assessment {
        assessment: Box<Assessment>,
        chart: Result<String, String>,
    },
}

pub fn render_page(regions: &[String], selected: &str, panel: &Panel) -> String {
    let body = match panel {
        Panel::NoRegions => {
            r#"<div class="diagnostic">The dataset contains no regions.</div>"#.to_string()
        }
        Panel::Failure(err) => render_failure(selected, err),
        Panel::Assessment { assessment, chart } => render_assessment(assessment, chart),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Dengue Early Warning System</title>
    <style>{css}</style>
</head>
<body>
    <aside class="sidebar">
        <h2>⚙️ Control Panel</h2>
        {selector}
    </aside>
    <main>
        <h1>🦟 Dengue Early Warning System</h1>
        <p>Analyses historical weekly dengue cases, forecasts the coming weeks, and
        issues early epidemiological alerts per department.<br>
        <strong>Data source:</strong> Peru Ministry of Health (MINSA), weekly departmental counts.</p>
        {body}
        {help}
        <hr>
        <footer><em>Weekly departmental dengue surveillance</em></footer>
    </main>
</body>
</html>"#,
        css = inline_css(),
        selector = render_selector(regions, selected),
        body = body,
        help = render_help(),
    )
}

fn render_selector(regions: &[String], selected: &str) -> String {
    let options: String = regions
        .iter()
        .map(|region| {
            format!(
                r#"<option value="{value}"{marker}>{label}</option>"#,
                value = html_escape(region),
                marker = if region == selected { " selected" } else { "" },
                label = html_escape(region),
            )
        })
        .collect();

    format!(
        r#"<form method="get" action="/">
            <label for="region">Select the department</label>
            <select id="region" name="region" onchange="this.form.submit()">{options}</select>
            <noscript><button type="submit">Show</button></noscript>
        </form>"#
    )
}

fn render_assessment(assessment: &Assessment, chart: &Result<String, String>) -> String {
    let indicators = &assessment.indicators;
    let alert = &assessment.alert;
    let chart = match chart {
        Ok(svg) => svg.clone(),
        Err(message) => format!(
            r#"<div class="diagnostic">Chart unavailable: {}</div>"#,
            html_escape(message)
        ),
    };

    format!(
        r#"<h3>📊 Epidemiological Indicators</h3>
        <div class="metrics">
            <div class="metric"><span class="metric-label">Recent average ({window} weeks)</span><span class="metric-value">{recent:.2} cases</span></div>
            <div class="metric"><span class="metric-label">Forecast (next {horizon} weeks)</span><span class="metric-value">{forecast:.2} cases</span></div>
        </div>
        <h3>🚨 Epidemiological Alert Level</h3>
        <p><strong>Department:</strong> {region}</p>
        <div class="alert" style="border-color: {color}; background: {color}22;">
            {icon} <strong>Level {level}</strong><br><br>{recommendation}
        </div>
        <h3>📈 Weekly dengue cases and forecast</h3>
        <div class="chart">{chart}</div>"#,
        window = RECENT_WINDOW,
        recent = indicators.recent_average,
        horizon = assessment.horizon,
        forecast = indicators.forecast_average,
        region = html_escape(&assessment.region),
        color = alert.level.color(),
        icon = alert.level.icon(),
        level = alert.level,
        recommendation = alert.recommendation,
        chart = chart,
    )
}

fn render_failure(region: &str, err: &WarningError) -> String {
    let hint = match err {
        WarningError::EmptySeries { .. } => "Choose a department listed in the control panel.",
        WarningError::ModelFit(_) => {
            "The forecast needs at least two distinct weekly observations for this department."
        }
        WarningError::DataLoad { .. } => "Check the input dataset and restart the dashboard.",
    };

    format!(
        r#"<div class="diagnostic">
            <strong>Unable to assess {region}</strong><br>{message}<br><em>{hint}</em>
        </div>"#,
        region = html_escape(region),
        message = html_escape(&err.to_string()),
        hint = hint,
    )
}

fn render_help() -> String {
    let mut lower = 0.0;
    let mut tiers = String::new();
    for tier in ALERT_TIERS.iter() {
        let upper = tier.multiplier();
        tiers.push_str(&format!(
            "<li>{} <strong>{}</strong>: forecast from {lower:.1}× to below {upper:.1}× the recent average</li>",
            tier.level.icon(),
            tier.level,
        ));
        lower = upper;
    }
    tiers.push_str(&format!(
        "<li>{} <strong>{}</strong>: anything higher, or no recent cases at all</li>",
        AlertLevel::Critical.icon(),
        AlertLevel::Critical,
    ));

    format!(
        r#"<details>
            <summary>📘 How to read the chart</summary>
            <ul>
                <li><strong>Black line:</strong> reported cases.</li>
                <li><strong>Dashed blue line:</strong> model forecast.</li>
                <li><strong>Shaded area:</strong> forecast uncertainty range.</li>
                <li><strong>Dotted red line:</strong> boundary between history and forecast.</li>
            </ul>
            <p>Alert levels compare the forecast average with the recent average:</p>
            <ul>{tiers}</ul>
        </details>"#
    )
}

fn inline_css() -> &'static str {
    r#"
body { margin: 0; display: flex; font-family: -apple-system, "Segoe UI", Roboto, sans-serif; color: #262730; }
.sidebar { width: 260px; min-height: 100vh; padding: 1.5rem; background: #f0f2f6; box-sizing: border-box; }
.sidebar select { width: 100%; margin-top: 0.5rem; padding: 0.4rem; }
main { flex: 1; padding: 1.5rem 3rem; max-width: 1400px; }
.metrics { display: flex; gap: 2rem; }
.metric { display: flex; flex-direction: column; flex: 1; }
.metric-label { font-size: 0.9rem; color: #555; }
.metric-value { font-size: 2rem; }
.alert { border-left: 6px solid; padding: 1rem; border-radius: 4px; }
.diagnostic { border-left: 6px solid #c62828; background: #fdecea; padding: 1rem; border-radius: 4px; margin: 1rem 0; }
.chart svg { max-width: 100%; height: auto; }
details { margin-top: 1.5rem; }
footer { color: #777; }
"#
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::dataset;

    fn state(weeks: usize) -> Arc<DashboardState> {
        Arc::new(DashboardState {
            dataset: Arc::new(dataset("PIURA", weeks, 30)),
            forecaster: SeasonalForecaster::default(),
            horizon: 4,
        })
    }

    #[test]
    fn selector_marks_the_selected_region() {
        let regions = vec!["LORETO".to_string(), "PIURA".to_string()];
        let html = render_selector(&regions, "PIURA");
        assert!(html.contains(r#"<option value="PIURA" selected>PIURA</option>"#));
        assert!(html.contains(r#"<option value="LORETO">LORETO</option>"#));
    }

    #[test]
    fn failure_panel_explains_empty_series() {
        let err = WarningError::EmptySeries {
            region: "ATLANTIS".to_string(),
        };
        let html = render_page(&[], "ATLANTIS", &Panel::Failure(err));
        assert!(html.contains("Unable to assess ATLANTIS"));
        assert!(html.contains("no weekly case records found"));
    }

    #[test]
    fn help_lists_every_alert_level() {
        let help = render_help();
        for level in ["LOW", "MEDIUM", "HIGH", "CRITICAL"] {
            assert!(help.contains(level), "missing {level}");
        }
        assert!(help.contains("below 1.3×"));
    }

    #[test]
    fn region_names_are_escaped() {
        assert_eq!(html_escape(r#"<b>"A&B"</b>"#), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }

    #[tokio::test]
    async fn index_renders_the_selected_region() {
        let query = DashboardQuery {
            region: Some("PIURA".to_string()),
        };
        let Html(page) = index(State(state(30)), Query(query)).await.unwrap();
        assert!(page.contains(r#"<option value="PIURA" selected>"#));
        assert!(page.contains("Recent average (12 weeks)"));
        assert!(page.contains("30.00 cases"));
        assert!(page.contains("Level LOW"));
        assert!(page.contains("<svg"));
    }

    #[tokio::test]
    async fn index_defaults_to_the_first_sorted_region() {
        // "OTHER" sorts first and holds a single week, too short to fit.
        let Html(page) = index(State(state(30)), Query(DashboardQuery::default()))
            .await
            .unwrap();
        assert!(page.contains(r#"<option value="OTHER" selected>"#));
        assert!(page.contains("Unable to assess OTHER"));
    }

    #[tokio::test]
    async fn index_reports_unknown_regions_in_page() {
        let query = DashboardQuery {
            region: Some("ATLANTIS".to_string()),
        };
        let Html(page) = index(State(state(30)), Query(query)).await.unwrap();
        assert!(page.contains("Unable to assess ATLANTIS"));
        assert!(!page.contains("<svg"));
    }

    #[tokio::test]
    async fn health_is_ok() {
        assert_eq!(health().await, "ok");
    }
}
