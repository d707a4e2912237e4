use std::fmt::Write;

use crate::indicators::RECENT_WINDOW;
use crate::models::Assessment;

pub fn build_report(assessment: &Assessment) -> String {
    let mut output = String::new();
    let indicators = &assessment.indicators;
    let alert = &assessment.alert;

    let _ = writeln!(output, "# Dengue Early Warning Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} weekly observations{})",
        assessment.region,
        assessment.series.len(),
        assessment
            .last_observed()
            .map(|date| format!(", last week {date}"))
            .unwrap_or_default()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Epidemiological Indicators");
    let _ = writeln!(
        output,
        "- Recent average ({RECENT_WINDOW} weeks): {:.2} cases",
        indicators.recent_average
    );
    let _ = writeln!(
        output,
        "- Forecast (next {} weeks): {:.2} cases",
        assessment.horizon, indicators.forecast_average
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Alert Level");
    let _ = writeln!(output, "{} **{}**", alert.level.icon(), alert.level);
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", alert.recommendation);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Forecast");
    let future = assessment.future_points();
    if future.is_empty() {
        let _ = writeln!(output, "No forecast rows were produced.");
    } else {
        let _ = writeln!(output, "| Week | Estimate | Lower | Upper |");
        let _ = writeln!(output, "|---|---:|---:|---:|");
        for point in future {
            let _ = writeln!(
                output,
                "| {} | {:.2} | {:.2} | {:.2} |",
                point.timestamp, point.point_estimate, point.lower_bound, point.upper_bound
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Observations");
    let recent = &assessment.series[assessment.series.len().saturating_sub(RECENT_WINDOW)..];
    if recent.is_empty() {
        let _ = writeln!(output, "No observations recorded for this region.");
    } else {
        for point in recent.iter().rev() {
            let _ = writeln!(output, "- {}: {} cases", point.timestamp, point.value);
        }
    }

    output
}
