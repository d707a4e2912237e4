//! Observed vs forecast chart, rendered to an SVG string with plotters.
//!
//! The SVG backend keeps rendering free of system font dependencies.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

use crate::models::Assessment;

pub const CHART_SIZE: (u32, u32) = (1300, 500);

const BAND: RGBAColor = RGBAColor(31, 119, 180, 0.25);
const FORECAST: RGBColor = RGBColor(31, 119, 180);
const MARKER: RGBColor = RGBColor(139, 0, 0);

fn day_coord(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

fn date_label(coord: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(coord.round() as i32)
        .map(|date| date.format("%Y-%m").to_string())
        .unwrap_or_default()
}

pub fn render_svg(assessment: &Assessment) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let Some(last_observed) = assessment.last_observed() else {
            root.draw(&Text::new(
                "No observations for this region",
                (CHART_SIZE.0 as i32 / 2 - 140, CHART_SIZE.1 as i32 / 2),
                ("sans-serif", 20).into_font().color(&BLACK),
            ))?;
            root.present()?;
            drop(root);
            return Ok(svg);
        };

        let x_start = day_coord(assessment.series[0].timestamp);
        let x_end = assessment
            .forecast
            .last()
            .map(|point| day_coord(point.timestamp))
            .unwrap_or_else(|| day_coord(last_observed))
            .max(x_start + 7.0);
        let y_max = assessment
            .series
            .iter()
            .map(|point| point.value)
            .chain(assessment.forecast.iter().map(|point| point.upper_bound))
            .fold(1.0_f64, f64::max)
            * 1.1;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("{} - weekly dengue cases and forecast", assessment.region),
                ("sans-serif", 20),
            )
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_start..x_end, 0.0..y_max)?;

        chart
            .configure_mesh()
            .x_labels(12)
            .x_label_formatter(&|x| date_label(*x))
            .x_desc("Year")
            .y_desc("Dengue cases")
            .draw()?;

        if !assessment.forecast.is_empty() {
            let band: Vec<(f64, f64)> = assessment
                .forecast
                .iter()
                .map(|point| (day_coord(point.timestamp), point.upper_bound))
                .chain(
                    assessment
                        .forecast
                        .iter()
                        .rev()
                        .map(|point| (day_coord(point.timestamp), point.lower_bound)),
                )
                .collect();
            chart
                .draw_series(std::iter::once(Polygon::new(band, BAND.filled())))?
                .label("Uncertainty interval")
                .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], BAND.filled()));
        }

        chart
            .draw_series(LineSeries::new(
                assessment
                    .series
                    .iter()
                    .map(|point| (day_coord(point.timestamp), point.value)),
                BLACK.stroke_width(2),
            ))?
            .label("Observed cases")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(2)));

        let forecast_line: Vec<(f64, f64)> = assessment
            .forecast
            .iter()
            .map(|point| (day_coord(point.timestamp), point.point_estimate))
            .collect();
        chart
            .draw_series(DashedLineSeries::new(
                forecast_line,
                8,
                5,
                FORECAST.stroke_width(2),
            ))?
            .label("Forecast")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], FORECAST.stroke_width(2)));

        let marker_x = day_coord(last_observed);
        chart
            .draw_series(DashedLineSeries::new(
                vec![(marker_x, 0.0), (marker_x, y_max)],
                2,
                4,
                MARKER.stroke_width(2),
            ))?
            .label("Forecast start")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], MARKER.stroke_width(2)));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
    }

    Ok(svg)
}
