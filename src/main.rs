use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod alert;
mod chart;
mod config;
mod dashboard;
mod dataset;
mod error;
mod forecast;
mod indicators;
mod models;
mod pipeline;
mod report;

use config::Settings;
use dataset::DatasetCache;
use forecast::SeasonalForecaster;

#[derive(Parser)]
#[command(name = "dengue-early-warning")]
#[command(about = "Weekly dengue forecasting and early warning per region", long_about = None)]
struct Cli {
    /// Weekly case-count CSV with region, date and case_count columns
    #[arg(long, global = true, env = "DENGUE_DATA", default_value = config::DEFAULT_DATA_PATH)]
    data: PathBuf,
    /// Forecast horizon in weeks
    #[arg(long, global = true, env = "DENGUE_HORIZON", default_value_t = config::DEFAULT_HORIZON)]
    horizon: usize,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the regions present in the dataset
    Regions,
    /// Forecast one region and classify its alert level
    Assess {
        #[arg(long)]
        region: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write a markdown report for one region
    Report {
        #[arg(long)]
        region: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Write the forecast chart for one region as SVG
    Chart {
        #[arg(long)]
        region: String,
        #[arg(long, default_value = "chart.svg")]
        out: PathBuf,
    },
    /// Serve the interactive dashboard
    Serve {
        #[arg(long, default_value = "127.0.0.1:8501")]
        addr: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::new(cli.data, cli.horizon)?;

    let cache = DatasetCache::new();
    let dataset = cache
        .get_or_load(&settings.data_path)
        .context("dataset could not be loaded")?;
    if dataset.is_empty() {
        warn!(path = %settings.data_path.display(), "dataset contains no records");
    }
    debug!(records = dataset.len(), horizon = settings.horizon, "settings resolved");
    let forecaster = SeasonalForecaster::default();

    match cli.command {
        Commands::Regions => {
            for region in dataset.regions() {
                println!("{region}");
            }
        }
        Commands::Assess { region, json } => {
            let assessment =
                pipeline::assess_region(&dataset, &region, &forecaster, settings.horizon)
                    .with_context(|| format!("failed to assess region {region}"))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&assessment)?);
                return Ok(());
            }

            let summary = &assessment.indicators;
            println!("Region: {}", assessment.region);
            println!(
                "Recent average ({} weeks): {:.2} cases",
                indicators::RECENT_WINDOW,
                summary.recent_average
            );
            println!(
                "Forecast (next {} weeks): {:.2} cases",
                assessment.horizon, summary.forecast_average
            );
            println!(
                "Alert level: {} {} - {}",
                assessment.alert.level.icon(),
                assessment.alert.level,
                assessment.alert.recommendation
            );
            for point in assessment.future_points() {
                println!(
                    "- {} estimate {:.2} (interval {:.2} to {:.2})",
                    point.timestamp, point.point_estimate, point.lower_bound, point.upper_bound
                );
            }
        }
        Commands::Report { region, out } => {
            let assessment =
                pipeline::assess_region(&dataset, &region, &forecaster, settings.horizon)
                    .with_context(|| format!("failed to assess region {region}"))?;
            std::fs::write(&out, report::build_report(&assessment))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Chart { region, out } => {
            let assessment =
                pipeline::assess_region(&dataset, &region, &forecaster, settings.horizon)
                    .with_context(|| format!("failed to assess region {region}"))?;
            std::fs::write(&out, chart::render_svg(&assessment)?)?;
            println!("Chart written to {}.", out.display());
        }
        Commands::Serve { addr } => {
            let state = Arc::new(dashboard::DashboardState {
                dataset,
                forecaster,
                horizon: settings.horizon,
            });
            dashboard::serve(addr, state).await?;
        }
    }

    Ok(())
}
