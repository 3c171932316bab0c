use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use stateset_insights::{
    analytics::{ForecastRange, InsightsEngine, InsightsResponse, PatternInsights},
    config::{self, AnalyticsConfig},
    models::HistorySnapshot,
};
use tracing::debug;

/// CLI log level unless `RUST_LOG` says otherwise.
const CLI_LOG_LEVEL: &str = "warn";

fn main() -> Result<()> {
    let cli = Cli::parse();
    config::init_cli_tracing(CLI_LOG_LEVEL);
    let analytics = load_analytics_config()?;

    match cli.command {
        Commands::Report(args) => handle_report(analytics, args, cli.json),
        Commands::Patterns(args) => handle_patterns(analytics, args, cli.json),
    }
}

#[derive(Parser)]
#[command(
    name = "insights-cli",
    about = "Revenue forecasts and order patterns from a history snapshot",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full insights payload: forecast, correlations, optimization, alerts and summary
    Report(ReportArgs),
    /// Pattern-mining section only
    Patterns(InputArgs),
}

#[derive(Args)]
struct InputArgs {
    /// JSON file with `orders` and `inventory` arrays
    #[arg(long, short)]
    input: PathBuf,
}

#[derive(Args)]
struct ReportArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Forecast horizon: month, 3m or 6m
    #[arg(long, default_value = "month")]
    range: String,
    /// Evaluate as of this RFC 3339 instant instead of the current time
    #[arg(long)]
    now: Option<String>,
    /// Seed for the display jitter
    #[arg(long)]
    seed: Option<u64>,
    /// Disable display jitter
    #[arg(long, action = ArgAction::SetTrue)]
    no_jitter: bool,
}

/// Analytics settings from the usual config layers, falling back to defaults
/// when no configuration is available.
fn load_analytics_config() -> Result<AnalyticsConfig> {
    match config::load_config() {
        Ok(app) => Ok(app.analytics),
        Err(config::AppConfigError::Validation(errors)) => {
            Err(errors).context("analytics configuration is invalid")
        }
        Err(err) => {
            debug!("using default analytics configuration: {}", err);
            Ok(AnalyticsConfig::default())
        }
    }
}

fn read_snapshot(args: &InputArgs) -> Result<HistorySnapshot> {
    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to decode snapshot {}", args.input.display()))
}

fn handle_report(mut analytics: AnalyticsConfig, args: ReportArgs, json: bool) -> Result<()> {
    let range: ForecastRange = args.range.parse()?;
    let now = match args.now.as_deref() {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("invalid --now timestamp '{}'", raw))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    if args.no_jitter {
        analytics.jitter_enabled = false;
    }

    let snapshot = read_snapshot(&args.input)?;
    let engine = InsightsEngine::new(analytics);
    let response = match args.seed {
        Some(seed) => {
            engine.generate_with_rng(&snapshot, range, now, &mut StdRng::seed_from_u64(seed))
        }
        None => engine.generate(&snapshot, range, now),
    };

    if json {
        print_json(&response)
    } else {
        render_report(&response);
        Ok(())
    }
}

fn handle_patterns(analytics: AnalyticsConfig, args: InputArgs, json: bool) -> Result<()> {
    let snapshot = read_snapshot(&args)?;
    let patterns = InsightsEngine::new(analytics).patterns(&snapshot);

    if json {
        print_json(&patterns)
    } else {
        render_patterns(&patterns);
        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

fn render_report(response: &InsightsResponse) {
    println!("Forecast ({})", response.summary.range);
    for point in &response.forecast {
        println!(
            "  {:<10} actual {:>10}  predicted {:>10}",
            point.label,
            format_value(point.actual),
            format_value(point.predicted)
        );
    }
    println!("Projected total: {:.2}", response.summary.monthly_projected);

    match &response.correlations.top_combo {
        Some(combo) => println!("Top combo: {} ({} orders)", combo.pair, combo.count),
        None => println!("Top combo: none"),
    }
    println!("Peak hour: {}", response.correlations.peak_hour);
    if let Some(item) = &response.optimization.elastic_item {
        println!("Most popular: {}", item);
    }
    if let Some(bundle) = &response.optimization.bundle_candidate {
        println!("Bundle: {} with {}", bundle.item, bundle.pair_with);
    }
    if response.alerts.stock.is_empty() {
        println!("Low stock: none");
    } else {
        println!("Low stock: {}", response.alerts.stock.join(", "));
    }
}

fn render_patterns(patterns: &PatternInsights) {
    match &patterns.top_combo {
        Some(combo) => println!("Top combo: {} ({} orders)", combo.pair, combo.count),
        None => println!("Top combo: none"),
    }
    println!("Peak hour: {}", patterns.peak_hour);
    for (rank, entry) in patterns.ranking.iter().enumerate() {
        println!("  {:>2}. {} ({})", rank + 1, entry.item, entry.count);
    }
    if let Some(bundle) = &patterns.bundle_candidate {
        println!("Bundle: {} with {}", bundle.item, bundle.pair_with);
    }
}
