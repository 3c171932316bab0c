use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, Subscriber};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer,
};
use validator::{Validate, ValidationError};

use crate::analytics::calendar::DayBoundary;
use crate::analytics::trend::GROWTH_LIMIT;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const DEFAULT_LOW_STOCK_THRESHOLD: f64 = 10.0;
const DEFAULT_MAX_STOCK_ALERTS: usize = 3;
const DEFAULT_WEEKDAY_PLACEHOLDER_REVENUE: f64 = 100.0;
const DEFAULT_GROWTH: f64 = 0.05;
const DEFAULT_MOMENTUM_FALLBACK: f64 = 0.10;
const DEFAULT_TREND_WINDOW: usize = 6;
const DEFAULT_MIN_TREND_PERIODS: usize = 3;
const DEFAULT_MOMENTUM_WINDOW_DAYS: u32 = 30;
const DEFAULT_THREE_MONTH_JITTER: f64 = 0.05;
const DEFAULT_SIX_MONTH_JITTER: f64 = 0.02;
const MAX_JITTER_BAND: f64 = 0.5;
const MAX_DAY_BOUNDARY_OFFSET_MINUTES: i32 = 14 * 60;

/// Tunables of the forecasting and pattern-mining engine
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Inventory lines with a quantity strictly below this value raise a stock alert
    #[serde(default = "default_low_stock_threshold")]
    #[validate(custom = "validate_low_stock_threshold")]
    pub low_stock_threshold: f64,

    /// Maximum number of stock alerts reported
    #[serde(default = "default_max_stock_alerts")]
    #[validate(range(min = 1))]
    pub max_stock_alerts: usize,

    /// Average daily revenue assumed for a weekday with no history
    #[serde(default = "default_weekday_placeholder_revenue")]
    #[validate(custom = "validate_weekday_placeholder")]
    pub weekday_placeholder_revenue: f64,

    /// Per-period growth assumed when history is too sparse to measure a trend
    #[serde(default = "default_growth")]
    #[validate(custom = "validate_growth_bound")]
    pub default_growth: f64,

    /// Momentum used when the previous window had no revenue but the last one did
    #[serde(default = "default_momentum_fallback")]
    #[validate(custom = "validate_growth_bound")]
    pub momentum_fallback: f64,

    /// Number of most recent periods the trend estimator looks at
    #[serde(default = "default_trend_window")]
    #[validate(range(min = 2))]
    pub trend_window: usize,

    /// Fewer periods than this and the trend estimator falls back to the run rate
    #[serde(default = "default_min_trend_periods")]
    #[validate(range(min = 2))]
    pub min_trend_periods: usize,

    /// Length in days of each of the two momentum windows
    #[serde(default = "default_momentum_window_days")]
    #[validate(range(min = 1, max = 366))]
    pub momentum_window_days: u32,

    /// Display jitter band of the 3-month forecast (0.05 = ±5%)
    #[serde(default = "default_three_month_jitter")]
    #[validate(custom = "validate_jitter_band")]
    pub three_month_jitter: f64,

    /// Display jitter band of the 6-month forecast
    #[serde(default = "default_six_month_jitter")]
    #[validate(custom = "validate_jitter_band")]
    pub six_month_jitter: f64,

    /// Whether multi-period forecasts get display jitter at all
    #[serde(default = "default_true_bool")]
    pub jitter_enabled: bool,

    /// Offset from UTC, in minutes, of the timezone that defines a calendar day
    #[serde(default)]
    #[validate(custom = "validate_day_boundary_offset")]
    pub day_boundary_offset_minutes: i32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: default_low_stock_threshold(),
            max_stock_alerts: default_max_stock_alerts(),
            weekday_placeholder_revenue: default_weekday_placeholder_revenue(),
            default_growth: default_growth(),
            momentum_fallback: default_momentum_fallback(),
            trend_window: default_trend_window(),
            min_trend_periods: default_min_trend_periods(),
            momentum_window_days: default_momentum_window_days(),
            three_month_jitter: default_three_month_jitter(),
            six_month_jitter: default_six_month_jitter(),
            jitter_enabled: default_true_bool(),
            day_boundary_offset_minutes: 0,
        }
    }
}

impl AnalyticsConfig {
    /// Defaults with display jitter switched off, for reproducible output
    pub fn deterministic() -> Self {
        Self {
            jitter_enabled: false,
            ..Self::default()
        }
    }

    /// The day boundary policy described by `day_boundary_offset_minutes`.
    /// Falls back to UTC for an out-of-range offset.
    pub fn day_boundary(&self) -> DayBoundary {
        DayBoundary::from_offset_minutes(self.day_boundary_offset_minutes).unwrap_or_default()
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// JSON file holding the order/inventory snapshot served by the history provider
    #[serde(default)]
    pub snapshot_path: Option<String>,

    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,

    /// Forecasting engine tunables
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

impl AppConfig {
    /// Creates a new configuration
    pub fn new(host: String, port: u16, environment: String) -> Self {
        Self {
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            snapshot_path: None,
            request_timeout_secs: default_request_timeout_secs(),
            analytics: AnalyticsConfig::default(),
        }
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    /// Validates the application settings and the nested analytics tunables
    pub fn validate_all(&self) -> Result<(), AppConfigError> {
        self.validate()?;
        self.analytics.validate()?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_true_bool() -> bool {
    true
}

fn default_low_stock_threshold() -> f64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

fn default_max_stock_alerts() -> usize {
    DEFAULT_MAX_STOCK_ALERTS
}

fn default_weekday_placeholder_revenue() -> f64 {
    DEFAULT_WEEKDAY_PLACEHOLDER_REVENUE
}

fn default_growth() -> f64 {
    DEFAULT_GROWTH
}

fn default_momentum_fallback() -> f64 {
    DEFAULT_MOMENTUM_FALLBACK
}

fn default_trend_window() -> usize {
    DEFAULT_TREND_WINDOW
}

fn default_min_trend_periods() -> usize {
    DEFAULT_MIN_TREND_PERIODS
}

fn default_momentum_window_days() -> u32 {
    DEFAULT_MOMENTUM_WINDOW_DAYS
}

fn default_three_month_jitter() -> f64 {
    DEFAULT_THREE_MONTH_JITTER
}

fn default_six_month_jitter() -> f64 {
    DEFAULT_SIX_MONTH_JITTER
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_low_stock_threshold(threshold: f64) -> Result<(), ValidationError> {
    if !threshold.is_finite() || threshold < 0.0 {
        let mut err = ValidationError::new("low_stock_threshold");
        err.message = Some("low_stock_threshold must be a finite, non-negative value".into());
        return Err(err);
    }
    Ok(())
}

fn validate_weekday_placeholder(revenue: f64) -> Result<(), ValidationError> {
    if !revenue.is_finite() || revenue <= 0.0 {
        let mut err = ValidationError::new("weekday_placeholder_revenue");
        err.message =
            Some("weekday_placeholder_revenue must be a finite value greater than 0".into());
        return Err(err);
    }
    Ok(())
}

fn validate_growth_bound(growth: f64) -> Result<(), ValidationError> {
    if !growth.is_finite() || growth.abs() > GROWTH_LIMIT {
        let mut err = ValidationError::new("growth_bound");
        err.message = Some("growth values must lie between -0.15 and 0.15".into());
        return Err(err);
    }
    Ok(())
}

fn validate_jitter_band(band: f64) -> Result<(), ValidationError> {
    if !band.is_finite() || band < 0.0 || band > MAX_JITTER_BAND {
        let mut err = ValidationError::new("jitter_band");
        err.message = Some("jitter bands must lie between 0.0 and 0.5".into());
        return Err(err);
    }
    Ok(())
}

fn validate_day_boundary_offset(minutes: i32) -> Result<(), ValidationError> {
    if minutes.abs() > MAX_DAY_BOUNDARY_OFFSET_MINUTES {
        let mut err = ValidationError::new("day_boundary_offset_minutes");
        err.message = Some("day_boundary_offset_minutes must lie within ±14 hours".into());
        return Err(err);
    }
    Ok(())
}

/// Where formatted log lines are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    /// Keeps stdout free for command output.
    Stderr,
}

/// Installs the global subscriber for the HTTP service: stdout logs, plus
/// OTLP export when `OTEL_EXPORTER_OTLP_ENDPOINT` or `APP__OTEL_ENABLED` is set.
pub fn init_tracing(level: &str, json: bool) {
    install_subscriber(level, json, LogTarget::Stdout, otel_endpoint());
}

/// Installs a stderr-only subscriber for command line tools. No OTLP export.
pub fn init_cli_tracing(level: &str) {
    install_subscriber(level, false, LogTarget::Stderr, None);
}

/// `RUST_LOG` when set, otherwise `level` for this crate and debug for tower-http.
fn log_filter(level: &str) -> String {
    env::var("RUST_LOG")
        .ok()
        .filter(|directive| !directive.trim().is_empty())
        .unwrap_or_else(|| format!("stateset_insights={},tower_http=debug", level))
}

fn otel_endpoint() -> Option<String> {
    let endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();
    let forced = env::var("APP__OTEL_ENABLED")
        .map(|flag| flag == "1" || flag.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    match endpoint {
        Some(endpoint) => Some(endpoint),
        None if forced => Some("http://localhost:4317".to_string()),
        None => None,
    }
}

fn otlp_tracer(
    endpoint: String,
) -> Result<opentelemetry_sdk::trace::Tracer, opentelemetry::trace::TraceError> {
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    let service_name =
        env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "stateset-insights".to_string());
    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .with_trace_config(
            sdktrace::config()
                .with_resource(Resource::new(vec![KeyValue::new("service.name", service_name)])),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)
}

fn fmt_layer<S>(json: bool, target: LogTarget) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    match (json, target) {
        (true, LogTarget::Stdout) => fmt::layer().json().boxed(),
        (true, LogTarget::Stderr) => fmt::layer().json().with_writer(std::io::stderr).boxed(),
        (false, LogTarget::Stdout) => fmt::layer().boxed(),
        (false, LogTarget::Stderr) => fmt::layer().with_writer(std::io::stderr).boxed(),
    }
}

fn install_subscriber(level: &str, json: bool, target: LogTarget, otel: Option<String>) {
    // A failed OTLP pipeline degrades to plain logging.
    let (tracer, otel_error) = match otel.map(otlp_tracer) {
        Some(Ok(tracer)) => (Some(tracer), None),
        Some(Err(err)) => (None, Some(err)),
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer)))
        .with(EnvFilter::new(log_filter(level)))
        .with(fmt_layer(json, target))
        .try_init()
        .is_ok();

    if let (true, Some(err)) = (installed, otel_error) {
        error!("Failed to install OTLP pipeline: {}", err);
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    load_config_from(Path::new(CONFIG_DIR), &run_env)
}

/// Loads configuration from `config_dir` for the given run environment
pub fn load_config_from(config_dir: &Path, run_env: &str) -> Result<AppConfig, AppConfigError> {
    let config = Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", run_env)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(run_env)).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate_all().map_err(|e| {
        error!("Configuration validation failed: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File as FsFile;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, filename: &str, content: &str) {
        let mut file = FsFile::create(dir.path().join(filename)).unwrap();
        writeln!(file, "{}", content).unwrap();
    }

    #[test]
    fn default_analytics_config_is_valid() {
        let cfg = AnalyticsConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.low_stock_threshold, 10.0);
        assert_eq!(cfg.max_stock_alerts, 3);
        assert_eq!(cfg.weekday_placeholder_revenue, 100.0);
        assert_eq!(cfg.default_growth, 0.05);
        assert!(cfg.jitter_enabled);
    }

    #[test]
    fn growth_outside_clamp_is_rejected() {
        let cfg = AnalyticsConfig {
            default_growth: 0.4,
            ..AnalyticsConfig::default()
        };
        let errors = cfg.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("default_growth"));
    }

    #[test]
    fn jitter_band_and_offset_are_bounded() {
        let cfg = AnalyticsConfig {
            three_month_jitter: 0.9,
            day_boundary_offset_minutes: 15 * 60,
            ..AnalyticsConfig::default()
        };
        let errors = cfg.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("three_month_jitter"));
        assert!(errors.field_errors().contains_key("day_boundary_offset_minutes"));
    }

    #[test]
    fn numeric_custom_validators_reject_bad_values() {
        let cfg = AnalyticsConfig {
            low_stock_threshold: f64::NAN,
            weekday_placeholder_revenue: 0.0,
            six_month_jitter: -0.1,
            ..AnalyticsConfig::default()
        };
        let errors = cfg.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("low_stock_threshold"));
        assert!(fields.contains_key("weekday_placeholder_revenue"));
        assert!(fields.contains_key("six_month_jitter"));
        assert!(!fields.contains_key("default_growth"));
    }

    #[test]
    fn cli_tracing_can_be_installed_repeatedly() {
        init_cli_tracing("debug");
        init_cli_tracing("warn");
        tracing::debug!("subscriber installed");
    }

    #[test]
    fn invalid_log_level_fails_validation() {
        let mut cfg = AppConfig::new("127.0.0.1".into(), 8080, "development".into());
        assert!(cfg.validate_all().is_ok());
        cfg.log_level = "verbose".into();
        assert!(matches!(cfg.validate_all(), Err(AppConfigError::Validation(_))));
    }

    #[test]
    fn loads_layered_files() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "default.toml",
            r#"
            host = "127.0.0.1"
            port = 9090

            [analytics]
            low_stock_threshold = 4.0
            "#,
        );
        write_config(
            &dir,
            "staging.toml",
            r#"
            log_level = "debug"

            [analytics]
            jitter_enabled = false
            "#,
        );

        let cfg = load_config_from(dir.path(), "staging").unwrap();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.environment, "staging");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.analytics.low_stock_threshold, 4.0);
        assert!(!cfg.analytics.jitter_enabled);
        assert_eq!(cfg.analytics.max_stock_alerts, 3);
    }

    #[test]
    fn invalid_analytics_file_fails_validation() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "default.toml",
            r#"
            [analytics]
            momentum_fallback = 0.5
            "#,
        );

        let result = load_config_from(dir.path(), "development");
        assert!(matches!(result, Err(AppConfigError::Validation(_))));
    }
}
