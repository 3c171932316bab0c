//! Revenue forecasting and pattern mining over an order/inventory snapshot.
//!
//! The engine is synchronous and holds no state between runs. One call to
//! [`InsightsEngine::generate`] aggregates the order history into daily and
//! period totals, derives trend and momentum, builds the forecast for the
//! requested range, mines basket and timing patterns, filters low stock,
//! and assembles the dashboard payload.

pub mod alerts;
pub mod calendar;
pub mod daily_revenue;
pub mod forecast;
pub mod jitter;
pub mod momentum;
pub mod patterns;
pub mod periods;
pub mod response;
pub mod trend;

pub use alerts::StockAlertFilter;
pub use calendar::DayBoundary;
pub use daily_revenue::DailyRevenue;
pub use forecast::{ForecastGenerator, ForecastPoint, ForecastRange};
pub use patterns::{BundleCandidate, ItemPopularity, PatternInsights, TopCombo};
pub use response::{Alerts, Correlations, InsightsResponse, Optimization, Summary};

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, instrument};

use crate::config::AnalyticsConfig;
use crate::models::HistorySnapshot;

#[derive(Clone, Debug)]
pub struct InsightsEngine {
    config: AnalyticsConfig,
    boundary: DayBoundary,
    forecaster: ForecastGenerator,
    alerts: StockAlertFilter,
}

impl InsightsEngine {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            boundary: config.day_boundary(),
            forecaster: ForecastGenerator::new(&config),
            alerts: StockAlertFilter::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn boundary(&self) -> &DayBoundary {
        &self.boundary
    }

    /// Runs the full pipeline with thread-local randomness for display jitter.
    pub fn generate(
        &self,
        snapshot: &HistorySnapshot,
        range: ForecastRange,
        now: DateTime<Utc>,
    ) -> InsightsResponse {
        self.generate_with_rng(snapshot, range, now, &mut rand::thread_rng())
    }

    /// Runs the full pipeline drawing jitter from `rng`.
    #[instrument(skip(self, snapshot, rng), fields(orders = snapshot.orders.len()))]
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        snapshot: &HistorySnapshot,
        range: ForecastRange,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> InsightsResponse {
        let today = self.boundary.day_of(&now);
        let daily = DailyRevenue::from_orders(&snapshot.orders, &self.boundary);
        debug!(
            active_days = daily.unique_active_days(),
            %today,
            "aggregated daily revenue"
        );

        let forecast = self.forecaster.generate(range, &daily, today, rng);
        let patterns = patterns::mine(&snapshot.orders, &self.boundary);
        let stock = self.alerts.low_stock(&snapshot.inventory);

        response::assemble(range, forecast, patterns, stock)
    }

    /// Pattern-mining section only.
    pub fn patterns(&self, snapshot: &HistorySnapshot) -> PatternInsights {
        patterns::mine(&snapshot.orders, &self.boundary)
    }
}

impl Default for InsightsEngine {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}
