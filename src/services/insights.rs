use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::analytics::{ForecastRange, InsightsEngine, InsightsResponse};
use crate::errors::ServiceError;
use crate::models::HistorySnapshot;

/// Source of the order and inventory history an insights run reads.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn load(&self) -> Result<HistorySnapshot, ServiceError>;
}

/// Serves a fixed in-memory snapshot.
#[derive(Clone, Debug, Default)]
pub struct StaticHistory {
    snapshot: Arc<HistorySnapshot>,
}

impl StaticHistory {
    pub fn new(snapshot: HistorySnapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
        }
    }
}

#[async_trait]
impl HistoryProvider for StaticHistory {
    async fn load(&self) -> Result<HistorySnapshot, ServiceError> {
        Ok(self.snapshot.as_ref().clone())
    }
}

/// Re-reads a JSON snapshot file on every load.
#[derive(Clone, Debug)]
pub struct JsonFileHistory {
    path: PathBuf,
}

impl JsonFileHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl HistoryProvider for JsonFileHistory {
    async fn load(&self) -> Result<HistorySnapshot, ServiceError> {
        let raw = tokio::fs::read(&self.path).await.map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "failed to read history snapshot");
            ServiceError::HistorySourceError(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))
        })?;
        serde_json::from_slice(&raw).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "history snapshot is not valid JSON");
            ServiceError::HistorySourceError(format!(
                "failed to decode {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

/// Runs the insights engine over history fetched from a provider.
#[derive(Clone)]
pub struct InsightsService {
    provider: Arc<dyn HistoryProvider>,
    engine: InsightsEngine,
}

impl InsightsService {
    pub fn new(provider: Arc<dyn HistoryProvider>, engine: InsightsEngine) -> Self {
        Self { provider, engine }
    }

    pub fn engine(&self) -> &InsightsEngine {
        &self.engine
    }

    /// Loads the provider's snapshot and runs the engine over it. The engine
    /// is not invoked when the provider fails.
    #[instrument(skip(self))]
    pub async fn insights(&self, range: ForecastRange) -> Result<InsightsResponse, ServiceError> {
        let snapshot = self.provider.load().await.map_err(|e| {
            counter!("insights_history_failures_total", 1);
            e
        })?;
        Ok(self.insights_for(&snapshot, range, Utc::now()))
    }

    /// Runs the engine over a caller-supplied snapshot.
    pub fn insights_for(
        &self,
        snapshot: &HistorySnapshot,
        range: ForecastRange,
        now: DateTime<Utc>,
    ) -> InsightsResponse {
        let started = Instant::now();
        let response = self.engine.generate(snapshot, range, now);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        counter!("insights_requests_total", 1, "range" => range.as_str());
        histogram!("insights_engine_duration_ms", elapsed_ms, "range" => range.as_str());
        info!(
            range = %range,
            orders = snapshot.orders.len(),
            points = response.forecast.len(),
            elapsed_ms,
            "insights generated"
        );
        response
    }
}
