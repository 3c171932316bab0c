//! StateSet Insights Library
//!
//! Revenue forecasting and order pattern mining for the analytics dashboard,
//! exposed as a pure engine ([`analytics::InsightsEngine`]) and as an axum
//! service.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod analytics;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;

use axum::{response::Json, routing::get, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::{OpenApi, ToSchema};

use crate::analytics::InsightsEngine;
use crate::services::{HistoryProvider, InsightsService};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub insights: Arc<InsightsService>,
}

impl AppState {
    /// Wires an insights service over `provider` using the analytics settings of `config`.
    pub fn new(config: config::AppConfig, provider: Arc<dyn HistoryProvider>) -> Self {
        let engine = InsightsEngine::new(config.analytics.clone());
        Self {
            insights: Arc::new(InsightsService::new(provider, engine)),
            config,
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: Some(ResponseMeta {
                timestamp: Utc::now().to_rfc3339(),
            }),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "StateSet Insights API",
        version = "0.2.1",
        description = "Revenue forecasts, co-purchase patterns, peak ordering hours and low-stock alerts."
    ),
    paths(
        handlers::analytics::get_insights,
        handlers::analytics::post_insights,
    ),
    components(
        schemas(
            analytics::InsightsResponse,
            analytics::ForecastPoint,
            analytics::ForecastRange,
            analytics::Correlations,
            analytics::Optimization,
            analytics::Alerts,
            analytics::Summary,
            analytics::TopCombo,
            analytics::BundleCandidate,
            analytics::ItemPopularity,
            handlers::analytics::InsightsRequest,
            errors::ErrorResponse
        )
    ),
    tags(
        (name = "Analytics", description = "Forecasting and pattern mining")
    )
)]
pub struct ApiDocV1;

/// Versioned API routes, nested under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new().nest("/analytics", handlers::analytics::analytics_routes())
}

/// Full application router with health, OpenAPI document and HTTP layers.
pub fn app(state: AppState) -> Router {
    let timeout = state.config.request_timeout();
    Router::new()
        .route("/health", get(health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDocV1::openapi())
}
