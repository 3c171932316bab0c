use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::{
    analytics::{ForecastRange, InsightsResponse},
    errors::ServiceError,
    models::{HistorySnapshot, InventoryItem, Order},
    ApiResponse, AppState,
};

/// Build the analytics Router scoped under `/api/v1/analytics`.
pub fn analytics_routes() -> Router<AppState> {
    Router::new().route("/insights", get(get_insights).post(post_insights))
}

/// Query parameters for insights
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct InsightsQuery {
    /// Forecast horizon: `month` (default), `3m` or `6m`
    pub range: Option<String>,
}

/// Inline history to analyse instead of the configured provider.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct InsightsRequest {
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub orders: Vec<Order>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub inventory: Vec<InventoryItem>,
    /// Forecast horizon: `month` (default), `3m` or `6m`
    pub range: Option<String>,
}

/// Forecast and behavioural insights over the configured order history
#[utoipa::path(
    get,
    path = "/api/v1/analytics/insights",
    params(InsightsQuery),
    responses(
        (status = 200, description = "Insights generated", body = ApiResponse<InsightsResponse>),
        (status = 400, description = "Unsupported forecast range", body = crate::errors::ErrorResponse),
        (status = 502, description = "Order history unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "Analytics"
)]
pub async fn get_insights(
    State(state): State<AppState>,
    Query(params): Query<InsightsQuery>,
) -> Result<Json<ApiResponse<InsightsResponse>>, ServiceError> {
    let range = ForecastRange::parse_optional(params.range.as_deref())?;
    let insights = state.insights.insights(range).await?;
    Ok(Json(ApiResponse::success(insights)))
}

/// Forecast and behavioural insights over an inline snapshot
#[utoipa::path(
    post,
    path = "/api/v1/analytics/insights",
    request_body = InsightsRequest,
    responses(
        (status = 200, description = "Insights generated", body = ApiResponse<InsightsResponse>),
        (status = 400, description = "Malformed body or unsupported forecast range", body = crate::errors::ErrorResponse)
    ),
    tag = "Analytics"
)]
pub async fn post_insights(
    State(state): State<AppState>,
    payload: Result<Json<InsightsRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<InsightsResponse>>, ServiceError> {
    let Json(request) = payload.map_err(|e| ServiceError::InvalidInput(e.body_text()))?;
    let range = ForecastRange::parse_optional(request.range.as_deref())?;
    debug!(
        orders = request.orders.len(),
        inventory = request.inventory.len(),
        "inline insights request"
    );

    let snapshot = HistorySnapshot::new(request.orders, request.inventory);
    let insights = state.insights.insights_for(&snapshot, range, Utc::now());
    Ok(Json(ApiResponse::success(insights)))
}
