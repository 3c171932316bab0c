#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use stateset_insights::{
    config::AppConfig,
    models::{HistorySnapshot, InventoryItem, Order},
    services::{HistoryProvider, StaticHistory},
    AppState,
};
use tower::ServiceExt;

/// Router over a configurable history provider, with display jitter off.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new(provider: Arc<dyn HistoryProvider>) -> Self {
        let mut config = AppConfig::new("127.0.0.1".into(), 0, "test".into());
        config.analytics.jitter_enabled = false;
        let state = AppState::new(config, provider);
        Self {
            router: stateset_insights::app(state.clone()),
            state,
        }
    }

    pub fn with_snapshot(snapshot: HistorySnapshot) -> Self {
        Self::new(Arc::new(StaticHistory::new(snapshot)))
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends the request and decodes the JSON body (`Null` if it is not JSON).
    pub async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request(method, uri, body).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
}

/// Mid-afternoon UTC on [`today`].
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, 15, 0, 0).unwrap()
}

pub fn order_on(day: NaiveDate, hour: u32, total: i64, items: &[&str]) -> Order {
    let at = Utc.from_utc_datetime(&day.and_hms_opt(hour, 0, 0).unwrap());
    Order::new(at, Decimal::from(total), items)
}

/// One 10:00 order per day for `days` days ending today, each worth `per_day`.
pub fn flat_orders(days: i64, per_day: i64) -> Vec<Order> {
    (0..days)
        .map(|ago| order_on(today() - Duration::days(ago), 10, per_day, &["Latte"]))
        .collect()
}

pub fn bakery_snapshot() -> HistorySnapshot {
    let mut orders = flat_orders(90, 120);
    orders.push(order_on(today(), 8, 15, &["Latte", "Croissant"]));
    orders.push(order_on(today() - Duration::days(1), 8, 9, &["Croissant", "Latte"]));
    orders.push(order_on(today() - Duration::days(2), 9, 6, &["Tea", "Scone"]));
    HistorySnapshot::new(
        orders,
        vec![
            InventoryItem::new("Milk", 5.0),
            InventoryItem::new("Sugar", 50.0),
            InventoryItem::new("Beans", 2.0),
        ],
    )
}
