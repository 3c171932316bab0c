//! Forgiving field decoders for history records.
//!
//! Order and inventory snapshots come from an external retrieval layer and are
//! not guaranteed to be well formed. A malformed field never fails the whole
//! snapshot: it decodes to the documented default instead.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// Years a decoded timestamp may fall in; anything else is treated as missing.
pub const TIMESTAMP_YEARS: std::ops::RangeInclusive<i32> = 1970..=9999;

/// Decodes a monetary amount. Numbers and numeric strings are accepted;
/// anything else, and any negative amount, becomes zero.
pub fn amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(decimal_from_value)
        .filter(|amount| !amount.is_sign_negative())
        .unwrap_or(Decimal::ZERO))
}

/// Decodes a timestamp given either as an RFC 3339 string (a naive
/// `YYYY-MM-DDTHH:MM:SS` string is read as UTC) or as epoch milliseconds.
/// Instants outside [`TIMESTAMP_YEARS`] decode as absent.
pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(timestamp_from_value))
}

/// Decodes an identifier given as a string or an integer.
pub fn identifier<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(id)) => Some(id),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}

/// Decodes a free-text name; non-string values become an empty string.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => text,
        _ => String::new(),
    })
}

/// Decodes a stock quantity. Returns `None` when the value is not numeric.
pub fn quantity<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let quantity = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(quantity.filter(|q| q.is_finite()))
}

fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(whole) => Some(Decimal::from(whole)),
            None => n.as_f64().and_then(Decimal::from_f64),
        },
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    let parsed = match value {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|ts| ts.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                        .ok()
                        .map(|naive| naive.and_utc())
                })
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    };
    parsed.filter(|ts| TIMESTAMP_YEARS.contains(&ts.year()))
}
