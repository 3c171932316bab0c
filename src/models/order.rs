use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::lenient;

/// A line on an order as delivered by the order store.
///
/// Older records carry bare item names, newer ones an object with a `name`
/// field. Anything else (numbers, nested arrays, objects with a non-string
/// name) is kept as `Unrecognized` so that a single odd line does not reject
/// the whole order.
#[derive(Clone, Debug, PartialEq)]
pub enum OrderItem {
    Name(String),
    Record { name: Option<String> },
    Unrecognized,
}

impl<'de> Deserialize<'de> for OrderItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self::from_value(Value::deserialize(deserializer)?))
    }
}

impl OrderItem {
    fn from_value(value: Value) -> Self {
        match value {
            Value::String(name) => OrderItem::Name(name),
            Value::Object(mut fields) => match fields.remove("name") {
                None | Some(Value::Null) => OrderItem::Record { name: None },
                Some(Value::String(name)) => OrderItem::Record { name: Some(name) },
                Some(_) => OrderItem::Unrecognized,
            },
            _ => OrderItem::Unrecognized,
        }
    }

    /// Trimmed item name, or `None` if the line has no usable name.
    pub fn normalized_name(&self) -> Option<&str> {
        let raw = match self {
            OrderItem::Name(name) => name.as_str(),
            OrderItem::Record { name: Some(name) } => name.as_str(),
            OrderItem::Record { name: None } | OrderItem::Unrecognized => return None,
        };
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

impl From<&str> for OrderItem {
    fn from(name: &str) -> Self {
        OrderItem::Name(name.to_string())
    }
}

/// Snapshot of a placed order, read-only for the duration of one analytics run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Identifier assigned by the order store.
    #[serde(default, deserialize_with = "lenient::identifier")]
    pub id: Option<String>,

    /// When the order was placed. `None` when missing or unparseable.
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,

    /// Order total, never negative.
    #[serde(default, deserialize_with = "lenient::amount")]
    pub total: Decimal,

    /// Items on the order. Anything other than an array decodes as no items.
    #[serde(default, deserialize_with = "item_list")]
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn new(created_at: DateTime<Utc>, total: Decimal, items: &[&str]) -> Self {
        Self {
            id: None,
            created_at: Some(created_at),
            total: total.max(Decimal::ZERO),
            items: items.iter().map(|name| OrderItem::from(*name)).collect(),
        }
    }

    /// Iterates the order's usable item names.
    pub fn item_names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(OrderItem::normalized_name)
    }
}

fn item_list<'de, D>(deserializer: D) -> Result<Vec<OrderItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(values)) => values.into_iter().map(OrderItem::from_value).collect(),
        _ => Vec::new(),
    })
}
