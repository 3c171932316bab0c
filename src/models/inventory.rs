use serde::Deserialize;

use super::lenient;

/// Current stock level of a single inventory line.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct InventoryItem {
    /// Display name of the stocked item.
    #[serde(default, deserialize_with = "lenient::text")]
    pub item: String,

    /// On-hand quantity; `None` when the store reported a non-numeric value.
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub quantity: Option<f64>,
}

impl InventoryItem {
    pub fn new(item: impl Into<String>, quantity: f64) -> Self {
        Self {
            item: item.into(),
            quantity: Some(quantity),
        }
    }
}
