//! History records consumed by the analytics engine.

pub mod inventory;
pub mod lenient;
pub mod order;

pub use inventory::InventoryItem;
pub use order::{Order, OrderItem};

use serde::Deserialize;

/// Everything one analytics run reads: the caller's order and inventory
/// history as of the moment of the request.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct HistorySnapshot {
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
}

impl HistorySnapshot {
    pub fn new(orders: Vec<Order>, inventory: Vec<InventoryItem>) -> Self {
        Self { orders, inventory }
    }
}
