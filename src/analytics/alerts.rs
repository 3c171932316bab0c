use crate::config::AnalyticsConfig;
use crate::models::InventoryItem;

/// Picks out inventory lines that are running low.
#[derive(Clone, Debug)]
pub struct StockAlertFilter {
    threshold: f64,
    max_alerts: usize,
}

impl StockAlertFilter {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            threshold: config.low_stock_threshold,
            max_alerts: config.max_stock_alerts,
        }
    }

    /// Names of the first matching items, in input order, whose quantity is
    /// strictly below the threshold. Lines with an unknown quantity or a
    /// blank name never alert.
    pub fn low_stock(&self, inventory: &[InventoryItem]) -> Vec<String> {
        inventory
            .iter()
            .filter(|line| matches!(line.quantity, Some(quantity) if quantity < self.threshold))
            .map(|line| line.item.trim())
            .filter(|name| !name.is_empty())
            .take(self.max_alerts)
            .map(str::to_string)
            .collect()
    }
}
