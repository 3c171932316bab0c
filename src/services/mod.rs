pub mod insights;

pub use insights::{HistoryProvider, InsightsService, JsonFileHistory, StaticHistory};
