use serde::Serialize;
use utoipa::ToSchema;

use super::forecast::{ForecastPoint, ForecastRange};
use super::patterns::{BundleCandidate, ItemPopularity, PatternInsights, TopCombo};

/// Payload consumed by the analytics dashboard.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsightsResponse {
    pub forecast: Vec<ForecastPoint>,
    pub correlations: Correlations,
    pub optimization: Optimization,
    pub alerts: Alerts,
    pub summary: Summary,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Correlations {
    pub top_combo: Option<TopCombo>,
    /// `"H:00 - (H+1):00"` or `"N/A"`
    #[schema(example = "8:00 - 9:00")]
    pub peak_hour: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Optimization {
    /// Most popular item
    pub elastic_item: Option<String>,
    pub bundle_candidate: Option<BundleCandidate>,
    pub ranking: Vec<ItemPopularity>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct Alerts {
    /// Names of low-stock items
    pub stock: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Actual revenue of elapsed periods plus predicted revenue of the rest
    pub monthly_projected: f64,
    pub range: ForecastRange,
}

/// Sums each point's actual value, falling back to its prediction, then 0.
pub fn connected_total(points: &[ForecastPoint]) -> f64 {
    points.iter().map(ForecastPoint::connected_value).sum()
}

pub fn assemble(
    range: ForecastRange,
    forecast: Vec<ForecastPoint>,
    patterns: PatternInsights,
    stock_alerts: Vec<String>,
) -> InsightsResponse {
    let monthly_projected = connected_total(&forecast);
    InsightsResponse {
        forecast,
        correlations: Correlations {
            top_combo: patterns.top_combo,
            peak_hour: patterns.peak_hour,
        },
        optimization: Optimization {
            elastic_item: patterns.elastic_item,
            bundle_candidate: patterns.bundle_candidate,
            ranking: patterns.ranking,
        },
        alerts: Alerts {
            stock: stock_alerts,
        },
        summary: Summary {
            monthly_projected,
            range,
        },
    }
}
