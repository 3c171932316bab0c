use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use utoipa::ToSchema;

use super::calendar::DayBoundary;
use crate::models::Order;

/// Reported instead of a peak window when no order carries a timestamp.
pub const NO_PEAK_HOUR: &str = "N/A";

/// Two items bought together, as an ordered `(first, second)` pair with `first < second`.
pub type ItemPair = (String, String);

/// The most frequently co-purchased pair of items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct TopCombo {
    /// Both names in alphabetical order joined by `" + "`
    #[schema(example = "Croissant + Latte")]
    pub pair: String,
    pub items: Vec<String>,
    /// Number of orders containing both items
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct ItemPopularity {
    pub item: String,
    pub count: usize,
}

/// A slow seller proposed for bundling with the best seller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BundleCandidate {
    pub item: String,
    pub pair_with: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternInsights {
    pub top_combo: Option<TopCombo>,
    pub peak_hour: String,
    pub ranking: Vec<ItemPopularity>,
    pub elastic_item: Option<String>,
    pub bundle_candidate: Option<BundleCandidate>,
}

/// Runs every pattern-mining pass over `orders`.
pub fn mine(orders: &[Order], boundary: &DayBoundary) -> PatternInsights {
    let ranking = popularity(orders);
    let elastic_item = ranking.first().map(|top| top.item.clone());
    let bundle_candidate = bundle_candidate(&ranking);

    PatternInsights {
        top_combo: top_combo(&pair_counts(orders)),
        peak_hour: peak_window_label(peak_hour(orders, boundary)),
        ranking,
        elastic_item,
        bundle_candidate,
    }
}

/// Counts, per unordered pair of distinct items, how many orders contain both.
/// A name repeated within one order counts once.
pub fn pair_counts(orders: &[Order]) -> BTreeMap<ItemPair, usize> {
    let mut counts = BTreeMap::new();
    for order in orders {
        let names: Vec<&str> = order
            .item_names()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        for (index, first) in names.iter().enumerate() {
            for second in &names[index + 1..] {
                *counts
                    .entry((first.to_string(), second.to_string()))
                    .or_insert(0) += 1;
            }
        }
    }
    counts
}

/// Highest count wins; ties go to the alphabetically first pair.
pub fn top_combo(counts: &BTreeMap<ItemPair, usize>) -> Option<TopCombo> {
    let mut best: Option<(&ItemPair, usize)> = None;
    for (pair, count) in counts {
        if best.map_or(true, |(_, top)| *count > top) {
            best = Some((pair, *count));
        }
    }
    best.map(|((first, second), count)| TopCombo {
        pair: format!("{} + {}", first, second),
        items: vec![first.clone(), second.clone()],
        count,
    })
}

/// Item frequency over every order line, most popular first, ties by name.
pub fn popularity(orders: &[Order]) -> Vec<ItemPopularity> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for name in orders.iter().flat_map(Order::item_names) {
        *counts.entry(name).or_insert(0) += 1;
    }
    let mut ranking: Vec<ItemPopularity> = counts
        .into_iter()
        .map(|(item, count)| ItemPopularity {
            item: item.to_string(),
            count,
        })
        .collect();
    ranking.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.item.cmp(&b.item)));
    ranking
}

/// Least popular item paired with the most popular one; needs two distinct items.
pub fn bundle_candidate(ranking: &[ItemPopularity]) -> Option<BundleCandidate> {
    match ranking {
        [most, .., least] => Some(BundleCandidate {
            item: least.item.clone(),
            pair_with: most.item.clone(),
        }),
        _ => None,
    }
}

/// Hour of day with the most orders; ties go to the earliest hour.
pub fn peak_hour(orders: &[Order], boundary: &DayBoundary) -> Option<u32> {
    let mut hours = [0_usize; 24];
    for created_at in orders.iter().filter_map(|order| order.created_at.as_ref()) {
        hours[boundary.hour_of(created_at) as usize] += 1;
    }
    let mut peak: Option<(u32, usize)> = None;
    for (hour, count) in (0u32..).zip(hours) {
        if count > 0 && peak.map_or(true, |(_, top)| count > top) {
            peak = Some((hour, count));
        }
    }
    peak.map(|(hour, _)| hour)
}

/// Renders a peak hour as `"H:00 - (H+1):00"`.
pub fn peak_window_label(hour: Option<u32>) -> String {
    match hour {
        Some(hour) => format!("{}:00 - {}:00", hour, hour + 1),
        None => NO_PEAK_HOUR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;

    fn order(at: &str, items: &[&str]) -> Order {
        Order::new(
            DateTime::parse_from_rfc3339(at).unwrap().with_timezone(&Utc),
            Decimal::from(10),
            items,
        )
    }

    fn pair(a: &str, b: &str) -> ItemPair {
        (a.to_string(), b.to_string())
    }

    #[test]
    fn pairs_are_counted_per_order() {
        let orders = vec![
            order("2026-10-01T09:00:00Z", &["A", "B"]),
            order("2026-10-01T10:00:00Z", &["A", "C"]),
        ];
        let counts = pair_counts(&orders);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[&pair("A", "B")], 1);
        assert_eq!(counts[&pair("A", "C")], 1);

        let combo = top_combo(&counts).unwrap();
        assert_eq!(combo.pair, "A + B");
        assert_eq!(combo.count, 1);
    }

    #[test]
    fn pair_keys_are_sorted_and_distinct() {
        let orders = vec![
            order("2026-10-01T09:00:00Z", &["Scone", "Latte", "Latte"]),
            order("2026-10-02T09:00:00Z", &["Latte", "Scone"]),
            order("2026-10-03T09:00:00Z", &["Mocha"]),
        ];
        let counts = pair_counts(&orders);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&pair("Latte", "Scone")], 2);

        let combo = top_combo(&counts).unwrap();
        assert_eq!(combo.pair, "Latte + Scone");
        assert_eq!(combo.items, vec!["Latte".to_string(), "Scone".to_string()]);
    }

    #[test]
    fn names_containing_the_separator_do_not_collide() {
        let orders = vec![
            order("2026-10-01T09:00:00Z", &["Tea + Milk", "Cake"]),
            order("2026-10-01T09:30:00Z", &["Tea", "Milk + Cake"]),
        ];
        let counts = pair_counts(&orders);
        assert_eq!(counts.len(), 2);
        assert!(counts.values().all(|count| *count == 1));
    }

    #[test]
    fn no_pairs_without_multi_item_orders() {
        let orders = vec![order("2026-10-01T09:00:00Z", &["Latte"])];
        assert_eq!(top_combo(&pair_counts(&orders)), None);
    }

    #[test]
    fn popularity_ranks_by_count_then_name() {
        let orders = vec![
            order("2026-10-01T09:00:00Z", &["Latte", "Scone"]),
            order("2026-10-01T10:00:00Z", &["Latte", "Bagel"]),
            order("2026-10-01T11:00:00Z", &["Latte", " Scone "]),
        ];
        let ranking = popularity(&orders);
        let names: Vec<&str> = ranking.iter().map(|r| r.item.as_str()).collect();
        assert_eq!(names, vec!["Latte", "Scone", "Bagel"]);
        assert_eq!(ranking[0].count, 3);

        let insights = mine(&orders, &DayBoundary::default());
        assert_eq!(insights.elastic_item.as_deref(), Some("Latte"));
        assert_eq!(
            insights.bundle_candidate,
            Some(BundleCandidate {
                item: "Bagel".into(),
                pair_with: "Latte".into()
            })
        );
    }

    #[test]
    fn single_item_catalogue_has_no_bundle_candidate() {
        let orders = vec![order("2026-10-01T09:00:00Z", &["Latte"])];
        assert_eq!(bundle_candidate(&popularity(&orders)), None);
    }

    #[test]
    fn peak_hour_picks_the_busiest_hour() {
        let orders = vec![
            order("2026-10-01T08:10:00Z", &[]),
            order("2026-10-02T14:05:00Z", &[]),
            order("2026-10-03T14:55:00Z", &[]),
            order("2026-10-04T23:30:00Z", &[]),
        ];
        let boundary = DayBoundary::default();
        assert_eq!(peak_hour(&orders, &boundary), Some(14));
        assert_eq!(peak_window_label(Some(14)), "14:00 - 15:00");
    }

    #[test]
    fn peak_hour_ties_go_to_the_earliest_hour() {
        let orders = vec![
            order("2026-10-01T18:00:00Z", &[]),
            order("2026-10-01T07:00:00Z", &[]),
        ];
        assert_eq!(peak_hour(&orders, &DayBoundary::default()), Some(7));
    }

    #[test]
    fn peak_hour_is_not_available_without_timestamps() {
        let mut undated = order("2026-10-01T18:00:00Z", &["Latte"]);
        undated.created_at = None;
        let insights = mine(&[undated], &DayBoundary::default());
        assert_eq!(insights.peak_hour, NO_PEAK_HOUR);
        assert_eq!(insights.elastic_item.as_deref(), Some("Latte"));
    }
}
