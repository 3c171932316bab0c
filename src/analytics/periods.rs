use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::calendar::week_start;
use super::daily_revenue::{to_f64, DailyRevenue};

/// Granularity of a re-bucketed revenue series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Week,
    Month,
}

impl PeriodKind {
    /// Average length of the period in days, used to scale a daily run rate.
    pub fn length_days(self) -> f64 {
        match self {
            PeriodKind::Week => 7.0,
            PeriodKind::Month => 30.4,
        }
    }

    pub fn key_for(self, date: NaiveDate) -> PeriodKey {
        match self {
            PeriodKind::Week => PeriodKey::Week(week_start(date)),
            PeriodKind::Month => PeriodKey::Month {
                year: date.year(),
                month: date.month(),
            },
        }
    }
}

/// Identifies one week (by its Monday) or one calendar month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodKey {
    Week(NaiveDate),
    Month { year: i32, month: u32 },
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Week(monday) => write!(f, "{}", monday.format("%Y-%m-%d")),
            PeriodKey::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeriodTotal {
    pub key: PeriodKey,
    pub total: Decimal,
}

impl PeriodTotal {
    pub fn total_f64(&self) -> f64 {
        to_f64(self.total)
    }
}

/// Re-buckets daily revenue into `kind` periods, ascending by key.
pub fn aggregate(daily: &DailyRevenue, kind: PeriodKind) -> Vec<PeriodTotal> {
    let mut totals: BTreeMap<PeriodKey, Decimal> = BTreeMap::new();
    for (day, revenue) in daily.buckets() {
        let total = totals.entry(kind.key_for(*day)).or_insert(Decimal::ZERO);
        *total = total.saturating_add(*revenue);
    }
    totals
        .into_iter()
        .map(|(key, total)| PeriodTotal { key, total })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::calendar::DayBoundary;
    use crate::models::Order;
    use chrono::{DateTime, Utc};
    use rust_decimal_macros::dec;

    fn order(at: &str, total: Decimal) -> Order {
        Order::new(
            DateTime::parse_from_rfc3339(at).unwrap().with_timezone(&Utc),
            total,
            &[],
        )
    }

    fn daily() -> DailyRevenue {
        DailyRevenue::from_orders(
            &[
                order("2026-09-30T10:00:00Z", dec!(5)),
                order("2026-10-11T10:00:00Z", dec!(1)),
                order("2026-10-12T10:00:00Z", dec!(2)),
                order("2026-10-18T10:00:00Z", dec!(3)),
                order("2026-10-19T10:00:00Z", dec!(4)),
            ],
            &DayBoundary::default(),
        )
    }

    #[test]
    fn weekly_buckets_are_keyed_by_monday() {
        let weeks = aggregate(&daily(), PeriodKind::Week);
        let keys: Vec<String> = weeks.iter().map(|p| p.key.to_string()).collect();
        assert_eq!(keys, vec!["2026-09-28", "2026-10-05", "2026-10-12", "2026-10-19"]);
        let totals: Vec<Decimal> = weeks.iter().map(|p| p.total).collect();
        assert_eq!(totals, vec![dec!(5), dec!(1), dec!(5), dec!(4)]);
    }

    #[test]
    fn monthly_buckets_are_sorted_and_unique() {
        let months = aggregate(&daily(), PeriodKind::Month);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].key.to_string(), "2026-09");
        assert_eq!(months[1].key.to_string(), "2026-10");
        assert_eq!(months[1].total, dec!(10));
        assert!(months.windows(2).all(|w| w[0].key < w[1].key));
    }

    #[test]
    fn empty_history_yields_no_periods() {
        assert!(aggregate(&DailyRevenue::default(), PeriodKind::Month).is_empty());
    }
}
