use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::calendar::DayBoundary;
use crate::models::Order;

/// Revenue per calendar day, built once per analytics run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DailyRevenue {
    buckets: BTreeMap<NaiveDate, Decimal>,
    total: Decimal,
}

impl DailyRevenue {
    /// Folds orders into per-day totals. Orders without a timestamp are skipped.
    /// Sums saturate at `Decimal::MAX`.
    pub fn from_orders(orders: &[Order], boundary: &DayBoundary) -> Self {
        let mut daily = Self::default();
        for order in orders {
            let Some(created_at) = order.created_at.as_ref() else {
                continue;
            };
            let amount = order.total.max(Decimal::ZERO);
            let bucket = daily
                .buckets
                .entry(boundary.day_of(created_at))
                .or_insert(Decimal::ZERO);
            *bucket = bucket.saturating_add(amount);
            daily.total = daily.total.saturating_add(amount);
        }
        daily
    }

    pub fn buckets(&self) -> &BTreeMap<NaiveDate, Decimal> {
        &self.buckets
    }

    pub fn total_revenue(&self) -> Decimal {
        self.total
    }

    /// Number of days with at least one timestamped order.
    pub fn unique_active_days(&self) -> usize {
        self.buckets.len()
    }

    /// Average revenue per active day, 0 when there are none.
    pub fn daily_run_rate(&self) -> f64 {
        match self.unique_active_days() {
            0 => 0.0,
            days => to_f64(self.total) / days as f64,
        }
    }

    pub fn revenue_on(&self, day: NaiveDate) -> f64 {
        self.buckets.get(&day).copied().map(to_f64).unwrap_or(0.0)
    }

    /// Revenue over the inclusive range `start..=end`; zero for an empty range.
    pub fn revenue_between(&self, start: NaiveDate, end: NaiveDate) -> Decimal {
        if start > end {
            return Decimal::ZERO;
        }
        self.buckets
            .range(start..=end)
            .fold(Decimal::ZERO, |sum, (_, revenue)| sum.saturating_add(*revenue))
    }
}

pub(crate) fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or(0.0)
}
