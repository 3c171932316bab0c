use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

use super::daily_revenue::{to_f64, DailyRevenue};
use super::trend::clamp_growth;
use crate::config::AnalyticsConfig;

/// Trailing-window revenue comparison shared by the multi-month forecasts.
#[derive(Clone, Debug)]
pub struct MomentumCalculator {
    window_days: i64,
    fallback: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MomentumWindows {
    pub last: Decimal,
    pub previous: Decimal,
}

impl MomentumCalculator {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            window_days: i64::from(config.momentum_window_days.max(1)),
            fallback: clamp_growth(config.momentum_fallback),
        }
    }

    /// Revenue of the window ending today and of the window just before it.
    pub fn windows(&self, daily: &DailyRevenue, today: NaiveDate) -> MomentumWindows {
        let last_start = today - Duration::days(self.window_days - 1);
        let previous_end = last_start - Duration::days(1);
        let previous_start = previous_end - Duration::days(self.window_days - 1);
        MomentumWindows {
            last: daily.revenue_between(last_start, today),
            previous: daily.revenue_between(previous_start, previous_end),
        }
    }

    /// Relative change between the two windows, clamped to the growth limit.
    pub fn momentum(&self, daily: &DailyRevenue, today: NaiveDate) -> f64 {
        let MomentumWindows { last, previous } = self.windows(daily, today);
        let momentum = if previous > Decimal::ZERO {
            let previous = to_f64(previous);
            (to_f64(last) - previous) / previous
        } else if last > Decimal::ZERO {
            self.fallback
        } else {
            0.0
        };
        clamp_growth(momentum)
    }
}
