use serde::Serialize;

use super::periods::{PeriodKind, PeriodTotal};
use crate::config::AnalyticsConfig;

/// Largest per-period growth (either direction) any forecast may compound with.
pub const GROWTH_LIMIT: f64 = 0.15;

/// Clamps a growth rate to ±[`GROWTH_LIMIT`]; non-finite input becomes 0.
pub fn clamp_growth(growth: f64) -> f64 {
    if growth.is_finite() {
        growth.clamp(-GROWTH_LIMIT, GROWTH_LIMIT)
    } else {
        0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TrendParameters {
    pub baseline: f64,
    pub growth: f64,
}

/// Derives a baseline level and a bounded growth rate from period totals.
#[derive(Clone, Debug)]
pub struct TrendEstimator {
    min_periods: usize,
    window: usize,
    default_growth: f64,
}

impl TrendEstimator {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            min_periods: config.min_trend_periods.max(1),
            window: config.trend_window.max(1),
            default_growth: clamp_growth(config.default_growth),
        }
    }

    /// With too little history the baseline is the daily run rate scaled to
    /// one period and growth is the configured default. Otherwise growth is
    /// the mean period-over-period change across the recent window and the
    /// baseline is a recency-weighted mean of the same window.
    pub fn estimate(
        &self,
        periods: &[PeriodTotal],
        kind: PeriodKind,
        daily_run_rate: f64,
    ) -> TrendParameters {
        if periods.len() < self.min_periods {
            return TrendParameters {
                baseline: (daily_run_rate * kind.length_days()).max(0.0),
                growth: self.default_growth,
            };
        }

        let recent: Vec<f64> = periods[periods.len().saturating_sub(self.window)..]
            .iter()
            .map(PeriodTotal::total_f64)
            .collect();

        TrendParameters {
            baseline: weighted_baseline(&recent),
            growth: clamp_growth(mean_growth(&recent)),
        }
    }
}

/// Mean of `(current - previous) / previous` over consecutive pairs whose
/// earlier value is positive; 0 when no pair qualifies.
fn mean_growth(values: &[f64]) -> f64 {
    let ratios: Vec<f64> = values
        .windows(2)
        .filter(|pair| pair[0] > 0.0)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .collect();
    if ratios.is_empty() {
        0.0
    } else {
        ratios.iter().sum::<f64>() / ratios.len() as f64
    }
}

/// Weighted mean with weight 1 for the oldest value up to N for the newest.
fn weighted_baseline(values: &[f64]) -> f64 {
    let (weighted_sum, weight_total) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sum, weights), (index, value)| {
            let weight = (index + 1) as f64;
            (sum + weight * value, weights + weight)
        });
    if weight_total > 0.0 {
        (weighted_sum / weight_total).max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::periods::PeriodKey;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn weeks(totals: &[i64]) -> Vec<PeriodTotal> {
        let first = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        totals
            .iter()
            .enumerate()
            .map(|(i, total)| PeriodTotal {
                key: PeriodKey::Week(first + chrono::Duration::weeks(i as i64)),
                total: Decimal::from(*total),
            })
            .collect()
    }

    fn estimator() -> TrendEstimator {
        TrendEstimator::new(&AnalyticsConfig::default())
    }

    #[test]
    fn sparse_history_uses_run_rate_fallback() {
        let trend = estimator().estimate(&weeks(&[100, 200]), PeriodKind::Week, 20.0);
        assert_eq!(trend.baseline, 140.0);
        assert_eq!(trend.growth, 0.05);

        let trend = estimator().estimate(&[], PeriodKind::Month, 10.0);
        assert!((trend.baseline - 304.0).abs() < 1e-9);
    }

    #[test]
    fn baseline_is_recency_weighted() {
        // weights 1, 2, 3 -> (100 + 2*100 + 3*400) / 6 = 250
        let trend = estimator().estimate(&weeks(&[100, 100, 400]), PeriodKind::Week, 0.0);
        assert_eq!(trend.baseline, 250.0);
    }

    #[test]
    fn growth_is_averaged_then_clamped() {
        let trend = estimator().estimate(&weeks(&[100, 105, 110]), PeriodKind::Week, 0.0);
        let expected = (0.05 + 5.0 / 105.0) / 2.0;
        assert!((trend.growth - expected).abs() < 1e-12);

        let trend = estimator().estimate(&weeks(&[100, 200, 400]), PeriodKind::Week, 0.0);
        assert_eq!(trend.growth, GROWTH_LIMIT);

        let trend = estimator().estimate(&weeks(&[400, 100, 25]), PeriodKind::Week, 0.0);
        assert_eq!(trend.growth, -GROWTH_LIMIT);
    }

    #[test]
    fn only_the_last_six_periods_count() {
        // The 1000 and the jump out of it fall outside the window.
        let trend = estimator().estimate(
            &weeks(&[1000, 10, 100, 100, 100, 100, 100, 100]),
            PeriodKind::Week,
            0.0,
        );
        assert_eq!(trend.baseline, 100.0);
        assert_eq!(trend.growth, 0.0);
    }

    #[test]
    fn zero_periods_are_skipped_as_growth_denominators() {
        let trend = estimator().estimate(&weeks(&[0, 0, 50]), PeriodKind::Week, 0.0);
        assert_eq!(trend.growth, 0.0);
        assert!(trend.baseline > 0.0);
    }

    #[test]
    fn clamp_growth_handles_non_finite_values() {
        assert_eq!(clamp_growth(f64::NAN), 0.0);
        assert_eq!(clamp_growth(f64::INFINITY), 0.0);
        assert_eq!(clamp_growth(0.1), 0.1);
    }
}
