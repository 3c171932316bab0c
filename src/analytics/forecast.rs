use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use utoipa::ToSchema;

use super::calendar::{self, weekday_index};
use super::daily_revenue::{to_f64, DailyRevenue};
use super::jitter;
use super::momentum::MomentumCalculator;
use super::periods::{self, PeriodKind};
use super::trend::{clamp_growth, TrendEstimator};
use crate::config::AnalyticsConfig;
use crate::errors::ServiceError;

const THREE_MONTH_POINTS: usize = 12;
const SIX_MONTH_POINTS: u32 = 6;
const WEEKS_PER_MONTH: f64 = 4.0;

/// Forecast horizon requested by the dashboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ForecastRange {
    /// Day by day through the end of the current month
    #[default]
    #[serde(rename = "month")]
    Month,
    /// Twelve weeks ahead
    #[serde(rename = "3m")]
    ThreeMonth,
    /// Six calendar months ahead
    #[serde(rename = "6m")]
    SixMonth,
}

impl ForecastRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastRange::Month => "month",
            ForecastRange::ThreeMonth => "3m",
            ForecastRange::SixMonth => "6m",
        }
    }

    /// Parses an optional query value; absent or blank means [`ForecastRange::Month`].
    pub fn parse_optional(value: Option<&str>) -> Result<Self, ServiceError> {
        match value.map(str::trim) {
            None | Some("") => Ok(ForecastRange::Month),
            Some(raw) => raw.parse(),
        }
    }
}

impl FromStr for ForecastRange {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "month" => Ok(ForecastRange::Month),
            "3m" => Ok(ForecastRange::ThreeMonth),
            "6m" => Ok(ForecastRange::SixMonth),
            other => Err(ServiceError::ValidationError(format!(
                "unsupported forecast range '{}'; expected one of: month, 3m, 6m",
                other
            ))),
        }
    }
}

impl fmt::Display for ForecastRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One point of the plotted revenue curve.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct ForecastPoint {
    pub label: String,
    pub actual: Option<f64>,
    pub predicted: Option<f64>,
}

impl ForecastPoint {
    pub fn actual(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            actual: Some(value),
            predicted: None,
        }
    }

    pub fn forecast(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            actual: None,
            predicted: Some(value),
        }
    }

    /// Point carrying the same value as actual and prediction, joining the
    /// two halves of the plotted line.
    pub fn connecting(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            actual: Some(value),
            predicted: Some(value),
        }
    }

    /// `actual` if known, else `predicted`, else 0.
    pub fn connected_value(&self) -> f64 {
        self.actual.or(self.predicted).unwrap_or(0.0)
    }
}

/// Compounds `baseline` by `growth` for `steps` periods: the i-th value
/// (1-based) is `baseline * (1 + growth)^i`. Growth is clamped first.
pub fn compound(baseline: f64, growth: f64, steps: usize) -> Vec<f64> {
    let factor = 1.0 + clamp_growth(growth);
    let mut value = baseline.max(0.0);
    (0..steps)
        .map(|_| {
            value *= factor;
            value
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct ForecastGenerator {
    weekday_placeholder: f64,
    three_month_jitter: f64,
    six_month_jitter: f64,
    jitter_enabled: bool,
    trend: TrendEstimator,
    momentum: MomentumCalculator,
}

impl ForecastGenerator {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            weekday_placeholder: config.weekday_placeholder_revenue,
            three_month_jitter: config.three_month_jitter,
            six_month_jitter: config.six_month_jitter,
            jitter_enabled: config.jitter_enabled,
            trend: TrendEstimator::new(config),
            momentum: MomentumCalculator::new(config),
        }
    }

    /// Produces the forecast for `range`. Only the multi-period ranges draw
    /// from `rng`, and only when jitter is enabled.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        range: ForecastRange,
        daily: &DailyRevenue,
        today: NaiveDate,
        rng: &mut R,
    ) -> Vec<ForecastPoint> {
        match range {
            ForecastRange::Month => self.month_to_date(daily, today),
            ForecastRange::ThreeMonth => {
                let weeks = periods::aggregate(daily, PeriodKind::Week);
                let trend = self
                    .trend
                    .estimate(&weeks, PeriodKind::Week, daily.daily_run_rate());
                let growth = self.momentum.momentum(daily, today) / WEEKS_PER_MONTH;
                debug!(
                    baseline = trend.baseline,
                    growth,
                    periods = weeks.len(),
                    "weekly forecast parameters"
                );

                let mut points = self.weekly_horizon(trend.baseline, growth);
                if self.jitter_enabled {
                    jitter::apply(&mut points, self.three_month_jitter, rng);
                }
                points
            }
            ForecastRange::SixMonth => {
                let months = periods::aggregate(daily, PeriodKind::Month);
                let trend = self
                    .trend
                    .estimate(&months, PeriodKind::Month, daily.daily_run_rate());
                let growth = self.momentum.momentum(daily, today);
                debug!(
                    baseline = trend.baseline,
                    growth,
                    periods = months.len(),
                    "monthly forecast parameters"
                );

                let mut points = self.monthly_horizon(trend.baseline, growth, today);
                if self.jitter_enabled {
                    jitter::apply(&mut points, self.six_month_jitter, rng);
                }
                points
            }
        }
    }

    /// Historical average revenue per active day for each weekday
    /// (Sunday = 0). Weekdays never seen get the placeholder.
    pub fn weekday_averages(&self, daily: &DailyRevenue) -> [f64; 7] {
        let mut sums = [0.0_f64; 7];
        let mut counts = [0_usize; 7];
        for (day, revenue) in daily.buckets() {
            let index = weekday_index(*day);
            sums[index] += to_f64(*revenue);
            counts[index] += 1;
        }
        std::array::from_fn(|index| match counts[index] {
            0 => self.weekday_placeholder,
            count => sums[index] / count as f64,
        })
    }

    /// Each weekday average relative to the mean of all seven.
    pub fn seasonality_factors(averages: &[f64; 7]) -> [f64; 7] {
        let mean = averages.iter().sum::<f64>() / averages.len() as f64;
        std::array::from_fn(|index| {
            if mean > 0.0 {
                averages[index] / mean
            } else {
                1.0
            }
        })
    }

    /// Actuals up to today, then run rate times weekday seasonality through
    /// the end of the month.
    pub fn month_to_date(&self, daily: &DailyRevenue, today: NaiveDate) -> Vec<ForecastPoint> {
        let factors = Self::seasonality_factors(&self.weekday_averages(daily));
        let month_start = calendar::first_of_month(today);
        let elapsed_days = f64::from(today.day()).max(1.0);
        let run_rate = to_f64(daily.revenue_between(month_start, today)) / elapsed_days;
        debug!(run_rate, "month-to-date run rate");

        calendar::days_of_month(today)
            .into_iter()
            .map(|day| {
                let label = calendar::day_label(day);
                if day < today {
                    ForecastPoint::actual(label, daily.revenue_on(day))
                } else if day == today {
                    ForecastPoint::connecting(label, daily.revenue_on(day))
                } else {
                    ForecastPoint::forecast(label, run_rate * factors[weekday_index(day)])
                }
            })
            .collect()
    }

    /// Twelve compounded weekly points, `"Week 1"` to `"Week 12"`.
    pub fn weekly_horizon(&self, baseline: f64, growth: f64) -> Vec<ForecastPoint> {
        compound(baseline, growth, THREE_MONTH_POINTS)
            .into_iter()
            .enumerate()
            .map(|(index, value)| ForecastPoint::forecast(format!("Week {}", index + 1), value))
            .collect()
    }

    /// Six compounded monthly points labelled from next month onward.
    pub fn monthly_horizon(
        &self,
        baseline: f64,
        growth: f64,
        today: NaiveDate,
    ) -> Vec<ForecastPoint> {
        let months = calendar::months_after(today, SIX_MONTH_POINTS);
        compound(baseline, growth, months.len())
            .into_iter()
            .zip(months)
            .map(|(value, (year, month))| {
                ForecastPoint::forecast(
                    format!("{} {}", calendar::month_abbreviation(month), year),
                    value,
                )
            })
            .collect()
    }
}
