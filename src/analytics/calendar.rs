//! Calendar helpers and the day boundary policy.
//!
//! Every stage that buckets by day, weekday, hour or month goes through a
//! single [`DayBoundary`]: a timestamp belongs to the calendar day (and hour)
//! it falls on when viewed at one fixed UTC offset. The default offset is zero,
//! so out of the box a "day" is a UTC day.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, Offset, Timelike, Utc};

pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayBoundary {
    offset: FixedOffset,
}

impl Default for DayBoundary {
    fn default() -> Self {
        Self { offset: Utc.fix() }
    }
}

impl DayBoundary {
    /// Day boundary at `minutes` east of UTC; `None` if the offset is out of range.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Calendar day `ts` falls on.
    pub fn day_of(&self, ts: &DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.offset).date_naive()
    }

    /// Hour of day (0-23) of `ts`.
    pub fn hour_of(&self, ts: &DateTime<Utc>) -> u32 {
        ts.with_timezone(&self.offset).hour()
    }
}

/// The Monday starting the week that contains `date`.
/// Dates in the first days of the calendar range with no representable
/// Monday are their own week start.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
        .unwrap_or(date)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Every day of the month containing `date`, in order.
pub fn days_of_month(date: NaiveDate) -> Vec<NaiveDate> {
    let first = first_of_month(date);
    first
        .iter_days()
        .take_while(|day| day.month() == first.month())
        .collect()
}

/// Weekday index with Sunday = 0 through Saturday = 6.
pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_sunday() as usize
}

/// The `count` calendar months following the month of `date`, as
/// `(year, month)` pairs with `month` in 1..=12.
pub fn months_after(date: NaiveDate, count: u32) -> Vec<(i32, u32)> {
    (1..=count)
        .map(|step| {
            let index = date.month0() + step;
            let year = date.year() + (index / 12) as i32;
            (year, index % 12 + 1)
        })
        .collect()
}

pub fn month_abbreviation(month: u32) -> &'static str {
    MONTH_ABBREVIATIONS[(month.saturating_sub(1) % 12) as usize]
}

/// Short label for a single day, e.g. `"Oct 14"`.
pub fn day_label(date: NaiveDate) -> String {
    format!("{} {}", month_abbreviation(date.month()), date.day())
}
