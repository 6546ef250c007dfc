//! Calendar cells: per-day entry badges and per-month totals

use chrono::{Datelike, NaiveDate, TimeZone};

use crate::avatar::{AvatarColor, color_for};
use crate::entries::{SaleEntry, commission, rate_label};

/// One entry as shown inside a day cell
#[derive(Debug, Clone, PartialEq)]
pub struct DayBadge<'a> {
    pub entry: &'a SaleEntry,
    pub staff_name: &'a str,
    pub commission: f64,
    pub rate_label: String,
    pub color: AvatarColor,
}

/// Count and commission for one month cell
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonthSummary {
    pub count: usize,
    pub total_commission: f64,
}

/// Entries recorded on `date` (local), in source order
pub fn day_badges<'a, Tz: TimeZone>(
    entries: &'a [SaleEntry],
    date: NaiveDate,
    tz: &Tz,
) -> Vec<DayBadge<'a>> {
    entries
        .iter()
        .filter(|e| e.timestamp.with_timezone(tz).date_naive() == date)
        .map(|e| DayBadge {
            entry: e,
            staff_name: &e.staff_name,
            commission: commission(e),
            rate_label: rate_label(e),
            color: color_for(&e.staff_name),
        })
        .collect()
}

/// Totals for every entry in `year`-`month` (local)
pub fn month_summary<Tz: TimeZone>(
    entries: &[SaleEntry],
    year: i32,
    month: u32,
    tz: &Tz,
) -> MonthSummary {
    entries
        .iter()
        .filter(|e| {
            let local = e.timestamp.with_timezone(tz);
            local.year() == year && local.month() == month
        })
        .fold(MonthSummary::default(), |mut acc, e| {
            acc.count += 1;
            acc.total_commission += commission(e);
            acc
        })
}

/// Every date of `year`-`month`, or empty for an invalid month
pub fn days_in_month(year: i32, month: u32) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|d| d.month() == month)
        .collect()
}
