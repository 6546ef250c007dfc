//! Time windows and staff filters applied before aggregation
//!
//! Every window is resolved against an explicit reference instant in the
//! caller's time zone. Nothing in here reads the wall clock.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use std::collections::HashSet;
use std::fmt;

use crate::constants;
use crate::entries::SaleEntry;

/// Granularity selected for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ViewMode {
    /// Today only
    #[default]
    Daily,
    /// From Sunday 00:00 of the current week onwards
    Weekly,
    /// No date constraint
    All,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Daily => write!(f, "daily"),
            ViewMode::Weekly => write!(f, "weekly"),
            ViewMode::All => write!(f, "all"),
        }
    }
}

/// A resolved window that entries are tested against
#[derive(Debug, Clone, PartialEq)]
pub enum Period<Tz: TimeZone> {
    /// One calendar day in the given zone
    Day(NaiveDate, Tz),
    /// Open-ended: at or after the instant
    Since(DateTime<Utc>),
    /// Half-open `[start, end)`
    Between(DateTime<Utc>, DateTime<Utc>),
    AllTime,
}

impl<Tz: TimeZone> Period<Tz> {
    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        match self {
            Period::Day(date, tz) => ts.with_timezone(tz).date_naive() == *date,
            Period::Since(start) => ts >= start,
            Period::Between(start, end) => ts >= start && ts < end,
            Period::AllTime => true,
        }
    }
}

impl ViewMode {
    /// Window shown for this view at `reference`
    pub fn current_period<Tz: TimeZone>(&self, reference: &DateTime<Tz>) -> Period<Tz> {
        let tz = reference.timezone();
        let today = reference.date_naive();

        match self {
            ViewMode::Daily => Period::Day(today, tz),
            ViewMode::Weekly => Period::Since(local_midnight(&tz, week_start(today))),
            ViewMode::All => Period::AllTime,
        }
    }

    /// The preceding window of the same granularity, if the view has one.
    ///
    /// The previous week is a closed Sunday-to-Sunday window even though the
    /// current week is open-ended.
    pub fn previous_period<Tz: TimeZone>(&self, reference: &DateTime<Tz>) -> Option<Period<Tz>> {
        let tz = reference.timezone();
        let today = reference.date_naive();

        match self {
            ViewMode::Daily => today.pred_opt().map(|yesterday| Period::Day(yesterday, tz)),
            ViewMode::Weekly => {
                let this_week = week_start(today);
                let last_week = this_week - TimeDelta::days(7);
                Some(Period::Between(
                    local_midnight(&tz, last_week),
                    local_midnight(&tz, this_week),
                ))
            }
            ViewMode::All => None,
        }
    }
}

/// Set of staff names to keep; empty keeps everyone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaffFilter {
    names: HashSet<String>,
}

impl StaffFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Exact, case-sensitive match
    pub fn allows(&self, staff_name: &str) -> bool {
        self.names.is_empty() || self.names.contains(staff_name)
    }
}

/// Entries inside `period` and allowed by `staff`, in source order
pub fn filter_entries<'a, Tz: TimeZone>(
    entries: &'a [SaleEntry],
    period: &Period<Tz>,
    staff: &StaffFilter,
) -> Vec<&'a SaleEntry> {
    entries
        .iter()
        .filter(|e| staff.allows(&e.staff_name) && period.contains(&e.timestamp))
        .collect()
}

/// Entries visible in `mode` at `reference`
pub fn filter_view<'a, Tz: TimeZone>(
    entries: &'a [SaleEntry],
    mode: ViewMode,
    reference: &DateTime<Tz>,
    staff: &StaffFilter,
) -> Vec<&'a SaleEntry> {
    filter_entries(entries, &mode.current_period(reference), staff)
}

/// Timestamp for a date-only input: 12:00 local, clear of any day boundary
pub fn noon_on<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let noon = date.and_time(NaiveTime::MIN) + TimeDelta::hours(constants::ENTRY_NOON_HOUR as i64);
    local_instant(tz, noon)
}

/// Sunday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - TimeDelta::days(date.weekday().num_days_from_sunday() as i64)
}

/// 00:00 local on `date`
pub fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    local_instant(tz, date.and_time(NaiveTime::MIN))
}

/// Resolve a wall-clock time in `tz`; times skipped by a DST jump move forward an hour
fn local_instant<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + TimeDelta::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::EntryId;
    use chrono::FixedOffset;

    fn tz() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    /// Wednesday 2025-03-05 15:00 at UTC-5
    fn reference() -> DateTime<FixedOffset> {
        tz().with_ymd_and_hms(2025, 3, 5, 15, 0, 0).unwrap()
    }

    fn entry(id: i64, name: &str, local: (i32, u32, u32, u32)) -> SaleEntry {
        let (y, m, d, h) = local;
        SaleEntry {
            id: EntryId::Number(id),
            staff_name: name.to_string(),
            sales_amount: 10.0,
            commission_rate: None,
            service_type: None,
            timestamp: tz()
                .with_ymd_and_hms(y, m, d, h, 0, 0)
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    fn ids(entries: &[&SaleEntry]) -> Vec<EntryId> {
        entries.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn test_daily_uses_local_calendar_day() {
        let entries = vec![
            entry(1, "Ana", (2025, 3, 5, 0)),
            entry(2, "Ana", (2025, 3, 5, 23)), // already 3/6 in UTC
            entry(3, "Ana", (2025, 3, 4, 23)),
        ];
        let out = filter_view(&entries, ViewMode::Daily, &reference(), &StaffFilter::default());
        assert_eq!(ids(&out), vec![EntryId::Number(1), EntryId::Number(2)]);
    }

    #[test]
    fn test_weekly_is_open_ended_from_sunday() {
        let entries = vec![
            entry(1, "Ana", (2025, 3, 1, 23)), // Saturday before
            entry(2, "Ana", (2025, 3, 2, 0)),  // Sunday 00:00, inclusive
            entry(3, "Ana", (2025, 3, 9, 12)), // next week, still included
        ];
        let out = filter_view(&entries, ViewMode::Weekly, &reference(), &StaffFilter::default());
        assert_eq!(ids(&out), vec![EntryId::Number(2), EntryId::Number(3)]);
    }

    #[test]
    fn test_all_preserves_order_and_length() {
        let entries = vec![
            entry(3, "Ana", (2025, 3, 5, 12)),
            entry(1, "Bea", (2024, 1, 1, 12)),
            entry(2, "Ana", (2026, 7, 7, 12)),
        ];
        let out = filter_view(&entries, ViewMode::All, &reference(), &StaffFilter::default());
        assert_eq!(
            ids(&out),
            vec![EntryId::Number(3), EntryId::Number(1), EntryId::Number(2)]
        );
    }

    #[test]
    fn test_staff_filter_is_exact() {
        let entries = vec![
            entry(1, "Ana", (2025, 3, 5, 12)),
            entry(2, "ana", (2025, 3, 5, 12)),
            entry(3, "Bea", (2025, 3, 5, 12)),
        ];
        let staff = StaffFilter::new(["Ana", "Bea"]);
        let out = filter_view(&entries, ViewMode::All, &reference(), &staff);
        assert_eq!(ids(&out), vec![EntryId::Number(1), EntryId::Number(3)]);
    }

    #[test]
    fn test_previous_periods() {
        let yesterday = ViewMode::Daily.previous_period(&reference()).unwrap();
        assert_eq!(
            yesterday,
            Period::Day(NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(), tz())
        );

        let last_week = ViewMode::Weekly.previous_period(&reference()).unwrap();
        let start = tz().with_ymd_and_hms(2025, 2, 23, 0, 0, 0).unwrap().with_timezone(&Utc);
        let end = tz().with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap().with_timezone(&Utc);
        assert_eq!(last_week, Period::Between(start, end));
        assert!(last_week.contains(&start));
        assert!(!last_week.contains(&end));

        assert_eq!(ViewMode::All.previous_period(&reference()), None);
    }

    #[test]
    fn test_week_start_on_sunday_is_same_day() {
        let sunday = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        assert_eq!(week_start(sunday), sunday);
        let saturday = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
        assert_eq!(week_start(saturday), sunday);
    }

    #[test]
    fn test_noon_on_stays_on_local_day() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        let ts = noon_on(date, &tz());
        assert_eq!(ts, "2025-03-05T17:00:00Z".parse::<DateTime<Utc>>().unwrap());
        assert_eq!(ts.with_timezone(&tz()).date_naive(), date);
    }
}
