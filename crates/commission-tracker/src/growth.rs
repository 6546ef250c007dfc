//! Period-over-period commission growth

use chrono::{DateTime, TimeZone};

use crate::aggregate::total_commission;
use crate::entries::SaleEntry;
use crate::period::{StaffFilter, ViewMode, filter_entries};

/// Percentage change from `previous` to `current`.
///
/// A jump from nothing counts as +100%; nothing to nothing is 0%.
pub fn growth_between(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        if current > 0.0 { 100.0 } else { 0.0 }
    } else {
        (current - previous) / previous * 100.0
    }
}

/// Commission growth of the current view against the preceding period.
///
/// `entries` must be the unfiltered set: the previous period lies outside the
/// current view. Returns `None` for views without a preceding period.
pub fn growth_percent<Tz: TimeZone>(
    entries: &[SaleEntry],
    mode: ViewMode,
    staff: &StaffFilter,
    reference: &DateTime<Tz>,
) -> Option<f64> {
    let previous_period = mode.previous_period(reference)?;
    let current_period = mode.current_period(reference);

    let current = total_commission(filter_entries(entries, &current_period, staff));
    let previous = total_commission(filter_entries(entries, &previous_period, staff));

    Some(growth_between(current, previous))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::EntryId;
    use chrono::{FixedOffset, Utc};

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    /// Thursday 2025-06-12 09:30 at UTC+1
    fn reference() -> DateTime<FixedOffset> {
        tz().with_ymd_and_hms(2025, 6, 12, 9, 30, 0).unwrap()
    }

    fn entry(name: &str, amount: f64, day: (i32, u32, u32)) -> SaleEntry {
        SaleEntry {
            id: EntryId::Number(0),
            staff_name: name.to_string(),
            sales_amount: amount,
            commission_rate: Some(0.5),
            service_type: None,
            timestamp: tz()
                .with_ymd_and_hms(day.0, day.1, day.2, 12, 0, 0)
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn test_growth_formula() {
        assert_eq!(growth_between(150.0, 100.0), 50.0);
        assert_eq!(growth_between(50.0, 100.0), -50.0);
        assert_eq!(growth_between(10.0, 0.0), 100.0);
        assert_eq!(growth_between(0.0, 0.0), 0.0);
        assert_eq!(growth_between(1000.0, 10.0), 9900.0);
    }

    #[test]
    fn test_daily_compares_with_yesterday() {
        let entries = vec![
            entry("Ana", 300.0, (2025, 6, 12)),
            entry("Ana", 200.0, (2025, 6, 11)),
            entry("Ana", 999.0, (2025, 6, 10)),
        ];
        let growth = growth_percent(&entries, ViewMode::Daily, &StaffFilter::default(), &reference());
        assert_eq!(growth, Some(50.0));
    }

    #[test]
    fn test_weekly_previous_week_is_bounded() {
        // week of 2025-06-08 (Sunday) is current; 06-01..06-07 is previous
        let entries = vec![
            entry("Ana", 100.0, (2025, 6, 8)),
            entry("Ana", 100.0, (2025, 6, 12)),
            entry("Ana", 200.0, (2025, 6, 1)),
            entry("Ana", 500.0, (2025, 5, 31)),
        ];
        let growth = growth_percent(&entries, ViewMode::Weekly, &StaffFilter::default(), &reference());
        assert_eq!(growth, Some(0.0));
    }

    #[test]
    fn test_growth_respects_staff_filter() {
        let entries = vec![
            entry("Ana", 100.0, (2025, 6, 12)),
            entry("Bea", 400.0, (2025, 6, 11)),
        ];
        let only_ana = StaffFilter::new(["Ana"]);
        assert_eq!(
            growth_percent(&entries, ViewMode::Daily, &only_ana, &reference()),
            Some(100.0)
        );
        assert_eq!(
            growth_percent(&entries, ViewMode::Daily, &StaffFilter::default(), &reference()),
            Some(-75.0)
        );
    }

    #[test]
    fn test_all_view_has_no_growth() {
        let entries = vec![entry("Ana", 100.0, (2025, 6, 12))];
        assert_eq!(
            growth_percent(&entries, ViewMode::All, &StaffFilter::default(), &reference()),
            None
        );
    }
}
