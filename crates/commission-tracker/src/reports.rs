//! Report generation (CSV exports and console output)

use anyhow::Result;
use chrono::{DateTime, NaiveDate, TimeZone};
use csv::Writer;
use std::io;
use std::path::{Path, PathBuf};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::aggregate::{StaffRollup, Totals, per_staff_rollup};
use crate::avatar::initial;
use crate::calendar::{day_badges, days_in_month, month_summary};
use crate::constants;
use crate::entries::{SaleEntry, commission, rate_label};
use crate::growth::growth_percent;
use crate::money::{format_amount, format_usd, round2};
use crate::period::{StaffFilter, ViewMode, filter_view};

/// CSV column layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    /// Stored rate and commission per entry
    #[default]
    Rates,
    /// Fixed 70% and 60% columns side by side
    Legacy,
}

const LEGACY_HEADER: [&str; 5] = [
    "Staff Name",
    "Sales Amount",
    "70% Commission",
    "60% Commission",
    "Date",
];

const RATES_HEADER: [&str; 6] = [
    "Date",
    "Staff Name",
    "Service",
    "Sales Amount",
    "Commission Rate",
    "Commission",
];

/// Everything shown for one view: visible entries, totals, growth, leaderboard
pub struct ViewReport<'a> {
    pub mode: ViewMode,
    pub entries: Vec<&'a SaleEntry>,
    pub totals: Totals,
    /// `None` for views without a preceding period
    pub growth: Option<f64>,
    pub rollup: Vec<StaffRollup>,
}

impl<'a> ViewReport<'a> {
    pub fn build<Tz: TimeZone>(
        entries: &'a [SaleEntry],
        staff: &[String],
        mode: ViewMode,
        filter: &StaffFilter,
        reference: &DateTime<Tz>,
    ) -> Self {
        let visible = filter_view(entries, mode, reference, filter);
        let totals = Totals::from_entries(visible.iter().copied());
        let growth = growth_percent(entries, mode, filter, reference);

        // Leaderboard rows only for the staff the filter lets through
        let shown: Vec<String> = if filter.is_empty() {
            staff.to_vec()
        } else {
            staff.iter().filter(|s| filter.allows(s)).cloned().collect()
        };
        let rollup = per_staff_rollup(visible.iter().copied(), &shown);

        Self {
            mode,
            entries: visible,
            totals,
            growth,
            rollup,
        }
    }
}

// =============================================================================
// CSV Export
// =============================================================================

/// `{prefix}_{view}_{YYYY-MM-DD}.csv` inside `output_dir`
pub fn export_path(output_dir: &Path, prefix: &str, mode: ViewMode, date: NaiveDate) -> PathBuf {
    output_dir.join(format!(
        "{}_{}_{}.csv",
        prefix,
        mode,
        date.format(constants::DATE_FORMAT)
    ))
}

/// Write `entries` in `format` to a new file at `path`
pub fn export_csv<Tz: TimeZone>(
    path: &Path,
    format: ExportFormat,
    entries: &[&SaleEntry],
    tz: &Tz,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;

    match format {
        ExportFormat::Legacy => write_legacy_csv(file, entries, tz)?,
        ExportFormat::Rates => write_rates_csv(file, entries, tz)?,
    }

    println!("  Generated: {}", path.display());
    Ok(())
}

/// Legacy layout: both fixed-rate commissions, regardless of the stored rate
pub fn write_legacy_csv<W: io::Write, Tz: TimeZone>(
    out: W,
    entries: &[&SaleEntry],
    tz: &Tz,
) -> Result<()> {
    let mut wtr = Writer::from_writer(out);
    wtr.write_record(LEGACY_HEADER)?;

    for entry in entries {
        wtr.write_record([
            entry.staff_name.as_str(),
            &format_amount(entry.sales_amount),
            &format_amount(entry.sales_amount * constants::LEGACY_HIGH_RATE),
            &format_amount(entry.sales_amount * constants::LEGACY_LOW_RATE),
            &local_date(entry, tz),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Rate-aware layout: one commission column at the entry's effective rate
pub fn write_rates_csv<W: io::Write, Tz: TimeZone>(
    out: W,
    entries: &[&SaleEntry],
    tz: &Tz,
) -> Result<()> {
    let mut wtr = Writer::from_writer(out);
    wtr.write_record(RATES_HEADER)?;

    for entry in entries {
        wtr.write_record([
            local_date(entry, tz).as_str(),
            &entry.staff_name,
            entry.service_type.as_deref().unwrap_or(""),
            &format_amount(entry.sales_amount),
            &rate_label(entry),
            &format_amount(commission(entry)),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn local_date<Tz: TimeZone>(entry: &SaleEntry, tz: &Tz) -> String {
    entry
        .timestamp
        .with_timezone(tz)
        .date_naive()
        .format(constants::DATE_FORMAT)
        .to_string()
}

// =============================================================================
// Console Output
// =============================================================================

#[derive(Tabled)]
struct RollupRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "")]
    avatar: String,
    #[tabled(rename = "Staff")]
    name: String,
    #[tabled(rename = "Services")]
    services: usize,
    #[tabled(rename = "Commission")]
    commission: String,
    #[tabled(rename = "")]
    badge: &'static str,
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Staff")]
    staff: String,
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Sales")]
    sales: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Commission")]
    commission: String,
}

fn view_title(mode: ViewMode) -> &'static str {
    match mode {
        ViewMode::Daily => "TODAY'S PERFORMANCE",
        ViewMode::Weekly => "THIS WEEK'S PERFORMANCE",
        ViewMode::All => "ALL TIME PERFORMANCE",
    }
}

/// "+12.5% vs last week", or the all-time caption when there is no prior period
pub fn growth_line(mode: ViewMode, growth: Option<f64>) -> String {
    match (mode, growth) {
        (ViewMode::Daily, Some(g)) => format!("{:+.1}% vs last day", g),
        (ViewMode::Weekly, Some(g)) => format!("{:+.1}% vs last week", g),
        _ => "All time earnings".to_string(),
    }
}

/// Print headline totals and the staff leaderboard
pub fn print_summary(report: &ViewReport) {
    println!("\n============================================================");
    println!("                 {}", view_title(report.mode));
    println!("============================================================\n");

    println!(
        "  Total Commission:   {:>12}",
        format_usd(report.totals.display_commission())
    );
    println!("  {}", growth_line(report.mode, report.growth));
    println!(
        "  Total Sales:        {:>12}",
        format_usd(report.totals.display_sales())
    );
    println!("  {} services performed", report.totals.count);

    if report.rollup.is_empty() {
        println!("\n  No staff members yet.");
        return;
    }

    let rows: Vec<RollupRow> = report
        .rollup
        .iter()
        .enumerate()
        .map(|(i, r)| RollupRow {
            rank: i + 1,
            avatar: initial(&r.name),
            name: r.name.clone(),
            services: r.service_count,
            commission: format_usd(r.commission_total),
            badge: if r.top_performer { "Top performer" } else { "" },
        })
        .collect();

    println!("\nTEAM PERFORMANCE:");
    println!("{}", Table::new(rows).with(Style::rounded()));
}

/// Print entries oldest first
pub fn print_entries<Tz: TimeZone>(entries: &[&SaleEntry], tz: &Tz) {
    if entries.is_empty() {
        println!("No entries in this view.");
        return;
    }

    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|e| EntryRow {
            id: e.id.to_string(),
            date: local_date(e, tz),
            staff: e.staff_name.clone(),
            service: e.service_type.clone().unwrap_or_default(),
            sales: format_usd(e.sales_amount),
            rate: rate_label(e),
            commission: format_usd(commission(e)),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
}

/// Print every day of the month that has entries, then the month totals
pub fn print_calendar<Tz: TimeZone>(entries: &[SaleEntry], year: i32, month: u32, tz: &Tz) {
    println!("\n============================================================");
    println!("                 CALENDAR {:04}-{:02}", year, month);
    println!("============================================================\n");

    for date in days_in_month(year, month) {
        let badges = day_badges(entries, date, tz);
        if badges.is_empty() {
            continue;
        }

        println!("{}", date.format("%a %Y-%m-%d"));
        for badge in &badges {
            println!(
                "  [{}] {:<16} {:>10} ({}) {}",
                paint(&initial(badge.staff_name), badge.color.foreground),
                badge.staff_name,
                format_usd(badge.commission),
                badge.rate_label,
                badge.entry.service_type.as_deref().unwrap_or("")
            );
        }
    }

    let summary = month_summary(entries, year, month, tz);
    println!("\n  {} entries", summary.count);
    println!(
        "  Monthly commission: {}",
        format_usd(round2(summary.total_commission))
    );
}

/// Wrap `text` in a 24-bit ANSI foreground color given as `#rrggbb`
fn paint(text: &str, hex: &str) -> String {
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
    };
    match (hex.starts_with('#'), channel(1), channel(3), channel(5)) {
        (true, Some(r), Some(g), Some(b)) => {
            format!("\x1b[38;2;{};{};{}m{}\x1b[0m", r, g, b, text)
        }
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::EntryId;
    use chrono::{FixedOffset, Utc};

    fn tz() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn entry(id: i64, name: &str, amount: f64, rate: Option<f64>, day: u32) -> SaleEntry {
        SaleEntry {
            id: EntryId::Number(id),
            staff_name: name.to_string(),
            sales_amount: amount,
            commission_rate: rate,
            service_type: None,
            timestamp: tz()
                .with_ymd_and_hms(2025, 3, day, 12, 0, 0)
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    fn csv_string<F>(write: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        let mut buf = Vec::new();
        write(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_legacy_csv_layout() {
        let e = entry(1, "Ana", 100.0, Some(0.6), 5);
        let out = csv_string(|buf| write_legacy_csv(buf, &[&e], &tz()));

        assert_eq!(
            out,
            "Staff Name,Sales Amount,70% Commission,60% Commission,Date\n\
             Ana,100.00,70.00,60.00,2025-03-05\n"
        );
    }

    #[test]
    fn test_rates_csv_uses_effective_rate_and_quotes_commas() {
        let mut styled = entry(1, "Ana", 45.0, Some(0.6), 4);
        styled.service_type = Some("Cut, Color".to_string());
        let plain = entry(2, "Bea", 33.33, None, 5);

        let out = csv_string(|buf| write_rates_csv(buf, &[&styled, &plain], &tz()));
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(
            lines[0],
            "Date,Staff Name,Service,Sales Amount,Commission Rate,Commission"
        );
        assert_eq!(lines[1], "2025-03-04,Ana,\"Cut, Color\",45.00,60%,27.00");
        assert_eq!(lines[2], "2025-03-05,Bea,,33.33,70%,23.33");
    }

    #[test]
    fn test_csv_dates_use_local_calendar_day() {
        // 23:30 at UTC-5 is already the next day in UTC
        let mut late = entry(1, "Ana", 10.0, None, 5);
        late.timestamp = tz()
            .with_ymd_and_hms(2025, 3, 5, 23, 30, 0)
            .unwrap()
            .with_timezone(&Utc);

        let out = csv_string(|buf| write_legacy_csv(buf, &[&late], &tz()));
        assert!(out.ends_with(",2025-03-05\n"));
        let out = csv_string(|buf| write_legacy_csv(buf, &[&late], &Utc));
        assert!(out.ends_with(",2025-03-06\n"));
    }

    #[test]
    fn test_paint_avatar_initial() {
        assert_eq!(paint("A", "#0369a1"), "\x1b[38;2;3;105;161mA\x1b[0m");
        assert_eq!(paint("A", "blue"), "A");
    }

    #[test]
    fn test_empty_export_is_header_only() {
        let out = csv_string(|buf| write_rates_csv(buf, &[], &tz()));
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn test_export_path() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        let path = export_path(Path::new("output"), "commissions", ViewMode::Weekly, date);
        assert_eq!(path, Path::new("output").join("commissions_weekly_2025-03-05.csv"));
    }

    #[test]
    fn test_growth_line() {
        assert_eq!(growth_line(ViewMode::Daily, Some(50.0)), "+50.0% vs last day");
        assert_eq!(growth_line(ViewMode::Weekly, Some(-75.0)), "-75.0% vs last week");
        assert_eq!(growth_line(ViewMode::All, None), "All time earnings");
    }

    #[test]
    fn test_view_report_combines_filter_totals_and_growth() {
        let entries = vec![
            entry(1, "Ana", 100.0, None, 5),
            entry(2, "Bea", 50.0, Some(0.6), 5),
            entry(3, "Ana", 40.0, None, 4),
            entry(4, "Cy", 10.0, None, 5),
        ];
        let staff = vec!["Ana".to_string(), "Bea".to_string()];
        let reference = tz().with_ymd_and_hms(2025, 3, 5, 18, 0, 0).unwrap();

        let report = ViewReport::build(
            &entries,
            &staff,
            ViewMode::Daily,
            &StaffFilter::default(),
            &reference,
        );

        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.totals.count, 3);
        assert_eq!(report.totals.total_commission, 70.0 + 30.0 + 7.0);
        // Today 107 vs yesterday 28
        let growth = report.growth.unwrap();
        assert!((growth - (107.0 - 28.0) / 28.0 * 100.0).abs() < 1e-9);

        // Removed staff count toward totals but get no leaderboard row
        let names: Vec<&str> = report.rollup.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Bea"]);
        assert!(report.rollup[0].top_performer);

        let filtered = ViewReport::build(
            &entries,
            &staff,
            ViewMode::All,
            &StaffFilter::new(["Bea"]),
            &reference,
        );
        assert_eq!(filtered.totals.count, 1);
        assert_eq!(filtered.growth, None);
        assert_eq!(filtered.rollup.len(), 1);
        assert_eq!(filtered.rollup[0].name, "Bea");
    }
}
