//! Totals and per-staff rollups over an already filtered entry set

use std::collections::HashMap;

use crate::entries::{SaleEntry, commission};
use crate::money::round2;

/// Headline numbers for a view
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    /// Full-precision sum; round only for display
    pub total_sales: f64,
    /// Sum of per-entry commissions, each already rounded to cents
    pub total_commission: f64,
    pub count: usize,
}

impl Totals {
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a SaleEntry>,
    {
        entries.into_iter().fold(Totals::default(), |mut acc, e| {
            acc.total_sales += e.sales_amount;
            acc.total_commission += commission(e);
            acc.count += 1;
            acc
        })
    }

    pub fn display_sales(&self) -> f64 {
        round2(self.total_sales)
    }

    pub fn display_commission(&self) -> f64 {
        round2(self.total_commission)
    }
}

/// Sum of per-entry commissions (the figure growth is measured on)
pub fn total_commission<'a, I>(entries: I) -> f64
where
    I: IntoIterator<Item = &'a SaleEntry>,
{
    entries.into_iter().map(commission).sum()
}

/// One row of the team leaderboard
#[derive(Debug, Clone, PartialEq)]
pub struct StaffRollup {
    pub name: String,
    pub commission_total: f64,
    pub service_count: usize,
    /// Highest non-zero commission in the view
    pub top_performer: bool,
}

/// One row per name in `staff`, highest commission first.
///
/// Ties keep the order of `staff`. Entries whose name is not in `staff`
/// (removed staff) are not given a row.
pub fn per_staff_rollup<'a, I>(entries: I, staff: &[String]) -> Vec<StaffRollup>
where
    I: IntoIterator<Item = &'a SaleEntry>,
{
    let mut by_name: HashMap<&str, (f64, usize)> = HashMap::new();
    for entry in entries {
        let slot = by_name.entry(entry.staff_name.as_str()).or_insert((0.0, 0));
        slot.0 += commission(entry);
        slot.1 += 1;
    }

    let mut rows: Vec<StaffRollup> = staff
        .iter()
        .map(|name| {
            let (commission_total, service_count) =
                by_name.get(name.as_str()).copied().unwrap_or((0.0, 0));
            StaffRollup {
                name: name.clone(),
                commission_total,
                service_count,
                top_performer: false,
            }
        })
        .collect();

    // sort_by is stable, so equal totals stay in staff-list order
    rows.sort_by(|a, b| b.commission_total.total_cmp(&a.commission_total));

    if let Some(first) = rows.first_mut() {
        first.top_performer = first.commission_total > 0.0;
    }

    rows
}
