//! Recency filter: hide items that stopped selling, except at depots

use std::collections::HashSet;

use chrono::{Months, NaiveDate};
use shared::{SalesLine, StockSalesRow};

use super::query::ReportFilter;
use super::sales::qualifying_lines;

/// What the recency filter did to a row set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecencyOutcome {
    Applied { kept: usize, dropped: usize },
    /// A depot was among the selected sites; every row kept
    DepotBypass,
    /// No sales table to judge recency from; every row kept
    SalesTableMissing,
}

/// Day `months` before `today`; only sales strictly after it count as recent
pub fn recency_cutoff(today: NaiveDate, months: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

/// Items with at least one qualifying sale after `cutoff`, at any site.
///
/// The window is measured from the current moment, so a sale dated on the
/// cutoff day itself already lies outside it.
pub fn items_with_recent_sales<'a>(
    sales: &'a [SalesLine],
    site_sales_prefix: &'a str,
    cutoff: NaiveDate,
) -> HashSet<&'a str> {
    qualifying_lines(sales, site_sales_prefix)
        .filter(|(_, date)| *date > cutoff)
        .map(|(line, _)| line.item.as_str())
        .collect()
}

/// Keep rows at depot sites and rows whose item sold recently.
///
/// The whole filter is bypassed when the report selects a depot site.
pub fn apply_recency_filter(
    rows: &mut Vec<StockSalesRow>,
    filter: &ReportFilter,
    depots: &HashSet<&str>,
    sales: Option<&[SalesLine]>,
    site_sales_prefix: &str,
    cutoff: NaiveDate,
) -> RecencyOutcome {
    if filter.selected_sites().any(|site| depots.contains(site)) {
        tracing::debug!("Depot selected; recency filter bypassed");
        return RecencyOutcome::DepotBypass;
    }
    let Some(sales) = sales else {
        return RecencyOutcome::SalesTableMissing;
    };

    let recent = items_with_recent_sales(sales, site_sales_prefix, cutoff);
    let before = rows.len();
    rows.retain(|row| depots.contains(row.site.as_str()) || recent.contains(row.item.as_str()));

    let outcome = RecencyOutcome::Applied {
        kept: rows.len(),
        dropped: before - rows.len(),
    };
    tracing::debug!(outcome = ?outcome, cutoff = %cutoff, "Recency filter applied");
    outcome
}
