//! Stock aggregation over the inventory movement log
//!
//! `current_stock = Σ debit − Σ credit` over the movements that pass the
//! report filters, grouped according to the query shape.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use shared::{InventoryMovement, Item, Site};

use super::enrichment::selected_sites_display;
use super::query::{multi_site_key, DegradationPolicy, QueryShape, ReportFilter};
use crate::error::{ReportError, ReportResult};

/// Stock totals for one output row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockTotals {
    pub site: String,
    pub item: String,
    /// Display list of the selected sites; empty except on synthetic rows
    pub selected_sites: String,
    pub total_in: Decimal,
    pub total_out: Decimal,
    pub current_stock: Decimal,
    pub stock_transactions: u64,
}

/// Aggregated stock rows plus the row count before truncation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAggregate {
    pub rows: Vec<StockTotals>,
    pub ungated_row_count: usize,
}

impl StockAggregate {
    pub fn is_truncated(&self) -> bool {
        self.rows.len() < self.ungated_row_count
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    debit: Decimal,
    credit: Decimal,
    count: u64,
}

impl Tally {
    // saturating: a garbage quantity must not abort the report
    fn add(&mut self, movement: &InventoryMovement) {
        self.debit = self.debit.saturating_add(movement.debit());
        self.credit = self.credit.saturating_add(movement.credit());
        self.count += 1;
    }

    fn of<'a>(movements: impl IntoIterator<Item = &'a InventoryMovement>) -> Self {
        let mut tally = Tally::default();
        for movement in movements {
            tally.add(movement);
        }
        tally
    }

    fn into_totals(self, site: String, item: String, selected_sites: String) -> StockTotals {
        StockTotals {
            site,
            item,
            selected_sites,
            total_in: self.debit,
            total_out: self.credit,
            current_stock: self.debit.saturating_sub(self.credit),
            stock_transactions: self.count,
        }
    }
}

/// Σ debit − Σ credit for every item over the given sites, ignoring report
/// filters
pub fn net_quantity_by_item<'a>(
    movements: &'a [InventoryMovement],
    sites: &HashSet<&str>,
) -> BTreeMap<&'a str, Decimal> {
    let mut totals: BTreeMap<&str, Decimal> = BTreeMap::new();
    for movement in movements.iter().filter(|m| sites.contains(m.site.as_str())) {
        let total = totals.entry(movement.item.as_str()).or_default();
        *total = total.saturating_add(movement.debit().saturating_sub(movement.credit()));
    }
    totals
}

/// Aggregate the movement log into stock rows for `filter`.
///
/// Any filter that leaves no movements yields [`ReportError::NoMatchingRows`].
/// `items` resolves the category filter; `sites` supplies display names for
/// synthetic multi-site rows.
pub fn aggregate_stock(
    movements: Option<&[InventoryMovement]>,
    items: Option<&[Item]>,
    sites: Option<&[Site]>,
    filter: &ReportFilter,
    policy: &DegradationPolicy,
) -> ReportResult<StockAggregate> {
    let movements = movements
        .ok_or_else(|| ReportError::no_match("inventory transactions are not loaded"))?;
    let selected = select_movements(movements, items, filter)?;
    tracing::debug!(movements = selected.len(), "Stock movements selected");

    let mut rows = match filter.shape() {
        QueryShape::ByItemSite { item, site } => by_item_site(&selected, item, site),
        QueryShape::ByItem { item } => by_item(&selected, &item),
        QueryShape::BySite { site } => by_site(&selected, &site),
        QueryShape::ByMultiSite { item, sites: codes } => {
            by_multi_site(&selected, item, &codes, sites)
        }
        QueryShape::ByAll => by_all(&selected),
    };

    let ungated_row_count = rows.len();
    if let Some(limit) = policy.stock_row_limit {
        if rows.len() > limit {
            tracing::info!(
                rows = rows.len(),
                limit,
                "Large stock result; keeping rows with the highest current stock"
            );
            // stable: ties keep their grouping order
            rows.sort_by(|a, b| b.current_stock.cmp(&a.current_stock));
            rows.truncate(limit);
        }
    }

    Ok(StockAggregate {
        rows,
        ungated_row_count,
    })
}

fn select_movements<'a>(
    movements: &'a [InventoryMovement],
    items: Option<&[Item]>,
    filter: &ReportFilter,
) -> ReportResult<Vec<&'a InventoryMovement>> {
    let mut selected: Vec<&InventoryMovement> = match filter.as_of_date {
        // movements without a usable date cannot be placed before the cut-off
        Some(as_of) => movements
            .iter()
            .filter(|m| m.date.is_some_and(|date| date <= as_of))
            .collect(),
        None => movements.iter().collect(),
    };

    if let Some(item) = &filter.item_code {
        selected.retain(|m| &m.item == item);
        if selected.is_empty() {
            return Err(ReportError::no_match(format!(
                "no stock transactions found for item {}",
                item
            )));
        }
    }

    if let Some(site) = &filter.site_code {
        selected.retain(|m| &m.site == site);
        if selected.is_empty() {
            return Err(ReportError::no_match(format!(
                "no stock transactions found for site {}",
                site
            )));
        }
    }

    if !filter.site_codes.is_empty() {
        selected.retain(|m| filter.site_codes.contains(&m.site));
        if selected.is_empty() {
            return Err(ReportError::no_match(format!(
                "no stock transactions found for sites {}",
                filter.site_codes.join(", ")
            )));
        }
    }

    if let Some(category) = &filter.category_id {
        let items = items.ok_or_else(|| {
            ReportError::no_match("item master is not loaded; cannot filter by category")
        })?;
        let in_category: HashSet<&str> = items
            .iter()
            .filter(|item| item.category_id.as_deref() == Some(category.as_str()))
            .map(|item| item.code.as_str())
            .collect();
        if in_category.is_empty() {
            return Err(ReportError::no_match(format!(
                "no items found in category {}",
                category
            )));
        }

        selected.retain(|m| in_category.contains(m.item.as_str()));
        if selected.is_empty() {
            return Err(ReportError::no_match(format!(
                "no stock transactions found for items in category {}",
                category
            )));
        }
    }

    Ok(selected)
}

fn by_item_site(movements: &[&InventoryMovement], item: String, site: String) -> Vec<StockTotals> {
    let tally = Tally::of(movements.iter().copied());
    vec![tally.into_totals(site, item, String::new())]
}

fn by_item(movements: &[&InventoryMovement], item: &str) -> Vec<StockTotals> {
    let mut by_site: BTreeMap<&str, Tally> = BTreeMap::new();
    for movement in movements {
        by_site.entry(movement.site.as_str()).or_default().add(movement);
    }
    by_site
        .into_iter()
        .map(|(site, tally)| tally.into_totals(site.to_string(), item.to_string(), String::new()))
        .collect()
}

fn by_site(movements: &[&InventoryMovement], site: &str) -> Vec<StockTotals> {
    let mut by_item: BTreeMap<&str, Tally> = BTreeMap::new();
    for movement in movements {
        by_item.entry(movement.item.as_str()).or_default().add(movement);
    }
    by_item
        .into_iter()
        .map(|(item, tally)| tally.into_totals(site.to_string(), item.to_string(), String::new()))
        .collect()
}

fn by_multi_site(
    movements: &[&InventoryMovement],
    item: Option<String>,
    site_codes: &[String],
    sites: Option<&[Site]>,
) -> Vec<StockTotals> {
    let key = multi_site_key(site_codes.len());
    let display = selected_sites_display(site_codes, sites);

    match item {
        Some(item) => {
            let tally = Tally::of(movements.iter().copied());
            vec![tally.into_totals(key, item, display)]
        }
        None => {
            let mut by_item: BTreeMap<&str, Tally> = BTreeMap::new();
            for movement in movements {
                by_item.entry(movement.item.as_str()).or_default().add(movement);
            }
            by_item
                .into_iter()
                .map(|(item, tally)| tally.into_totals(key.clone(), item.to_string(), display.clone()))
                .collect()
        }
    }
}

fn by_all(movements: &[&InventoryMovement]) -> Vec<StockTotals> {
    let mut by_key: BTreeMap<(&str, &str), Tally> = BTreeMap::new();
    for movement in movements {
        by_key
            .entry((movement.site.as_str(), movement.item.as_str()))
            .or_default()
            .add(movement);
    }
    by_key
        .into_iter()
        .map(|((site, item), tally)| {
            tally.into_totals(site.to_string(), item.to_string(), String::new())
        })
        .collect()
}
