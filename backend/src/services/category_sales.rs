//! Per-site sales of one keyword-selected category across the retail region

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{
    Category, CategorySalesMetadata, CategorySalesReport, CategorySalesRow, ItemSummary, SalesLine,
    SalesLineKind,
};

use super::query::EngineSettings;
use crate::error::{ReportError, ReportResult};
use crate::snapshot::Tables;

/// First category whose name contains a keyword, keywords tried in order
pub fn find_category<'a>(categories: &'a [Category], keywords: &[String]) -> Option<&'a Category> {
    keywords.iter().find_map(|keyword| {
        let keyword = keyword.to_lowercase();
        categories
            .iter()
            .find(|category| category.name.to_lowercase().contains(&keyword))
    })
}

/// Sales lines counted by this report: plain sales at retail sites within the dates
fn counted_sales<'a>(
    sales: &'a [SalesLine],
    settings: &'a EngineSettings,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> impl Iterator<Item = &'a SalesLine> + 'a {
    sales.iter().filter(move |line| {
        let in_window = match (from, to) {
            (None, None) => true,
            _ => line.date.is_some_and(|date| {
                from.map_or(true, |from| date >= from) && to.map_or(true, |to| date <= to)
            }),
        };
        in_window
            && line.kind() == SalesLineKind::Sale
            && line.sid_starts_with(&settings.site_sales_prefix)
    })
}

pub fn category_sales_report(
    tables: &Tables,
    settings: &EngineSettings,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> ReportResult<CategorySalesReport> {
    let sites = tables
        .sites()
        .ok_or_else(|| ReportError::no_match("sites table is not loaded"))?;
    let mut retail_sites: Vec<_> = sites
        .iter()
        .filter(|site| site.in_group(&settings.retail_group_code))
        .collect();
    if retail_sites.is_empty() {
        return Err(ReportError::no_match(format!(
            "no sites found in group {}",
            settings.retail_group_code
        )));
    }

    let categories = tables
        .categories()
        .ok_or_else(|| ReportError::no_match("categories table is not loaded"))?;
    let category = find_category(categories, &settings.category_report_keywords).ok_or_else(|| {
        ReportError::no_match(format!(
            "no category matching {}",
            settings.category_report_keywords.join(" or ")
        ))
    })?;

    let items = tables
        .items()
        .ok_or_else(|| ReportError::no_match("item master is not loaded"))?;
    let mut category_items: Vec<&str> = Vec::new();
    let mut prices: HashMap<&str, Decimal> = HashMap::new();
    let mut names: HashMap<&str, &str> = HashMap::new();
    for item in items
        .iter()
        .filter(|item| item.category_id.as_deref() == Some(category.id.as_str()))
    {
        if !prices.contains_key(item.code.as_str()) {
            category_items.push(&item.code);
            prices.insert(&item.code, item.unit_price.unwrap_or(Decimal::ZERO));
            names.insert(&item.code, &item.name);
        }
    }
    if category_items.is_empty() {
        return Err(ReportError::no_match(format!(
            "no items found in category {}",
            category.name
        )));
    }
    tracing::debug!(
        category = %category.name,
        sites = retail_sites.len(),
        items = category_items.len(),
        "Category sales report inputs resolved"
    );

    let in_category: HashSet<&str> = category_items.iter().copied().collect();
    let in_region: HashSet<&str> = retail_sites.iter().map(|site| site.id.as_str()).collect();
    // (site, item) -> quantity, retail sites only
    let mut quantities: HashMap<(&str, &str), Decimal> = HashMap::new();
    let active_items: Vec<&str> = match tables.sales() {
        Some(sales) => {
            let mut sold: HashMap<&str, Decimal> = HashMap::new();
            for line in counted_sales(sales, settings, from, to) {
                if in_category.contains(line.item.as_str()) && in_region.contains(line.site.as_str())
                {
                    let qty = line.quantity();
                    let sold_total = sold.entry(line.item.as_str()).or_default();
                    *sold_total = sold_total.saturating_add(qty);
                    let site_total = quantities
                        .entry((line.site.as_str(), line.item.as_str()))
                        .or_default();
                    *site_total = site_total.saturating_add(qty);
                }
            }
            // an item is shown only if the region sold a positive total of it
            category_items
                .iter()
                .copied()
                .filter(|code| sold.get(code).is_some_and(|total| *total > Decimal::ZERO))
                .collect()
        }
        None => {
            tracing::warn!("Sales table not loaded; showing every category item with zero sales");
            category_items.clone()
        }
    };

    retail_sites.sort_by(|a, b| a.name.cmp(&b.name));
    let data: Vec<CategorySalesRow> = retail_sites
        .iter()
        .map(|site| {
            let mut row = CategorySalesRow {
                site_id: site.id.clone(),
                site_name: site.name.clone(),
                total_amount: Decimal::ZERO,
                articles_with_sales: 0,
                total_sales_qty: Decimal::ZERO,
                sales_by_item: BTreeMap::new(),
                amounts_by_item: BTreeMap::new(),
            };
            for code in &active_items {
                let qty = quantities
                    .get(&(site.id.as_str(), *code))
                    .copied()
                    .unwrap_or_default();
                let amount = qty.saturating_mul(prices.get(code).copied().unwrap_or_default());
                if qty > Decimal::ZERO {
                    row.articles_with_sales += 1;
                }
                row.total_sales_qty = row.total_sales_qty.saturating_add(qty);
                row.total_amount = row.total_amount.saturating_add(amount);
                row.sales_by_item.insert(code.to_string(), qty);
                row.amounts_by_item.insert(code.to_string(), amount);
            }
            row
        })
        .collect();

    let metadata = CategorySalesMetadata {
        total_sites: data.len(),
        category_id: category.id.clone(),
        category_name: category.name.clone(),
        items: active_items
            .iter()
            .map(|code| ItemSummary {
                code: code.to_string(),
                name: names.get(code).copied().unwrap_or_default().to_string(),
            })
            .collect(),
        total_items_in_category: category_items.len(),
        active_items_shown: active_items.len(),
        from_date: from,
        to_date: to,
    };

    Ok(CategorySalesReport { data, metadata })
}
