//! Master data joins for report rows

use std::collections::HashMap;

use rust_decimal::Decimal;
use shared::{Category, Item, Site, StockSalesRow};

use super::metrics::stock_value;

const DISPLAYED_SITE_NAMES: usize = 3;

/// "A, B, C (+N more)" for a list of selected site ids.
///
/// Unknown ids show as themselves; without a sites table the label is generic.
pub fn selected_sites_display(site_codes: &[String], sites: Option<&[Site]>) -> String {
    let Some(sites) = sites else {
        return "Multiple Sites".to_string();
    };
    let names = site_names(sites);

    let shown: Vec<&str> = site_codes
        .iter()
        .take(DISPLAYED_SITE_NAMES)
        .map(|code| names.get(code.as_str()).copied().unwrap_or(code.as_str()))
        .collect();
    let mut display = shown.join(", ");
    if site_codes.len() > DISPLAYED_SITE_NAMES {
        display.push_str(&format!(
            " (+{} more)",
            site_codes.len() - DISPLAYED_SITE_NAMES
        ));
    }
    display
}

fn site_names(sites: &[Site]) -> HashMap<&str, &str> {
    let mut names = HashMap::with_capacity(sites.len());
    for site in sites {
        names.entry(site.id.as_str()).or_insert(site.name.as_str());
    }
    names
}

/// Lookup tables built once per report from the master data
pub struct MasterData<'a> {
    site_names: Option<HashMap<&'a str, &'a str>>,
    items: HashMap<&'a str, &'a Item>,
    category_names: HashMap<&'a str, &'a str>,
}

impl<'a> MasterData<'a> {
    pub fn new(
        sites: Option<&'a [Site]>,
        items: Option<&'a [Item]>,
        categories: Option<&'a [Category]>,
    ) -> Self {
        let mut item_index = HashMap::new();
        // first occurrence of a duplicated item code wins
        for item in items.into_iter().flatten() {
            item_index.entry(item.code.as_str()).or_insert(item);
        }

        let mut category_names = HashMap::new();
        for category in categories.into_iter().flatten() {
            category_names
                .entry(category.id.as_str())
                .or_insert(category.name.as_str());
        }

        if sites.is_none() {
            tracing::warn!("Sites table not loaded; site names fall back to site ids");
        }

        Self {
            site_names: sites.map(site_names),
            items: item_index,
            category_names,
        }
    }

    pub fn item(&self, code: &str) -> Option<&'a Item> {
        self.items.get(code).copied()
    }

    pub fn site_name(&self, site: &str) -> String {
        match &self.site_names {
            Some(names) => names.get(site).copied().unwrap_or_default().to_string(),
            None => site.to_string(),
        }
    }

    pub fn category_name(&self, category_id: &str) -> String {
        self.category_names
            .get(category_id)
            .copied()
            .unwrap_or_default()
            .to_string()
    }

    /// Fill names, category, unit, price and stock value on a row
    pub fn enrich(&self, row: &mut StockSalesRow) {
        row.site_name = if row.selected_sites.is_empty() {
            self.site_name(&row.site)
        } else {
            row.selected_sites.clone()
        };

        match self.item(&row.item) {
            Some(item) => {
                row.item_name = item.name.clone();
                row.category = item.category_id.clone().unwrap_or_default();
                row.category_name = item
                    .category_id
                    .as_deref()
                    .map(|id| self.category_name(id))
                    .unwrap_or_default();
                row.unit = item.unit.clone();
                row.unit_price = item.unit_price.unwrap_or(Decimal::ZERO);
                row.stock_value = stock_value(item.unit_price, row.current_stock);
            }
            None => {
                row.item_name = String::new();
                row.category = String::new();
                row.category_name = String::new();
                row.unit = String::new();
                row.unit_price = Decimal::ZERO;
                row.stock_value = Decimal::ZERO;
            }
        }
    }
}
