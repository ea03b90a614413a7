//! Report query model: normalised filters, query shape and engine policies

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{clean_text, normalize_category_id, parse_optional_date, AppliedFilters, ReportParams};

/// Constants of the source business, overridable through configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Site group code marking central depots
    pub depot_group_code: String,
    /// Site group code of the retail region covered by the category sales report
    pub retail_group_code: String,
    /// SID prefix of retail site sales (other prefixes are office sales etc.)
    pub site_sales_prefix: String,
    /// Trailing window, in months, of the recency filter
    pub recency_months: u32,
    /// Category name keywords tried in order by the category sales report
    pub category_report_keywords: Vec<String>,
    pub degradation: DegradationPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            depot_group_code: "3700004".to_string(),
            retail_group_code: "3700002".to_string(),
            site_sales_prefix: "530".to_string(),
            recency_months: 6,
            category_report_keywords: vec!["ciment".to_string(), "cement".to_string()],
            degradation: DegradationPolicy::default(),
        }
    }
}

/// Size/latency bounds applied to broad queries.
///
/// The defaults are contract-level approximations: rows outside a limit get
/// zero sales fields, meaning "not computed", and the stock set is truncated.
/// [`DegradationPolicy::full_fidelity`] turns every bound off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DegradationPolicy {
    /// Keep only this many stock rows (largest current stock first)
    pub stock_row_limit: Option<usize>,
    /// Skip sales analytics when several sites are selected
    pub skip_multi_site_sales: bool,
    /// Single item across all sites: analytics only for the top sites by volume
    pub top_sites_per_item: Option<usize>,
    /// Single site across all items: analytics only for the top items by volume
    pub top_items_per_site: Option<usize>,
    /// Skip sales analytics when neither item nor site is given
    pub skip_all_by_all_sales: bool,
}

impl Default for DegradationPolicy {
    fn default() -> Self {
        Self {
            stock_row_limit: Some(1000),
            skip_multi_site_sales: true,
            top_sites_per_item: Some(20),
            top_items_per_site: Some(100),
            skip_all_by_all_sales: true,
        }
    }
}

impl DegradationPolicy {
    pub fn full_fidelity() -> Self {
        Self {
            stock_row_limit: None,
            skip_multi_site_sales: false,
            top_sites_per_item: None,
            top_items_per_site: None,
            skip_all_by_all_sales: false,
        }
    }
}

/// Site key carried by rows aggregated over several selected sites
pub fn multi_site_key(site_count: usize) -> String {
    format!("Multiple Sites ({})", site_count)
}

/// Which filters are scalar decides how rows are grouped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryShape {
    /// One item at one site: exactly one row
    ByItemSite { item: String, site: String },
    /// One item at every site: one row per site
    ByItem { item: String },
    /// Every item at one site: one row per item
    BySite { site: String },
    /// Several selected sites summed into synthetic rows, one per item
    /// (or a single row when the item is fixed)
    ByMultiSite { item: Option<String>, sites: Vec<String> },
    /// Full (site, item) cross-aggregation
    ByAll,
}

/// Report filters after coercion.
///
/// Blank strings and empty lists count as "not given"; unparseable dates are
/// dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub item_code: Option<String>,
    pub site_code: Option<String>,
    pub site_codes: Vec<String>,
    pub category_id: Option<String>,
    pub as_of_date: Option<NaiveDate>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl ReportFilter {
    pub fn from_params(params: &ReportParams) -> Self {
        let site_codes = params
            .site_codes
            .iter()
            .flatten()
            .filter_map(|code| clean_text(Some(code)))
            .collect();

        Self {
            item_code: clean_text(params.item_code.as_deref()),
            site_code: clean_text(params.site_code.as_deref()),
            site_codes,
            category_id: clean_text(params.category_id.as_deref())
                .map(|id| normalize_category_id(&id)),
            as_of_date: parse_optional_date(params.as_of_date.as_deref()),
            from_date: parse_optional_date(params.from_date.as_deref()),
            to_date: parse_optional_date(params.to_date.as_deref()),
        }
    }

    pub fn shape(&self) -> QueryShape {
        match (&self.item_code, &self.site_code) {
            (Some(item), Some(site)) => QueryShape::ByItemSite {
                item: item.clone(),
                site: site.clone(),
            },
            (item, None) if !self.site_codes.is_empty() => QueryShape::ByMultiSite {
                item: item.clone(),
                sites: self.site_codes.clone(),
            },
            (Some(item), None) => QueryShape::ByItem { item: item.clone() },
            (None, Some(site)) => QueryShape::BySite { site: site.clone() },
            (None, None) => QueryShape::ByAll,
        }
    }

    /// Every site the caller named, through either site filter
    pub fn selected_sites(&self) -> impl Iterator<Item = &str> {
        self.site_code
            .iter()
            .chain(self.site_codes.iter())
            .map(String::as_str)
    }

    /// Whether a transaction row passes the item and site filters
    pub fn matches(&self, site: &str, item: &str) -> bool {
        self.item_code.as_deref().map_or(true, |code| code == item)
            && self.site_code.as_deref().map_or(true, |code| code == site)
            && (self.site_codes.is_empty() || self.site_codes.iter().any(|code| code == site))
    }

    /// Whether a date lies inside the inclusive sales window
    pub fn in_sales_window(&self, date: NaiveDate) -> bool {
        self.from_date.map_or(true, |from| date >= from)
            && self.to_date.map_or(true, |to| date <= to)
    }

    pub fn applied(&self) -> AppliedFilters {
        AppliedFilters {
            site_code: self.site_code.clone(),
            site_codes: self.site_codes.clone(),
            item_code: self.item_code.clone(),
            category_id: self.category_id.clone(),
            as_of_date: self.as_of_date,
        }
    }
}
