//! Report request and response models

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::AutonomyDays;

/// Optional-field parameter bag accepted by every report entry point.
///
/// Values arrive loosely typed from clients; dates stay as text here and are
/// coerced by the backend (unparseable dates count as missing).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportParams {
    #[serde(default)]
    pub item_code: Option<String>,
    #[serde(default)]
    pub site_code: Option<String>,
    #[serde(default)]
    pub site_codes: Option<Vec<String>>,
    #[serde(default, deserialize_with = "crate::validation::deserialize_lenient_id")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub as_of_date: Option<String>,
    #[serde(default)]
    pub from_date: Option<String>,
    #[serde(default)]
    pub to_date: Option<String>,
}

/// One enriched per-(site, item) report row.
///
/// Rows are recomputed for every request and carry no identity across calls.
/// Sales fields are zero when analytics were not computed for the row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockSalesRow {
    pub site: String,
    pub item: String,
    /// Display list of the selected sites for synthetic multi-site rows
    pub selected_sites: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_in: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_out: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub current_stock: Decimal,
    pub stock_transactions: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub max_daily_sales: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub min_daily_sales: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_daily_sales: Decimal,
    pub sales_transactions: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_sales_qty: Decimal,
    pub sales_period_days: i64,
    pub autonomy_days: AutonomyDays,
    #[serde(with = "rust_decimal::serde::float")]
    pub depot_quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub stock_value: Decimal,
    pub site_name: String,
    pub item_name: String,
    pub category: String,
    pub category_name: String,
    pub unit: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

/// Autonomy report response
#[derive(Debug, Clone, Serialize)]
pub struct AutonomyReport {
    pub data: Vec<StockSalesRow>,
    pub metadata: AutonomyReportMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutonomyReportMetadata {
    pub period_days: i64,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub total_rows: usize,
}

/// Stock-by-site report response
#[derive(Debug, Clone, Serialize)]
pub struct StockBySiteReport {
    pub data: Vec<StockSalesRow>,
    pub metadata: StockBySiteMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockBySiteMetadata {
    pub total_rows: usize,
    pub filters: AppliedFilters,
}

/// Filters echoed back to the caller, after coercion
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppliedFilters {
    pub site_code: Option<String>,
    pub site_codes: Vec<String>,
    pub item_code: Option<String>,
    pub category_id: Option<String>,
    pub as_of_date: Option<NaiveDate>,
}

/// Date range accepted by the category sales report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategorySalesParams {
    #[serde(default)]
    pub from_date: Option<String>,
    #[serde(default)]
    pub to_date: Option<String>,
}

/// Sales of one category's items at one retail site
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySalesRow {
    pub site_id: String,
    pub site_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub articles_with_sales: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_sales_qty: Decimal,
    #[serde(serialize_with = "crate::types::decimal_float_map::serialize")]
    pub sales_by_item: BTreeMap<String, Decimal>,
    #[serde(serialize_with = "crate::types::decimal_float_map::serialize")]
    pub amounts_by_item: BTreeMap<String, Decimal>,
}

/// Category sales report response
#[derive(Debug, Clone, Serialize)]
pub struct CategorySalesReport {
    pub data: Vec<CategorySalesRow>,
    pub metadata: CategorySalesMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySalesMetadata {
    pub total_sites: usize,
    pub category_id: String,
    pub category_name: String,
    pub items: Vec<super::ItemSummary>,
    pub total_items_in_category: usize,
    pub active_items_shown: usize,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

/// Snapshot cache status
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub cached: bool,
    pub loading: bool,
    pub tables: Vec<String>,
    pub version: u64,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Outcome of a snapshot refresh request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Success,
    Loading,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadResponse {
    pub status: LoadStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<String>,
}
