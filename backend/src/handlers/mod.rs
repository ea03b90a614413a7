//! HTTP handlers for the DustReports API

pub mod health;
pub mod reference;
pub mod reports;
pub mod snapshot;

pub use health::health_check;
pub use reference::{list_categories, list_items, list_sites};
pub use reports::{autonomy_report, category_sales_report, stock_by_site_report};
pub use snapshot::{get_cache_status, load_dataframes};
