//! Route definitions for the DustReports API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Snapshot management
        .route("/load-dataframes", post(handlers::load_dataframes))
        .route("/cache-status", get(handlers::get_cache_status))
        // Selection lists
        .route("/sites", get(handlers::list_sites))
        .route("/categories", get(handlers::list_categories))
        .route("/items", get(handlers::list_items))
        .merge(report_routes())
}

/// Report routes; each accepts `?format=csv`
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/autonomy-report", post(handlers::autonomy_report))
        .route("/stock-by-site-report", post(handlers::stock_by_site_report))
        .route("/ciment-report", post(handlers::category_sales_report))
}
