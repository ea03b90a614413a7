//! Selection list handlers

use axum::{extract::State, Json};
use shared::{CategorySummary, ItemSummary, SiteSummary};

use crate::services::reference::{category_list, item_list, site_list};
use crate::AppState;

/// List sites (empty until the snapshot is loaded)
pub async fn list_sites(State(state): State<AppState>) -> Json<Vec<SiteSummary>> {
    Json(site_list(&state.store.current().tables))
}

/// List categories that have at least one item
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<CategorySummary>> {
    Json(category_list(&state.store.current().tables))
}

pub async fn list_items(State(state): State<AppState>) -> Json<Vec<ItemSummary>> {
    Json(item_list(&state.store.current().tables))
}
