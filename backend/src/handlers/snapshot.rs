//! Snapshot load and cache status handlers

use axum::{extract::State, Json};
use shared::{CacheStatus, LoadResponse, LoadStatus};

use crate::error::AppResult;
use crate::services::reference::cache_status;
use crate::snapshot::RefreshOutcome;
use crate::AppState;

/// Reload every table from the source database.
///
/// Returns immediately with status "loading" if a refresh is already running.
pub async fn load_dataframes(State(state): State<AppState>) -> AppResult<Json<LoadResponse>> {
    let response = match state.store.refresh(state.source.as_ref()).await? {
        RefreshOutcome::Loaded { tables, .. } => LoadResponse {
            status: LoadStatus::Success,
            message: format!("Successfully loaded {} tables", tables.len()),
            tables,
        },
        RefreshOutcome::AlreadyLoading => LoadResponse {
            status: LoadStatus::Loading,
            message: "Cache loading already in progress".to_string(),
            tables: Vec::new(),
        },
    };
    Ok(Json(response))
}

pub async fn get_cache_status(State(state): State<AppState>) -> Json<CacheStatus> {
    let snapshot = state.store.current();
    Json(cache_status(&snapshot, state.store.is_loading()))
}
