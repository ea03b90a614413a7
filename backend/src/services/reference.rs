//! Selection lists and cache status for the UI

use std::collections::HashSet;

use shared::{CacheStatus, CategorySummary, ItemSummary, SiteSummary};

use crate::snapshot::{Snapshot, Tables};

pub fn site_list(tables: &Tables) -> Vec<SiteSummary> {
    let mut seen = HashSet::new();
    tables
        .sites()
        .unwrap_or_default()
        .iter()
        .filter(|site| seen.insert((site.id.as_str(), site.name.as_str())))
        .map(|site| SiteSummary {
            id: site.id.clone(),
            name: site.name.clone(),
        })
        .collect()
}

/// Categories sorted by name, restricted to those used by at least one item
/// when the item master is loaded
pub fn category_list(tables: &Tables) -> Vec<CategorySummary> {
    let used: Option<HashSet<&str>> = tables.items().map(|items| {
        items
            .iter()
            .filter_map(|item| item.category_id.as_deref())
            .collect()
    });

    let mut seen = HashSet::new();
    let mut categories: Vec<CategorySummary> = tables
        .categories()
        .unwrap_or_default()
        .iter()
        .filter(|category| {
            used.as_ref()
                .map_or(true, |used| used.contains(category.id.as_str()))
        })
        .filter(|category| seen.insert((category.id.as_str(), category.name.as_str())))
        .map(|category| CategorySummary {
            id: category.id.clone(),
            name: category.name.clone(),
        })
        .collect();
    categories.sort_by(|a, b| a.name.cmp(&b.name));
    categories
}

pub fn item_list(tables: &Tables) -> Vec<ItemSummary> {
    let mut seen = HashSet::new();
    tables
        .items()
        .unwrap_or_default()
        .iter()
        .filter(|item| seen.insert((item.code.as_str(), item.name.as_str())))
        .map(|item| ItemSummary {
            code: item.code.clone(),
            name: item.name.clone(),
        })
        .collect()
}

pub fn cache_status(snapshot: &Snapshot, loading: bool) -> CacheStatus {
    CacheStatus {
        cached: snapshot.is_loaded(),
        loading,
        tables: snapshot.tables.names(),
        version: snapshot.version,
        loaded_at: snapshot.loaded_at,
    }
}
