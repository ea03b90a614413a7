//! In-memory snapshot of the source tables
//!
//! Reports never touch the source database. They read an immutable
//! [`Snapshot`] captured once at the start of the request; refreshes build a
//! complete new snapshot off to the side and publish it with a single atomic
//! pointer swap, so a reader sees either the old tables or the new ones.

mod loader;
mod scheduler;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use shared::{Category, InventoryMovement, Item, SalesLine, Site};
use tokio::sync::Mutex;

pub use loader::{LoadError, PgSnapshotSource, SnapshotSource};
pub use scheduler::{next_refresh_at, parse_refresh_times, run_scheduler};

/// A table the report engine does not interpret, kept as loaded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub rows: Vec<Map<String, Value>>,
}

impl RawTable {
    pub fn columns(&self) -> Vec<&str> {
        self.rows
            .first()
            .map(|row| row.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// The eight source tables. Any of them may be absent if its own load failed.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub sites: Option<Vec<Site>>,
    pub categories: Option<Vec<Category>>,
    pub invoice_headers: Option<RawTable>,
    pub sales_details: Option<Vec<SalesLine>>,
    pub vouchers: Option<RawTable>,
    pub accounts: Option<RawTable>,
    pub inventory_items: Option<Vec<Item>>,
    pub inventory_transactions: Option<Vec<InventoryMovement>>,
}

impl Tables {
    /// Names of the tables present, in load order
    pub fn names(&self) -> Vec<String> {
        [
            ("sites", self.sites.is_some()),
            ("categories", self.categories.is_some()),
            ("invoice_headers", self.invoice_headers.is_some()),
            ("sales_details", self.sales_details.is_some()),
            ("vouchers", self.vouchers.is_some()),
            ("accounts", self.accounts.is_some()),
            ("inventory_items", self.inventory_items.is_some()),
            ("inventory_transactions", self.inventory_transactions.is_some()),
        ]
        .into_iter()
        .filter(|(_, present)| *present)
        .map(|(name, _)| name.to_string())
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }

    pub fn sites(&self) -> Option<&[Site]> {
        self.sites.as_deref()
    }

    pub fn categories(&self) -> Option<&[Category]> {
        self.categories.as_deref()
    }

    pub fn items(&self) -> Option<&[Item]> {
        self.inventory_items.as_deref()
    }

    pub fn movements(&self) -> Option<&[InventoryMovement]> {
        self.inventory_transactions.as_deref()
    }

    pub fn sales(&self) -> Option<&[SalesLine]> {
        self.sales_details.as_deref()
    }
}

/// A published, read-only set of tables
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Incremented on every successful refresh; 0 means never loaded
    pub version: u64,
    pub loaded_at: Option<DateTime<Utc>>,
    pub tables: Tables,
}

impl Snapshot {
    pub fn is_loaded(&self) -> bool {
        !self.tables.is_empty()
    }
}

/// Result of asking the store to refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Loaded { version: u64, tables: Vec<String> },
    /// Another refresh held the lock; nothing was done
    AlreadyLoading,
}

/// Holder of the current snapshot.
///
/// Readers call [`SnapshotStore::current`] and keep the returned `Arc` for the
/// whole request. At most one refresh runs at a time.
pub struct SnapshotStore {
    current: ArcSwap<Snapshot>,
    refresh_lock: Mutex<()>,
    loading: AtomicBool,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    /// Create an empty store (nothing loaded yet)
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::default()),
            refresh_lock: Mutex::new(()),
            loading: AtomicBool::new(false),
        }
    }

    /// Create a store already holding the given tables
    pub fn with_tables(tables: Tables) -> Self {
        let store = Self::new();
        store.publish(tables);
        store
    }

    /// Capture the current snapshot
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Reload every table from `source` and publish the result.
    ///
    /// On failure the previous snapshot stays in place untouched.
    pub async fn refresh<S: SnapshotSource>(
        &self,
        source: &S,
    ) -> Result<RefreshOutcome, LoadError> {
        let Ok(_guard) = self.refresh_lock.try_lock() else {
            tracing::info!("Snapshot refresh already in progress");
            return Ok(RefreshOutcome::AlreadyLoading);
        };
        let _loading = LoadingFlag::raise(&self.loading);

        tracing::info!("Refreshing snapshot...");
        let tables = source.load().await?;
        if tables.is_empty() {
            return Err(LoadError::NothingLoaded);
        }

        let names = tables.names();
        let version = self.publish(tables);
        tracing::info!(version, tables = ?names, "Snapshot refreshed");

        Ok(RefreshOutcome::Loaded {
            version,
            tables: names,
        })
    }

    fn publish(&self, tables: Tables) -> u64 {
        let version = self.current.load().version + 1;
        self.current.store(Arc::new(Snapshot {
            version,
            loaded_at: Some(Utc::now()),
            tables,
        }));
        version
    }
}

/// Keeps the loading flag raised for the lifetime of a refresh, including
/// when the refresh future is dropped mid-way.
struct LoadingFlag<'a>(&'a AtomicBool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
