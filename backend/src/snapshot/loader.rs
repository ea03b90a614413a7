//! Snapshot loading from the source database
//!
//! Every column is fetched as text and coerced in Rust, so a malformed value
//! in one row degrades to "missing" instead of failing the whole table.

use std::future::Future;

use serde_json::Value;
use shared::{
    clean_text, normalize_category_id, parse_optional_date, parse_optional_decimal,
    parse_optional_int, text_or_empty, Category, InventoryMovement, Item, SalesLine, Site,
};
use sqlx::{postgres::PgRow, FromRow, PgPool};
use thiserror::Error;

use super::{RawTable, Tables};

/// Errors that abort a whole refresh
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Database connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("No tables were loaded successfully")]
    NothingLoaded,
}

/// Something that can produce a fresh set of tables
pub trait SnapshotSource: Send + Sync {
    fn load(&self) -> impl Future<Output = Result<Tables, LoadError>> + Send;
}

const SITES_SQL: &str = r#"
    SELECT "ID"::text AS id, "SITE"::text AS name, "SIDNO"::text AS site_group_code
    FROM "ALLSTOCK"
"#;

const CATEGORIES_SQL: &str = r#"
    SELECT "ID"::text AS id, "DESCR"::text AS name
    FROM "DETDESCR"
"#;

const ITEMS_SQL: &str = r#"
    SELECT "ITEM"::text AS code, "DESCR1"::text AS name, "CATEGORY"::text AS category_id,
           "SUNIT"::text AS unit, "POSPRICE1"::text AS unit_price
    FROM "STOCK"
"#;

const MOVEMENTS_SQL: &str = r#"
    SELECT "SITE"::text AS site, "ITEM"::text AS item, "FDATE"::text AS date,
           "DEBITQTY"::text AS debit_qty, "CREDITQTY"::text AS credit_qty
    FROM "ALLITEM"
"#;

const SALES_SQL: &str = r#"
    SELECT "SITE"::text AS site, "ITEM"::text AS item, "FDATE"::text AS date,
           "QTY"::text AS qty, "FTYPE"::text AS transaction_type, "SID"::text AS sid,
           "INVOICENO"::text AS invoice_id
    FROM "ITEMS"
"#;

#[derive(Debug, FromRow)]
struct SiteRow {
    id: Option<String>,
    name: Option<String>,
    site_group_code: Option<String>,
}

impl SiteRow {
    fn into_site(self) -> Option<Site> {
        Some(Site {
            id: clean_text(self.id.as_deref())?,
            name: text_or_empty(self.name.as_deref()),
            site_group_code: clean_text(self.site_group_code.as_deref()),
        })
    }
}

#[derive(Debug, FromRow)]
struct CategoryRow {
    id: Option<String>,
    name: Option<String>,
}

impl CategoryRow {
    fn into_category(self) -> Option<Category> {
        Some(Category {
            id: normalize_category_id(&clean_text(self.id.as_deref())?),
            name: text_or_empty(self.name.as_deref()),
        })
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    code: Option<String>,
    name: Option<String>,
    category_id: Option<String>,
    unit: Option<String>,
    unit_price: Option<String>,
}

impl ItemRow {
    fn into_item(self) -> Option<Item> {
        Some(Item {
            code: clean_text(self.code.as_deref())?,
            name: text_or_empty(self.name.as_deref()),
            category_id: clean_text(self.category_id.as_deref())
                .map(|id| normalize_category_id(&id)),
            unit: text_or_empty(self.unit.as_deref()),
            unit_price: parse_optional_decimal(self.unit_price.as_deref()),
        })
    }
}

#[derive(Debug, FromRow)]
struct MovementRow {
    site: Option<String>,
    item: Option<String>,
    date: Option<String>,
    debit_qty: Option<String>,
    credit_qty: Option<String>,
}

impl MovementRow {
    fn into_movement(self) -> Option<InventoryMovement> {
        Some(InventoryMovement {
            site: clean_text(self.site.as_deref())?,
            item: clean_text(self.item.as_deref())?,
            date: parse_optional_date(self.date.as_deref()),
            debit_qty: parse_optional_decimal(self.debit_qty.as_deref()),
            credit_qty: parse_optional_decimal(self.credit_qty.as_deref()),
        })
    }
}

#[derive(Debug, FromRow)]
struct SalesRow {
    site: Option<String>,
    item: Option<String>,
    date: Option<String>,
    qty: Option<String>,
    transaction_type: Option<String>,
    sid: Option<String>,
    invoice_id: Option<String>,
}

impl SalesRow {
    fn into_line(self) -> Option<SalesLine> {
        Some(SalesLine {
            site: clean_text(self.site.as_deref())?,
            item: clean_text(self.item.as_deref())?,
            date: parse_optional_date(self.date.as_deref()),
            qty: parse_optional_decimal(self.qty.as_deref()),
            transaction_type: parse_optional_int(self.transaction_type.as_deref()),
            sid: clean_text(self.sid.as_deref()),
            invoice_id: clean_text(self.invoice_id.as_deref()),
        })
    }
}

/// Loads the snapshot from a PostgreSQL mirror of the source tables
#[derive(Clone)]
pub struct PgSnapshotSource {
    db: PgPool,
}

impl PgSnapshotSource {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Load one typed table; a failure is logged and yields `None`
    async fn load_table<R, T>(
        &self,
        name: &str,
        sql: &str,
        convert: fn(R) -> Option<T>,
    ) -> Option<Vec<T>>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        match sqlx::query_as::<_, R>(sql).fetch_all(&self.db).await {
            Ok(rows) => {
                let fetched = rows.len();
                let table: Vec<T> = rows.into_iter().filter_map(convert).collect();
                tracing::info!(
                    table = name,
                    rows = table.len(),
                    skipped = fetched - table.len(),
                    "Table loaded"
                );
                Some(table)
            }
            Err(e) => {
                tracing::warn!(table = name, error = %e, "Failed to load table");
                None
            }
        }
    }

    /// Load a table the engine does not interpret, one JSON object per row
    async fn load_raw_table(&self, name: &str, source: &str) -> Option<RawTable> {
        let sql = format!(r#"SELECT row_to_json(t) FROM "{}" t"#, source);
        match sqlx::query_scalar::<_, Value>(&sql).fetch_all(&self.db).await {
            Ok(values) => {
                let rows: Vec<_> = values
                    .into_iter()
                    .filter_map(|value| match value {
                        Value::Object(row) => Some(row),
                        _ => None,
                    })
                    .collect();
                let table = RawTable { rows };
                tracing::info!(
                    table = name,
                    rows = table.rows.len(),
                    columns = table.columns().len(),
                    "Table loaded"
                );
                Some(table)
            }
            Err(e) => {
                tracing::warn!(table = name, error = %e, "Failed to load table");
                None
            }
        }
    }
}

impl SnapshotSource for PgSnapshotSource {
    async fn load(&self) -> Result<Tables, LoadError> {
        sqlx::query("SELECT 1")
            .execute(&self.db)
            .await
            .map_err(LoadError::Connection)?;

        Ok(Tables {
            sites: self.load_table("sites", SITES_SQL, SiteRow::into_site).await,
            categories: self
                .load_table("categories", CATEGORIES_SQL, CategoryRow::into_category)
                .await,
            invoice_headers: self.load_raw_table("invoice_headers", "INVOICE").await,
            sales_details: self
                .load_table("sales_details", SALES_SQL, SalesRow::into_line)
                .await,
            vouchers: self.load_raw_table("vouchers", "PAYM").await,
            accounts: self.load_raw_table("accounts", "SACCOUNT").await,
            inventory_items: self
                .load_table("inventory_items", ITEMS_SQL, ItemRow::into_item)
                .await,
            inventory_transactions: self
                .load_table("inventory_transactions", MOVEMENTS_SQL, MovementRow::into_movement)
                .await,
        })
    }
}
