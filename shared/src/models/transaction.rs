//! Transaction log models: inventory movements and point-of-sale lines

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One stock-in/stock-out movement from the inventory log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryMovement {
    pub site: String,
    pub item: String,
    pub date: Option<NaiveDate>,
    pub debit_qty: Option<Decimal>,
    pub credit_qty: Option<Decimal>,
}

impl InventoryMovement {
    /// Incoming quantity, missing treated as zero
    pub fn debit(&self) -> Decimal {
        self.debit_qty.unwrap_or(Decimal::ZERO)
    }

    /// Outgoing quantity, missing treated as zero
    pub fn credit(&self) -> Decimal {
        self.credit_qty.unwrap_or(Decimal::ZERO)
    }
}

/// Kind of a point-of-sale line, decoded from its numeric type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesLineKind {
    Sale,
    Return,
    Other,
}

impl SalesLineKind {
    pub fn from_code(code: Option<i32>) -> Self {
        match code {
            Some(1) => SalesLineKind::Sale,
            Some(2) => SalesLineKind::Return,
            _ => SalesLineKind::Other,
        }
    }
}

/// One line of the sales log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalesLine {
    pub site: String,
    pub item: String,
    pub date: Option<NaiveDate>,
    pub qty: Option<Decimal>,
    pub transaction_type: Option<i32>,
    /// Site/client identifier; its prefix encodes the transaction category
    pub sid: Option<String>,
    pub invoice_id: Option<String>,
}

impl SalesLine {
    pub fn kind(&self) -> SalesLineKind {
        SalesLineKind::from_code(self.transaction_type)
    }

    /// Quantity, missing treated as zero
    pub fn quantity(&self) -> Decimal {
        self.qty.unwrap_or(Decimal::ZERO)
    }

    pub fn sid_starts_with(&self, prefix: &str) -> bool {
        self.sid.as_deref().is_some_and(|sid| sid.starts_with(prefix))
    }
}
