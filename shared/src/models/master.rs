//! Master data models: sites, items and categories

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A stock location (retail point or depot)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Site {
    pub id: String,
    pub name: String,
    /// Group code; depots and retail regions are identified by fixed codes
    pub site_group_code: Option<String>,
}

impl Site {
    pub fn in_group(&self, group_code: &str) -> bool {
        self.site_group_code.as_deref() == Some(group_code)
    }
}

/// A sellable item from the item master
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub code: String,
    pub name: String,
    /// Category id, already normalised (see [`crate::normalize_category_id`])
    pub category_id: Option<String>,
    pub unit: String,
    pub unit_price: Option<Decimal>,
}

/// An item category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Site entry for selection lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteSummary {
    pub id: String,
    pub name: String,
}

/// Category entry for selection lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategorySummary {
    pub id: String,
    pub name: String,
}

/// Item entry for selection lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemSummary {
    pub code: String,
    pub name: String,
}
