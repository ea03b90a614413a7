//! Derived per-row metrics: autonomy, depot quantity and stock value

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use shared::{AutonomyDays, InventoryMovement, Site};

use super::stock::net_quantity_by_item;

/// How many days `current_stock` lasts at `avg_daily_sales`
pub fn autonomy_days(current_stock: Decimal, avg_daily_sales: Decimal) -> AutonomyDays {
    if current_stock <= Decimal::ZERO {
        AutonomyDays::NotApplicable
    } else if avg_daily_sales > Decimal::ZERO {
        AutonomyDays::Days(current_stock / avg_daily_sales)
    } else {
        AutonomyDays::Infinite
    }
}

/// Ids of the sites in the depot group; empty when the sites table is absent
pub fn depot_sites<'a>(sites: Option<&'a [Site]>, depot_group_code: &str) -> HashSet<&'a str> {
    sites
        .into_iter()
        .flatten()
        .filter(|site| site.in_group(depot_group_code))
        .map(|site| site.id.as_str())
        .collect()
}

/// Net quantity held across all depots for each item.
///
/// Report filters (including the as-of date) do not apply here.
pub fn depot_quantities<'a>(
    movements: &'a [InventoryMovement],
    depots: &HashSet<&str>,
) -> BTreeMap<&'a str, Decimal> {
    if depots.is_empty() {
        return BTreeMap::new();
    }
    net_quantity_by_item(movements, depots)
}

pub fn stock_value(unit_price: Option<Decimal>, current_stock: Decimal) -> Decimal {
    unit_price
        .unwrap_or(Decimal::ZERO)
        .saturating_mul(current_stock)
}
