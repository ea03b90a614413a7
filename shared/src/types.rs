//! Common types used across the platform

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// Sentinel written for [`AutonomyDays::NotApplicable`] at the serialization boundary
pub const AUTONOMY_NOT_APPLICABLE: i64 = -1;

/// Sentinel written for [`AutonomyDays::Infinite`] at the serialization boundary
pub const AUTONOMY_INFINITE: i64 = 9999;

/// Days of stock autonomy: how long current stock lasts at the average daily sale rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutonomyDays {
    /// No stock on hand (current stock <= 0)
    NotApplicable,
    /// Stock on hand but no sales to deplete it
    Infinite,
    Days(Decimal),
}

impl AutonomyDays {
    /// Compatibility value consumers expect: -1, 9999 or the day count
    pub fn sentinel(&self) -> Decimal {
        match self {
            AutonomyDays::NotApplicable => Decimal::from(AUTONOMY_NOT_APPLICABLE),
            AutonomyDays::Infinite => Decimal::from(AUTONOMY_INFINITE),
            AutonomyDays::Days(days) => *days,
        }
    }
}

impl std::fmt::Display for AutonomyDays {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutonomyDays::NotApplicable => write!(f, "N/A"),
            AutonomyDays::Infinite => write!(f, "∞"),
            AutonomyDays::Days(days) => write!(f, "{}", days.round_dp(1)),
        }
    }
}

impl Serialize for AutonomyDays {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AutonomyDays::NotApplicable => serializer.serialize_i64(AUTONOMY_NOT_APPLICABLE),
            AutonomyDays::Infinite => serializer.serialize_i64(AUTONOMY_INFINITE),
            AutonomyDays::Days(days) => serializer.serialize_f64(days.to_f64().unwrap_or(0.0)),
        }
    }
}

/// Serialize a map of decimals with JSON-number values, matching the
/// `rust_decimal::serde::float` fields next to it
pub mod decimal_float_map {
    use std::collections::BTreeMap;

    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<String, Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            map.iter()
                .map(|(key, value)| (key, value.to_f64().unwrap_or(0.0))),
        )
    }
}
