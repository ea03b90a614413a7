//! Report pipeline tests
//!
//! Tests for the assembled reports including:
//! - No-data and no-match signals
//! - Stock, autonomy and depot quantity on enriched rows
//! - Recency filtering with depot retention and bypass
//! - Sorting, metadata and CSV export
//! - Idempotence on an unchanged snapshot

use chrono::NaiveDate;
use dust_reports::error::ReportError;
use dust_reports::services::ReportingService;
use dust_reports::services::EngineSettings;
use dust_reports::snapshot::{SnapshotStore, Tables};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    AutonomyDays, Category, InventoryMovement, Item, ReportParams, SalesLine, Site, StockSalesRow,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2024, 6, 30)
}

fn site(id: &str, name: &str, group: &str) -> Site {
    Site {
        id: id.to_string(),
        name: name.to_string(),
        site_group_code: Some(group.to_string()),
    }
}

fn item(code: &str, name: &str, category: &str, unit: &str, price: Decimal) -> Item {
    Item {
        code: code.to_string(),
        name: name.to_string(),
        category_id: Some(category.to_string()),
        unit: unit.to_string(),
        unit_price: Some(price),
    }
}

fn movement(site: &str, item: &str, debit: i64, credit: i64) -> InventoryMovement {
    InventoryMovement {
        site: site.to_string(),
        item: item.to_string(),
        date: Some(date(2024, 1, 1)),
        debit_qty: Some(Decimal::from(debit)),
        credit_qty: Some(Decimal::from(credit)),
    }
}

fn sale(site: &str, item: &str, day: NaiveDate, qty: i64) -> SalesLine {
    SalesLine {
        site: site.to_string(),
        item: item.to_string(),
        date: Some(day),
        qty: Some(Decimal::from(qty)),
        transaction_type: Some(1),
        sid: Some("530001".to_string()),
        invoice_id: Some("F-1".to_string()),
    }
}

/// D1 is a depot; S1 and S2 are retail sites. I3 has no sales at all.
fn fixture_tables() -> Tables {
    Tables {
        sites: Some(vec![
            site("D1", "Depot Central", "3700004"),
            site("S1", "Gombe", "3700002"),
            site("S2", "Limete", "3700002"),
        ]),
        categories: Some(vec![
            Category {
                id: "4".to_string(),
                name: "Ciment".to_string(),
            },
            Category {
                id: "5".to_string(),
                name: "Boissons".to_string(),
            },
        ]),
        inventory_items: Some(vec![
            item("I1", "Ciment 50kg", "4", "SAC", Decimal::new(125, 1)),
            item("I2", "Eau", "5", "BTL", Decimal::ONE),
            item("I3", "Old stock", "5", "PCS", Decimal::TWO),
        ]),
        inventory_transactions: Some(vec![
            movement("D1", "I1", 500, 0),
            movement("D1", "I3", 7, 0),
            movement("S1", "I1", 100, 20),
            movement("S1", "I1", 0, 30),
            movement("S1", "I2", 40, 0),
            movement("S2", "I1", 10, 10),
            movement("S2", "I3", 5, 0),
        ]),
        sales_details: Some(vec![
            sale("S1", "I1", date(2024, 6, 1), 10),
            sale("S1", "I1", date(2024, 6, 2), 6),
            sale("S1", "I2", date(2024, 6, 10), 4),
            sale("S2", "I1", date(2024, 6, 5), 3),
        ]),
        ..Tables::default()
    }
}

fn service_for(tables: Tables) -> ReportingService {
    let store = SnapshotStore::with_tables(tables);
    ReportingService::new(store.current(), EngineSettings::default(), today())
}

fn service() -> ReportingService {
    service_for(fixture_tables())
}

fn params() -> ReportParams {
    ReportParams::default()
}

fn find<'a>(rows: &'a [StockSalesRow], site: &str, item: &str) -> Option<&'a StockSalesRow> {
    rows.iter().find(|r| r.site == site && r.item == item)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_is_no_data() {
        let service = ReportingService::new(
            SnapshotStore::new().current(),
            EngineSettings::default(),
            today(),
        );

        assert!(matches!(
            service.autonomy_report(&params()),
            Err(ReportError::NoDataLoaded)
        ));
        assert!(matches!(
            service.stock_by_site_report(&params()),
            Err(ReportError::NoDataLoaded)
        ));
    }

    #[test]
    fn test_unknown_item_is_no_match() {
        let result = service().autonomy_report(&ReportParams {
            item_code: Some("NOPE".to_string()),
            ..params()
        });
        assert!(matches!(result, Err(ReportError::NoMatchingRows(_))));
    }

    /// Stock 50 and 16 units sold over 30 days
    #[test]
    fn test_autonomy_report_single_row() {
        let report = service()
            .autonomy_report(&ReportParams {
                item_code: Some("I1".to_string()),
                site_code: Some("S1".to_string()),
                from_date: Some("2024-06-01".to_string()),
                to_date: Some("2024-06-30".to_string()),
                ..params()
            })
            .unwrap();

        assert_eq!(report.data.len(), 1);
        let row = &report.data[0];
        assert_eq!(row.current_stock, Decimal::from(50));
        assert_eq!(row.total_sales_qty, Decimal::from(16));
        assert_eq!(row.sales_transactions, 2);
        assert_eq!(row.max_daily_sales, Decimal::from(10));
        assert_eq!(row.min_daily_sales, Decimal::from(6));
        assert_eq!(row.sales_period_days, 30);
        assert_eq!(row.avg_daily_sales, Decimal::ONE);
        assert_eq!(row.autonomy_days, AutonomyDays::Days(Decimal::from(50)));
        assert_eq!(row.depot_quantity, Decimal::from(500));

        assert_eq!(report.metadata.period_days, 30);
        assert_eq!(report.metadata.total_rows, 1);
        assert_eq!(report.metadata.from_date, Some(date(2024, 6, 1)));
    }

    /// Stock on hand with no sales in the window
    #[test]
    fn test_stock_without_sales_has_infinite_autonomy() {
        let report = service()
            .autonomy_report(&ReportParams {
                item_code: Some("I1".to_string()),
                site_code: Some("S1".to_string()),
                from_date: Some("2024-01-01".to_string()),
                to_date: Some("2024-01-31".to_string()),
                ..params()
            })
            .unwrap();

        let row = &report.data[0];
        assert_eq!(row.current_stock, Decimal::from(50));
        assert_eq!(row.avg_daily_sales, Decimal::ZERO);
        assert_eq!(row.autonomy_days, AutonomyDays::Infinite);

        let json = serde_json::to_value(row).unwrap();
        assert_eq!(json["autonomy_days"], serde_json::json!(9999));
    }

    /// Zero stock with sales is not applicable
    #[test]
    fn test_zero_stock_is_not_applicable() {
        let report = service()
            .autonomy_report(&ReportParams {
                item_code: Some("I1".to_string()),
                site_code: Some("S2".to_string()),
                ..params()
            })
            .unwrap();

        let row = &report.data[0];
        assert_eq!(row.current_stock, Decimal::ZERO);
        assert_eq!(row.total_sales_qty, Decimal::from(3));
        assert_eq!(row.autonomy_days, AutonomyDays::NotApplicable);
        assert_eq!(serde_json::to_value(row).unwrap()["autonomy_days"], serde_json::json!(-1));
        // no explicit window: the observed sales span a single day
        assert_eq!(report.metadata.period_days, 1);
    }

    #[test]
    fn test_rows_are_enriched() {
        let report = service()
            .autonomy_report(&ReportParams {
                item_code: Some("I1".to_string()),
                ..params()
            })
            .unwrap();

        let row = find(&report.data, "S1", "I1").unwrap();
        assert_eq!(row.site_name, "Gombe");
        assert_eq!(row.item_name, "Ciment 50kg");
        assert_eq!(row.category, "4");
        assert_eq!(row.category_name, "Ciment");
        assert_eq!(row.unit, "SAC");
        assert_eq!(row.unit_price, Decimal::new(125, 1));
        assert_eq!(row.stock_value, Decimal::from(625));
        assert!(report.data.iter().all(|r| r.depot_quantity == Decimal::from(500)));
    }

    /// Depot rows survive without recent sales; stale retail rows do not
    #[test]
    fn test_recency_keeps_depot_rows() {
        let report = service().stock_by_site_report(&params()).unwrap();

        assert!(find(&report.data, "D1", "I3").is_some());
        assert!(find(&report.data, "S2", "I3").is_none());
        assert_eq!(report.metadata.total_rows, 5);
    }

    /// Selecting a depot keeps stale items at every selected site
    #[test]
    fn test_depot_selection_bypasses_recency() {
        let with_depot = service()
            .stock_by_site_report(&ReportParams {
                site_codes: Some(vec!["D1".to_string(), "S2".to_string()]),
                ..params()
            })
            .unwrap();

        let items: Vec<&str> = with_depot.data.iter().map(|r| r.item.as_str()).collect();
        assert_eq!(items, vec!["I1", "I3"]);
        let stale = find(&with_depot.data, "Multiple Sites (2)", "I3").unwrap();
        assert_eq!(stale.current_stock, Decimal::from(12));
        assert_eq!(stale.site_name, "Depot Central, Limete");

        let without_depot = service()
            .stock_by_site_report(&ReportParams {
                site_codes: Some(vec!["S1".to_string(), "S2".to_string()]),
                ..params()
            })
            .unwrap();
        let items: Vec<&str> = without_depot.data.iter().map(|r| r.item.as_str()).collect();
        assert_eq!(items, vec!["I1", "I2"]);
    }

    #[test]
    fn test_stock_by_site_sorted_by_site_name_then_stock() {
        let report = service().stock_by_site_report(&params()).unwrap();

        let order: Vec<(&str, &str)> = report
            .data
            .iter()
            .map(|r| (r.site.as_str(), r.item.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("D1", "I1"), ("D1", "I3"), ("S1", "I1"), ("S1", "I2"), ("S2", "I1")]
        );
    }

    /// Broad queries carry zeroed sales fields
    #[test]
    fn test_all_by_all_has_no_sales_analytics() {
        let report = service().stock_by_site_report(&params()).unwrap();
        assert!(report
            .data
            .iter()
            .all(|r| r.total_sales_qty == Decimal::ZERO && r.sales_transactions == 0));
    }

    #[test]
    fn test_category_filter_accepts_float_ids() {
        let report = service()
            .stock_by_site_report(&ReportParams {
                category_id: Some("4.0".to_string()),
                ..params()
            })
            .unwrap();

        assert!(report.data.iter().all(|r| r.item == "I1"));
        assert_eq!(report.metadata.filters.category_id.as_deref(), Some("4"));
    }

    #[test]
    fn test_autonomy_report_ignores_stock_only_filters() {
        let report = service()
            .autonomy_report(&ReportParams {
                item_code: Some("I2".to_string()),
                category_id: Some("999".to_string()),
                site_codes: Some(vec!["S9".to_string()]),
                ..params()
            })
            .unwrap();
        assert_eq!(report.data.len(), 1);
    }

    #[test]
    fn test_missing_sites_table_degrades() {
        let tables = Tables {
            sites: None,
            ..fixture_tables()
        };
        let report = service_for(tables)
            .autonomy_report(&ReportParams {
                item_code: Some("I1".to_string()),
                ..params()
            })
            .unwrap();

        let row = find(&report.data, "S1", "I1").unwrap();
        assert_eq!(row.site_name, "S1");
        assert_eq!(row.depot_quantity, Decimal::ZERO);
    }

    #[test]
    fn test_csv_export() {
        let report = service().stock_by_site_report(&params()).unwrap();
        let csv = ReportingService::export_to_csv(&report.data).unwrap();

        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("site,item,selected_sites,total_in"));
        assert!(header.contains("autonomy_days"));
        assert_eq!(lines.count(), report.data.len());
    }

    #[test]
    fn test_reports_are_idempotent() {
        let service = service();
        let request = ReportParams {
            item_code: Some("I1".to_string()),
            from_date: Some("2024-06-01".to_string()),
            ..params()
        };

        let first = service.autonomy_report(&request).unwrap();
        let second = service.autonomy_report(&request).unwrap();

        assert_eq!(first.data, second.data);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn site_strategy() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("D1"), Just("S1"), Just("S2")]
    }

    fn item_strategy() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("I1"), Just("I2"), Just("I3")]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Autonomy on every row follows the sentinel law
        #[test]
        fn prop_rows_follow_autonomy_law(
            moves in prop::collection::vec((site_strategy(), item_strategy(), 0i64..100, 0i64..100), 1..30)
        ) {
            let tables = Tables {
                inventory_transactions: Some(
                    moves.iter().map(|(s, i, d, c)| movement(s, i, *d, *c)).collect(),
                ),
                ..fixture_tables()
            };
            let report = service_for(tables).autonomy_report(&ReportParams {
                site_code: Some("S1".to_string()),
                ..ReportParams::default()
            });

            if let Ok(report) = report {
                for row in &report.data {
                    let expected = if row.current_stock <= Decimal::ZERO {
                        AutonomyDays::NotApplicable
                    } else if row.avg_daily_sales == Decimal::ZERO {
                        AutonomyDays::Infinite
                    } else {
                        AutonomyDays::Days(row.current_stock / row.avg_daily_sales)
                    };
                    prop_assert_eq!(row.autonomy_days, expected);
                }
            }
        }

        /// The same request on the same snapshot always yields the same rows
        #[test]
        fn prop_idempotent(
            moves in prop::collection::vec((site_strategy(), item_strategy(), 0i64..100, 0i64..100), 1..30)
        ) {
            let tables = Tables {
                inventory_transactions: Some(
                    moves.iter().map(|(s, i, d, c)| movement(s, i, *d, *c)).collect(),
                ),
                ..fixture_tables()
            };
            let service = service_for(tables);

            let first = service.stock_by_site_report(&ReportParams::default()).map(|r| r.data);
            let second = service.stock_by_site_report(&ReportParams::default()).map(|r| r.data);
            prop_assert_eq!(first, second);
        }
    }
}
