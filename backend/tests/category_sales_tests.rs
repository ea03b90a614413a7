//! Category sales report tests
//!
//! Tests for the retail-region category report including:
//! - Category selection by keyword
//! - Sale-only, site-sales-only counting
//! - Per-site totals and amounts
//! - Degraded inputs
//! - Flattened CSV export
//! - JSON shape of the per-item maps

use chrono::NaiveDate;
use dust_reports::error::ReportError;
use dust_reports::services::category_sales::{category_sales_report, find_category};
use dust_reports::services::{EngineSettings, ReportingService};
use dust_reports::snapshot::Tables;
use rust_decimal::Decimal;
use shared::{Category, Item, SalesLine, Site};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn site(id: &str, name: &str, group: &str) -> Site {
    Site {
        id: id.to_string(),
        name: name.to_string(),
        site_group_code: Some(group.to_string()),
    }
}

fn category(id: &str, name: &str) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn item(code: &str, category: &str, price: i64) -> Item {
    Item {
        code: code.to_string(),
        name: format!("Article {}", code),
        category_id: Some(category.to_string()),
        unit: "SAC".to_string(),
        unit_price: Some(Decimal::from(price)),
    }
}

fn line(site: &str, item: &str, day: NaiveDate, qty: i64, kind: i32, sid: &str) -> SalesLine {
    SalesLine {
        site: site.to_string(),
        item: item.to_string(),
        date: Some(day),
        qty: Some(Decimal::from(qty)),
        transaction_type: Some(kind),
        sid: Some(sid.to_string()),
        invoice_id: None,
    }
}

fn fixture_tables() -> Tables {
    Tables {
        sites: Some(vec![
            site("R1", "Zeta", "3700002"),
            site("R2", "Alpha", "3700002"),
            site("D1", "Depot", "3700004"),
        ]),
        categories: Some(vec![category("5", "Divers"), category("4", "CIMENT GRIS")]),
        inventory_items: Some(vec![
            item("C1", "4", 10),
            item("C2", "4", 20),
            item("C3", "4", 30),
            item("X1", "5", 1),
        ]),
        sales_details: Some(vec![
            line("R1", "C1", date(2024, 3, 1), 5, 1, "530001"),
            line("R1", "C1", date(2024, 3, 2), 2, 2, "530001"),
            line("R2", "C2", date(2024, 3, 15), 3, 1, "530002"),
            line("R1", "C2", date(2024, 3, 15), 1, 1, "610001"),
            line("D1", "C1", date(2024, 3, 1), 100, 1, "530009"),
            line("R1", "X1", date(2024, 3, 1), 9, 1, "530001"),
        ]),
        ..Tables::default()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_find_category_by_keyword_order() {
        let keywords = vec!["ciment".to_string(), "cement".to_string()];

        let categories = vec![category("1", "Cement Portland"), category("2", "Ciment Local")];
        assert_eq!(find_category(&categories, &keywords).map(|c| c.id.as_str()), Some("2"));

        let categories = vec![category("1", "Cement Portland")];
        assert_eq!(find_category(&categories, &keywords).map(|c| c.id.as_str()), Some("1"));

        let categories = vec![category("1", "Boissons")];
        assert!(find_category(&categories, &keywords).is_none());
    }

    #[test]
    fn test_report_rows_per_retail_site() {
        let report =
            category_sales_report(&fixture_tables(), &EngineSettings::default(), None, None).unwrap();

        let names: Vec<&str> = report.data.iter().map(|r| r.site_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);

        let alpha = &report.data[0];
        assert_eq!(alpha.total_sales_qty, Decimal::from(3));
        assert_eq!(alpha.total_amount, Decimal::from(60));
        assert_eq!(alpha.articles_with_sales, 1);
        assert_eq!(alpha.sales_by_item.get("C1"), Some(&Decimal::ZERO));

        // return lines and office sales are not counted
        let zeta = &report.data[1];
        assert_eq!(zeta.total_sales_qty, Decimal::from(5));
        assert_eq!(zeta.total_amount, Decimal::from(50));
        assert_eq!(zeta.amounts_by_item.get("C2"), Some(&Decimal::ZERO));
    }

    #[test]
    fn test_metadata_lists_active_items() {
        let report =
            category_sales_report(&fixture_tables(), &EngineSettings::default(), None, None).unwrap();
        let metadata = &report.metadata;

        assert_eq!(metadata.category_id, "4");
        assert_eq!(metadata.category_name, "CIMENT GRIS");
        assert_eq!(metadata.total_sites, 2);
        assert_eq!(metadata.total_items_in_category, 3);
        assert_eq!(metadata.active_items_shown, 2);
        let codes: Vec<&str> = metadata.items.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["C1", "C2"]);
        assert_eq!(metadata.items[0].name, "Article C1");
    }

    /// Sales outside the retail region never make an item active
    #[test]
    fn test_items_sold_only_outside_region_are_hidden() {
        let tables = Tables {
            sales_details: Some(vec![
                line("R1", "C1", date(2024, 3, 1), 5, 1, "530001"),
                line("D1", "C3", date(2024, 3, 1), 40, 1, "530009"),
                line("X9", "C2", date(2024, 3, 1), 8, 1, "530010"),
            ]),
            ..fixture_tables()
        };

        let report = category_sales_report(&tables, &EngineSettings::default(), None, None).unwrap();

        let codes: Vec<&str> = report.metadata.items.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["C1"]);
        assert_eq!(report.metadata.active_items_shown, 1);
        assert!(report
            .data
            .iter()
            .all(|r| r.sales_by_item.len() == 1 && r.sales_by_item.contains_key("C1")));
    }

    /// Per-item quantities and amounts are JSON numbers like the totals
    #[test]
    fn test_item_maps_serialize_as_numbers() {
        let report =
            category_sales_report(&fixture_tables(), &EngineSettings::default(), None, None).unwrap();

        let alpha = serde_json::to_value(&report.data[0]).unwrap();

        assert_eq!(alpha["total_amount"], 60.0);
        assert_eq!(alpha["sales_by_item"]["C1"], 0.0);
        assert_eq!(alpha["sales_by_item"]["C2"], 3.0);
        assert_eq!(alpha["amounts_by_item"]["C2"], 60.0);
        assert!(alpha["amounts_by_item"]["C1"].is_f64());
    }

    #[test]
    fn test_date_window() {
        let report = category_sales_report(
            &fixture_tables(),
            &EngineSettings::default(),
            Some(date(2024, 3, 10)),
            Some(date(2024, 3, 31)),
        )
        .unwrap();

        assert_eq!(report.metadata.active_items_shown, 1);
        assert!(report.data.iter().all(|r| !r.sales_by_item.contains_key("C1")));
        assert_eq!(report.metadata.from_date, Some(date(2024, 3, 10)));
    }

    #[test]
    fn test_without_sales_table_every_item_is_shown() {
        let tables = Tables {
            sales_details: None,
            ..fixture_tables()
        };

        let report = category_sales_report(&tables, &EngineSettings::default(), None, None).unwrap();
        assert_eq!(report.metadata.active_items_shown, 3);
        assert!(report
            .data
            .iter()
            .all(|r| r.total_sales_qty == Decimal::ZERO && r.sales_by_item.len() == 3));
    }

    #[test]
    fn test_csv_has_one_column_per_active_item() {
        let report =
            category_sales_report(&fixture_tables(), &EngineSettings::default(), None, None).unwrap();

        let csv = ReportingService::export_category_sales_csv(&report).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "site_id,site_name,total_amount,articles_with_sales,total_sales_qty,C1 - Article C1,C2 - Article C2"
        );
        assert_eq!(lines[1], "R2,Alpha,60,1,3,0,3");
        assert_eq!(lines[2], "R1,Zeta,50,1,5,5,0");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_missing_inputs_are_no_match() {
        let settings = EngineSettings::default();

        let no_sites = Tables {
            sites: None,
            ..fixture_tables()
        };
        assert!(matches!(
            category_sales_report(&no_sites, &settings, None, None),
            Err(ReportError::NoMatchingRows(_))
        ));

        let no_category = Tables {
            categories: Some(vec![category("5", "Divers")]),
            ..fixture_tables()
        };
        assert!(matches!(
            category_sales_report(&no_category, &settings, None, None),
            Err(ReportError::NoMatchingRows(_))
        ));

        let other_region = EngineSettings {
            retail_group_code: "9999999".to_string(),
            ..EngineSettings::default()
        };
        assert!(matches!(
            category_sales_report(&fixture_tables(), &other_region, None, None),
            Err(ReportError::NoMatchingRows(_))
        ));
    }
}
