//! Reporting service: runs the stock and sales pipeline over one snapshot
//! and shapes the result into the exposed reports

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    parse_optional_date, AutonomyReport, AutonomyReportMetadata, CategorySalesParams,
    CategorySalesReport, ReportParams, StockBySiteMetadata, StockBySiteReport, StockSalesRow,
};

use super::category_sales::category_sales_report;
use super::enrichment::MasterData;
use super::metrics::{autonomy_days, depot_quantities, depot_sites};
use super::query::{EngineSettings, ReportFilter};
use super::recency::{apply_recency_filter, recency_cutoff};
use super::sales::{compute_sales, SalesStats};
use super::stock::{aggregate_stock, StockTotals};
use crate::error::{AppError, AppResult, ReportError, ReportResult};
use crate::snapshot::{Snapshot, Tables};

/// Report computation over a captured snapshot.
///
/// Build one per request: the snapshot it holds stays fixed even if a refresh
/// publishes a newer one meanwhile.
#[derive(Clone)]
pub struct ReportingService {
    snapshot: Arc<Snapshot>,
    settings: EngineSettings,
    today: NaiveDate,
}

impl ReportingService {
    /// `today` anchors the recency window
    pub fn new(snapshot: Arc<Snapshot>, settings: EngineSettings, today: NaiveDate) -> Self {
        Self {
            snapshot,
            settings,
            today,
        }
    }

    fn tables(&self) -> ReportResult<&Tables> {
        if self.snapshot.is_loaded() {
            Ok(&self.snapshot.tables)
        } else {
            Err(ReportError::NoDataLoaded)
        }
    }

    /// Enriched stock and sales rows for `filter`, in aggregation order
    pub fn stock_and_sales(&self, filter: &ReportFilter) -> ReportResult<Vec<StockSalesRow>> {
        let tables = self.tables()?;
        let policy = &self.settings.degradation;
        let prefix = self.settings.site_sales_prefix.as_str();

        let stock = aggregate_stock(
            tables.movements(),
            tables.items(),
            tables.sites(),
            filter,
            policy,
        )?;
        let sales = compute_sales(tables.sales(), filter, policy, prefix);

        let depots = depot_sites(tables.sites(), &self.settings.depot_group_code);
        let depot_qty = tables
            .movements()
            .map(|movements| depot_quantities(movements, &depots))
            .unwrap_or_default();

        let mut rows: Vec<StockSalesRow> = stock
            .rows
            .into_iter()
            .map(|totals| {
                let stats = sales.get(&totals.site, &totals.item);
                let depot_quantity = depot_qty
                    .get(totals.item.as_str())
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                merge_row(totals, stats, depot_quantity)
            })
            .collect();

        let cutoff = recency_cutoff(self.today, self.settings.recency_months);
        apply_recency_filter(&mut rows, filter, &depots, tables.sales(), prefix, cutoff);

        let master = MasterData::new(tables.sites(), tables.items(), tables.categories());
        for row in rows.iter_mut() {
            master.enrich(row);
        }

        if rows.is_empty() {
            return Err(ReportError::no_match("no data found for the specified criteria"));
        }
        tracing::debug!(rows = rows.len(), "Stock and sales rows computed");
        Ok(rows)
    }

    /// Autonomy report: item/site and sales window only
    pub fn autonomy_report(&self, params: &ReportParams) -> ReportResult<AutonomyReport> {
        let full = ReportFilter::from_params(params);
        let filter = ReportFilter {
            item_code: full.item_code,
            site_code: full.site_code,
            from_date: full.from_date,
            to_date: full.to_date,
            ..Default::default()
        };
        let data = self.stock_and_sales(&filter)?;

        let period_days = match (filter.from_date, filter.to_date) {
            (Some(from), Some(to)) => (to - from).num_days() + 1,
            _ => data.first().map(|row| row.sales_period_days).unwrap_or(0),
        };

        Ok(AutonomyReport {
            metadata: AutonomyReportMetadata {
                period_days,
                from_date: filter.from_date,
                to_date: filter.to_date,
                total_rows: data.len(),
            },
            data,
        })
    }

    /// Stock by site report, sorted for display
    pub fn stock_by_site_report(&self, params: &ReportParams) -> ReportResult<StockBySiteReport> {
        let full = ReportFilter::from_params(params);
        let filter = ReportFilter {
            from_date: None,
            to_date: None,
            ..full
        };
        let mut data = self.stock_and_sales(&filter)?;

        if filter.site_codes.len() > 1 {
            data.sort_by(|a, b| {
                a.item_name
                    .cmp(&b.item_name)
                    .then_with(|| b.current_stock.cmp(&a.current_stock))
            });
        } else {
            data.sort_by(|a, b| {
                a.site_name
                    .cmp(&b.site_name)
                    .then_with(|| b.current_stock.cmp(&a.current_stock))
            });
        }

        Ok(StockBySiteReport {
            metadata: StockBySiteMetadata {
                total_rows: data.len(),
                filters: filter.applied(),
            },
            data,
        })
    }

    /// Retail-region sales of the keyword-selected category
    pub fn category_sales_report(
        &self,
        params: &CategorySalesParams,
    ) -> ReportResult<CategorySalesReport> {
        let tables = self.tables()?;
        category_sales_report(
            tables,
            &self.settings,
            parse_optional_date(params.from_date.as_deref()),
            parse_optional_date(params.to_date.as_deref()),
        )
    }

    /// Export report rows to CSV format
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }

    /// Flatten the category sales report into one CSV row per site, with one
    /// quantity column per active item
    pub fn export_category_sales_csv(report: &CategorySalesReport) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        let mut header = vec![
            "site_id".to_string(),
            "site_name".to_string(),
            "total_amount".to_string(),
            "articles_with_sales".to_string(),
            "total_sales_qty".to_string(),
        ];
        header.extend(
            report
                .metadata
                .items
                .iter()
                .map(|item| format!("{} - {}", item.code, item.name)),
        );
        wtr.write_record(&header)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;

        for row in &report.data {
            let mut record = vec![
                row.site_id.clone(),
                row.site_name.clone(),
                row.total_amount.to_string(),
                row.articles_with_sales.to_string(),
                row.total_sales_qty.to_string(),
            ];
            record.extend(report.metadata.items.iter().map(|item| {
                row.sales_by_item
                    .get(&item.code)
                    .copied()
                    .unwrap_or_default()
                    .to_string()
            }));
            wtr.write_record(&record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }

        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}

fn merge_row(
    totals: StockTotals,
    stats: SalesStats,
    depot_quantity: Decimal,
) -> StockSalesRow {
    StockSalesRow {
        autonomy_days: autonomy_days(totals.current_stock, stats.avg_daily_sales),
        site: totals.site,
        item: totals.item,
        selected_sites: totals.selected_sites,
        total_in: totals.total_in,
        total_out: totals.total_out,
        current_stock: totals.current_stock,
        stock_transactions: totals.stock_transactions,
        max_daily_sales: stats.max_daily_sales,
        min_daily_sales: stats.min_daily_sales,
        avg_daily_sales: stats.avg_daily_sales,
        sales_transactions: stats.sales_transactions,
        total_sales_qty: stats.total_sales_qty,
        sales_period_days: stats.sales_period_days,
        depot_quantity,
        stock_value: Decimal::ZERO,
        site_name: String::new(),
        item_name: String::new(),
        category: String::new(),
        category_name: String::new(),
        unit: String::new(),
        unit_price: Decimal::ZERO,
    }
}
