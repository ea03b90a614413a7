//! Report handlers with optional CSV export

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::{CategorySalesParams, ReportParams};

use crate::error::{AppError, AppResult};
use crate::services::ReportingService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>, // "json" or "csv"
}

enum ExportFormat {
    Json,
    Csv,
}

impl ExportQuery {
    fn export_format(&self) -> AppResult<ExportFormat> {
        match self.format.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("json") => Ok(ExportFormat::Json),
            Some("csv") => Ok(ExportFormat::Csv),
            Some(other) => Err(AppError::Validation {
                field: "format".to_string(),
                message: format!("Unsupported export format: {}", other),
            }),
        }
    }
}

fn reporting_service(state: &AppState) -> ReportingService {
    ReportingService::new(
        state.store.current(),
        state.config.engine.clone(),
        Utc::now().date_naive(),
    )
}

fn attachment(csv: String, filename: &str) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", filename);
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response()
}

fn csv_response<T: Serialize>(rows: &[T], filename: &str) -> AppResult<Response> {
    let csv = ReportingService::export_to_csv(rows)?;
    Ok(attachment(csv, filename))
}

/// Stock, sales velocity and autonomy per site and item
pub async fn autonomy_report(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
    body: Option<Json<ReportParams>>,
) -> AppResult<Response> {
    let format = query.export_format()?;
    let params = body.map(|Json(params)| params).unwrap_or_default();

    let report = reporting_service(&state).autonomy_report(&params)?;
    tracing::info!(rows = report.metadata.total_rows, "Autonomy report generated");

    match format {
        ExportFormat::Csv => csv_response(&report.data, "autonomy_report.csv"),
        ExportFormat::Json => Ok(Json(report).into_response()),
    }
}

/// Current stock per site, with category and multi-site filters
pub async fn stock_by_site_report(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
    body: Option<Json<ReportParams>>,
) -> AppResult<Response> {
    let format = query.export_format()?;
    let params = body.map(|Json(params)| params).unwrap_or_default();

    let report = reporting_service(&state).stock_by_site_report(&params)?;
    tracing::info!(rows = report.metadata.total_rows, "Stock by site report generated");

    match format {
        ExportFormat::Csv => csv_response(&report.data, "stock_by_site_report.csv"),
        ExportFormat::Json => Ok(Json(report).into_response()),
    }
}

/// Retail-region sales of the cement category
pub async fn category_sales_report(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
    body: Option<Json<CategorySalesParams>>,
) -> AppResult<Response> {
    let format = query.export_format()?;
    let params = body.map(|Json(params)| params).unwrap_or_default();

    let report = reporting_service(&state).category_sales_report(&params)?;
    tracing::info!(
        sites = report.metadata.total_sites,
        category = %report.metadata.category_name,
        "Category sales report generated"
    );

    match format {
        ExportFormat::Csv => {
            let csv = ReportingService::export_category_sales_csv(&report)?;
            Ok(attachment(csv, "ciment_report.csv"))
        }
        ExportFormat::Json => Ok(Json(report).into_response()),
    }
}
