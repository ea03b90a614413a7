//! Report engine services for DustReports

pub mod category_sales;
pub mod enrichment;
pub mod metrics;
pub mod query;
pub mod recency;
pub mod reference;
pub mod reporting;
pub mod sales;
pub mod stock;

pub use query::{DegradationPolicy, EngineSettings, QueryShape, ReportFilter};
pub use reporting::ReportingService;
