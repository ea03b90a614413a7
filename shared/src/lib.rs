//! Shared types and models for the DustReports analytics platform
//!
//! This crate contains the snapshot row models, report shapes and the lenient
//! field coercion used by the backend loader and the report engine.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
