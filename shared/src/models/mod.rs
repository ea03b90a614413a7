//! Domain models for the DustReports analytics platform

mod master;
mod report;
mod transaction;

pub use master::*;
pub use report::*;
pub use transaction::*;
