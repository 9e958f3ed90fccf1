#![allow(clippy::needless_return)]

pub mod amount;
pub mod calendar;
pub mod columns;
pub mod config;
pub mod document;
mod error;
pub mod excel;
pub mod model;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod sales_report;
pub mod source;
pub mod utils;

// Test utilities - only compiled when testing or with test feature
// #[cfg(test)] alone doesn't work for integration tests (they're external crates)
// The feature flag makes it available to integration tests via dev-dependencies
#[cfg(any(test, feature = "test"))]
pub mod test_utils;

pub use calendar::{WeekBucket, WeekCalendar};
pub use config::Config;
pub use error::PipelineError;
pub use model::{DayKey, MasterRecord, MasterTable, PaymentTransaction, SalesEntry};
pub use reconcile::{ReconcileOptions, reconcile_payments};
pub use sales_report::{SalesOptions, merge_sales};

pub const ERRORS_LOG_FILE: &str = "errors.log";
