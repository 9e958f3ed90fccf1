//! Audit CSV files listing what a pass wrote into the master.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::reconcile::Assignment;
use crate::sales_report::SalesUpdate;

/// Write one CSV row per item, headers taken from the field names
pub fn write_audit_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for row in rows {
        wtr.serialize(row)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_assignments(path: &Path, assignments: &[Assignment]) -> Result<()> {
    write_audit_csv(path, assignments)
}

pub fn write_sales_updates(path: &Path, updates: &[SalesUpdate]) -> Result<()> {
    write_audit_csv(path, updates)
}
