mod master;
mod payment;
mod sales;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::document::normalize_document_str;

pub use master::{IdSequence, IncomeColumn, MasterRecord, MasterTable, ReplaceSummary, columns};
pub use master::{ID_PREFIX, MASTER_COLUMNS, SHEET_NAME};
pub use payment::{DailyPaymentGroup, PaymentTransaction};
pub use sales::SalesEntry;

/// Matching key between master rows and the payments / sales exports:
/// normalized document number plus calendar day
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DayKey {
    pub document: String,
    pub day: NaiveDate,
}

impl DayKey {
    /// `None` when the document normalizes to nothing
    pub fn new(document: &str, day: NaiveDate) -> Option<Self> {
        let document = normalize_document_str(document);
        if document.is_empty() {
            return None;
        }
        Some(DayKey { document, day })
    }
}

/// Trimmed text of a cell; empty cells and blank strings are `None`.
/// Whole numbers print without a decimal part ("123" rather than "123.0").
pub fn cell_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => crate::utils::normalize_string(s),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(int), _) => int.to_string(),
            (None, Some(float)) if float.fract() == 0.0 && float.abs() < 1e15 => {
                format!("{float:.0}")
            }
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };
    if text.is_empty() { None } else { Some(text) }
}

/// Integer value of a cell; text is parsed leniently, fractions are truncated
pub fn cell_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}
