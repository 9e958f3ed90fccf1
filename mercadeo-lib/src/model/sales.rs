use chrono::NaiveDate;

use super::DayKey;

/// One row of the sales report ("informe de ventas")
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesEntry {
    /// Normalized document number
    pub document: String,
    pub operated_on: Option<NaiveDate>,
    /// Accent-free lowercase concept text
    pub concept: String,
    pub patient: Option<String>,
    pub doctor: Option<String>,
    pub income: i64,
}

impl SalesEntry {
    pub fn key(&self) -> Option<DayKey> {
        DayKey::new(&self.document, self.operated_on?)
    }
}
