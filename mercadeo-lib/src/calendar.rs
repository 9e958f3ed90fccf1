use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Spanish month names, as written to the `Mes` column
pub const MONTH_NAMES: [&str; 12] = [
    "ENERO",
    "FEBRERO",
    "MARZO",
    "ABRIL",
    "MAYO",
    "JUNIO",
    "JULIO",
    "AGOSTO",
    "SEPTIEMBRE",
    "OCTUBRE",
    "NOVIEMBRE",
    "DICIEMBRE",
];

/// `month` is 1-based
pub fn month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_NAMES.get(index).copied()
}

/// A named, closed date interval (both ends included)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekBucket {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekBucket {
    pub fn new(label: &str, start: NaiveDate, end: NaiveDate) -> Self {
        WeekBucket {
            label: label.to_string(),
            start,
            end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Year, month and week labels derived from one calendar day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateLabels {
    pub year: i32,
    pub month: Option<&'static str>,
    pub week: Option<String>,
}

/// The week buckets configured for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekCalendar {
    buckets: Vec<WeekBucket>,
}

impl WeekCalendar {
    pub fn new(buckets: Vec<WeekBucket>) -> Result<Self, PipelineError> {
        for bucket in &buckets {
            if bucket.label.trim().is_empty() {
                return Err(PipelineError::InvalidConfig(
                    "week buckets need a non-empty label".to_string(),
                ));
            }
            if bucket.start > bucket.end {
                return Err(PipelineError::InvalidConfig(format!(
                    "week {} starts on {} after it ends on {}",
                    bucket.label, bucket.start, bucket.end
                )));
            }
        }

        for (index, bucket) in buckets.iter().enumerate() {
            let repeated = buckets[..index]
                .iter()
                .any(|earlier| earlier.label.eq_ignore_ascii_case(&bucket.label));
            if repeated {
                return Err(PipelineError::InvalidConfig(format!(
                    "week label {} is configured more than once",
                    bucket.label
                )));
            }
        }

        Ok(WeekCalendar { buckets })
    }

    pub fn buckets(&self) -> &[WeekBucket] {
        &self.buckets
    }

    /// Label of the first configured bucket containing `date`
    pub fn bucket_for(&self, date: NaiveDate) -> Option<&str> {
        self.buckets
            .iter()
            .find(|bucket| bucket.contains(date))
            .map(|bucket| bucket.label.as_str())
    }

    /// Whether rows labeled `label` are rebuilt by this run (case-insensitive)
    pub fn is_recomputed(&self, label: &str) -> bool {
        let label = label.trim();
        self.buckets
            .iter()
            .any(|bucket| bucket.label.eq_ignore_ascii_case(label))
    }

    pub fn labels_for(&self, date: NaiveDate) -> DateLabels {
        DateLabels {
            year: date.year(),
            month: month_name(date.month()),
            week: self.bucket_for(date).map(str::to_string),
        }
    }

    /// The four weeks of February 2026, Monday to Saturday
    pub fn february_2026() -> Self {
        let day = |d| NaiveDate::from_ymd_opt(2026, 2, d).unwrap_or(NaiveDate::MIN);
        WeekCalendar {
            buckets: vec![
                WeekBucket::new("SEMANA1", day(2), day(7)),
                WeekBucket::new("SEMANA2", day(9), day(14)),
                WeekBucket::new("SEMANA3", day(16), day(21)),
                WeekBucket::new("SEMANA4", day(23), day(28)),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    #[test]
    fn test_month_name_lookup() {
        assert_eq!(month_name(1), Some("ENERO"));
        assert_eq!(month_name(12), Some("DICIEMBRE"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let calendar = WeekCalendar::february_2026();
        assert_eq!(calendar.bucket_for(day(2, 2)), Some("SEMANA1"));
        assert_eq!(calendar.bucket_for(day(2, 7)), Some("SEMANA1"));
        assert_eq!(calendar.bucket_for(day(2, 28)), Some("SEMANA4"));
    }

    #[test]
    fn test_dates_outside_every_bucket() {
        let calendar = WeekCalendar::february_2026();
        // Sundays and days around the month are not configured
        assert_eq!(calendar.bucket_for(day(2, 1)), None);
        assert_eq!(calendar.bucket_for(day(2, 8)), None);
        assert_eq!(calendar.bucket_for(day(3, 1)), None);
    }

    #[test]
    fn test_is_recomputed_ignores_case() {
        let calendar = WeekCalendar::february_2026();
        assert!(calendar.is_recomputed("semana2"));
        assert!(calendar.is_recomputed(" SEMANA3 "));
        assert!(!calendar.is_recomputed("SEMANA5"));
    }

    #[test]
    fn test_labels_for_date() {
        let calendar = WeekCalendar::february_2026();
        let labels = calendar.labels_for(day(2, 10));
        assert_eq!(labels.year, 2026);
        assert_eq!(labels.month, Some("FEBRERO"));
        assert_eq!(labels.week.as_deref(), Some("SEMANA2"));
        assert_eq!(calendar.labels_for(day(2, 15)).week, None);
    }

    #[test]
    fn test_new_rejects_bad_buckets() {
        let reversed = WeekBucket::new("SEMANA1", day(2, 7), day(2, 2));
        assert!(WeekCalendar::new(vec![reversed]).is_err());

        let first = WeekBucket::new("SEMANA1", day(2, 2), day(2, 7));
        let repeated = WeekBucket::new("semana1", day(2, 9), day(2, 14));
        assert!(WeekCalendar::new(vec![first, repeated]).is_err());
    }
}
