use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Date format of the `Fecha` column in the master workbook
pub const MASTER_DATE_FORMAT: &str = "%d/%m/%Y";

const DATETIME_FORMATS: [&str; 7] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y"];

// Excel serial numbers above this value are past the year 9999
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

pub fn get_utc_iso_datetime() -> String {
    let timestamp = chrono::Utc::now().to_rfc3339();
    return timestamp;
}

/// Convert an Excel serial date (days since 1899-12-30, fraction = time of day)
pub fn excel_serial_to_datetime(value: f64) -> Option<NaiveDateTime> {
    if !value.is_finite() || value < 0.0 || value > MAX_EXCEL_SERIAL {
        return None;
    }
    let excel_base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = value.trunc() as i64;
    let seconds = ((value - days as f64) * 86400.0).round() as i64;
    return Some(excel_base + Duration::days(days) + Duration::seconds(seconds));
}

/// Parse a date out of a text cell. Day-first formats win over month-first
/// because the clinic system exports dates as dd/mm/YYYY.
pub fn parse_date_str(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(datetime.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }
    None
}

/// Calendar day of a cell, whatever way the workbook stored it
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date_str(s),
        Value::Number(n) => n
            .as_f64()
            .and_then(excel_serial_to_datetime)
            .map(|datetime| datetime.date()),
        _ => None,
    }
}

pub fn format_master_date(date: NaiveDate) -> String {
    date.format(MASTER_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_excel_serial_to_datetime() {
        let datetime = excel_serial_to_datetime(45537.5).unwrap();
        assert_eq!(datetime.date(), day(2024, 9, 2));
        assert_eq!(datetime.format("%H:%M").to_string(), "12:00");
        assert!(excel_serial_to_datetime(-1.0).is_none());
        assert!(excel_serial_to_datetime(f64::NAN).is_none());
    }

    #[test]
    fn test_parse_date_str_formats() {
        assert_eq!(parse_date_str("2026-02-03 10:15:00"), Some(day(2026, 2, 3)));
        assert_eq!(parse_date_str("2026-02-03T10:15:00"), Some(day(2026, 2, 3)));
        assert_eq!(parse_date_str("2026-02-03"), Some(day(2026, 2, 3)));
        assert_eq!(parse_date_str("03/02/2026"), Some(day(2026, 2, 3)));
        assert_eq!(parse_date_str("03/02/2026 08:30"), Some(day(2026, 2, 3)));
        assert_eq!(parse_date_str("not a date"), None);
        assert_eq!(parse_date_str("   "), None);
    }

    #[test]
    fn test_parse_date_from_cell_values() {
        assert_eq!(parse_date(&json!("05/02/2026")), Some(day(2026, 2, 5)));
        assert_eq!(parse_date(&json!(46058)), Some(day(2026, 2, 5)));
        assert_eq!(parse_date(&Value::Null), None);
        assert_eq!(parse_date(&json!(true)), None);
    }

    #[test]
    fn test_format_master_date() {
        assert_eq!(format_master_date(day(2026, 2, 9)), "09/02/2026");
    }
}
