// Test utilities available to both unit and integration tests
// Only compiled when testing

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::calendar::WeekCalendar;
use crate::excel::SheetData;
use crate::model::{MasterRecord, PaymentTransaction, SalesEntry};

/// A day of February 2026
pub fn feb(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
}

pub fn february_calendar() -> WeekCalendar {
    WeekCalendar::february_2026()
}

/// Appointment row as pass 01 would build it, labeled with the February weeks
pub fn master_record(id: &str, document: &str, date: NaiveDate) -> MasterRecord {
    let labels = february_calendar().labels_for(date);
    MasterRecord {
        id: id.to_string(),
        document: document.to_string(),
        patient: Some(format!("Paciente {document}")),
        agreement: Some("PARTICULAR".to_string()),
        date: Some(date),
        year: Some(labels.year),
        month: labels.month.map(str::to_string),
        week: labels.week,
        professional: Some("Dra. Gomez".to_string()),
        specialty: Some("Odontologia General".to_string()),
        scheduled: Some(1),
        attended: Some(1),
        ..MasterRecord::default()
    }
}

pub fn payment(document: &str, date: NaiveDate, amount: i64, invoice: &str, method: &str) -> PaymentTransaction {
    PaymentTransaction {
        document: document.to_string(),
        paid_on: Some(date),
        amount,
        invoice: invoice.to_string(),
        method: method.to_string(),
        biller: "Caja".to_string(),
        ..PaymentTransaction::default()
    }
}

pub fn sales_entry(document: &str, date: NaiveDate, income: i64) -> SalesEntry {
    SalesEntry {
        document: document.to_string(),
        operated_on: Some(date),
        concept: "radiografia panoramica".to_string(),
        patient: Some(format!("Paciente {document}")),
        doctor: Some("Dr. Rojas".to_string()),
        income,
    }
}

/// In-memory sheet from headers and rows of cells, numbered from row 2
pub fn sheet(headers: &[&str], rows: Vec<Vec<Value>>) -> SheetData {
    let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let rows = rows
        .into_iter()
        .enumerate()
        .map(|(index, cells)| {
            let map: Map<String, Value> = headers.iter().cloned().zip(cells).collect();
            (index + 2, map)
        })
        .collect();
    SheetData {
        sheet_name: "Hoja1".to_string(),
        headers,
        rows,
    }
}
