use std::path::Path;

use rust_xlsxwriter::Workbook;
use serde_json::Value;

// Re-export shared test utilities from src/test_utils.rs
pub use mercadeo_lib::test_utils::{
    feb, february_calendar, master_record, payment, sales_entry, sheet,
};

/// Write a single-sheet workbook shaped like the clinic exports
#[allow(dead_code)]
pub fn write_export(path: &Path, headers: &[&str], rows: &[Vec<Value>]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header).unwrap();
    }
    for (row_idx, row) in rows.iter().enumerate() {
        let row_number = (row_idx + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            match value {
                Value::String(s) => {
                    worksheet.write_string(row_number, col as u16, s).unwrap();
                }
                Value::Number(n) => {
                    worksheet
                        .write_number(row_number, col as u16, n.as_f64().unwrap())
                        .unwrap();
                }
                Value::Bool(b) => {
                    worksheet.write_boolean(row_number, col as u16, *b).unwrap();
                }
                _ => {}
            }
        }
    }
    workbook.save(path).unwrap();
}

/// Collected amounts of every row, in table order
#[allow(dead_code)]
pub fn collected(table: &mercadeo_lib::MasterTable) -> Vec<Option<i64>> {
    table.records().iter().map(|r| r.collected).collect()
}
