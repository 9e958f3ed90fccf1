use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde_json::Value;

use crate::model::{MASTER_COLUMNS, MasterTable, SHEET_NAME};

/// Accounting format of the collected column
const CURRENCY_FORMAT: &str = "\"$\"#,##0_-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    pub sheet_name: String,
    /// Header of a column to format as currency
    pub currency_column: Option<String>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            sheet_name: SHEET_NAME.to_string(),
            currency_column: None,
        }
    }
}

/// Write the master table to a single-sheet workbook, replacing `path`
pub fn write_master(table: &MasterTable, path: &Path, options: &WriteOptions) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&options.sheet_name)?;

    let header_format = Format::new().set_bold();
    let currency_format = Format::new().set_num_format(CURRENCY_FORMAT);
    let currency_col = options
        .currency_column
        .as_deref()
        .and_then(|name| MASTER_COLUMNS.iter().position(|c| *c == name));

    for (col, name) in MASTER_COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, &header_format)?;
    }

    for (row_idx, record) in table.records().iter().enumerate() {
        let row = (row_idx + 1) as u32;
        for (col, value) in record.to_cells().iter().enumerate() {
            let format = (currency_col == Some(col)).then_some(&currency_format);
            write_value(worksheet, row, col as u16, value, format)?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save Excel file: {}", path.display()))?;

    Ok(())
}

fn write_value(
    ws: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
    format: Option<&Format>,
) -> Result<()> {
    match value {
        Value::Null => { /* Leave cell empty */ }
        Value::String(s) => {
            ws.write_string(row, col, s)?;
        }
        Value::Number(n) => {
            let number = n.as_f64().unwrap_or_default();
            match format {
                Some(format) => {
                    ws.write_number_with_format(row, col, number, format)?;
                }
                None => {
                    ws.write_number(row, col, number)?;
                }
            }
        }
        Value::Bool(b) => {
            ws.write_boolean(row, col, *b)?;
        }
        Value::Array(_) | Value::Object(_) => {
            ws.write_string(row, col, value.to_string())?;
        }
    }
    Ok(())
}
