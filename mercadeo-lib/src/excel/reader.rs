use std::path::Path;

use anyhow::Result;
use calamine::{Data, Reader, Xlsx, open_workbook};
use log::warn;
use serde_json::{Map, Value, json};

use crate::error::PipelineError;
use crate::model::MasterTable;
use crate::utils::{excel_serial_to_datetime, normalize_string};

/// Type alias for a parsed Excel row with its 1-based sheet row number and cells by header
pub type ParsedExcelRow = (usize, Map<String, Value>);

/// Headers and non-empty rows of one worksheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetData {
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<ParsedExcelRow>,
}

impl SheetData {
    pub fn maps(&self) -> impl Iterator<Item = &Map<String, Value>> {
        self.rows.iter().map(|(_, row)| row)
    }
}

/// Read one worksheet (the first one when `sheet_name` is `None`).
///
/// The first row holds the headers, normalized with [`normalize_string`].
/// Empty rows are skipped. A repeated header keeps its first column.
pub fn read_sheet(path: &Path, sheet_name: Option<&str>) -> Result<SheetData> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", path.display(), e))?;

    let sheet_name = match sheet_name {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| PipelineError::SheetRead {
                sheet: path.display().to_string(),
                message: "the workbook has no worksheets".to_string(),
            })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| PipelineError::SheetRead {
            sheet: sheet_name.clone(),
            message: e.to_string(),
        })?;

    let mut headers: Vec<String> = Vec::new();
    let mut parsed_rows: Vec<ParsedExcelRow> = Vec::new();

    for (row_index, row) in range.rows().enumerate() {
        if row_index == 0 {
            headers = row
                .iter()
                .map(|cell| normalize_string(&cell.to_string()))
                .collect();
            continue;
        }

        // Skip empty rows
        let is_empty_row = row.iter().all(|cell| match cell {
            Data::Empty => true,
            Data::String(s) => s.trim().is_empty(),
            Data::Error(_) => true,
            _ => false,
        });
        if is_empty_row {
            continue;
        }

        let mut json_obj = Map::new();
        for (col_idx, cell) in row.iter().enumerate() {
            let Some(header) = headers.get(col_idx) else {
                break;
            };
            if header.is_empty() || json_obj.contains_key(header) {
                continue;
            }
            json_obj.insert(header.clone(), convert_cell(cell));
        }

        parsed_rows.push((row_index + 1, json_obj));
    }

    let mut seen: Vec<&String> = Vec::new();
    for header in headers.iter().filter(|h| !h.is_empty()) {
        if seen.contains(&header) {
            warn!("Sheet '{sheet_name}' repeats column '{header}', keeping the first one");
        } else {
            seen.push(header);
        }
    }

    Ok(SheetData {
        sheet_name,
        headers,
        rows: parsed_rows,
    })
}

/// Read the master workbook. The named sheet is preferred; masters written
/// by older runs may only have a default first sheet.
pub fn read_master(path: &Path, sheet_name: &str) -> Result<MasterTable> {
    let sheet = match read_sheet(path, Some(sheet_name)) {
        Ok(sheet) => sheet,
        Err(e) => {
            warn!(
                "Sheet '{sheet_name}' not readable in {} ({e}), using the first sheet",
                path.display()
            );
            read_sheet(path, None)?
        }
    };
    Ok(MasterTable::from_rows(sheet.maps()))
}

/// Convert a calamine cell to a JSON value. Date cells become
/// `YYYY-MM-DD HH:MM:SS` text, whole floats become integers.
pub fn convert_cell(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => {
            if s.trim().is_empty() {
                Value::Null
            } else {
                Value::String(s.clone())
            }
        }
        Data::Float(f) => convert_float(*f),
        Data::Int(i) => json!(*i),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(|datetime| Value::String(datetime.format("%Y-%m-%d %H:%M:%S").to_string()))
            .unwrap_or(Value::Null),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
    }
}

fn convert_float(f: f64) -> Value {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        json!(f as i64)
    } else {
        json!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_cell_values() {
        assert_eq!(convert_cell(&Data::Empty), Value::Null);
        assert_eq!(convert_cell(&Data::String("   ".to_string())), Value::Null);
        assert_eq!(
            convert_cell(&Data::String("Efectivo".to_string())),
            json!("Efectivo")
        );
        assert_eq!(convert_cell(&Data::Float(52345678.0)), json!(52345678));
        assert_eq!(convert_cell(&Data::Float(1.5)), json!(1.5));
        assert_eq!(convert_cell(&Data::Int(7)), json!(7));
        assert_eq!(convert_cell(&Data::Bool(true)), json!(true));
        assert_eq!(
            convert_cell(&Data::DateTimeIso("2026-02-03T10:00:00".to_string())),
            json!("2026-02-03T10:00:00")
        );
    }
}
