mod reader;
mod writer;

pub use reader::{ParsedExcelRow, SheetData, convert_cell, read_master, read_sheet};
pub use writer::{WriteOptions, write_master};
