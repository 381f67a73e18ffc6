use std::io::Cursor;
use std::path::Path;
use umya_spreadsheet::{new_file_empty_worksheet, writer, Worksheet};

use super::types::{CellValue, ExcelError};

/// A named sheet of cell rows to be written out; the first row is usually the header
#[derive(Debug, Clone)]
pub struct SheetData {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetData {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        SheetData {
            name: name.into(),
            rows,
        }
    }
}

/// Write sheets to an in-memory xlsx file
pub fn export_sheets(sheets: &[SheetData]) -> Result<Vec<u8>, ExcelError> {
    if sheets.is_empty() {
        return Err(ExcelError::write_error("A workbook needs at least one sheet"));
    }

    let mut book = new_file_empty_worksheet();

    for data in sheets {
        let sheet = book
            .new_sheet(&data.name)
            .map_err(|e| ExcelError::write_error(format!("Failed to add sheet '{}': {}", data.name, e)))?;
        write_rows(sheet, &data.rows);
    }

    let mut buffer = Cursor::new(Vec::new());
    writer::xlsx::write_writer(&book, &mut buffer)
        .map_err(|e| ExcelError::write_error(format!("Failed to write workbook: {}", e)))?;

    Ok(buffer.into_inner())
}

/// Write an import template: one sheet per name, each holding just the header row
pub fn create_template(path: &str, sheet_names: &[&str], headers: &[&str]) -> Result<String, ExcelError> {
    let header_row: Vec<CellValue> = headers
        .iter()
        .map(|h| CellValue::String(h.to_string()))
        .collect();

    let sheets: Vec<SheetData> = sheet_names
        .iter()
        .map(|name| SheetData::new(*name, vec![header_row.clone()]))
        .collect();

    let bytes = export_sheets(&sheets)?;

    let file_path = Path::new(path);
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| ExcelError::write_error(format!("Failed to create directory: {}", e)))?;
    }

    std::fs::write(file_path, bytes)
        .map_err(|e| ExcelError::write_error(format!("Failed to save workbook: {}", e)))?;

    Ok(path.to_string())
}

fn write_rows(sheet: &mut Worksheet, rows: &[Vec<CellValue>]) {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            // Excel uses 1-based indexing
            let coordinate = ((col_idx + 1) as u32, (row_idx + 1) as u32);

            match value {
                CellValue::Empty => {}
                CellValue::String(s) | CellValue::DateTime(s) => {
                    // set_value would guess numbers and booleans from the text
                    sheet.get_cell_mut(coordinate).set_value_string(s);
                }
                CellValue::Number(n) => {
                    sheet.get_cell_mut(coordinate).set_value_number(*n);
                }
                CellValue::Boolean(b) => {
                    sheet.get_cell_mut(coordinate).set_value_bool(*b);
                }
                CellValue::Error(e) => {
                    // Can't really set an error value, so set as string
                    sheet.get_cell_mut(coordinate).set_value_string(format!("#{}", e));
                }
            }
        }
    }
}
