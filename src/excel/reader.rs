use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::Path;

use super::types::*;

/// File extensions the reader accepts when loading from disk
const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Decode spreadsheet bytes into a workbook.
///
/// The first row of each sheet's used range is taken as the header row; every
/// following non-blank row becomes a [`Row`] keyed by those headers. Sheet and
/// row order are preserved.
pub fn read_workbook(bytes: &[u8]) -> Result<Workbook, ExcelError> {
    if bytes.is_empty() {
        return Err(ExcelError::malformed("Failed to open workbook: file is empty"));
    }

    let mut workbook: Sheets<_> = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ExcelError::malformed(format!("Failed to open workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for name in sheet_names {
        let range = workbook.worksheet_range(&name).map_err(|e| {
            ExcelError::malformed(format!("Failed to read sheet '{}': {}", name, e))
        })?;

        let sheet = read_sheet(&name, &range);
        debug!(
            "Decoded sheet '{}': {} columns, {} data rows",
            sheet.name,
            sheet.headers.len(),
            sheet.rows.len()
        );
        sheets.push(sheet);
    }

    Ok(Workbook { sheets })
}

/// Read a spreadsheet from disk, checking the extension before decoding
pub fn read_workbook_file(path: &str) -> Result<Workbook, ExcelError> {
    read_workbook(&read_upload(path)?)
}

/// Load the raw bytes of a spreadsheet file without decoding them
pub fn read_upload(path: &str) -> Result<Vec<u8>, ExcelError> {
    let file_path = Path::new(path);

    if !file_path.exists() {
        return Err(ExcelError::file_not_found(path));
    }

    check_extension(file_path)?;

    std::fs::read(file_path)
        .map_err(|e| ExcelError::malformed(format!("Failed to read file '{}': {}", path, e)))
}

fn check_extension(path: &Path) -> Result<(), ExcelError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(ExcelError::malformed(format!(
            "Unsupported file type '{}': expected one of {}",
            path.display(),
            SUPPORTED_EXTENSIONS.join(", ")
        )))
    }
}

/// Split a sheet range into header row and data rows
fn read_sheet(name: &str, range: &Range<Data>) -> Sheet {
    let mut rows_iter = range.rows();

    // (column index, header text) for every non-empty header cell
    let columns: Vec<(usize, String)> = match rows_iter.next() {
        Some(header_row) => header_row
            .iter()
            .enumerate()
            .filter_map(|(idx, cell)| {
                convert_cell_value(Some(cell))
                    .as_text()
                    .map(|h| h.trim().to_string())
                    .filter(|h| !h.is_empty())
                    .map(|h| (idx, h))
            })
            .collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::new();

    for raw_row in rows_iter {
        let values: Vec<CellValue> = raw_row.iter().map(|c| convert_cell_value(Some(c))).collect();

        if values.iter().all(CellValue::is_blank) {
            continue;
        }

        let cells = columns
            .iter()
            .map(|(idx, header)| (header.clone(), values.get(*idx).cloned().unwrap_or_default()))
            .collect();

        rows.push(Row { cells });
    }

    Sheet {
        name: name.to_string(),
        headers: columns.into_iter().map(|(_, h)| h).collect(),
        rows,
    }
}

/// Convert calamine Data to our CellValue
fn convert_cell_value(cell: Option<&Data>) -> CellValue {
    match cell {
        None => CellValue::Empty,
        Some(data) => match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::String(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Boolean(*b),
            Data::DateTime(dt) => match excel_serial_to_datetime(dt.as_f64()) {
                Some(datetime) => CellValue::DateTime(datetime.format("%Y-%m-%dT%H:%M:%S").to_string()),
                None => CellValue::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) => CellValue::DateTime(s.clone()),
            Data::DurationIso(s) => CellValue::String(s.clone()),
            Data::Error(e) => CellValue::Error(format!("{:?}", e)),
        },
    }
}

/// Convert an Excel serial date (days since 1899-12-30) to a naive date-time
pub fn excel_serial_to_datetime(value: f64) -> Option<NaiveDateTime> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    let days = value.floor() as i64;
    let total_seconds = (value.fract() * 86400.0).round() as i64;

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let midnight = NaiveDateTime::new(epoch, NaiveTime::from_hms_opt(0, 0, 0)?);

    // Huge serials saturate the cast; try_days returns None for them
    midnight
        .checked_add_signed(Duration::try_days(days)?)?
        .checked_add_signed(Duration::try_seconds(total_seconds)?)
}

/// Compute the SHA-256 checksum of an uploaded file's bytes
pub fn compute_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
