//! Excel module for decoding uploaded workbooks and writing templates.
//!
//! This module provides:
//! - Decoding spreadsheet bytes into named sheets of header-keyed rows
//! - Writing workbooks (import templates, fixtures)

pub mod types;
pub mod reader;
pub mod writer;

// Re-export commonly used types and functions
pub use types::*;
pub use reader::{read_workbook, read_workbook_file, read_upload, compute_checksum, excel_serial_to_datetime};
pub use writer::{export_sheets, create_template, SheetData};
