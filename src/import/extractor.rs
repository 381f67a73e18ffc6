use log::debug;

use super::types::{CandidateRecord, Category};
use crate::excel::{CellValue, Row, Sheet, Workbook};

/// Known task columns, in template order
pub const TASK_COLUMNS: [&str; 4] = ["title", "description", "deadline", "priority"];

/// Sheet row of the first data row (the header sits on row 1)
const FIRST_DATA_ROW: u32 = 2;

/// Resolved header names for the known columns of one sheet
#[derive(Debug, Default)]
struct ColumnMap {
    title: Option<String>,
    description: Option<String>,
    deadline: Option<String>,
    priority: Option<String>,
}

impl ColumnMap {
    /// Match known columns against the sheet headers, ignoring case and
    /// surrounding whitespace. Unknown headers are dropped.
    fn build(sheet: &Sheet) -> Self {
        let find = |name: &str| {
            sheet
                .headers
                .iter()
                .find(|h| h.trim().eq_ignore_ascii_case(name))
                .cloned()
        };

        ColumnMap {
            title: find("title"),
            description: find("description"),
            deadline: find("deadline"),
            priority: find("priority"),
        }
    }

    fn value(row: &Row, header: &Option<String>) -> CellValue {
        header
            .as_deref()
            .and_then(|h| row.get(h))
            .cloned()
            .unwrap_or_default()
    }
}

/// Walk the recognized category sheets and turn each row into a candidate.
///
/// Sheets are visited in [`Category::ALL`] order regardless of workbook order;
/// any other sheet is skipped.
pub fn extract_candidates(workbook: &Workbook) -> Vec<CandidateRecord> {
    let mut candidates = Vec::new();

    for category in Category::ALL {
        let Some(sheet) = workbook.sheet(category.as_str()) else {
            continue;
        };

        let before = candidates.len();
        extract_sheet(sheet, category, &mut candidates);
        debug!(
            "Extracted {} candidates from sheet '{}'",
            candidates.len() - before,
            category
        );
    }

    for name in workbook.sheet_names() {
        if Category::from_sheet_name(name).is_none() {
            debug!("Skipping unrecognized sheet '{}'", name);
        }
    }

    candidates
}

fn extract_sheet(sheet: &Sheet, category: Category, out: &mut Vec<CandidateRecord>) {
    let columns = ColumnMap::build(sheet);

    for (index, row) in sheet.rows.iter().enumerate() {
        out.push(CandidateRecord {
            title: ColumnMap::value(row, &columns.title),
            description: ColumnMap::value(row, &columns.description),
            deadline: ColumnMap::value(row, &columns.deadline),
            priority: ColumnMap::value(row, &columns.priority),
            category,
            row_position: index as u32 + FIRST_DATA_ROW,
        });
    }
}
