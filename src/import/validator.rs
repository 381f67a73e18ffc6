use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::debug;

use super::types::*;
use crate::excel::{excel_serial_to_datetime, CellValue};

pub const TITLE_REQUIRED: &str = "Title is required";
pub const DEADLINE_REQUIRED: &str = "Deadline is required";
pub const DEADLINE_INVALID: &str = "Deadline must be a valid date";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Validate one candidate, reporting every failing field at once.
///
/// Fields are checked in the order title, deadline, priority, description.
/// Priority and description never fail: an unknown priority becomes
/// `medium`, a missing description becomes empty.
pub fn validate_candidate(candidate: &CandidateRecord) -> RecordOutcome {
    let mut errors = Vec::new();

    let title = required_text(&candidate.title);
    if title.is_none() {
        errors.push(FieldError::new("title", TITLE_REQUIRED));
    }

    let deadline = match required_text(&candidate.deadline) {
        None => {
            errors.push(FieldError::new("deadline", DEADLINE_REQUIRED));
            None
        }
        Some(_) => {
            let parsed = parse_deadline(&candidate.deadline);
            if parsed.is_none() {
                errors.push(FieldError::new("deadline", DEADLINE_INVALID));
            }
            parsed
        }
    };

    let priority = resolve_priority(&candidate.priority);

    let description = candidate
        .description
        .as_text()
        .map(|d| d.trim().to_string())
        .unwrap_or_default();

    match (title, deadline) {
        (Some(title), Some(deadline)) if errors.is_empty() => Ok(ValidatedTask {
            title,
            description,
            deadline,
            priority,
            category: candidate.category,
        }),
        _ => Err(RowValidationFailure::new(
            candidate.category,
            candidate.row_position,
            errors,
        )),
    }
}

/// Trimmed text of a cell, or None when absent or blank
fn required_text(value: &CellValue) -> Option<String> {
    value
        .as_text()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn resolve_priority(value: &CellValue) -> PriorityLevel {
    let raw = value.as_text().map(|s| s.trim().to_string()).unwrap_or_default();

    match PriorityLevel::parse(&raw) {
        Some(priority) => priority,
        None => {
            if !raw.is_empty() {
                debug!("Unrecognized priority '{}', using default", raw);
            }
            PriorityLevel::default()
        }
    }
}

/// Interpret a deadline cell as a point in time. Naive values are read as UTC.
pub fn parse_deadline(value: &CellValue) -> Option<DateTime<Utc>> {
    match value {
        CellValue::Number(serial) => excel_serial_to_datetime(*serial).map(|dt| dt.and_utc()),
        CellValue::String(s) | CellValue::DateTime(s) => parse_deadline_text(s.trim()),
        _ => None,
    }
}

fn parse_deadline_text(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}
