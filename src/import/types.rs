use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::excel::CellValue;

/// Recurrence frequency of a task, decided by the sheet a row came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Category {
    /// Recognized sheets, in processing order
    pub const ALL: [Category; 4] = [
        Category::Daily,
        Category::Weekly,
        Category::Monthly,
        Category::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Daily => "daily",
            Category::Weekly => "weekly",
            Category::Monthly => "monthly",
            Category::Yearly => "yearly",
        }
    }

    pub fn from_sheet_name(name: &str) -> Option<Self> {
        Category::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl PriorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLevel::Low => "low",
            PriorityLevel::Medium => "medium",
            PriorityLevel::High => "high",
            PriorityLevel::Urgent => "urgent",
        }
    }

    /// Case-sensitive match against the closed set
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(PriorityLevel::Low),
            "medium" => Some(PriorityLevel::Medium),
            "high" => Some(PriorityLevel::High),
            "urgent" => Some(PriorityLevel::Urgent),
            _ => None,
        }
    }
}

impl std::fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row pulled from a recognized sheet, values still raw
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateRecord {
    pub title: CellValue,
    pub description: CellValue,
    pub deadline: CellValue,
    pub priority: CellValue,
    pub category: Category,
    /// 1-based sheet row, the header occupying row 1
    pub row_position: u32,
}

/// A record that passed every field rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidatedTask {
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub priority: PriorityLevel,
    pub category: Category,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Every defect found in one row, in field-check order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowValidationFailure {
    pub category: Category,
    pub row_position: u32,
    pub errors: Vec<String>,
    pub field_errors: Vec<FieldError>,
}

impl RowValidationFailure {
    pub fn new(category: Category, row_position: u32, field_errors: Vec<FieldError>) -> Self {
        RowValidationFailure {
            category,
            row_position,
            errors: field_errors.iter().map(|e| e.message.clone()).collect(),
            field_errors,
        }
    }
}

/// Outcome of validating one candidate
pub type RecordOutcome = Result<ValidatedTask, RowValidationFailure>;

/// Result of importing one workbook: the whole batch or none of it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ImportBatch {
    Accepted(Vec<ValidatedTask>),
    Rejected(Vec<RowValidationFailure>),
}

/// Resolved identity of whoever runs the import
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Actor {
    pub id: String,
}

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Actor { id: id.into() }
    }
}

/// What a persisted import produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub batch: ImportBatch,
    pub checksum: String,
    pub task_ids: Vec<String>,
}
