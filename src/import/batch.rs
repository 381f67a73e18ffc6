use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::types::*;

/// Accumulates per-record outcomes in extraction order
#[derive(Debug, Default)]
pub struct BatchCollector {
    accepted: Vec<ValidatedTask>,
    rejected: Vec<RowValidationFailure>,
}

impl BatchCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: RecordOutcome) {
        match outcome {
            Ok(task) => self.accepted.push(task),
            Err(failure) => self.rejected.push(failure),
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.rejected.is_empty()
    }

    /// Decide the batch: any failure anywhere rejects all of it
    pub fn finish(self) -> ImportBatch {
        if self.rejected.is_empty() {
            info!("Batch accepted: {} tasks", self.accepted.len());
            ImportBatch::Accepted(self.accepted)
        } else {
            warn!(
                "Batch rejected: {} failing rows, discarding {} valid rows",
                self.rejected.len(),
                self.accepted.len()
            );
            ImportBatch::Rejected(self.rejected)
        }
    }
}

/// One-shot commit decision over a full outcome sequence
pub fn commit_gate<I>(outcomes: I) -> ImportBatch
where
    I: IntoIterator<Item = RecordOutcome>,
{
    let mut collector = BatchCollector::new();
    for outcome in outcomes {
        collector.push(outcome);
    }
    collector.finish()
}

impl ImportBatch {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ImportBatch::Accepted(_))
    }

    /// Accepted tasks; empty for a rejected batch
    pub fn accepted(&self) -> &[ValidatedTask] {
        match self {
            ImportBatch::Accepted(tasks) => tasks,
            ImportBatch::Rejected(_) => &[],
        }
    }

    /// Row failures; empty for an accepted batch
    pub fn rejected(&self) -> &[RowValidationFailure] {
        match self {
            ImportBatch::Accepted(_) => &[],
            ImportBatch::Rejected(failures) => failures,
        }
    }

    /// One-line status for the user
    pub fn summary(&self) -> String {
        match self {
            ImportBatch::Accepted(tasks) => format!(
                "Successfully imported {} {}",
                tasks.len(),
                plural(tasks.len(), "task", "tasks")
            ),
            ImportBatch::Rejected(failures) => format!(
                "{} {} failed validation; nothing was imported",
                failures.len(),
                plural(failures.len(), "row", "rows")
            ),
        }
    }

    pub fn report(&self) -> RejectionReport {
        RejectionReport::from_failures(self.rejected())
    }
}

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}

/// Failures of one sheet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SheetFailures {
    pub sheet: Category,
    pub rows: Vec<RowValidationFailure>,
}

/// Rejection listing grouped by sheet, sheets in category order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RejectionReport {
    pub sheets: Vec<SheetFailures>,
}

impl RejectionReport {
    pub fn from_failures(failures: &[RowValidationFailure]) -> Self {
        let sheets = Category::ALL
            .into_iter()
            .filter_map(|category| {
                let rows: Vec<_> = failures
                    .iter()
                    .filter(|f| f.category == category)
                    .cloned()
                    .collect();
                (!rows.is_empty()).then_some(SheetFailures { sheet: category, rows })
            })
            .collect();

        RejectionReport { sheets }
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Plain-text listing, one "Sheet: x, Row: n" entry per failing row
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for sheet in &self.sheets {
            for row in &sheet.rows {
                lines.push(format!("Sheet: {}, Row: {}", sheet.sheet, row.row_position));
                lines.extend(row.errors.iter().map(|e| format!("  - {}", e)));
            }
        }
        lines
    }
}
