//! Spreadsheet task import.
//!
//! bytes -> [`read_workbook`] -> [`extract_candidates`] -> [`validate_candidate`]
//! -> [`commit_gate`]. A batch is accepted only if every row of every
//! recognized sheet validates.

pub mod batch;
pub mod extractor;
pub mod types;
pub mod validator;

pub use batch::{commit_gate, BatchCollector, RejectionReport, SheetFailures};
pub use extractor::{extract_candidates, TASK_COLUMNS};
pub use types::*;
pub use validator::{parse_deadline, validate_candidate};

use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;

use crate::database::DbError;
use crate::excel::{compute_checksum, read_workbook, ExcelError};
use crate::tasks::{ImportRunInput, TaskStore};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Malformed workbook: {0}")]
    MalformedWorkbook(#[from] ExcelError),
    #[error(transparent)]
    Persistence(#[from] DbError),
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Decode, extract, validate and gate one workbook. Pure; nothing is stored.
pub fn import_workbook(bytes: &[u8]) -> Result<ImportBatch, ImportError> {
    let workbook = read_workbook(bytes)?;
    let candidates = extract_candidates(&workbook);

    info!(
        "Validating {} rows from {} sheets",
        candidates.len(),
        workbook.sheets.len()
    );

    Ok(commit_gate(candidates.iter().map(validate_candidate)))
}

/// Run an import and hand an accepted batch to the store.
///
/// Decoding and storage both run on the blocking pool. A rejected batch
/// writes no tasks; either way the attempt is logged as an import run.
/// Failing to log the run does not fail an import whose tasks are stored.
pub async fn import_and_persist(
    bytes: Vec<u8>,
    actor: &Actor,
    store: Arc<dyn TaskStore>,
) -> Result<ImportOutcome, ImportError> {
    let (batch, checksum) = tokio::task::spawn_blocking(move || {
        let checksum = compute_checksum(&bytes);
        import_workbook(&bytes).map(|batch| (batch, checksum))
    })
    .await??;

    let actor = actor.clone();
    let run_checksum = checksum.clone();
    let (batch, task_ids) = tokio::task::spawn_blocking(move || {
        let task_ids = match &batch {
            ImportBatch::Accepted(tasks) => store.bulk_insert(tasks, &actor)?,
            ImportBatch::Rejected(failures) => {
                warn!("Import by '{}' rejected with {} failing rows", actor.id, failures.len());
                Vec::new()
            }
        };

        let run = ImportRunInput {
            checksum: run_checksum,
            accepted: task_ids.len() as u32,
            rejected: batch.rejected().len() as u32,
            created_by: actor.id.clone(),
        };
        if let Err(e) = store.record_import_run(&run) {
            warn!("Stored {} tasks but failed to log the import run: {}", task_ids.len(), e);
        }

        Ok::<_, DbError>((batch, task_ids))
    })
    .await??;

    Ok(ImportOutcome {
        batch,
        checksum,
        task_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::excel::{export_sheets, CellValue, SheetData};
    use crate::tasks::ImportRun;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> CellValue {
        CellValue::String(s.to_string())
    }

    fn header() -> Vec<CellValue> {
        TASK_COLUMNS.iter().map(|c| text(c)).collect()
    }

    fn row(title: &str, deadline: &str, priority: &str) -> Vec<CellValue> {
        vec![text(title), text("details"), text(deadline), text(priority)]
    }

    fn sheet(name: &str, rows: Vec<Vec<CellValue>>) -> SheetData {
        let mut all = vec![header()];
        all.extend(rows);
        SheetData::new(name, all)
    }

    fn five_valid_daily_rows() -> SheetData {
        sheet(
            "daily",
            (1..=5).map(|i| row(&format!("Task {}", i), "2024-05-01", "low")).collect(),
        )
    }

    #[test]
    fn test_valid_workbook_is_accepted() {
        let bytes = export_sheets(&[
            five_valid_daily_rows(),
            sheet("yearly", vec![row("  Buy milk  ", "2024-12-31", "urgentish")]),
        ])
        .unwrap();

        let batch = import_workbook(&bytes).unwrap();
        assert!(batch.is_accepted());

        let tasks = batch.accepted();
        assert_eq!(tasks.len(), 6);
        assert_eq!(tasks[5].title, "Buy milk");
        assert_eq!(tasks[5].priority, PriorityLevel::Medium);
        assert_eq!(tasks[5].category, Category::Yearly);
    }

    #[test]
    fn test_one_bad_row_rejects_the_whole_workbook() {
        let bytes = export_sheets(&[
            five_valid_daily_rows(),
            sheet(
                "weekly",
                vec![vec![CellValue::Empty, text("no title"), text("2024-05-01"), text("high")]],
            ),
        ])
        .unwrap();

        let batch = import_workbook(&bytes).unwrap();

        assert!(batch.accepted().is_empty());
        assert_eq!(
            batch.rejected(),
            &[RowValidationFailure::new(
                Category::Weekly,
                2,
                vec![FieldError::new("title", "Title is required")],
            )]
        );
    }

    #[test]
    fn test_blank_title_and_deadline_reported_together() {
        let bytes = export_sheets(&[sheet(
            "monthly",
            vec![
                row("ok", "2024-05-01", "high"),
                vec![CellValue::Empty, text("only a description")],
            ],
        )])
        .unwrap();

        let batch = import_workbook(&bytes).unwrap();
        let failure = &batch.rejected()[0];
        assert_eq!(failure.row_position, 3);
        assert_eq!(failure.errors, vec!["Title is required", "Deadline is required"]);
    }

    #[test]
    fn test_notes_sheet_is_ignored() {
        let bytes = export_sheets(&[
            SheetData::new("notes", vec![vec![text("title")], vec![CellValue::Empty, text("x")]]),
            sheet("daily", vec![row("Water plants", "2024-05-01", "")]),
        ])
        .unwrap();

        let batch = import_workbook(&bytes).unwrap();
        assert_eq!(batch.accepted().len(), 1);
        assert_eq!(batch.accepted()[0].category, Category::Daily);
    }

    #[test]
    fn test_numeric_deadline_cells_are_accepted() {
        let bytes = export_sheets(&[sheet(
            "daily",
            vec![vec![text("Serial"), CellValue::Empty, CellValue::Number(45292.0), text("high")]],
        )])
        .unwrap();

        let batch = import_workbook(&bytes).unwrap();
        assert_eq!(
            batch.accepted()[0].deadline.to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_undecodable_bytes_fail_without_a_batch() {
        let err = import_workbook(b"PK\x03\x04 definitely not a workbook").unwrap_err();
        assert!(matches!(err, ImportError::MalformedWorkbook(ref e) if e.is_malformed()));
    }

    #[tokio::test]
    async fn test_accepted_batch_is_persisted() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let actor = Actor::new("user-7");
        let bytes = export_sheets(&[five_valid_daily_rows()]).unwrap();

        let outcome = import_and_persist(bytes.clone(), &actor, db.clone()).await.unwrap();

        assert_eq!(outcome.task_ids.len(), 5);
        assert_eq!(outcome.checksum, compute_checksum(&bytes));

        let stored = db.list_tasks(None).unwrap();
        assert_eq!(stored.len(), 5);
        assert!(stored.iter().all(|t| t.created_by == "user-7"));
        assert_eq!(stored[0].title, "Task 1");

        let runs = db.list_import_runs().unwrap();
        assert_eq!(runs[0].accepted, 5);
        assert_eq!(runs[0].rejected, 0);
    }

    #[tokio::test]
    async fn test_rejected_batch_writes_no_tasks() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let bytes = export_sheets(&[
            five_valid_daily_rows(),
            sheet("weekly", vec![row("", "", "")]),
        ])
        .unwrap();

        let outcome = import_and_persist(bytes, &Actor::new("user-7"), db.clone()).await.unwrap();

        assert!(!outcome.batch.is_accepted());
        assert!(outcome.task_ids.is_empty());
        assert!(db.list_tasks(None).unwrap().is_empty());
        assert_eq!(db.list_import_runs().unwrap()[0].rejected, 1);
    }

    #[tokio::test]
    async fn test_malformed_upload_is_not_logged() {
        let db = Arc::new(Database::open_in_memory().unwrap());

        let result = import_and_persist(b"garbage".to_vec(), &Actor::new("u"), db.clone()).await;

        assert!(matches!(result, Err(ImportError::MalformedWorkbook(_))));
        assert!(db.list_import_runs().unwrap().is_empty());
    }

    /// Stores tasks normally but cannot write the run log
    struct FailingRunLog(Database);

    impl TaskStore for FailingRunLog {
        fn bulk_insert(&self, tasks: &[ValidatedTask], actor: &Actor) -> Result<Vec<String>, DbError> {
            self.0.bulk_insert(tasks, actor)
        }

        fn record_import_run(&self, _input: &ImportRunInput) -> Result<ImportRun, DbError> {
            Err(DbError::Lock)
        }
    }

    #[tokio::test]
    async fn test_run_log_failure_keeps_stored_tasks() {
        let store = Arc::new(FailingRunLog(Database::open_in_memory().unwrap()));
        let bytes = export_sheets(&[sheet("daily", vec![row("Water plants", "2024-05-01", "high")])]).unwrap();

        let outcome = import_and_persist(bytes, &Actor::new("user-7"), store.clone()).await.unwrap();

        assert!(outcome.batch.is_accepted());
        assert_eq!(outcome.task_ids.len(), 1);
        assert_eq!(store.0.list_tasks(None).unwrap().len(), 1);
        assert!(store.0.list_import_runs().unwrap().is_empty());
    }

    #[test]
    fn test_huge_numeric_deadline_is_rejected() {
        let bytes = export_sheets(&[sheet(
            "daily",
            vec![vec![text("Far future"), CellValue::Empty, CellValue::Number(1e12), text("low")]],
        )])
        .unwrap();

        let batch = import_workbook(&bytes).unwrap();
        assert_eq!(batch.rejected()[0].errors, vec!["Deadline must be a valid date"]);
    }
}
