//! Task persistence: the store an accepted import batch is handed to.

pub mod storage;
pub mod types;

pub use types::*;

use crate::database::DbError;
use crate::import::{Actor, ValidatedTask};

/// Bulk persistence for accepted batches
pub trait TaskStore: Send + Sync {
    /// Insert every task or none of them; returns the assigned ids in order
    fn bulk_insert(&self, tasks: &[ValidatedTask], actor: &Actor) -> Result<Vec<String>, DbError>;

    fn record_import_run(&self, input: &ImportRunInput) -> Result<ImportRun, DbError>;
}
