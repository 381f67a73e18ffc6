use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to acquire database lock")]
    Lock,
    #[error("Could not determine data directory")]
    NoDataDir,
}

pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at its default location under the user data dir
    pub fn new() -> Result<Self, DbError> {
        Self::open(&Self::default_path()?)
    }

    pub fn open(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::init(Connection::open_in_memory()?)
    }

    pub fn default_path() -> Result<PathBuf, DbError> {
        let data_dir = dirs::data_dir().ok_or(DbError::NoDataDir)?;
        Ok(data_dir.join("taskbook").join("tasks.db"))
    }

    fn init(conn: Connection) -> Result<Self, DbError> {
        let db = Database {
            conn: Mutex::new(conn),
        };
        db.create_task_tables()?;
        Ok(db)
    }
}
