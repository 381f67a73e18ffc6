use super::types::{ImportRun, ImportRunInput, StoredTask};
use super::TaskStore;
use crate::database::{Database, DbError};
use crate::import::{Actor, ValidatedTask};

/// Status given to every imported task
const INITIAL_STATUS: &str = "pending";

impl Database {
    /// Create the task tables
    pub fn create_task_tables(&self) -> Result<(), DbError> {
        let conn = self.conn.lock().map_err(|_| DbError::Lock)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL CHECK (length(trim(title)) > 0),
                description TEXT NOT NULL DEFAULT '',
                deadline TEXT NOT NULL,
                priority TEXT NOT NULL CHECK (priority IN ('low', 'medium', 'high', 'urgent')),
                category TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_by TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at DESC)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS import_runs (
                id TEXT PRIMARY KEY,
                checksum TEXT NOT NULL,
                accepted INTEGER NOT NULL,
                rejected INTEGER NOT NULL,
                created_by TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Insert a batch of tasks in a single transaction
    pub fn insert_tasks(&self, tasks: &[ValidatedTask], created_by: &str) -> Result<Vec<String>, DbError> {
        let mut conn = self.conn.lock().map_err(|_| DbError::Lock)?;
        let now = chrono::Utc::now().timestamp_millis();
        let mut ids = Vec::with_capacity(tasks.len());

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO tasks (id, title, description, deadline, priority, category, status, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;

            for task in tasks {
                let id = uuid::Uuid::new_v4().to_string();
                stmt.execute(rusqlite::params![
                    id,
                    task.title,
                    task.description,
                    task.deadline.to_rfc3339(),
                    task.priority.as_str(),
                    task.category.as_str(),
                    INITIAL_STATUS,
                    created_by,
                    now,
                ])?;
                ids.push(id);
            }
        }
        tx.commit()?;

        Ok(ids)
    }

    /// List tasks, oldest import first
    pub fn list_tasks(&self, limit: Option<u32>) -> Result<Vec<StoredTask>, DbError> {
        let conn = self.conn.lock().map_err(|_| DbError::Lock)?;

        let mut stmt = conn.prepare(
            "SELECT id, title, description, deadline, priority, category, status, created_by, created_at
             FROM tasks
             ORDER BY created_at ASC, rowid ASC
             LIMIT ?1",
        )?;

        // SQLite treats a negative limit as unbounded
        let limit = limit.map(i64::from).unwrap_or(-1);

        let rows = stmt.query_map([limit], |row| {
            Ok(StoredTask {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                deadline: row.get(3)?,
                priority: row.get(4)?,
                category: row.get(5)?,
                status: row.get(6)?,
                created_by: row.get(7)?,
                created_at: row.get(8)?,
            })
        })?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }

        Ok(tasks)
    }

    pub fn create_import_run(&self, input: &ImportRunInput) -> Result<ImportRun, DbError> {
        let conn = self.conn.lock().map_err(|_| DbError::Lock)?;
        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().timestamp_millis();

        conn.execute(
            "INSERT INTO import_runs (id, checksum, accepted, rejected, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![id, input.checksum, input.accepted, input.rejected, input.created_by, now],
        )?;

        Ok(ImportRun {
            id,
            checksum: input.checksum.clone(),
            accepted: input.accepted,
            rejected: input.rejected,
            created_by: input.created_by.clone(),
            created_at: now,
        })
    }

    /// List import runs, newest first
    pub fn list_import_runs(&self) -> Result<Vec<ImportRun>, DbError> {
        let conn = self.conn.lock().map_err(|_| DbError::Lock)?;

        let mut stmt = conn.prepare(
            "SELECT id, checksum, accepted, rejected, created_by, created_at
             FROM import_runs
             ORDER BY created_at DESC, rowid DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(ImportRun {
                id: row.get(0)?,
                checksum: row.get(1)?,
                accepted: row.get(2)?,
                rejected: row.get(3)?,
                created_by: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;

        let mut runs = Vec::new();
        for row in rows {
            runs.push(row?);
        }

        Ok(runs)
    }
}

impl TaskStore for Database {
    fn bulk_insert(&self, tasks: &[ValidatedTask], actor: &Actor) -> Result<Vec<String>, DbError> {
        self.insert_tasks(tasks, &actor.id)
    }

    fn record_import_run(&self, input: &ImportRunInput) -> Result<ImportRun, DbError> {
        self.create_import_run(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{Category, PriorityLevel};
    use chrono::{TimeZone, Utc};

    fn task(title: &str) -> ValidatedTask {
        ValidatedTask {
            title: title.to_string(),
            description: "desc".to_string(),
            deadline: Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap(),
            priority: PriorityLevel::Urgent,
            category: Category::Monthly,
        }
    }

    #[test]
    fn test_bulk_insert_and_list() {
        let db = Database::open_in_memory().unwrap();
        let actor = Actor::new("user-1");

        let ids = db.bulk_insert(&[task("a"), task("b")], &actor).unwrap();
        assert_eq!(ids.len(), 2);

        let stored = db.list_tasks(None).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id, ids[0]);
        assert_eq!(stored[0].title, "a");
        assert_eq!(stored[0].priority, "urgent");
        assert_eq!(stored[0].category, "monthly");
        assert_eq!(stored[0].status, "pending");
        assert_eq!(stored[0].created_by, "user-1");
        assert_eq!(stored[0].deadline, "2024-06-01T09:30:00+00:00");

        assert_eq!(db.list_tasks(Some(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_bulk_insert_is_all_or_nothing() {
        let db = Database::open_in_memory().unwrap();

        // Blank title violates the table check on the second row
        let result = db.bulk_insert(&[task("fine"), task("  ")], &Actor::new("user-1"));
        assert!(matches!(result, Err(DbError::Sqlite(_))));

        assert!(db.list_tasks(None).unwrap().is_empty());
    }

    #[test]
    fn test_import_runs_are_logged() {
        let db = Database::open_in_memory().unwrap();

        let run = db
            .record_import_run(&ImportRunInput {
                checksum: "abc".to_string(),
                accepted: 0,
                rejected: 3,
                created_by: "user-2".to_string(),
            })
            .unwrap();

        let runs = db.list_import_runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].id, run.id);
        assert_eq!(runs[0].rejected, 3);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tasks.db");

        let db = Database::open(&path).unwrap();
        db.bulk_insert(&[task("persisted")], &Actor::new("u")).unwrap();
        drop(db);

        let reopened = Database::open(&path).unwrap();
        assert_eq!(reopened.list_tasks(None).unwrap()[0].title, "persisted");
    }
}
