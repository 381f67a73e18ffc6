use serde::{Deserialize, Serialize};

/// A task row as persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTask {
    pub id: String,
    pub title: String,
    pub description: String,
    pub deadline: String, // RFC 3339
    pub priority: String,
    pub category: String,
    pub status: String,
    pub created_by: String,
    pub created_at: i64,
}

/// Log entry for one import attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRun {
    pub id: String,
    pub checksum: String,
    pub accepted: u32,
    pub rejected: u32,
    pub created_by: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRunInput {
    pub checksum: String,
    pub accepted: u32,
    pub rejected: u32,
    pub created_by: String,
}
