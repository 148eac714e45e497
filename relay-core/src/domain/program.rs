//! Program domain model
//!
//! A program is an opaque executable artifact uploaded by a user. Execution
//! units download it by id; the orchestrator never interprets it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Program artifact with its binary payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Short random identifier (12 hex characters)
    pub id: String,

    /// Display name, defaults to the id
    pub name: String,

    /// Free-form metadata supplied by the uploader
    pub metadata: serde_json::Value,

    /// Program binary
    #[serde(with = "crate::encoding::base64")]
    pub data: Vec<u8>,

    pub status: ProgramStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Availability of a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgramStatus {
    Active,
    Inactive,
}

impl ProgramStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProgramStatus::Active => "Active",
            ProgramStatus::Inactive => "Inactive",
        }
    }
}

impl std::fmt::Display for ProgramStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allocates a program id: the last 12 hex digits of a random UUID.
pub fn new_program_id() -> String {
    let simple = uuid::Uuid::new_v4().simple().to_string();
    simple[simple.len() - 12..].to_string()
}
