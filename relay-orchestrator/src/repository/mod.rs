//! Repository Module
//!
//! Data access layer for the orchestrator.
//! Each repository handles storage for a specific domain entity. Repositories
//! are trait-based so services run unchanged against PostgreSQL in production
//! and the in-memory store in tests and local development.

pub mod job;
pub mod memory;
pub mod message;
pub mod program;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_core::domain::job::{Job, JobStatus};
use relay_core::domain::message::Message;
use relay_core::domain::program::Program;
use relay_core::dto::program::UpdateProgram;
use uuid::Uuid;

// Re-export implementations
pub use job::PgJobRepository;
pub use memory::MemoryStore;
pub use message::PgMessageRepository;
pub use program::PgProgramRepository;

/// Storage failure
///
/// Never converted into an empty result: callers must see that the store
/// failed, which is different from "nothing stored yet".
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// The database could not be reached at all
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            err => StoreError::Database(err),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable job records
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Persists a new job
    async fn insert(&self, job: &Job) -> StoreResult<()>;

    /// Finds a job by id
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Job>>;

    /// Atomically sets `new` iff the stored status is still `expected`.
    ///
    /// Returns `false` when the job is missing or its status changed.
    async fn compare_and_swap_status(
        &self,
        id: Uuid,
        expected: JobStatus,
        new: JobStatus,
    ) -> StoreResult<bool>;
}

/// Append-only per-job message log
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Appends a message; the store assigns a timestamp strictly greater than
    /// every earlier message of the same job.
    async fn append(&self, job_id: Uuid, payload: Vec<u8>) -> StoreResult<Message>;

    /// Messages of a job in ascending timestamp order, optionally only those
    /// strictly newer than `since`.
    async fn find_by_job(
        &self,
        job_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<Message>>;

    /// Removes every message of a job, returning how many were removed
    async fn delete_by_job(&self, job_id: Uuid) -> StoreResult<u64>;
}

/// Program artifacts
#[async_trait]
pub trait ProgramRepository: Send + Sync {
    async fn insert(&self, program: &Program) -> StoreResult<()>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Program>>;

    async fn exists(&self, id: &str) -> StoreResult<bool>;

    /// All programs, newest first
    async fn list_all(&self) -> StoreResult<Vec<Program>>;

    /// Applies the provided fields; returns `false` when the program is missing
    async fn update(&self, id: &str, changes: &ProgramChanges) -> StoreResult<bool>;

    /// Returns `false` when the program is missing
    async fn delete(&self, id: &str) -> StoreResult<bool>;
}

/// Validated program update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramChanges {
    pub name: Option<String>,
    pub data: Option<Vec<u8>>,
    pub metadata: Option<serde_json::Value>,
}

impl ProgramChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.data.is_none() && self.metadata.is_none()
    }
}

impl From<UpdateProgram> for ProgramChanges {
    fn from(req: UpdateProgram) -> Self {
        Self {
            name: req.name.filter(|n| !n.is_empty()),
            data: req.data.map(String::into_bytes),
            metadata: req.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failures_are_unavailable() {
        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");

        for err in [
            sqlx::Error::PoolTimedOut,
            sqlx::Error::PoolClosed,
            sqlx::Error::Io(refused),
        ] {
            assert!(matches!(StoreError::from(err), StoreError::Unavailable(_)));
        }
    }

    #[test]
    fn test_query_failures_are_database_errors() {
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::Database(_)
        ));
    }

    #[test]
    fn test_program_changes_ignore_empty_name() {
        let changes = ProgramChanges::from(UpdateProgram {
            name: Some(String::new()),
            ..Default::default()
        });
        assert!(changes.is_empty());
    }
}
