//! Job Repository
//!
//! PostgreSQL storage for job records.

use async_trait::async_trait;
use relay_core::domain::job::{Job, JobStatus};
use sqlx::PgPool;
use uuid::Uuid;

use super::{JobRepository, StoreError, StoreResult};

/// Job repository backed by the `jobs` table
#[derive(Debug, Clone)]
pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn insert(&self, job: &Job) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO jobs (id, program_id, status, execution_unit_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(job.id)
        .bind(&job.program_id)
        .bind(job.status.as_str())
        .bind(&job.execution_unit_name)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, program_id, status, execution_unit_name, created_at, updated_at
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Job::try_from).transpose()
    }

    async fn compare_and_swap_status(
        &self,
        id: Uuid,
        expected: JobStatus,
        new: JobStatus,
    ) -> StoreResult<bool> {
        // Single conditional write: a concurrent report between our read and
        // this statement makes it match zero rows.
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = $1, updated_at = $2
            WHERE id = $3 AND status = $4
            "#,
        )
        .bind(new.as_str())
        .bind(chrono::Utc::now())
        .bind(id)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    program_id: String,
    status: String,
    execution_unit_name: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<JobStatus>()
            .map_err(|e| StoreError::Corrupt(format!("job {}: {}", row.id, e)))?;

        Ok(Job {
            id: row.id,
            program_id: row.program_id,
            status,
            execution_unit_name: row.execution_unit_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
