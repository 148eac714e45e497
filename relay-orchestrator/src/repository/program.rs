//! Program Repository
//!
//! Handles all database operations related to program artifacts.

use async_trait::async_trait;
use relay_core::domain::program::{Program, ProgramStatus};
use sqlx::PgPool;

use super::{ProgramChanges, ProgramRepository, StoreError, StoreResult};

/// Program repository backed by the `programs` table
#[derive(Debug, Clone)]
pub struct PgProgramRepository {
    pool: PgPool,
}

impl PgProgramRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgramRepository for PgProgramRepository {
    async fn insert(&self, program: &Program) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO programs (id, name, metadata, data, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&program.id)
        .bind(&program.name)
        .bind(&program.metadata)
        .bind(&program.data)
        .bind(program.status.as_str())
        .bind(program.created_at)
        .bind(program.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Program>> {
        let row = sqlx::query_as::<_, ProgramRow>(
            r#"
            SELECT id, name, metadata, data, status, created_at, updated_at
            FROM programs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Program::try_from).transpose()
    }

    async fn exists(&self, id: &str) -> StoreResult<bool> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM programs WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn list_all(&self) -> StoreResult<Vec<Program>> {
        let rows = sqlx::query_as::<_, ProgramRow>(
            r#"
            SELECT id, name, metadata, data, status, created_at, updated_at
            FROM programs
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Program::try_from).collect()
    }

    async fn update(&self, id: &str, changes: &ProgramChanges) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE programs
            SET name = COALESCE($1, name),
                data = COALESCE($2, data),
                metadata = COALESCE($3, metadata),
                updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(&changes.name)
        .bind(&changes.data)
        .bind(&changes.metadata)
        .bind(chrono::Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM programs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn string_to_status(s: &str) -> Option<ProgramStatus> {
    match s {
        "Active" => Some(ProgramStatus::Active),
        "Inactive" => Some(ProgramStatus::Inactive),
        _ => None,
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ProgramRow {
    id: String,
    name: String,
    metadata: serde_json::Value,
    data: Vec<u8>,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<ProgramRow> for Program {
    type Error = StoreError;

    fn try_from(row: ProgramRow) -> Result<Self, Self::Error> {
        let status = string_to_status(&row.status).ok_or_else(|| {
            StoreError::Corrupt(format!("program {}: unknown status {}", row.id, row.status))
        })?;

        Ok(Program {
            id: row.id,
            name: row.name,
            metadata: row.metadata,
            data: row.data,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
