//! Message Repository
//!
//! PostgreSQL storage for the per-job message log.

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use relay_core::domain::message::{Message, TIMESTAMP_PRECISION};
use sqlx::PgPool;
use uuid::Uuid;

use super::{MessageRepository, StoreError, StoreResult};

/// Retries of an append rejected by the `(job_id, created_at)` primary key
const MAX_APPEND_ATTEMPTS: usize = 5;

/// Message repository backed by the `job_messages` table
#[derive(Debug, Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts one message inside a transaction holding the job's advisory
    /// lock. Appends to the same job therefore commit in timestamp order, and a
    /// poller that saw a message never misses an older one committed later.
    async fn try_append(&self, job_id: Uuid, payload: &[u8]) -> Result<DateTime<Utc>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
            .bind(job_id)
            .execute(&mut *tx)
            .await?;

        let now = Utc::now().trunc_subsecs(TIMESTAMP_PRECISION);

        let (timestamp,): (DateTime<Utc>,) = sqlx::query_as(
            r#"
            INSERT INTO job_messages (job_id, created_at, payload)
            SELECT $1, GREATEST($2, MAX(created_at) + INTERVAL '1 microsecond'), $3
            FROM job_messages
            WHERE job_id = $1
            RETURNING created_at
            "#,
        )
        .bind(job_id)
        .bind(now)
        .bind(payload)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(timestamp)
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn append(&self, job_id: Uuid, payload: Vec<u8>) -> StoreResult<Message> {
        let mut attempt = 1;
        loop {
            match self.try_append(job_id, &payload).await {
                Ok(timestamp) => {
                    return Ok(Message {
                        job_id,
                        timestamp,
                        payload,
                    });
                }
                Err(sqlx::Error::Database(err))
                    if err.is_unique_violation() && attempt < MAX_APPEND_ATTEMPTS =>
                {
                    tracing::debug!(
                        "Timestamp collision appending to job {} (attempt {})",
                        job_id,
                        attempt
                    );
                    attempt += 1;
                }
                Err(err) => return Err(StoreError::from(err)),
            }
        }
    }

    async fn find_by_job(
        &self,
        job_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<Message>> {
        let rows = match since {
            Some(since) => {
                sqlx::query_as::<_, MessageRow>(
                    r#"
                    SELECT job_id, created_at, payload
                    FROM job_messages
                    WHERE job_id = $1 AND created_at > $2
                    ORDER BY created_at ASC
                    "#,
                )
                .bind(job_id)
                .bind(since)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, MessageRow>(
                    r#"
                    SELECT job_id, created_at, payload
                    FROM job_messages
                    WHERE job_id = $1
                    ORDER BY created_at ASC
                    "#,
                )
                .bind(job_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn delete_by_job(&self, job_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM job_messages WHERE job_id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct MessageRow {
    job_id: Uuid,
    created_at: DateTime<Utc>,
    payload: Vec<u8>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            job_id: row.job_id,
            timestamp: row.created_at,
            payload: row.payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use std::collections::HashSet;
    use std::sync::Arc;

    /// Needs a PostgreSQL instance: `DATABASE_URL=... cargo test -- --ignored`
    async fn repository() -> PgMessageRepository {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = db::create_pool(&url, 16).await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        PgMessageRepository::new(pool)
    }

    #[tokio::test]
    #[ignore]
    async fn test_concurrent_appends_reach_incremental_poller() {
        let repo = Arc::new(repository().await);
        let job_id = Uuid::new_v4();
        const WRITERS: usize = 64;

        let writers: Vec<_> = (0..WRITERS)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.append(job_id, vec![i as u8]).await.unwrap() })
            })
            .collect();

        // Poll incrementally while the writers race, the way MessageCursor does
        let mut seen = Vec::new();
        let mut last: Option<DateTime<Utc>> = None;
        while seen.len() < WRITERS {
            let batch = repo.find_by_job(job_id, last).await.unwrap();
            if let Some(newest) = batch.last() {
                last = Some(newest.timestamp);
            }
            seen.extend(batch);
            tokio::task::yield_now().await;
            if writers.iter().all(|w| w.is_finished()) {
                let rest = repo.find_by_job(job_id, last).await.unwrap();
                seen.extend(rest);
                break;
            }
        }
        for writer in writers {
            writer.await.unwrap();
        }

        let all = repo.find_by_job(job_id, None).await.unwrap();
        assert_eq!(all.len(), WRITERS);
        assert_eq!(seen, all);

        let distinct: HashSet<_> = all.iter().map(|m| m.timestamp).collect();
        assert_eq!(distinct.len(), WRITERS);

        repo.delete_by_job(job_id).await.unwrap();
    }
}
