//! In-memory store
//!
//! Implements every repository trait over `RwLock`ed maps. Used by tests and
//! by `RELAY_STORE=memory` for local development; state is lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_core::domain::job::{Job, JobStatus};
use relay_core::domain::message::{Message, next_timestamp};
use relay_core::domain::program::Program;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{JobRepository, MessageRepository, ProgramChanges, ProgramRepository, StoreResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
    messages: RwLock<HashMap<Uuid, Vec<Message>>>,
    programs: RwLock<HashMap<String, Program>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for MemoryStore {
    async fn insert(&self, job: &Job) -> StoreResult<()> {
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Job>> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn compare_and_swap_status(
        &self,
        id: Uuid,
        expected: JobStatus,
        new: JobStatus,
    ) -> StoreResult<bool> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&id) {
            Some(job) if job.status == expected => {
                job.status = new;
                job.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn append(&self, job_id: Uuid, payload: Vec<u8>) -> StoreResult<Message> {
        let mut messages = self.messages.write().await;
        let log = messages.entry(job_id).or_default();

        let latest = log.last().map(|m| m.timestamp);
        let message = Message {
            job_id,
            timestamp: next_timestamp(Utc::now(), latest),
            payload,
        };
        log.push(message.clone());

        Ok(message)
    }

    async fn find_by_job(
        &self,
        job_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<Message>> {
        let messages = self.messages.read().await;
        let Some(log) = messages.get(&job_id) else {
            return Ok(Vec::new());
        };

        // The log is kept in append order, which is timestamp order.
        Ok(log
            .iter()
            .filter(|m| since.is_none_or(|since| m.timestamp > since))
            .cloned()
            .collect())
    }

    async fn delete_by_job(&self, job_id: Uuid) -> StoreResult<u64> {
        let removed = self.messages.write().await.remove(&job_id);
        Ok(removed.map_or(0, |log| log.len() as u64))
    }
}

#[async_trait]
impl ProgramRepository for MemoryStore {
    async fn insert(&self, program: &Program) -> StoreResult<()> {
        self.programs
            .write()
            .await
            .insert(program.id.clone(), program.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Program>> {
        Ok(self.programs.read().await.get(id).cloned())
    }

    async fn exists(&self, id: &str) -> StoreResult<bool> {
        Ok(self.programs.read().await.contains_key(id))
    }

    async fn list_all(&self) -> StoreResult<Vec<Program>> {
        let mut programs: Vec<Program> = self.programs.read().await.values().cloned().collect();
        programs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(programs)
    }

    async fn update(&self, id: &str, changes: &ProgramChanges) -> StoreResult<bool> {
        let mut programs = self.programs.write().await;
        let Some(program) = programs.get_mut(id) else {
            return Ok(false);
        };

        if let Some(name) = &changes.name {
            program.name = name.clone();
        }
        if let Some(data) = &changes.data {
            program.data = data.clone();
        }
        if let Some(metadata) = &changes.metadata {
            program.metadata = metadata.clone();
        }
        program.updated_at = Utc::now();

        Ok(true)
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        Ok(self.programs.write().await.remove(id).is_some())
    }
}
