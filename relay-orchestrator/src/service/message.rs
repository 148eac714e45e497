//! Message Service
//!
//! Business logic for the per-job result stream.
//!
//! Messages are never checked against the job table: a unit may report before
//! its job record is visible, and an unknown job simply has an empty stream.

use chrono::{DateTime, Utc};
use relay_core::domain::message::Message;
use std::sync::Arc;
use uuid::Uuid;

use crate::repository::{MessageRepository, StoreError};

/// Upper bound for a single message payload
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Service error type
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("{0}")]
    ValidationError(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, MessageError>;

/// Result stream manager
#[derive(Clone)]
pub struct MessageService {
    messages: Arc<dyn MessageRepository>,
}

impl MessageService {
    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    /// Append a message to a job's stream
    pub async fn append(&self, job_id: Uuid, payload: Vec<u8>) -> Result<Message> {
        validate_payload(&payload)?;

        let message = self.messages.append(job_id, payload).await?;

        tracing::debug!(
            "Added message for job {} at {} ({} bytes)",
            job_id,
            message.timestamp,
            message.payload.len()
        );

        Ok(message)
    }

    /// All messages of a job, oldest first
    pub async fn fetch_all(&self, job_id: Uuid) -> Result<Vec<Message>> {
        Ok(self.messages.find_by_job(job_id, None).await?)
    }

    /// Messages strictly newer than `since`, oldest first
    pub async fn fetch_since(&self, job_id: Uuid, since: DateTime<Utc>) -> Result<Vec<Message>> {
        Ok(self.messages.find_by_job(job_id, Some(since)).await?)
    }

    /// Delete all messages of a job
    pub async fn delete_all(&self, job_id: Uuid) -> Result<u64> {
        let deleted = self.messages.delete_by_job(job_id).await?;

        tracing::info!("Deleted {} messages for job: {}", deleted, job_id);

        Ok(deleted)
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_payload(payload: &[u8]) -> Result<()> {
    if payload.len() > MAX_PAYLOAD_BYTES {
        return Err(MessageError::ValidationError(format!(
            "Message payload too large ({} bytes, max: {})",
            payload.len(),
            MAX_PAYLOAD_BYTES
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;

    fn service() -> MessageService {
        MessageService::new(Arc::new(MemoryStore::new()))
    }

    fn payloads(messages: &[Message]) -> Vec<&[u8]> {
        messages.iter().map(|m| m.payload.as_slice()).collect()
    }

    #[test]
    fn test_validate_payload_limit() {
        assert!(validate_payload(&[]).is_ok());
        assert!(validate_payload(&vec![0; MAX_PAYLOAD_BYTES]).is_ok());
        assert!(matches!(
            validate_payload(&vec![0; MAX_PAYLOAD_BYTES + 1]),
            Err(MessageError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_all_unknown_job_is_empty() {
        let service = service();
        assert!(service.fetch_all(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_without_job_record() {
        let service = service();
        let job_id = Uuid::new_v4();

        service.append(job_id, b"orphan".to_vec()).await.unwrap();

        let messages = service.fetch_all(job_id).await.unwrap();
        assert_eq!(payloads(&messages), vec![b"orphan".as_slice()]);
    }

    #[tokio::test]
    async fn test_fetch_since_is_suffix_of_fetch_all() {
        let service = service();
        let job_id = Uuid::new_v4();
        for i in 0..5u8 {
            service.append(job_id, vec![i]).await.unwrap();
        }
        let all = service.fetch_all(job_id).await.unwrap();

        let before_first = all[0].timestamp - chrono::Duration::seconds(1);
        assert_eq!(service.fetch_since(job_id, before_first).await.unwrap(), all);

        for (i, message) in all.iter().enumerate() {
            let since = service.fetch_since(job_id, message.timestamp).await.unwrap();
            assert_eq!(since, all[i + 1..].to_vec());
        }

        let last = all.last().unwrap().timestamp;
        assert!(service.fetch_since(job_id, last).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_all_then_fetch_is_empty() {
        let service = service();
        let job_id = Uuid::new_v4();
        for i in 0..3u8 {
            service.append(job_id, vec![i]).await.unwrap();
        }

        assert_eq!(service.delete_all(job_id).await.unwrap(), 3);
        assert!(service.fetch_all(job_id).await.unwrap().is_empty());
        assert_eq!(service.delete_all(job_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_append_rejects_oversized_payload() {
        let service = service();
        let job_id = Uuid::new_v4();

        let result = service.append(job_id, vec![0; MAX_PAYLOAD_BYTES + 1]).await;

        assert!(matches!(result, Err(MessageError::ValidationError(_))));
        assert!(service.fetch_all(job_id).await.unwrap().is_empty());
    }
}
