//! Incremental result polling

use chrono::{DateTime, Utc};
use relay_core::dto::message::{MessageEntry, MessagesResponse};
use uuid::Uuid;

use crate::OrchestratorClient;
use crate::error::Result;

/// Position in a job's result stream
///
/// Each [`poll`](MessageCursor::poll) returns only the messages stored since the
/// previous one, so repeated polling yields every message exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCursor {
    job_id: Uuid,
    last_seen: Option<DateTime<Utc>>,
}

impl MessageCursor {
    /// Cursor positioned before the first message
    pub fn new(job_id: Uuid) -> Self {
        Self {
            job_id,
            last_seen: None,
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Timestamp of the newest message returned so far
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    /// Fetch the messages newer than the cursor and move past them
    pub async fn poll(&mut self, client: &OrchestratorClient) -> Result<Vec<MessageEntry>> {
        let batch = match self.last_seen {
            Some(since) => client.get_results_since(self.job_id, since).await?,
            None => client.get_results(self.job_id).await?,
        };

        Ok(self.advance(batch))
    }

    /// Move past a fetched batch, dropping anything already seen
    fn advance(&mut self, batch: MessagesResponse) -> Vec<MessageEntry> {
        let fresh: Vec<MessageEntry> = batch
            .messages
            .into_iter()
            .filter(|m| self.last_seen.is_none_or(|seen| m.timestamp > seen))
            .collect();

        if let Some(last) = fresh.last() {
            self.last_seen = Some(last.timestamp);
        }

        tracing::debug!(
            "Cursor for job {} advanced by {} messages",
            self.job_id,
            fresh.len()
        );

        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(second: u32, payload: &str) -> MessageEntry {
        MessageEntry {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, second).unwrap(),
            payload: payload.as_bytes().to_vec(),
        }
    }

    fn batch(entries: Vec<MessageEntry>) -> MessagesResponse {
        MessagesResponse { messages: entries }
    }

    #[test]
    fn test_new_cursor_starts_before_first_message() {
        let cursor = MessageCursor::new(Uuid::nil());
        assert_eq!(cursor.last_seen(), None);
    }

    #[test]
    fn test_advance_moves_to_newest_message() {
        let mut cursor = MessageCursor::new(Uuid::nil());

        let fresh = cursor.advance(batch(vec![entry(1, "a"), entry(2, "b")]));

        assert_eq!(fresh.len(), 2);
        assert_eq!(cursor.last_seen(), Some(entry(2, "b").timestamp));
    }

    #[test]
    fn test_empty_batch_keeps_position() {
        let mut cursor = MessageCursor::new(Uuid::nil());
        cursor.advance(batch(vec![entry(1, "a")]));

        assert!(cursor.advance(MessagesResponse::default()).is_empty());
        assert_eq!(cursor.last_seen(), Some(entry(1, "a").timestamp));
    }

    #[test]
    fn test_advance_drops_already_seen_messages() {
        let mut cursor = MessageCursor::new(Uuid::nil());
        cursor.advance(batch(vec![entry(1, "a"), entry(2, "b")]));

        let fresh = cursor.advance(batch(vec![entry(2, "b"), entry(3, "c")]));

        assert_eq!(fresh, vec![entry(3, "c")]);
        assert_eq!(cursor.last_seen(), Some(entry(3, "c").timestamp));
    }
}
