//! Result message API endpoints

use chrono::{DateTime, SecondsFormat, Utc};
use relay_core::dto::message::{AppendMessageResponse, DeleteMessagesResponse, MessagesResponse};
use uuid::Uuid;

use crate::OrchestratorClient;
use crate::error::Result;

impl OrchestratorClient {
    /// Append a message to a job's result stream
    ///
    /// Returns the timestamp the orchestrator assigned.
    pub async fn add_message(&self, job_id: Uuid, payload: Vec<u8>) -> Result<DateTime<Utc>> {
        let url = self.url(&format!("/job/{}/message", job_id));
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(payload)
            .send()
            .await?;

        let body: AppendMessageResponse = self.handle_response(response).await?;
        Ok(body.timestamp)
    }

    /// All messages of a job, oldest first
    pub async fn get_results(&self, job_id: Uuid) -> Result<MessagesResponse> {
        let url = self.url(&format!("/job/{}/results", job_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Messages strictly newer than `since`, oldest first
    pub async fn get_results_since(
        &self,
        job_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<MessagesResponse> {
        let url = self.url(&format!(
            "/job/{}/results/{}",
            job_id,
            since.to_rfc3339_opts(SecondsFormat::Micros, true)
        ));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Delete every message of a job, returning how many were removed
    pub async fn delete_messages(&self, job_id: Uuid) -> Result<u64> {
        let url = self.url(&format!("/job/{}/messages", job_id));
        let response = self.client.delete(&url).send().await?;

        let body: DeleteMessagesResponse = self.handle_response(response).await?;
        Ok(body.deleted)
    }
}
