//! Job-related API endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use relay_core::domain::job::{CancelOutcome, Job, JobStatus, StatusChange};
use relay_core::dto::job::{
    JobStatusResponse, ReportStatusRequest, ReportStatusResponse, SubmitJobResponse,
};
use uuid::Uuid;

impl OrchestratorClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Submit a job running a program with the given inputs
    ///
    /// # Example
    /// ```no_run
    /// # use relay_client::OrchestratorClient;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = OrchestratorClient::new("http://localhost:8080");
    /// let job = client
    ///     .submit_job("4f2a9c1d03be", serde_json::json!({ "shots": 100 }))
    ///     .await?;
    /// println!("{} runs as {}", job.job_id, job.execution_unit_name);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit_job(
        &self,
        program_id: &str,
        inputs: serde_json::Value,
    ) -> Result<SubmitJobResponse> {
        let url = self.url(&format!("/program/{}/job", program_id));
        let response = self.client.post(&url).json(&inputs).send().await?;

        self.handle_response(response).await
    }

    /// Get a job by ID
    pub async fn get_job(&self, job_id: Uuid) -> Result<Job> {
        let url = self.url(&format!("/job/{}", job_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Current status of a job
    pub async fn get_job_status(&self, job_id: Uuid) -> Result<JobStatus> {
        let url = self.url(&format!("/job/{}/status", job_id));
        let response = self.client.get(&url).send().await?;

        let body: JobStatusResponse = self.handle_response(response).await?;
        Ok(body.status)
    }

    /// Report the status of a job, as an execution unit does
    ///
    /// A report that would leave a terminal status fails with a 409
    /// (see [`crate::ClientError::is_conflict`]).
    pub async fn report_status(&self, job_id: Uuid, status: JobStatus) -> Result<StatusChange> {
        let url = self.url(&format!("/job/{}/status", job_id));
        let response = self
            .client
            .post(&url)
            .json(&ReportStatusRequest { status })
            .send()
            .await?;

        let body: ReportStatusResponse = self.handle_response(response).await?;
        Ok(body.change)
    }

    /// Cancel a job
    pub async fn cancel_job(&self, job_id: Uuid) -> Result<CancelOutcome> {
        let url = self.url(&format!("/job/{}/cancel", job_id));
        let response = self.client.post(&url).send().await?;

        self.handle_response(response).await
    }
}
