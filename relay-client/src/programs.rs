//! Program registry API endpoints

use relay_core::dto::program::{
    ProgramSummary, UpdateProgram, UploadProgram, UploadProgramResponse,
};

use crate::OrchestratorClient;
use crate::error::Result;

impl OrchestratorClient {
    /// Upload a program, returning its generated id
    pub async fn upload_program(&self, req: UploadProgram) -> Result<String> {
        let url = self.url("/program");
        let response = self.client.post(&url).json(&req).send().await?;

        let body: UploadProgramResponse = self.handle_response(response).await?;
        Ok(body.id)
    }

    /// List all programs, newest first
    pub async fn list_programs(&self) -> Result<Vec<ProgramSummary>> {
        let url = self.url("/program");
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Raw program data
    pub async fn get_program_data(&self, program_id: &str) -> Result<Vec<u8>> {
        let url = self.url(&format!("/program/{}/data", program_id));
        let response = self.client.get(&url).send().await?;

        self.handle_bytes_response(response).await
    }

    /// Update the provided fields of a program
    pub async fn update_program(&self, program_id: &str, req: UpdateProgram) -> Result<()> {
        let url = self.url(&format!("/program/{}/update", program_id));
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_empty_response(response).await
    }

    /// Delete a program
    pub async fn delete_program(&self, program_id: &str) -> Result<()> {
        let url = self.url(&format!("/program/{}", program_id));
        let response = self.client.delete(&url).send().await?;

        self.handle_empty_response(response).await
    }
}
