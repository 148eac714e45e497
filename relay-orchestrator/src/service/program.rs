//! Program Service
//!
//! Business logic for the program registry.

use relay_core::domain::program::{Program, ProgramStatus, new_program_id};
use relay_core::dto::program::{ProgramSummary, UpdateProgram, UploadProgram};
use std::sync::Arc;

use crate::repository::{ProgramChanges, ProgramRepository, StoreError};

const MAX_NAME_LENGTH: usize = 255;

/// Service error type
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("program {0} not found")]
    NotFound(String),

    #[error("{0}")]
    ValidationError(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ProgramError>;

/// Program registry
#[derive(Clone)]
pub struct ProgramService {
    programs: Arc<dyn ProgramRepository>,
}

impl ProgramService {
    pub fn new(programs: Arc<dyn ProgramRepository>) -> Self {
        Self { programs }
    }

    /// Store a new program
    pub async fn upload(&self, req: UploadProgram) -> Result<Program> {
        validate_upload(&req)?;

        let id = new_program_id();
        let now = chrono::Utc::now();
        let program = Program {
            name: req
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| id.clone()),
            id,
            metadata: req.metadata,
            data: req.data.into_bytes(),
            status: ProgramStatus::Active,
            created_at: now,
            updated_at: now,
        };

        self.programs.insert(&program).await?;

        tracing::info!("Program uploaded: {} ({})", program.name, program.id);

        Ok(program)
    }

    /// List all programs without their binaries
    pub async fn list(&self) -> Result<Vec<ProgramSummary>> {
        let programs = self.programs.list_all().await?;

        tracing::debug!("Found {} programs", programs.len());

        Ok(programs.into_iter().map(ProgramSummary::from).collect())
    }

    /// Binary of a program, as downloaded by execution units
    pub async fn get_data(&self, id: &str) -> Result<Vec<u8>> {
        let program = self
            .programs
            .find_by_id(id)
            .await?
            .ok_or_else(|| ProgramError::NotFound(id.to_string()))?;

        Ok(program.data)
    }

    /// Update the provided fields of a program
    pub async fn update(&self, id: &str, req: UpdateProgram) -> Result<()> {
        let changes = ProgramChanges::from(req);
        validate_changes(&changes)?;

        if !self.programs.update(id, &changes).await? {
            return Err(ProgramError::NotFound(id.to_string()));
        }

        tracing::info!("Program updated: {}", id);

        Ok(())
    }

    /// Delete a program
    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.programs.delete(id).await? {
            return Err(ProgramError::NotFound(id.to_string()));
        }

        tracing::info!("Program deleted: {}", id);

        Ok(())
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_upload(req: &UploadProgram) -> Result<()> {
    if req.data.is_empty() {
        return Err(ProgramError::ValidationError(
            "Program data cannot be empty".to_string(),
        ));
    }

    if let Some(name) = &req.name {
        validate_name(name)?;
    }

    Ok(())
}

fn validate_changes(changes: &ProgramChanges) -> Result<()> {
    if changes.is_empty() {
        return Err(ProgramError::ValidationError(
            "Nothing to update".to_string(),
        ));
    }

    if let Some(name) = &changes.name {
        validate_name(name)?;
    }

    if changes.data.as_ref().is_some_and(|data| data.is_empty()) {
        return Err(ProgramError::ValidationError(
            "Program data cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    if name.len() > MAX_NAME_LENGTH {
        return Err(ProgramError::ValidationError(format!(
            "Program name is too long (max {} characters)",
            MAX_NAME_LENGTH
        )));
    }

    Ok(())
}
