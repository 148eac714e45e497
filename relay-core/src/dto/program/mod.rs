//! Program DTOs
//!
//! Data transfer objects for program registry operations.

use serde::{Deserialize, Serialize};

use crate::domain::program::{Program, ProgramStatus};

/// Request to upload a new program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadProgram {
    /// Display name; the generated id is used when absent or empty
    #[serde(default)]
    pub name: Option<String>,

    /// Free-form metadata
    #[serde(default)]
    pub metadata: serde_json::Value,

    /// Program source or binary as UTF-8 text
    pub data: String,
}

/// Response to a program upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadProgramResponse {
    pub id: String,
}

/// Partial update of a program; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProgram {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Program listing entry, without the binary payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramSummary {
    pub id: String,
    pub name: String,
    pub metadata: serde_json::Value,
    pub status: ProgramStatus,
}

impl From<Program> for ProgramSummary {
    fn from(program: Program) -> Self {
        Self {
            id: program.id,
            name: program.name,
            metadata: program.metadata,
            status: program.status,
        }
    }
}
