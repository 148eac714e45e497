//! Service Module
//!
//! Business logic layer for the orchestrator.
//! Services orchestrate between repositories and the dispatcher and contain
//! domain logic.

pub mod job;
pub mod message;
pub mod program;

// Re-export for convenience
pub use job::JobService;
pub use message::MessageService;
pub use program::ProgramService;
