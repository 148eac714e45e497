//! Job domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Prefix of every execution unit name. Unit names double as container/pod
/// names, so they stay lowercase alphanumeric with dashes.
pub const EXECUTION_UNIT_PREFIX: &str = "relay-";

/// Job execution record
///
/// Structure shared between orchestrator (persists) and callers (poll).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub program_id: String,
    pub status: JobStatus,
    /// Name of the dispatched execution unit. Immutable once assigned.
    pub execution_unit_name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Job {
    /// Creates a fresh job in `Creating` with random job id and unit name.
    pub fn new(program_id: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Uuid::new_v4(),
            program_id: program_id.into(),
            status: JobStatus::Creating,
            execution_unit_name: new_execution_unit_name(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Allocates a unit name from 122 random bits.
pub fn new_execution_unit_name() -> String {
    format!("{}{}", EXECUTION_UNIT_PREFIX, Uuid::new_v4().simple())
}

/// Job execution status
///
/// `Creating` and `Running` are live; the other three are terminal and final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Creating,
    Running,
    Completed,
    Failed,
    Canceled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 5] = [
        JobStatus::Creating,
        JobStatus::Running,
        JobStatus::Completed,
        JobStatus::Failed,
        JobStatus::Canceled,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Canceled
        )
    }

    /// Whether `self -> next` is an edge of the job state machine.
    ///
    /// Staying in the same status is not an edge; callers treat it as a no-op.
    /// A unit may fail, finish or be canceled before it ever reports `Running`.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        match (self, next) {
            (JobStatus::Creating, JobStatus::Creating) => false,
            (JobStatus::Creating, _) => true,
            (JobStatus::Running, next) => next.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Creating => "Creating",
            JobStatus::Running => "Running",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
            JobStatus::Canceled => "Canceled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effect of a status report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusChange {
    /// The status moved along a legal edge
    Updated,
    /// The job already had the reported status
    Unchanged,
}

/// Result of a cancellation request
///
/// Cancelling a finished job is a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CancelOutcome {
    Canceled,
    AlreadyTerminal { status: JobStatus },
}

/// Error returned when parsing an unknown status string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown job status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_starts_creating() {
        let job = Job::new("abc123");
        assert_eq!(job.status, JobStatus::Creating);
        assert_eq!(job.program_id, "abc123");
        assert!(job.execution_unit_name.starts_with(EXECUTION_UNIT_PREFIX));
    }

    #[test]
    fn test_unit_names_are_distinct_and_container_safe() {
        let a = new_execution_unit_name();
        let b = new_execution_unit_name();
        assert_ne!(a, b);
        assert!(a.len() <= 63);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        );
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Creating.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Canceled.is_terminal());
    }

    #[test]
    fn test_allowed_transitions() {
        use JobStatus::*;

        assert!(Creating.can_transition_to(Running));
        assert!(Creating.can_transition_to(Failed));
        assert!(Creating.can_transition_to(Canceled));
        assert!(Running.can_transition_to(Completed));
        assert!(Running.can_transition_to(Canceled));

        assert!(!Running.can_transition_to(Creating));
        assert!(!Running.can_transition_to(Running));
    }

    #[test]
    fn test_terminal_statuses_are_final() {
        for from in JobStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in JobStatus::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
            }
        }
    }

    #[test]
    fn test_cancel_outcome_wire_format() {
        let canceled = serde_json::to_value(CancelOutcome::Canceled).unwrap();
        assert_eq!(canceled, serde_json::json!({ "outcome": "canceled" }));

        let terminal = serde_json::to_value(CancelOutcome::AlreadyTerminal {
            status: JobStatus::Completed,
        })
        .unwrap();
        assert_eq!(
            terminal,
            serde_json::json!({ "outcome": "already_terminal", "status": "Completed" })
        );
    }

    #[test]
    fn test_status_string_conversion() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert_eq!("running".parse::<JobStatus>().unwrap(), JobStatus::Running);
        assert!("Queued".parse::<JobStatus>().is_err());
    }
}
