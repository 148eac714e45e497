//! Job Service
//!
//! Business logic for the job lifecycle: submission and dispatch, status
//! reports from execution units, and cancellation.
//!
//! Every operation round-trips through the job repository; nothing is cached
//! between requests. Status writes are compare-and-swap against the status
//! just read, so a report racing a cancellation can never resurrect a job from
//! a terminal state.

use relay_core::domain::job::{CancelOutcome, Job, JobStatus, StatusChange};
use std::sync::Arc;
use uuid::Uuid;

use crate::dispatcher::{DispatchError, Dispatcher, LaunchRequest};
use crate::repository::{JobRepository, ProgramRepository, StoreError};

/// A status can advance at most `Creating -> Running -> terminal`, so a
/// handful of lost races means something is wrong with the store.
const MAX_CAS_ATTEMPTS: usize = 4;

/// Service error type
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("program {0} not found")]
    ProgramNotFound(String),

    #[error("job {job_id} cannot move from {from} to {to}")]
    InvalidTransition {
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("dispatch failed for job {job_id}: {source}")]
    DispatchFailure {
        job_id: Uuid,
        #[source]
        source: DispatchError,
    },

    #[error("job {0} kept changing status concurrently")]
    Conflict(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, JobError>;

/// Job lifecycle manager
#[derive(Clone)]
pub struct JobService {
    jobs: Arc<dyn JobRepository>,
    programs: Arc<dyn ProgramRepository>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl JobService {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        programs: Arc<dyn ProgramRepository>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self {
            jobs,
            programs,
            dispatcher,
        }
    }

    /// Create a job for a program and launch its execution unit
    ///
    /// If the dispatcher rejects the launch, the job stays persisted and is
    /// moved to `Failed` so pollers observe a terminal state.
    pub async fn submit(&self, program_id: &str, inputs: serde_json::Value) -> Result<Job> {
        if !self.programs.exists(program_id).await? {
            return Err(JobError::ProgramNotFound(program_id.to_string()));
        }

        let job = Job::new(program_id);
        self.jobs.insert(&job).await?;

        tracing::info!(
            "Job created: {} for program: {} (unit {})",
            job.id,
            job.program_id,
            job.execution_unit_name
        );

        let request = LaunchRequest {
            unit_name: job.execution_unit_name.clone(),
            program_id: job.program_id.clone(),
            job_id: job.id,
            inputs,
        };

        if let Err(err) = self.dispatcher.launch(&request).await {
            tracing::warn!("Launch of job {} failed: {}", job.id, err);

            // The caller still gets the job id even if the record can't be failed
            match self
                .jobs
                .compare_and_swap_status(job.id, JobStatus::Creating, JobStatus::Failed)
                .await
            {
                Ok(true) => {}
                Ok(false) => tracing::warn!(
                    "Job {} left Creating before its failed launch was recorded",
                    job.id
                ),
                Err(store_err) => tracing::error!(
                    "Failed to mark job {} as failed after launch error ({}): {}",
                    job.id,
                    err,
                    store_err
                ),
            }

            return Err(JobError::DispatchFailure {
                job_id: job.id,
                source: err,
            });
        }

        Ok(job)
    }

    /// Get a job by ID
    pub async fn get_job(&self, id: Uuid) -> Result<Job> {
        self.jobs.find_by_id(id).await?.ok_or(JobError::NotFound(id))
    }

    /// Get the current status of a job
    pub async fn get_status(&self, id: Uuid) -> Result<JobStatus> {
        Ok(self.get_job(id).await?.status)
    }

    /// Apply a status reported by an execution unit
    ///
    /// The reporter is not authenticated: anyone holding the job id can
    /// report. Repeating the current status is a no-op; moving backwards or
    /// away from a terminal status is rejected.
    pub async fn report_status(&self, id: Uuid, status: JobStatus) -> Result<StatusChange> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let job = self.get_job(id).await?;

            if job.status == status {
                tracing::debug!("Job {} already {}", id, status);
                return Ok(StatusChange::Unchanged);
            }

            if !job.status.can_transition_to(status) {
                tracing::warn!("Rejected status report for job {}: {} -> {}", id, job.status, status);
                return Err(JobError::InvalidTransition {
                    job_id: id,
                    from: job.status,
                    to: status,
                });
            }

            if self
                .jobs
                .compare_and_swap_status(id, job.status, status)
                .await?
            {
                tracing::info!("Job {} status: {} -> {}", id, job.status, status);
                return Ok(StatusChange::Updated);
            }
        }

        Err(JobError::Conflict(id))
    }

    /// Cancel a job
    ///
    /// Finished jobs are left alone and reported as `AlreadyTerminal` without
    /// contacting the dispatcher. Otherwise the unit is terminated first and
    /// the job is then moved to `Canceled`, unless the unit managed to report
    /// a terminal status in between, in which case that status wins.
    pub async fn cancel(&self, id: Uuid) -> Result<CancelOutcome> {
        let mut terminated = false;

        for _ in 0..MAX_CAS_ATTEMPTS {
            let job = self.get_job(id).await?;

            if job.status.is_terminal() {
                tracing::info!("Job {} no longer running ({})", id, job.status);
                return Ok(CancelOutcome::AlreadyTerminal { status: job.status });
            }

            if !terminated {
                self.dispatcher
                    .terminate(&job.execution_unit_name)
                    .await
                    .map_err(|source| JobError::DispatchFailure { job_id: id, source })?;
                terminated = true;
            }

            if self
                .jobs
                .compare_and_swap_status(id, job.status, JobStatus::Canceled)
                .await?
            {
                tracing::info!("Job {} cancelled", id);
                return Ok(CancelOutcome::Canceled);
            }
        }

        Err(JobError::Conflict(id))
    }
}
