//! Workflow error types.

use thiserror::Error;

/// Result type for workflow operations.
pub type FlowResult<T> = Result<T, FlowError>;

/// Errors that can occur while running the workflow.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("storage error: {0}")]
    Storage(#[from] vfit_storage::StorageError),

    #[error("job error: {0}")]
    Job(#[from] vfit_job_client::JobError),
}
