//! Job client error types.

use thiserror::Error;

use crate::types::ErrorEnvelope;

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

/// Errors that can occur while dispatching a job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("unknown job type: {0}")]
    UnknownJobType(String),

    #[error("invalid job input: {0}")]
    InvalidInput(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {envelope}")]
    Server { status: u16, envelope: ErrorEnvelope },

    #[error("failed to decode result: {0}")]
    Decode(String),

    #[error("image conversion failed: {0}")]
    Convert(#[from] vfit_image::ConvertError),
}

impl JobError {
    pub fn unknown_job_type(tag: impl Into<String>) -> Self {
        Self::UnknownJobType(tag.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Whether another attempt against the server could succeed.
    ///
    /// Input and catalog errors are caller mistakes and are never retried;
    /// everything that involved the server may be transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            JobError::Transport(_) | JobError::Server { .. } | JobError::Decode(_)
        )
    }
}
