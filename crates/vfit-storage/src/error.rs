//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid S3 URI: {0}")]
    InvalidUri(String),

    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image conversion failed: {0}")]
    Convert(#[from] vfit_image::ConvertError),
}

impl StorageError {
    pub fn invalid_uri(uri: impl Into<String>) -> Self {
        Self::InvalidUri(uri.into())
    }

    pub fn download_failed(msg: impl Into<String>) -> Self {
        Self::DownloadFailed(msg.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }
}
