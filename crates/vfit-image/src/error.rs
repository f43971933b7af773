//! Conversion error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for image conversion.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Errors that can occur while converting image representations.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("image file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("invalid base64 image data: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("invalid image data: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
