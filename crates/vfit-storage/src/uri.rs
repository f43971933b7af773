//! S3 URI parsing and the file extension allow-list.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::{StorageError, StorageResult};

/// A parsed `s3://bucket/key` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Uri {
    pub bucket: String,
    pub key: String,
}

impl S3Uri {
    /// Parse and validate an S3 URI.
    pub fn parse(uri: &str) -> StorageResult<Self> {
        let parsed = Url::parse(uri).map_err(|_| StorageError::invalid_uri(uri))?;
        if parsed.scheme() != "s3" {
            return Err(StorageError::invalid_uri(uri));
        }
        let bucket = parsed
            .host_str()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| StorageError::invalid_uri(uri))?
            .to_string();
        let key = parsed.path().trim_start_matches('/').to_string();
        if key.is_empty() {
            return Err(StorageError::invalid_uri(uri));
        }
        Ok(Self { bucket, key })
    }

    /// Final path segment of the key.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    /// Extension of the key (without the dot), when present.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        name.rsplit_once('.').map(|(_, ext)| ext)
    }
}

impl fmt::Display for S3Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// File extensions the transfer layer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Webp,
    Png,
    Jpg,
    Jpeg,
    Tiff,
    Txt,
    Json,
    Csv,
}

impl Extension {
    /// Whether this extension names an image format.
    pub fn is_image(&self) -> bool {
        matches!(
            self,
            Extension::Webp | Extension::Png | Extension::Jpg | Extension::Jpeg | Extension::Tiff
        )
    }

    /// MIME type for uploads.
    pub fn content_type(&self) -> &'static str {
        match self {
            Extension::Webp => "image/webp",
            Extension::Png => "image/png",
            Extension::Jpg | Extension::Jpeg => "image/jpeg",
            Extension::Tiff => "image/tiff",
            Extension::Txt => "text/plain",
            Extension::Json => "application/json",
            Extension::Csv => "text/csv",
        }
    }

    /// Encoder format for in-memory image uploads, when one is available.
    pub fn image_format(&self) -> Option<image::ImageFormat> {
        match self {
            Extension::Png => Some(image::ImageFormat::Png),
            Extension::Jpg | Extension::Jpeg => Some(image::ImageFormat::Jpeg),
            Extension::Tiff => Some(image::ImageFormat::Tiff),
            _ => None,
        }
    }
}

impl FromStr for Extension {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "webp" => Ok(Extension::Webp),
            "png" => Ok(Extension::Png),
            "jpg" => Ok(Extension::Jpg),
            "jpeg" => Ok(Extension::Jpeg),
            "tiff" => Ok(Extension::Tiff),
            "txt" => Ok(Extension::Txt),
            "json" => Ok(Extension::Json),
            "csv" => Ok(Extension::Csv),
            other => Err(StorageError::UnsupportedExtension(other.to_string())),
        }
    }
}
