//! S3 transfer wrapper.
//!
//! This crate provides:
//! - `s3://bucket/key` URI parsing with an extension allow-list
//! - File download with existence-skip semantics
//! - File upload
//! - Image download with decode verification
//! - Image upload from memory
//!
//! Credentials come from the ambient AWS credential chain; this crate does
//! not manage them.

pub mod client;
pub mod error;
pub mod uri;

pub use client::{S3Store, TransferStatus};
pub use error::{StorageError, StorageResult};
pub use uri::{Extension, S3Uri};
