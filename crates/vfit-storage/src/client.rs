//! S3 store implementation.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use image::DynamicImage;
use tracing::{debug, info};

use vfit_image::image_from_bytes;

use crate::error::{StorageError, StorageResult};
use crate::uri::{Extension, S3Uri};

/// How a download request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    /// The object was fetched from S3.
    Downloaded,
    /// A local file already existed at the target path; nothing was fetched.
    Skipped,
}

/// S3 transfer client.
///
/// Credentials and region come from the ambient AWS configuration chain.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Create a store over an existing SDK client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a store from the ambient AWS environment.
    pub async fn from_env() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self {
            client: Client::new(&config),
        }
    }

    /// Download an object to a local file.
    ///
    /// The output directory is created if missing. When a file already
    /// exists at the target path the download is skipped and the existing
    /// path is returned with [`TransferStatus::Skipped`]. `rename` replaces
    /// the file stem while keeping the key's extension.
    pub async fn download_file(
        &self,
        uri: &str,
        output_dir: impl AsRef<Path>,
        rename: Option<&str>,
    ) -> StorageResult<(PathBuf, TransferStatus)> {
        let uri = S3Uri::parse(uri)?;
        let output_dir = output_dir.as_ref();
        tokio::fs::create_dir_all(output_dir).await?;

        let file_name = match rename {
            Some(stem) => match uri.extension() {
                Some(ext) => format!("{stem}.{ext}"),
                None => stem.to_string(),
            },
            None => uri.file_name().to_string(),
        };
        let local_path = output_dir.join(file_name);

        if local_path.exists() {
            debug!("{} already present, skipping {}", local_path.display(), uri);
            return Ok((local_path, TransferStatus::Skipped));
        }

        let bytes = self.fetch(&uri).await?;
        tokio::fs::write(&local_path, &bytes).await?;
        info!("Downloaded {} to {}", uri, local_path.display());
        Ok((local_path, TransferStatus::Downloaded))
    }

    /// Upload a local file.
    pub async fn upload_file(&self, path: impl AsRef<Path>, uri: &str) -> StorageResult<()> {
        let uri = S3Uri::parse(uri)?;
        let path = path.as_ref();

        let content_type = uri
            .extension()
            .and_then(|ext| ext.parse::<Extension>().ok())
            .map(|ext| ext.content_type())
            .unwrap_or("application/octet-stream");

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&uri.bucket)
            .key(&uri.key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}", path.display(), uri);
        Ok(())
    }

    /// Download an object and decode it as an image.
    ///
    /// The key extension must be on the image allow-list; the downloaded
    /// bytes are verified by decoding them.
    pub async fn download_image(&self, uri: &str) -> StorageResult<DynamicImage> {
        let uri = S3Uri::parse(uri)?;

        let ext = uri
            .extension()
            .ok_or_else(|| StorageError::UnsupportedExtension("(none)".to_string()))?;
        let extension: Extension = ext.parse()?;
        if !extension.is_image() {
            return Err(StorageError::UnsupportedExtension(ext.to_string()));
        }

        let bytes = self.fetch(&uri).await?;
        let image = image_from_bytes(&bytes)?;
        info!("Downloaded image from {}", uri);
        Ok(image)
    }

    /// Encode an image in memory and upload it.
    ///
    /// The target format follows the key extension; only extensions with an
    /// available encoder are accepted.
    pub async fn upload_image(&self, image: &DynamicImage, uri: &str) -> StorageResult<()> {
        let parsed = S3Uri::parse(uri)?;

        let extension: Extension = parsed
            .extension()
            .ok_or_else(|| StorageError::UnsupportedExtension("(none)".to_string()))?
            .parse()?;
        let format = extension
            .image_format()
            .ok_or_else(|| StorageError::upload_failed(format!("no encoder for {uri}")))?;

        let mut buf = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buf), format)
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.upload_bytes(buf, uri, extension.content_type()).await
    }

    /// Upload in-memory bytes.
    pub async fn upload_bytes(
        &self,
        data: Vec<u8>,
        uri: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let uri = S3Uri::parse(uri)?;

        self.client
            .put_object()
            .bucket(&uri.bucket)
            .key(&uri.key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded bytes to {}", uri);
        Ok(())
    }

    async fn fetch(&self, uri: &S3Uri) -> StorageResult<Vec<u8>> {
        let object = self
            .client
            .get_object()
            .bucket(&uri.bucket)
            .key(&uri.key)
            .send()
            .await
            .map_err(|e| StorageError::download_failed(e.to_string()))?;

        let bytes = object
            .body
            .collect()
            .await
            .map_err(|e| StorageError::download_failed(e.to_string()))?;
        Ok(bytes.into_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_credential_types::Credentials;
    use aws_sdk_s3::config::Region;

    fn offline_store() -> S3Store {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "static"))
            .build();
        S3Store::new(Client::from_conf(config))
    }

    #[tokio::test]
    async fn test_download_skips_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("dress.png");
        tokio::fs::write(&existing, b"already here").await.unwrap();

        let store = offline_store();
        let (path, status) = store
            .download_file("s3://garments/incoming/dress.png", dir.path(), None)
            .await
            .unwrap();

        assert_eq!(path, existing);
        assert_eq!(status, TransferStatus::Skipped);
    }

    #[tokio::test]
    async fn test_download_rename_keeps_extension() {
        let dir = tempfile::tempdir().unwrap();
        let renamed = dir.path().join("garment.png");
        tokio::fs::write(&renamed, b"already here").await.unwrap();

        let store = offline_store();
        let (path, status) = store
            .download_file(
                "s3://garments/incoming/dress.png",
                dir.path(),
                Some("garment"),
            )
            .await
            .unwrap();

        assert_eq!(path, renamed);
        assert_eq!(status, TransferStatus::Skipped);
    }

    #[tokio::test]
    async fn test_download_image_rejects_non_image_extension() {
        let store = offline_store();
        let result = store.download_image("s3://bucket/data/table.csv").await;
        assert!(matches!(
            result,
            Err(StorageError::UnsupportedExtension(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_uri_rejected_before_network() {
        let store = offline_store();
        let dir = tempfile::tempdir().unwrap();
        let result = store
            .download_file("https://bucket/key.png", dir.path(), None)
            .await;
        assert!(matches!(result, Err(StorageError::InvalidUri(_))));
    }
}
