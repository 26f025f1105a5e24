//! Object storage access for source PDFs.
//!
//! Everything goes through the [`ObjectStore`] trait so the report pipeline
//! can be exercised against a fake store; [`S3ObjectStore`] is the production
//! implementation on top of the AWS SDK.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use thiserror::Error;

/// Errors that can occur while talking to object storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage path: {0}")]
    InvalidPath(String),

    #[error("download failed for {uri}: {message}")]
    DownloadFailed { uri: S3Uri, message: String },

    #[error("presigning failed for {uri}: {message}")]
    PresignFailed { uri: S3Uri, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A parsed `s3://bucket/key` location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Uri {
    pub bucket: String,
    pub key: String,
}

impl FromStr for S3Uri {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url =
            url::Url::parse(s).map_err(|e| StorageError::InvalidPath(format!("{}: {}", s, e)))?;

        if url.scheme() != "s3" {
            return Err(StorageError::InvalidPath(format!(
                "{}: expected s3:// scheme",
                s
            )));
        }

        let bucket = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| StorageError::InvalidPath(format!("{}: missing bucket", s)))?
            .to_string();

        let key = url.path().trim_start_matches('/').to_string();
        if key.is_empty() {
            return Err(StorageError::InvalidPath(format!("{}: missing key", s)));
        }

        Ok(S3Uri { bucket, key })
    }
}

impl std::fmt::Display for S3Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Read-only access to stored PDFs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download an object to a local file, overwriting it.
    async fn download_to_path(&self, uri: &S3Uri, dest: &Path) -> Result<(), StorageError>;

    /// Generate a time-limited signed GET URL for an object.
    async fn presign_get(&self, uri: &S3Uri, expiry: Duration) -> Result<String, StorageError>;
}

/// Object store backed by S3.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    /// Build a store from the default AWS configuration chain.
    ///
    /// An explicit profile name overrides the chain's profile selection.
    pub async fn from_env(profile: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(name) = profile {
            loader = loader.profile_name(name);
        }
        let sdk_config = loader.load().await;
        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
        }
    }

    /// Wrap an already-configured client.
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn download_to_path(&self, uri: &S3Uri, dest: &Path) -> Result<(), StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&uri.bucket)
            .key(&uri.key)
            .send()
            .await
            .map_err(|e| StorageError::DownloadFailed {
                uri: uri.clone(),
                message: e.to_string(),
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::DownloadFailed {
                uri: uri.clone(),
                message: e.to_string(),
            })?;

        tokio::fs::write(dest, data.into_bytes()).await?;
        tracing::debug!("downloaded {} to {}", uri, dest.display());
        Ok(())
    }

    async fn presign_get(&self, uri: &S3Uri, expiry: Duration) -> Result<String, StorageError> {
        let presign_config =
            PresigningConfig::expires_in(expiry).map_err(|e| StorageError::PresignFailed {
                uri: uri.clone(),
                message: e.to_string(),
            })?;

        let presigned = self
            .client
            .get_object()
            .bucket(&uri.bucket)
            .key(&uri.key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed {
                uri: uri.clone(),
                message: e.to_string(),
            })?;

        Ok(presigned.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_uri() {
        let uri: S3Uri = "s3://my-bucket/report.pdf".parse().unwrap();
        assert_eq!(uri.bucket, "my-bucket");
        assert_eq!(uri.key, "report.pdf");
    }

    #[test]
    fn test_parse_nested_key() {
        let uri: S3Uri = "s3://bucket/key/path.pdf".parse().unwrap();
        assert_eq!(uri.bucket, "bucket");
        assert_eq!(uri.key, "key/path.pdf");
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        assert!("https://bucket/key.pdf".parse::<S3Uri>().is_err());
        assert!("file:///tmp/key.pdf".parse::<S3Uri>().is_err());
    }

    #[test]
    fn test_parse_rejects_missing_key() {
        assert!("s3://bucket".parse::<S3Uri>().is_err());
        assert!("s3://bucket/".parse::<S3Uri>().is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not a uri".parse::<S3Uri>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let uri: S3Uri = "s3://bucket/key/path.pdf".parse().unwrap();
        assert_eq!(uri.to_string(), "s3://bucket/key/path.pdf");
    }
}
