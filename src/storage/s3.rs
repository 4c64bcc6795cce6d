//! Amazon S3 (or S3-compatible) object store
//!
//! The SDK is async; this store owns a current-thread runtime and blocks on
//! each call, so the rest of the crate stays synchronous.

use std::path::Path;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tokio::runtime::Runtime;

use crate::config::Configuration;
use crate::error::{GenwaveError, Result};
use crate::storage::{ObjectLocation, ObjectStore};

const CREDENTIALS_PROVIDER_NAME: &str = "genwave";

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    runtime: Runtime,
}

impl S3ObjectStore {
    /// Build a client from explicit credentials. `endpoint_url` targets an
    /// S3-compatible service and switches to path-style addressing.
    pub fn new(config: &Configuration, endpoint_url: Option<&str>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| runtime_failure(&config.bucket_name, e))?;

        let credentials = Credentials::new(
            config.aws_access_key.clone(),
            config.aws_secret_key.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket_name.clone(),
            runtime,
        })
    }

    fn upload_error(&self, key: &str, reason: String) -> GenwaveError {
        GenwaveError::Upload {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            reason,
        }
    }
}

/// Reported against the bucket; no object key exists yet.
fn runtime_failure(bucket: &str, err: std::io::Error) -> GenwaveError {
    GenwaveError::Upload {
        bucket: bucket.to_string(),
        key: String::new(),
        reason: format!("cannot start S3 client runtime: {err}"),
    }
}

impl ObjectStore for S3ObjectStore {
    fn name(&self) -> &str {
        "s3"
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn put_file(&self, key: &str, path: &Path, content_type: &str) -> Result<ObjectLocation> {
        self.runtime.block_on(async {
            let body = ByteStream::from_path(path)
                .await
                .map_err(|e| self.upload_error(key, e.to_string()))?;

            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .content_type(content_type)
                .body(body)
                .send()
                .await
                .map_err(|e| self.upload_error(key, DisplayErrorContext(&e).to_string()))?;

            Ok::<_, GenwaveError>(())
        })?;

        Ok(ObjectLocation::new(&self.bucket, key))
    }

    fn exists(&self, key: &str) -> Result<bool> {
        self.runtime.block_on(async {
            match self
                .client
                .head_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
            {
                Ok(_) => Ok(true),
                Err(e) if e.as_service_error().map(|se| se.is_not_found()).unwrap_or(false) => {
                    Ok(false)
                }
                Err(e) => Err(self.upload_error(key, DisplayErrorContext(&e).to_string())),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn config() -> Configuration {
        Configuration {
            aws_access_key: "AKIATEST".to_string(),
            aws_secret_key: "secret".to_string(),
            aws_region: "eu-west-1".to_string(),
            bucket_name: "audio-out".to_string(),
            model_auth_token: None,
        }
    }

    #[test]
    fn test_runtime_failure_is_upload_error() {
        let err = runtime_failure(
            "audio-out",
            std::io::Error::new(std::io::ErrorKind::Other, "too many open files"),
        );
        assert_eq!(err.kind(), ErrorKind::Upload);
        assert_eq!(err.error_code(), "UPLOAD_ERROR");
        assert!(err.to_string().contains("too many open files"));
        assert!(err.to_string().starts_with("Upload of s3://audio-out/"));
    }

    #[test]
    fn test_store_builds_without_network() {
        let store = S3ObjectStore::new(&config(), Some("http://127.0.0.1:9000")).unwrap();
        assert_eq!(store.bucket(), "audio-out");
        assert_eq!(store.name(), "s3");
    }
}
