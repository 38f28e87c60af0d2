//! State document kept as a single S3 object.
//!
//! The state document is a single object at `{bucket}/{key}`.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::{AppError, Result};
use crate::storage::StateBackend;

/// S3-backed state document.
#[derive(Clone)]
pub struct S3Backend {
    client: Client,
    bucket: String,
    key: String,
}

impl S3Backend {
    /// Create a new S3 backend.
    pub fn new(client: Client, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Create an S3 backend using the default AWS credential chain.
    pub async fn from_env(bucket: &str, key: &str) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), bucket, key)
    }
}

#[async_trait]
impl StateBackend for S3Backend {
    async fn read(&self) -> Result<Option<String>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| AppError::S3(e.to_string()))?;
                let text = String::from_utf8(bytes.into_bytes().to_vec())
                    .map_err(|e| AppError::store(format!("state object is not UTF-8: {e}")))?;
                Ok(Some(text))
            }
            Err(err) => {
                // A missing object is a missing document, not a failure
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    log::info!("No existing state at {}", self.location());
                    Ok(None)
                } else {
                    Err(AppError::S3(service_err.to_string()))
                }
            }
        }
    }

    async fn write(&self, content: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .body(ByteStream::from(content.as_bytes().to_vec()))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| AppError::S3(e.to_string()))?;
        Ok(())
    }

    fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}
