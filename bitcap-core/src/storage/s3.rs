//! S3 implementation of [`ObjectStore`].
//!
//! The AWS SDK is async; bitcap runs on a single control thread, so the store
//! owns a current-thread tokio runtime and blocks on each request.

use super::{ObjectPage, ObjectStore, content_type_for};
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::utils::format_bytes;

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::runtime::Runtime;

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    runtime: Runtime,
}

impl S3ObjectStore {
    /// Resolves credentials and region through the AWS default chain,
    /// applying the configured region and endpoint overrides.
    pub fn from_config(config: &CoreConfig) -> CoreResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared = runtime.block_on(loader.load());

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = Client::from_conf(builder.build());

        log::debug!(
            "S3 store ready for bucket '{}' (endpoint: {})",
            config.bucket,
            config.endpoint_url.as_deref().unwrap_or("default")
        );

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            runtime,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn download_to(&self, key: &str, local_path: &Path) -> Result<u64, String> {
        let mut response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| DisplayErrorContext(&e).to_string())?;

        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("Failed to create directory: {e}"))?;
        }
        let mut file = tokio::fs::File::create(local_path)
            .await
            .map_err(|e| format!("Failed to create {}: {e}", local_path.display()))?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .body
            .try_next()
            .await
            .map_err(|e| format!("Body stream error: {e}"))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| format!("Failed to write file: {e}"))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| format!("Failed to flush file: {e}"))?;
        Ok(written)
    }

    async fn upload_from(&self, local_path: &Path, key: &str) -> Result<(), String> {
        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| e.to_string())?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type_for(key))
            .send()
            .await
            .map_err(|e| DisplayErrorContext(&e).to_string())?;
        Ok(())
    }
}

impl ObjectStore for S3ObjectStore {
    fn list_page(&self, prefix: &str, continuation: Option<&str>) -> CoreResult<ObjectPage> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix);
        if let Some(token) = continuation {
            request = request.continuation_token(token);
        }

        let response = self
            .runtime
            .block_on(request.send())
            .map_err(|e| CoreError::List {
                prefix: prefix.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let keys = response
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(str::to_string))
            .collect();
        let next_token = if response.is_truncated() == Some(true) {
            response.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ObjectPage { keys, next_token })
    }

    fn download(&self, key: &str, local_path: &Path) -> CoreResult<()> {
        log::debug!("Downloading {} to {}", key, local_path.display());
        let bytes = self
            .runtime
            .block_on(self.download_to(key, local_path))
            .map_err(|message| CoreError::Download {
                key: key.to_string(),
                message,
            })?;
        log::debug!("Downloaded {} ({})", key, format_bytes(bytes));
        Ok(())
    }

    fn upload(&self, local_path: &Path, key: &str) -> CoreResult<()> {
        log::debug!("Uploading {} to {}", local_path.display(), key);
        self.runtime
            .block_on(self.upload_from(local_path, key))
            .map_err(|message| CoreError::Upload {
                key: key.to_string(),
                message,
            })
    }
}
