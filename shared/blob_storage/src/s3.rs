//! S3-backed blob store

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::{
    error::SdkError, operation::head_object::HeadObjectError, primitives::ByteStream,
    Client as S3Client,
};
use client_config::GatewayConfig;

use crate::{validate_key, BlobError, BlobObject, BlobResult, BlobStore};

/// Blob store over a single S3 bucket.
pub struct S3BlobStore {
    client: Arc<S3Client>,
    bucket_name: String,
}

impl S3BlobStore {
    /// Creates a blob store over a pre-configured client and bucket.
    #[must_use]
    pub const fn new(client: Arc<S3Client>, bucket_name: String) -> Self {
        Self {
            client,
            bucket_name,
        }
    }

    /// Resolves credentials, region and endpoint from `config` and connects.
    pub async fn connect(config: &GatewayConfig, bucket_name: String) -> Self {
        let sdk_config = config.sdk_config().await;
        Self::new(Arc::new(S3Client::new(&sdk_config)), bucket_name)
    }

    async fn list_page(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
        continuation_token: Option<String>,
    ) -> BlobResult<aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output> {
        self.client
            .list_objects_v2()
            .bucket(&self.bucket_name)
            .prefix(prefix)
            .set_delimiter(delimiter.map(ToString::to_string))
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(|e| classify(&e, prefix))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> BlobResult<()> {
        validate_key(key)?;
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| classify(&e, key))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> BlobResult<Vec<u8>> {
        validate_key(key)?;
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(service_err) if service_err.err().is_no_such_key() => {
                    BlobError::NotFound(key.to_string())
                }
                _ => classify(&e, key),
            })?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| BlobError::Service(format!("failed to read object body: {e}")))?;
        Ok(bytes.into_bytes().to_vec())
    }

    async fn exists(&self, key: &str) -> BlobResult<bool> {
        validate_key(key)?;
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(service_err))
                if matches!(service_err.err(), HeadObjectError::NotFound(_)) =>
            {
                Ok(false)
            }
            Err(SdkError::ServiceError(service_err))
                if service_err.raw().status().as_u16() >= 500 =>
            {
                Err(BlobError::Upstream(format!("{service_err:?}")))
            }
            Err(e) => Err(BlobError::Service(format!("{e:?}"))),
        }
    }

    async fn list(&self, prefix: &str, recursive: bool) -> BlobResult<Vec<BlobObject>> {
        let delimiter = if recursive { None } else { Some("/") };
        let mut objects = Vec::new();
        let mut continuation_token = None;

        loop {
            let page = self
                .list_page(prefix, delimiter, continuation_token.take())
                .await?;

            for entry in page.contents() {
                let Some(key) = entry.key() else { continue };
                objects.push(BlobObject {
                    key: key.to_string(),
                    size: entry
                        .size()
                        .and_then(|s| u64::try_from(s).ok())
                        .unwrap_or(0),
                    last_modified: entry
                        .last_modified()
                        .and_then(|t| chrono::DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
                    etag: entry.e_tag().map(ToString::to_string),
                });
            }

            if page.is_truncated() == Some(true) {
                continuation_token = page.next_continuation_token().map(ToString::to_string);
            } else {
                return Ok(objects);
            }
        }
    }

    async fn list_paths(&self, prefix: &str, delimiter: &str) -> BlobResult<Vec<String>> {
        let mut paths = Vec::new();
        let mut continuation_token = None;

        loop {
            let page = self
                .list_page(prefix, Some(delimiter), continuation_token.take())
                .await?;

            paths.extend(page.contents().iter().filter_map(|o| o.key().map(String::from)));
            paths.extend(
                page.common_prefixes()
                    .iter()
                    .filter_map(|p| p.prefix().map(String::from)),
            );

            if page.is_truncated() == Some(true) {
                continuation_token = page.next_continuation_token().map(ToString::to_string);
            } else {
                return Ok(paths);
            }
        }
    }

    async fn rename(&self, from: &str, to: &str) -> BlobResult<()> {
        validate_key(from)?;
        validate_key(to)?;

        // No native rename on object storage: copy, then delete the source.
        self.client
            .copy_object()
            .bucket(&self.bucket_name)
            .copy_source(format!("{}/{from}", self.bucket_name))
            .key(to)
            .send()
            .await
            .map_err(|e| classify(&e, from))?;

        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(from)
            .send()
            .await
            .map_err(|e| classify(&e, from))?;

        tracing::debug!("renamed {from} to {to} in bucket {}", self.bucket_name);
        Ok(())
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        validate_key(key)?;
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(&e, key))?;
        Ok(())
    }
}

/// Maps a provider error to the blob error taxonomy by HTTP status: 404 is
/// not-found for `key`, 5xx is upstream, everything else a service error.
fn classify<E: std::fmt::Debug>(error: &SdkError<E>, key: &str) -> BlobError {
    match error {
        SdkError::ServiceError(service_err) => {
            let status = service_err.raw().status().as_u16();
            if status == 404 {
                BlobError::NotFound(key.to_string())
            } else if status >= 500 {
                BlobError::Upstream(format!("{service_err:?}"))
            } else {
                BlobError::Service(format!("{service_err:?}"))
            }
        }
        other => BlobError::Service(format!("{other:?}")),
    }
}
