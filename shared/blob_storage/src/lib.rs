//! Blob storage behind a provider-agnostic trait
//!
//! [`BlobStore`] abstracts over object storage: an S3-backed implementation
//! for deployments and a rooted local-filesystem implementation that keeps
//! tests and development hermetic. Both expose the same put/get/list/rename
//! surface, so callers swap backends without code changes.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

mod error;
/// Local-filesystem blob store
pub mod fs;
/// S3-backed blob store
pub mod s3;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use error::{BlobError, BlobResult};
pub use fs::FsBlobStore;
pub use s3::S3BlobStore;

/// Metadata for one stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobObject {
    /// Object key relative to the store root
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time, when the backend reports one
    pub last_modified: Option<DateTime<Utc>>,
    /// Backend entity tag, when the backend reports one
    pub etag: Option<String>,
}

/// Object storage operations shared by all backends.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `key`, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::InvalidInput`] for an empty or unsafe key, or a
    /// backend error when the write fails.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> BlobResult<()>;

    /// Fetches the object stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::NotFound`] when no object exists under `key`.
    async fn get(&self, key: &str) -> BlobResult<Vec<u8>>;

    /// Reports whether an object exists under `key`.
    ///
    /// A missing object is `Ok(false)`, never an error.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the lookup itself fails.
    async fn exists(&self, key: &str) -> BlobResult<bool>;

    /// Lists objects whose keys start with `prefix`.
    ///
    /// With `recursive` set, descends into the whole key hierarchy below the
    /// prefix; otherwise only the prefix's immediate children are returned.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the listing fails.
    async fn list(&self, prefix: &str, recursive: bool) -> BlobResult<Vec<BlobObject>>;

    /// Lists one hierarchy level below `prefix`, grouping keys on
    /// `delimiter`.
    ///
    /// Grouped sub-hierarchies are returned as their common prefix with the
    /// delimiter appended.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the listing fails.
    async fn list_paths(&self, prefix: &str, delimiter: &str) -> BlobResult<Vec<String>>;

    /// Moves the object at `from` to `to`.
    ///
    /// Object storage has no native rename; backends without one implement
    /// this as copy-then-delete, so the operation is not atomic.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::NotFound`] when `from` does not exist.
    async fn rename(&self, from: &str, to: &str) -> BlobResult<()>;

    /// Deletes the object under `key`. Deleting a missing object succeeds.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the delete fails.
    async fn delete(&self, key: &str) -> BlobResult<()>;
}

pub(crate) fn validate_key(key: &str) -> BlobResult<()> {
    if key.trim().is_empty() {
        return Err(BlobError::InvalidInput("key must not be empty".to_string()));
    }
    Ok(())
}
