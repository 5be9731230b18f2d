//! Local-filesystem blob store
//!
//! Mirrors the S3 backend over a rooted directory so tests and local
//! development run without a provider. Keys are slash-separated paths below
//! the root; absolute keys and parent traversal are rejected.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{validate_key, BlobError, BlobObject, BlobResult, BlobStore};

/// Blob store over a rooted local directory.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Creates a blob store rooted at `root`. The directory is created on
    /// first write, not here.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves `key` to a path below the root.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::InvalidInput`] for empty, absolute or
    /// parent-traversing keys.
    fn resolve(&self, key: &str) -> BlobResult<PathBuf> {
        validate_key(key)?;
        let relative = Path::new(key);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(BlobError::InvalidInput(format!(
                        "key must stay below the store root: {key}"
                    )));
                }
            }
        }
        Ok(self.root.join(relative))
    }

    /// Walks every regular file below the root with a directory stack and
    /// returns slash-separated keys relative to the root.
    async fn walk(&self) -> BlobResult<Vec<(String, std::fs::Metadata)>> {
        let mut found = Vec::new();
        let mut stack = vec![self.root.clone()];

        while let Some(dir) = stack.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    stack.push(entry.path());
                } else if file_type.is_file() {
                    let key = relative_key(&self.root, &entry.path());
                    found.push((key, entry.metadata().await?));
                }
            }
        }

        Ok(found)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> BlobResult<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> BlobResult<Vec<u8>> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BlobError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> BlobResult<bool> {
        let path = self.resolve(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, prefix: &str, recursive: bool) -> BlobResult<Vec<BlobObject>> {
        let mut objects = Vec::new();
        for (key, metadata) in self.walk().await? {
            let Some(remainder) = key.strip_prefix(prefix) else {
                continue;
            };
            if !recursive && remainder.contains('/') {
                continue;
            }
            objects.push(BlobObject {
                size: metadata.len(),
                last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                etag: None,
                key,
            });
        }
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn list_paths(&self, prefix: &str, delimiter: &str) -> BlobResult<Vec<String>> {
        let mut paths = BTreeSet::new();
        for (key, _) in self.walk().await? {
            let Some(remainder) = key.strip_prefix(prefix) else {
                continue;
            };
            match remainder.split_once(delimiter) {
                Some((head, _)) => {
                    paths.insert(format!("{prefix}{head}{delimiter}"));
                }
                None => {
                    paths.insert(key);
                }
            }
        }
        Ok(paths.into_iter().collect())
    }

    async fn rename(&self, from: &str, to: &str) -> BlobResult<()> {
        let source = self.resolve(from)?;
        let dest = self.resolve(to)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        match tokio::fs::rename(&source, &dest).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BlobError::NotFound(from.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn relative_key(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
