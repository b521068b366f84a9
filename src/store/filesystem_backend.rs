//! Filesystem object store backend.
//!
//! Maps `location`/`key` onto `<root>/<location>/<key>`. Useful for local
//! development against a checked-out template directory.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use super::backend::{FetchOutcome, ObjectStore, StoreError};

/// Object store backed by a local directory tree.
pub struct FilesystemObjectStore {
    root: PathBuf,
}

impl FilesystemObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve an object path, refusing anything that could escape the root.
    ///
    /// Override keys embed record content, so `..`, absolute paths and
    /// prefixes are rejected.
    fn object_path(&self, location: &str, key: &str) -> Result<PathBuf, StoreError> {
        for part in [location, key] {
            let path = Path::new(part);
            let safe = !part.is_empty()
                && path
                    .components()
                    .all(|component| matches!(component, Component::Normal(_)));
            if !safe {
                return Err(StoreError::InvalidKey(format!("{location}/{key}")));
            }
        }

        Ok(self.root.join(location).join(key))
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    async fn fetch(&self, location: &str, key: &str) -> Result<FetchOutcome, StoreError> {
        let path = self.object_path(location, key)?;

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                tracing::debug!(path = %path.display(), bytes = content.len(), "Read template file");
                Ok(FetchOutcome::Found(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(location = %location, key = %key, "Object not found");
                Ok(FetchOutcome::NotFound)
            }
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}
