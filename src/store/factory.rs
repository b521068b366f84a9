//! Object store factory

use std::sync::Arc;
use std::time::Duration;

use crate::config::StoreConfig;

use super::backend::{ObjectStore, StoreError};
use super::filesystem_backend::FilesystemObjectStore;
use super::http_backend::HttpObjectStore;
use super::memory_backend::MemoryObjectStore;

/// Create an object store based on configuration.
///
/// Returns the appropriate backend implementation based on the `backend` setting:
/// - `"http"`: `HttpObjectStore` against `endpoint` (required)
/// - `"filesystem"`: `FilesystemObjectStore` rooted at `root`
/// - `"memory"`: an empty `MemoryObjectStore`
///
/// # Example
///
/// ```rust,ignore
/// let store = create_object_store(&settings.store)?;
/// ```
pub fn create_object_store(settings: &StoreConfig) -> Result<Arc<dyn ObjectStore>, StoreError> {
    match settings.backend.as_str() {
        "http" => {
            let endpoint = settings.endpoint.as_deref().ok_or_else(|| {
                StoreError::Config("http backend requires store.endpoint".to_string())
            })?;
            tracing::info!(
                backend = "http",
                endpoint = %endpoint,
                location = %settings.location,
                "Creating HTTP object store"
            );
            Ok(Arc::new(HttpObjectStore::new(
                endpoint,
                Duration::from_secs(settings.timeout_seconds),
            )?))
        }
        "filesystem" => {
            tracing::info!(
                backend = "filesystem",
                root = %settings.root,
                location = %settings.location,
                "Creating filesystem object store"
            );
            Ok(Arc::new(FilesystemObjectStore::new(&settings.root)))
        }
        "memory" => {
            tracing::warn!(
                backend = "memory",
                "Creating empty memory object store; every template lookup will miss"
            );
            Ok(Arc::new(MemoryObjectStore::new()))
        }
        other => Err(StoreError::Config(format!("unknown store backend: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(backend: &str, endpoint: Option<&str>) -> StoreConfig {
        StoreConfig {
            backend: backend.to_string(),
            location: "bucket".to_string(),
            endpoint: endpoint.map(str::to_string),
            root: "templates".to_string(),
            timeout_seconds: 5,
        }
    }

    #[test]
    fn test_creates_each_backend() {
        assert_eq!(
            create_object_store(&config("filesystem", None))
                .unwrap()
                .backend_name(),
            "filesystem"
        );
        assert_eq!(
            create_object_store(&config("memory", None))
                .unwrap()
                .backend_name(),
            "memory"
        );
        assert_eq!(
            create_object_store(&config("http", Some("http://localhost:9000")))
                .unwrap()
                .backend_name(),
            "http"
        );
    }

    #[test]
    fn test_http_without_endpoint_fails() {
        assert!(matches!(
            create_object_store(&config("http", None)),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_backend_fails() {
        assert!(matches!(
            create_object_store(&config("s4", None)),
            Err(StoreError::Config(_))
        ));
    }
}
