//! Backend trait for template object storage.
//!
//! Templates live in a key-value blob service addressed by a container
//! (the store location, e.g. a bucket) and an object key. A missing object is
//! a normal outcome, reported as [`FetchOutcome::NotFound`]; only genuine
//! failures surface as [`StoreError`].

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while fetching an object.
///
/// A missing object is not an error; see [`FetchOutcome::NotFound`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Request could not be sent or the response could not be read
    #[error("Transport error fetching {key}: {source}")]
    Transport {
        key: String,
        #[source]
        source: reqwest::Error,
    },

    /// Store answered with a non-success status other than 404
    #[error("Object store returned status {status} for {key}")]
    Status { key: String, status: u16 },

    /// Local read failed for a reason other than a missing file
    #[error("I/O error reading {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Key or location cannot be mapped onto the backend safely
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    /// Backend could not be constructed from configuration
    #[error("Object store misconfigured: {0}")]
    Config(String),
}

/// Result of a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Found(String),
    NotFound,
}

impl FetchOutcome {
    /// Content if the object exists.
    pub fn into_content(self) -> Option<String> {
        match self {
            FetchOutcome::Found(content) => Some(content),
            FetchOutcome::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, FetchOutcome::Found(_))
    }
}

/// Backend trait for template object storage.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a single store is shared by every
/// batch served by the process.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short backend identifier used in logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Fetch the object at `key` inside `location`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` for every failure except a missing object, which
    /// is reported as `Ok(FetchOutcome::NotFound)`.
    async fn fetch(&self, location: &str, key: &str) -> Result<FetchOutcome, StoreError>;
}
