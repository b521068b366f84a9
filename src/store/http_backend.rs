//! HTTP object store backend.
//!
//! Fetches objects with a path-style GET against an S3-compatible endpoint:
//! `<endpoint>/<location>/<key>`. A 404 response means the object does not
//! exist; any other non-success status is an error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::backend::{FetchOutcome, ObjectStore, StoreError};

/// Object store reached over HTTP(S).
pub struct HttpObjectStore {
    client: Client,
    endpoint: Url,
}

impl HttpObjectStore {
    /// Create a store for `endpoint` with a per-request timeout.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, StoreError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| StoreError::Config(format!("invalid endpoint {endpoint}: {e}")))?;

        if endpoint.cannot_be_a_base() {
            return Err(StoreError::Config(format!(
                "endpoint cannot be used as a base URL: {endpoint}"
            )));
        }

        let client = Client::builder()
            .user_agent(concat!("fabric-log-transformer/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    /// URL of an object, with every path segment percent-encoded.
    pub fn object_url(&self, location: &str, key: &str) -> Result<Url, StoreError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidKey(key.to_string()))?
            .pop_if_empty()
            .push(location)
            .extend(key.split('/'));
        Ok(url)
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, location: &str, key: &str) -> Result<FetchOutcome, StoreError> {
        let url = self.object_url(location, key)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| StoreError::Transport {
                key: key.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::warn!(location = %location, key = %key, "Object not found");
                Ok(FetchOutcome::NotFound)
            }
            status if status.is_success() => {
                let content = response
                    .text()
                    .await
                    .map_err(|source| StoreError::Transport {
                        key: key.to_string(),
                        source,
                    })?;
                tracing::debug!(
                    location = %location,
                    key = %key,
                    bytes = content.len(),
                    "Fetched object over HTTP"
                );
                Ok(FetchOutcome::Found(content))
            }
            status => Err(StoreError::Status {
                key: key.to_string(),
                status: status.as_u16(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn store_for(server: &MockServer) -> HttpObjectStore {
        HttpObjectStore::new(&server.base_url(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_object_url_encodes_segments() {
        let store = HttpObjectStore::new("http://store.local/", Duration::from_secs(1)).unwrap();
        let url = store
            .object_url("bucket", "overrides/p 1/login.vm")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://store.local/bucket/overrides/p%201/login.vm"
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            HttpObjectStore::new("not a url", Duration::from_secs(1)),
            Err(StoreError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_found() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/bucket/ocsf_to_ecs.vm");
                then.status(200).body("{\"a\":1}");
            })
            .await;

        let outcome = store_for(&server)
            .fetch("bucket", "ocsf_to_ecs.vm")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(outcome, FetchOutcome::Found("{\"a\":1}".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_not_found_is_not_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/bucket/overrides/p1/login.vm");
                then.status(404);
            })
            .await;

        let outcome = store_for(&server)
            .fetch("bucket", "overrides/p1/login.vm")
            .await
            .unwrap();
        assert_eq!(outcome, FetchOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_fetch_forbidden_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/bucket/ocsf_to_ecs.vm");
                then.status(403);
            })
            .await;

        let result = store_for(&server).fetch("bucket", "ocsf_to_ecs.vm").await;
        assert!(matches!(
            result,
            Err(StoreError::Status { status: 403, .. })
        ));
    }
}
