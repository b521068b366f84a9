//! Per-record template selection.
//!
//! A record whose payload carries both `metadata.event_code` and
//! `metadata.product.uid` may have an override template at
//! `<prefix>/<product uid>/<event code, lowercased>.<extension>`. Anything
//! else renders with the batch's default template.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::config::Settings;
use crate::store::StoreError;

use super::cache::TemplateCache;
use super::types::TemplateChoice;

/// Errors loading the default template.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Default template {key} not found in {location}")]
    DefaultMissing { location: String, key: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Override-relevant fields of a record payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordMetadata<'a> {
    pub event_code: Option<&'a str>,
    pub product_uid: Option<&'a str>,
}

impl<'a> RecordMetadata<'a> {
    /// Extract the metadata; non-string or empty values count as absent.
    pub fn from_payload(payload: &'a Value) -> Self {
        let field = |pointer: &str| {
            payload
                .pointer(pointer)
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
        };

        Self {
            event_code: field("/metadata/event_code"),
            product_uid: field("/metadata/product/uid"),
        }
    }
}

/// Chooses the template for each record, reading through the cache.
pub struct TemplateResolver {
    cache: Arc<TemplateCache>,
    location: String,
    default_key: String,
    override_prefix: String,
    extension: String,
}

impl TemplateResolver {
    pub fn new(
        cache: Arc<TemplateCache>,
        location: impl Into<String>,
        default_key: impl Into<String>,
        override_prefix: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            location: location.into(),
            default_key: default_key.into(),
            override_prefix: override_prefix.into(),
            extension: extension.into(),
        }
    }

    pub fn from_settings(cache: Arc<TemplateCache>, settings: &Settings) -> Self {
        Self::new(
            cache,
            settings.store.location.clone(),
            settings.templates.default_template.clone(),
            settings.templates.override_prefix.clone(),
            settings.templates.extension.clone(),
        )
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    /// Load the default template body for a batch.
    pub async fn load_default(&self) -> Result<String, ResolveError> {
        self.cache
            .get(&self.location, &self.default_key)
            .await?
            .ok_or_else(|| ResolveError::DefaultMissing {
                location: self.location.clone(),
                key: self.default_key.clone(),
            })
    }

    /// Override key for a record, if it carries the needed metadata.
    pub fn override_key(&self, metadata: &RecordMetadata<'_>) -> Option<String> {
        let event_code = metadata.event_code?;
        let product_uid = metadata.product_uid?;

        Some(format!(
            "{}/{}/{}.{}",
            self.override_prefix,
            product_uid,
            event_code.to_lowercase(),
            self.extension
        ))
    }

    /// Pick the template for one parsed record payload.
    pub async fn resolve(&self, payload: &Value) -> Result<TemplateChoice, StoreError> {
        let metadata = RecordMetadata::from_payload(payload);

        let Some(key) = self.override_key(&metadata) else {
            return Ok(TemplateChoice::Default);
        };

        match self.cache.get(&self.location, &key).await? {
            Some(content) if !content.is_empty() => {
                tracing::debug!(key = %key, "Using override template");
                Ok(TemplateChoice::Override { key, content })
            }
            // An empty override body counts as no override
            _ => Ok(TemplateChoice::Default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryObjectStore;
    use serde_json::json;
    use std::time::Duration;

    fn resolver() -> (Arc<MemoryObjectStore>, TemplateResolver) {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("bucket", "ocsf_to_ecs.vm", "default body");
        store.insert("bucket", "overrides/p1/login.vm", "override body");

        let cache = Arc::new(TemplateCache::new(store.clone(), Duration::from_secs(300)));
        let resolver = TemplateResolver::new(cache, "bucket", "ocsf_to_ecs.vm", "overrides", "vm");
        (store, resolver)
    }

    #[test]
    fn test_metadata_extraction() {
        let payload = json!({"metadata": {"event_code": "LOGIN", "product": {"uid": "p1"}}});
        assert_eq!(
            RecordMetadata::from_payload(&payload),
            RecordMetadata {
                event_code: Some("LOGIN"),
                product_uid: Some("p1"),
            }
        );

        let payload = json!({"metadata": {"event_code": 4624, "product": {"uid": ""}}});
        assert_eq!(
            RecordMetadata::from_payload(&payload),
            RecordMetadata {
                event_code: None,
                product_uid: None,
            }
        );
    }

    #[test]
    fn test_override_key_requires_both_fields() {
        let (_, resolver) = resolver();

        let both = RecordMetadata {
            event_code: Some("LOGIN"),
            product_uid: Some("p1"),
        };
        assert_eq!(
            resolver.override_key(&both).as_deref(),
            Some("overrides/p1/login.vm")
        );

        let only_code = RecordMetadata {
            event_code: Some("LOGIN"),
            product_uid: None,
        };
        assert_eq!(resolver.override_key(&only_code), None);
    }

    #[tokio::test]
    async fn test_resolve_prefers_override() {
        let (_, resolver) = resolver();
        let payload = json!({"metadata": {"event_code": "LOGIN", "product": {"uid": "p1"}}});

        assert_eq!(
            resolver.resolve(&payload).await.unwrap(),
            TemplateChoice::Override {
                key: "overrides/p1/login.vm".to_string(),
                content: "override body".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_default() {
        let (store, resolver) = resolver();

        let unknown = json!({"metadata": {"event_code": "LOGOUT", "product": {"uid": "p1"}}});
        assert_eq!(resolver.resolve(&unknown).await.unwrap(), TemplateChoice::Default);

        let bare = json!({"message": "no metadata"});
        assert_eq!(resolver.resolve(&bare).await.unwrap(), TemplateChoice::Default);

        // Only the LOGOUT lookup reached the store
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_override_falls_back_to_default() {
        let (store, resolver) = resolver();
        store.insert("bucket", "overrides/p1/logout.vm", "");

        let payload = json!({"metadata": {"event_code": "LOGOUT", "product": {"uid": "p1"}}});
        assert_eq!(resolver.resolve(&payload).await.unwrap(), TemplateChoice::Default);
    }

    #[tokio::test]
    async fn test_load_default() {
        let (store, resolver) = resolver();
        assert_eq!(resolver.load_default().await.unwrap(), "default body");

        store.remove("bucket", "ocsf_to_ecs.vm");
        let missing = TemplateResolver::new(
            Arc::new(TemplateCache::new(store, Duration::from_secs(300))),
            "bucket",
            "ocsf_to_ecs.vm",
            "overrides",
            "vm",
        );
        assert!(matches!(
            missing.load_default().await,
            Err(ResolveError::DefaultMissing { .. })
        ));
    }
}
