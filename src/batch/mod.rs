//! Batch processing.
//!
//! Loads and compiles the default template once per batch, then transforms
//! each record in order. A record failure never stops the batch; only an
//! unusable default template fails the whole invocation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::metrics::BatchMetrics;
use crate::template::{
    RenderSession, ResolveError, TemplateEngine, TemplateError, TemplateResolver,
};
use crate::transform::{InputRecord, OutputRecord, RecordTransformer};

/// Errors that fail an entire batch.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Default template unavailable: {0}")]
    DefaultTemplate(#[from] ResolveError),

    #[error("Default template is invalid: {0}")]
    InvalidDefaultTemplate(#[from] TemplateError),
}

/// Batch processing statistics
#[derive(Debug, Default)]
pub struct BatchStats {
    pub batches_processed: AtomicU64,
    pub batches_failed: AtomicU64,
    pub records_ok: AtomicU64,
    pub records_failed: AtomicU64,
}

impl BatchStats {
    pub fn snapshot(&self) -> BatchStatsSnapshot {
        BatchStatsSnapshot {
            batches_processed: self.batches_processed.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            records_ok: self.records_ok.load(Ordering::Relaxed),
            records_failed: self.records_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchStatsSnapshot {
    pub batches_processed: u64,
    pub batches_failed: u64,
    pub records_ok: u64,
    pub records_failed: u64,
}

/// Transforms whole batches against a shared resolver and engine.
pub struct BatchProcessor {
    resolver: Arc<TemplateResolver>,
    engine: TemplateEngine,
    application_version: Option<String>,
    stats: BatchStats,
}

impl BatchProcessor {
    pub fn new(
        resolver: Arc<TemplateResolver>,
        engine: TemplateEngine,
        application_version: Option<String>,
    ) -> Self {
        Self {
            resolver,
            engine,
            application_version,
            stats: BatchStats::default(),
        }
    }

    pub fn stats(&self) -> BatchStatsSnapshot {
        self.stats.snapshot()
    }

    /// Transform `records`, returning one output per input in the same order.
    #[tracing::instrument(
        name = "batch.process",
        skip(self, records),
        fields(batch_size = records.len())
    )]
    pub async fn process(&self, records: &[InputRecord]) -> Result<Vec<OutputRecord>, BatchError> {
        let started = Instant::now();

        tracing::info!(
            app_version = self.application_version.as_deref().unwrap_or("unknown"),
            batch_size = records.len(),
            "Processing batch"
        );

        let session = match self.load_session().await {
            Ok(session) => session,
            Err(e) => {
                self.stats.batches_failed.fetch_add(1, Ordering::Relaxed);
                BatchMetrics::record_failed();
                tracing::error!(
                    location = %self.resolver.location(),
                    key = %self.resolver.default_key(),
                    error = %e,
                    "Failed to load default template"
                );
                return Err(e);
            }
        };

        let transformer = RecordTransformer::new(&self.resolver, &session);
        let mut outputs = Vec::with_capacity(records.len());
        for record in records {
            outputs.push(transformer.transform(record).await);
        }

        let ok = outputs.iter().filter(|output| output.is_ok()).count();
        let failed = outputs.len() - ok;

        self.stats.batches_processed.fetch_add(1, Ordering::Relaxed);
        self.stats.records_ok.fetch_add(ok as u64, Ordering::Relaxed);
        self.stats.records_failed.fetch_add(failed as u64, Ordering::Relaxed);
        BatchMetrics::record_completed(records.len(), started.elapsed());

        tracing::info!(
            records = outputs.len(),
            ok = ok,
            failed = failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Processing completed"
        );

        Ok(outputs)
    }

    async fn load_session(&self) -> Result<RenderSession, BatchError> {
        let default_content = self.resolver.load_default().await?;
        Ok(self.engine.session(&default_content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::FunctionRegistry;
    use crate::store::MemoryObjectStore;
    use crate::template::TemplateCache;
    use crate::transform::RecordResult;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use std::time::Duration;

    fn processor(default_body: Option<&str>) -> (Arc<MemoryObjectStore>, BatchProcessor) {
        let store = Arc::new(MemoryObjectStore::new());
        if let Some(body) = default_body {
            store.insert("bucket", "ocsf_to_ecs.vm", body);
        }
        let cache = Arc::new(TemplateCache::new(store.clone(), Duration::from_secs(300)));
        let resolver = Arc::new(TemplateResolver::new(
            cache,
            "bucket",
            "ocsf_to_ecs.vm",
            "overrides",
            "vm",
        ));
        let engine = TemplateEngine::new(&FunctionRegistry::default());
        (store, BatchProcessor::new(resolver, engine, Some("1.2.3".to_string())))
    }

    fn record(id: &str, payload: &str) -> InputRecord {
        InputRecord {
            record_id: id.to_string(),
            data: STANDARD.encode(payload),
        }
    }

    #[tokio::test]
    async fn test_preserves_order_and_isolates_failures() {
        let (_, processor) = processor(Some("{{value}}"));
        let records = vec![
            record("a", r#"{"value": 1}"#),
            record("b", "not-json"),
            record("c", r#"{"value": 3}"#),
        ];

        let outputs = processor.process(&records).await.unwrap();

        let ids: Vec<_> = outputs.iter().map(|o| o.record_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        let results: Vec<_> = outputs.iter().map(|o| o.result).collect();
        assert_eq!(
            results,
            [RecordResult::Ok, RecordResult::ProcessingFailed, RecordResult::Ok]
        );

        let stats = processor.stats();
        assert_eq!(stats.batches_processed, 1);
        assert_eq!(stats.records_ok, 2);
        assert_eq!(stats.records_failed, 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let (_, processor) = processor(Some("{{value}}"));
        assert!(processor.process(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_default_fails_batch() {
        let (_, processor) = processor(None);

        let result = processor.process(&[record("a", "{}")]).await;
        assert!(matches!(
            result,
            Err(BatchError::DefaultTemplate(ResolveError::DefaultMissing { .. }))
        ));
        assert_eq!(processor.stats().batches_failed, 1);
    }

    #[tokio::test]
    async fn test_invalid_default_fails_batch() {
        let (_, processor) = processor(Some("{{#if}}"));

        assert!(matches!(
            processor.process(&[record("a", "{}")]).await,
            Err(BatchError::InvalidDefaultTemplate(_))
        ));
    }

    #[tokio::test]
    async fn test_default_loaded_once_per_batch() {
        let (store, processor) = processor(Some("{{value}}"));
        let records: Vec<_> = (0..5)
            .map(|i| record(&i.to_string(), r#"{"value": 1}"#))
            .collect();

        processor.process(&records).await.unwrap();
        processor.process(&records).await.unwrap();

        // Second batch is served from the cache
        assert_eq!(store.fetch_count(), 1);
    }
}
