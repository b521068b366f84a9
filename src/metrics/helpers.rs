//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{
    BATCHES_TOTAL, BATCH_LATENCY, BATCH_SIZE, RECORDS_PROCESSED_TOTAL, RECORD_FAILURES_TOTAL,
    STORE_FETCHES_TOTAL, TEMPLATE_CACHE_ENTRIES, TEMPLATE_CACHE_LOOKUPS_TOTAL,
    TEMPLATE_OVERRIDES_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording per-record metrics
pub struct RecordMetrics;

impl RecordMetrics {
    /// Record a successfully transformed record
    pub fn record_ok() {
        RECORDS_PROCESSED_TOTAL.with_label_values(&["ok"]).inc();
    }

    /// Record a failed record and the stage it failed in
    pub fn record_failed(stage: &str) {
        RECORDS_PROCESSED_TOTAL
            .with_label_values(&["processing_failed"])
            .inc();
        RECORD_FAILURES_TOTAL.with_label_values(&[stage]).inc();
    }

    /// Record that an override template was selected
    pub fn record_override() {
        TEMPLATE_OVERRIDES_TOTAL.inc();
    }
}

/// Helper struct for recording batch metrics
pub struct BatchMetrics;

impl BatchMetrics {
    /// Record a completed batch
    pub fn record_completed(size: usize, elapsed: Duration) {
        BATCHES_TOTAL.with_label_values(&["ok"]).inc();
        BATCH_SIZE.observe(size as f64);
        BATCH_LATENCY.observe(elapsed.as_secs_f64());
    }

    /// Record a batch that failed as a whole
    pub fn record_failed() {
        BATCHES_TOTAL.with_label_values(&["failed"]).inc();
    }
}

/// Helper struct for recording template cache metrics
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn record_hit() {
        TEMPLATE_CACHE_LOOKUPS_TOTAL
            .with_label_values(&["hit"])
            .inc();
    }

    pub fn record_miss() {
        TEMPLATE_CACHE_LOOKUPS_TOTAL
            .with_label_values(&["miss"])
            .inc();
    }

    /// Update the cache size gauge
    pub fn set_entries(count: usize) {
        TEMPLATE_CACHE_ENTRIES.set(count as i64);
    }
}

/// Helper struct for recording object store metrics
pub struct StoreMetrics;

impl StoreMetrics {
    pub fn record_found() {
        STORE_FETCHES_TOTAL.with_label_values(&["found"]).inc();
    }

    pub fn record_not_found() {
        STORE_FETCHES_TOTAL.with_label_values(&["not_found"]).inc();
    }

    pub fn record_error() {
        STORE_FETCHES_TOTAL.with_label_values(&["error"]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics_includes_recorded_series() {
        RecordMetrics::record_ok();
        CacheMetrics::record_miss();
        StoreMetrics::record_not_found();

        let output = encode_metrics().unwrap();
        assert!(output.contains("transformer_records_processed_total"));
        assert!(output.contains("transformer_template_cache_lookups_total"));
        assert!(output.contains("transformer_store_fetches_total"));
    }
}
