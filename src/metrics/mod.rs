//! Prometheus metrics for the log transformer.
//!
//! This module provides metrics for monitoring the transformation pipeline:
//! - Record metrics (processed by result, failures by stage)
//! - Batch metrics (invocations, size, latency)
//! - Template cache metrics (hits, misses, entries)
//! - Object store metrics (fetch outcomes)

mod helpers;

pub use helpers::{encode_metrics, BatchMetrics, CacheMetrics, RecordMetrics, StoreMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "transformer";

lazy_static! {
    // ============================================================================
    // Record Metrics
    // ============================================================================

    /// Records processed, labelled by result (ok / processing_failed)
    pub static ref RECORDS_PROCESSED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_records_processed_total", METRIC_PREFIX),
        "Total records processed",
        &["result"]
    ).unwrap();

    /// Record failures by the stage that failed (parse / render)
    pub static ref RECORD_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_record_failures_total", METRIC_PREFIX),
        "Total record transformation failures",
        &["stage"]
    ).unwrap();

    /// Records rendered with an override template instead of the default
    pub static ref TEMPLATE_OVERRIDES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_template_overrides_total", METRIC_PREFIX),
        "Total records rendered with an override template"
    ).unwrap();

    // ============================================================================
    // Batch Metrics
    // ============================================================================

    /// Batch invocations by status (ok / failed)
    pub static ref BATCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_batches_total", METRIC_PREFIX),
        "Total batch invocations",
        &["status"]
    ).unwrap();

    /// Records per batch
    pub static ref BATCH_SIZE: Histogram = register_histogram!(
        format!("{}_batch_size", METRIC_PREFIX),
        "Number of records per batch",
        vec![1.0, 10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    ).unwrap();

    /// Batch processing latency
    pub static ref BATCH_LATENCY: Histogram = register_histogram!(
        format!("{}_batch_latency_seconds", METRIC_PREFIX),
        "Batch processing latency in seconds",
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]
    ).unwrap();

    // ============================================================================
    // Template Cache Metrics
    // ============================================================================

    /// Cache lookups by outcome (hit / miss)
    pub static ref TEMPLATE_CACHE_LOOKUPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_template_cache_lookups_total", METRIC_PREFIX),
        "Total template cache lookups",
        &["outcome"]
    ).unwrap();

    /// Entries currently held by the template cache (live or expired)
    pub static ref TEMPLATE_CACHE_ENTRIES: IntGauge = register_int_gauge!(
        format!("{}_template_cache_entries", METRIC_PREFIX),
        "Entries currently held by the template cache"
    ).unwrap();

    // ============================================================================
    // Object Store Metrics
    // ============================================================================

    /// Store fetches by outcome (found / not_found / error)
    pub static ref STORE_FETCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_store_fetches_total", METRIC_PREFIX),
        "Total object store fetches",
        &["outcome"]
    ).unwrap();
}
