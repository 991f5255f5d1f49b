//! Prometheus metrics for pipeline runs.
//!
//! This module provides metrics for:
//! - Runs (final status)
//! - Retries (per-attempt and give-up)
//! - Downloads, distribution, excerpts, publishing
//!
//! A run is a short-lived process, so there is no scrape endpoint: the binary
//! writes [`gather_text`] to a textfile for a node-exporter textfile collector.

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Registry holding every reelcast metric.
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

// =============================================================================
// Run Metrics
// =============================================================================

/// Runs total by final status.
pub static RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelcast_runs_total", "Total pipeline runs"),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Retry Metrics
// =============================================================================

/// Failed attempts that were followed by a backoff.
pub static RETRY_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelcast_retry_attempts_total",
            "Failed attempts followed by a retry",
        ),
        &["operation"],
    )
    .unwrap()
});

/// Operations that exhausted their retry budget.
pub static RETRY_GIVE_UPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelcast_retry_give_ups_total",
            "Operations that exhausted all attempts",
        ),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Stage Metrics
// =============================================================================

/// Bytes written to staging by the fetcher.
pub static DOWNLOADED_BYTES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelcast_downloaded_bytes_total",
        "Bytes downloaded into staging",
    )
    .unwrap()
});

/// Distribution attempts by result.
pub static DISTRIBUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelcast_distributions_total",
            "Staged files pushed to the distribution channel",
        ),
        &["result"], // "delivered", "failed", "skipped"
    )
    .unwrap()
});

/// Excerpt derivations by outcome.
pub static EXCERPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelcast_excerpts_total", "Excerpt derivations"),
        &["outcome"], // "success", "ignored", "error"
    )
    .unwrap()
});

/// Publish duration in seconds, including polling and retries.
pub static PUBLISH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelcast_publish_duration_seconds",
            "Duration of feed publishing",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["result"],
    )
    .unwrap()
});

/// Register all metrics with the registry. Safe to call more than once.
pub fn register_metrics() {
    let _ = REGISTRY.register(Box::new(RUNS.clone()));
    let _ = REGISTRY.register(Box::new(RETRY_ATTEMPTS.clone()));
    let _ = REGISTRY.register(Box::new(RETRY_GIVE_UPS.clone()));
    let _ = REGISTRY.register(Box::new(DOWNLOADED_BYTES.clone()));
    let _ = REGISTRY.register(Box::new(DISTRIBUTIONS.clone()));
    let _ = REGISTRY.register(Box::new(EXCERPTS.clone()));
    let _ = REGISTRY.register(Box::new(PUBLISH_DURATION.clone()));
}

/// Render the registry in the Prometheus text exposition format.
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&REGISTRY.gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
