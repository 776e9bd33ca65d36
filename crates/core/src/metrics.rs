//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Collage suggestions and autocomplete (cache effectiveness)
//! - Forum thread and poll creation
//! - Admin SQL sandbox and the IRC relay

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Collages
// =============================================================================

/// Suggestion cache lookups by kind and result.
pub static SUGGESTION_CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "orpheum_suggestion_cache_lookups_total",
            "Collage suggestion cache lookups",
        ),
        &["kind", "result"], // kind: "artist", "group"; result: "hit", "miss"
    )
    .unwrap()
});

/// Autocomplete cache lookups by result.
pub static AUTOCOMPLETE_CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "orpheum_autocomplete_cache_lookups_total",
            "Collage autocomplete cache lookups",
        ),
        &["result"],
    )
    .unwrap()
});

/// Collages created.
pub static COLLAGES_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("orpheum_collages_created_total", "Total collages created").unwrap()
});

// =============================================================================
// Forums
// =============================================================================

/// Threads created.
pub static THREADS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("orpheum_threads_created_total", "Total forum threads created").unwrap()
});

/// Polls created.
pub static POLLS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("orpheum_polls_created_total", "Total forum polls created").unwrap()
});

// =============================================================================
// Tools
// =============================================================================

/// Sandbox requests by outcome.
pub static SANDBOX_QUERIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("orpheum_sandbox_queries_total", "Admin SQL sandbox requests"),
        &["outcome"], // "executed", "store_error", "rejected", "shown"
    )
    .unwrap()
});

/// Sandbox query execution time.
pub static SANDBOX_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "orpheum_sandbox_query_duration_seconds",
            "Duration of executed sandbox queries",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &[],
    )
    .unwrap()
});

/// Relay deliveries by result.
pub static RELAY_MESSAGES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("orpheum_relay_messages_total", "IRC relay messages"),
        &["result"], // "sent", "failed", "dropped"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Collages
        Box::new(SUGGESTION_CACHE_LOOKUPS.clone()),
        Box::new(AUTOCOMPLETE_CACHE_LOOKUPS.clone()),
        Box::new(COLLAGES_CREATED.clone()),
        // Forums
        Box::new(THREADS_CREATED.clone()),
        Box::new(POLLS_CREATED.clone()),
        // Tools
        Box::new(SANDBOX_QUERIES.clone()),
        Box::new(SANDBOX_DURATION.clone()),
        Box::new(RELAY_MESSAGES.clone()),
    ]
}
