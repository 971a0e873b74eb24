// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for kubedns.
//!
//! All metrics carry the `kubedns_` prefix and are registered in a single global
//! registry exposed via the `/metrics` endpoint.
//!
//! # Metrics Categories
//!
//! - **Request Metrics** - DNS requests by zone and response code, and their latency
//! - **Store Metrics** - Watch events applied to the cluster-state stores
//! - **Change Metrics** - Modified-timestamp bumps per axis (SOA serial source)
//!
//! # Example
//!
//! ```rust,no_run
//! use kubedns::metrics::record_request;
//!
//! record_request("cluster.local.", "NOERROR", std::time::Duration::from_micros(80));
//! ```

use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all kubedns metrics
const METRICS_NAMESPACE: &str = "kubedns";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Request Metrics
// ============================================================================

/// Total number of DNS requests by zone and response code
///
/// Labels:
/// - `zone`: Zone the query fell into (empty when outside every zone)
/// - `rcode`: Response code (`NOERROR`, `NXDOMAIN`, `SERVFAIL`, `REFUSED`)
pub static REQUESTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_requests_total"),
        "Total number of DNS requests by zone and response code",
    );
    let counter = CounterVec::new(opts, &["zone", "rcode"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of DNS request handling in seconds
///
/// Labels:
/// - `zone`: Zone the query fell into
pub static REQUEST_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_request_duration_seconds"),
        "Duration of DNS request handling in seconds by zone",
    )
    .buckets(vec![
        0.000_025, 0.000_05, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.05,
    ]);
    let histogram = HistogramVec::new(opts, &["zone"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Store Metrics
// ============================================================================

/// Total number of watch events applied to the stores
///
/// Labels:
/// - `kind`: Object kind (e.g., `Service`, `Endpoints`)
/// - `event`: `add`, `update`, `delete`, `unchanged` or `dropped`
pub static STORE_EVENTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_store_events_total"),
        "Total number of watch events applied to the stores by kind and event",
    );
    let counter = CounterVec::new(opts, &["kind", "event"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Number of objects currently held per kind
///
/// Labels:
/// - `kind`: Object kind
pub static STORE_OBJECTS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_store_objects"),
        "Number of objects currently held in the stores by kind",
    );
    let gauge = GaugeVec::new(opts, &["kind"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Total number of watch stream errors
///
/// Labels:
/// - `kind`: Object kind whose stream failed
pub static WATCH_ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_watch_errors_total"),
        "Total number of watch stream errors by kind",
    );
    let counter = CounterVec::new(opts, &["kind"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Change Metrics
// ============================================================================

/// Total number of modified-timestamp bumps
///
/// Labels:
/// - `mode`: `internal`, `external` or `multicluster`
pub static MODIFIED_BUMPS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_modified_bumps_total"),
        "Total number of DNS-visible changes by modified axis",
    );
    let counter = CounterVec::new(opts, &["mode"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a handled DNS request
///
/// # Arguments
/// * `zone` - Zone the query fell into
/// * `rcode` - Response code written
/// * `duration` - Time spent handling the request
pub fn record_request(zone: &str, rcode: &str, duration: Duration) {
    REQUESTS_TOTAL.with_label_values(&[zone, rcode]).inc();
    REQUEST_DURATION_SECONDS
        .with_label_values(&[zone])
        .observe(duration.as_secs_f64());
}

/// Record a watch event applied to a store
///
/// # Arguments
/// * `kind` - Object kind
/// * `event` - `add`, `update`, `delete`, `unchanged` or `dropped`
pub fn record_store_event(kind: &str, event: &str) {
    STORE_EVENTS_TOTAL.with_label_values(&[kind, event]).inc();
}

/// Set the number of objects held for a kind
#[allow(clippy::cast_precision_loss)]
pub fn set_store_objects(kind: &str, count: usize) {
    STORE_OBJECTS.with_label_values(&[kind]).set(count as f64);
}

/// Record a watch stream error for a kind
pub fn record_watch_error(kind: &str) {
    WATCH_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

/// Record a modified-timestamp bump
///
/// # Arguments
/// * `mode` - `internal`, `external` or `multicluster`
pub fn record_modified_bump(mode: &str) {
    MODIFIED_BUMPS_TOTAL.with_label_values(&[mode]).inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Returns
/// Prometheus-formatted metrics as a String
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
