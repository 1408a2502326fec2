//! Prometheus metrics collection for proxvoice.
//!
//! - `proxvoice_events_total{event}` - Host events handled by type
//! - `proxvoice_event_duration_seconds{event}` - Event handling latency
//! - `proxvoice_moves_total{destination}` - Users moved, by destination kind
//! - `proxvoice_group_channels_created_total` / `_removed_total`
//! - `proxvoice_validation_failures_total{payload,reason}` - Rejected plugin payloads
//! - `proxvoice_errors_total{error}` - Events aborted by an error
//! - `proxvoice_tracked_sessions` - Sessions tracked across all servers

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

pub static EVENTS: OnceLock<IntCounterVec> = OnceLock::new();

pub static MOVES: OnceLock<IntCounterVec> = OnceLock::new();

pub static GROUPS_CREATED: OnceLock<IntCounter> = OnceLock::new();

pub static GROUPS_REMOVED: OnceLock<IntCounter> = OnceLock::new();

/// Plugin payloads that failed validation.
pub static VALIDATION_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();

pub static ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges and histograms
// ========================================================================

pub static TRACKED_SESSIONS: OnceLock<IntGauge> = OnceLock::new();

pub static EVENT_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call at startup before any metrics are recorded. Until then every
/// recording helper is a no-op. Later calls do nothing.
pub fn init() {
    static INITIALIZED: OnceLock<()> = OnceLock::new();
    INITIALIZED.get_or_init(register_all);
}

fn register_all() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(EVENTS, IntCounterVec::new(Opts::new("proxvoice_events_total", "Host events handled by type"), &["event"]));
    register!(EVENT_LATENCY, HistogramVec::new(
        HistogramOpts::new("proxvoice_event_duration_seconds", "Host event handling latency by type")
            .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        &["event"]));
    register!(MOVES, IntCounterVec::new(Opts::new("proxvoice_moves_total", "Users moved by destination kind"), &["destination"]));
    register!(GROUPS_CREATED, IntCounter::new("proxvoice_group_channels_created_total", "Group channels created"));
    register!(GROUPS_REMOVED, IntCounter::new("proxvoice_group_channels_removed_total", "Group channels removed"));
    register!(VALIDATION_FAILURES, IntCounterVec::new(Opts::new("proxvoice_validation_failures_total", "Plugin payloads rejected by validation"), &["payload", "reason"]));
    register!(ERRORS, IntCounterVec::new(Opts::new("proxvoice_errors_total", "Events aborted by an error"), &["error"]));
    register!(TRACKED_SESSIONS, IntGauge::new("proxvoice_tracked_sessions", "Sessions tracked across all servers"));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for metric updates
// ============================================================================

#[inline]
pub fn record_event(event: &str, duration_secs: f64) {
    if let Some(c) = EVENTS.get() {
        c.with_label_values(&[event]).inc();
    }
    if let Some(h) = EVENT_LATENCY.get() {
        h.with_label_values(&[event]).observe(duration_secs);
    }
}

/// Record a user move. `destination` is `map`, `waiting_room` or `group`.
#[inline]
pub fn record_move(destination: &str) {
    if let Some(c) = MOVES.get() {
        c.with_label_values(&[destination]).inc();
    }
}

#[inline]
pub fn record_group_created() {
    if let Some(c) = GROUPS_CREATED.get() {
        c.inc();
    }
}

#[inline]
pub fn record_group_removed() {
    if let Some(c) = GROUPS_REMOVED.get() {
        c.inc();
    }
}

#[inline]
pub fn record_validation_failure(payload: &str, reason: &str) {
    if let Some(c) = VALIDATION_FAILURES.get() {
        c.with_label_values(&[payload, reason]).inc();
    }
}

#[inline]
pub fn record_error(error: &str) {
    if let Some(c) = ERRORS.get() {
        c.with_label_values(&[error]).inc();
    }
}

#[inline]
pub fn add_tracked_sessions(delta: i64) {
    if let Some(g) = TRACKED_SESSIONS.get() {
        g.add(delta);
    }
}
