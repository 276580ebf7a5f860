// * Telemetry - JSON Logging and Prometheus Self-Metrics
// * Structured logging plus the registry's own metrics, served on /metrics

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Encoder, Gauge, Histogram, TextEncoder,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::network::ReloadResult;

lazy_static! {
    // * Registrations by response status
    pub static ref REGISTRATIONS_TOTAL: CounterVec = register_counter_vec!(
        "scrape_registry_registrations_total",
        "Total registration requests by response status",
        &["status"]
    ).unwrap();

    // * Reload attempts by outcome
    pub static ref RELOADS_TOTAL: CounterVec = register_counter_vec!(
        "scrape_registry_reloads_total",
        "Total engine reload attempts by outcome",
        &["outcome"]
    ).unwrap();

    // * Reload round trip duration
    pub static ref RELOAD_DURATION_SECONDS: Histogram = register_histogram!(
        "scrape_registry_reload_duration_seconds",
        "Engine reload round trip in seconds",
        vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    ).unwrap();

    // * Failed artifact writes
    pub static ref PERSIST_FAILURES_TOTAL: Counter = register_counter!(
        "scrape_registry_persist_failures_total",
        "Total failed config artifact writes"
    ).unwrap();

    // * Registry size
    pub static ref TARGETS: Gauge = register_gauge!(
        "scrape_registry_targets",
        "Number of registered scrape targets"
    ).unwrap();

    pub static ref RULES: Gauge = register_gauge!(
        "scrape_registry_rules",
        "Number of registered alert rules"
    ).unwrap();
}

/// Initializes JSON tracing; `level` is the filter used when `RUST_LOG` is unset
///
/// # Example
/// ```ignore
/// use scrape_registry::ops::telemetry;
///
/// telemetry::init_tracing_with_level("info");
/// tracing::info!(service = "my-service", "Scrape target registered");
/// ```
pub fn init_tracing_with_level(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .init();
}

/// Returns the current metrics in Prometheus text format
pub fn get_metrics_string() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Content type of [`get_metrics_string`] output
pub fn metrics_content_type() -> String {
    TextEncoder::new().format_type().to_string()
}

/// Records a finished registration by its response status ("OK"/"NOK")
pub fn record_registration(status: &str) {
    let label = status.to_lowercase();
    REGISTRATIONS_TOTAL
        .with_label_values(&[label.as_str()])
        .inc();
}

/// Records a reload attempt and how long it took
pub fn record_reload(result: &ReloadResult, seconds: f64) {
    let outcome = if result.ok {
        "ok"
    } else if result.completed() {
        "rejected"
    } else {
        "unreachable"
    };
    RELOADS_TOTAL.with_label_values(&[outcome]).inc();
    RELOAD_DURATION_SECONDS.observe(seconds);
}

/// Records a failed artifact write
pub fn record_persist_failure() {
    PERSIST_FAILURES_TOTAL.inc();
}

/// Updates the registry size gauges
pub fn set_registry_size(targets: usize, rules: usize) {
    TARGETS.set(targets as f64);
    RULES.set(rules as f64);
}
