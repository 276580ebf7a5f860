// * Operations: structured logging and the registry's own metrics

pub mod telemetry;

pub use telemetry::{
    get_metrics_string, init_tracing_with_level, metrics_content_type, record_persist_failure,
    record_registration, record_reload, set_registry_size,
};
