// * Configuration Constants
// * Central location for well-known paths, addresses and timeouts

// * Registration server bind address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

// * Base address of the scrape engine's control endpoint
pub const DEFAULT_ENGINE_ADDR: &str = "http://localhost:9090";

// * The single config artifact read by the engine
pub const DEFAULT_CONFIG_PATH: &str = "/etc/prometheus/prometheus.yml";

// * Scrape interval in seconds, kept raw and parsed at render time
pub const DEFAULT_SCRAPE_INTERVAL: &str = "5";

// * Upper bound on a single reload round trip
pub const DEFAULT_RELOAD_TIMEOUT_SECS: u64 = 5;

// * Engine control path that triggers a config re-read
pub const RELOAD_PATH: &str = "/-/reload";

// * Inbound registration endpoint
pub const REGISTRATION_PATH: &str = "/v1/docker-flow-monitor";

// * Largest accepted urlencoded registration body
pub const MAX_REGISTRATION_BODY_BYTES: usize = 64 * 1024;

// * Engine storage and console locations used by the default launch command
pub const ENGINE_STORAGE_PATH: &str = "/prometheus";
pub const ENGINE_CONSOLE_LIBRARIES: &str = "/usr/share/prometheus/console_libraries";
pub const ENGINE_CONSOLE_TEMPLATES: &str = "/usr/share/prometheus/consoles";
