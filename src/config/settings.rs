// * Process Settings - read once at startup from the environment

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::constants::{
    DEFAULT_CONFIG_PATH, DEFAULT_ENGINE_ADDR, DEFAULT_LISTEN_ADDR, DEFAULT_RELOAD_TIMEOUT_SECS,
    DEFAULT_SCRAPE_INTERVAL, ENGINE_CONSOLE_LIBRARIES, ENGINE_CONSOLE_TEMPLATES,
    ENGINE_STORAGE_PATH,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("LISTEN_ADDR is not a socket address: {0}")]
    InvalidListenAddr(String),

    #[error("RELOAD_TIMEOUT_SECS must be a positive integer, got {0:?}")]
    InvalidReloadTimeout(String),
}

/// Runtime settings for the registry process
#[derive(Debug, Clone)]
pub struct Settings {
    pub listen_addr: SocketAddr,
    pub engine_addr: String,
    pub config_path: PathBuf,
    /// Raw `SCRAPE_INTERVAL` value; parsed on every render so a bad value
    /// fails the request rather than the process
    pub scrape_interval: String,
    pub reload_timeout: Duration,
    /// `None` disables the engine launcher
    pub engine_command: Option<String>,
}

impl Settings {
    // * Reads settings from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // * Builds settings from an arbitrary key lookup (tests pass a map here)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_raw = lookup("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidListenAddr(listen_raw.clone()))?;

        let reload_timeout = match lookup("RELOAD_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidReloadTimeout(raw)),
            },
            None => Duration::from_secs(DEFAULT_RELOAD_TIMEOUT_SECS),
        };

        let config_path = PathBuf::from(
            lookup("CONFIG_PATH").unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()),
        );

        // * An explicitly empty ENGINE_COMMAND means "engine is supervised elsewhere"
        let engine_command = match lookup("ENGINE_COMMAND") {
            Some(cmd) if cmd.trim().is_empty() => None,
            Some(cmd) => Some(cmd),
            None => Some(default_engine_command(&config_path)),
        };

        Ok(Self {
            listen_addr,
            engine_addr: lookup("ENGINE_ADDR").unwrap_or_else(|| DEFAULT_ENGINE_ADDR.to_string()),
            config_path,
            scrape_interval: lookup("SCRAPE_INTERVAL")
                .unwrap_or_else(|| DEFAULT_SCRAPE_INTERVAL.to_string()),
            reload_timeout,
            engine_command,
        })
    }
}

/// The engine invocation used when `ENGINE_COMMAND` is unset
pub fn default_engine_command(config_path: &std::path::Path) -> String {
    format!(
        "prometheus -config.file={} -storage.local.path={} -web.console.libraries={} -web.console.templates={}",
        config_path.display(),
        ENGINE_STORAGE_PATH,
        ENGINE_CONSOLE_LIBRARIES,
        ENGINE_CONSOLE_TEMPLATES,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let settings = Settings::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(settings.listen_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(settings.engine_addr, "http://localhost:9090");
        assert_eq!(settings.config_path, PathBuf::from("/etc/prometheus/prometheus.yml"));
        assert_eq!(settings.scrape_interval, "5");
        assert_eq!(settings.reload_timeout, Duration::from_secs(5));
        assert_eq!(
            settings.engine_command.as_deref(),
            Some("prometheus -config.file=/etc/prometheus/prometheus.yml -storage.local.path=/prometheus -web.console.libraries=/usr/share/prometheus/console_libraries -web.console.templates=/usr/share/prometheus/consoles")
        );
    }

    #[test]
    fn test_overrides_are_applied() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("LISTEN_ADDR", "127.0.0.1:9999"),
            ("ENGINE_ADDR", "http://engine:9090"),
            ("CONFIG_PATH", "/tmp/engine.yml"),
            ("SCRAPE_INTERVAL", "123"),
            ("RELOAD_TIMEOUT_SECS", "2"),
        ]))
        .unwrap();

        assert_eq!(settings.listen_addr.port(), 9999);
        assert_eq!(settings.engine_addr, "http://engine:9090");
        assert_eq!(settings.scrape_interval, "123");
        assert_eq!(settings.reload_timeout, Duration::from_secs(2));
        // * Default command follows the configured artifact path
        assert!(settings
            .engine_command
            .unwrap()
            .contains("-config.file=/tmp/engine.yml"));
    }

    #[test]
    fn test_bad_scrape_interval_is_not_a_startup_error() {
        let settings = Settings::from_lookup(lookup_from(&[("SCRAPE_INTERVAL", "xxx")])).unwrap();
        assert_eq!(settings.scrape_interval, "xxx");
    }

    #[test]
    fn test_invalid_listen_addr_is_rejected() {
        let result = Settings::from_lookup(lookup_from(&[("LISTEN_ADDR", "not-an-addr")]));
        assert!(matches!(result, Err(ConfigError::InvalidListenAddr(_))));
    }

    #[test]
    fn test_zero_reload_timeout_is_rejected() {
        let result = Settings::from_lookup(lookup_from(&[("RELOAD_TIMEOUT_SECS", "0")]));
        assert!(matches!(result, Err(ConfigError::InvalidReloadTimeout(_))));
    }

    #[test]
    fn test_empty_engine_command_disables_launcher() {
        let settings = Settings::from_lookup(lookup_from(&[("ENGINE_COMMAND", "")])).unwrap();
        assert!(settings.engine_command.is_none());
    }
}
