use crate::config::constants::RELOAD_PATH;
use crate::network::errors::ReloadError;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use url::Url;

/// Outcome of one reload attempt
///
/// `http_status` is 0 when the request never completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadResult {
    pub ok: bool,
    pub http_status: u16,
}

impl ReloadResult {
    // * Only the success range counts as a reload
    pub fn from_status(http_status: u16) -> Self {
        Self {
            ok: http_status < 300,
            http_status,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            ok: false,
            http_status: 0,
        }
    }

    pub fn completed(&self) -> bool {
        self.http_status != 0
    }
}

/// Type alias for async reload result
pub type ReloadFuture = Pin<Box<dyn Future<Output = ReloadResult> + Send>>;

/// Signals the running engine to re-read its config
pub trait Reloader: Send + Sync {
    fn reload(&self) -> ReloadFuture;
}

// * Sends `POST <base>/-/reload` to the engine's control endpoint.
// * One attempt per call, bounded by the client timeout, no retries.
#[derive(Debug, Clone)]
pub struct HttpReloader {
    inner: Client,
    base_addr: String,
}

impl HttpReloader {
    // * The base address is only parsed when reloading, so a bad address
    // * surfaces as an unreachable engine rather than a startup failure.
    pub fn new(base_addr: impl Into<String>, timeout: Duration) -> Result<Self, ReloadError> {
        let client = Client::builder().timeout(timeout).no_proxy().build()?;

        Ok(Self {
            inner: client,
            base_addr: base_addr.into(),
        })
    }

    /// Builds the control URL, keeping any path prefix on the base address
    pub fn reload_url(base_addr: &str) -> Result<Url, ReloadError> {
        let raw = format!("{}{}", base_addr.trim_end_matches('/'), RELOAD_PATH);
        Url::parse(&raw).map_err(|source| ReloadError::InvalidAddress {
            address: base_addr.to_string(),
            source,
        })
    }

    // * Returns the status of any completed response, success or not.
    pub async fn send(&self) -> Result<u16, ReloadError> {
        let url = Self::reload_url(&self.base_addr)?;
        let resp = self
            .inner
            .post(url)
            .send()
            .await
            .map_err(ReloadError::classify)?;

        Ok(resp.status().as_u16())
    }
}

impl Reloader for HttpReloader {
    fn reload(&self) -> ReloadFuture {
        let reloader = self.clone();
        Box::pin(async move {
            match reloader.send().await {
                Ok(status) => {
                    let result = ReloadResult::from_status(status);
                    if !result.ok {
                        tracing::warn!(
                            engine = %reloader.base_addr,
                            status,
                            "Engine rejected config reload"
                        );
                    }
                    result
                }
                Err(e) => {
                    tracing::warn!(
                        engine = %reloader.base_addr,
                        error = %e,
                        "Engine unreachable for config reload"
                    );
                    ReloadResult::unreachable()
                }
            }
        })
    }
}
