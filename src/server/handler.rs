// * Registration Handler
// * Applies a registration to the registry, then renders, persists and reloads
// * as one critical section per config generation.

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::network::{ReloadResult, Reloader};
use crate::ops::telemetry;
use crate::persistence::{ConfigStore, PersistError};
use crate::registry::Registry;
use crate::render::{render_config, RenderError};
use crate::server::request::{RegistrationRequest, RegistrationResponse, Status};

// * Status used when no engine status is available
pub const GENERIC_FAILURE_STATUS: u16 = 500;

/// Why a registration came back NOK
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("persist failed: {0}")]
    Persist(#[from] PersistError),

    #[error("engine rejected reload with HTTP {0}")]
    ReloadRejected(u16),

    #[error("engine unreachable for reload")]
    EngineUnreachable,
}

impl RegistrationError {
    // * Mirrors the engine's status when the reload request completed
    pub fn http_status(&self) -> u16 {
        match self {
            RegistrationError::ReloadRejected(status) => *status,
            _ => GENERIC_FAILURE_STATUS,
        }
    }
}

/// Response body plus the HTTP status to send it with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationOutcome {
    pub response: RegistrationResponse,
    pub http_status: u16,
}

/// Owns the registry and the collaborators of the refresh pipeline
pub struct RegistrationService {
    registry: Mutex<Registry>,
    store: Arc<dyn ConfigStore>,
    reloader: Arc<dyn Reloader>,
    scrape_interval: String,
}

impl std::fmt::Debug for RegistrationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationService")
            .field("scrape_interval", &self.scrape_interval)
            .finish()
    }
}

impl RegistrationService {
    /// Creates a service over an empty registry
    pub fn new(
        store: Arc<dyn ConfigStore>,
        reloader: Arc<dyn Reloader>,
        scrape_interval: impl Into<String>,
    ) -> Self {
        Self::with_registry(Registry::new(), store, reloader, scrape_interval)
    }

    pub fn with_registry(
        registry: Registry,
        store: Arc<dyn ConfigStore>,
        reloader: Arc<dyn Reloader>,
        scrape_interval: impl Into<String>,
    ) -> Self {
        Self {
            registry: Mutex::new(registry),
            store,
            reloader,
            scrape_interval: scrape_interval.into(),
        }
    }

    /// Point-in-time copy of the registry
    pub async fn snapshot(&self) -> Registry {
        self.registry.lock().await.clone()
    }

    /// Handles one registration end to end.
    ///
    /// Always refreshes the config, even when the request carries nothing.
    /// Never fails: every error is folded into a NOK outcome.
    pub async fn handle(&self, request: RegistrationRequest) -> RegistrationOutcome {
        // * Held through reload so generations never interleave on the artifact
        let mut registry = self.registry.lock().await;

        let target = request
            .target
            .and_then(|t| registry.upsert_target(&t.name, t.port))
            .unwrap_or_default();
        let rule = request
            .rule
            .and_then(|r| registry.upsert_rule(&r.name, &r.condition, &r.source))
            .unwrap_or_default();

        telemetry::set_registry_size(registry.target_count(), registry.rule_count());

        let refreshed = self.refresh(&registry).await;
        drop(registry);

        let (status, http_status) = match &refreshed {
            Ok(http_status) => (Status::Ok, *http_status),
            Err(e) => (Status::Nok, e.http_status()),
        };
        telemetry::record_registration(status.as_str());

        match &refreshed {
            Ok(_) => info!(
                service = %target.name,
                rule = %rule.name,
                http_status,
                "Registration applied and engine reloaded"
            ),
            Err(e) => warn!(
                service = %target.name,
                rule = %rule.name,
                http_status,
                error = %e,
                "Registration stored but config refresh failed"
            ),
        }

        RegistrationOutcome {
            response: RegistrationResponse {
                status,
                target,
                rule,
            },
            http_status,
        }
    }

    // * render -> persist -> reload; a render or persist failure skips the reload
    async fn refresh(&self, registry: &Registry) -> Result<u16, RegistrationError> {
        let rendered = render_config(registry, &self.scrape_interval).map_err(|e| {
            error!(error = %e, "Config render failed, artifact left untouched");
            e
        })?;

        self.store.persist(rendered.text()).await.map_err(|e| {
            telemetry::record_persist_failure();
            error!(error = %e, "Config persist failed, skipping reload");
            e
        })?;

        let started = Instant::now();
        let result: ReloadResult = self.reloader.reload().await;
        telemetry::record_reload(&result, started.elapsed().as_secs_f64());

        if result.ok {
            Ok(result.http_status)
        } else if result.completed() {
            Err(RegistrationError::ReloadRejected(result.http_status))
        } else {
            Err(RegistrationError::EngineUnreachable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::ReloadFuture;
    use crate::persistence::{InMemoryConfigStore, PersistResult};
    use crate::registry::{AlertRule, ScrapeTarget};
    use std::sync::atomic::{AtomicUsize, Ordering};

    // * Answers every reload with a fixed result and counts calls
    struct FixedReloader {
        result: ReloadResult,
        calls: AtomicUsize,
    }

    impl FixedReloader {
        fn new(result: ReloadResult) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Reloader for FixedReloader {
        fn reload(&self) -> ReloadFuture {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = self.result;
            Box::pin(async move { result })
        }
    }

    struct FailingStore;

    impl ConfigStore for FailingStore {
        fn persist(&self, _text: String) -> PersistResult {
            Box::pin(async { Err(PersistError::Rejected("disk full".to_string())) })
        }
    }

    fn service_with(
        store: Arc<dyn ConfigStore>,
        reloader: Arc<FixedReloader>,
        interval: &str,
    ) -> RegistrationService {
        RegistrationService::new(store, reloader, interval)
    }

    #[tokio::test]
    async fn test_full_registration_is_ok() {
        let store = Arc::new(InMemoryConfigStore::new());
        let reloader = FixedReloader::new(ReloadResult::from_status(200));
        let service = service_with(store.clone(), reloader.clone(), "5");

        let outcome = service
            .handle(
                RegistrationRequest::new()
                    .with_target("my-service", 1234)
                    .with_rule("my-alert", "my-if", "my-from"),
            )
            .await;

        assert_eq!(outcome.http_status, 200);
        assert_eq!(outcome.response.status, Status::Ok);
        assert_eq!(outcome.response.target, ScrapeTarget::new("my-service", 1234));
        assert_eq!(
            outcome.response.rule,
            AlertRule::new("my-alert", "my-if", "my-from")
        );
        assert_eq!(reloader.calls(), 1);

        let text = store.contents().unwrap();
        assert!(text.contains("job_name: \"my-service\""));
        assert!(text.contains("ALERT my-alert\n  IF my-if\n  FROM my-from\n"));
    }

    #[tokio::test]
    async fn test_empty_request_still_refreshes() {
        let store = Arc::new(InMemoryConfigStore::new());
        let reloader = FixedReloader::new(ReloadResult::from_status(200));
        let service = service_with(store.clone(), reloader.clone(), "5");

        let outcome = service.handle(RegistrationRequest::new()).await;

        assert_eq!(outcome.response.status, Status::Ok);
        assert_eq!(outcome.response.target, ScrapeTarget::default());
        assert_eq!(outcome.response.rule, AlertRule::default());
        assert_eq!(store.write_count(), 1);
        assert_eq!(reloader.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_names_echo_zero_values() {
        let store = Arc::new(InMemoryConfigStore::new());
        let reloader = FixedReloader::new(ReloadResult::from_status(200));
        let service = service_with(store, reloader, "5");

        let outcome = service
            .handle(RegistrationRequest::new().with_target("", 80).with_rule("?!", "x", ""))
            .await;

        assert_eq!(outcome.response.target, ScrapeTarget::default());
        assert_eq!(outcome.response.rule, AlertRule::default());
        assert!(service.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_reload_mirrors_status() {
        let store = Arc::new(InMemoryConfigStore::new());
        let reloader = FixedReloader::new(ReloadResult::from_status(502));
        let service = service_with(store, reloader, "5");

        let outcome = service
            .handle(RegistrationRequest::new().with_target("svc", 1234))
            .await;

        assert_eq!(outcome.response.status, Status::Nok);
        assert_eq!(outcome.http_status, 502);
        // * Stored value is still echoed on failure
        assert_eq!(outcome.response.target, ScrapeTarget::new("svc", 1234));
    }

    #[tokio::test]
    async fn test_unreachable_engine_uses_generic_status() {
        let store = Arc::new(InMemoryConfigStore::new());
        let reloader = FixedReloader::new(ReloadResult::unreachable());
        let service = service_with(store, reloader, "5");

        let outcome = service
            .handle(RegistrationRequest::new().with_target("svc", 1234))
            .await;

        assert_eq!(outcome.response.status, Status::Nok);
        assert_eq!(outcome.http_status, GENERIC_FAILURE_STATUS);
    }

    #[tokio::test]
    async fn test_bad_interval_skips_persist_and_reload() {
        let store = Arc::new(InMemoryConfigStore::new());
        let reloader = FixedReloader::new(ReloadResult::from_status(200));
        let service = service_with(store.clone(), reloader.clone(), "xxx");

        let outcome = service
            .handle(RegistrationRequest::new().with_target("svc", 1234))
            .await;

        assert_eq!(outcome.response.status, Status::Nok);
        assert_eq!(outcome.http_status, GENERIC_FAILURE_STATUS);
        assert_eq!(store.write_count(), 0);
        assert_eq!(reloader.calls(), 0);
        // * The registry mutation itself is kept
        assert_eq!(service.snapshot().await.target_count(), 1);
    }

    #[tokio::test]
    async fn test_persist_failure_skips_reload() {
        let reloader = FixedReloader::new(ReloadResult::from_status(200));
        let service = service_with(Arc::new(FailingStore), reloader.clone(), "5");

        let outcome = service
            .handle(RegistrationRequest::new().with_rule("cpu", "load > 1", ""))
            .await;

        assert_eq!(outcome.response.status, Status::Nok);
        assert_eq!(outcome.http_status, GENERIC_FAILURE_STATUS);
        assert_eq!(outcome.response.rule.name, "cpu");
        assert_eq!(reloader.calls(), 0);
    }

    #[tokio::test]
    async fn test_failure_does_not_poison_later_requests() {
        let store = Arc::new(InMemoryConfigStore::new());
        let reloader = FixedReloader::new(ReloadResult::from_status(200));
        let broken = service_with(store.clone(), reloader.clone(), "xxx");
        broken.handle(RegistrationRequest::new().with_target("a", 1)).await;

        let outcome = broken.handle(RegistrationRequest::new()).await;
        assert_eq!(outcome.response.status, Status::Nok);

        let healthy = RegistrationService::with_registry(
            broken.snapshot().await,
            store.clone(),
            reloader,
            "5",
        );
        let outcome = healthy.handle(RegistrationRequest::new()).await;
        assert_eq!(outcome.response.status, Status::Ok);
        assert!(store.contents().unwrap().contains("tasks.a"));
    }
}
