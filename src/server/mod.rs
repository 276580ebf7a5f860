// * HTTP boundary for registrations
// * Routes: /v1/docker-flow-monitor (GET/POST), /metrics, /health

pub mod handler;
pub mod request;

pub use handler::{RegistrationError, RegistrationOutcome, RegistrationService};
pub use request::{RegistrationRequest, RegistrationResponse, Status};

use hyper::body::HttpBody;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::constants::{MAX_REGISTRATION_BODY_BYTES, REGISTRATION_PATH};
use crate::ops::telemetry;

/// Handle to a running registration server
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    running: Arc<AtomicBool>,
    task: JoinHandle<Result<(), hyper::Error>>,
}

impl ServerHandle {
    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns true if the server is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Signals graceful shutdown and waits for the server to stop
    pub async fn shutdown(mut self) -> Result<(), hyper::Error> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.wait().await
    }

    /// Waits for the server task to finish on its own
    pub async fn wait(self) -> Result<(), hyper::Error> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Registration server task aborted");
                Ok(())
            }
        }
    }
}

/// Binds `addr` and serves registrations in the background.
///
/// Bind failures are returned here rather than from the spawned task.
pub fn start_server(
    addr: SocketAddr,
    service: Arc<RegistrationService>,
) -> Result<ServerHandle, hyper::Error> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    let make_svc = hyper::service::make_service_fn(move |_conn| {
        let service = service.clone();
        async move {
            Ok::<_, Infallible>(hyper::service::service_fn(move |req| {
                route(service.clone(), req)
            }))
        }
    });

    let server = hyper::Server::try_bind(&addr)?.serve(make_svc);
    let local_addr = server.local_addr();

    let task = tokio::spawn(async move {
        tracing::info!(addr = %local_addr, "Registration server started");

        let result = server
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;

        if let Err(e) = &result {
            tracing::error!(error = %e, "Registration server error");
        }

        running_clone.store(false, Ordering::Relaxed);
        tracing::info!("Registration server stopped");
        result
    });

    Ok(ServerHandle {
        local_addr,
        shutdown_tx: Some(shutdown_tx),
        running,
        task,
    })
}

/// Dispatches one HTTP request
pub async fn route(
    service: Arc<RegistrationService>,
    req: Request<Body>,
) -> Result<Response<Body>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, REGISTRATION_PATH) | (&Method::POST, REGISTRATION_PATH) => {
            Ok(handle_registration(service, req).await)
        }
        (_, REGISTRATION_PATH) => Ok(text_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed",
        )),
        (&Method::GET, "/metrics") => {
            let mut resp = Response::new(Body::from(telemetry::get_metrics_string()));
            if let Ok(value) = HeaderValue::from_str(&telemetry::metrics_content_type()) {
                resp.headers_mut().insert(CONTENT_TYPE, value);
            }
            Ok(resp)
        }
        (&Method::GET, "/health") => Ok(text_response(StatusCode::OK, "OK")),
        _ => Ok(text_response(StatusCode::NOT_FOUND, "Not Found")),
    }
}

async fn handle_registration(service: Arc<RegistrationService>, req: Request<Body>) -> Response<Body> {
    let mut raw = req.uri().query().unwrap_or_default().to_string();

    // * POST bodies carry the same urlencoded form; body pairs follow query pairs
    if req.method() == Method::POST {
        match read_body(req.into_body(), MAX_REGISTRATION_BODY_BYTES).await {
            Ok(bytes) if !bytes.is_empty() => {
                if !raw.is_empty() {
                    raw.push('&');
                }
                raw.push_str(&String::from_utf8_lossy(&bytes));
            }
            Ok(_) => {}
            Err(BodyError::TooLarge) => {
                tracing::warn!(
                    limit = MAX_REGISTRATION_BODY_BYTES,
                    "Rejecting oversized registration body"
                );
                return text_response(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large");
            }
            Err(BodyError::Read(e)) => {
                tracing::warn!(error = %e, "Failed to read registration body");
                return text_response(StatusCode::BAD_REQUEST, "Bad Request");
            }
        }
    }

    let request = RegistrationRequest::from_query(&raw);
    let outcome = service.handle(request).await;
    json_response(&outcome)
}

enum BodyError {
    TooLarge,
    Read(hyper::Error),
}

// * Collects at most `limit` bytes; a declared Content-Length over the limit fails before reading
async fn read_body(mut body: Body, limit: usize) -> Result<Vec<u8>, BodyError> {
    if body.size_hint().lower() > limit as u64 {
        return Err(BodyError::TooLarge);
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(BodyError::Read)?;
        if bytes.len() + chunk.len() > limit {
            return Err(BodyError::TooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn json_response(outcome: &RegistrationOutcome) -> Response<Body> {
    let body = match serde_json::to_vec(&outcome.response) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode registration response");
            return text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    };

    let mut resp = Response::new(Body::from(body));
    *resp.status_mut() =
        StatusCode::from_u16(outcome.http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

fn text_response(status: StatusCode, body: &'static str) -> Response<Body> {
    let mut resp = Response::new(Body::from(body));
    *resp.status_mut() = status;
    resp
}
