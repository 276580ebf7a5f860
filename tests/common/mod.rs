// * In-process stand-in for the scrape engine's control endpoint

#![allow(dead_code)]

use hyper::{Body, Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

/// Records every request as (method, path) and answers with a fixed status
pub struct StubEngine {
    addr: SocketAddr,
    calls: Arc<Mutex<Vec<(String, String)>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl StubEngine {
    pub fn start(status: u16) -> Self {
        Self::start_with_delay(status, Duration::ZERO)
    }

    pub fn start_with_delay(status: u16, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = calls.clone();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let make_svc = hyper::service::make_service_fn(move |_conn| {
            let recorded = recorded.clone();
            async move {
                Ok::<_, Infallible>(hyper::service::service_fn(move |req: Request<Body>| {
                    let recorded = recorded.clone();
                    async move {
                        recorded
                            .lock()
                            .unwrap()
                            .push((req.method().to_string(), req.uri().path().to_string()));
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        let mut resp = Response::new(Body::empty());
                        *resp.status_mut() = StatusCode::from_u16(status).unwrap();
                        Ok::<_, Infallible>(resp)
                    }
                }))
            }
        });

        let server = hyper::Server::from_tcp(listener)
            .unwrap()
            .serve(make_svc)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
        tokio::spawn(server);

        Self {
            addr,
            calls,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Drop for StubEngine {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A loopback address with nothing listening on it
pub fn closed_local_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
