//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, StatusCode, Uri},
    Router,
};
use request_mirror::config::{ListenerSettings, MirrorSettings};
use request_mirror::lifecycle::Shutdown;
use request_mirror::mirror::MirrorHook;
use request_mirror::proxy::ProxyServer;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A request as seen by a mock server.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Start an axum server that records every request and answers with
/// `status` after `delay`.
pub async fn start_recording_server(
    status: StatusCode,
    delay: Duration,
    reply: &'static str,
) -> (SocketAddr, mpsc::UnboundedReceiver<Captured>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(Captured {
                    method,
                    path: uri.path().to_string(),
                    headers,
                    body,
                });
                tokio::time::sleep(delay).await;
                (status, reply)
            }
        },
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, rx)
}

/// Start an origin that answers `200 origin ok` immediately.
pub async fn start_origin() -> (SocketAddr, mpsc::UnboundedReceiver<Captured>) {
    start_recording_server(StatusCode::OK, Duration::ZERO, "origin ok").await
}

/// Start a sink that accepts connections and never answers.
#[allow(dead_code)]
pub async fn start_hanging_sink() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// An address with nothing listening on it.
#[allow(dead_code)]
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Mirror settings pointing at `sink`, everything else default.
pub fn mirror_settings(sink: SocketAddr) -> MirrorSettings {
    MirrorSettings {
        base: format!("http://{}", sink),
        path: "/mirror".to_string(),
        ..MirrorSettings::default()
    }
}

/// A running proxy host.
#[allow(dead_code)]
pub struct TestProxy {
    pub addr: SocketAddr,
    pub hook: Arc<MirrorHook>,
    pub shutdown: Shutdown,
}

impl TestProxy {
    /// Client that sends plain-HTTP requests through the proxy.
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .proxy(reqwest::Proxy::http(format!("http://{}", self.addr)).unwrap())
            .pool_max_idle_per_host(0)
            .build()
            .unwrap()
    }
}

/// Start the proxy host with the given mirror settings.
pub async fn start_proxy(settings: MirrorSettings) -> TestProxy {
    let hook = Arc::new(MirrorHook::from_settings(&settings).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = ProxyServer::new(&ListenerSettings::default(), hook.clone());
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy { addr, hook, shutdown }
}

/// Wait for the next captured request, or `None` after `wait`.
pub async fn next(rx: &mut mpsc::UnboundedReceiver<Captured>, wait: Duration) -> Option<Captured> {
    tokio::time::timeout(wait, rx.recv()).await.ok().flatten()
}
