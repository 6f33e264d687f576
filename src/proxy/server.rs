//! Reference forward-proxy host.
//!
//! # Responsibilities
//! - Accept plain-HTTP proxy requests (absolute-form or origin-form + Host)
//! - Buffer the body so the hook and the forwarder both see the same bytes
//! - Run the mirror hook before forwarding
//! - Forward the (possibly tagged) request to its real destination
//! - Stream the origin response back to the client
//!
//! CONNECT tunnels are refused: TLS interception belongs to the external
//! proxy engine that embeds the hook.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::ListenerSettings;
use crate::mirror::descriptor::{is_hop_by_hop, RequestDescriptor};
use crate::mirror::hook::RequestHook;

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub hook: Arc<dyn RequestHook>,
    pub client: Client<HttpConnector, Body>,
    pub max_body_bytes: usize,
    pub upstream_timeout: Duration,
}

/// HTTP forward proxy hosting one request hook.
pub struct ProxyServer {
    router: Router,
}

impl ProxyServer {
    /// Create a proxy host around `hook`.
    pub fn new(settings: &ListenerSettings, hook: Arc<dyn RequestHook>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            hook,
            client,
            max_body_bytes: settings.max_body_bytes,
            upstream_timeout: Duration::from_secs(settings.upstream_timeout_secs),
        };

        let router = Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        Self { router }
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Proxy listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Proxy received shutdown signal");
            })
            .await?;

        tracing::info!("Proxy stopped");
        Ok(())
    }
}

/// Buffer, hook, forward.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    if *request.method() == Method::CONNECT {
        tracing::debug!(authority = %request.uri(), "CONNECT refused");
        return (StatusCode::NOT_IMPLEMENTED, "CONNECT tunnelling is not supported").into_response();
    }

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(uri = %parts.uri, error = %e, "Request body rejected");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let Some(mut descriptor) = RequestDescriptor::from_parts(&parts, body, "http") else {
        tracing::warn!(uri = %parts.uri, "Request has no absolute URL or Host header");
        return (StatusCode::BAD_REQUEST, "Absolute URL or Host header required").into_response();
    };

    state.hook.on_request(&mut descriptor).await;

    let (method, url, headers, body) = descriptor.into_parts();
    let uri = match Uri::from_str(&url) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Unforwardable URL");
            return (StatusCode::BAD_REQUEST, "Invalid request URL").into_response();
        }
    };

    let mut upstream = Request::builder().method(method).uri(uri);
    if let Some(out) = upstream.headers_mut() {
        for (name, value) in headers.iter() {
            if !is_hop_by_hop(name) {
                out.append(name.clone(), value.clone());
            }
        }
    }
    let upstream = match upstream.body(Body::from(body)) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(url = %url, error = %e, "Failed to build upstream request");
            return (StatusCode::BAD_REQUEST, "Invalid request").into_response();
        }
    };

    match tokio::time::timeout(state.upstream_timeout, state.client.request(upstream)).await {
        Ok(Ok(response)) => relay(response),
        Ok(Err(e)) => {
            tracing::warn!(url = %url, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
        Err(_) => {
            tracing::warn!(url = %url, "Upstream timeout");
            (StatusCode::GATEWAY_TIMEOUT, "Upstream request timed out").into_response()
        }
    }
}

/// Stream an origin response back to the client.
fn relay(response: hyper::Response<hyper::body::Incoming>) -> Response {
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(body))
}
