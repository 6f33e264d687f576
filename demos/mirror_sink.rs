//! A toy mirror sink: logs every mirrored request it receives.
//!
//! ```text
//! cargo run --example mirror_sink
//! MIRROR_BASE=http://127.0.0.1:9000 MIRROR_PATH=/mirror cargo run
//! ```

use axum::{body::Bytes, http::HeaderMap, routing::post, Router};
use std::net::SocketAddr;

async fn receive(headers: HeaderMap, body: Bytes) -> &'static str {
    let correlation = headers
        .get("x-mirror-correlation-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    println!(
        "mirror received: correlation={} content-type={} bytes={} body={}",
        correlation,
        content_type,
        body.len(),
        String::from_utf8_lossy(&body)
    );
    "ok"
}

#[tokio::main]
async fn main() {
    let app = Router::new()
        .route("/", post(receive))
        .route("/{*path}", post(receive));

    let addr = SocketAddr::from(([127, 0, 0, 1], 9000));
    println!("Mirror sink listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
