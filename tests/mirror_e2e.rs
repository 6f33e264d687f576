//! End-to-end mirroring through the proxy host.

use std::time::Duration;

use axum::http::{Method, StatusCode};

mod common;

const WAIT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(300);

#[tokio::test]
async fn test_matching_request_is_mirrored() {
    let (origin_addr, mut origin_rx) = common::start_origin().await;
    let (sink_addr, mut sink_rx) =
        common::start_recording_server(StatusCode::OK, Duration::ZERO, "mirrored").await;

    let mut settings = common::mirror_settings(sink_addr);
    settings.methods = "POST".to_string();
    settings.match_rule = "/orders".to_string();
    let proxy = common::start_proxy(settings).await;
    let client = proxy.client();

    let res = client
        .post(format!("http://{}/orders?id=7", origin_addr))
        .header("content-type", "application/json")
        .header("x-client", "abc")
        .body(r#"{"a":1}"#)
        .send()
        .await
        .expect("Proxy unreachable");
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "origin ok");

    let forwarded = common::next(&mut origin_rx, WAIT).await.expect("origin saw nothing");
    assert_eq!(forwarded.method, Method::POST);
    assert_eq!(forwarded.path, "/orders");
    assert_eq!(forwarded.body.as_ref(), br#"{"a":1}"#);
    let original_ids: Vec<_> = forwarded
        .headers
        .get_all("x-mirror-correlation-id")
        .iter()
        .collect();
    assert_eq!(original_ids.len(), 1, "original must carry exactly one correlation header");

    let mirrored = common::next(&mut sink_rx, WAIT).await.expect("sink saw nothing");
    assert_eq!(mirrored.method, Method::POST);
    assert_eq!(mirrored.path, "/mirror");
    assert_eq!(mirrored.body.as_ref(), br#"{"a":1}"#);
    assert_eq!(mirrored.headers["content-type"], "application/json");
    assert_eq!(mirrored.headers["x-client"], "abc");
    assert_eq!(mirrored.headers["x-mirror-correlation-id"], original_ids[0]);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_non_matching_requests_pass_through_unmirrored() {
    let (origin_addr, mut origin_rx) = common::start_origin().await;
    let (sink_addr, mut sink_rx) =
        common::start_recording_server(StatusCode::OK, Duration::ZERO, "mirrored").await;

    let mut settings = common::mirror_settings(sink_addr);
    settings.methods = "POST".to_string();
    settings.match_rule = "/orders".to_string();
    let proxy = common::start_proxy(settings).await;
    let client = proxy.client();

    // Wrong method
    let res = client
        .get(format!("http://{}/orders", origin_addr))
        .header("content-type", "application/json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    // Wrong URL
    let res = client
        .post(format!("http://{}/x", origin_addr))
        .header("content-type", "application/json")
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    // Not JSON
    let res = client
        .post(format!("http://{}/orders", origin_addr))
        .header("content-type", "text/plain")
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    for _ in 0..3 {
        let seen = common::next(&mut origin_rx, WAIT).await.expect("origin missed a request");
        assert!(!seen.headers.contains_key("x-mirror-correlation-id"));
    }
    assert!(common::next(&mut sink_rx, QUIET).await.is_none());

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_binary_and_empty_bodies_are_byte_identical() {
    let (origin_addr, _origin_rx) = common::start_origin().await;
    let (sink_addr, mut sink_rx) =
        common::start_recording_server(StatusCode::OK, Duration::ZERO, "mirrored").await;

    let mut settings = common::mirror_settings(sink_addr);
    settings.json_only = false;
    settings.async_delivery = false;
    let proxy = common::start_proxy(settings).await;
    let client = proxy.client();

    let binary: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    for body in [binary, Vec::new()] {
        let res = client
            .put(format!("http://{}/blob", origin_addr))
            .header("content-type", "application/octet-stream")
            .body(body.clone())
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);

        let mirrored = common::next(&mut sink_rx, WAIT).await.expect("sink saw nothing");
        assert_eq!(mirrored.body.as_ref(), body.as_slice());
        assert_eq!(mirrored.headers["content-type"], "application/octet-stream");
    }

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_header_injection_disabled() {
    let (origin_addr, mut origin_rx) = common::start_origin().await;
    let (sink_addr, mut sink_rx) =
        common::start_recording_server(StatusCode::OK, Duration::ZERO, "mirrored").await;

    let mut settings = common::mirror_settings(sink_addr);
    settings.add_header = false;
    let proxy = common::start_proxy(settings).await;

    let res = proxy
        .client()
        .patch(format!("http://{}/items/1", origin_addr))
        .header("content-type", "application/merge-patch+json")
        .body(r#"{"name":"x"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let forwarded = common::next(&mut origin_rx, WAIT).await.unwrap();
    let mirrored = common::next(&mut sink_rx, WAIT).await.unwrap();
    assert!(!forwarded.headers.contains_key("x-mirror-correlation-id"));
    assert!(!mirrored.headers.contains_key("x-mirror-correlation-id"));
    assert_eq!(mirrored.body.as_ref(), br#"{"name":"x"}"#);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_disabled_mirroring_is_transparent() {
    let (origin_addr, mut origin_rx) = common::start_origin().await;

    let proxy = common::start_proxy(Default::default()).await;
    assert!(!proxy.hook.is_enabled());

    let res = proxy
        .client()
        .post(format!("http://{}/orders", origin_addr))
        .header("content-type", "application/json")
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let forwarded = common::next(&mut origin_rx, WAIT).await.unwrap();
    assert!(!forwarded.headers.contains_key("x-mirror-correlation-id"));

    proxy.shutdown.trigger();
}
