//! Proxy engine behaviour against live origins: framing, streaming,
//! failures and forwarding headers.

mod common;

use acs_gateway::gateway::GatewayConfig;
use acs_gateway::server::GatewayServer;
use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, Request},
    http::{Method, StatusCode, header},
};
use common::*;
use http_body_util::BodyExt;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

#[tokio::test]
async fn origin_error_status_is_relayed_verbatim() {
    let (core, ui, spa) = origins_and_spa().await;
    let app = app(&GatewayServer::new(config(&core, &ui, &spa)));

    let resp = get(&app, "/api/teapot").await;
    assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(resp.headers()["x-origin-error"], "teapot");
    assert_eq!(body_string(resp).await, "short and stout");
}

#[tokio::test]
async fn redirects_are_passed_to_the_client() {
    let (core, ui, spa) = origins_and_spa().await;
    let app = app(&GatewayServer::new(config(&core, &ui, &spa)));

    let resp = get(&app, "/api/redirect").await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers()[header::LOCATION], "/api/elsewhere");
}

#[tokio::test]
async fn unreachable_origin_is_502() {
    let ui = MockOrigin::start("ui").await;
    let spa = spa_dir();
    let dead = closed_port().await;
    let cfg =
        GatewayConfig::new(format!("http://{dead}"), ui.base_url()).with_static_dir(spa.path());
    let app = app(&GatewayServer::new(cfg));

    let resp = get(&app, "/api/devices").await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(resp).await["error"]["code"], "ORIGIN_UNREACHABLE");
}

#[tokio::test]
async fn slow_origin_is_504() {
    let (core, ui, spa) = origins_and_spa().await;
    let cfg = config(&core, &ui, &spa).with_timeout_ms(200);
    let app = app(&GatewayServer::new(cfg));

    let resp = get(&app, "/api/slow").await;
    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body_json(resp).await["error"]["code"], "ORIGIN_TIMEOUT");
}

#[tokio::test]
async fn host_and_content_length_are_recomputed() {
    let (core, ui, spa) = origins_and_spa().await;
    let app = app(&GatewayServer::new(config(&core, &ui, &spa)));

    let payload = r#"{"provision":"default","tags":["olt-7"]}"#;
    let req = Request::builder()
        .method(Method::PUT)
        .uri("/api/devices/0014EF-ONU-1/tags")
        .header(header::HOST, "acs.example.net")
        .header(header::CONTENT_LENGTH, "9999")
        .header("x-request-source", "dashboard")
        .body(Body::from(payload))
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let seen = core.last();
    assert_eq!(seen.method, "PUT");
    assert_eq!(seen.headers[header::HOST], core.addr.to_string().as_str());
    assert_eq!(
        seen.headers[header::CONTENT_LENGTH],
        payload.len().to_string().as_str()
    );
    assert_eq!(&seen.body[..], payload.as_bytes());
    assert_eq!(seen.headers["x-request-source"], "dashboard");
    assert_eq!(seen.headers["x-forwarded-host"], "acs.example.net");
}

#[tokio::test]
async fn get_body_is_not_forwarded() {
    let (core, ui, spa) = origins_and_spa().await;
    let app = app(&GatewayServer::new(config(&core, &ui, &spa)));

    let req = Request::builder()
        .uri("/api/devices")
        .body(Body::from("should not travel"))
        .unwrap();
    send(&app, req).await;

    let seen = core.last();
    assert!(seen.body.is_empty());
    assert!(seen.headers.get(header::CONTENT_LENGTH).is_none());
}

#[tokio::test]
async fn oversized_body_is_413_without_origin_call() {
    let (core, ui, spa) = origins_and_spa().await;
    let cfg = config(&core, &ui, &spa).with_max_body_bytes(16);
    let app = app(&GatewayServer::new(cfg));

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/files")
        .body(Body::from(vec![b'x'; 64]))
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(core.hits(), 0);
}

#[tokio::test]
async fn forwarding_headers_carry_the_peer() {
    let (core, ui, spa) = origins_and_spa().await;
    let app = app(&GatewayServer::new(config(&core, &ui, &spa)));

    let peer: SocketAddr = "203.0.113.9:51234".parse().unwrap();
    let mut req = Request::builder()
        .uri("/ui/devices")
        .header(header::HOST, "acs.example.net")
        .header("x-forwarded-for", "198.51.100.1")
        .body(Body::empty())
        .unwrap();
    req.extensions_mut().insert(ConnectInfo(peer));
    send(&app, req).await;

    let seen = ui.last();
    assert_eq!(seen.headers["x-forwarded-for"], "198.51.100.1, 203.0.113.9");
    assert_eq!(seen.headers["x-forwarded-host"], "acs.example.net");
    assert_eq!(seen.headers["x-forwarded-proto"], "http");
}

// ─────────────────────────────────────────────────────────────────────────────
// Streaming
// ─────────────────────────────────────────────────────────────────────────────

async fn streaming_app() -> (axum::Router, tokio::sync::mpsc::Sender<Bytes>, tempfile::TempDir) {
    let (stream_addr, tx) = streaming_origin().await;
    let ui = MockOrigin::start("ui").await;
    let spa = spa_dir();
    let cfg = GatewayConfig::new(format!("http://{stream_addr}"), ui.base_url())
        .with_static_dir(spa.path());
    (app(&GatewayServer::new(cfg)), tx, spa)
}

#[tokio::test]
async fn first_chunk_arrives_before_origin_finishes() {
    let (app, tx, _spa) = streaming_app().await;

    let first = Bytes::from_static(b"event: inform\ndata: 0014EF-ONU-1\n\n");
    tx.send(first.clone()).await.unwrap();

    let resp = get(&app, "/api/stream").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/event-stream");

    let mut body = resp.into_body();
    let mut received = Vec::new();
    while received.len() < first.len() {
        let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
            .await
            .expect("first chunk was held back")
            .expect("body ended early")
            .unwrap();
        if let Ok(data) = frame.into_data() {
            received.extend_from_slice(&data);
        }
    }
    assert_eq!(received, first);

    let second = Bytes::from_static(b"event: inform\ndata: 0014EF-ONU-2\n\n");
    tx.send(second.clone()).await.unwrap();
    drop(tx);

    let rest = body.collect().await.unwrap().to_bytes();
    assert_eq!(rest, second);
}

#[tokio::test]
async fn large_multi_chunk_body_is_relayed_intact() {
    let (app, tx, _spa) = streaming_app().await;

    let chunks: Vec<Bytes> = (0..64u8)
        .map(|i| Bytes::from(vec![i; 16 * 1024]))
        .collect();
    let expected: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();

    let feeder = tokio::spawn(async move {
        for chunk in chunks {
            tx.send(chunk).await.unwrap();
        }
    });

    let resp = get(&app, "/api/stream").await;
    let body = body_bytes(resp).await;
    feeder.await.unwrap();
    assert_eq!(body.len(), expected.len());
    assert_eq!(&body[..], &expected[..]);
}

#[tokio::test]
async fn dropping_response_body_closes_origin_stream() {
    let (app, tx, _spa) = streaming_app().await;
    tx.send(Bytes::from_static(b"event: inform\ndata: 0014EF-ONU-1\n\n"))
        .await
        .unwrap();

    let resp = get(&app, "/api/stream").await;
    let mut body = resp.into_body();
    tokio::time::timeout(Duration::from_secs(5), body.frame())
        .await
        .expect("first chunk was held back")
        .expect("body ended early")
        .unwrap();
    drop(body);

    // The origin's body stream ends once the gateway lets go of the upstream
    // connection, which closes the feeding channel.
    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if tx.send(Bytes::from_static(b"data: tick\n\n")).await.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(closed.is_ok(), "origin stream stayed open after client went away");
}

// ─────────────────────────────────────────────────────────────────────────────
// Over a real socket
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn served_gateway_forwards_with_peer_address() {
    let (core, ui, spa) = origins_and_spa().await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = GatewayServer::new(config(&core, &ui, &spa));
    tokio::spawn(async move { server.serve(listener).await.unwrap() });

    let resp = reqwest::get(format!("http://{addr}/api/dashboard/metrics?window=24h"))
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&resp.bytes().await.unwrap()).unwrap();
    assert_eq!(body["uri"], "/api/dashboard/metrics?window=24h");

    let seen = core.last();
    assert_eq!(seen.headers["x-forwarded-for"], "127.0.0.1");
    assert_eq!(seen.headers["x-forwarded-host"], addr.to_string().as_str());

    let resp = reqwest::get(format!("http://{addr}/inventory/onus")).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), INDEX_HTML);
}
