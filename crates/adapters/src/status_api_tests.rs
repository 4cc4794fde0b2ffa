// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

fn request() -> StatusRequest {
    StatusRequest {
        owner: "acme".to_string(),
        repo: "docs".to_string(),
        commit_sha: "4f2c1a9e".to_string(),
        token: "secret-token".to_string(),
        body: StatusBody {
            state: StatusState::Success,
            description: "Content fetch completed".to_string(),
            context: "docsync/fetch".to_string(),
            target_url: None,
        },
    }
}

/// Serve exactly one HTTP request with a canned response and hand back the
/// raw request text.
async fn serve_once(response: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|l| {
                        let lower = l.to_ascii_lowercase();
                        lower.strip_prefix("content-length:").map(|v| v.trim().parse::<usize>().unwrap())
                    })
                    .unwrap_or(0);
                if raw.len() >= head_end + 4 + content_length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        let _ = tx.send(String::from_utf8_lossy(&raw).to_string());
    });
    (format!("http://{addr}"), rx)
}

#[tokio::test]
async fn posts_json_to_statuses_endpoint_with_auth() {
    let (base, rx) = serve_once(
        "HTTP/1.1 201 Created\r\ncontent-type: application/json\r\ncontent-length: 26\r\nconnection: close\r\n\r\n{\"id\":7,\"state\":\"success\"}",
    )
    .await;
    let api = ReqwestStatusApi::new(format!("{base}/")).unwrap();

    let response = api.post_status(&request()).await.unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(response.body, r#"{"id":7,"state":"success"}"#);

    let raw = rx.await.unwrap();
    let lower = raw.to_ascii_lowercase();
    assert!(raw.starts_with("POST /repos/acme/docs/statuses/4f2c1a9e HTTP/1.1"), "{raw}");
    assert!(lower.contains("authorization: bearer secret-token"), "{raw}");
    assert!(lower.contains("x-github-api-version: 2022-11-28"), "{raw}");
    assert!(raw.contains(r#""state":"success""#), "{raw}");
    assert!(raw.contains(r#""context":"docsync/fetch""#), "{raw}");
    assert!(!raw.contains("target_url"), "{raw}");
}

#[tokio::test]
async fn surfaces_rate_limit_header() {
    let (base, _rx) = serve_once(
        "HTTP/1.1 403 Forbidden\r\nx-ratelimit-remaining: 0\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}",
    )
    .await;
    let api = ReqwestStatusApi::new(base).unwrap();
    let response = api.post_status(&request()).await.unwrap();
    assert_eq!(response.status, 403);
    assert_eq!(response.rate_limit_remaining, Some(0));
}

#[tokio::test]
async fn connection_refused_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let api = ReqwestStatusApi::new(format!("http://{addr}")).unwrap();
    assert!(matches!(api.post_status(&request()).await, Err(TransportError::Request(_))));
}

#[test]
fn debug_output_omits_token() {
    let debug = format!("{:?}", request());
    assert!(!debug.contains("secret-token"), "{debug}");
}

#[tokio::test]
async fn fake_replays_script_then_defaults_to_created() {
    let api = FakeStatusApi::new();
    api.respond(503, "unavailable").fail_network("reset");

    assert_eq!(api.post_status(&request()).await.unwrap().status, 503);
    assert!(api.post_status(&request()).await.is_err());
    assert_eq!(api.post_status(&request()).await.unwrap().status, 201);
    assert_eq!(api.call_count(), 3);
}
