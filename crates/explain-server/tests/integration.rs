//! End-to-end tests against a real listener using `reqwest`.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::header::HeaderMap;
use serde_json::{Value, json};
use tokio::time::timeout;

use explain_server::config::ServerConfig;
use explain_server::server::ExplainServer;
use explain_store::{InMemoryBlobStore, InMemoryRecordStore};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Boot a server on an ephemeral port and return its base URL.
async fn boot_server(keepalive_ms: u64) -> (String, Arc<ExplainServer>) {
    let config = ServerConfig {
        keepalive_interval_ms: keepalive_ms,
        ..ServerConfig::default()
    };
    let server = Arc::new(ExplainServer::new(
        config,
        Arc::new(InMemoryRecordStore::new()),
        Arc::new(InMemoryBlobStore::new()),
    ));
    let (addr, _handle) = server.listen().await.unwrap();
    (format!("http://{addr}"), server)
}

/// Reads an event stream and splits it into frames.
struct SseReader {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    buf: BytesMut,
}

impl SseReader {
    async fn open(base: &str, key: &str) -> (HeaderMap, Self) {
        let resp = reqwest::get(format!("{base}/subscribe/{key}")).await.unwrap();
        assert_eq!(resp.status(), 200);
        let headers = resp.headers().clone();
        (headers, Self::from_response(resp))
    }

    fn from_response(resp: reqwest::Response) -> Self {
        Self {
            body: resp.bytes_stream().boxed(),
            buf: BytesMut::new(),
        }
    }

    /// Next raw frame including keep-alives, without the trailing blank line.
    async fn next_frame(&mut self) -> Option<String> {
        loop {
            if let Some(pos) = find_terminator(&self.buf) {
                let frame = self.buf.split_to(pos + 2);
                return Some(String::from_utf8_lossy(&frame[..pos]).into_owned());
            }
            match self.body.next().await {
                Some(Ok(chunk)) => self.buf.extend_from_slice(&chunk),
                _ => return None,
            }
        }
    }

    /// Next event payload, skipping keep-alive comments.
    async fn next_event(&mut self) -> Option<Value> {
        loop {
            let frame = self.next_frame().await?;
            if frame.starts_with(':') {
                continue;
            }
            let data = frame.strip_prefix("data: ")?;
            return Some(serde_json::from_str(data).unwrap());
        }
    }

    async fn expect_event(&mut self) -> Value {
        timeout(TIMEOUT, self.next_event())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
    }

    /// Assert no event frame arrives within `wait`.
    async fn expect_silence(&mut self, wait: Duration) {
        if let Ok(Some(event)) = timeout(wait, self.next_event()).await {
            panic!("unexpected event: {event}");
        }
    }
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

async fn send(base: &str, body: &Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/send"))
        .json(body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

async fn health(base: &str) -> Value {
    reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn subscribe_response_headers() {
    let (base, _server) = boot_server(30_000).await;
    let (headers, _reader) = SseReader::open(&base, "E1").await;
    assert_eq!(headers["content-type"], "text/event-stream");
    assert_eq!(headers["cache-control"], "no-cache");
}

#[tokio::test]
async fn fan_out_to_every_subscriber_of_key() {
    let (base, _server) = boot_server(30_000).await;
    let (_h1, mut a) = SseReader::open(&base, "E1").await;
    let (_h2, mut b) = SseReader::open(&base, "E1").await;
    let (_h3, mut other) = SseReader::open(&base, "E2").await;

    let (status, body) = send(&base, &json!({"key": "E1", "type": "image", "data": "abc"})).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"ok": true}));

    let expected = json!({"type": "image", "data": "abc"});
    assert_eq!(a.expect_event().await, expected);
    assert_eq!(b.expect_event().await, expected);
    other.expect_silence(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn send_to_unknown_key_succeeds() {
    let (base, _server) = boot_server(30_000).await;
    let (status, body) = send(&base, &json!({"key": "nobody", "type": "image"})).await;
    assert_eq!(status, 200);
    assert_eq!(body["ok"], true);
    assert_eq!(health(&base).await["channels"], 0);
}

#[tokio::test]
async fn events_arrive_in_publish_order() {
    let (base, _server) = boot_server(30_000).await;
    let (_h, mut reader) = SseReader::open(&base, "E1").await;

    for i in 0..10 {
        let _ = send(&base, &json!({"key": "E1", "type": "step", "data": i})).await;
    }
    for i in 0..10 {
        assert_eq!(reader.expect_event().await["data"], i);
    }
}

#[tokio::test]
async fn disconnect_removes_subscriber() {
    let (base, server) = boot_server(30_000).await;
    let (_headers, reader) = SseReader::open(&base, "E1").await;
    assert_eq!(server.registry().channel_len("E1"), 1);

    drop(reader);

    // The server notices the closed socket once it next writes to it.
    let cleaned = timeout(TIMEOUT, async {
        loop {
            let _ = send(&base, &json!({"key": "E1", "type": "ping"})).await;
            if health(&base).await["connections"] == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;
    assert!(cleaned.is_ok(), "subscriber was never removed");
    assert_eq!(server.registry().channel_count(), 0);
}

#[tokio::test]
async fn invalid_send_delivers_nothing() {
    let (base, _server) = boot_server(30_000).await;
    let (_h, mut reader) = SseReader::open(&base, "E1").await;

    let (status, body) = send(&base, &json!({"type": "image"})).await;
    assert_eq!(status, 400);
    assert_eq!(body["ok"], false);
    assert_eq!(body["code"], "MISSING_KEY");

    let (status, body) = send(&base, &json!({"key": "E1", "type": "  "})).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "MISSING_TYPE");

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/send"))
        .header("content-type", "application/json")
        .body("{broken")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    reader.expect_silence(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn idle_stream_gets_keepalive() {
    let (base, _server) = boot_server(100).await;
    let (_h, mut reader) = SseReader::open(&base, "E1").await;
    let frame = timeout(TIMEOUT, reader.next_frame()).await.unwrap().unwrap();
    assert_eq!(frame, ":");
}

#[tokio::test]
async fn events_alias_route_streams() {
    let (base, _server) = boot_server(30_000).await;
    let resp = reqwest::get(format!("{base}/events/E9")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let mut reader = SseReader::from_response(resp);
    let _ = send(&base, &json!({"empNo": "E9", "type": "reset"})).await;
    assert_eq!(reader.expect_event().await, json!({"type": "reset"}));
}

#[tokio::test]
async fn upload_flow_notifies_subscriber() {
    let (base, _server) = boot_server(30_000).await;
    let client = reqwest::Client::new();
    let (_h, mut reader) = SseReader::open(&base, "E1").await;

    let created: Value = client
        .post(format!("{base}/api/customer"))
        .json(&json!({"empNo": "E1", "name": "Lee Ji", "phone": "010-1111-2222"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(created["ok"], true);
    let id = created["customer"]["id"].as_u64().unwrap();

    let png: &[u8] = b"\x89PNG\r\n\x1a\nfake";
    let form = reqwest::multipart::Form::new()
        .text("customerId", id.to_string())
        .part(
            "file",
            reqwest::multipart::Part::bytes(png.to_vec()).file_name("sig.png"),
        );
    let uploaded: Value = client
        .post(format!("{base}/api/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(uploaded["ok"], true);
    assert_eq!(uploaded["filename"], "LeeJi_01011112222.png");

    let event = reader.expect_event().await;
    assert_eq!(event["type"], "upload");
    assert_eq!(event["data"]["customerId"], id);
    assert_eq!(event["data"]["filename"], "LeeJi_01011112222.png");

    let listed: Value = reqwest::get(format!("{base}/api/customer/E1"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["list"][0]["imageFile"], "LeeJi_01011112222.png");

    let image = reqwest::get(format!("{base}/api/image/LeeJi_01011112222.png"))
        .await
        .unwrap();
    assert_eq!(image.status(), 200);
    assert_eq!(image.headers()["content-type"], "image/png");
    assert_eq!(&image.bytes().await.unwrap()[..], png);
}

#[tokio::test]
async fn upload_for_unknown_customer_is_404() {
    let (base, _server) = boot_server(30_000).await;
    let form = reqwest::multipart::Form::new()
        .text("customerId", "999")
        .part("file", reqwest::multipart::Part::bytes(vec![1, 2, 3]));
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn shutdown_ends_open_streams() {
    let (base, server) = boot_server(30_000).await;
    let (_h, mut reader) = SseReader::open(&base, "E1").await;
    server.shutdown().shutdown();
    let end = timeout(TIMEOUT, reader.next_frame()).await.unwrap();
    assert!(end.is_none());
}
