//! Shared test helpers for uiaroute-core integration tests.
//!
//! Provides a programmable mock of the device's HTTP server and helpers that
//! wire a [`UiaRouter`] to it through the real [`HttpTransport`].

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use uiaroute_core::router::UiaRouter;
use uiaroute_core::transport::HttpTransport;

// ---------------------------------------------------------------------------
// Programmable mock server
// ---------------------------------------------------------------------------

/// Describes how the mock server answers a single request.
pub enum MockBehavior {
    /// Reply `200` with the given body.
    Respond(String),
    /// Reply with an explicit status code and body.
    Status(u16, String),
    /// Wait, then reply `200` with the given body.
    Delay(Duration, String),
    /// Read the request and close the connection without replying.
    Drop,
}

impl MockBehavior {
    /// Reply with a one-element UIA result carrying `value`.
    pub fn success(value: Value) -> Self {
        MockBehavior::Respond(
            serde_json::json!([{ "status": "success", "value": value }]).to_string(),
        )
    }

    /// Reply with a one-element UIA result reporting an engine error.
    pub fn engine_error(value: Value) -> Self {
        MockBehavior::Respond(
            serde_json::json!([{ "status": "error", "value": value }]).to_string(),
        )
    }
}

/// Handle to a running mock server.
pub struct MockServer {
    /// Address the server listens on.
    pub addr: SocketAddr,
    /// Request bodies received, in order.
    pub requests: Arc<Mutex<Vec<Value>>>,
}

impl MockServer {
    /// The server's base URL.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// The `command` field of every request received so far.
    pub fn commands(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.get("command").and_then(Value::as_str).map(str::to_string))
            .collect()
    }
}

/// Read one HTTP request from `stream` and return its JSON body.
async fn read_request(stream: &mut TcpStream) -> Option<Value> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).to_string();
        let Some(idx) = text.find("\r\n\r\n") else {
            continue;
        };
        let length = text[..idx]
            .lines()
            .find_map(|line| {
                line.to_ascii_lowercase()
                    .strip_prefix("content-length:")
                    .and_then(|v| v.trim().parse::<usize>().ok())
            })
            .unwrap_or(0);
        let body_start = idx + 4;
        if buf.len() >= body_start + length {
            return serde_json::from_slice(&buf[body_start..body_start + length]).ok();
        }
    }
}

async fn write_response(stream: &mut TcpStream, status: u16, body: &str) {
    let response = format!(
        "HTTP/1.1 {status} Mock\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.flush().await;
}

/// Start a mock device server that handles one request per behavior, each on
/// its own connection, then stops listening.
pub async fn mock_server(behaviors: Vec<MockBehavior>) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();

    tokio::spawn(async move {
        for behavior in behaviors {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            if let Some(body) = read_request(&mut stream).await {
                recorded.lock().unwrap().push(body);
            }

            match behavior {
                MockBehavior::Respond(body) => write_response(&mut stream, 200, &body).await,
                MockBehavior::Status(status, body) => {
                    write_response(&mut stream, status, &body).await
                }
                MockBehavior::Delay(duration, body) => {
                    tokio::time::sleep(duration).await;
                    write_response(&mut stream, 200, &body).await;
                }
                MockBehavior::Drop => drop(stream),
            }
        }
    });

    MockServer { addr, requests }
}

/// Build a router that posts to `server` with the given request timeout.
pub fn router_for(server: &MockServer, timeout: Duration) -> UiaRouter {
    let transport = HttpTransport::new(server.url(), timeout).unwrap();
    UiaRouter::new(Arc::new(transport))
}
