//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use chaos_proxy::chaos::ChaosEngine;
use chaos_proxy::config::{ChaosConfig, ChaosDuration, ListenerConfig, Target};
use chaos_proxy::http::HttpServer;
use chaos_proxy::lifecycle::Shutdown;

/// A backend that answers every request with a JSON echo of what it saw.
pub struct MockBackend {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start a mock backend on an ephemeral port.
///
/// The response body is `{"host": ..., "target": ..., "forwarded_for": ...}`
/// and carries an `X-Backend: mock` header.
pub async fn start_mock_backend() -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let counter = counter.clone();
                    tokio::spawn(async move {
                        let head = match read_head(&mut socket).await {
                            Some(head) => head,
                            None => return,
                        };
                        counter.fetch_add(1, Ordering::SeqCst);

                        let target = head
                            .lines()
                            .next()
                            .and_then(|line| line.split_whitespace().nth(1))
                            .unwrap_or_default()
                            .to_string();
                        let body = serde_json::json!({
                            "host": header(&head, "host"),
                            "target": target,
                            "forwarded_for": header(&head, "x-forwarded-for"),
                        })
                        .to_string();

                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nX-Backend: mock\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockBackend { addr, hits }
}

/// Read until the end of the request head. Test requests carry no body.
async fn read_head(socket: &mut tokio::net::TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            return String::from_utf8(buf).ok();
        }
    }
}

fn header(head: &str, name: &str) -> Option<String> {
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_string())
    })
}

/// A running proxy plus the handles tests poke at.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub engine: Arc<ChaosEngine>,
    pub shutdown: Shutdown,
    /// Resolves once `HttpServer::run` returns.
    pub server: JoinHandle<Result<(), std::io::Error>>,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a proxy in front of `target` with the given initial configuration.
pub async fn start_proxy(target: &str, config: ChaosConfig) -> TestProxy {
    start_proxy_with_grace(target, config, ChaosDuration::from_secs(1)).await
}

/// Like [`start_proxy`], with an explicit shutdown grace period.
pub async fn start_proxy_with_grace(
    target: &str,
    config: ChaosConfig,
    shutdown_grace: ChaosDuration,
) -> TestProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let engine = Arc::new(ChaosEngine::new(config));
    let shutdown = Shutdown::new();
    let (_, config_updates) = mpsc::unbounded_channel();

    let server = HttpServer::new(
        engine.clone(),
        Target::parse(target).unwrap(),
        ListenerConfig {
            bind_address: addr,
            shutdown_grace,
        },
    );
    let server_shutdown = shutdown.subscribe();

    let server = tokio::spawn(server.run(listener, config_updates, server_shutdown));

    // Listener is already bound; give the accept loop a moment anyway.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestProxy {
        addr,
        engine,
        shutdown,
        server,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
