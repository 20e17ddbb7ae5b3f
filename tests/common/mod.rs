// tests/common/mod.rs
//! Shared fixtures: a minimal local HTTP server answering canned responses.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const FIXTURE_BODY: &str = "<html>ok</html>";

pub struct FixtureServer {
    base_url: String,
    hits: Arc<AtomicUsize>,
}

impl FixtureServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Spawn a listener that answers every request with 200 and a small HTML
/// body, counting accepted connections. The accept task lives until the test
/// binary exits.
pub async fn spawn_fixture_server() -> FixtureServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fixture server");
    let addr = listener.local_addr().expect("fixture server addr");
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    FIXTURE_BODY.len(),
                    FIXTURE_BODY
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    FixtureServer {
        base_url: format!("http://{addr}"),
        hits,
    }
}

/// A URL on a port that was bound and then released, so connections are
/// refused. Models an unreachable endpoint.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway port");
    let addr = listener.local_addr().expect("throwaway port addr");
    drop(listener);
    format!("http://{addr}/")
}
