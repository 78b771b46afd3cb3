//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, Uri};
use axum::response::IntoResponse;
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use freeload_gateway::aggregate::build_client;
use freeload_gateway::config::{GatewayConfig, OriginConfig};
use freeload_gateway::{HttpServer, Shutdown};

/// Serve a router on an ephemeral port.
pub async fn start_origin(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    addr
}

/// Origin that answers every request with its path as `text/plain`.
pub async fn start_path_echo_origin() -> SocketAddr {
    start_origin(Router::new().fallback(|uri: Uri| async move { uri.path().to_string() })).await
}

/// Origin whose handler is called with the 0-based request count.
pub async fn start_programmable_origin<F, Fut, R>(f: F) -> SocketAddr
where
    F: Fn(usize, Uri) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + 'static,
{
    let calls = Arc::new(AtomicUsize::new(0));
    start_origin(Router::new().fallback(move |uri: Uri| {
        let call = calls.fetch_add(1, Ordering::SeqCst);
        f(call, uri)
    }))
    .await
}

/// Origin that echoes the path with `Cache-Control: max-age=10`, answering
/// the first request immediately and every later one after `delay`.
pub async fn start_slow_after_first_origin(delay: Duration) -> SocketAddr {
    start_programmable_origin(move |call, uri| async move {
        if call > 0 {
            tokio::time::sleep(delay).await;
        }
        ([(header::CACHE_CONTROL, "max-age=10")], uri.path().to_string())
    })
    .await
}

/// Raw origin that promises `Content-Length: 100` with `Cache-Control:
/// max-age=5`, sends 5 body bytes and closes the connection.
pub async fn start_truncated_body_origin() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\n\
                          Content-Type: text/plain\r\n\
                          Cache-Control: max-age=5\r\n\
                          Content-Length: 100\r\n\r\n\
                          short",
                    )
                    .await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// A port with nothing listening on it.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Client that sends every origin request through `proxy`, so any host name
/// in a URL reaches the mock origin.
pub fn proxied_client(proxy: SocketAddr) -> reqwest::Client {
    build_client(&OriginConfig {
        proxy_url: Some(format!("http://{proxy}")),
        ..OriginConfig::default()
    })
    .unwrap()
}

/// Gateway configuration fetching through the mock origin.
pub fn gateway_config(origin: SocketAddr, timeout: Duration) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.origin.proxy_url = Some(format!("http://{origin}"));
    config.origin.timeout_ms = timeout.as_millis() as u64;
    config
}

/// Start the gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Client for talking to the gateway itself.
pub fn direct_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
