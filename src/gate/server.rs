//! HTTP/1 accept loop with per-connection hijack support.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ConnectInfo;
use axum::Router;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use super::connection::ConnectionHandle;

/// Serves `router` on `listener` until `shutdown` is cancelled.
///
/// Every request gets `ConnectInfo<SocketAddr>` and a [`ConnectionHandle`]
/// in its extensions. Closing the handle drops that connection on the spot.
/// Connections already accepted are left to finish when shutdown begins.
pub async fn serve_with_hijack(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("Listening on http://{}/", addr);
    }

    loop {
        let (stream, remote_addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    // usually fd exhaustion; back off instead of spinning
                    log::warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            },
            _ = shutdown.cancelled() => {
                log::info!("Stopped accepting connections");
                break;
            }
        };

        tokio::spawn(serve_connection(stream, remote_addr, router.clone()));
    }

    Ok(())
}

async fn serve_connection(stream: TcpStream, remote_addr: SocketAddr, router: Router) {
    let kill = CancellationToken::new();
    let handle = ConnectionHandle::new(kill.clone());

    let service = tower::service_fn(move |mut req: hyper::Request<Incoming>| {
        req.extensions_mut().insert(ConnectInfo(remote_addr));
        req.extensions_mut().insert(handle.clone());
        router.clone().oneshot(req)
    });

    let connection = http1::Builder::new()
        .serve_connection(TokioIo::new(stream), TowerToHyperService::new(service));

    tokio::select! {
        result = connection => {
            if let Err(e) = result {
                log::debug!("Connection from {} ended with error: {}", remote_addr, e);
            }
        }
        _ = kill.cancelled() => {
            log::debug!("Dropped connection from {} without response", remote_addr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn spawn_server(router: Router) -> (SocketAddr, CancellationToken) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        tokio::spawn(serve_with_hijack(listener, router, shutdown.clone()));
        (addr, shutdown)
    }

    async fn roundtrip(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            path
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap_or_default();
        String::from_utf8_lossy(&response).into_owned()
    }

    #[tokio::test]
    async fn test_requests_carry_peer_address() {
        let router = Router::new().route(
            "/",
            get(|ConnectInfo(addr): ConnectInfo<SocketAddr>| async move { addr.ip().to_string() }),
        );
        let (addr, shutdown) = spawn_server(router).await;

        let response = roundtrip(addr, "/").await;
        assert!(response.starts_with("HTTP/1.1 200"), "got: {}", response);
        assert!(response.ends_with("127.0.0.1"), "got: {}", response);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_closing_handle_drops_connection_silently() {
        let router = Router::new().route(
            "/",
            get(|axum::Extension(handle): axum::Extension<ConnectionHandle>| async move {
                handle.close();
                std::future::pending::<&'static str>().await
            }),
        );
        let (addr, shutdown) = spawn_server(router).await;

        let response = tokio::time::timeout(Duration::from_secs(5), roundtrip(addr, "/"))
            .await
            .expect("connection should be closed promptly");
        assert!(response.is_empty(), "no bytes expected, got: {}", response);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_shutdown_stops_accept_loop() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let shutdown = CancellationToken::new();
        let server = tokio::spawn(serve_with_hijack(listener, Router::new(), shutdown.clone()));

        shutdown.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server should stop")
            .unwrap();
        assert!(result.is_ok());
    }
}
