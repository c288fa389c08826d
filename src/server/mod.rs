//! HTTP server module
//!
//! Serves the two traced endpoints plus the Prometheus scrape endpoint.
//! Each connection is handled on its own task; the only shared state is the
//! metrics collectors, which synchronize internally.

pub mod handlers;

use crate::config::{JitterConfig, ServerConfig};
use crate::metrics::RpcMetrics;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use prometheus::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// State shared across handler invocations.
pub struct AppState {
    pub metrics: RpcMetrics,
    pub registry: Registry,
    pub jitter: JitterConfig,
}

/// HTTP server for the traced endpoints and the metrics scrape endpoint.
///
/// The registry and collectors are injected at construction; the server owns
/// no global state.
pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: ServerConfig, registry: Registry, metrics: RpcMetrics) -> Self {
        let state = Arc::new(AppState {
            metrics,
            registry,
            jitter: config.jitter,
        });
        Self {
            config,
            state,
            shutdown_tx: None,
            server_handle: None,
        }
    }

    /// Bind the listener and start serving.
    ///
    /// Returns the actual bound address (useful when binding port 0). A bind
    /// failure is a fatal startup error for the caller.
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let state = self.state.clone();
        let handle = tokio::spawn(async move {
            run_server(listener, shutdown_rx, state).await;
        });
        self.server_handle = Some(handle);

        info!("server listening on {}", addr);
        Ok(addr)
    }

    /// Shutdown the server
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
    }
}

/// Accept loop: one spawned task per connection.
async fn run_server(
    listener: TcpListener,
    mut shutdown_rx: oneshot::Receiver<()>,
    state: Arc<AppState>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                break;
            }
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let io = TokioIo::new(stream);
                        let state = state.clone();
                        tokio::spawn(async move {
                            let _ = http1::Builder::new()
                                .serve_connection(
                                    io,
                                    service_fn(move |req| {
                                        handlers::handle_request(req, state.clone())
                                    }),
                                )
                                .await;
                        });
                    }
                    Err(_) => continue,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_server() -> Server {
        let registry = Registry::new();
        let metrics = RpcMetrics::register(&registry).unwrap();
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".into(),
            jitter: JitterConfig::none(),
        };
        Server::new(config, registry, metrics)
    }

    #[tokio::test]
    async fn test_server_binds_ephemeral_port() {
        let mut server = test_server();
        let addr = server.start().await.expect("server should start");
        assert_ne!(addr.port(), 0);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_server_bind_failure_is_error() {
        let registry = Registry::new();
        let metrics = RpcMetrics::register(&registry).unwrap();
        let config = ServerConfig {
            bind_addr: "256.0.0.1:0".into(),
            jitter: JitterConfig::none(),
        };
        let mut server = Server::new(config, registry, metrics);
        assert!(server.start().await.is_err());
    }
}
