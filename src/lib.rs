//! Tracelab Library
//!
//! Client/server demo of distributed trace propagation and latency metrics.
//!
//! # Overview
//!
//! - **Client driver**: opens a root span, fans out concurrent requests, and
//!   injects W3C Trace Context into outgoing headers
//! - **Server**: extracts the inbound context, continues the trace with an
//!   RPC-server child span, and records per-endpoint latency into a quantile
//!   summary and a fixed-bucket histogram
//!
//! # Example
//!
//! ```no_run
//! use prometheus::Registry;
//! use tracelab::config::ServerConfig;
//! use tracelab::metrics::RpcMetrics;
//! use tracelab::server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = Registry::new();
//!     let metrics = RpcMetrics::register(&registry)?;
//!     let mut server = Server::new(ServerConfig::default(), registry, metrics);
//!     let addr = server.start().await?;
//!     println!("listening on {}", addr);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod message;
pub mod metrics;
pub mod server;
pub mod trace;

// Re-export commonly used types
pub use client::Driver;
pub use config::{ClientConfig, ServerConfig};
pub use server::Server;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
