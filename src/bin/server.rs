//! Tracelab server
//!
//! Serves the two traced endpoints and the Prometheus scrape endpoint.
//! Startup errors (config, telemetry, metric registration, bind) are fatal.

use clap::Parser;
use prometheus::Registry;
use tracelab::config::{ServerConfig, TracerConfig};
use tracelab::metrics::RpcMetrics;
use tracelab::server::Server;
use tracelab::trace::init_telemetry;
use tracing::info;

/// Tracelab server - traced endpoints with latency metrics
#[derive(Parser, Debug)]
#[command(name = "tracelab-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bind address, overriding TRACELAB_BIND_ADDR
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let tracer_config = TracerConfig::from_env("tracelab-server")?;
    let _telemetry = init_telemetry(&tracer_config)?;

    info!("Starting tracelab server v{}", tracelab::VERSION);

    let mut config = ServerConfig::from_env()?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    let registry = Registry::new();
    let metrics = RpcMetrics::register(&registry)?;

    let mut server = Server::new(config, registry, metrics);
    let addr = server.start().await?;
    info!("serving /nocontext, /context and /metrics on {}", addr);

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.shutdown().await;

    Ok(())
}
