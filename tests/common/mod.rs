//! Shared test helpers

use prometheus::Registry;
use std::net::SocketAddr;
use std::sync::Once;
use tracelab::config::{JitterConfig, ServerConfig};
use tracelab::metrics::RpcMetrics;
use tracelab::server::Server;

static INIT: Once = Once::new();

/// Install a global subscriber with an OpenTelemetry layer so spans created
/// in tests carry valid, propagatable contexts. Safe to call repeatedly.
#[allow(dead_code)]
pub fn init_test_telemetry() {
    INIT.call_once(|| {
        use opentelemetry::trace::TracerProvider as _;
        use tracing_subscriber::layer::SubscriberExt;

        let provider = opentelemetry_sdk::trace::TracerProvider::builder().build();
        let tracer = provider.tracer("tracelab-tests");
        let subscriber = tracing_subscriber::registry()
            .with(tracing_opentelemetry::layer().with_tracer(tracer));
        tracing::subscriber::set_global_default(subscriber)
            .expect("test subscriber should install once");

        // Keep the provider alive for the whole test process.
        std::mem::forget(provider);
    });
}

/// Start a server with zero jitter on an ephemeral port.
///
/// Returns a metrics handle sharing the server's collectors, so tests can
/// assert observation counts directly.
#[allow(dead_code)]
pub async fn spawn_server() -> (Server, SocketAddr, RpcMetrics) {
    let registry = Registry::new();
    let metrics = RpcMetrics::register(&registry).expect("metrics should register");
    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".into(),
        jitter: JitterConfig::none(),
    };
    let mut server = Server::new(config, registry, metrics.clone());
    let addr = server.start().await.expect("server should start");
    (server, addr, metrics)
}

/// A syntactically valid traceparent for hand-built requests.
#[allow(dead_code)]
pub const VALID_TRACEPARENT: &str = "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01";
