//! Request handlers
//!
//! Both traced endpoints follow the same shape: extract the inbound trace
//! context (a missing or garbled `traceparent` is a handled 500, not a
//! crash), continue the trace with an RPC-server child span, sleep a random
//! interval simulating processing cost, and answer with a fixed JSON body.
//! The `/context` variant additionally runs one nested internal call before
//! responding.
//!
//! Latency is recorded into both collectors for every request, error paths
//! included: the timing wrapper observes after the handler future resolves,
//! whatever the outcome.

use crate::message::{
    RpcResponse, INTERNAL_ERROR_MESSAGE, NO_CONTEXT_MESSAGE, WITH_CONTEXT_MESSAGE,
};
use crate::server::AppState;
use crate::trace::propagation;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use opentelemetry::Context;
use prometheus::{Encoder, TextEncoder};
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info_span, warn};
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Route one request.
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/nocontext") => {
            timed(&state, "handle_nocontext", "/nocontext", handle_nocontext(&req, &state)).await
        }
        (&Method::GET, "/context") => {
            timed(&state, "handle_context", "/context", handle_context(&req, &state)).await
        }
        (&Method::GET, "/metrics") => metrics_handler(&state),
        _ => not_found_handler(),
    };
    Ok(response)
}

/// Run a handler and record its wall-clock latency into both collectors,
/// labeled `(func, endpoint)`. Runs on every path, error responses included.
async fn timed<F>(state: &AppState, func: &str, endpoint: &str, handler: F) -> Response<Full<Bytes>>
where
    F: Future<Output = Response<Full<Bytes>>>,
{
    let start = Instant::now();
    let response = handler.await;
    state
        .metrics
        .observe(func, endpoint, start.elapsed().as_secs_f64());
    response
}

/// Handle `GET /nocontext`.
async fn handle_nocontext(req: &Request<Incoming>, state: &AppState) -> Response<Full<Bytes>> {
    let cx = match propagation::extract_context(req.headers()) {
        Ok(cx) => cx,
        Err(e) => {
            warn!(error = %e, endpoint = "/nocontext", "rejecting request");
            return internal_error_handler();
        }
    };

    let span = info_span!(
        "server_span",
        otel.kind = "server",
        http.method = "GET",
        http.target = "/nocontext",
    );
    span.set_parent(cx);

    tokio::time::sleep(state.jitter.sample()).await;

    json_handler(&RpcResponse::new(NO_CONTEXT_MESSAGE))
    // span drops here, finishing it
}

/// Handle `GET /context`.
///
/// Same extraction contract as `/nocontext`, plus one nested internal call
/// carrying the span's context before the simulated processing sleep. The
/// recorded latency covers the nested call as well.
async fn handle_context(req: &Request<Incoming>, state: &AppState) -> Response<Full<Bytes>> {
    let cx = match propagation::extract_context(req.headers()) {
        Ok(cx) => cx,
        Err(e) => {
            warn!(error = %e, endpoint = "/context", "rejecting request");
            return internal_error_handler();
        }
    };

    let span = info_span!(
        "server_span_with_context",
        otel.kind = "server",
        http.method = "GET",
        http.target = "/context",
    );
    span.set_parent(cx);

    nested_call(span.context(), state).await;

    tokio::time::sleep(state.jitter.sample()).await;

    json_handler(&RpcResponse::new(WITH_CONTEXT_MESSAGE))
}

/// One level of internal call depth: a child span parented from the context
/// value passed in, around a simulated-work sleep. Cannot fail.
async fn nested_call(cx: Context, state: &AppState) {
    let span = info_span!("nested_call");
    span.set_parent(cx);
    tokio::time::sleep(state.jitter.sample()).await;
}

/// Handle `GET /metrics`: text exposition of the injected registry.
fn metrics_handler(state: &AppState) -> Response<Full<Bytes>> {
    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();
    let mut buffer = Vec::new();

    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(Full::new(Bytes::from("Failed to encode metrics")))
            .unwrap();
    }

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", encoder.format_type())
        .body(Full::new(Bytes::from(buffer)))
        .unwrap()
}

/// 200 with a JSON body, or 500 when serialization fails.
fn json_handler(body: &RpcResponse) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(bytes)))
            .unwrap(),
        Err(e) => {
            error!(error = %e, "failed to serialize response body");
            internal_error_handler()
        }
    }
}

/// 500 with the fixed plain-text error body.
fn internal_error_handler() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from(INTERNAL_ERROR_MESSAGE)))
        .unwrap()
}

/// Handle unknown endpoints
fn not_found_handler() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(Full::new(Bytes::from("Not Found")))
        .unwrap()
}
