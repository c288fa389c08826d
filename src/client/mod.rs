//! Client driver and request-makers
//!
//! The driver opens one root span, fans out `iterations` concurrent requests
//! per selected method, and joins them all before finishing the root span.
//! There is deliberately no concurrency limit, no retry, and no isolation
//! between workers: the first worker error aborts the whole run. That keeps
//! the demo's failure behavior easy to reason about.
//!
//! The two request-makers exercise the two propagation idioms:
//! - [`make_request`] parents its span from an explicit span handle
//! - [`make_request_with_context`] parents its span from a propagation
//!   context value passed through the call chain

use crate::config::{ClientConfig, JitterConfig};
use crate::message::RpcResponse;
use crate::trace::propagation;
use opentelemetry::Context;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{info, info_span, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Client errors. Transport and decode failures are fatal to the run.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// The request-making operations the driver can exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    MakeRequest,
    MakeRequestWithContext,
}

impl RequestMethod {
    /// Parse a comma-separated method list.
    ///
    /// Recognizes the literal names `makeRequest` and
    /// `makeRequestWithContext`; anything else is silently ignored.
    /// Duplicates collapse to one entry.
    pub fn parse_list(methods: &str) -> Vec<RequestMethod> {
        let mut selected = Vec::new();
        for method in methods.split(',') {
            let parsed = match method.trim() {
                "makeRequest" => Some(RequestMethod::MakeRequest),
                "makeRequestWithContext" => Some(RequestMethod::MakeRequestWithContext),
                _ => None,
            };
            if let Some(parsed) = parsed {
                if !selected.contains(&parsed) {
                    selected.push(parsed);
                }
            }
        }
        selected
    }
}

/// Client driver
pub struct Driver {
    config: ClientConfig,
    http: reqwest::Client,
}

impl Driver {
    /// Build the driver and its HTTP client with the configured timeout.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, http })
    }

    /// Launch `iterations` concurrent invocations of each selected method
    /// and wait for all of them.
    ///
    /// One root span parents every worker span and finishes once, after the
    /// join. The first worker error aborts the run; remaining workers are
    /// cancelled when the join set drops.
    pub async fn run(
        &self,
        iterations: usize,
        methods: &[RequestMethod],
    ) -> Result<(), ClientError> {
        let root = info_span!("client_span");
        let mut workers: JoinSet<Result<(), ClientError>> = JoinSet::new();

        if methods.contains(&RequestMethod::MakeRequest) {
            for _ in 0..iterations {
                let http = self.http.clone();
                let base_url = self.config.base_url.clone();
                let jitter = self.config.jitter;
                let parent = root.clone();
                workers
                    .spawn(async move { make_request(&http, &base_url, jitter, &parent).await });
            }
        }

        if methods.contains(&RequestMethod::MakeRequestWithContext) {
            let cx = root.context();
            for _ in 0..iterations {
                let http = self.http.clone();
                let base_url = self.config.base_url.clone();
                let jitter = self.config.jitter;
                let cx = cx.clone();
                workers.spawn(
                    async move { make_request_with_context(&http, &base_url, jitter, cx).await },
                );
            }
        }

        while let Some(joined) = workers.join_next().await {
            joined??;
        }

        info!("all workers complete");
        Ok(())
    }
}

/// Explicit-handle variant: the child span is parented directly from the
/// span handle the caller passes in. Targets `GET {base}/nocontext`.
pub async fn make_request(
    http: &reqwest::Client,
    base_url: &str,
    jitter: JitterConfig,
    parent: &Span,
) -> Result<(), ClientError> {
    let url = format!("{}/nocontext", base_url);
    let span = info_span!(
        parent: parent,
        "make_request",
        otel.kind = "client",
        http.url = %url,
        http.method = "GET",
    );

    let response = send_traced_get(http, &url, &span).await?;
    tokio::time::sleep(jitter.sample()).await;
    info!(parent: &span, response = %response.message, "request finished");
    Ok(())
}

/// Ambient-value variant: the child span is parented from a propagation
/// context carried through the call chain. Targets `GET {base}/context`.
pub async fn make_request_with_context(
    http: &reqwest::Client,
    base_url: &str,
    jitter: JitterConfig,
    cx: Context,
) -> Result<(), ClientError> {
    let url = format!("{}/context", base_url);
    let span = info_span!(
        "make_request_with_context",
        otel.kind = "client",
        http.url = %url,
        http.method = "GET",
    );
    span.set_parent(cx);

    let response = send_traced_get(http, &url, &span).await?;
    tokio::time::sleep(jitter.sample()).await;
    info!(parent: &span, response = %response.message, "request finished");
    Ok(())
}

/// Inject the span's context into the headers, issue the GET, decode the
/// JSON body. Any failure bubbles up; the driver treats it as fatal.
async fn send_traced_get(
    http: &reqwest::Client,
    url: &str,
    span: &Span,
) -> Result<RpcResponse, ClientError> {
    let mut request = http.get(url).build()?;
    propagation::inject_context(&span.context(), request.headers_mut());

    let response = http.execute(request).await?;
    let body = response.json::<RpcResponse>().await?;
    Ok(body)
}
