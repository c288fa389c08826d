//! W3C Trace Context propagation over HTTP headers
//!
//! Injects a span's context into outgoing request headers on the client and
//! extracts it from inbound headers on the server, using the
//! [W3C Trace Context](https://www.w3.org/TR/trace-context/) format
//! (`traceparent` plus optional `tracestate`).
//!
//! Both directions go through the same `TraceContextPropagator`, so whatever
//! [`inject_context`] writes is exactly what [`extract_context`] consumes.
//!
//! # Example
//!
//! ```
//! use hyper::header::HeaderMap;
//! use opentelemetry::trace::{
//!     SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState,
//! };
//! use opentelemetry::Context;
//! use tracelab::trace::propagation::{extract_context, inject_context};
//!
//! let span_context = SpanContext::new(
//!     TraceId::from_hex("0af7651916cd43dd8448eb211c80319c").unwrap(),
//!     SpanId::from_hex("b7ad6b7169203331").unwrap(),
//!     TraceFlags::SAMPLED,
//!     false,
//!     TraceState::default(),
//! );
//! let cx = Context::new().with_remote_span_context(span_context);
//!
//! let mut headers = HeaderMap::new();
//! inject_context(&cx, &mut headers);
//! assert!(headers.contains_key("traceparent"));
//! assert!(extract_context(&headers).is_ok());
//! ```

use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::TraceContextExt;
use opentelemetry::Context;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use thiserror::Error;

/// Propagation errors
#[derive(Error, Debug)]
pub enum PropagationError {
    #[error("no valid trace context in request headers")]
    MissingContext,
}

/// Injector writing propagation fields into an HTTP header map
struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            self.0.insert(name, value);
        }
    }
}

/// Extractor reading propagation fields from an HTTP header map
struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Inject a trace context into outgoing request headers
///
/// Writes the `traceparent` header (and `tracestate` when the context
/// carries one). A context without an active span writes nothing.
pub fn inject_context(cx: &Context, headers: &mut HeaderMap) {
    TraceContextPropagator::new().inject_context(cx, &mut HeaderInjector(headers));
}

/// Extract a trace context from inbound request headers
///
/// Returns an error when the `traceparent` header is absent or malformed.
/// Callers treat that as a handled per-request condition, not a crash.
pub fn extract_context(headers: &HeaderMap) -> Result<Context, PropagationError> {
    let cx = TraceContextPropagator::new().extract(&HeaderExtractor(headers));
    if cx.span().span_context().is_valid() {
        Ok(cx)
    } else {
        Err(PropagationError::MissingContext)
    }
}
