//! Distributed tracing module
//!
//! Telemetry lifecycle management and W3C Trace Context propagation over
//! HTTP headers. Spans are created with the `tracing` crate and bridged to
//! OpenTelemetry through `tracing-opentelemetry`, so the same span handles
//! both console logging and trace-context propagation.

pub mod init;
pub mod propagation;

pub use init::{init_telemetry, TelemetryError, TelemetryGuard};
pub use propagation::{extract_context, inject_context, PropagationError};
