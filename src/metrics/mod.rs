//! Metrics module
//!
//! Latency collectors for the RPC endpoints, registered into an explicitly
//! constructed registry that is passed into the server rather than held as
//! process-wide globals.

pub mod summary;

use prometheus::{HistogramOpts, HistogramVec, IntGaugeVec, Opts, Registry};
use summary::LatencySummaryVec;

/// Quantile ranks reported by the summary: median, 90th, 99th percentile.
const SUMMARY_QUANTILES: &[f64] = &[0.5, 0.9, 0.99];

/// Fixed histogram buckets, in seconds, sized for the 1-10s simulated
/// handler latency plus the nested call.
const HISTOGRAM_BUCKETS: &[f64] = &[
    0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 12.5, 15.0, 17.5, 20.0,
];

/// Per-endpoint RPC latency collectors.
///
/// Every observation lands in both aggregations: a quantile summary and a
/// fixed-bucket histogram, each labeled by `(func, endpoint)`. Clones share
/// the underlying collectors.
#[derive(Clone)]
pub struct RpcMetrics {
    summary: LatencySummaryVec,
    histogram: HistogramVec,
}

impl RpcMetrics {
    /// Create the collectors and register them, plus a build-info gauge,
    /// into the given registry.
    ///
    /// Registration happens once at startup; a duplicate registration error
    /// is fatal there.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let summary = LatencySummaryVec::new(
            "rpc_durations_summary_seconds",
            "RPC latency distributions",
            SUMMARY_QUANTILES,
            &["func", "endpoint"],
        )?;
        registry.register(Box::new(summary.clone()))?;

        let histogram = HistogramVec::new(
            HistogramOpts::new("rpc_durations_histogram_seconds", "RPC latency distributions")
                .buckets(HISTOGRAM_BUCKETS.to_vec()),
            &["func", "endpoint"],
        )?;
        registry.register(Box::new(histogram.clone()))?;

        let build_info = IntGaugeVec::new(
            Opts::new("tracelab_build_info", "Build and version information"),
            &["version"],
        )?;
        build_info.with_label_values(&[crate::VERSION]).set(1);
        registry.register(Box::new(build_info))?;

        Ok(Self { summary, histogram })
    }

    /// Record one latency observation into both collectors.
    pub fn observe(&self, func: &str, endpoint: &str, seconds: f64) {
        self.summary.observe(&[func, endpoint], seconds);
        self.histogram
            .with_label_values(&[func, endpoint])
            .observe(seconds);
    }

    /// Observation count for one label pair, read back from the summary.
    /// Used by tests to assert exactly-one-observation-per-request.
    pub fn observation_count(&self, func: &str, endpoint: &str) -> u64 {
        self.summary.sample_count(&[func, endpoint])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{Encoder, TextEncoder};

    #[test]
    fn test_register_and_observe() {
        let registry = Registry::new();
        let metrics = RpcMetrics::register(&registry).unwrap();

        metrics.observe("handle_nocontext", "/nocontext", 1.5);
        metrics.observe("handle_nocontext", "/nocontext", 2.5);

        assert_eq!(metrics.observation_count("handle_nocontext", "/nocontext"), 2);
        assert_eq!(metrics.observation_count("handle_context", "/context"), 0);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = Registry::new();
        let _metrics = RpcMetrics::register(&registry).unwrap();
        assert!(RpcMetrics::register(&registry).is_err());
    }

    #[test]
    fn test_exposition_contains_metric_names() {
        let registry = Registry::new();
        let metrics = RpcMetrics::register(&registry).unwrap();
        metrics.observe("handle_context", "/context", 0.2);

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .unwrap();
        let body = String::from_utf8(buffer).unwrap();

        assert!(body.contains("rpc_durations_summary_seconds"));
        assert!(body.contains("rpc_durations_histogram_seconds"));
        assert!(body.contains("tracelab_build_info"));
        assert!(body.contains("handle_context"));
        assert!(body.contains("/context"));
    }

    #[test]
    fn test_observation_lands_in_both_collectors() {
        let registry = Registry::new();
        let metrics = RpcMetrics::register(&registry).unwrap();
        metrics.observe("f", "/e", 0.3);

        let families = registry.gather();
        let summary = families
            .iter()
            .find(|f| f.name() == "rpc_durations_summary_seconds")
            .unwrap();
        let histogram = families
            .iter()
            .find(|f| f.name() == "rpc_durations_histogram_seconds")
            .unwrap();

        assert_eq!(summary.metric[0].summary.sample_count(), 1);
        assert_eq!(histogram.metric[0].histogram.sample_count(), 1);
    }
}
