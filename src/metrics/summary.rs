//! Quantile summary collector
//!
//! The `prometheus` crate ships counters, gauges, and histograms but no
//! Summary metric, so the quantile summary is implemented as a custom
//! [`Collector`]. Observations are retained per label set and exact
//! quantiles are computed at scrape time.
//!
//! Samples accumulate for the process lifetime and are never reset. That is
//! the intended behavior for this demo workload; a long-running service
//! would swap in a windowed estimator.

use parking_lot::RwLock;
use prometheus::core::{Collector, Desc};
use prometheus::proto;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// One label combination's accumulated observations.
#[derive(Default)]
struct Series {
    count: u64,
    sum: f64,
    samples: Vec<f64>,
}

struct Inner {
    desc: Desc,
    quantiles: Vec<f64>,
    series: RwLock<BTreeMap<Vec<String>, Series>>,
}

/// A labeled summary metric reporting exact quantiles.
///
/// Cheap to clone; all clones share the same sample store, mirroring how the
/// `prometheus` crate's own metric vecs behave.
#[derive(Clone)]
pub struct LatencySummaryVec {
    inner: Arc<Inner>,
}

impl LatencySummaryVec {
    /// Create a new summary vec.
    ///
    /// `quantiles` are the quantile ranks reported at scrape time, each in
    /// `(0, 1)`. `label_names` define the variable labels, in order.
    pub fn new(
        name: &str,
        help: &str,
        quantiles: &[f64],
        label_names: &[&str],
    ) -> prometheus::Result<Self> {
        let desc = Desc::new(
            name.to_string(),
            help.to_string(),
            label_names.iter().map(|s| s.to_string()).collect(),
            HashMap::new(),
        )?;

        Ok(Self {
            inner: Arc::new(Inner {
                desc,
                quantiles: quantiles.to_vec(),
                series: RwLock::new(BTreeMap::new()),
            }),
        })
    }

    /// Record one observation for the given label values.
    ///
    /// The number of label values must match the label names the vec was
    /// created with.
    pub fn observe(&self, label_values: &[&str], value: f64) {
        debug_assert_eq!(label_values.len(), self.inner.desc.variable_labels.len());

        let key: Vec<String> = label_values.iter().map(|s| s.to_string()).collect();
        let mut series = self.inner.series.write();
        let entry = series.entry(key).or_default();
        entry.count += 1;
        entry.sum += value;
        entry.samples.push(value);
    }

    /// Total observation count for one label combination.
    pub fn sample_count(&self, label_values: &[&str]) -> u64 {
        let key: Vec<String> = label_values.iter().map(|s| s.to_string()).collect();
        self.inner
            .series
            .read()
            .get(&key)
            .map(|s| s.count)
            .unwrap_or(0)
    }
}

/// Nearest-rank quantile of a sorted sample set. NaN when empty, matching
/// what Prometheus summaries report before the first observation.
fn quantile_of(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = (q * sorted.len() as f64).ceil() as usize;
    sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
}

impl Collector for LatencySummaryVec {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.inner.desc]
    }

    fn collect(&self) -> Vec<proto::MetricFamily> {
        let mut family = proto::MetricFamily::default();
        family.set_name(self.inner.desc.fq_name.clone());
        family.set_help(self.inner.desc.help.clone());
        family.set_field_type(proto::MetricType::SUMMARY);

        let series = self.inner.series.read();
        for (label_values, data) in series.iter() {
            let mut metric = proto::Metric::default();

            for (name, value) in self.inner.desc.variable_labels.iter().zip(label_values) {
                let mut pair = proto::LabelPair::default();
                pair.set_name(name.clone());
                pair.set_value(value.clone());
                metric.label.push(pair);
            }

            let mut sorted = data.samples.clone();
            sorted.sort_by(f64::total_cmp);

            let mut summary = proto::Summary::default();
            summary.set_sample_count(data.count);
            summary.set_sample_sum(data.sum);
            for &q in &self.inner.quantiles {
                let mut quantile = proto::Quantile::default();
                quantile.set_quantile(q);
                quantile.set_value(quantile_of(&sorted, q));
                summary.quantile.push(quantile);
            }
            metric.set_summary(summary);

            family.metric.push(metric);
        }

        vec![family]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_vec() -> LatencySummaryVec {
        LatencySummaryVec::new(
            "test_summary_seconds",
            "test summary",
            &[0.5, 0.9, 0.99],
            &["func", "endpoint"],
        )
        .unwrap()
    }

    #[test]
    fn test_observe_accumulates_count_and_sum() {
        let vec = new_vec();
        vec.observe(&["f", "/e"], 1.0);
        vec.observe(&["f", "/e"], 2.0);
        vec.observe(&["other", "/e"], 5.0);

        assert_eq!(vec.sample_count(&["f", "/e"]), 2);
        assert_eq!(vec.sample_count(&["other", "/e"]), 1);
        assert_eq!(vec.sample_count(&["absent", "/e"]), 0);
    }

    #[test]
    fn test_collect_reports_quantiles() {
        let vec = new_vec();
        for i in 1..=100 {
            vec.observe(&["f", "/e"], i as f64);
        }

        let families = vec.collect();
        assert_eq!(families.len(), 1);
        let family = &families[0];
        assert_eq!(family.name(), "test_summary_seconds");
        assert_eq!(family.type_(), proto::MetricType::SUMMARY);

        let metric = &family.metric[0];
        let summary = &metric.summary;
        assert_eq!(summary.sample_count(), 100);
        assert!((summary.sample_sum() - 5050.0).abs() < 1e-9);

        let quantiles = &summary.quantile;
        assert_eq!(quantiles[0].value(), 50.0);
        assert_eq!(quantiles[1].value(), 90.0);
        assert_eq!(quantiles[2].value(), 99.0);
    }

    #[test]
    fn test_collect_labels_in_declared_order() {
        let vec = new_vec();
        vec.observe(&["handler", "/nocontext"], 0.5);

        let families = vec.collect();
        let labels = &families[0].metric[0].label;
        assert_eq!(labels[0].name(), "func");
        assert_eq!(labels[0].value(), "handler");
        assert_eq!(labels[1].name(), "endpoint");
        assert_eq!(labels[1].value(), "/nocontext");
    }

    #[test]
    fn test_empty_series_quantile_is_nan() {
        assert!(quantile_of(&[], 0.5).is_nan());
    }

    #[test]
    fn test_single_sample_quantiles() {
        let sorted = [3.0];
        assert_eq!(quantile_of(&sorted, 0.5), 3.0);
        assert_eq!(quantile_of(&sorted, 0.99), 3.0);
    }

    #[test]
    fn test_clones_share_sample_store() {
        let vec = new_vec();
        let clone = vec.clone();
        clone.observe(&["f", "/e"], 1.0);
        assert_eq!(vec.sample_count(&["f", "/e"]), 1);
    }
}
