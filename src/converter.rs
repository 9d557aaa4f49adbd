//! Snapshot to time series conversion.
//!
//! Remote write carries only scalar samples, so composite metric types are
//! decomposed:
//!
//! | Kind | Points |
//! |------|--------|
//! | Counter, Gauge | one point named after the family |
//! | Histogram | `<name>_sum`, `<name>_count`, one `<name>_bucket` per bucket with `le` |
//! | Summary | `<name>_sum`, `<name>_count`, one `<name>` per quantile with `quantile` |
//!
//! Every point's labels are the metric's own labels followed by the injected
//! `le`/`quantile` label (if any) and then `__name__`. Injected labels take
//! precedence: a source label with a reserved name is dropped.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::label::{BUCKET_LABEL, LabelPair, METRIC_NAME_LABEL, QUANTILE_LABEL, format_float};
use crate::series::{ConversionResult, TimeSeriesPoint};
use crate::snapshot::{Histogram, Metric, MetricFamily, MetricKind, Snapshot, Summary};

const SUM_SUFFIX: &str = "_sum";
const COUNT_SUFFIX: &str = "_count";
const BUCKET_SUFFIX: &str = "_bucket";

/// How histograms and summaries are turned into points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionPolicy {
    /// `_sum`, `_count` and one point per bucket or quantile
    #[default]
    Decompose,
    /// One point per metric carrying only the sample sum; buckets and
    /// quantiles are discarded
    SumOnly,
}

/// Converts metric snapshots into remote-write points.
///
/// Conversion is pure: it reads the snapshot and returns new values, so one
/// converter can be shared across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Converter {
    policy: ExpansionPolicy,
}

impl Converter {
    /// Create a converter using [`ExpansionPolicy::Decompose`]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: ExpansionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ExpansionPolicy {
        self.policy
    }

    /// Convert a snapshot into points grouped by family name
    pub fn convert_snapshot(&self, snapshot: &Snapshot) -> ConversionResult {
        self.convert(snapshot.families())
    }

    /// Convert metric families into points grouped by family name.
    ///
    /// Families with no metrics still get an (empty) entry. Metrics with no
    /// recognised payload produce no points.
    pub fn convert(&self, families: &[MetricFamily]) -> ConversionResult {
        let mut result = ConversionResult::new();

        for family in families {
            let mut points = Vec::with_capacity(family.metrics.len());
            for metric in &family.metrics {
                self.convert_metric(&family.name, metric, &mut points);
            }

            debug!(
                "Converted family '{}': {} metrics into {} points",
                family.name,
                family.metrics.len(),
                points.len()
            );
            result.extend_family(&family.name, points);
        }

        result
    }

    fn convert_metric(&self, family_name: &str, metric: &Metric, out: &mut Vec<TimeSeriesPoint>) {
        let Some(kind) = metric.kind() else {
            debug!(
                "Skipping metric of family '{}' with no recognised payload",
                family_name
            );
            return;
        };

        let timestamp = to_timestamp(metric.timestamp_ms);

        match (self.policy, kind) {
            (_, MetricKind::Counter(counter)) => {
                let base = base_labels(family_name, metric, None);
                out.push(point(&base, None, family_name.to_string(), timestamp, counter.value));
            }
            (_, MetricKind::Gauge(gauge)) => {
                let base = base_labels(family_name, metric, None);
                out.push(point(&base, None, family_name.to_string(), timestamp, gauge.value));
            }
            (ExpansionPolicy::SumOnly, MetricKind::Histogram(Histogram { sample_sum, .. }))
            | (ExpansionPolicy::SumOnly, MetricKind::Summary(Summary { sample_sum, .. })) => {
                let base = base_labels(family_name, metric, None);
                out.push(point(&base, None, family_name.to_string(), timestamp, *sample_sum));
            }
            (ExpansionPolicy::Decompose, MetricKind::Histogram(histogram)) => {
                let base = base_labels(family_name, metric, Some(BUCKET_LABEL));
                push_sum_and_count(
                    out,
                    &base,
                    family_name,
                    timestamp,
                    histogram.sample_sum,
                    histogram.sample_count,
                );

                let bucket_name = format!("{}{}", family_name, BUCKET_SUFFIX);
                for bucket in &histogram.buckets {
                    out.push(point(
                        &base,
                        Some(LabelPair::new(BUCKET_LABEL, format_float(bucket.upper_bound))),
                        bucket_name.clone(),
                        timestamp,
                        bucket.cumulative_count as f64,
                    ));
                }
            }
            (ExpansionPolicy::Decompose, MetricKind::Summary(summary)) => {
                let base = base_labels(family_name, metric, Some(QUANTILE_LABEL));
                push_sum_and_count(
                    out,
                    &base,
                    family_name,
                    timestamp,
                    summary.sample_sum,
                    summary.sample_count,
                );

                for quantile in &summary.quantiles {
                    out.push(point(
                        &base,
                        Some(LabelPair::new(QUANTILE_LABEL, format_float(quantile.quantile))),
                        family_name.to_string(),
                        timestamp,
                        quantile.value,
                    ));
                }
            }
        }
    }
}

/// Convert families with the default decomposition
pub fn convert(families: &[MetricFamily]) -> ConversionResult {
    Converter::new().convert(families)
}

/// Concatenate all per-family points into one batch for the transport
pub fn flatten(result: &ConversionResult) -> Vec<TimeSeriesPoint> {
    result.flatten()
}

fn push_sum_and_count(
    out: &mut Vec<TimeSeriesPoint>,
    base: &[LabelPair],
    family_name: &str,
    timestamp: DateTime<Utc>,
    sample_sum: f64,
    sample_count: u64,
) {
    out.push(point(
        base,
        None,
        format!("{}{}", family_name, SUM_SUFFIX),
        timestamp,
        sample_sum,
    ));
    out.push(point(
        base,
        None,
        format!("{}{}", family_name, COUNT_SUFFIX),
        timestamp,
        sample_count as f64,
    ));
}

/// Build one point from its own copy of the base labels
fn point(
    base: &[LabelPair],
    extra: Option<LabelPair>,
    name: String,
    timestamp: DateTime<Utc>,
    value: f64,
) -> TimeSeriesPoint {
    let mut labels = Vec::with_capacity(base.len() + 2);
    labels.extend_from_slice(base);
    labels.extend(extra);
    labels.push(LabelPair::new(METRIC_NAME_LABEL, name));
    TimeSeriesPoint::new(labels, timestamp, value)
}

/// The metric's labels minus reserved names and repeated names.
///
/// `__name__` is always reserved; `injected` is the extra label the metric's
/// kind adds to some of its points.
fn base_labels(family_name: &str, metric: &Metric, injected: Option<&str>) -> Vec<LabelPair> {
    let mut seen = HashSet::with_capacity(metric.labels.len());
    let mut labels = Vec::with_capacity(metric.labels.len());

    for label in &metric.labels {
        if label.name() == METRIC_NAME_LABEL || Some(label.name()) == injected {
            warn!(
                "Dropping label '{}' from metric of family '{}': name is reserved",
                label, family_name
            );
            continue;
        }
        if !seen.insert(label.name()) {
            warn!(
                "Dropping repeated label '{}' from metric of family '{}'",
                label, family_name
            );
            continue;
        }
        labels.push(label.clone());
    }

    labels
}

fn to_timestamp(timestamp_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(timestamp_ms).unwrap_or_else(|| {
        warn!("Timestamp {}ms is out of range, clamping", timestamp_ms);
        if timestamp_ms < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        }
    })
}
