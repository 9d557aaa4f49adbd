//! Metric snapshot model.
//!
//! A [`Snapshot`] is the immutable export of an instrumentation registry: an
//! ordered list of metric families, each fanned out over label combinations.
//! The shape follows the instrumentation library's data model, where each
//! metric carries at most one typed payload.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::Path;

use crate::error::{PromRemoteError, Result};
use crate::label::LabelPair;

/// Counter payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Counter {
    #[serde(with = "float_repr")]
    pub value: f64,
}

/// Gauge payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gauge {
    #[serde(with = "float_repr")]
    pub value: f64,
}

/// One cumulative histogram bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Inclusive upper bound, `+Inf` for the final bucket
    #[serde(with = "float_repr")]
    pub upper_bound: f64,
    /// Observations less than or equal to `upper_bound`
    pub cumulative_count: u64,
}

/// Histogram payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    #[serde(with = "float_repr")]
    pub sample_sum: f64,
    pub sample_count: u64,
    /// Buckets in ascending bound order
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

/// One pre-computed summary quantile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantile {
    #[serde(with = "float_repr")]
    pub quantile: f64,
    #[serde(with = "float_repr")]
    pub value: f64,
}

/// Summary payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(with = "float_repr")]
    pub sample_sum: f64,
    pub sample_count: u64,
    #[serde(default)]
    pub quantiles: Vec<Quantile>,
}

/// Borrowed view of the payload a metric carries
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricKind<'a> {
    Counter(&'a Counter),
    Gauge(&'a Gauge),
    Histogram(&'a Histogram),
    Summary(&'a Summary),
}

impl MetricKind<'_> {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter(_) => "counter",
            MetricKind::Gauge(_) => "gauge",
            MetricKind::Histogram(_) => "histogram",
            MetricKind::Summary(_) => "summary",
        }
    }
}

/// A single labelled instance of a metric family
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    #[serde(default)]
    pub labels: Vec<LabelPair>,
    /// Milliseconds since the Unix epoch, 0 when the registry did not set one
    #[serde(default)]
    pub timestamp_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter: Option<Counter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gauge: Option<Gauge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histogram: Option<Histogram>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

impl Metric {
    pub fn counter(value: f64) -> Self {
        Self {
            counter: Some(Counter { value }),
            ..Default::default()
        }
    }

    pub fn gauge(value: f64) -> Self {
        Self {
            gauge: Some(Gauge { value }),
            ..Default::default()
        }
    }

    pub fn histogram(sample_sum: f64, sample_count: u64, buckets: Vec<Bucket>) -> Self {
        Self {
            histogram: Some(Histogram {
                sample_sum,
                sample_count,
                buckets,
            }),
            ..Default::default()
        }
    }

    pub fn summary(sample_sum: f64, sample_count: u64, quantiles: Vec<Quantile>) -> Self {
        Self {
            summary: Some(Summary {
                sample_sum,
                sample_count,
                quantiles,
            }),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push(LabelPair::new(name, value));
        self
    }

    pub fn with_timestamp_ms(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    /// The payload of this metric, `None` when no recognised payload is set.
    ///
    /// If several payloads are present the first of counter, gauge,
    /// histogram, summary wins.
    pub fn kind(&self) -> Option<MetricKind<'_>> {
        if let Some(counter) = &self.counter {
            Some(MetricKind::Counter(counter))
        } else if let Some(gauge) = &self.gauge {
            Some(MetricKind::Gauge(gauge))
        } else if let Some(histogram) = &self.histogram {
            Some(MetricKind::Histogram(histogram))
        } else {
            self.summary.as_ref().map(MetricKind::Summary)
        }
    }
}

/// A named instrument together with all its labelled instances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFamily {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl MetricFamily {
    pub fn new(name: impl Into<String>, metrics: Vec<Metric>) -> Self {
        Self {
            name: name.into(),
            help: String::new(),
            metrics,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }
}

/// An immutable export of metric families.
///
/// Serialised as a bare JSON array of families. Float fields accept either a
/// number or one of the strings `"+Inf"`, `"-Inf"` and `"NaN"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    families: Vec<MetricFamily>,
}

impl Snapshot {
    pub fn new(families: Vec<MetricFamily>) -> Self {
        Self { families }
    }

    /// Parse a snapshot from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Ok(snapshot)
    }

    /// Parse a snapshot from any reader producing JSON
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_reader(reader)?;
        Ok(snapshot)
    }

    /// Load a snapshot from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PromRemoteError::Snapshot(format!(
                "Snapshot file not found: {}",
                path.display()
            )));
        }

        debug!("Loading snapshot from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let snapshot = Self::from_json_str(&contents)?;
        debug!("Loaded {} metric families", snapshot.len());
        Ok(snapshot)
    }

    pub fn families(&self) -> &[MetricFamily] {
        &self.families
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    pub fn into_families(self) -> Vec<MetricFamily> {
        self.families
    }
}

impl From<Vec<MetricFamily>> for Snapshot {
    fn from(families: Vec<MetricFamily>) -> Self {
        Self::new(families)
    }
}

impl FromIterator<MetricFamily> for Snapshot {
    fn from_iter<T: IntoIterator<Item = MetricFamily>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Floats that may be non-finite, written as strings when they are
mod float_repr {
    use serde::{Deserialize, Deserializer, Serializer, de};

    use crate::label::{format_float, parse_float};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_str(&format_float(*value))
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) => parse_float(&text)
                .ok_or_else(|| de::Error::custom(format!("invalid float value: {}", text))),
        }
    }
}
