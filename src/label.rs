use serde::{Deserialize, Serialize};
use std::fmt;

/// Label carrying the series name
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Label carrying a histogram bucket's upper bound
pub const BUCKET_LABEL: &str = "le";

/// Label carrying a summary quantile
pub const QUANTILE_LABEL: &str = "quantile";

/// A name/value pair attached to a metric or series
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelPair {
    name: String,
    value: String,
}

impl LabelPair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for LabelPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=\"{}\"", self.name, self.value)
    }
}

/// Format a float as a label value.
///
/// Finite values use the shortest representation that parses back to the same
/// `f64` (`200.0` renders as `200`, `0.5` as `0.5`). Non-finite values use the
/// exposition format spellings `+Inf`, `-Inf` and `NaN`.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}

/// Parse a label value produced by [`format_float`]
pub fn parse_float(text: &str) -> Option<f64> {
    match text.trim() {
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        other => other.parse().ok(),
    }
}

/// Find a label value by name
pub fn find_label<'a>(labels: &'a [LabelPair], name: &str) -> Option<&'a str> {
    labels.iter().find(|l| l.name == name).map(|l| l.value.as_str())
}
