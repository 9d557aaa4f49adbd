//! Command line flag values.
//!
//! Each type implements [`FromStr`] so it can be used directly as a clap
//! value parser.

use chrono::{DateTime, Utc};
use log::warn;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::PromRemoteError;
use crate::label::{LabelPair, METRIC_NAME_LABEL, find_label};
use crate::series::{Datapoint, TimeSeriesPoint};

/// A `name:value` label pair given with `-t`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFlag(pub LabelPair);

impl FromStr for LabelFlag {
    type Err = PromRemoteError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value.split(':').collect();
        if parts.len() != 2 {
            return Err(PromRemoteError::Label(format!(
                "incorrect number of arguments to '-t': {}",
                parts.len()
            )));
        }

        Ok(LabelFlag(LabelPair::new(parts[0], parts[1])))
    }
}

impl fmt::Display for LabelFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0.name(), self.0.value())
    }
}

/// A `Name: value` request header given with `-h`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFlag {
    pub name: String,
    pub value: String,
}

impl FromStr for HeaderFlag {
    type Err = PromRemoteError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let Some((name, rest)) = value.split_once(':') else {
            return Err(PromRemoteError::Header(format!(
                "header missing separating colon: '{}'",
                value
            )));
        };

        Ok(HeaderFlag {
            name: name.trim().to_string(),
            value: rest.trim().to_string(),
        })
    }
}

impl fmt::Display for HeaderFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// A `timestamp,value` datapoint given with `-d`.
///
/// The timestamp is in Unix seconds, or the literal `now`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatapointFlag(pub Datapoint);

impl DatapointFlag {
    /// Parse with an explicit clock for `now`
    pub fn parse_at(value: &str, now: DateTime<Utc>) -> Result<Self, PromRemoteError> {
        let parts: Vec<&str> = value.split(',').collect();
        if parts.len() != 2 {
            return Err(PromRemoteError::Datapoint(format!(
                "incorrect number of arguments to '-d': {}",
                parts.len()
            )));
        }

        let timestamp = if parts[0].eq_ignore_ascii_case("now") {
            now
        } else {
            parts[0]
                .parse::<i64>()
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .ok_or_else(|| {
                    PromRemoteError::Datapoint(format!("unable to parse timestamp: {}", parts[0]))
                })?
        };

        let value = parts[1].parse::<f64>().map_err(|_| {
            PromRemoteError::Datapoint(format!("unable to parse value as float64: {}", parts[1]))
        })?;

        Ok(DatapointFlag(Datapoint::new(timestamp, value)))
    }
}

impl FromStr for DatapointFlag {
    type Err = PromRemoteError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse_at(value, Utc::now())
    }
}

impl fmt::Display for DatapointFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Collapse header flags into a map, later duplicates win
pub fn headers_map(headers: &[HeaderFlag]) -> HashMap<String, String> {
    headers
        .iter()
        .map(|h| (h.name.clone(), h.value.clone()))
        .collect()
}

/// Build the manually supplied series from `-t` labels and a `-d` datapoint.
///
/// Labels are used as given; the series name must be passed as a
/// `__name__` label.
pub fn manual_series(labels: &[LabelFlag], datapoint: DatapointFlag) -> TimeSeriesPoint {
    let labels: Vec<LabelPair> = labels.iter().map(|l| l.0.clone()).collect();
    if find_label(&labels, METRIC_NAME_LABEL).is_none() {
        warn!("Manual datapoint has no '{}' label", METRIC_NAME_LABEL);
    }
    TimeSeriesPoint::from_datapoint(labels, datapoint.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_label() {
        let flag: LabelFlag = "status_code:200".parse().unwrap();
        assert_eq!(flag.0, LabelPair::new("status_code", "200"));
        assert_eq!(flag.to_string(), "status_code:200");
    }

    #[test]
    fn test_label_requires_exactly_one_colon() {
        let err = "status_code".parse::<LabelFlag>().unwrap_err();
        assert_eq!(err.to_string(), "incorrect number of arguments to '-t': 1");

        let err = "url:http://x".parse::<LabelFlag>().unwrap_err();
        assert_eq!(err.to_string(), "incorrect number of arguments to '-t': 3");
    }

    #[test]
    fn test_parse_header_trims_and_splits_on_first_colon() {
        let flag: HeaderFlag = "X-Forwarded-For : http://proxy:8080 ".parse().unwrap();
        assert_eq!(flag.name, "X-Forwarded-For");
        assert_eq!(flag.value, "http://proxy:8080");
    }

    #[test]
    fn test_header_missing_colon() {
        let err = "User-Agent foo".parse::<HeaderFlag>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "header missing separating colon: 'User-Agent foo'"
        );
    }

    #[test]
    fn test_headers_map_later_wins() {
        let headers: Vec<HeaderFlag> = vec![
            "User-Agent: a".parse().unwrap(),
            "X-Scope: b".parse().unwrap(),
            "User-Agent: c".parse().unwrap(),
        ];
        let map = headers_map(&headers);
        assert_eq!(map.len(), 2);
        assert_eq!(map["User-Agent"], "c");
    }

    #[test]
    fn test_parse_datapoint() {
        let flag: DatapointFlag = "1556026059,14.23".parse().unwrap();
        assert_eq!(flag.0.timestamp.timestamp(), 1556026059);
        assert_eq!(flag.0.value, 14.23);
    }

    #[test]
    fn test_parse_datapoint_now() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let flag = DatapointFlag::parse_at("NOW,1", now).unwrap();
        assert_eq!(flag.0, Datapoint::new(now, 1.0));
    }

    #[test]
    fn test_datapoint_errors() {
        let err = "1,2,3".parse::<DatapointFlag>().unwrap_err();
        assert_eq!(err.to_string(), "incorrect number of arguments to '-d': 3");

        let err = "yesterday,2".parse::<DatapointFlag>().unwrap_err();
        assert_eq!(err.to_string(), "unable to parse timestamp: yesterday");

        let err = "1556026059,lots".parse::<DatapointFlag>().unwrap_err();
        assert_eq!(err.to_string(), "unable to parse value as float64: lots");
    }

    #[test]
    fn test_manual_series() {
        let labels: Vec<LabelFlag> = vec![
            "__name__:manual_metric".parse().unwrap(),
            "status_code:200".parse().unwrap(),
        ];
        let datapoint: DatapointFlag = "1556026059,14.23".parse().unwrap();

        let point = manual_series(&labels, datapoint);
        assert_eq!(point.name(), Some("manual_metric"));
        assert_eq!(point.label("status_code"), Some("200"));
        assert_eq!(point.value, 14.23);
        assert_eq!(point.datapoint(), datapoint.0);
    }
}
