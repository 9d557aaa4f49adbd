use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::label::{LabelPair, METRIC_NAME_LABEL, find_label};

/// A timestamped scalar value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Datapoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Datapoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl fmt::Display for Datapoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}]", self.timestamp.to_rfc3339(), self.value)
    }
}

/// A single labelled, timestamped observation in remote-write form.
///
/// The series name travels as the `__name__` label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub labels: Vec<LabelPair>,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(labels: Vec<LabelPair>, timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            labels,
            timestamp,
            value,
        }
    }

    pub fn from_datapoint(labels: Vec<LabelPair>, datapoint: Datapoint) -> Self {
        Self::new(labels, datapoint.timestamp, datapoint.value)
    }

    /// Value of the `__name__` label, if present
    pub fn name(&self) -> Option<&str> {
        self.label(METRIC_NAME_LABEL)
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        find_label(&self.labels, name)
    }

    pub fn datapoint(&self) -> Datapoint {
        Datapoint::new(self.timestamp, self.value)
    }
}

/// The points produced for one metric family
#[derive(Debug, Clone, PartialEq)]
pub struct FamilySeries {
    pub name: String,
    pub points: Vec<TimeSeriesPoint>,
}

/// Points produced by a conversion, grouped by family name.
///
/// Families are kept in the order they were first seen in the snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionResult {
    families: Vec<FamilySeries>,
    index: HashMap<String, usize>,
}

impl ConversionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append points to a family, creating its entry on first use
    pub fn extend_family(&mut self, name: &str, points: Vec<TimeSeriesPoint>) {
        match self.index.get(name) {
            Some(&position) => self.families[position].points.extend(points),
            None => {
                self.index.insert(name.to_string(), self.families.len());
                self.families.push(FamilySeries {
                    name: name.to_string(),
                    points,
                });
            }
        }
    }

    /// Points for a family, `None` if the family was not in the snapshot
    pub fn get(&self, name: &str) -> Option<&[TimeSeriesPoint]> {
        self.index
            .get(name)
            .map(|&position| self.families[position].points.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.families.iter().map(|f| f.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FamilySeries> {
        self.families.iter()
    }

    /// Number of families
    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Total number of points across all families
    pub fn point_count(&self) -> usize {
        self.families.iter().map(|f| f.points.len()).sum()
    }

    /// Concatenate every family's points into one batch
    pub fn flatten(&self) -> Vec<TimeSeriesPoint> {
        let mut batch = Vec::with_capacity(self.point_count());
        for family in &self.families {
            batch.extend(family.points.iter().cloned());
        }
        batch
    }

    /// Consuming variant of [`ConversionResult::flatten`]
    pub fn into_flat(self) -> Vec<TimeSeriesPoint> {
        self.families.into_iter().flat_map(|f| f.points).collect()
    }
}

impl IntoIterator for ConversionResult {
    type Item = FamilySeries;
    type IntoIter = std::vec::IntoIter<FamilySeries>;

    fn into_iter(self) -> Self::IntoIter {
        self.families.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(name: &str, value: f64) -> TimeSeriesPoint {
        TimeSeriesPoint::new(
            vec![LabelPair::new(METRIC_NAME_LABEL, name)],
            DateTime::<Utc>::UNIX_EPOCH,
            value,
        )
    }

    #[test]
    fn test_extend_family_appends_to_existing_entry() {
        let mut result = ConversionResult::new();
        result.extend_family("a", vec![point("a", 1.0)]);
        result.extend_family("b", vec![]);
        result.extend_family("a", vec![point("a", 2.0)]);

        assert_eq!(result.len(), 2);
        assert_eq!(result.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(result.get("a").unwrap().len(), 2);
        assert_eq!(result.get("b").unwrap().len(), 0);
        assert!(result.get("c").is_none());
    }

    #[test]
    fn test_flatten_preserves_family_order() {
        let mut result = ConversionResult::new();
        result.extend_family("a", vec![point("a", 1.0), point("a", 2.0)]);
        result.extend_family("b", vec![point("b", 3.0)]);

        let flat = result.flatten();
        assert_eq!(flat.len(), result.point_count());
        let values: Vec<f64> = flat.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert_eq!(result.into_flat(), flat);
    }

    #[test]
    fn test_point_accessors() {
        let p = point("up", 1.0);
        assert_eq!(p.name(), Some("up"));
        assert_eq!(p.label("job"), None);
        assert_eq!(p.datapoint(), Datapoint::new(DateTime::<Utc>::UNIX_EPOCH, 1.0));
    }
}
