use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

use crate::series::TimeSeriesPoint;

/// Per-request options passed to a transport
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Extra headers to set on the request
    pub headers: HashMap<String, String>,
}

impl WriteOptions {
    pub fn with_headers(headers: HashMap<String, String>) -> Self {
        Self { headers }
    }
}

/// Outcome of a successful write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResult {
    pub status_code: u16,
}

/// A failed write, with the status code the endpoint answered (0 if none)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct WriteError {
    pub message: String,
    pub status_code: u16,
}

impl WriteError {
    pub fn new(message: impl Into<String>, status_code: u16) -> Self {
        Self {
            message: message.into(),
            status_code,
        }
    }
}

/// Trait for remote-write transports.
///
/// A transport sends one batch per call and does not retry.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Write a batch of points
    async fn write(
        &self,
        points: &[TimeSeriesPoint],
        options: &WriteOptions,
    ) -> Result<WriteResult, WriteError>;

    /// Get a name for this transport
    fn name(&self) -> &str;
}

/// A batch received by a [`MemoryTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    pub points: Vec<TimeSeriesPoint>,
    pub headers: HashMap<String, String>,
}

/// A transport that keeps every batch in memory
pub struct MemoryTransport {
    writes: RwLock<Vec<WriteRecord>>,
    failure: Option<WriteError>,
    name: String,
}

impl MemoryTransport {
    /// Create a transport that accepts every write with status 200
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            writes: RwLock::new(Vec::new()),
            failure: None,
            name: name.into(),
        }
    }

    /// Create a transport that rejects every write with the given error
    pub fn failing(name: impl Into<String>, failure: WriteError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new(name)
        }
    }

    /// All batches written so far
    pub fn writes(&self) -> Result<Vec<WriteRecord>, WriteError> {
        let writes = self
            .writes
            .read()
            .map_err(|_| WriteError::new("Lock poisoned", 0))?;
        Ok(writes.clone())
    }

    /// Total points across all batches
    pub fn point_count(&self) -> Result<usize, WriteError> {
        let writes = self
            .writes
            .read()
            .map_err(|_| WriteError::new("Lock poisoned", 0))?;
        Ok(writes.iter().map(|w| w.points.len()).sum())
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn write(
        &self,
        points: &[TimeSeriesPoint],
        options: &WriteOptions,
    ) -> Result<WriteResult, WriteError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        let mut writes = self
            .writes
            .write()
            .map_err(|_| WriteError::new("Lock poisoned", 0))?;
        writes.push(WriteRecord {
            points: points.to_vec(),
            headers: options.headers.clone(),
        });

        debug!("{} stored batch of {} points", self.name, points.len());
        Ok(WriteResult { status_code: 200 })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::LabelPair;
    use chrono::{DateTime, Utc};

    fn batch() -> Vec<TimeSeriesPoint> {
        vec![TimeSeriesPoint::new(
            vec![LabelPair::new("__name__", "up")],
            DateTime::<Utc>::UNIX_EPOCH,
            1.0,
        )]
    }

    #[tokio::test]
    async fn test_memory_transport_records_batches() {
        let transport = MemoryTransport::new("memory");
        let mut headers = HashMap::new();
        headers.insert("User-Agent".to_string(), "promremote".to_string());

        let result = transport
            .write(&batch(), &WriteOptions::with_headers(headers.clone()))
            .await
            .unwrap();
        assert_eq!(result.status_code, 200);

        let writes = transport.writes().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].points, batch());
        assert_eq!(writes[0].headers, headers);
        assert_eq!(transport.point_count().unwrap(), 1);
        assert_eq!(transport.name(), "memory");
    }

    #[tokio::test]
    async fn test_failing_transport() {
        let transport = MemoryTransport::failing("memory", WriteError::new("bad request", 400));

        let err = transport
            .write(&batch(), &WriteOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.status_code, 400);
        assert_eq!(err.to_string(), "bad request");
        assert_eq!(transport.point_count().unwrap(), 0);
    }
}
