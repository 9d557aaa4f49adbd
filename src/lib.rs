//! Conversion of metric snapshots into Prometheus remote-write time series

pub mod cli;
pub mod config;
pub mod converter;
pub mod error;
pub mod label;
pub mod report;
pub mod series;
pub mod snapshot;
pub mod transport;
pub mod util;

/// Re-export of commonly used types for convenience
pub mod prelude {
    pub use crate::converter::{Converter, ExpansionPolicy, convert, flatten};
    pub use crate::error::{PromRemoteError, Result};
    pub use crate::label::LabelPair;
    pub use crate::report::WriteReport;
    pub use crate::series::{ConversionResult, Datapoint, TimeSeriesPoint};
    pub use crate::snapshot::{Metric, MetricFamily, Snapshot};
    pub use crate::transport::{Transport, WriteOptions, WriteResult};
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
