use serde::Serialize;

use crate::error::Result;
use crate::transport::{WriteError, WriteResult};

/// The JSON line a process prints after a write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl WriteReport {
    pub fn from_outcome(outcome: &std::result::Result<WriteResult, WriteError>) -> Self {
        match outcome {
            Ok(result) => Self {
                success: true,
                error: None,
                status_code: result.status_code,
            },
            Err(err) => Self {
                success: false,
                error: Some(err.message.clone()),
                status_code: err.status_code,
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
