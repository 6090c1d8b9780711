use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Failures of a single call to the external `az` process.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation} timed out after {limit:?}")]
    Timeout { operation: &'static str, limit: Duration },

    #[error("{operation} exited with {status}: {stderr}")]
    Failure {
        operation: &'static str,
        status: ExitStatus,
        stderr: String,
    },

    #[error("malformed query output: {0}")]
    Payload(#[from] serde_json::Error),
}

/// A record that could not be mapped into an alert row.
#[derive(Error, Debug)]
#[error("alert record #{index} ({}) is malformed: {source}", .name.as_deref().unwrap_or("unnamed"))]
pub struct NormalizationError {
    pub index: usize,
    pub name: Option<String>,
    #[source]
    pub source: serde_json::Error,
}

/// Failures that end a request.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    InvalidInput(String),

    #[error("Azure login failed: {0}")]
    Authentication(#[source] ClientError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

/// Non-fatal problem that cut pagination short.
#[derive(Error, Debug)]
pub enum FetchWarning {
    #[error("query at offset {offset} failed, results may be incomplete: {source}")]
    QueryExecution {
        offset: usize,
        #[source]
        source: ClientError,
    },

    #[error("query output at offset {offset} could not be decoded, results may be incomplete: {source}")]
    PayloadParse {
        offset: usize,
        #[source]
        source: ClientError,
    },
}

impl FetchWarning {
    pub fn from_client(offset: usize, source: ClientError) -> Self {
        match source {
            ClientError::Payload(_) => Self::PayloadParse { offset, source },
            other => Self::QueryExecution { offset, source: other },
        }
    }
}
