//! Error types for the ingestion and aggregation pipeline.
//!
//! Per-entity errors are collected into a run summary instead of aborting the
//! run, so every variant here carries enough context to be reported on its own.

use std::fmt;

use thiserror::Error;

/// Errors raised by the pipeline core.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A persisted collection (or the whole store) is absent.
    #[error("{collection} not found")]
    NotFound { collection: String },

    /// A request failed after exhausting its retry budget, or hit a
    /// non-retryable status.
    #[error("fetch failed for {url} after {attempts} attempt(s): {reason}")]
    FetchFailed {
        url: String,
        attempts: u32,
        reason: String,
    },

    /// A page was fetched but could not be decoded into a record.
    #[error("could not decode {url}: {reason}")]
    Decode { url: String, reason: String },

    /// A fight record is missing a field the aggregation engine wanted.
    #[error("fight {fight_id}: {reason}")]
    AggregationInput { fight_id: String, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl PipelineError {
    pub fn decode(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Coarse classification used by run summaries.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::FetchFailed { .. } => ErrorKind::FetchFailed,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::AggregationInput { .. } => ErrorKind::AggregationInput,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

/// Error classification without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    NotFound,
    FetchFailed,
    Decode,
    AggregationInput,
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::FetchFailed => "fetch_failed",
            ErrorKind::Decode => "decode",
            ErrorKind::AggregationInput => "aggregation_input",
            ErrorKind::Storage => "storage",
        };
        f.write_str(name)
    }
}
