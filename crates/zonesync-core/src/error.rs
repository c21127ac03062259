//! Error types for zone reconciliation
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zone reconciliation
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Speculative execution was requested
    #[error("dry run not supported")]
    DryRunNotSupported,

    /// Remote record store call failed
    #[error("Record store error: {0}")]
    Store(String),

    /// Side-channel SOA query failed
    #[error("Authoritative query error: {0}")]
    Authoritative(String),

    /// An Update or Delete change carried no record id
    #[error("record to mutate not found in current zone: {0}")]
    RecordToMutateNotFound(String),

    /// The caller's cancellation token fired
    #[error("Operation cancelled")]
    Cancelled,

    /// A spawned task panicked or was aborted
    #[error("Task failed: {0}")]
    Task(String),

    /// A single zone failed to fetch or apply
    #[error("zone {zone}: {source}")]
    Zone {
        /// Zone name
        zone: String,
        /// First error recorded for the zone
        #[source]
        source: Box<Error>,
    },

    /// One or more zones failed during a single apply
    #[error("{} zone(s) failed to apply ({}): {first}", .zones.len(), .zones.join(", "))]
    ZonesFailed {
        /// Every failed zone
        zones: Vec<String>,
        /// First failure observed
        first: Box<Error>,
    },

    /// Retry-safe wrapper: the next reconciliation cycle should retry
    #[error("soft error: {0}")]
    Soft(Box<Error>),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a record store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a side-channel query error
    pub fn authoritative(msg: impl Into<String>) -> Self {
        Self::Authoritative(msg.into())
    }

    /// Attach the owning zone to an error
    pub fn zone(zone: impl Into<String>, source: Error) -> Self {
        Self::Zone {
            zone: zone.into(),
            source: Box::new(source),
        }
    }

    /// Mark an error as safe to retry at the next cycle
    ///
    /// Wrapping an already soft error is a no-op.
    pub fn soft(err: Error) -> Self {
        match err {
            Self::Soft(_) => err,
            other => Self::Soft(Box::new(other)),
        }
    }

    /// Whether the caller may simply retry at its next cycle
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::Soft(_))
    }

    /// Whether this error came from the caller's cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Soft(inner) => inner.is_cancelled(),
            Self::Zone { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
