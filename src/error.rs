//! Error types for readyq
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown or ambiguous task id)
//! - 3: Lock contention (document lock not acquired in time)
//! - 4: Operation failed (I/O, codec, validation errors)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the readyq CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const LOCK_CONTENDED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for readyq operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Task '{0}' not found")]
    NotFound(String),

    #[error("Ambiguous ID prefix '{prefix}': matches {}", .candidates.join(", "))]
    Ambiguous {
        prefix: String,
        candidates: Vec<String>,
    },

    #[error("Invalid log index {index}: task has {len} session logs")]
    InvalidLogIndex { index: usize, len: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Lock contention (exit code 3)
    #[error("Could not acquire database lock {} after {timeout_ms}ms; another process may be using readyq", .path.display())]
    LockTimeout { path: PathBuf, timeout_ms: u64 },

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Validation failed with {} error(s)", .0.len())]
    ValidationFailed(Vec<String>),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NotFound(_)
            | Error::Ambiguous { .. }
            | Error::InvalidLogIndex { .. }
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_) => exit_codes::USER_ERROR,

            Error::LockTimeout { .. } => exit_codes::LOCK_CONTENDED,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::OperationFailed(_)
            | Error::ValidationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for machine-readable output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Ambiguous { prefix, candidates } => Some(serde_json::json!({
                "prefix": prefix,
                "candidates": candidates,
            })),
            Error::LockTimeout { path, timeout_ms } => Some(serde_json::json!({
                "lock_path": path.display().to_string(),
                "timeout_ms": timeout_ms,
            })),
            Error::InvalidLogIndex { index, len } => Some(serde_json::json!({
                "index": index,
                "sessions": len,
            })),
            Error::ValidationFailed(errors) => Some(serde_json::json!({
                "errors": errors,
            })),
            _ => None,
        }
    }
}

/// Result type alias for readyq operations
pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal problems collected while an operation keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A legacy-format line could not be decoded and was skipped.
    #[error("Skipping malformed line {line} in {}", .path.display())]
    MalformedRecord { path: PathBuf, line: usize },

    /// An edge operation named a task that does not exist.
    #[error("Task '{0}' not found. Ignoring.")]
    InvalidEdgeReference(String),

    /// An edge operation named a prefix that matches several tasks.
    #[error("Ambiguous ID prefix '{prefix}' ({}). Ignoring.", .candidates.join(", "))]
    AmbiguousEdgeReference {
        prefix: String,
        candidates: Vec<String>,
    },

    /// An edge operation pointed a task at itself.
    #[error("Task '{0}' cannot block itself. Ignoring.")]
    SelfReference(String),

    /// Structural, referential or cycle problem found in a loaded document.
    #[error("{0}")]
    Validation(String),
}

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
