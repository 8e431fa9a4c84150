//! Error types for the platescan-core library.
//!
//! Job-fatal conditions surface as `CoreError` values returned from the
//! pipeline entry points. Per-frame anomalies never reach this type at the
//! orchestrator boundary; they degrade to empty detection lists inside the
//! detection invoker (see `external::alpr`).

use std::process::ExitStatus;
use thiserror::Error;

/// Custom error types for platescan
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Required external tool not found: {0}")]
    DependencyNotFound(String),

    #[error("Failed to start {tool}: {msg}")]
    CommandStart { tool: String, msg: String },

    #[error("Failed waiting for {tool}: {msg}")]
    CommandWait { tool: String, msg: String },

    #[error("{tool} failed ({status}): {msg}")]
    CommandFailed {
        tool: String,
        status: String,
        msg: String,
    },

    #[error("{tool} timed out after {seconds} seconds")]
    CommandTimeout { tool: String, seconds: u64 },

    #[error("Cannot open video: {0}")]
    VideoOpen(String),

    #[error("Frame encode error: {0}")]
    FrameEncode(String),

    #[error("Unexpected error: {0}")]
    Other(String),
}

/// Result type for platescan operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Builds a `CommandStart` error for a tool that could not be spawned.
pub fn command_start_error(tool: &str, err: impl std::fmt::Display) -> CoreError {
    CoreError::CommandStart {
        tool: tool.to_string(),
        msg: err.to_string(),
    }
}

/// Builds a `CommandWait` error for a tool whose exit could not be reaped.
pub fn command_wait_error(tool: &str, err: impl std::fmt::Display) -> CoreError {
    CoreError::CommandWait {
        tool: tool.to_string(),
        msg: err.to_string(),
    }
}

/// Builds a `CommandFailed` error from a tool's exit status and diagnostic.
pub fn command_failed_error(
    tool: &str,
    status: ExitStatus,
    msg: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        tool: tool.to_string(),
        status: status.to_string(),
        msg: msg.into(),
    }
}
