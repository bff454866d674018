//! Error types for clawstat
//!
//! This module defines the error types used throughout the clawstat crates.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! Only failures that make a whole report impossible are errors. Problems
//! local to a single session are reported as [`ScanWarning`]s instead and
//! never abort an aggregation.
//!
//! [`ScanWarning`]: crate::diagnostics::ScanWarning
//!
//! # Example
//!
//! ```
//! use clawstat_core::error::{ClawstatError, Result};
//!
//! fn example_function() -> Result<()> {
//!     // This will automatically convert io::Error to ClawstatError
//!     let _file = std::fs::read_to_string("nonexistent.txt")?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for clawstat operations
#[derive(Error, Debug)]
pub enum ClawstatError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// The workspace root is missing, not a directory, or unreadable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workspace root does not exist
    #[error("Workspace root not found: {}", .0.display())]
    WorkspaceNotFound(PathBuf),

    /// A report could not be encoded for output
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// HTTP server error
    #[error("Server error: {0}")]
    Server(String),
}

impl ClawstatError {
    /// Whether this error means the workspace configuration itself is unusable
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_) | Self::WorkspaceNotFound(_))
    }
}

/// Convenience type alias for Results in clawstat
///
/// # Example
///
/// ```
/// use clawstat_core::Result;
///
/// fn process_data() -> Result<String> {
///     Ok("Processed successfully".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, ClawstatError>;
