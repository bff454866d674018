//! Core types and utilities for clawstat
//!
//! This crate provides the transcript record types, the error taxonomy,
//! and the scan diagnostics shared by all other clawstat crates.

pub mod diagnostics;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use diagnostics::{ScanWarning, WarningKind};
pub use error::{ClawstatError, Result};
pub use types::{Message, MessageUsage, ModelName, SessionId, TokenCounts, UsageEntry};
