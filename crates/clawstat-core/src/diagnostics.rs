//! Scan diagnostics
//!
//! Problems local to one session never fail a scan. They are collected as
//! [`ScanWarning`]s and kept out of the primary report body; callers log
//! them or surface them through a side channel.

use crate::types::SessionId;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Why a session entry was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum WarningKind {
    /// The transcript exists but could not be read
    Unreadable(String),
    /// The transcript was read but is not a valid message array
    Malformed(String),
    /// The entry under `sessions/` is not a directory
    NotADirectory,
}

/// A recoverable, per-session problem encountered while scanning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanWarning {
    /// Session (directory entry name) the warning refers to
    pub session: SessionId,
    /// Offending path
    pub path: PathBuf,
    /// What went wrong
    #[serde(flatten)]
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Record that `session`, read from `path`, was left out of the totals
    pub fn new(session: SessionId, path: impl Into<PathBuf>, kind: WarningKind) -> Self {
        Self {
            session,
            path: path.into(),
            kind,
        }
    }
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::Unreadable(e) => write!(
                f,
                "{}: unreadable transcript {}: {}",
                self.session,
                self.path.display(),
                e
            ),
            WarningKind::Malformed(e) => write!(
                f,
                "{}: malformed transcript {}: {}",
                self.session,
                self.path.display(),
                e
            ),
            WarningKind::NotADirectory => {
                write!(f, "{}: not a session directory, skipped", self.session)
            }
        }
    }
}
