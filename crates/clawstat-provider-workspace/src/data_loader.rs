//! Data loader module for agent workspace session transcripts
//!
//! The agent runtime writes one transcript per session:
//!
//! ```text
//! <workspace>/
//!   sessions/
//!     <session-id>/
//!       transcript.json   # JSON array of messages
//! ```
//!
//! The workspace root comes from the `OPENCLAW_WORKSPACE` environment
//! variable, falling back to the current directory.
//!
//! Scanning is read-only and tolerant: a missing `sessions` directory or a
//! session without a transcript contributes nothing, and unreadable or
//! malformed transcripts are skipped with a [`ScanWarning`]. Only an unusable
//! workspace root fails the scan.
//!
//! # Examples
//!
//! ```no_run
//! use clawstat_provider_workspace::DataLoader;
//!
//! # async fn example() -> clawstat_core::Result<()> {
//! let loader = DataLoader::new("/srv/openclaw/workspace")?;
//! let scan = loader.scan_parallel().await?;
//!
//! for warning in &scan.warnings {
//!     eprintln!("skipped: {warning}");
//! }
//! let total: u64 = scan.entries().map(|e| e.tokens.total()).sum();
//! println!("{total} tokens across {} sessions", scan.sessions.len());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use clawstat_core::diagnostics::{ScanWarning, WarningKind};
use clawstat_core::error::{ClawstatError, Result};
use clawstat_core::types::{Message, SessionId, UsageEntry, parse_transcript, transcript_total};
use futures::stream::Stream;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Environment variable naming the workspace root
pub const WORKSPACE_ENV: &str = "OPENCLAW_WORKSPACE";

/// Subdirectory of the workspace holding one directory per session
pub const SESSIONS_DIR: &str = "sessions";

/// Transcript file name inside a session directory
pub const TRANSCRIPT_FILE: &str = "transcript.json";

/// A session directory discovered under `sessions/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDir {
    pub id: SessionId,
    pub path: PathBuf,
}

impl SessionDir {
    /// Path of this session's transcript
    pub fn transcript_path(&self) -> PathBuf {
        self.path.join(TRANSCRIPT_FILE)
    }
}

/// A successfully parsed session transcript
#[derive(Debug, Clone)]
pub struct SessionTranscript {
    pub session_id: SessionId,
    pub path: PathBuf,
    pub messages: Vec<Message>,
    /// Modification time of the transcript file, when the platform reports one
    pub modified: Option<DateTime<Utc>>,
}

impl SessionTranscript {
    /// Usage entries for messages carrying a `usage` block, in transcript order
    pub fn entries(&self) -> impl Iterator<Item = UsageEntry> + '_ {
        self.messages
            .iter()
            .filter_map(|message| UsageEntry::from_message(&self.session_id, message))
    }
}

/// Result of scanning a workspace
///
/// `sessions` holds every transcript that parsed, ordered by session ID.
/// Sessions without a transcript are not listed.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceScan {
    pub sessions: Vec<SessionTranscript>,
    pub warnings: Vec<ScanWarning>,
}

impl WorkspaceScan {
    /// All usage entries across sessions
    pub fn entries(&self) -> impl Iterator<Item = UsageEntry> + '_ {
        self.sessions.iter().flat_map(SessionTranscript::entries)
    }

    /// True when no transcript was loaded; skipped sessions are not counted
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// What reading one session produced
enum SessionOutcome {
    NoTranscript,
    Loaded(SessionTranscript),
    Skipped(ScanWarning),
}

/// Data loader for discovering and reading session transcripts
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Workspace root
    root: PathBuf,
    /// Whether to show progress bars
    show_progress: bool,
}

impl DataLoader {
    /// Create a DataLoader for an explicit workspace root
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the root does not exist, is not a
    /// directory, or cannot be read
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        validate_root(&root)?;
        debug!("Using workspace root {}", root.display());
        Ok(Self {
            root,
            show_progress: false,
        })
    }

    /// Create a DataLoader for the workspace named by `OPENCLAW_WORKSPACE`
    pub fn from_env() -> Result<Self> {
        Self::new(Self::resolve_root(None))
    }

    /// Pick the workspace root: explicit path, then environment, then `.`
    pub fn resolve_root(explicit: Option<PathBuf>) -> PathBuf {
        explicit
            .or_else(|| {
                std::env::var_os(WORKSPACE_ENV)
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from)
            })
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Enable or disable progress bars
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// The workspace root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `sessions` directory under the workspace root
    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join(SESSIONS_DIR)
    }

    /// Enumerate session directories
    ///
    /// Entries under `sessions/` are classified before use: directories
    /// (including symlinks to directories) are sessions, everything else is
    /// reported as a warning and skipped. Returns no sessions when the
    /// `sessions` directory does not exist.
    pub fn list_sessions(&self) -> Result<(Vec<SessionDir>, Vec<ScanWarning>)> {
        let sessions_dir = self.sessions_dir();

        match fs::metadata(&sessions_dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(ClawstatError::Config(format!(
                    "{} exists but is not a directory",
                    sessions_dir.display()
                )));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No sessions directory at {}", sessions_dir.display());
                return Ok((Vec::new(), Vec::new()));
            }
            Err(e) => {
                return Err(ClawstatError::Config(format!(
                    "cannot access {}: {e}",
                    sessions_dir.display()
                )));
            }
        }

        // Surface an unreadable sessions directory as a configuration problem
        // rather than a per-entry warning
        fs::read_dir(&sessions_dir).map_err(|e| {
            ClawstatError::Config(format!("cannot read {}: {e}", sessions_dir.display()))
        })?;

        let mut sessions = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&sessions_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            match entry {
                Ok(entry) => {
                    let id = SessionId::new(entry.file_name().to_string_lossy());
                    if entry.file_type().is_dir() {
                        sessions.push(SessionDir {
                            id,
                            path: entry.path().to_path_buf(),
                        });
                    } else {
                        debug!("Skipping non-directory entry {}", entry.path().display());
                        warnings.push(ScanWarning::new(
                            id,
                            entry.path(),
                            WarningKind::NotADirectory,
                        ));
                    }
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let id = SessionId::new(
                        path.file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                    );
                    warnings.push(ScanWarning::new(
                        id,
                        path,
                        WarningKind::Unreadable(e.to_string()),
                    ));
                }
            }
        }

        debug!(
            "Found {} session directories in {}",
            sessions.len(),
            sessions_dir.display()
        );
        Ok((sessions, warnings))
    }

    /// Read and parse one session's transcript
    ///
    /// Returns `Ok(None)` when the session has no transcript, and `Err` with
    /// the warning describing why the transcript was skipped.
    pub fn load_transcript(
        &self,
        session: &SessionDir,
    ) -> std::result::Result<Option<SessionTranscript>, ScanWarning> {
        match read_session(session) {
            SessionOutcome::NoTranscript => Ok(None),
            SessionOutcome::Loaded(transcript) => Ok(Some(transcript)),
            SessionOutcome::Skipped(warning) => Err(warning),
        }
    }

    /// Scan the workspace on the current thread
    pub fn scan_blocking(&self) -> Result<WorkspaceScan> {
        validate_root(&self.root)?;
        let (sessions, warnings) = self.list_sessions()?;

        let progress = self.progress_bar(sessions.len(), "Reading transcripts");
        let outcomes: Vec<SessionOutcome> = sessions
            .iter()
            .map(|session| {
                let outcome = read_session(session);
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
                outcome
            })
            .collect();
        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        Ok(collect_outcomes(outcomes, warnings))
    }

    /// Scan the workspace, reading transcripts in parallel
    ///
    /// Transcripts are read on the rayon pool. Results are only combined
    /// after every read has finished, so nothing is shared between workers.
    pub fn scan_parallel_blocking(&self) -> Result<WorkspaceScan> {
        validate_root(&self.root)?;
        let (sessions, warnings) = self.list_sessions()?;

        let progress = self.progress_bar(sessions.len(), "Reading transcripts (parallel)");
        let outcomes: Vec<SessionOutcome> = sessions
            .par_iter()
            .map(|session| {
                let outcome = read_session(session);
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
                outcome
            })
            .collect();
        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        Ok(collect_outcomes(outcomes, warnings))
    }

    /// Scan the workspace without blocking the async runtime
    pub async fn scan(&self) -> Result<WorkspaceScan> {
        let loader = self.clone();
        tokio::task::spawn_blocking(move || loader.scan_blocking())
            .await
            .map_err(|e| ClawstatError::Io(std::io::Error::other(e.to_string())))?
    }

    /// Parallel variant of [`scan`](Self::scan)
    pub async fn scan_parallel(&self) -> Result<WorkspaceScan> {
        let loader = self.clone();
        tokio::task::spawn_blocking(move || loader.scan_parallel_blocking())
            .await
            .map_err(|e| ClawstatError::Io(std::io::Error::other(e.to_string())))?
    }

    /// Load usage entries as an async stream
    ///
    /// Warnings are logged rather than yielded; the stream only carries an
    /// error when the workspace itself cannot be scanned.
    pub fn load_usage_entries(&self) -> impl Stream<Item = Result<UsageEntry>> + Send + '_ {
        async_stream::stream! {
            match self.scan_parallel().await {
                Ok(scan) => {
                    for entry in scan.entries() {
                        yield Ok(entry);
                    }
                }
                Err(e) => yield Err(e),
            }
        }
    }

    fn progress_bar(&self, len: usize, message: &'static str) -> Option<ProgressBar> {
        if !self.show_progress || len == 0 {
            return None;
        }
        let pb = ProgressBar::new(len as u64);
        let style = ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} sessions")
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.set_message(message);
        Some(pb)
    }
}

/// Check that the workspace root is an existing, readable directory
fn validate_root(root: &Path) -> Result<()> {
    let meta = match fs::metadata(root) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ClawstatError::WorkspaceNotFound(root.to_path_buf()));
        }
        Err(e) => {
            return Err(ClawstatError::Config(format!(
                "cannot access workspace root {}: {e}",
                root.display()
            )));
        }
    };

    if !meta.is_dir() {
        return Err(ClawstatError::Config(format!(
            "workspace root {} is not a directory",
            root.display()
        )));
    }

    fs::read_dir(root).map_err(|e| {
        ClawstatError::Config(format!(
            "workspace root {} is not readable: {e}",
            root.display()
        ))
    })?;

    Ok(())
}

fn read_session(session: &SessionDir) -> SessionOutcome {
    let path = session.transcript_path();

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Session {} has no transcript", session.id);
            return SessionOutcome::NoTranscript;
        }
        Err(e) => {
            return SessionOutcome::Skipped(ScanWarning::new(
                session.id.clone(),
                path,
                WarningKind::Unreadable(e.to_string()),
            ));
        }
    };

    let messages = match parse_transcript(&content) {
        Ok(messages) => messages,
        Err(e) => {
            return SessionOutcome::Skipped(ScanWarning::new(
                session.id.clone(),
                path,
                WarningKind::Malformed(e.to_string()),
            ));
        }
    };

    if transcript_total(&messages).is_none() {
        return SessionOutcome::Skipped(ScanWarning::new(
            session.id.clone(),
            path,
            WarningKind::Malformed("token counts overflow a 64-bit total".to_string()),
        ));
    }

    let modified = fs::metadata(&path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from);

    SessionOutcome::Loaded(SessionTranscript {
        session_id: session.id.clone(),
        path,
        messages,
        modified,
    })
}

fn collect_outcomes(
    outcomes: Vec<SessionOutcome>,
    mut warnings: Vec<ScanWarning>,
) -> WorkspaceScan {
    let mut sessions = Vec::new();

    for outcome in outcomes {
        match outcome {
            SessionOutcome::NoTranscript => {}
            SessionOutcome::Loaded(transcript) => sessions.push(transcript),
            SessionOutcome::Skipped(warning) => {
                warn!("Skipping session: {}", warning);
                warnings.push(warning);
            }
        }
    }

    info!(
        "Loaded {} session transcripts ({} skipped)",
        sessions.len(),
        warnings.len()
    );

    WorkspaceScan { sessions, warnings }
}
