//! Aggregation module for summarizing usage data
//!
//! This module folds usage entries into a [`UsageReport`] (workspace-wide
//! totals and per-model buckets) and into per-session [`SessionUsage`]
//! summaries.
//!
//! Every aggregation builds its own [`UsageAccumulator`]; nothing is shared
//! between calls. Each model bucket receives exactly the increments of the
//! messages attributed to that model, so bucket values do not depend on the
//! order sessions or messages are visited, and they always sum to the total.
//!
//! # Examples
//!
//! ```no_run
//! use clawstat::{
//!     aggregation::Aggregator,
//!     cost_calculator::CostCalculator,
//!     data_loader::DataLoader,
//! };
//!
//! # async fn example() -> clawstat::Result<()> {
//! let loader = DataLoader::new("/srv/openclaw/workspace")?;
//! let aggregator = Aggregator::new(CostCalculator::default());
//!
//! let (report, warnings) = aggregator.scan_report(&loader, true).await?;
//! println!("{} tokens, ${:.4}", report.total, report.estimated_cost);
//! # Ok(())
//! # }
//! ```

use crate::cost_calculator::CostCalculator;
use crate::data_loader::{DataLoader, SessionTranscript, WorkspaceScan};
use crate::diagnostics::ScanWarning;
use crate::error::Result;
use crate::types::{ModelName, SessionId, SessionKind, TokenCounts, UsageEntry};
use chrono::{DateTime, Utc};
use futures::stream::{Stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Workspace-wide token usage summary
///
/// Serializes with the field names the status page consumes:
///
/// ```json
/// { "total": 150, "byModel": { "m1": 150 }, "estimatedCost": 0.0015 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    /// Sum of prompt and completion tokens over all messages with usage
    pub total: u64,
    /// Tokens per model; values sum to `total`
    pub by_model: BTreeMap<ModelName, u64>,
    /// `total` multiplied by the configured per-token rate
    pub estimated_cost: f64,
}

/// Per-session usage summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUsage {
    pub session_id: SessionId,
    pub kind: SessionKind,
    /// Short display name (sub-agent label or the session ID)
    pub label: String,
    /// Number of messages in the transcript, with or without usage
    pub messages: usize,
    pub tokens: TokenCounts,
    pub by_model: BTreeMap<ModelName, u64>,
    pub estimated_cost: f64,
    /// Transcript modification time
    pub last_activity: Option<DateTime<Utc>>,
}

/// Totals across a set of session summaries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Totals {
    pub tokens: TokenCounts,
    pub estimated_cost: f64,
}

impl Totals {
    pub fn from_sessions(sessions: &[SessionUsage]) -> Self {
        let mut totals = Self::default();
        for session in sessions {
            totals.tokens += session.tokens;
            totals.estimated_cost += session.estimated_cost;
        }
        totals
    }
}

/// Locally scoped token counters
///
/// `merge` is commutative and associative, so accumulators built on
/// separate threads can be combined in any order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageAccumulator {
    tokens: TokenCounts,
    by_model: BTreeMap<ModelName, u64>,
}

impl UsageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one message's contribution to the total and to its model bucket
    pub fn add_entry(&mut self, entry: &UsageEntry) {
        self.tokens += entry.tokens;
        let bucket = self.by_model.entry(entry.model.clone()).or_insert(0);
        *bucket = bucket.saturating_add(entry.tokens.total());
    }

    /// Combine two accumulators
    pub fn merge(mut self, other: Self) -> Self {
        self.tokens += other.tokens;
        for (model, tokens) in other.by_model {
            let bucket = self.by_model.entry(model).or_insert(0);
            *bucket = bucket.saturating_add(tokens);
        }
        self
    }

    /// Fold every entry of a transcript
    pub fn from_transcript(transcript: &SessionTranscript) -> Self {
        let mut acc = Self::new();
        for entry in transcript.entries() {
            acc.add_entry(&entry);
        }
        acc
    }

    pub fn tokens(&self) -> TokenCounts {
        self.tokens
    }

    pub fn total(&self) -> u64 {
        self.tokens.total()
    }

    pub fn by_model(&self) -> &BTreeMap<ModelName, u64> {
        &self.by_model
    }

    /// Finish into a report, pricing the total with `cost_calculator`
    pub fn into_report(self, cost_calculator: &CostCalculator) -> UsageReport {
        let total = self.total();
        UsageReport {
            total,
            by_model: self.by_model,
            estimated_cost: cost_calculator.calculate_cost(total),
        }
    }
}

/// Main aggregation engine
pub struct Aggregator {
    cost_calculator: CostCalculator,
    show_progress: bool,
}

impl Aggregator {
    /// Create a new aggregator
    pub fn new(cost_calculator: CostCalculator) -> Self {
        Self {
            cost_calculator,
            show_progress: false,
        }
    }

    /// Enable or disable progress display
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn cost_calculator(&self) -> &CostCalculator {
        &self.cost_calculator
    }

    /// Aggregate a stream of usage entries into a report
    ///
    /// # Errors
    ///
    /// Propagates the first error yielded by the stream
    pub async fn aggregate_report(
        &self,
        entries: impl Stream<Item = Result<UsageEntry>>,
    ) -> Result<UsageReport> {
        let progress = if self.show_progress {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed_precise}] {pos} entries processed")
            {
                pb.set_style(style);
            }
            pb.set_message("Aggregating token usage");
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            Some(pb)
        } else {
            None
        };

        let mut acc = UsageAccumulator::new();
        let mut count = 0u64;

        tokio::pin!(entries);
        while let Some(result) = entries.next().await {
            let entry = result?;
            acc.add_entry(&entry);

            count += 1;
            if let Some(ref pb) = progress {
                pb.set_position(count);
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        debug!("Aggregated {} usage entries", count);
        Ok(acc.into_report(&self.cost_calculator))
    }

    /// Aggregate a completed scan on the current thread
    pub fn aggregate_scan(&self, scan: &WorkspaceScan) -> UsageReport {
        let mut acc = UsageAccumulator::new();
        for entry in scan.entries() {
            acc.add_entry(&entry);
        }
        acc.into_report(&self.cost_calculator)
    }

    /// Aggregate a completed scan with one accumulator per session
    ///
    /// Session accumulators are built on the rayon pool and combined with a
    /// single `merge` reduction.
    pub fn aggregate_parallel(&self, scan: &WorkspaceScan) -> UsageReport {
        scan.sessions
            .par_iter()
            .map(UsageAccumulator::from_transcript)
            .reduce(UsageAccumulator::new, UsageAccumulator::merge)
            .into_report(&self.cost_calculator)
    }

    /// Per-session summaries, largest first
    ///
    /// Sessions whose transcript has no usage are listed with zero tokens.
    pub fn aggregate_sessions(&self, scan: &WorkspaceScan) -> Vec<SessionUsage> {
        let mut sessions: Vec<SessionUsage> = scan
            .sessions
            .iter()
            .map(|transcript| {
                let acc = UsageAccumulator::from_transcript(transcript);
                let tokens = acc.tokens();
                SessionUsage {
                    session_id: transcript.session_id.clone(),
                    kind: transcript.session_id.kind(),
                    label: transcript.session_id.label().to_string(),
                    messages: transcript.messages.len(),
                    tokens,
                    estimated_cost: self.cost_calculator.calculate_cost(tokens.total()),
                    by_model: acc.by_model,
                    last_activity: transcript.modified,
                }
            })
            .collect();

        sessions.sort_by(|a, b| {
            b.tokens
                .total()
                .cmp(&a.tokens.total())
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        sessions
    }

    /// Scan a workspace and build its report
    ///
    /// Returns the report together with the warnings for sessions that were
    /// skipped. Warnings are never part of the report itself.
    pub async fn scan_report(
        &self,
        loader: &DataLoader,
        parallel: bool,
    ) -> Result<(UsageReport, Vec<ScanWarning>)> {
        let scan = if parallel {
            loader.scan_parallel().await?
        } else {
            loader.scan().await?
        };

        let report = if parallel {
            self.aggregate_parallel(&scan)
        } else {
            self.aggregate_scan(&scan)
        };

        Ok((report, scan.warnings))
    }
}
