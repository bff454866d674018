//! clawstat - Token usage statistics for agent workspaces
//!
//! This library provides functionality to:
//! - Scan the session transcripts of an agent workspace
//! - Aggregate token usage in total, per model, and per session
//! - Estimate cost with a linear per-token rate
//! - Generate reports in table and JSON formats
//! - Serve the report over HTTP for the status dashboard
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
//! #[tokio::main]
//! async fn main() -> clawstat::Result<()> {
//!     let data_loader = DataLoader::from_env()?;
//!     let aggregator = Aggregator::new(CostCalculator::default());
//!
//!     // Stream usage entries and fold them into a report
//!     let report = aggregator
//!         .aggregate_report(data_loader.load_usage_entries())
//!         .await?;
//!
//!     println!("{} tokens", report.total);
//!     Ok(())
//! }
//! ```

pub mod aggregation;
pub mod cli;
pub mod output;
pub mod server;

// Re-export the workspace crates under their module names
pub use clawstat_core::{diagnostics, error, types};
pub use clawstat_pricing::cost_calculator;
pub use clawstat_provider_workspace::data_loader;

// Re-export commonly used types
pub use aggregation::{SessionUsage, UsageReport};
pub use error::{ClawstatError, Result};
pub use types::{ModelName, SessionId, TokenCounts};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
