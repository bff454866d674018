//! CLI interface for clawstat
//!
//! This module defines the command-line interface using clap. Every global
//! flag that configures the scan can also come from the environment, so the
//! same binary works from a shell and from a service unit.
//!
//! # Example
//!
//! ```bash
//! # Usage report for the workspace in $OPENCLAW_WORKSPACE
//! clawstat
//!
//! # Same report as JSON, reading transcripts in parallel
//! clawstat usage --json --parallel
//!
//! # Only sub-agent sessions, with a custom rate
//! clawstat --rate 0.000002 sessions --subagents
//!
//! # Serve the report over HTTP
//! clawstat serve --port 8080
//! ```

use crate::cost_calculator::TokenRate;
use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Token usage statistics for agent workspaces
#[derive(Parser, Debug, Clone)]
#[command(name = "clawstat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Workspace root containing the `sessions/` directory (defaults to the current directory)
    #[arg(long, short = 'W', global = true, env = "OPENCLAW_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Estimated cost per token
    #[arg(
        long,
        global = true,
        env = "CLAWSTAT_TOKEN_RATE",
        default_value_t = TokenRate::default(),
        value_parser = parse_rate
    )]
    pub rate: TokenRate,

    /// Show informational output (default is quiet mode with only warnings and errors)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// List the sessions that were skipped during the scan
    #[arg(long, global = true)]
    pub show_warnings: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Workspace token usage report (default)
    Usage {
        /// Read transcripts in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Per-session usage breakdown
    Sessions {
        /// Only list sub-agent sessions
        #[arg(long)]
        subagents: bool,
    },

    /// Serve the usage report over HTTP
    Serve {
        /// Port to listen on
        #[arg(long, short = 'p', env = "PORT", default_value_t = 3000)]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,

        /// Read transcripts on the request thread instead of the rayon pool
        #[arg(long)]
        sequential: bool,
    },
}

impl Cli {
    /// The command to run, with `usage` as the default
    pub fn command_or_default(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Usage { parallel: false })
    }
}

/// Parse a per-token rate argument
pub fn parse_rate(s: &str) -> std::result::Result<TokenRate, String> {
    s.parse::<TokenRate>().map_err(|e| e.to_string())
}
