//! clawstat - Token usage statistics for agent workspaces

use clawstat::{
    aggregation::{Aggregator, Totals},
    cli::{Cli, Command},
    cost_calculator::CostCalculator,
    data_loader::DataLoader,
    diagnostics::ScanWarning,
    error::Result,
    output::{OutputFormatter, get_formatter},
    server::{self, ServerState},
    types::SessionKind,
};
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(cli: &Cli, command: &Command) {
    // RUST_LOG wins; otherwise stay quiet unless asked or serving
    let default_filter = if cli.verbose {
        "clawstat=debug,clawstat_provider_workspace=debug,clawstat_pricing=info"
    } else if matches!(command, Command::Serve { .. }) {
        "clawstat=info,clawstat_provider_workspace=info"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    // Logs go to stderr so JSON on stdout stays parseable
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_warnings(
    formatter: &dyn OutputFormatter,
    warnings: &[ScanWarning],
    show: bool,
) -> Result<()> {
    if show && !warnings.is_empty() {
        eprintln!("{}", formatter.format_warnings(warnings)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command_or_default();
    init_logging(&cli, &command);

    let root = DataLoader::resolve_root(cli.workspace.clone());
    let cost_calculator = CostCalculator::new(cli.rate);
    let show_progress = !cli.json && is_terminal::is_terminal(std::io::stdout());
    let formatter = get_formatter(cli.json);

    match command {
        Command::Usage { parallel } => {
            info!("Running usage report for {}", root.display());

            let data_loader = DataLoader::new(&root)?.with_progress(show_progress);
            let aggregator = Aggregator::new(cost_calculator);
            let (report, warnings) = aggregator.scan_report(&data_loader, parallel).await?;

            println!("{}", formatter.format_report(&report)?);
            print_warnings(formatter.as_ref(), &warnings, cli.show_warnings)?;
        }

        Command::Sessions { subagents } => {
            info!("Running session usage report for {}", root.display());

            let data_loader = DataLoader::new(&root)?.with_progress(show_progress);
            let scan = data_loader.scan().await?;

            let aggregator = Aggregator::new(cost_calculator);
            let mut sessions = aggregator.aggregate_sessions(&scan);
            if subagents {
                sessions.retain(|s| s.kind == SessionKind::Subagent);
            }
            let totals = Totals::from_sessions(&sessions);

            println!("{}", formatter.format_sessions(&sessions, &totals)?);
            print_warnings(formatter.as_ref(), &scan.warnings, cli.show_warnings)?;
        }

        Command::Serve {
            port,
            host,
            sequential,
        } => {
            // Fail fast on a bad root; requests revalidate on every scan
            DataLoader::new(&root)?;

            let state = ServerState::new(root, cost_calculator).with_parallel(!sequential);
            server::run(state, SocketAddr::new(host, port)).await?;
        }
    }

    Ok(())
}
