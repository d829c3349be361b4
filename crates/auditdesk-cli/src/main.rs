use anyhow::Context;
use auditdesk_config::AuditDeskConfig;
use clap::Parser;

mod cli;
mod commands;
mod context;
mod output;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("auditdesk error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags()?;
    let config = AuditDeskConfig::load_with_dotenv().context("failed to load configuration")?;
    let ctx = context::AppContext::init(&config, flags.actor())
        .await
        .context("failed to initialize auditdesk")?;

    let result = commands::dispatch::dispatch(cli.command, &ctx, &flags).await;

    // Buffered edits must reach the database before the process exits.
    let report = ctx.store.flush_all().await;
    for failed in &report.failed {
        tracing::error!(item_id = %failed.item_id, error = %failed.error, "edit was not saved");
    }
    result?;
    if !report.is_clean() {
        anyhow::bail!("{} item edit(s) could not be saved", report.failed.len());
    }
    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("AUDITDESK_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
