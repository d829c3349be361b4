use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Environment variable consulted when `--user` is not given.
pub const USER_ENV: &str = "AUDITDESK_USER";

/// Top-level CLI parser for the `auditdesk` binary.
#[derive(Debug, Parser)]
#[command(name = "auditdesk", version, about = "AuditDesk - checklist audits from spreadsheets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Acting user id (falls back to AUDITDESK_USER)
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Output format: json, table
    #[arg(short, long, global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Extract global flags, resolving the acting user.
    ///
    /// # Errors
    ///
    /// Fails when no user is given on the command line or in the environment.
    pub fn global_flags(&self) -> anyhow::Result<GlobalFlags> {
        let user = resolve_user(self.user.as_deref(), std::env::var(USER_ENV).ok())?;
        Ok(GlobalFlags {
            format: self.format,
            user,
            quiet: self.quiet,
        })
    }
}

fn resolve_user(flag: Option<&str>, env: Option<String>) -> anyhow::Result<String> {
    flag.map(str::to_string)
        .or(env)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| anyhow::anyhow!("no acting user: pass --user or set {USER_ENV}"))
}
