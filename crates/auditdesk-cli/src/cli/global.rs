use auditdesk_core::identity::Actor;
use clap::ValueEnum;

/// Shared output mode across all commands.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

/// Global flags available before or after subcommands.
#[derive(Clone, Debug)]
pub struct GlobalFlags {
    pub format: OutputFormat,
    pub user: String,
    pub quiet: bool,
}

impl GlobalFlags {
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor::new(self.user.clone())
    }
}
