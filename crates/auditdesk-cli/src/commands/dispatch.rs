use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(
    command: Commands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Import(args) => commands::import::handle(&args, ctx, flags).await,
        Commands::Show(args) => commands::show::handle(&args, ctx, flags).await,
        Commands::Stats(args) => commands::stats::handle(&args, ctx, flags).await,
        Commands::Set(args) => commands::set::handle(&args, ctx, flags).await,
        Commands::Attach(args) => commands::evidence::handle_attach(&args, ctx, flags).await,
        Commands::Detach(args) => commands::evidence::handle_detach(&args, ctx, flags).await,
        Commands::Submit(args) => commands::submit::handle(&args, ctx, flags).await,
        Commands::Latest => commands::latest::handle(ctx, flags).await,
        Commands::Activity(args) => commands::activity::handle(&args, ctx, flags).await,
    }
}
