use clap::Parser;
use kekvault::cli::{commands, output, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    // Diagnostics go to stderr so `kekvault read` output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Write {
            ref name,
            ref value,
            ref actor,
        } => commands::write::execute(&cli, name, value.as_deref(), actor),
        Commands::Read {
            ref name,
            version,
            ref actor,
        } => commands::read::execute(&cli, name, version, actor),
        Commands::History { ref name } => commands::history::execute(&cli, name),
        Commands::List => commands::list::execute(&cli),
        Commands::Rotate => commands::rotate::execute(&cli),
        Commands::Audit { last, ref since } => {
            commands::audit_cmd::execute(&cli, last, since.as_deref())
        }
        Commands::PruneAudit { days } => commands::prune_audit::execute(&cli, days),
        Commands::Completions { shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
