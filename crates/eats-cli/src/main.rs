//! EATS CLI: the `eats` command.

mod cli;
mod commands;
mod config;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "EATS_LOG";

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let ctx = support::context_or_exit(&cli.config, cli.store.as_deref());

    match cli.command {
        Commands::Init { json } => commands::init::run(&ctx, json),

        Commands::Language { command } => commands::language::run(&ctx, command),

        Commands::Script { command } => commands::script::run(&ctx, command),

        Commands::Authority { command } => commands::authority::run(&ctx, command),

        Commands::Entity { command } => commands::entity::run(&ctx, command),

        Commands::Name { command } => commands::name::run(&ctx, command),

        Commands::Lookup {
            query,
            entity_types,
            preferences,
            json,
        } => commands::lookup::run(&ctx, query, entity_types, preferences, json),

        Commands::Forms {
            name,
            language,
            script,
            json,
        } => commands::forms::run(name, language, script, json),

        Commands::Reindex { json } => commands::reindex::run(&ctx, json),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
