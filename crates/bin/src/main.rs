use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;
mod path;

use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so that stdout stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("palimpsest=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format;

    match &cli.command {
        Commands::FromJson(args) => commands::from_json::run(args, format),
        Commands::Dump(args) => commands::dump::run(args, format),
        Commands::Info(args) => commands::info::run(args, format),
        Commands::Set(args) => commands::edit::set(args, format),
        Commands::Remove(args) => commands::edit::remove(args, format),
    }
}
