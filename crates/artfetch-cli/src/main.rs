//! CLI entry point - the composition root.
//!
//! This is the only place where infrastructure is wired together: the HTTP
//! client, the terminal progress reporter, and the tracing subscriber are
//! all constructed here and injected downward. Command dispatch routes to
//! handlers which delegate to the library crates.

mod commands;
mod handlers;
mod progress;

use clap::Parser;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Fetch(args) => handlers::fetch::run(args).await,
        Commands::Convert(args) => handlers::convert::run(args).await,
        Commands::Probe(args) => handlers::probe::run(&args),
    }
}
