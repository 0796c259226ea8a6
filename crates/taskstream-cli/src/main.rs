//! Taskstream CLI
//!
//! Realtime task-list server.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "taskstream=debug,taskstream_web=debug,taskstream_db=debug,tower_http=debug"
    } else {
        "taskstream=info,taskstream_web=info,taskstream_db=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve(args) => commands::serve::execute(args).await,
    }
}
