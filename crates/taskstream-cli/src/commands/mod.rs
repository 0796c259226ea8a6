//! CLI command definitions and handlers.

use clap::{Parser, Subcommand};

pub mod serve;

/// Taskstream - realtime task list
#[derive(Parser)]
#[command(name = "taskstream")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web and realtime server
    Serve(serve::ServeArgs),
}
