//! Web server command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, default_value = "3030")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Redis connection URL
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub redis_url: String,
}

pub async fn execute(args: ServeArgs) -> Result<()> {
    println!();
    println!("  {} {}", "Taskstream".cyan().bold(), "Server".bold());
    println!();
    println!("  {}        http://{}:{}/api/items", "API".green(), args.host, args.port);
    println!(
        "  {}  ws://{}:{}/ws/{{all,active,completed}}",
        "WebSocket".green(),
        args.host,
        args.port
    );
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    taskstream_web::run_server(&args.redis_url, &args.host, args.port).await
}
