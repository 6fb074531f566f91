use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use panscan_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod commands;

/// Extract identifier and name fields from annotated identity-card images.
#[derive(Parser, Debug)]
#[command(name = "panscan", version)]
struct Cli {
    /// Config file (default: ./panscan.toml, then the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run OCR over an image/annotation dataset and export a CSV
    Extract(commands::ExtractArgs),
    /// Generate an idempotent SQL seed script from an extracted CSV
    SeedSql(commands::SeedSqlArgs),
    /// Upsert an extracted CSV into the remote table
    SeedRemote(commands::SeedRemoteArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Extract(args) => commands::extract(config, args).await,
        Command::SeedSql(args) => commands::seed_sql(config, args),
        Command::SeedRemote(args) => commands::seed_remote(config, args).await,
    }
}
