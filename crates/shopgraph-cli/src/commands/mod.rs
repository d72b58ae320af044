//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod migrate;
pub mod serve;

/// Shopgraph - relational shop data to property graph migration
#[derive(Parser)]
#[command(name = "shopgraph")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Also append logs to this file
    #[arg(long, global = true, env = "SHOPGRAPH_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Migration settings used when no subcommand is given
    #[command(flatten)]
    pub migrate: migrate::MigrateArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full migration (the default)
    Migrate(migrate::MigrateArgs),

    /// Serve the liveness endpoint only
    Serve(serve::ServeArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Some(Commands::Migrate(args)) => migrate::execute(args).await,
            Some(Commands::Serve(args)) => serve::execute(args).await,
            None => migrate::execute(self.migrate).await,
        }
    }
}
