//! # Stratum CLI Module
//!
//! ## Available Commands
//!
//! - `serve` - Boot the coordinator and serve the HTTP API
//! - `status` - Boot, then show counts and sync status
//! - `flush` - Boot, then flush to the durable tier
//! - `export` - Write the database blob to a file
//! - `import` - Replace the database with a blob file and flush
//! - `query` - Run a graph query script

mod commands;

use crate::config::StratumConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stratum_core::StratumError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Stratum - tiered storage sync and hydration coordinator
#[derive(Parser, Debug)]
#[command(name = "stratum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory (overrides config and STRATUM_DATA_DIR)
    #[arg(short = 'D', long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Disable the boot cache
    #[arg(long, global = true)]
    pub no_boot_cache: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Show record counts and sync status
    Status,

    /// Flush pending changes to the durable tier
    Flush,

    /// Export the database blob
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Replace the database with a previously exported blob
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Run a graph query script
    Query {
        /// Script name (entity, entities, neighbors, traverse, path, folder, folders, children, stats)
        #[arg(short, long)]
        script: String,

        /// Params as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,
    },
}

impl Cli {
    /// Resolve the configuration: file, then environment, then flags.
    pub fn resolve_config(&self) -> Result<StratumConfig, StratumError> {
        let mut config = StratumConfig::load(self.config.as_deref())?;
        if let Some(dir) = &self.data_dir {
            config.data_dir.clone_from(dir);
        }
        if self.no_boot_cache {
            config.boot_cache = false;
        }
        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), StratumError> {
    let config = cli.resolve_config()?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Serve { host, port }) => cmd_serve(&config, &host, port).await,
        Some(Commands::Status) => cmd_status(&config, json_mode).await,
        Some(Commands::Flush) => cmd_flush(&config, json_mode).await,
        Some(Commands::Export { output }) => cmd_export(&config, &output).await,
        Some(Commands::Import { input }) => cmd_import(&config, json_mode, &input).await,
        Some(Commands::Query { script, params }) => {
            cmd_query(&config, json_mode, &script, &params).await
        }
        // No subcommand - show status by default
        None => cmd_status(&config, json_mode).await,
    }
}
