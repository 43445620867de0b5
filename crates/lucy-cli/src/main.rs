//! lucy: interactive companion agent with a persisted bond
//!
//! Chats on stdin/stdout, tracks an emotional bond across sessions and
//! self-updates on a timer.

mod repl;

use anyhow::{Context, Result};
use bond_core::{BondConfig, ConfigFile};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "lucy")]
#[command(about = "Interactive companion agent with a persisted bond", version)]
struct Cli {
    /// Name Lucy calls you (overrides config)
    #[arg(short, long, env = "LUCY_USER_NAME")]
    name: Option<String>,

    /// Path of the memory file (overrides config)
    #[arg(short, long, env = "LUCY_MEMORY_FILE")]
    memory_file: Option<PathBuf>,

    /// Seconds between self-updates (overrides config)
    #[arg(long)]
    interval: Option<u64>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a default config file
    InitConfig,
}

impl Cli {
    /// Layer command-line overrides on top of the loaded config
    fn apply(&self, mut config: BondConfig) -> BondConfig {
        if let Some(ref name) = self.name {
            config = config.with_user_name(name.clone());
        }
        if let Some(ref path) = self.memory_file {
            config = config.with_memory_file(path.clone());
        }
        if let Some(secs) = self.interval {
            config = config.with_update_interval(secs);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let default_filter = if cli.verbose {
        "lucy_cli=debug,bond_core=debug"
    } else {
        "lucy_cli=info,bond_core=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Some(Commands::InitConfig) => init_config(),
        None => {
            let config = BondConfig::load().unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load config, using defaults");
                BondConfig::default()
            });
            repl::run(cli.apply(config)).await
        }
    }
}

fn init_config() -> Result<()> {
    let path = ConfigFile::config_path().context("Could not determine config directory")?;
    ConfigFile::create_default(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    println!("Created config: {}", path.display());
    Ok(())
}
