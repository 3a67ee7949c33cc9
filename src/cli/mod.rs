//! CLI module: command parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.

pub mod config;
pub mod pack;
pub mod vendor;
pub mod watch;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "muster")]
#[command(version)]
#[command(about = "Watch sources, fan out reconcile events, pack source trees")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a directory and print change events as JSON lines
    Watch {
        /// Directory to watch (recursively)
        dir: PathBuf,
        /// Service name attached to events (defaults to the directory name)
        #[arg(long)]
        service: Option<String>,
        /// Version attached to events
        #[arg(long)]
        version: Option<String>,
        /// Expand every event over the configured platform services
        #[arg(long)]
        fanout: bool,
    },
    /// Pack a source directory into a tar archive
    Pack {
        /// Source directory
        dir: PathBuf,
        /// Output archive file
        #[arg(short, long)]
        output: PathBuf,
        /// Vendor dependencies before packing
        #[arg(long)]
        vendor: bool,
    },
    /// Unpack an archive into a directory
    Unpack {
        /// Archive file produced by `pack`
        file: PathBuf,
        /// Destination directory (created if missing)
        dest: PathBuf,
    },
    /// Vendor dependencies of a source directory
    Vendor {
        /// Source directory
        dir: PathBuf,
    },
    /// Show or validate configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration (file + environment overrides)
    Show,
    /// Check configuration for errors and warnings
    Check,
}

/// Main CLI entry point.
pub async fn run() -> Result<()> {
    // Logging settings come from config; fall back to defaults if the file is
    // missing or invalid so `config check` can still report the problem.
    let logging_cfg = muster::config::Config::load()
        .map(|c| c.logging)
        .unwrap_or_default();
    if let Err(e) = muster::utils::logging::init_logging(&logging_cfg) {
        eprintln!("Warning: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
        }
        Some(Commands::Watch {
            dir,
            service,
            version,
            fanout,
        }) => {
            watch::cmd_watch(dir, service, version, fanout).await?;
        }
        Some(Commands::Pack {
            dir,
            output,
            vendor,
        }) => {
            pack::cmd_pack(dir, output, vendor).await?;
        }
        Some(Commands::Unpack { file, dest }) => {
            pack::cmd_unpack(file, dest).await?;
        }
        Some(Commands::Vendor { dir }) => {
            vendor::cmd_vendor(dir).await?;
        }
        Some(Commands::Config { action }) => {
            config::cmd_config(action).await?;
        }
    }

    Ok(())
}
