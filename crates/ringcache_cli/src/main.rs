//! ringcache CLI
//!
//! Command-line tools for inspecting and writing ringcache files.
//!
//! # Commands
//!
//! - `inspect` - Display header fields and usage
//! - `dump` - Print stored messages, oldest first
//! - `verify` - Walk every frame and report corruption
//! - `append` - Append messages from arguments or stdin

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// ringcache command-line tools.
#[derive(Parser)]
#[command(name = "ringcache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the cache file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display header fields and usage
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print stored messages, oldest first
    Dump {
        /// Maximum number of messages to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, hex, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Stop at the physical end instead of wrapping
        #[arg(long)]
        forward_only: bool,
    },

    /// Walk every frame and report corruption
    Verify,

    /// Append messages (one per argument, or one per stdin line)
    Append {
        /// Cache capacity in bytes, header included
        #[arg(short, long, default_value_t = 1024 * 1024)]
        max_bytes: u64,

        /// Fail instead of evicting old messages when full
        #[arg(long)]
        no_overwrite: bool,

        /// Messages to append
        messages: Vec<String>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Cache path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Dump {
            limit,
            format,
            forward_only,
        } => {
            let path = cli.path.ok_or("Cache path required for dump")?;
            commands::dump::run(&path, limit, &format, forward_only)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Cache path required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Append {
            max_bytes,
            no_overwrite,
            messages,
        } => {
            let path = cli.path.ok_or("Cache path required for append")?;
            commands::append::run(&path, max_bytes, !no_overwrite, &messages)?;
        }
        Commands::Version => {
            println!("ringcache CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("ringcache core v{}", ringcache_core::VERSION);
        }
    }

    Ok(())
}
