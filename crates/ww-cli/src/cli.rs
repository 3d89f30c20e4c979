//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Multi-timer work tracker.
///
/// Tracks time across named, mutually exclusive timers. Whatever is not
/// tracked against a timer is counted as idle time.
#[derive(Debug, Parser)]
#[command(name = "ww", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start an interactive tracking session.
    Run {
        /// Continue from the last saved timers instead of the configured defaults.
        #[arg(long)]
        resume: bool,
    },

    /// Show the last saved timers.
    Show {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}
