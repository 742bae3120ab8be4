//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the exporter.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// What Got Done export - dump one user's journal data.
#[derive(Parser, Debug)]
#[command(name = "whatgotdone-export")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file (defaults to ~/.whatgotdone-export/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Journal database, overriding the configured one.
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export all of a user's data as JSON.
    Export {
        /// User to export.
        username: String,

        /// Output file path (stdout if not specified).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Package a user's published entries as a zip of Markdown files.
    Archive {
        /// User to export.
        username: String,

        /// Directory to write the archive into.
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },

    /// Show what an export of a user would contain.
    Summary {
        /// User to summarize.
        username: String,
    },

    /// Create the default configuration file if missing and print its path.
    Config,
}
