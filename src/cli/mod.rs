//! CLI module for Earshot.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Earshot - ask a generative model about an audio clip
///
/// Serves a small upload page, or runs a single clip from the command line.
#[derive(Parser, Debug)]
#[command(name = "earshot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one local audio file through the model
    Summarize {
        /// Path to the audio file
        file: String,

        /// Question to ask about the audio
        #[arg(short, long)]
        prompt: Option<String>,

        /// Print the model's Markdown instead of rendered HTML
        #[arg(long)]
        raw: bool,
    },

    /// Check configuration and environment
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
