//! Command-line interface definition using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ward Assist - ask questions about hospital equipment, staff and locations
#[derive(Parser, Debug)]
#[command(name = "ward")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to state directory
    #[arg(short, long, env = "WARD_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start an interactive conversation (default)
    Chat,

    /// Ask a single question and print the answer
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Run the HTTP API
    Serve {
        /// Host to bind to (default: WARD_API_HOST or 127.0.0.1)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (default: WARD_API_PORT or 8780)
        #[arg(short, long)]
        port: Option<u16>,

        /// Disable the speech endpoint
        #[arg(long)]
        no_speech: bool,
    },
}

impl Cli {
    /// Returns the state directory path, using default if not specified.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(ward_core::state_dir)
    }

    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
