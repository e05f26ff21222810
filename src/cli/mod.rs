//! CLI module for Tubechat.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Tubechat - Ask questions about YouTube videos
///
/// Fetches a video's transcript, indexes it, and answers questions using
/// only what was said in the video.
#[derive(Parser, Debug)]
#[command(name = "tubechat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log level for the `tubechat` target. `-v` flags win over the configured level.
    pub fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        match self.verbose {
            0 => configured,
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web UI
    Serve {
        /// Host to bind to (defaults to server.host from config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port from config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Process a video and start an interactive question session
    Chat {
        /// YouTube URL or video ID (prompted for if omitted)
        url: Option<String>,
    },

    /// Ask a single question about a video
    Ask {
        /// YouTube URL or video ID
        url: String,

        /// The question to ask
        question: String,

        /// Number of transcript chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Chat model to use for the answer
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Fetch and print a video's transcript
    Transcript {
        /// YouTube URL or video ID
        url: String,

        /// Write the transcript to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Print the chunks that would be indexed instead of the full text
        #[arg(long)]
        chunks: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration (secrets redacted)
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
