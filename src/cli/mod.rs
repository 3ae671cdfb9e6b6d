//! CLI module for Deskbot.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::helpdesk::FolderVisibility;
use clap::{Parser, Subcommand};

/// Deskbot - answers support questions from your Freshdesk knowledge base
///
/// Articles from the allowed solution categories are cached with embeddings;
/// questions are answered from the most relevant ones, with sources.
#[derive(Parser, Debug)]
#[command(name = "deskbot")]
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

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check environment and configuration
    Doctor,

    /// Refresh the knowledge base and answer one question
    Ask {
        /// The question to ask
        question: String,

        /// Number of articles to consider
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Refresh the knowledge base and show the most relevant articles
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "3")]
        limit: usize,
    },

    /// Rebuild the article cache and report what was ingested
    Refresh {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive chat session using `!` commands
    Chat,

    /// Start the HTTP server (keep-alive and JSON API)
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port or PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List helpdesk categories and folders
    Diagnose {
        /// Summarize the cached articles instead (refreshes first)
        #[arg(long)]
        cache: bool,
    },

    /// Look up a single article by ID
    CheckArticle {
        /// Article ID
        article_id: u64,
    },

    /// Set a folder's portal visibility
    Visibility {
        /// Folder ID (see `deskbot diagnose`)
        folder_id: u64,

        /// New visibility: all, logged_in, agents or companies
        #[arg(default_value = "logged_in")]
        level: FolderVisibility,
    },

    /// Show recently logged interactions
    History {
        /// Number of interactions to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

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

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "rag.model")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Show configuration file path
    Path,
}
