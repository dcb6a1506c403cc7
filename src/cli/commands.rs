//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// listsync - Keep locally ordered lists in step with a paginated REST API.
#[derive(Parser, Debug)]
#[command(name = "listsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true, env = "LISTSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge a remote ordering into a local one (JSON arrays of strings).
    Merge {
        /// File holding the local ordering.
        #[arg(long)]
        local: PathBuf,

        /// File holding the remote ordering.
        #[arg(long)]
        remote: PathBuf,
    },

    /// Fetch every page of a configured list and print its keys.
    Fetch {
        /// Name of the list to fetch.
        #[arg(short, long)]
        list: String,

        /// Override the page size for this fetch.
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Fetch, merge, and store configured lists.
    Reconcile {
        /// Only reconcile this list (defaults to all lists).
        #[arg(short, long)]
        list: Option<String>,
    },

    /// Check every configured list for changes without storing anything.
    Drift,

    /// Validate the configuration.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Inspect stored orderings.
    State {
        /// State subcommand.
        #[command(subcommand)]
        command: StateCommands,
    },
}

/// State management subcommands.
#[derive(Subcommand, Debug)]
pub enum StateCommands {
    /// Show stored orderings.
    Show {
        /// Only show this list, with its full ordering.
        #[arg(short, long)]
        list: Option<String>,
    },

    /// Delete the state file.
    Clear,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}
