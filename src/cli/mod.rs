//! CLI module for listsync.
//!
//! This module provides the command-line interface for merging orderings
//! and reconciling configured lists.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat, StateCommands};
pub use output::OutputFormatter;
