//! The `ai` command-line interface.
//!
//! This module provides:
//! - Flag parsing via `arrrg` ([`AiArgs`])
//! - Subcommand parsing over the remaining free arguments ([`parse_command`])
//! - Table rendering for model and session listings
//! - The [`App`] that runs a parsed command

mod app;
mod args;
mod commands;
mod table;

pub use app::{App, CONFIG_FILE, HISTORY_DIR};
pub use args::{ADD_DEFAULT_MAX_TOKENS, AiArgs, HOME_DIR_NAME, HOME_ENV};
pub use commands::{Command, help_text, parse_command};
pub use table::{Align, Column, Table, mask_api_key, model_table, session_table, truncate};
