//! CLI module
//!
//! Command-line interface for issuing requests through the dispatcher.
//!
//! # Commands
//!
//! - `request` - Send one request with retries; Ctrl-C cancels it
//! - `config` - Print the resolved client configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::{Runner, StderrNotifier};
