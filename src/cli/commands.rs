//! CLI commands and argument parsing

use crate::types::Method;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Motorcycle shop admin API client
#[derive(Parser, Debug)]
#[command(name = "moto-admin-http")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Client configuration file (YAML); the environment is used otherwise
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Bearer token, overriding any configured token file
    #[arg(long, global = true, env = "API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Verbose output: debug logging and the full error JSON on failure
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log level; `RUST_LOG` directives still apply on top
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one request and print the JSON response
    Request {
        /// HTTP method
        method: Method,

        /// Path relative to the base URL, or an absolute URL
        path: String,

        /// Query parameter (key=value), repeatable
        #[arg(short, long = "query", value_parser = parse_key_val)]
        query: Vec<(String, String)>,

        /// Header (key=value), repeatable
        #[arg(short = 'H', long = "header", value_parser = parse_key_val)]
        headers: Vec<(String, String)>,

        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,

        /// Override the retry budget
        #[arg(long)]
        max_retries: Option<u32>,

        /// Override the base backoff delay
        #[arg(long)]
        retry_delay_ms: Option<u64>,

        /// Do not report the error on failure
        #[arg(long)]
        quiet: bool,
    },

    /// Print the resolved client configuration
    Config,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
