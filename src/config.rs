//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;

use crate::state::DEFAULT_GOAL_MINUTES;

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "chrono-goal")]
#[command(about = "A state-managed HTTP server for goal-driven focus timing")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "7425")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Goal duration in minutes
    #[arg(short, long, default_value_t = DEFAULT_GOAL_MINUTES)]
    pub goal: u64,

    /// Directory holding persisted state (defaults to the platform data dir)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
