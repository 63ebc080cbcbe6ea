// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! NOTE: this expects `clap` to be built with the `derive` feature, e.g.:
//! `clap = { version = "4.5.53", features = ["derive"] }` in `Cargo.toml`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `lakedag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "lakedag",
    version,
    about = "Validate notebook pipeline definitions and register them with a workflow scheduler.",
    long_about = None
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Directory containing pipeline definition files (TOML).
    /// Defaults to `pipelines`.
    #[arg(long, value_name = "PATH", global = true)]
    pub dir: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LAKEDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Parse and validate every definition in the directory.
    Validate,

    /// Print each pipeline's submission waves without contacting the
    /// scheduler.
    Plan,

    /// Register (upsert) every definition with the scheduler.
    ///
    /// A bearer token is read from the `LAKEDAG_TOKEN` environment variable
    /// when set.
    Register {
        /// Base URL of the scheduler, e.g. http://localhost:8080.
        #[arg(long, value_name = "URL")]
        scheduler: String,
    },

    /// Start a run of one registered pipeline now.
    ///
    /// A bearer token is read from the `LAKEDAG_TOKEN` environment variable
    /// when set.
    Trigger {
        /// Name the pipeline was registered under.
        name: String,

        /// Base URL of the scheduler, e.g. http://localhost:8080.
        #[arg(long, value_name = "URL")]
        scheduler: String,

        /// Poll the run until it reaches a terminal state.
        #[arg(long)]
        watch: bool,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
