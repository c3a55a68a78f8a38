// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `teststream`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "teststream",
    version,
    about = "Stream test results from test runner processes to a watching host.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TESTSTREAM_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the test runner for every configured directory and report results.
    Watch(WatchArgs),

    /// Runner side: forward newline-delimited JSON test events to a host.
    Report(ReportArgs),
}

#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Teststream.toml")]
    pub config: String,

    /// Parse + validate, print sessions, but don't start anything.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
    /// Logger argument as handed out by the host, e.g. `TestStream;port=53127`.
    #[arg(long, value_name = "LOGGER")]
    pub logger: String,

    /// Read events from this file instead of stdin.
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,
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
