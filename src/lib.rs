// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod listener;
pub mod logging;
pub mod protocol;
pub mod report;
pub mod runner;
pub mod session;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::{CliArgs, Command, WatchArgs};
use crate::config::{ConfigFile, config_root_dir, load_and_validate};
use crate::exec::ShellProcessSpawner;
use crate::session::{LoggingObserver, TestDirectories, WatchObserver, WatchOrchestrator};

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Watch(watch) => run_watch(watch).await,
        Command::Report(report) => report::run_report(report).await,
    }
}

/// Host side. This wires together:
/// - config loading
/// - one watch session per configured directory
/// - Ctrl-C handling (stops every session)
async fn run_watch(args: WatchArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config {config_path:?}"))?;
    let root = config_root_dir(&config_path);

    if args.dry_run {
        print_dry_run(&cfg, &root);
        return Ok(());
    }

    let orchestrator = WatchOrchestrator::new(
        Arc::new(ShellProcessSpawner::new()),
        Arc::new(cfg.test_directories(&root)),
        cfg.command_template(),
    );

    let observer: Arc<dyn WatchObserver> = Arc::new(LoggingObserver);
    orchestrator.start_watch(observer).await?;

    info!("watching; press Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("listening for Ctrl+C")?;

    info!("shutdown requested; stopping watch sessions");
    orchestrator.stop().await;
    Ok(())
}

/// Simple dry-run output: print directories and the command each would run.
fn print_dry_run(cfg: &ConfigFile, root: &Path) {
    let template = cfg.command_template();

    println!("teststream dry-run");
    println!("  command = {}", template.template());
    println!("  logger.name = {}", cfg.logger.name);
    if let Some(ms) = cfg.logger.debounce_ms {
        println!("  logger.debounce_ms = {ms}");
    }
    println!();

    let dirs = cfg.test_directories(root).test_directories();
    println!("directories ({}):", dirs.len());
    for dir in dirs {
        println!("  - {}", dir.display());
        // Port 0 stands in for the port assigned at start.
        println!("      cmd: {}", template.render(0));
    }

    debug!("dry-run complete (nothing started)");
}
