// src/report.rs

//! `teststream report`: runner-side bridge for frameworks that can emit
//! newline-delimited JSON but cannot host the logger in-process.
//!
//! Each input line is one framework event:
//!
//! ```json
//! {"event":"runStart"}
//! {"event":"discovered","tests":[{"fullyQualifiedName":"Ns.Class.Method"}]}
//! {"event":"result","testCase":{"fullyQualifiedName":"Ns.Class.Method"},"outcome":"Passed"}
//! {"event":"runComplete"}
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::cli::ReportArgs;
use crate::protocol::TestCase;
use crate::runner::{LoggerConfig, RunnerLogger, TestCaseResult};

/// One line of `report` input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum RunnerEvent {
    RunStart,
    Discovered { tests: Vec<TestCase> },
    #[serde(rename = "result")]
    TestResult(TestCaseResult),
    RunComplete,
    DiscoveryComplete,
}

/// Counts reported back to the caller of [`feed_events`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    pub forwarded: usize,
    pub skipped: usize,
}

pub async fn run_report(args: ReportArgs) -> Result<()> {
    let config = LoggerConfig::from_logger_arg(&args.logger)?;
    let logger = RunnerLogger::start(config);

    let summary = match args.input {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("opening event input {path:?}"))?;
            feed_events(BufReader::new(file), &logger).await?
        }
        None => feed_events(BufReader::new(tokio::io::stdin()), &logger).await?,
    };

    info!(
        forwarded = summary.forwarded,
        skipped = summary.skipped,
        "report finished"
    );
    Ok(())
}

/// Forward events from `reader` to `logger` until a completion event or EOF,
/// then flush.
///
/// Malformed lines are logged and skipped. Anything after `runComplete` /
/// `discoveryComplete` is ignored because the logger has already flushed.
pub async fn feed_events<R>(reader: R, logger: &RunnerLogger) -> Result<FeedSummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = FeedSummary::default();
    let mut lines = reader.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await.context("reading event input")? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event: RunnerEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(err) => {
                warn!(line = line_no, error = %err, "skipping malformed runner event");
                summary.skipped += 1;
                continue;
            }
        };

        summary.forwarded += 1;
        match event {
            RunnerEvent::RunStart => logger.on_test_run_start(),
            RunnerEvent::Discovered { tests } => logger.on_discovered_tests(&tests),
            RunnerEvent::TestResult(result) => logger.on_test_result(&result),
            RunnerEvent::RunComplete => {
                logger.on_test_run_complete().await;
                return Ok(summary);
            }
            RunnerEvent::DiscoveryComplete => {
                logger.on_discovery_complete().await;
                return Ok(summary);
            }
        }
    }

    debug!("event input ended without a completion event; flushing");
    logger.flush().await;
    Ok(summary)
}
