// src/runner/config.rs

//! Runner-side logger parameters.
//!
//! The host passes the parameters on the test runner's command line as a
//! logger argument of the form `Name;port=53127;debounce_ms=100`. Only
//! `port` is required.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::errors::{Result, TeststreamError};

pub const PORT_KEY: &str = "port";
pub const HOST_KEY: &str = "host";
pub const DEBOUNCE_KEY: &str = "debounce_ms";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Where and how the sender loop delivers batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    pub host: String,
    pub port: u16,
    pub debounce: Duration,
}

impl LoggerConfig {
    pub fn new(port: u16) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Build the config from logger parameters.
    ///
    /// Fails if `port` is missing or not a valid port number, or if
    /// `debounce_ms` is present but not an integer. Unknown keys are ignored.
    pub fn from_parameters(params: &HashMap<String, String>) -> Result<Self> {
        let raw_port = params
            .get(PORT_KEY)
            .ok_or_else(|| invalid(PORT_KEY, "missing required parameter"))?;
        let port = parse_port(raw_port)?;

        let mut config = Self::new(port);

        if let Some(host) = params.get(HOST_KEY) {
            let host = host.trim();
            if host.is_empty() {
                return Err(invalid(HOST_KEY, "must not be empty"));
            }
            config.host = host.to_string();
        }

        if let Some(raw) = params.get(DEBOUNCE_KEY) {
            let millis: u64 = raw
                .trim()
                .parse()
                .map_err(|_| invalid(DEBOUNCE_KEY, &format!("expected milliseconds, got '{raw}'")))?;
            config.debounce = Duration::from_millis(millis);
        }

        for key in params.keys() {
            if ![PORT_KEY, HOST_KEY, DEBOUNCE_KEY].contains(&key.as_str()) {
                debug!(key = %key, "ignoring unknown logger parameter");
            }
        }

        Ok(config)
    }

    /// Parse a full logger argument (`Name;key=value;...`).
    pub fn from_logger_arg(arg: &str) -> Result<Self> {
        let (_name, params) = parse_logger_arg(arg)?;
        Self::from_parameters(&params)
    }
}

/// Split a logger argument into its name and key/value parameters.
///
/// The name is optional: `port=1234` parses with an empty name.
pub fn parse_logger_arg(arg: &str) -> Result<(String, HashMap<String, String>)> {
    let mut segments = arg.split(';').map(str::trim).filter(|s| !s.is_empty());
    let mut params = HashMap::new();

    let name = match segments.next() {
        Some(first) if !first.contains('=') => first.to_string(),
        Some(first) => {
            insert_pair(&mut params, first)?;
            String::new()
        }
        None => String::new(),
    };

    for segment in segments {
        insert_pair(&mut params, segment)?;
    }

    Ok((name, params))
}

/// Render the logger argument handed to a spawned test runner.
pub fn logger_arg(name: &str, port: u16, debounce: Option<Duration>) -> String {
    let mut arg = format!("{name};{PORT_KEY}={port}");
    if let Some(debounce) = debounce {
        arg.push_str(&format!(";{DEBOUNCE_KEY}={}", debounce.as_millis()));
    }
    arg
}

fn insert_pair(params: &mut HashMap<String, String>, segment: &str) -> Result<()> {
    let (key, value) = segment
        .split_once('=')
        .ok_or_else(|| invalid(segment, "expected key=value"))?;
    params.insert(key.trim().to_string(), value.trim().to_string());
    Ok(())
}

fn parse_port(raw: &str) -> Result<u16> {
    let port: u16 = raw
        .trim()
        .parse()
        .map_err(|_| invalid(PORT_KEY, &format!("expected an integer port, got '{raw}'")))?;
    if port == 0 {
        return Err(invalid(PORT_KEY, "port must be in 1..=65535"));
    }
    Ok(port)
}

fn invalid(key: &str, reason: &str) -> TeststreamError {
    TeststreamError::InvalidLoggerParameter {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
