// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::session::{CommandTemplate, StaticTestDirectories};

pub const DEFAULT_COMMAND: &str = "dotnet watch test --verbosity:quiet --logger \"{logger}\"";
pub const DEFAULT_LOGGER_NAME: &str = "TestStream";

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [watch]
/// directories = ["tests/Unit", "tests/Integration"]
/// command = "dotnet watch test --verbosity:quiet --logger \"{logger}\""
///
/// [logger]
/// name = "TestStream"
/// debounce_ms = 100
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub logger: LoggerSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Directories to run the test runner in, relative to the config file.
    #[serde(default)]
    pub directories: Vec<PathBuf>,

    /// Test runner command. Must contain `{port}` or `{logger}`.
    #[serde(default = "default_command")]
    pub command: String,
}

fn default_command() -> String {
    DEFAULT_COMMAND.to_string()
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            command: default_command(),
        }
    }
}

/// `[logger]` section: what the spawned runner's logger is told.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggerSection {
    /// Logger name the test runner knows the logger by.
    #[serde(default = "default_logger_name")]
    pub name: String,

    /// Debounce window passed to the runner; runner default if omitted.
    #[serde(default)]
    pub debounce_ms: Option<u64>,
}

fn default_logger_name() -> String {
    DEFAULT_LOGGER_NAME.to_string()
}

impl Default for LoggerSection {
    fn default() -> Self {
        Self {
            name: default_logger_name(),
            debounce_ms: None,
        }
    }
}

/// Validated configuration. Build via `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub watch: WatchSection,
    pub logger: LoggerSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(watch: WatchSection, logger: LoggerSection) -> Self {
        Self { watch, logger }
    }

    pub fn command_template(&self) -> CommandTemplate {
        CommandTemplate::new(&self.watch.command, &self.logger.name)
            .with_debounce(self.logger.debounce_ms.map(Duration::from_millis))
    }

    /// Watched directories, with relative entries resolved against `root`.
    pub fn test_directories(&self, root: &Path) -> StaticTestDirectories {
        StaticTestDirectories::new(self.watch.directories.iter().map(|dir| {
            if dir.is_absolute() {
                dir.clone()
            } else {
                root.join(dir)
            }
        }))
    }
}
