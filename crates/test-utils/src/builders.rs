#![allow(dead_code)]

use std::path::PathBuf;

use teststream::config::{ConfigFile, LoggerSection, RawConfigFile, WatchSection};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                watch: WatchSection::default(),
                logger: LoggerSection::default(),
            },
        }
    }

    pub fn with_directory(mut self, dir: &str) -> Self {
        self.config.watch.directories.push(PathBuf::from(dir));
        self
    }

    pub fn with_command(mut self, command: &str) -> Self {
        self.config.watch.command = command.to_string();
        self
    }

    pub fn with_logger_name(mut self, name: &str) -> Self {
        self.config.logger.name = name.to_string();
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.config.logger.debounce_ms = Some(ms);
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
