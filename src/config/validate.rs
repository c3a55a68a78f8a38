// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TeststreamError};
use crate::session::command::{LOGGER_PLACEHOLDER, PORT_PLACEHOLDER};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::TeststreamError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.watch, raw.logger))
    }
}

pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_directories(cfg)?;
    validate_command(cfg)?;
    validate_logger(cfg)?;
    Ok(())
}

fn ensure_has_directories(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.directories.is_empty() {
        return Err(TeststreamError::ConfigError(
            "[watch].directories must list at least one directory".to_string(),
        ));
    }

    let mut seen = std::collections::HashSet::new();
    for dir in cfg.watch.directories.iter() {
        if !seen.insert(dir) {
            return Err(TeststreamError::ConfigError(format!(
                "directory '{}' is listed more than once in [watch].directories",
                dir.display()
            )));
        }
    }
    Ok(())
}

fn validate_command(cfg: &RawConfigFile) -> Result<()> {
    let command = cfg.watch.command.trim();
    if command.is_empty() {
        return Err(TeststreamError::ConfigError(
            "[watch].command must not be empty".to_string(),
        ));
    }

    // Without the port the runner has no way to report back.
    if !command.contains(PORT_PLACEHOLDER) && !command.contains(LOGGER_PLACEHOLDER) {
        return Err(TeststreamError::ConfigError(format!(
            "[watch].command must contain {PORT_PLACEHOLDER} or {LOGGER_PLACEHOLDER}"
        )));
    }
    Ok(())
}

fn validate_logger(cfg: &RawConfigFile) -> Result<()> {
    let name = cfg.logger.name.trim();
    if name.is_empty() || name.contains(';') || name.contains('=') {
        return Err(TeststreamError::ConfigError(format!(
            "[logger].name must be non-empty and contain neither ';' nor '=' (got '{}')",
            cfg.logger.name
        )));
    }

    if cfg.logger.debounce_ms == Some(0) {
        return Err(TeststreamError::ConfigError(
            "[logger].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
