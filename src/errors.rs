// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TeststreamError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid logger parameter '{key}': {reason}")]
    InvalidLoggerParameter { key: String, reason: String },

    #[error("Failed to bind results listener: {0}")]
    Bind(#[source] std::io::Error),

    #[error("Listener error: {0}")]
    Listener(String),

    #[error("Failed to spawn process '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TeststreamError>;
