// src/session/command.rs

use std::time::Duration;

use crate::runner::logger_arg;

pub const PORT_PLACEHOLDER: &str = "{port}";
pub const LOGGER_PLACEHOLDER: &str = "{logger}";

/// Command line used to start the test runner for a session.
///
/// `{port}` expands to the session's listener port; `{logger}` expands to a
/// full logger argument such as `TestStream;port=53127;debounce_ms=100`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    template: String,
    logger_name: String,
    debounce: Option<Duration>,
}

impl CommandTemplate {
    pub fn new(template: impl Into<String>, logger_name: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            logger_name: logger_name.into(),
            debounce: None,
        }
    }

    pub fn with_debounce(mut self, debounce: Option<Duration>) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn render(&self, port: u16) -> String {
        let logger = logger_arg(&self.logger_name, port, self.debounce);
        self.template
            .replace(LOGGER_PLACEHOLDER, &logger)
            .replace(PORT_PLACEHOLDER, &port.to_string())
    }
}
