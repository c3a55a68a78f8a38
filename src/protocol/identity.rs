// src/protocol/identity.rs

use serde::{Deserialize, Serialize};

/// Property id that marks a test case whose display name is its identity.
///
/// xUnit theories share one fully-qualified name across data rows, so the
/// display name is the only string that tells them apart.
pub const DISPLAY_NAME_PROPERTY: &str = "XunitTestCase";

/// A test case as reported by the test framework.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub fully_qualified_name: String,
    #[serde(default)]
    pub display_name: String,
    /// Ids of the properties attached to the test case.
    #[serde(default)]
    pub properties: Vec<String>,
}

impl TestCase {
    pub fn new(fully_qualified_name: impl Into<String>) -> Self {
        Self {
            fully_qualified_name: fully_qualified_name.into(),
            ..Self::default()
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_property(mut self, id: impl Into<String>) -> Self {
        self.properties.push(id.into());
        self
    }

    /// Identity used on the wire for both discovery and results.
    ///
    /// Both paths must go through this function; any divergence silently
    /// breaks result correlation on the host.
    pub fn identity(&self) -> &str {
        if self.properties.iter().any(|p| p == DISPLAY_NAME_PROPERTY) {
            &self.display_name
        } else {
            &self.fully_qualified_name
        }
    }
}
