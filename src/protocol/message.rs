// src/protocol/message.rs

use serde::{Deserialize, Serialize};

/// One batch of messages, i.e. the payload of one connection.
pub type Batch = Vec<Message>;

/// A single event streamed from a test runner to the host.
///
/// The `type` field is the discriminator on the wire:
///
/// ```json
/// [
///   {"type":"testRunStarted"},
///   {"type":"result","fullName":"Ns.Class.Method","outcome":"Passed","message":null,"stackTrace":null},
///   {"type":"testRunComplete"}
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    #[serde(rename = "testRunStarted")]
    RunStarted,

    #[serde(rename = "discovery")]
    Discovery { discovered: Vec<String> },

    #[serde(rename = "result")]
    Result(ResultMessage),

    #[serde(rename = "testRunComplete")]
    RunComplete,
}

impl Message {
    /// Short label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::RunStarted => "testRunStarted",
            Message::Discovery { .. } => "discovery",
            Message::Result(_) => "result",
            Message::RunComplete => "testRunComplete",
        }
    }
}

/// Outcome of a single test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestOutcome {
    None,
    Passed,
    Failed,
    Skipped,
    NotFound,
}

/// Result of a single test case.
///
/// `full_name` is the test identity (see [`crate::protocol::TestCase::identity`])
/// and is the key used to correlate results with discovered tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMessage {
    pub full_name: String,
    pub outcome: TestOutcome,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub stack_trace: Option<String>,
}

impl ResultMessage {
    pub fn new(full_name: impl Into<String>, outcome: TestOutcome) -> Self {
        Self {
            full_name: full_name.into(),
            outcome,
            message: None,
            stack_trace: None,
        }
    }
}

/// Encode a batch as the JSON array written to a connection.
pub fn encode_batch(messages: &[Message]) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(messages)
}

/// Decode the full payload of one connection.
pub fn decode_batch(bytes: &[u8]) -> serde_json::Result<Batch> {
    serde_json::from_slice(bytes)
}
