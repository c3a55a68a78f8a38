// tests/protocol_wire.rs

use std::error::Error;

use serde_json::json;

use teststream::protocol::{
    DISPLAY_NAME_PROPERTY, Message, ResultMessage, TestCase, TestOutcome, decode_batch, encode_batch,
};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn messages_use_the_type_discriminator() -> TestResult {
    let batch = vec![
        Message::RunStarted,
        Message::Discovery {
            discovered: vec!["Ns.Class.A".to_string()],
        },
        Message::Result(ResultMessage::new("Ns.Class.A", TestOutcome::NotFound)),
        Message::RunComplete,
    ];

    let value: serde_json::Value = serde_json::from_slice(&encode_batch(&batch)?)?;
    assert_eq!(
        value,
        json!([
            {"type": "testRunStarted"},
            {"type": "discovery", "discovered": ["Ns.Class.A"]},
            {"type": "result", "fullName": "Ns.Class.A", "outcome": "NotFound", "message": null, "stackTrace": null},
            {"type": "testRunComplete"}
        ])
    );
    Ok(())
}

#[test]
fn result_optional_fields_may_be_omitted() -> TestResult {
    let batch = decode_batch(br#"[{"type":"result","fullName":"Ns.Class.A","outcome":"Failed","message":"boom"}]"#)?;
    assert_eq!(
        batch,
        vec![Message::Result(ResultMessage {
            full_name: "Ns.Class.A".to_string(),
            outcome: TestOutcome::Failed,
            message: Some("boom".to_string()),
            stack_trace: None,
        })]
    );
    Ok(())
}

#[test]
fn unknown_outcome_is_a_decode_error() {
    let bad = br#"[{"type":"result","fullName":"Ns.Class.A","outcome":"Maybe"}]"#;
    assert!(decode_batch(bad).is_err());
}

#[test]
fn identity_prefers_display_name_only_with_marker() {
    let marked = TestCase::new("Ns.Class.Theory")
        .with_display_name("Ns.Class.Theory(a: 2)")
        .with_property("TestCategory")
        .with_property(DISPLAY_NAME_PROPERTY);
    assert_eq!(marked.identity(), "Ns.Class.Theory(a: 2)");

    let unmarked = TestCase::new("Ns.Class.Fact")
        .with_display_name("Fact")
        .with_property("TestCategory");
    assert_eq!(unmarked.identity(), "Ns.Class.Fact");
}
