// tests/classify_batch.rs

use teststream::protocol::{Message, ResultMessage, TestOutcome};
use teststream::session::{BatchSignals, classify_batch};

fn result(name: &str, outcome: TestOutcome) -> ResultMessage {
    ResultMessage::new(name, outcome)
}

#[test]
fn full_run_in_one_batch() {
    let signals = classify_batch(vec![
        Message::RunStarted,
        Message::Result(result("A", TestOutcome::Passed)),
        Message::Result(result("B", TestOutcome::Failed)),
        Message::RunComplete,
    ]);

    assert_eq!(
        signals,
        BatchSignals {
            started: true,
            discovered: vec![],
            results: vec![result("A", TestOutcome::Passed), result("B", TestOutcome::Failed)],
            ended: true,
        }
    );
}

#[test]
fn results_only_batch_has_no_start_or_end() {
    let signals = classify_batch(vec![Message::Result(result("A", TestOutcome::Skipped))]);
    assert!(!signals.started);
    assert!(!signals.ended);
    assert_eq!(signals.results.len(), 1);
}

#[test]
fn discovery_lists_are_concatenated() {
    let signals = classify_batch(vec![
        Message::Discovery {
            discovered: vec!["A".to_string(), "B".to_string()],
        },
        Message::Discovery {
            discovered: vec!["C".to_string()],
        },
    ]);
    assert_eq!(signals.discovered, vec!["A", "B", "C"]);
    assert!(signals.results.is_empty());
}
