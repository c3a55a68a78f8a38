// tests/listener.rs

use teststream_test_utils::capture::BatchCapture;
use teststream_test_utils::init_tracing;

use std::collections::HashSet;
use std::error::Error;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use teststream::errors::TeststreamError;
use teststream::listener::ResultsListener;
use teststream::protocol::{Message, ResultMessage, TestOutcome};
use teststream::runner::transmit;

type TestResult = Result<(), Box<dyn Error>>;

async fn send_raw(port: u16, payload: &[u8]) -> TestResult {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await?;
    stream.write_all(payload).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Connecting keeps failing once the port is released.
async fn assert_port_released(port: u16) {
    for _ in 0..50 {
        if TcpStream::connect(("127.0.0.1", port)).await.is_err() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("port {port} still accepting connections after dispose");
}

#[tokio::test]
async fn batch_round_trips_with_content_and_order() -> TestResult {
    init_tracing();

    let mut capture = BatchCapture::start().await;
    let batch = vec![
        Message::RunStarted,
        Message::Result(ResultMessage::new("Ns.Class.Method", TestOutcome::Passed)),
        Message::RunComplete,
    ];

    transmit("127.0.0.1", capture.port(), &batch).await?;

    assert_eq!(capture.next_batch().await, batch);
    Ok(())
}

#[tokio::test]
async fn malformed_connection_does_not_affect_the_next_one() -> TestResult {
    init_tracing();

    let mut capture = BatchCapture::start().await;

    send_raw(capture.port(), b"[{\"type\":\"testRunStarted\"},").await?;
    send_raw(capture.port(), b"{\"type\":\"testRunStarted\"}").await?;
    send_raw(capture.port(), b"[{\"type\":\"unknownKind\"}]").await?;

    let good = vec![Message::Result(ResultMessage::new("Ns.Class.Ok", TestOutcome::Passed))];
    transmit("127.0.0.1", capture.port(), &good).await?;

    assert_eq!(capture.next_batch().await, good);
    assert!(
        capture
            .next_batch_within(Duration::from_millis(200))
            .await
            .is_none()
    );
    Ok(())
}

#[tokio::test]
async fn empty_connections_are_not_dispatched() -> TestResult {
    init_tracing();

    let mut capture = BatchCapture::start().await;

    send_raw(capture.port(), b"").await?;
    send_raw(capture.port(), b"[]").await?;
    transmit("127.0.0.1", capture.port(), &[Message::RunComplete]).await?;

    assert_eq!(capture.next_batch().await, vec![Message::RunComplete]);
    assert!(
        capture
            .next_batch_within(Duration::from_millis(200))
            .await
            .is_none()
    );
    Ok(())
}

#[tokio::test]
async fn concurrent_connections_are_all_dispatched() -> TestResult {
    init_tracing();

    let mut capture = BatchCapture::start().await;
    let port = capture.port();

    let mut sends = tokio::task::JoinSet::new();
    for i in 0..16 {
        sends.spawn(async move {
            let batch = vec![Message::Result(ResultMessage::new(
                format!("Ns.Class.Test{i}"),
                TestOutcome::Passed,
            ))];
            transmit("127.0.0.1", port, &batch).await
        });
    }
    while let Some(sent) = sends.join_next().await {
        sent??;
    }

    let mut names = HashSet::new();
    for _ in 0..16 {
        for message in capture.next_batch().await {
            if let Message::Result(r) = message {
                names.insert(r.full_name);
            }
        }
    }
    let expected: HashSet<String> = (0..16).map(|i| format!("Ns.Class.Test{i}")).collect();
    assert_eq!(names, expected);
    Ok(())
}

#[tokio::test]
async fn only_one_callback_can_be_registered() -> TestResult {
    let mut listener = ResultsListener::bind().await?;
    listener.on_messages(|_| {})?;

    match listener.on_messages(|_| {}) {
        Err(TeststreamError::Listener(msg)) => assert!(msg.contains("already registered")),
        other => panic!("expected Listener error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn dispose_releases_the_port() -> TestResult {
    init_tracing();

    let mut listener = ResultsListener::bind().await?;
    listener.on_messages(|_| {})?;
    let port = listener.port();

    listener.dispose();
    listener.dispose();
    assert!(listener.is_disposed());
    listener.close().await;

    assert_port_released(port).await;
    Ok(())
}

#[tokio::test]
async fn dispose_before_registration_releases_the_port() -> TestResult {
    let mut listener = ResultsListener::bind().await?;
    let port = listener.port();

    listener.dispose();
    assert!(listener.on_messages(|_| {}).is_err());

    assert_port_released(port).await;
    Ok(())
}
