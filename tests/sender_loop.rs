// tests/sender_loop.rs

use teststream_test_utils::capture::BatchCapture;
use teststream_test_utils::init_tracing;

use std::error::Error;
use std::time::{Duration, Instant};

use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::time::timeout;

use teststream::protocol::{Message, ResultMessage, TestOutcome, decode_batch};
use teststream::runner::{LoggerConfig, SenderLoop, batching_queue, run_ended};

type TestResult = Result<(), Box<dyn Error>>;

fn result(name: &str) -> Message {
    Message::Result(ResultMessage::new(name, TestOutcome::Passed))
}

#[tokio::test]
async fn burst_within_debounce_window_is_sent_as_one_batch() -> TestResult {
    init_tracing();

    let mut capture = BatchCapture::start().await;
    let (producer, consumer) = batching_queue();
    let (trigger, signal) = run_ended();

    let config = LoggerConfig::new(capture.port()).with_debounce(Duration::from_millis(200));
    let sender = SenderLoop::new(consumer, signal, config).spawn();

    let sent: Vec<Message> = (0..25).map(|i| result(&format!("Ns.Class.Test{i}"))).collect();
    for message in sent.iter().cloned() {
        producer.push(message);
    }

    let batch = capture.next_batch().await;
    assert_eq!(batch, sent, "all burst messages should arrive in one ordered batch");

    assert!(
        capture
            .next_batch_within(Duration::from_millis(400))
            .await
            .is_none(),
        "no second connection expected for a single burst"
    );

    trigger.settle();
    timeout(Duration::from_secs(2), sender).await??;
    Ok(())
}

#[tokio::test]
async fn run_ended_flushes_queue_without_waiting_for_debounce() -> TestResult {
    init_tracing();

    let mut capture = BatchCapture::start().await;
    let (producer, consumer) = batching_queue();
    let (trigger, signal) = run_ended();

    // A debounce far longer than the test timeout: the flush must cut it short.
    let config = LoggerConfig::new(capture.port()).with_debounce(Duration::from_secs(30));
    let sender = SenderLoop::new(consumer, signal, config).spawn();

    producer.push(Message::RunStarted);
    producer.push(result("Ns.Class.A"));
    producer.push(Message::RunComplete);
    trigger.settle();

    let started = Instant::now();
    timeout(Duration::from_secs(3), sender).await??;
    assert!(started.elapsed() < Duration::from_secs(3));

    let batch = capture.next_batch().await;
    assert_eq!(
        batch,
        vec![Message::RunStarted, result("Ns.Class.A"), Message::RunComplete]
    );
    Ok(())
}

#[tokio::test]
async fn run_ended_on_empty_queue_sends_nothing_and_terminates() -> TestResult {
    init_tracing();

    let mut capture = BatchCapture::start().await;
    let (_producer, consumer) = batching_queue::<Message>();
    let (trigger, signal) = run_ended();

    let sender = SenderLoop::new(consumer, signal, LoggerConfig::new(capture.port())).spawn();
    trigger.settle();

    timeout(Duration::from_secs(2), sender).await??;
    assert!(
        capture
            .next_batch_within(Duration::from_millis(300))
            .await
            .is_none()
    );
    Ok(())
}

#[tokio::test]
async fn single_message_is_delivered_as_a_singleton_batch() -> TestResult {
    init_tracing();

    let mut capture = BatchCapture::start().await;
    let (producer, consumer) = batching_queue();
    let (trigger, signal) = run_ended();

    let config = LoggerConfig::new(capture.port()).with_debounce(Duration::from_millis(20));
    let sender = SenderLoop::new(consumer, signal, config).spawn();

    producer.push(Message::RunStarted);
    assert_eq!(capture.next_batch().await, vec![Message::RunStarted]);

    trigger.settle();
    timeout(Duration::from_secs(2), sender).await??;
    Ok(())
}

#[tokio::test]
async fn dropping_every_producer_terminates_the_loop_after_draining() -> TestResult {
    init_tracing();

    let mut capture = BatchCapture::start().await;
    let (producer, consumer) = batching_queue();
    let (_trigger, signal) = run_ended();

    let config = LoggerConfig::new(capture.port()).with_debounce(Duration::from_millis(20));
    let sender = SenderLoop::new(consumer, signal, config).spawn();

    producer.push(result("Ns.Class.Last"));
    drop(producer);

    assert_eq!(capture.next_batch().await, vec![result("Ns.Class.Last")]);
    timeout(Duration::from_secs(2), sender).await??;
    Ok(())
}

#[tokio::test]
async fn failed_send_is_discarded_and_later_batches_still_go_out() -> TestResult {
    init_tracing();

    // Reserve a port, then free it so the first send is refused.
    let port = {
        let probe = std::net::TcpListener::bind("127.0.0.1:0")?;
        probe.local_addr()?.port()
    };

    let (producer, consumer) = batching_queue();
    let (trigger, signal) = run_ended();
    let config = LoggerConfig::new(port).with_debounce(Duration::from_millis(20));
    let sender = SenderLoop::new(consumer, signal, config).spawn();

    producer.push(result("Ns.Class.Lost"));
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!sender.is_finished(), "a refused connection must not stop the loop");

    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    producer.push(result("Ns.Class.Delivered"));
    trigger.settle();

    let (mut stream, _) = timeout(Duration::from_secs(3), listener.accept()).await??;
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes).await?;
    assert_eq!(decode_batch(&bytes)?, vec![result("Ns.Class.Delivered")]);

    timeout(Duration::from_secs(2), sender).await??;
    Ok(())
}
