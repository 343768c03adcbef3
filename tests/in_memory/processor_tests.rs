//! Background processing driven through the facade.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::helpers::{Fixture, agent, fixture, register_all};
use rstest::rstest;
use switchyard::config::ProcessorConfig;
use switchyard::message::domain::{Message, MessageId, MessagePriority, MessageType};
use switchyard::messaging::handler::handler_fn;
use switchyard::messaging::processor::ProcessorMetrics;

#[rstest]
#[tokio::test]
async fn handlers_see_critical_messages_before_routine_ones(fixture: Fixture) {
    let Fixture { hub, .. } = fixture;
    register_all(&hub, &[("a1", "analyst"), ("a2", "pm")]).await;

    let seen: Arc<Mutex<Vec<MessageId>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    hub.register_handler(
        MessageType::TaskRequest,
        handler_fn(move |message: Message| {
            let inner = Arc::clone(&sink);
            async move {
                inner.lock().expect("lock").push(message.id());
                Ok(())
            }
        }),
    )
    .await;

    let routine = hub
        .send(Message::builder(agent("a1"), agent("a2"), MessageType::TaskRequest))
        .await
        .expect("send succeeds");
    let urgent = hub
        .send(
            Message::builder(agent("a1"), agent("a2"), MessageType::TaskRequest)
                .with_priority(MessagePriority::Critical),
        )
        .await
        .expect("send succeeds");

    let processor = hub.processor(ProcessorConfig::default());
    let metrics = ProcessorMetrics::new();
    processor
        .dispatcher()
        .run_cycle(&metrics)
        .await
        .expect("cycle succeeds");

    assert_eq!(
        seen.lock().expect("lock").clone(),
        vec![urgent, routine],
        "critical pass runs first and each message is dispatched once"
    );
    assert_eq!(metrics.snapshot().dispatched, 2);
    assert_eq!(hub.status().await.critical_backlog, 0);
}

#[rstest]
#[tokio::test]
async fn started_processor_delivers_and_stops_cleanly(fixture: Fixture) {
    let Fixture { hub, .. } = fixture;
    register_all(&hub, &[("a1", "analyst"), ("a2", "pm")]).await;
    let sent = hub
        .send(Message::builder(agent("a1"), agent("a2"), MessageType::Coordination))
        .await
        .expect("send succeeds");

    let processor = hub.processor(
        ProcessorConfig::default().with_poll_interval(Duration::from_millis(5)),
    );
    processor.start().await.expect("processor starts");
    tokio::time::sleep(Duration::from_millis(50)).await;
    let snapshot = processor.stop().await.expect("processor stops");

    assert!(snapshot.cycles >= 1);
    let stored = hub
        .get_message(sent)
        .await
        .expect("lookup")
        .expect("message still stored");
    assert!(stored.is_delivered());
    assert!(!stored.is_acknowledged());
}
