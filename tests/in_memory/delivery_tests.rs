//! Delivery flows through the public messaging facade.

use super::helpers::{Fixture, agent, agent_type, fixture, register_all};
use rstest::rstest;
use serde_json::json;
use switchyard::message::domain::{Message, MessageContent, MessagePriority, MessageType};

#[rstest]
#[tokio::test]
async fn analyst_sends_task_to_pm_and_pm_acknowledges(fixture: Fixture) {
    let Fixture { hub, .. } = fixture;
    register_all(&hub, &[("a1", "analyst"), ("a2", "pm")]).await;

    let sent = hub
        .send(
            Message::builder(agent("a1"), agent("a2"), MessageType::TaskRequest)
                .with_priority(MessagePriority::High)
                .with_field("task", "create_prd"),
        )
        .await
        .expect("send succeeds");

    let inbox = hub.fetch(&agent("a2"), None).await.expect("fetch succeeds");
    let [received] = inbox.as_slice() else {
        panic!("expected exactly one message, got {}", inbox.len());
    };
    assert_eq!(received.id(), sent);
    assert_eq!(received.content().get("task"), Some(&json!("create_prd")));
    assert_eq!(received.priority(), MessagePriority::High);

    hub.acknowledge(sent, &agent("a2"))
        .await
        .expect("acknowledge succeeds");

    assert!(
        hub.fetch(&agent("a2"), None)
            .await
            .expect("fetch")
            .is_empty()
    );
    let stored = hub
        .get_message(sent)
        .await
        .expect("lookup succeeds")
        .expect("payload survives acknowledgement");
    assert!(stored.is_acknowledged());
    assert!(stored.is_delivered());
}

#[rstest]
#[tokio::test]
async fn inbox_is_ordered_by_priority_then_recency(fixture: Fixture) {
    let Fixture { hub, clock } = fixture;
    register_all(&hub, &[("a1", "analyst"), ("a2", "pm")]).await;

    let mut sent = Vec::new();
    for priority in [
        MessagePriority::Low,
        MessagePriority::Critical,
        MessagePriority::Normal,
        MessagePriority::Critical,
    ] {
        clock.advance(std::time::Duration::from_secs(1));
        let id = hub
            .send(
                Message::builder(agent("a1"), agent("a2"), MessageType::DataShare)
                    .with_priority(priority),
            )
            .await
            .expect("send succeeds");
        sent.push(id);
    }

    let order: Vec<_> = hub
        .fetch(&agent("a2"), None)
        .await
        .expect("fetch succeeds")
        .iter()
        .map(Message::id)
        .collect();

    let expected: Vec<_> = [3_usize, 1, 2, 0]
        .iter()
        .filter_map(|index| sent.get(*index).copied())
        .collect();
    assert_eq!(order, expected);
}

#[rstest]
#[tokio::test]
async fn broadcast_reaches_every_peer_of_the_type(fixture: Fixture) {
    let Fixture { hub, .. } = fixture;
    register_all(
        &hub,
        &[("pm-1", "pm"), ("pm-2", "pm"), ("pm-3", "pm"), ("qa-1", "qa")],
    )
    .await;

    let mut content = MessageContent::new();
    content.insert("release".to_owned(), json!("1.2"));
    let ids = hub
        .broadcast(
            &agent("pm-1"),
            &agent_type("pm"),
            MessageType::Coordination,
            MessagePriority::Normal,
            content,
        )
        .await
        .expect("broadcast succeeds");

    assert_eq!(ids.len(), 2);
    for peer in ["pm-2", "pm-3"] {
        let inbox = hub.fetch(&agent(peer), None).await.expect("fetch succeeds");
        assert_eq!(inbox.len(), 1, "{peer} should receive one copy");
    }
    assert!(
        hub.fetch(&agent("pm-1"), None)
            .await
            .expect("fetch")
            .is_empty()
    );
    assert!(
        hub.fetch(&agent("qa-1"), None)
            .await
            .expect("fetch")
            .is_empty()
    );
}

#[rstest]
#[tokio::test]
async fn reply_is_correlated_and_routed_to_reply_target(fixture: Fixture) {
    let Fixture { hub, .. } = fixture;
    let agents = [("a1", "analyst"), ("a2", "pm"), ("a3", "qa")];
    register_all(&hub, &agents).await;

    let request_id = hub
        .send(
            Message::builder(agent("a1"), agent("a2"), MessageType::TaskRequest)
                .with_reply_to(agent("a3")),
        )
        .await
        .expect("send succeeds");
    let request = hub
        .get_message(request_id)
        .await
        .expect("lookup succeeds")
        .expect("request stored");

    let mut content = MessageContent::new();
    content.insert("result".to_owned(), json!("done"));
    hub.reply(&request, &agent("a2"), content)
        .await
        .expect("reply succeeds");

    let replies = hub
        .fetch(&agent("a3"), Some(MessageType::TaskResponse))
        .await
        .expect("fetch succeeds");
    let [reply] = replies.as_slice() else {
        panic!("expected one reply, got {}", replies.len());
    };
    assert_eq!(
        reply.correlation_id(),
        Some(request_id.to_string().as_str())
    );
    assert_eq!(reply.sender_id(), &agent("a2"));
    assert!(
        hub.fetch(&agent("a1"), None)
            .await
            .expect("fetch")
            .is_empty()
    );
}

#[rstest]
#[tokio::test]
async fn repeated_acknowledgement_is_harmless(fixture: Fixture) {
    let Fixture { hub, .. } = fixture;
    register_all(&hub, &[("a1", "analyst"), ("a2", "pm")]).await;
    let sent = hub
        .send(Message::builder(agent("a1"), agent("a2"), MessageType::StatusUpdate))
        .await
        .expect("send succeeds");

    for _ in 0..3 {
        hub.acknowledge(sent, &agent("a2"))
            .await
            .expect("acknowledge is idempotent");
    }

    assert!(
        hub.fetch(&agent("a2"), None)
            .await
            .expect("fetch")
            .is_empty()
    );
}
