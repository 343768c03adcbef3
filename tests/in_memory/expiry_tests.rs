//! Message and agent lifetimes observed through a manual clock.

use std::time::Duration;

use super::helpers::{Fixture, MESSAGE_TTL, agent, fixture, register_all};
use chrono::TimeDelta;
use mockable::Clock;
use rstest::rstest;
use switchyard::agent_registry::domain::AgentStatus;
use switchyard::message::domain::{Message, MessageType};

#[rstest]
#[tokio::test]
async fn message_past_its_expiry_is_never_returned(fixture: Fixture) {
    let Fixture { hub, clock } = fixture;
    register_all(&hub, &[("a1", "analyst"), ("a2", "pm")]).await;
    let expires_at = clock.utc() + TimeDelta::seconds(30);
    let sent = hub
        .send(
            Message::builder(agent("a1"), agent("a2"), MessageType::DataShare)
                .with_expires_at(expires_at),
        )
        .await
        .expect("send succeeds");

    clock.advance(Duration::from_secs(45));

    assert!(
        hub.fetch(&agent("a2"), None)
            .await
            .expect("fetch")
            .is_empty()
    );
    assert!(hub.get_message(sent).await.expect("lookup").is_none());
}

#[rstest]
#[tokio::test]
async fn default_lifetime_keeps_message_until_ttl(fixture: Fixture) {
    let Fixture { hub, clock } = fixture;
    register_all(&hub, &[("a1", "analyst"), ("a2", "pm")]).await;
    let sent = hub
        .send(Message::builder(agent("a1"), agent("a2"), MessageType::DataShare))
        .await
        .expect("send succeeds");

    clock.advance(MESSAGE_TTL - Duration::from_secs(1));
    assert!(hub.get_message(sent).await.expect("lookup").is_some());

    clock.advance(Duration::from_secs(2));
    assert!(hub.get_message(sent).await.expect("lookup").is_none());
}

#[rstest]
#[tokio::test]
async fn purge_removes_expired_entries_for_known_agents(fixture: Fixture) {
    let Fixture { hub, clock } = fixture;
    register_all(&hub, &[("a1", "analyst"), ("a2", "pm")]).await;
    let soon = clock.utc() + TimeDelta::seconds(10);
    for _ in 0..2 {
        hub.send(
            Message::builder(agent("a1"), agent("a2"), MessageType::StatusUpdate)
                .with_expires_at(soon),
        )
        .await
        .expect("send succeeds");
    }
    hub.send(Message::builder(agent("a1"), agent("a2"), MessageType::StatusUpdate))
        .await
        .expect("send succeeds");

    clock.advance(Duration::from_secs(20));

    assert_eq!(hub.purge_expired().await.expect("purge succeeds"), 2);
    assert_eq!(
        hub.fetch(&agent("a2"), None).await.expect("fetch").len(),
        1
    );
}

#[rstest]
#[tokio::test]
async fn silent_agent_drops_out_of_discovery(fixture: Fixture) {
    let Fixture { hub, clock } = fixture;
    register_all(&hub, &[("a1", "analyst"), ("a2", "pm")]).await;

    clock.advance(Duration::from_secs(1800));
    hub.heartbeat(&agent("a1"), AgentStatus::Online)
        .await
        .expect("heartbeat succeeds");
    clock.advance(MESSAGE_TTL - Duration::from_secs(1799));

    let online: Vec<_> = hub
        .registry()
        .online_agents()
        .await
        .expect("online agents")
        .into_iter()
        .map(|id| id.to_string())
        .collect();
    assert_eq!(online, vec!["a1".to_owned()]);
}
