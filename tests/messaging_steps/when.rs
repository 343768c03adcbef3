//! When steps for messaging BDD scenarios.

use std::time::Duration;

use super::world::{MessagingWorld, agent_id, agent_type, run_async};
use chrono::TimeDelta;
use eyre::WrapErr;
use mockable::Clock;
use rstest_bdd_macros::when;
use switchyard::agent_registry::domain::AgentStatus;
use switchyard::message::domain::{Message, MessageContent, MessagePriority, MessageType};

fn message_type(raw: &str) -> Result<MessageType, eyre::Report> {
    MessageType::try_from(raw).map_err(|err| eyre::eyre!("{err}"))
}

#[when(r#""{sender}" sends a "{priority}" "{kind}" to "{receiver}""#)]
fn sends_message(
    world: &mut MessagingWorld,
    sender: String,
    priority: String,
    kind: String,
    receiver: String,
) -> Result<(), eyre::Report> {
    let level = MessagePriority::try_from(priority.as_str())
        .map_err(|err| eyre::eyre!("{err}"))?;
    let sender_id = agent_id(&sender)?;
    let receiver_id = agent_id(&receiver)?;
    let message_kind = message_type(&kind)?;
    let draft = Message::builder(sender_id, receiver_id, message_kind)
        .with_priority(level);
    run_async(world.hub.send(draft)).wrap_err("send message")?;
    Ok(())
}

#[when(r#""{sender}" sends "{receiver}" a "{kind}" that expires in {seconds:i64} seconds"#)]
fn sends_short_lived_message(
    world: &mut MessagingWorld,
    sender: String,
    receiver: String,
    kind: String,
    seconds: i64,
) -> Result<(), eyre::Report> {
    let expires_at = world.clock.utc() + TimeDelta::seconds(seconds);
    let sender_id = agent_id(&sender)?;
    let receiver_id = agent_id(&receiver)?;
    let message_kind = message_type(&kind)?;
    let draft = Message::builder(sender_id, receiver_id, message_kind)
        .with_expires_at(expires_at);
    run_async(world.hub.send(draft))
        .wrap_err("send short-lived message")?;
    Ok(())
}

#[when(r#""{sender}" broadcasts a "{kind}" to type "{target}""#)]
fn broadcasts(
    world: &mut MessagingWorld,
    sender: String,
    kind: String,
    target: String,
) -> Result<(), eyre::Report> {
    let ids = run_async(world.hub.broadcast(
        &agent_id(&sender)?,
        &agent_type(&target)?,
        message_type(&kind)?,
        MessagePriority::Normal,
        MessageContent::new(),
    ))
    .wrap_err("broadcast message")?;
    world.last_broadcast = Some(ids);
    Ok(())
}

#[when(r#""{receiver}" acknowledges every pending message"#)]
fn acknowledges_all(world: &mut MessagingWorld, receiver: String) -> Result<(), eyre::Report> {
    let agent = agent_id(&receiver)?;
    let pending = run_async(world.hub.fetch(&agent, None))
        .wrap_err("fetch before ack")?;
    for message in pending {
        run_async(world.hub.acknowledge(message.id(), &agent))
            .wrap_err("acknowledge")?;
    }
    Ok(())
}

#[when("{seconds:u64} seconds pass")]
fn seconds_pass(world: &mut MessagingWorld, seconds: u64) {
    world.clock.advance(Duration::from_secs(seconds));
}

#[when(r#""{id}" reports an "{status}" heartbeat"#)]
fn reports_heartbeat(
    world: &mut MessagingWorld,
    id: String,
    status: String,
) -> Result<(), eyre::Report> {
    let reported = AgentStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("{err}"))?;
    let agent = agent_id(&id)?;
    world.last_error = run_async(world.hub.heartbeat(&agent, reported)).err();
    Ok(())
}
