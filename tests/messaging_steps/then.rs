//! Then steps for messaging BDD scenarios.

use super::world::{MessagingWorld, agent_id, run_async};
use rstest_bdd_macros::then;
use switchyard::agent_registry::services::RegistryError;
use switchyard::messaging::error::MessagingError;

#[then(r#""{id}" has {count:usize} pending messages"#)]
fn has_pending(world: &MessagingWorld, id: String, count: usize) -> Result<(), eyre::Report> {
    let pending = run_async(world.hub.fetch(&agent_id(&id)?, None))
        .map_err(|err| eyre::eyre!("fetch failed: {err}"))?;
    if pending.len() != count {
        return Err(eyre::eyre!(
            "expected {count} pending messages for '{id}', found {}",
            pending.len()
        ));
    }
    Ok(())
}

#[then(r#"the first pending message for "{id}" has priority "{priority}""#)]
fn first_pending_priority(
    world: &MessagingWorld,
    id: String,
    priority: String,
) -> Result<(), eyre::Report> {
    let pending = run_async(world.hub.fetch(&agent_id(&id)?, None))
        .map_err(|err| eyre::eyre!("fetch failed: {err}"))?;
    let first = pending
        .first()
        .ok_or_else(|| eyre::eyre!("no pending message for '{id}'"))?;
    if first.priority().as_str() != priority {
        return Err(eyre::eyre!(
            "expected priority '{priority}', found '{}'",
            first.priority()
        ));
    }
    Ok(())
}

#[then("the broadcast produced {count:usize} messages")]
fn broadcast_produced(world: &MessagingWorld, count: usize) -> Result<(), eyre::Report> {
    let ids = world
        .last_broadcast
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no broadcast recorded in scenario world"))?;
    if ids.len() != count {
        return Err(eyre::eyre!("expected {count} broadcast ids, found {}", ids.len()));
    }
    Ok(())
}

#[then("the last operation failed because the agent is unknown")]
fn failed_with_unknown_agent(world: &MessagingWorld) -> Result<(), eyre::Report> {
    match &world.last_error {
        Some(MessagingError::Registry(RegistryError::AgentNotFound(_))) => Ok(()),
        other => Err(eyre::eyre!("expected agent not found, got {other:?}")),
    }
}
