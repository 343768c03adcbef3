//! Given steps for messaging BDD scenarios.

use super::world::{MessagingWorld, agent_id, agent_type, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"agent "{id}" of type "{kind}" is registered"#)]
fn agent_is_registered(
    world: &mut MessagingWorld,
    id: String,
    kind: String,
) -> Result<(), eyre::Report> {
    let agent = agent_id(&id)?;
    let typ = agent_type(&kind)?;
    run_async(world.hub.register_agent(&agent, &typ, Vec::new()))
        .wrap_err("register agent for scenario")?;
    Ok(())
}
