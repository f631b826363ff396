//! BDD step definitions for group lifecycle operations.

use std::future::Future;

use achim::backend::PowerAction;
use achim::{
    Group, GroupActionSummary, GroupLifecycle, ProvisionOptions, ScenarioOrchestrator, User,
    parse_scenario,
};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::{GroupContext, LAB};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn block_on<F: Future>(future: F) -> Result<F::Output, StepError> {
    let runtime = Runtime::new().map_err(|err| StepError::Assertion(err.to_string()))?;
    Ok(runtime.block_on(future))
}

#[given("a provisioned group \"{group}\" where \"{user}\" is permanent")]
fn provisioned_group(
    group_context: &GroupContext,
    group: String,
    user: String,
) -> Result<(), StepError> {
    let scenario = parse_scenario(LAB).map_err(|err| StepError::Assertion(err.to_string()))?;
    let mut permanent = User::new(user);
    permanent.permanent = true;
    let group = Group {
        name: group,
        users: vec![User::new("alice"), permanent],
    };

    let backend = group_context.backend.clone().with_images(["ubuntu"]);
    let orchestrator = ScenarioOrchestrator::new(backend);
    block_on(orchestrator.provision(&scenario, &group, &ProvisionOptions::default()))?
        .map(drop)
        .map_err(|err| StepError::Assertion(err.to_string()))
}

fn record(
    group_context: &GroupContext,
    result: Result<GroupActionSummary, impl ToString>,
) {
    group_context.record(result.map_err(|err| err.to_string()));
}

#[when("I destroy group \"{group}\"")]
fn destroy_group(group_context: &GroupContext, group: String) -> Result<(), StepError> {
    let lifecycle = GroupLifecycle::new(group_context.backend.clone());
    record(group_context, block_on(lifecycle.destroy(&group, false))?);
    Ok(())
}

#[when("I destroy group \"{group}\" including permanent resources")]
fn destroy_group_forced(group_context: &GroupContext, group: String) -> Result<(), StepError> {
    let lifecycle = GroupLifecycle::new(group_context.backend.clone());
    record(group_context, block_on(lifecycle.destroy(&group, true))?);
    Ok(())
}

#[when("I start group \"{group}\"")]
fn start_group(group_context: &GroupContext, group: String) -> Result<(), StepError> {
    let lifecycle = GroupLifecycle::new(group_context.backend.clone());
    record(group_context, block_on(lifecycle.start(&group))?);
    Ok(())
}

#[when("I stop group \"{group}\"")]
fn stop_group(group_context: &GroupContext, group: String) -> Result<(), StepError> {
    let lifecycle = GroupLifecycle::new(group_context.backend.clone());
    record(group_context, block_on(lifecycle.stop(&group))?);
    Ok(())
}

#[when("I destroy instance \"{name}\"")]
fn destroy_instance(group_context: &GroupContext, name: String) -> Result<(), StepError> {
    let lifecycle = GroupLifecycle::new(group_context.backend.clone());
    record(group_context, block_on(lifecycle.destroy_instance(&name, false))?);
    Ok(())
}

#[then("the operation fails mentioning \"{text}\"")]
fn operation_fails(group_context: &GroupContext, text: String) -> Result<(), StepError> {
    match group_context.outcome() {
        Some(Err(message)) if message.contains(&text) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected failure mentioning {text}, got: {other:?}"
        ))),
    }
}

#[then("the operation succeeds")]
fn operation_succeeds(group_context: &GroupContext) -> Result<(), StepError> {
    match group_context.outcome() {
        Some(Ok(_)) => Ok(()),
        Some(Err(message)) => Err(StepError::Assertion(format!(
            "expected success, got: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("no operation ran"))),
    }
}

fn instance_exists(group_context: &GroupContext, name: &str) -> bool {
    group_context.backend.instance_id(name).is_some()
}

#[then("instance \"{name}\" is gone")]
fn instance_gone(group_context: &GroupContext, name: String) -> Result<(), StepError> {
    if instance_exists(group_context, &name) {
        Err(StepError::Assertion(format!("{name} still exists")))
    } else {
        Ok(())
    }
}

#[then("instance \"{name}\" remains")]
fn instance_remains(group_context: &GroupContext, name: String) -> Result<(), StepError> {
    if instance_exists(group_context, &name) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("{name} was removed")))
    }
}

#[then("network \"{name}\" remains")]
fn network_remains(group_context: &GroupContext, name: String) -> Result<(), StepError> {
    let networks = group_context.backend.networks();
    if networks.iter().any(|network| network.name == name) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("{name} missing from {networks:?}")))
    }
}

#[then("no network remains")]
fn no_network_remains(group_context: &GroupContext) -> Result<(), StepError> {
    let networks = group_context.backend.networks();
    if networks.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("networks remain: {networks:?}")))
    }
}

fn assert_power(
    group_context: &GroupContext,
    name: &str,
    expected: PowerAction,
) -> Result<(), StepError> {
    let backend = &group_context.backend;
    let id = backend
        .instance_id(name)
        .ok_or_else(|| StepError::Assertion(format!("no instance named {name}")))?;
    match backend.power_state(&id) {
        Some(state) if state == expected => Ok(()),
        other => Err(StepError::Assertion(format!("{name} power state: {other:?}"))),
    }
}

#[then("instance \"{name}\" is running")]
fn instance_running(group_context: &GroupContext, name: String) -> Result<(), StepError> {
    assert_power(group_context, &name, PowerAction::Start)
}

#[then("instance \"{name}\" is stopped")]
fn instance_stopped(group_context: &GroupContext, name: String) -> Result<(), StepError> {
    assert_power(group_context, &name, PowerAction::Stop)
}
