//! BDD step definitions for the provisioning workflow.

use achim::backend::PowerAction;
use achim::test_support::{BackendCall, Operation};
use achim::{Group, OwnerLabels, ScenarioOrchestrator, User, parse_scenario};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::{LAB, ProvisionContext, ProvisionOutcome};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("the lab scenario for group \"{group}\" with users \"{first}\" and \"{second}\"")]
fn lab_scenario(
    provision_context: &ProvisionContext,
    group: String,
    first: String,
    second: String,
) -> Result<(), StepError> {
    let scenario = parse_scenario(LAB).map_err(|err| StepError::Assertion(err.to_string()))?;
    let mut state = provision_context.state_mut();
    state.scenario = scenario;
    state.group = Some(Group {
        name: group,
        users: vec![User::new(first), User::new(second)],
    });
    Ok(())
}

#[given("the database uses image \"{image}\" and size \"{size}\"")]
fn database_uses(
    provision_context: &ProvisionContext,
    image: String,
    size: String,
) -> Result<(), StepError> {
    let mut state = provision_context.state_mut();
    let template = state
        .scenario
        .instances
        .as_mut()
        .and_then(|templates| templates.first_mut())
        .ok_or_else(|| StepError::Assertion(String::from("scenario has no instances")))?;
    template.image = image;
    template.size = size;
    Ok(())
}

#[given("the backend offers image \"{image}\"")]
fn backend_offers_image(provision_context: &ProvisionContext, image: String) {
    drop(provision_context.backend.clone().with_images([image]));
}

#[given("the backend already has an instance named \"{name}\"")]
fn backend_has_instance(provision_context: &ProvisionContext, name: String) {
    provision_context
        .backend
        .seed_instance(&name, &OwnerLabels::default());
}

#[given("existing resources are ignored")]
fn ignore_existing(provision_context: &ProvisionContext) {
    provision_context.state_mut().options.ignore_existing = true;
}

#[given("autostart is requested")]
fn autostart(provision_context: &ProvisionContext) {
    provision_context.state_mut().options.autostart = true;
}

#[given("instance creation fails for \"{name}\"")]
fn creation_fails(provision_context: &ProvisionContext, name: String) {
    provision_context
        .backend
        .fail_on(Operation::CreateInstance, name);
}

#[given("the backend already has a network named \"{name}\"")]
fn backend_has_network(provision_context: &ProvisionContext, name: String) {
    provision_context
        .backend
        .seed_network(&name, &OwnerLabels::default());
}

#[given("network creation fails for \"{name}\"")]
fn network_creation_fails(provision_context: &ProvisionContext, name: String) {
    provision_context
        .backend
        .fail_on(Operation::CreateNetwork, name);
}

#[given("attachments fail")]
fn attachments_fail(provision_context: &ProvisionContext) {
    provision_context.backend.fail_always(Operation::Attach);
}

#[given("listing existing instances fails")]
fn listing_fails(provision_context: &ProvisionContext) {
    provision_context
        .backend
        .fail_always(Operation::ListInstances);
}

#[given("image lookup fails")]
fn image_lookup_fails(provision_context: &ProvisionContext) {
    provision_context.backend.fail_always(Operation::FindImages);
}

#[when("I provision the scenario")]
fn provision(provision_context: &ProvisionContext) -> Result<(), StepError> {
    let runtime = Runtime::new().map_err(|err| StepError::Assertion(err.to_string()))?;
    let (scenario, group, options) = {
        let state = provision_context.state();
        let group = state
            .group
            .clone()
            .ok_or_else(|| StepError::Assertion(String::from("missing group")))?;
        (state.scenario.clone(), group, state.options.clone())
    };

    let orchestrator = ScenarioOrchestrator::new(provision_context.backend.clone());
    let result =
        runtime.block_on(async { orchestrator.provision(&scenario, &group, &options).await });
    provision_context.state_mut().outcome = Some(match result {
        Ok(report) => ProvisionOutcome::Success(report),
        Err(err) => ProvisionOutcome::Failure(err.to_string()),
    });
    Ok(())
}

fn outcome(provision_context: &ProvisionContext) -> Result<ProvisionOutcome, StepError> {
    provision_context
        .state()
        .outcome
        .clone()
        .ok_or_else(|| StepError::Assertion(String::from("missing outcome")))
}

#[then("provisioning succeeds")]
fn provisioning_succeeds(provision_context: &ProvisionContext) -> Result<(), StepError> {
    match outcome(provision_context)? {
        ProvisionOutcome::Success(_) => Ok(()),
        ProvisionOutcome::Failure(message) => Err(StepError::Assertion(format!(
            "expected success, got: {message}"
        ))),
    }
}

#[then("provisioning fails mentioning \"{text}\"")]
fn provisioning_fails(provision_context: &ProvisionContext, text: String) -> Result<(), StepError> {
    match outcome(provision_context)? {
        ProvisionOutcome::Failure(message) if message.contains(&text) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected failure mentioning {text}, got: {other:?}"
        ))),
    }
}

#[then("instances \"{first}\" and \"{second}\" were created")]
fn instances_created(
    provision_context: &ProvisionContext,
    first: String,
    second: String,
) -> Result<(), StepError> {
    let ProvisionOutcome::Success(report) = outcome(provision_context)? else {
        return Err(StepError::Assertion(String::from("expected success")));
    };
    let names: Vec<&str> = report
        .instances
        .iter()
        .map(|instance| instance.canonical_name.as_str())
        .collect();
    if names == [first.as_str(), second.as_str()] {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("unexpected instances: {names:?}")))
    }
}

#[then("{count} attachments use address \"{ip}\"")]
fn attachments_use(
    provision_context: &ProvisionContext,
    count: u32,
    ip: String,
) -> Result<(), StepError> {
    let attachments = provision_context.backend.attachments();
    let matching = attachments.iter().filter(|a| a.ip == ip).count();
    if matching == count as usize && attachments.len() == matching {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} attachments on {ip}, got {attachments:?}"
        )))
    }
}

#[then("every created resource carries label \"{label}\"")]
fn resources_labelled(provision_context: &ProvisionContext, label: String) -> Result<(), StepError> {
    let (key, value) = label
        .split_once('=')
        .ok_or_else(|| StepError::Assertion(format!("malformed label {label}")))?;
    let backend = &provision_context.backend;
    let unlabelled: Vec<String> = backend
        .instances()
        .into_iter()
        .chain(backend.networks())
        .filter(|summary| summary.label(key) != Some(value))
        .map(|summary| summary.name)
        .collect();
    if unlabelled.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("missing {label}: {unlabelled:?}")))
    }
}

#[then("nothing was created")]
fn nothing_created(provision_context: &ProvisionContext) -> Result<(), StepError> {
    let created = provision_context
        .backend
        .calls()
        .into_iter()
        .filter(|call| {
            matches!(
                call,
                BackendCall::CreateInstance { .. } | BackendCall::CreateNetwork { .. }
            )
        })
        .count();
    if created == 0 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("{created} creation calls issued")))
    }
}

#[then("no network was created")]
fn no_network_created(provision_context: &ProvisionContext) -> Result<(), StepError> {
    if provision_context.backend.networks().is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from("a network was created")))
    }
}

#[then("\"{name}\" is reported as skipped")]
fn reported_skipped(provision_context: &ProvisionContext, name: String) -> Result<(), StepError> {
    let ProvisionOutcome::Success(report) = outcome(provision_context)? else {
        return Err(StepError::Assertion(String::from("expected success")));
    };
    if report.skipped.contains(&name) && report.instances.iter().all(|i| i.canonical_name != name) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("unexpected report: {report:?}")))
    }
}

#[then("instance \"{name}\" is running")]
fn instance_running(provision_context: &ProvisionContext, name: String) -> Result<(), StepError> {
    let backend = &provision_context.backend;
    let id = backend
        .instance_id(&name)
        .ok_or_else(|| StepError::Assertion(format!("no instance named {name}")))?;
    match backend.power_state(&id) {
        Some(PowerAction::Start) => Ok(()),
        other => Err(StepError::Assertion(format!("{name} power state: {other:?}"))),
    }
}

#[then("instance \"{name}\" still exists")]
fn instance_still_exists(provision_context: &ProvisionContext, name: String) -> Result<(), StepError> {
    provision_context
        .backend
        .instance_id(&name)
        .map(drop)
        .ok_or_else(|| StepError::Assertion(format!("instance {name} is missing")))
}

#[then("network \"{name}\" still exists")]
fn network_still_exists(provision_context: &ProvisionContext, name: String) -> Result<(), StepError> {
    provision_context
        .backend
        .network_id(&name)
        .map(drop)
        .ok_or_else(|| StepError::Assertion(format!("network {name} is missing")))
}

#[then("no attachment joins \"{instance}\" and \"{network}\"")]
fn no_attachment_joins(
    provision_context: &ProvisionContext,
    instance: String,
    network: String,
) -> Result<(), StepError> {
    let backend = &provision_context.backend;
    let instance_id = backend
        .instance_id(&instance)
        .ok_or_else(|| StepError::Assertion(format!("no instance named {instance}")))?;
    let network_id = backend
        .network_id(&network)
        .ok_or_else(|| StepError::Assertion(format!("no network named {network}")))?;
    let joined = backend
        .attachments()
        .into_iter()
        .any(|a| a.instance_id == instance_id && a.network_id == network_id);
    if joined {
        Err(StepError::Assertion(format!("{instance} was attached to {network} again")))
    } else {
        Ok(())
    }
}

#[then("only instance \"{name}\" was attached")]
fn only_instance_attached(provision_context: &ProvisionContext, name: String) -> Result<(), StepError> {
    let backend = &provision_context.backend;
    let id = backend
        .instance_id(&name)
        .ok_or_else(|| StepError::Assertion(format!("no instance named {name}")))?;
    let attachments = backend.attachments();
    if !attachments.is_empty() && attachments.iter().all(|a| a.instance_id == id) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected only {name} attachments, got {attachments:?}"
        )))
    }
}
