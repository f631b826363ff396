//! BDD scenarios for provisioning.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ProvisionContext, provision_context};

#[scenario(
    path = "tests/features/provision.feature",
    name = "Provision the lab for two users"
)]
fn scenario_provision_lab(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Reject unknown images and sizes before creating anything"
)]
fn scenario_reject_invalid(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Abort when a resolved name is already taken"
)]
fn scenario_names_in_use(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Reuse existing resources when asked to ignore them"
)]
fn scenario_ignore_existing(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Stop at the first failed instance creation"
)]
fn scenario_create_failure(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Power instances on when autostart is requested"
)]
fn scenario_autostart(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Reject users whose names collide after normalisation"
)]
fn scenario_normalised_collision(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Keep created instances when a network cannot be created"
)]
fn scenario_network_failure(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Keep created resources when an attachment fails"
)]
fn scenario_attach_failure(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Stop when existing resources cannot be listed"
)]
fn scenario_listing_failure(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Stop when images cannot be looked up"
)]
fn scenario_image_lookup_failure(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Do not re-attach resources that both existed already"
)]
fn scenario_preexisting_pair(provision_context: ProvisionContext) {
    drop(provision_context);
}
