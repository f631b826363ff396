//! BDD scenarios for group lifecycle operations.

use rstest_bdd_macros::scenario;

use super::test_helpers::{GroupContext, group_context};

#[scenario(
    path = "tests/features/group.feature",
    name = "Destroy a group but keep permanent resources"
)]
fn scenario_destroy_keeps_permanent(group_context: GroupContext) {
    drop(group_context);
}

#[scenario(
    path = "tests/features/group.feature",
    name = "Destroy permanent resources when forced"
)]
fn scenario_destroy_forced(group_context: GroupContext) {
    drop(group_context);
}

#[scenario(
    path = "tests/features/group.feature",
    name = "Start and stop every instance of a group"
)]
fn scenario_power_cycle(group_context: GroupContext) {
    drop(group_context);
}

#[scenario(
    path = "tests/features/group.feature",
    name = "Refuse to destroy a permanent instance by name"
)]
fn scenario_destroy_single_instance(group_context: GroupContext) {
    drop(group_context);
}
