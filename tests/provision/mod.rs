//! BDD harness for the provisioning workflow.

mod bdd_steps;
mod scenarios;
mod test_helpers;
