//! BDD harness for group lifecycle operations.

mod bdd_steps;
mod scenarios;
mod test_helpers;
