//! Behavioural scenarios for provisioning a scenario.

mod provision;
