//! Shared fixtures for provisioning BDD scenarios.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use achim::test_support::ScriptedBackend;
use achim::{Group, ProvisionOptions, ProvisionReport, Scenario};
use rstest::fixture;

#[derive(Clone, Debug)]
pub enum ProvisionOutcome {
    Success(ProvisionReport),
    Failure(String),
}

#[derive(Debug, Default)]
pub struct ProvisionState {
    pub scenario: Scenario,
    pub group: Option<Group>,
    pub options: ProvisionOptions,
    pub outcome: Option<ProvisionOutcome>,
}

/// Context shared between steps. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct ProvisionContext {
    pub backend: ScriptedBackend,
    state: Rc<RefCell<ProvisionState>>,
}

impl ProvisionContext {
    pub fn state(&self) -> Ref<'_, ProvisionState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, ProvisionState> {
        self.state.borrow_mut()
    }
}

#[fixture]
pub fn provision_context() -> ProvisionContext {
    ProvisionContext::default()
}

pub const LAB: &str = "\
name: lab
instances:
  - name: db
    image: ubuntu
    size: small
networks:
  - name: net
    connects:
      - host: db
        ip: 10.0.0.2
";
