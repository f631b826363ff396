//! Shared fixtures for group lifecycle scenarios.

use std::cell::RefCell;
use std::rc::Rc;

use achim::GroupActionSummary;
use achim::test_support::ScriptedBackend;
use rstest::fixture;

pub type GroupOutcome = Result<GroupActionSummary, String>;

/// Context shared between steps. Clones share the backend and outcome.
#[derive(Clone, Debug, Default)]
pub struct GroupContext {
    pub backend: ScriptedBackend,
    outcome: Rc<RefCell<Option<GroupOutcome>>>,
}

impl GroupContext {
    pub fn record(&self, outcome: GroupOutcome) {
        self.outcome.replace(Some(outcome));
    }

    pub fn outcome(&self) -> Option<GroupOutcome> {
        self.outcome.borrow().clone()
    }
}

#[fixture]
pub fn group_context() -> GroupContext {
    GroupContext::default()
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
