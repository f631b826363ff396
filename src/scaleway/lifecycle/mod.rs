//! Resource lifecycle helpers for the Scaleway backend.

use std::sync::LazyLock;
use std::time::Duration;

mod create;
mod http;
mod image;
mod listing;
mod network;
mod nic;
mod wait;

use crate::scaleway::types::{Action, InstanceId, InstanceState};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const SCALEWAY_INSTANCE_API_BASE: &str = "https://api.scaleway.com/instance/v1";
const SCALEWAY_VPC_API_BASE: &str = "https://api.scaleway.com/vpc/v2";
const SCALEWAY_IPAM_API_BASE: &str = "https://api.scaleway.com/ipam/v1";

static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceSnapshot {
    pub(crate) id: InstanceId,
    pub(crate) state: InstanceState,
    pub(crate) allowed_actions: Vec<Action>,
}

impl InstanceSnapshot {
    fn from_server(server: scaleway_rs::ScalewayInstance) -> Self {
        Self {
            id: server.id.into(),
            state: server.state.into(),
            allowed_actions: server
                .allowed_actions
                .into_iter()
                .map(Action::from)
                .collect(),
        }
    }

    fn allows(&self, action: &str) -> bool {
        self.allowed_actions
            .iter()
            .any(|allowed| allowed.is(action))
    }
}

#[cfg(test)]
mod tests;
