//! Instance creation and power helpers for the Scaleway backend.
//!
//! Servers are always created with `stopped: true`; booting is a separate
//! step so provisioning can leave instances off unless autostart is asked
//! for.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::backend::{InstanceRequest, PowerAction};
use crate::scaleway::sizes::commercial_type;
use crate::scaleway::tags;
use crate::scaleway::types::{Action, InstanceState};

use super::super::{ScalewayBackend, ScalewayBackendError};
use super::InstanceSnapshot;

#[derive(Serialize)]
struct CreateServerRequest {
    name: String,
    commercial_type: String,
    image: String,
    project: String,
    routed_ip_enabled: bool,
    dynamic_ip_required: bool,
    tags: Vec<String>,
    stopped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    organization: Option<String>,
}

#[derive(Deserialize)]
struct CreateServerResponse {
    server: scaleway_rs::ScalewayInstance,
}

/// Provider action and the state in which it is already satisfied.
const fn action_for(power: PowerAction) -> (&'static str, &'static str) {
    match power {
        PowerAction::Start => (Action::POWER_ON, InstanceState::RUNNING),
        PowerAction::Stop => (Action::POWER_OFF, InstanceState::STOPPED),
    }
}

impl ScalewayBackend {
    pub(in crate::scaleway) async fn apply_power_action(
        &self,
        snapshot: &InstanceSnapshot,
        power: PowerAction,
    ) -> Result<(), ScalewayBackendError> {
        let (action, settled) = action_for(power);
        if snapshot.state.is(settled) {
            return Ok(());
        }

        if snapshot.allows(action) {
            self.api
                .perform_instance_action_async(self.zone(), snapshot.id.as_str(), action)
                .await?;
            return Ok(());
        }

        Err(ScalewayBackendError::ActionNotAllowed {
            instance_id: snapshot.id.as_str().to_owned(),
            state: snapshot.state.as_str().to_owned(),
            action: action.to_owned(),
        })
    }

    /// Removes a server. Running servers are terminated with their volumes;
    /// stopped servers no longer offer `terminate` and are deleted directly.
    pub(in crate::scaleway) async fn terminate(
        &self,
        snapshot: &InstanceSnapshot,
    ) -> Result<(), ScalewayBackendError> {
        if snapshot.allows(Action::TERMINATE) {
            self.api
                .perform_instance_action_async(self.zone(), snapshot.id.as_str(), Action::TERMINATE)
                .await?;
        } else {
            self.api
                .delete_instance_async(self.zone(), snapshot.id.as_str())
                .await?;
        }
        Ok(())
    }

    /// Creates a Scaleway instance in a stopped state.
    ///
    /// # Errors
    ///
    /// Returns [`ScalewayBackendError`] when the Scaleway API request fails or
    /// the provider rejects the requested instance type.
    pub(in crate::scaleway) async fn create_instance_stopped(
        &self,
        request: &InstanceRequest,
        image_id: &str,
    ) -> Result<InstanceSnapshot, ScalewayBackendError> {
        let url = format!(
            "{}/zones/{}/servers",
            super::SCALEWAY_INSTANCE_API_BASE,
            self.zone()
        );
        let instance_type = commercial_type(request.size);
        let payload = CreateServerRequest {
            name: request.name.clone(),
            commercial_type: instance_type.to_owned(),
            image: image_id.to_owned(),
            project: self.config.default_project_id.clone(),
            routed_ip_enabled: true,
            dynamic_ip_required: true,
            tags: tags::encode(&request.labels),
            stopped: true,
            organization: self.config.default_organization_id.clone(),
        };

        let response = self.send(Method::POST, &url, &[], Some(&payload)).await?;
        if response.status.is_success() {
            let parsed: CreateServerResponse = response.parse()?;
            return Ok(InstanceSnapshot::from_server(parsed.server));
        }

        if response
            .api_error()
            .is_some_and(|api_err| Self::is_instance_type_error(&api_err, instance_type))
        {
            return Err(ScalewayBackendError::InstanceTypeUnavailable {
                instance_type: instance_type.to_owned(),
                zone: self.zone().to_owned(),
            });
        }

        Err(ScalewayBackendError::Provider {
            message: response.message(),
        })
    }
}
