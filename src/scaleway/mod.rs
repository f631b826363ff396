//! Scaleway backend for per-user instances and private networks.
//!
//! Instances live in the Instances API (zonal), private networks in the VPC
//! API (regional) and static addresses in IPAM (regional). Ownership labels
//! travel as `key=value` tags.

mod error;
mod lifecycle;
mod sizes;
mod tags;
mod types;

use std::collections::BTreeSet;
use std::time::Duration;

use crate::backend::{
    BackendFuture, InstanceRequest, NetworkRequest, NicHandle, PowerAction, ProvisioningBackend,
    ResourceSummary,
};
use crate::config::ScalewayConfig;
use crate::plan::{Attachment, CreatedInstance, CreatedNetwork};
use scaleway_rs::ScalewayApi;
use tracing::debug;
use types::InstanceId;

const POLL_INTERVAL: Duration = Duration::from_secs(5);
const WAIT_TIMEOUT: Duration = Duration::from_secs(300);

pub use error::ScalewayBackendError;

/// Backend that provisions resources through the Scaleway APIs.
#[derive(Clone)]
pub struct ScalewayBackend {
    api: ScalewayApi,
    config: ScalewayConfig,
    poll_interval: Duration,
    wait_timeout: Duration,
}

impl ScalewayBackend {
    fn is_instance_type_error(api_err: &scaleway_rs::ScalewayApiError, commercial_type: &str) -> bool {
        matches!(api_err.resource.as_deref(), Some("commercial_type"))
            || api_err
                .resource_id
                .as_deref()
                .is_some_and(|id| id == commercial_type)
            || (api_err.etype == "invalid_arguments"
                && api_err
                    .message
                    .to_ascii_lowercase()
                    .contains("commercial_type"))
    }

    /// Constructs a new backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScalewayBackendError::Config`] when the provided configuration
    /// fails validation.
    pub fn new(config: ScalewayConfig) -> Result<Self, ScalewayBackendError> {
        config.validate()?;
        Ok(Self {
            api: ScalewayApi::new(&config.secret_key),
            config,
            poll_interval: POLL_INTERVAL,
            wait_timeout: WAIT_TIMEOUT,
        })
    }

    /// Availability zone used for instances.
    #[must_use]
    pub fn zone(&self) -> &str {
        self.config.default_zone.trim()
    }

    /// Region used for private networks and addresses.
    #[must_use]
    pub fn region(&self) -> &str {
        self.config.region()
    }
}

impl ProvisioningBackend for ScalewayBackend {
    type Error = ScalewayBackendError;

    fn find_images<'a>(
        &'a self,
        labels: &'a [String],
    ) -> BackendFuture<'a, BTreeSet<String>, Self::Error> {
        Box::pin(async move { self.available_images(labels).await })
    }

    fn create_instance<'a>(
        &'a self,
        request: &'a InstanceRequest,
    ) -> BackendFuture<'a, CreatedInstance, Self::Error> {
        Box::pin(async move {
            request.validate()?;
            let image_id = self.resolve_image_id(&request.image_label).await?;
            let snapshot = self.create_instance_stopped(request, &image_id).await?;
            debug!(name = %request.name, id = %snapshot.id.as_str(), "instance created");

            if request.autostart {
                self.apply_power_action(&snapshot, PowerAction::Start).await?;
            }

            Ok(CreatedInstance {
                canonical_name: request.name.clone(),
                id: snapshot.id.as_str().to_owned(),
            })
        })
    }

    fn create_network<'a>(
        &'a self,
        request: &'a NetworkRequest,
    ) -> BackendFuture<'a, CreatedNetwork, Self::Error> {
        Box::pin(async move { self.create_private_network(request).await })
    }

    fn attach_network<'a>(
        &'a self,
        attachment: &'a Attachment,
    ) -> BackendFuture<'a, NicHandle, Self::Error> {
        Box::pin(async move { self.attach_private_nic(attachment).await })
    }

    fn list_instances(&self) -> BackendFuture<'_, Vec<ResourceSummary>, Self::Error> {
        Box::pin(async move { self.list_servers().await })
    }

    fn list_networks(&self) -> BackendFuture<'_, Vec<ResourceSummary>, Self::Error> {
        Box::pin(async move { self.list_private_networks().await })
    }

    fn power<'a>(&'a self, id: &'a str, action: PowerAction) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let instance_id = InstanceId::from(id);
            let snapshot = self.fetch_instance(&instance_id).await?.ok_or_else(|| {
                ScalewayBackendError::InstanceNotFound {
                    instance_id: id.to_owned(),
                    zone: self.zone().to_owned(),
                }
            })?;
            self.apply_power_action(&snapshot, action).await
        })
    }

    fn destroy_instance<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let instance_id = InstanceId::from(id);
            let Some(snapshot) = self.fetch_instance(&instance_id).await? else {
                return Ok(());
            };
            self.terminate(&snapshot).await?;
            self.wait_until_gone(&instance_id).await
        })
    }

    fn destroy_network<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move { self.delete_private_network(id).await })
    }
}
