//! Power, teardown and HTTP probing for groups and single instances.
//!
//! Resources are matched by their `group` label, so the scenario that created
//! them is not needed. Teardown removes instances before networks and leaves
//! resources labelled `permanent=true` alone unless forced. Single instances
//! are looked up by canonical name.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::backend::{LABEL_OWNER, PowerAction, ProvisioningBackend, ResourceSummary};
use crate::probe::{HttpProber, ProbeResult, probe_url};

/// Errors returned by group operations.
#[derive(Debug, Error)]
pub enum GroupError<BackendErr>
where
    BackendErr: std::error::Error + 'static,
{
    /// Raised when the group name is blank.
    #[error("group name must not be empty")]
    EmptyName,
    /// Raised when no instance carries the requested name.
    #[error("instance not found: {name}")]
    InstanceNotFound {
        /// Requested instance name.
        name: String,
    },
    /// Raised when several instances carry the requested name.
    #[error("instance name is ambiguous: {name} matches {count} instances")]
    AmbiguousInstance {
        /// Requested instance name.
        name: String,
        /// Number of matching instances.
        count: usize,
    },
    /// Raised when deleting a permanent instance without forcing it.
    #[error("instance {name} is permanent; pass --destroy-permanent to delete it")]
    PermanentInstance {
        /// Instance name.
        name: String,
    },
    /// Raised when resources cannot be listed.
    #[error("failed to list resources: {0}")]
    Listing(#[source] BackendErr),
    /// Raised when a power transition fails.
    #[error("failed to {action} instance {name}: {source}")]
    Power {
        /// Action attempted (`start` or `stop`).
        action: &'static str,
        /// Instance name.
        name: String,
        /// Provider-specific error.
        #[source]
        source: BackendErr,
    },
    /// Raised when an instance cannot be deleted.
    #[error("failed to destroy instance {name}: {source}")]
    DestroyInstance {
        /// Instance name.
        name: String,
        /// Provider-specific error.
        #[source]
        source: BackendErr,
    },
    /// Raised when a network cannot be deleted.
    #[error("failed to destroy network {name}: {source}")]
    DestroyNetwork {
        /// Network name.
        name: String,
        /// Provider-specific error.
        #[source]
        source: BackendErr,
    },
}

/// Names of the resources touched by a group operation.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct GroupActionSummary {
    /// Instances started, stopped, or destroyed.
    pub instances: Vec<String>,
    /// Networks destroyed.
    pub networks: Vec<String>,
    /// Permanent resources left in place.
    pub skipped: Vec<String>,
}

impl GroupActionSummary {
    /// Returns `true` when nothing was touched or skipped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty() && self.networks.is_empty() && self.skipped.is_empty()
    }
}

const fn verb(action: PowerAction) -> &'static str {
    match action {
        PowerAction::Start => "start",
        PowerAction::Stop => "stop",
    }
}

/// Runs power and teardown operations on every resource of a group.
#[derive(Debug)]
pub struct GroupLifecycle<B> {
    backend: B,
}

impl<B> GroupLifecycle<B>
where
    B: ProvisioningBackend,
{
    /// Creates a new lifecycle runner.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Powers on every instance of `group`.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError`] when listing or a power call fails.
    pub async fn start(&self, group: &str) -> Result<GroupActionSummary, GroupError<B::Error>> {
        self.power_all(group, PowerAction::Start).await
    }

    /// Powers off every instance of `group`.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError`] when listing or a power call fails.
    pub async fn stop(&self, group: &str) -> Result<GroupActionSummary, GroupError<B::Error>> {
        self.power_all(group, PowerAction::Stop).await
    }

    /// Deletes every instance of `group`, then its networks.
    ///
    /// Permanent resources are skipped unless `destroy_permanent` is set.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError`] on the first failed listing or deletion.
    pub async fn destroy(
        &self,
        group: &str,
        destroy_permanent: bool,
    ) -> Result<GroupActionSummary, GroupError<B::Error>> {
        let group = Self::group_name(group)?;
        let mut summary = GroupActionSummary::default();

        for instance in self.instances_in(group).await? {
            if instance.is_permanent() && !destroy_permanent {
                warn!(name = %instance.name, "permanent instance kept");
                summary.skipped.push(instance.name);
                continue;
            }
            self.backend
                .destroy_instance(&instance.id)
                .await
                .map_err(|source| GroupError::DestroyInstance {
                    name: instance.name.clone(),
                    source,
                })?;
            info!(name = %instance.name, id = %instance.id, "instance destroyed");
            summary.instances.push(instance.name);
        }

        let networks = self
            .backend
            .list_networks()
            .await
            .map_err(GroupError::Listing)?;
        for network in networks.into_iter().filter(|net| net.in_group(group)) {
            if network.is_permanent() && !destroy_permanent {
                warn!(name = %network.name, "permanent network kept");
                summary.skipped.push(network.name);
                continue;
            }
            self.backend
                .destroy_network(&network.id)
                .await
                .map_err(|source| GroupError::DestroyNetwork {
                    name: network.name.clone(),
                    source,
                })?;
            info!(name = %network.name, id = %network.id, "network destroyed");
            summary.networks.push(network.name);
        }

        if summary.is_empty() {
            warn!(group, "no resources found for group");
        }
        Ok(summary)
    }

    /// Powers on the instance named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError`] when the name matches no single instance or the
    /// power call fails.
    pub async fn start_instance(
        &self,
        name: &str,
    ) -> Result<GroupActionSummary, GroupError<B::Error>> {
        let instance = self.instance_named(name).await?;
        self.power_one(instance, PowerAction::Start).await
    }

    /// Powers off the instance named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError`] when the name matches no single instance or the
    /// power call fails.
    pub async fn stop_instance(
        &self,
        name: &str,
    ) -> Result<GroupActionSummary, GroupError<B::Error>> {
        let instance = self.instance_named(name).await?;
        self.power_one(instance, PowerAction::Stop).await
    }

    /// Deletes the instance named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::PermanentInstance`] when the instance is
    /// permanent and `destroy_permanent` is unset, and other [`GroupError`]
    /// variants when the lookup or deletion fails.
    pub async fn destroy_instance(
        &self,
        name: &str,
        destroy_permanent: bool,
    ) -> Result<GroupActionSummary, GroupError<B::Error>> {
        let instance = self.instance_named(name).await?;
        if instance.is_permanent() && !destroy_permanent {
            return Err(GroupError::PermanentInstance {
                name: instance.name,
            });
        }
        self.backend
            .destroy_instance(&instance.id)
            .await
            .map_err(|source| GroupError::DestroyInstance {
                name: instance.name.clone(),
                source,
            })?;
        info!(name = %instance.name, id = %instance.id, "instance destroyed");
        Ok(GroupActionSummary {
            instances: vec![instance.name],
            ..GroupActionSummary::default()
        })
    }

    /// Sends `GET http://<public ip>/<suffix>` to every instance of `group`.
    ///
    /// Instances without a public address are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError`] when the group name is blank or listing fails.
    /// Failed requests are reported per instance, not as errors.
    pub async fn probe(
        &self,
        group: &str,
        suffix: &str,
        prober: &HttpProber,
    ) -> Result<Vec<ProbeResult>, GroupError<B::Error>> {
        let group = Self::group_name(group)?;
        let mut results = Vec::new();
        for instance in self.instances_in(group).await? {
            let Some(ip) = instance.public_ip.clone() else {
                warn!(name = %instance.name, "instance has no public address, not probed");
                continue;
            };
            let status = prober.check(&probe_url(&ip, suffix)).await;
            info!(name = %instance.name, %ip, %status, "instance probed");
            results.push(ProbeResult {
                ip,
                status,
                owner: instance.label(LABEL_OWNER).unwrap_or_default().to_owned(),
            });
        }
        Ok(results)
    }

    async fn instance_named(&self, name: &str) -> Result<ResourceSummary, GroupError<B::Error>> {
        let name = name.trim();
        let mut matches: Vec<ResourceSummary> = self
            .backend
            .list_instances()
            .await
            .map_err(GroupError::Listing)?
            .into_iter()
            .filter(|instance| instance.name == name)
            .collect();
        match (matches.pop(), matches.len()) {
            (Some(instance), 0) => Ok(instance),
            (Some(_), rest) => Err(GroupError::AmbiguousInstance {
                name: name.to_owned(),
                count: rest + 1,
            }),
            (None, _) => Err(GroupError::InstanceNotFound {
                name: name.to_owned(),
            }),
        }
    }

    async fn power_one(
        &self,
        instance: ResourceSummary,
        action: PowerAction,
    ) -> Result<GroupActionSummary, GroupError<B::Error>> {
        self.backend
            .power(&instance.id, action)
            .await
            .map_err(|source| GroupError::Power {
                action: verb(action),
                name: instance.name.clone(),
                source,
            })?;
        info!(name = %instance.name, action = verb(action), "instance power changed");
        Ok(GroupActionSummary {
            instances: vec![instance.name],
            ..GroupActionSummary::default()
        })
    }

    fn group_name(group: &str) -> Result<&str, GroupError<B::Error>> {
        let trimmed = group.trim();
        if trimmed.is_empty() {
            return Err(GroupError::EmptyName);
        }
        Ok(trimmed)
    }

    async fn instances_in(&self, group: &str) -> Result<Vec<ResourceSummary>, GroupError<B::Error>> {
        let instances = self
            .backend
            .list_instances()
            .await
            .map_err(GroupError::Listing)?;
        Ok(instances
            .into_iter()
            .filter(|instance| instance.in_group(group))
            .collect())
    }

    async fn power_all(
        &self,
        group: &str,
        action: PowerAction,
    ) -> Result<GroupActionSummary, GroupError<B::Error>> {
        let group = Self::group_name(group)?;
        let mut summary = GroupActionSummary::default();
        for instance in self.instances_in(group).await? {
            let touched = self.power_one(instance, action).await?;
            summary.instances.extend(touched.instances);
        }
        if summary.is_empty() {
            warn!(group, "no instances found for group");
        }
        Ok(summary)
    }
}
