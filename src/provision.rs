//! Provisions a scenario for every member of a group.
//!
//! The workflow validates the scenario against the backend's images, resolves
//! the per-user topology, creates every instance, then every network, plans
//! the attachments from the identifiers returned by creation and finally
//! attaches instances to networks. Calls are sequential and nothing is rolled
//! back on failure.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{
    BackendError, InstanceRequest, NetworkRequest, OwnerLabels, ProvisioningBackend,
    ResourceSummary,
};
use crate::network::{ResolvedNetwork, resolve_networks};
use crate::owner::OwnerMap;
use crate::plan::{Attachment, CreatedInstance, CreatedNetwork, LookupError, plan_attachments};
use crate::scenario::{Group, Scenario, User};
use crate::size::{Size, UnknownSize};
use crate::topology::{ResolvedInstance, resolve_instances};
use crate::validate::{ScenarioValidator, ValidationError};

/// Errors surfaced while provisioning a scenario.
#[derive(Debug, Error)]
pub enum ProvisionError<BackendErr>
where
    BackendErr: std::error::Error + 'static,
{
    /// Raised when the available images cannot be determined.
    #[error("failed to look up images: {0}")]
    Images(#[source] BackendErr),
    /// Raised when the scenario fails validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Raised when existing resources cannot be listed.
    #[error("failed to list existing resources: {0}")]
    Listing(#[source] BackendErr),
    /// Raised when distinct users resolve to the same resource name.
    #[error("resolved names are not unique: {}", .names.join(", "))]
    DuplicateNames {
        /// Canonical names produced more than once.
        names: Vec<String>,
    },
    /// Raised when resolved names are already taken in the backend.
    #[error("resources already exist: {}", .names.join(", "))]
    NamesInUse {
        /// Canonical names found in the backend.
        names: Vec<String>,
    },
    /// Raised when a resolved size has no provider mapping.
    #[error(transparent)]
    InvalidSize(#[from] UnknownSize),
    /// Raised when a creation request cannot be built.
    #[error("invalid request: {0}")]
    Request(#[from] BackendError),
    /// Raised when the backend fails to create an instance.
    #[error("failed to create instance {name}: {source}")]
    CreateInstance {
        /// Canonical instance name.
        name: String,
        /// Provider-specific error.
        #[source]
        source: BackendErr,
    },
    /// Raised when the backend fails to create a network.
    #[error("failed to create network {name}: {source}")]
    CreateNetwork {
        /// Canonical network name.
        name: String,
        /// Provider-specific error.
        #[source]
        source: BackendErr,
    },
    /// Raised when attachment planning cannot resolve a name.
    #[error(transparent)]
    Lookup(#[from] LookupError),
    /// Raised when the backend fails to attach an instance.
    #[error("failed to attach instance {instance_id} to network {network_id}: {source}")]
    Attach {
        /// Provider network identifier.
        network_id: String,
        /// Provider instance identifier.
        instance_id: String,
        /// Provider-specific error.
        #[source]
        source: BackendErr,
    },
}

/// Knobs for a provisioning run.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProvisionOptions {
    /// Value of the `context` label; empty omits the label.
    pub context: String,
    /// Powers instances on after creation.
    pub autostart: bool,
    /// Skips resources whose names already exist instead of aborting.
    pub ignore_existing: bool,
    /// Treats `connects` hosts naming no instance template as violations.
    pub strict_connections: bool,
}

/// Outcome of a provisioning run.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ProvisionReport {
    /// Instances created by this run.
    pub instances: Vec<CreatedInstance>,
    /// Networks created by this run.
    pub networks: Vec<CreatedNetwork>,
    /// Canonical names that already existed and were left untouched.
    pub skipped: Vec<String>,
    /// Attachments issued by this run.
    pub attachments: Vec<Attachment>,
}

/// Per-user instances and networks derived from a scenario.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ResolvedTopology {
    /// Instances partitioned by owner.
    pub instances: OwnerMap<ResolvedInstance>,
    /// Networks partitioned by owner.
    pub networks: OwnerMap<ResolvedNetwork>,
}

impl ResolvedTopology {
    /// Expands `scenario` for every user.
    #[must_use]
    pub fn resolve(scenario: &Scenario, users: &[User]) -> Self {
        let instances = resolve_instances(scenario.instance_templates(), users);
        let networks = resolve_networks(scenario.network_templates(), users, &instances);
        debug!(
            instances = instances.values().count(),
            networks = networks.values().count(),
            "scenario resolved"
        );
        Self {
            instances,
            networks,
        }
    }

    fn instance_names(&self) -> impl Iterator<Item = &str> {
        self.instances
            .values()
            .map(|instance| instance.canonical_name.as_str())
    }

    fn network_names(&self) -> impl Iterator<Item = &str> {
        self.networks
            .values()
            .map(|network| network.canonical_name.as_str())
    }

    /// Returns the canonical names resolved more than once within the same
    /// resource kind, sorted.
    ///
    /// Raw user names differing only in `.` or `_` normalise to the same
    /// owner suffix and collide here.
    #[must_use]
    pub fn duplicate_names(&self) -> Vec<String> {
        repeated(self.instance_names())
            .into_iter()
            .chain(repeated(self.network_names()))
            .map(str::to_owned)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn repeated<'a>(names: impl Iterator<Item = &'a str>) -> BTreeSet<&'a str> {
    let mut seen = HashSet::new();
    names.filter(|name| !seen.insert(*name)).collect()
}

/// An attachment identified by canonical names rather than provider ids.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PlannedAttachment {
    /// Canonical network name.
    pub network: String,
    /// Canonical instance name.
    pub instance: String,
    /// Static address.
    pub ip: String,
}

/// Dry-run view of a scenario provisioned for a group.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ScenarioPreview {
    /// Scenario name.
    pub scenario: String,
    /// Group name.
    pub group: String,
    /// Resolved instances and networks.
    #[serde(flatten)]
    pub topology: ResolvedTopology,
    /// Attachments that provisioning would issue.
    pub attachments: Vec<PlannedAttachment>,
}

/// Errors raised by [`preview`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PreviewError {
    /// Raised when the scenario is structurally invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Raised when distinct users resolve to the same resource name.
    #[error("resolved names are not unique: {}", .names.join(", "))]
    DuplicateNames {
        /// Canonical names produced more than once.
        names: Vec<String>,
    },
    /// Raised when a canonical name is ambiguous.
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Resolves `scenario` for `group` without contacting a backend.
///
/// Images are not checked; every other validation rule applies. Attachments
/// are planned with canonical names standing in for provider ids.
///
/// # Errors
///
/// Returns [`PreviewError`] when validation or planning fails.
pub fn preview(
    scenario: &Scenario,
    group: &Group,
    strict_connections: bool,
) -> Result<ScenarioPreview, PreviewError> {
    let declared_images = scenario
        .instance_templates()
        .iter()
        .map(|template| template.image.clone());
    ScenarioValidator::new(declared_images)
        .strict_connections(strict_connections)
        .validate(scenario)?;

    let topology = ResolvedTopology::resolve(scenario, &group.users);
    let duplicates = topology.duplicate_names();
    if !duplicates.is_empty() {
        return Err(PreviewError::DuplicateNames { names: duplicates });
    }
    let instances: Vec<CreatedInstance> = topology
        .instances
        .values()
        .map(|instance| CreatedInstance {
            canonical_name: instance.canonical_name.clone(),
            id: instance.canonical_name.clone(),
        })
        .collect();
    let networks: Vec<CreatedNetwork> = topology
        .networks
        .values()
        .map(|network| CreatedNetwork {
            canonical_name: network.canonical_name.clone(),
            id: network.canonical_name.clone(),
        })
        .collect();
    let attachments = plan_attachments(&topology.networks, &instances, &networks)?
        .into_iter()
        .map(|attachment| PlannedAttachment {
            network: attachment.network_id,
            instance: attachment.instance_id,
            ip: attachment.ip,
        })
        .collect();

    Ok(ScenarioPreview {
        scenario: scenario.name.clone().unwrap_or_default(),
        group: group.name.clone(),
        topology,
        attachments,
    })
}

/// Resources present in the backend before the run, keyed by name.
struct Existing {
    instances: Vec<ResourceSummary>,
    networks: Vec<ResourceSummary>,
}

impl Existing {
    fn instance(&self, name: &str) -> Option<&ResourceSummary> {
        self.instances.iter().find(|summary| summary.name == name)
    }

    fn network(&self, name: &str) -> Option<&ResourceSummary> {
        self.networks.iter().find(|summary| summary.name == name)
    }

    /// Resolved names already present in the listing of their own kind.
    fn taken(&self, topology: &ResolvedTopology) -> Vec<String> {
        let instances = topology
            .instance_names()
            .filter(|name| self.instance(name).is_some());
        let networks = topology
            .network_names()
            .filter(|name| self.network(name).is_some());
        instances
            .chain(networks)
            .map(str::to_owned)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Executes the provisioning workflow against a backend.
#[derive(Debug)]
pub struct ScenarioOrchestrator<B> {
    backend: B,
}

impl<B> ScenarioOrchestrator<B>
where
    B: ProvisioningBackend,
{
    /// Creates a new orchestrator.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the wrapped backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Provisions `scenario` for every user of `group`.
    ///
    /// Validation runs before any mutation. When `ignore_existing` is set,
    /// resources whose canonical names already exist are skipped and their
    /// identifiers reused for planning; attachments joining two such
    /// resources are not issued again.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError`] when validation, listing, creation,
    /// planning, or attachment fail. Resources created before the failure are
    /// left in place.
    pub async fn provision(
        &self,
        scenario: &Scenario,
        group: &Group,
        options: &ProvisionOptions,
    ) -> Result<ProvisionReport, ProvisionError<B::Error>> {
        self.validate(scenario, options).await?;
        let topology = ResolvedTopology::resolve(scenario, &group.users);
        let duplicates = topology.duplicate_names();
        if !duplicates.is_empty() {
            return Err(ProvisionError::DuplicateNames { names: duplicates });
        }

        let existing = Existing {
            instances: self
                .backend
                .list_instances()
                .await
                .map_err(ProvisionError::Listing)?,
            networks: self
                .backend
                .list_networks()
                .await
                .map_err(ProvisionError::Listing)?,
        };
        let taken = existing.taken(&topology);
        if !taken.is_empty() && !options.ignore_existing {
            return Err(ProvisionError::NamesInUse { names: taken });
        }

        let labels = LabelSource::new(group, &options.context);
        let mut report = ProvisionReport::default();
        let mut preexisting_ids = HashSet::new();

        let mut known_instances = Vec::new();
        for instance in topology.instances.values() {
            if let Some(summary) = existing.instance(&instance.canonical_name) {
                warn!(name = %instance.canonical_name, id = %summary.id, "instance exists, skipping");
                report.skipped.push(instance.canonical_name.clone());
                preexisting_ids.insert(summary.id.clone());
                known_instances.push(summary.as_instance());
                continue;
            }
            let created = self
                .create_instance(instance, labels.for_owner(&instance.owner), options.autostart)
                .await?;
            known_instances.push(created.clone());
            report.instances.push(created);
        }

        let mut known_networks = Vec::new();
        for network in topology.networks.values() {
            if let Some(summary) = existing.network(&network.canonical_name) {
                warn!(name = %network.canonical_name, id = %summary.id, "network exists, skipping");
                report.skipped.push(network.canonical_name.clone());
                preexisting_ids.insert(summary.id.clone());
                known_networks.push(summary.as_network());
                continue;
            }
            let created = self
                .create_network(network, labels.for_owner(&network.owner))
                .await?;
            known_networks.push(created.clone());
            report.networks.push(created);
        }

        let planned = plan_attachments(&topology.networks, &known_instances, &known_networks)?;
        for attachment in planned {
            if preexisting_ids.contains(&attachment.network_id)
                && preexisting_ids.contains(&attachment.instance_id)
            {
                debug!(
                    network_id = %attachment.network_id,
                    instance_id = %attachment.instance_id,
                    "both sides pre-exist, attachment not re-issued"
                );
                continue;
            }
            self.attach(&attachment).await?;
            report.attachments.push(attachment);
        }

        Ok(report)
    }

    async fn validate(
        &self,
        scenario: &Scenario,
        options: &ProvisionOptions,
    ) -> Result<(), ProvisionError<B::Error>> {
        let labels: Vec<String> = scenario
            .instance_templates()
            .iter()
            .map(|template| template.image.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let available = self
            .backend
            .find_images(&labels)
            .await
            .map_err(ProvisionError::Images)?;
        ScenarioValidator::new(available)
            .strict_connections(options.strict_connections)
            .validate(scenario)?;
        Ok(())
    }

    async fn create_instance(
        &self,
        instance: &ResolvedInstance,
        labels: OwnerLabels,
        autostart: bool,
    ) -> Result<CreatedInstance, ProvisionError<B::Error>> {
        let size: Size = instance.size.parse()?;
        let request = InstanceRequest::builder()
            .name(instance.canonical_name.as_str())
            .image_label(instance.image.as_str())
            .size(size)
            .labels(labels)
            .autostart(autostart)
            .build()?;
        let created = self
            .backend
            .create_instance(&request)
            .await
            .map_err(|source| ProvisionError::CreateInstance {
                name: instance.canonical_name.clone(),
                source,
            })?;
        info!(name = %created.canonical_name, id = %created.id, owner = %instance.owner, "instance created");
        Ok(created)
    }

    async fn create_network(
        &self,
        network: &ResolvedNetwork,
        labels: OwnerLabels,
    ) -> Result<CreatedNetwork, ProvisionError<B::Error>> {
        let request =
            NetworkRequest::new(network.canonical_name.as_str(), network.ip_config.clone(), labels)?;
        let created = self
            .backend
            .create_network(&request)
            .await
            .map_err(|source| ProvisionError::CreateNetwork {
                name: network.canonical_name.clone(),
                source,
            })?;
        info!(name = %created.canonical_name, id = %created.id, owner = %network.owner, "network created");
        Ok(created)
    }

    async fn attach(&self, attachment: &Attachment) -> Result<(), ProvisionError<B::Error>> {
        let nic = self
            .backend
            .attach_network(attachment)
            .await
            .map_err(|source| ProvisionError::Attach {
                network_id: attachment.network_id.clone(),
                instance_id: attachment.instance_id.clone(),
                source,
            })?;
        info!(
            network_id = %attachment.network_id,
            instance_id = %attachment.instance_id,
            ip = %attachment.ip,
            nic = %nic.id,
            "instance attached"
        );
        Ok(())
    }
}

/// Builds ownership labels for the members of a group.
struct LabelSource<'a> {
    context: &'a str,
    group: &'a str,
    permanent: HashMap<&'a str, bool>,
}

impl<'a> LabelSource<'a> {
    fn new(group: &'a Group, context: &'a str) -> Self {
        Self {
            context,
            group: &group.name,
            permanent: group
                .users
                .iter()
                .map(|user| (user.name.as_str(), user.permanent))
                .collect(),
        }
    }

    fn for_owner(&self, owner: &str) -> OwnerLabels {
        OwnerLabels {
            context: self.context.to_owned(),
            group: self.group.to_owned(),
            owner: owner.to_owned(),
            permanent: self.permanent.get(owner).copied().unwrap_or(false),
        }
    }
}
