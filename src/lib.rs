//! Core library for the achim scenario provisioning tool.
//!
//! A scenario describes instance and network templates; a group lists the
//! users who each receive a private copy. The crate resolves the per-user
//! topology (unique names, per-user network connections, optional address
//! ranges), plans the network attachments from backend identifiers and drives
//! a [`ProvisioningBackend`] through creation, attachment, power and teardown
//! of whole groups or single instances. [`ScalewayBackend`] implements the backend
//! against the Scaleway Instances, VPC and IPAM APIs.

pub mod address;
pub mod backend;
pub mod config;
pub mod descriptor;
pub mod group;
pub mod naming;
pub mod network;
pub mod owner;
pub mod plan;
pub mod probe;
pub mod provision;
pub mod scaleway;
pub mod scenario;
pub mod size;
pub mod test_support;
pub mod topology;
pub mod validate;

pub use backend::{
    BackendError, InstanceRequest, InstanceRequestBuilder, NetworkRequest, NicHandle,
    OwnerLabels, PowerAction, ProvisioningBackend, ResourceSummary,
};
pub use config::{ConfigError, ScalewayConfig};
pub use descriptor::{DescriptorError, load_group, load_scenario, parse_group, parse_scenario};
pub use group::{GroupActionSummary, GroupError, GroupLifecycle};
pub use naming::{normalize, qualify};
pub use network::{IpRange, ResolvedConnection, ResolvedNetwork, resolve_networks};
pub use owner::{OwnerMap, Partition};
pub use plan::{Attachment, CreatedInstance, CreatedNetwork, LookupError, plan_attachments};
pub use probe::{HttpProber, ProbeResult, ProbeStatus};
pub use provision::{
    PlannedAttachment, PreviewError, ProvisionError, ProvisionOptions, ProvisionReport,
    ResolvedTopology, ScenarioOrchestrator, ScenarioPreview, preview,
};
pub use scaleway::{ScalewayBackend, ScalewayBackendError};
pub use scenario::{Group, HostConnection, InstanceTemplate, NetworkTemplate, Scenario, User};
pub use size::{Size, UnknownSize};
pub use topology::{ResolvedInstance, resolve_instances};
pub use validate::{ScenarioValidator, ValidationError, Violation};
