//! Expansion of network templates into per-user private networks.
//!
//! `connects` entries name instance *templates*. Each user's networks are
//! matched only against that user's resolved instances, so a connection can
//! never cross owners. Hosts that match no instance are dropped without an
//! error; strict checking lives in [`crate::validate`].

use std::collections::HashMap;

use serde::Serialize;

use crate::address::{Subnet, parse_ipv4};
use crate::naming::qualify;
use crate::owner::OwnerMap;
use crate::scenario::{NetworkTemplate, User};
use crate::topology::ResolvedInstance;

/// A fully specified managed address range.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct IpRange {
    /// Netmask of the range.
    pub netmask: String,
    /// First managed address.
    pub start_ip: String,
    /// Last managed address.
    pub end_ip: String,
}

impl IpRange {
    /// Builds a range only when all three parts are present and non-blank.
    #[must_use]
    pub fn from_parts(
        netmask: Option<&str>,
        start_ip: Option<&str>,
        end_ip: Option<&str>,
    ) -> Option<Self> {
        let present = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|trimmed| !trimmed.is_empty())
                .map(str::to_owned)
        };
        Some(Self {
            netmask: present(netmask)?,
            start_ip: present(start_ip)?,
            end_ip: present(end_ip)?,
        })
    }

    /// Reads the range declared by a template.
    #[must_use]
    pub fn from_template(template: &NetworkTemplate) -> Option<Self> {
        Self::from_parts(
            template.netmask.as_deref(),
            template.start_ip.as_deref(),
            template.end_ip.as_deref(),
        )
    }

    /// Returns the subnet spanned by the range, when the addresses parse and
    /// the netmask is contiguous.
    #[must_use]
    pub fn subnet(&self) -> Option<Subnet> {
        Subnet::containing(parse_ipv4(&self.start_ip)?, parse_ipv4(&self.netmask)?)
    }
}

/// A connection resolved to a concrete instance.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ResolvedConnection {
    /// Canonical name of the attached instance.
    pub canonical_name: String,
    /// Static address for the attachment.
    pub ip: String,
}

/// A network template instantiated for one user.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ResolvedNetwork {
    /// Name of the template this network came from.
    pub template_name: String,
    /// Unique provider-facing name, `qualify(template_name, owner)`.
    pub canonical_name: String,
    /// Owning user's raw name.
    pub owner: String,
    /// Managed range; `None` leaves the provider default in place.
    pub ip_config: Option<IpRange>,
    /// Instances to attach, in the owner's instance order.
    pub connects: Vec<ResolvedConnection>,
}

impl ResolvedNetwork {
    fn new(template: &NetworkTemplate, user: &User, instances: &[ResolvedInstance]) -> Self {
        let host_ips: HashMap<&str, &str> = template
            .connects
            .iter()
            .map(|connection| (connection.host.as_str(), connection.ip.as_str()))
            .collect();

        let connects = instances
            .iter()
            .filter_map(|instance| {
                host_ips
                    .get(instance.template_name.as_str())
                    .map(|ip| ResolvedConnection {
                        canonical_name: instance.canonical_name.clone(),
                        ip: (*ip).to_owned(),
                    })
            })
            .collect();

        Self {
            template_name: template.name.clone(),
            canonical_name: qualify(&template.name, &user.name),
            owner: user.name.clone(),
            ip_config: IpRange::from_template(template),
            connects,
        }
    }
}

/// Instantiates every network template once per user.
///
/// Users without a partition in `instances_by_owner` get networks with no
/// connections.
#[must_use]
pub fn resolve_networks(
    templates: &[NetworkTemplate],
    users: &[User],
    instances_by_owner: &OwnerMap<ResolvedInstance>,
) -> OwnerMap<ResolvedNetwork> {
    let mut resolved = OwnerMap::new();
    for user in users {
        let instances = instances_by_owner.get(&user.name).unwrap_or_default();
        let networks = templates
            .iter()
            .map(|template| ResolvedNetwork::new(template, user, instances))
            .collect();
        resolved.push(user.name.clone(), networks);
    }
    resolved
}
