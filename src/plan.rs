//! Joins resolved networks with provider identifiers.
//!
//! Planning happens after creation. Canonical names computed locally are
//! looked up in the created (or listed) resources to obtain the identifiers
//! the provider expects for attachment calls.

use serde::Serialize;
use thiserror::Error;

use crate::network::ResolvedNetwork;
use crate::owner::OwnerMap;

/// An instance known to the provider.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CreatedInstance {
    /// Canonical name the instance was created with.
    pub canonical_name: String,
    /// Provider-assigned identifier.
    pub id: String,
}

/// A private network known to the provider.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CreatedNetwork {
    /// Canonical name the network was created with.
    pub canonical_name: String,
    /// Provider-assigned identifier.
    pub id: String,
}

/// A request to attach one instance to one network with a static address.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Attachment {
    /// Provider identifier of the network.
    pub network_id: String,
    /// Provider identifier of the instance.
    pub instance_id: String,
    /// Static address for the instance on the network.
    pub ip: String,
}

/// Raised when a canonical name cannot be mapped to exactly one identifier.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LookupError {
    /// No network carries the name.
    #[error("network not found: {0}")]
    NetworkNotFound(String),
    /// No instance carries the name.
    #[error("instance not found: {0}")]
    InstanceNotFound(String),
    /// Several resources carry the name.
    #[error("{kind} name is ambiguous: {name} matches {count} resources")]
    Ambiguous {
        /// Resource kind (`network` or `instance`).
        kind: &'static str,
        /// Canonical name looked up.
        name: String,
        /// Number of matches.
        count: usize,
    },
}

trait Named {
    const KIND: &'static str;
    fn name(&self) -> &str;
    fn id(&self) -> &str;
}

impl Named for CreatedInstance {
    const KIND: &'static str = "instance";
    fn name(&self) -> &str {
        &self.canonical_name
    }
    fn id(&self) -> &str {
        &self.id
    }
}

impl Named for CreatedNetwork {
    const KIND: &'static str = "network";
    fn name(&self) -> &str {
        &self.canonical_name
    }
    fn id(&self) -> &str {
        &self.id
    }
}

fn find_unique<'a, T: Named>(
    resources: &'a [T],
    name: &str,
    not_found: fn(String) -> LookupError,
) -> Result<&'a str, LookupError> {
    let mut matches = resources.iter().filter(|resource| resource.name() == name);
    let Some(first) = matches.next() else {
        return Err(not_found(name.to_owned()));
    };
    let extra = matches.count();
    if extra > 0 {
        return Err(LookupError::Ambiguous {
            kind: T::KIND,
            name: name.to_owned(),
            count: extra + 1,
        });
    }
    Ok(first.id())
}

/// Produces the attachments for every resolved network.
///
/// Attachments are grouped by network in owner order and follow each
/// network's `connects` order.
///
/// # Errors
///
/// Returns [`LookupError`] when a network or instance name is missing from
/// the supplied resources or matches more than one of them.
pub fn plan_attachments(
    networks_by_owner: &OwnerMap<ResolvedNetwork>,
    instances: &[CreatedInstance],
    networks: &[CreatedNetwork],
) -> Result<Vec<Attachment>, LookupError> {
    let mut attachments = Vec::new();
    for network in networks_by_owner.values() {
        let network_id = find_unique(networks, &network.canonical_name, LookupError::NetworkNotFound)?;
        for connection in &network.connects {
            let instance_id = find_unique(
                instances,
                &connection.canonical_name,
                LookupError::InstanceNotFound,
            )?;
            attachments.push(Attachment {
                network_id: network_id.to_owned(),
                instance_id: instance_id.to_owned(),
                ip: connection.ip.clone(),
            });
        }
    }
    Ok(attachments)
}
