//! Declarative scenario and group descriptors.
//!
//! A scenario describes the instance and network kinds every user of a group
//! receives. A group lists the users. Both are plain data: resolution into
//! concrete per-user resources happens in [`crate::topology`] and
//! [`crate::network`].

use serde::{Deserialize, Serialize};

/// One user of a group.
///
/// Fields other than `name` and `permanent` (for example `ssh-key`) are
/// accepted and ignored.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct User {
    /// Raw name as written in the group file.
    pub name: String,
    /// Marks the user's resources as protected from group teardown.
    #[serde(default)]
    pub permanent: bool,
}

impl User {
    /// Creates a non-permanent user.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permanent: false,
        }
    }
}

/// A named group of users.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Group {
    /// Group name, applied as the `group` label on every resource.
    pub name: String,
    /// Users in declaration order.
    #[serde(default)]
    pub users: Vec<User>,
}

/// Describes one kind of instance created once per user.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct InstanceTemplate {
    /// Template name, referenced by network `connects` entries.
    pub name: String,
    /// Image label resolved by the backend.
    pub image: String,
    /// Size label; see [`crate::size::Size`].
    pub size: String,
}

/// A static address assignment for one instance template on a network.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HostConnection {
    /// Name of the instance template to attach.
    pub host: String,
    /// Static IPv4 address for the attachment.
    pub ip: String,
}

/// Describes one kind of private network created once per user.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkTemplate {
    /// Template name.
    pub name: String,
    /// Instances attached to the network.
    #[serde(default)]
    pub connects: Vec<HostConnection>,
    /// Netmask of the managed range.
    #[serde(default)]
    pub netmask: Option<String>,
    /// First address of the managed range.
    #[serde(default)]
    pub start_ip: Option<String>,
    /// Last address of the managed range.
    #[serde(default)]
    pub end_ip: Option<String>,
}

/// A reusable bundle of instance and network templates.
///
/// `name` and `instances` are optional here so validation can report their
/// absence instead of failing at parse time.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Scenario {
    /// Scenario name.
    #[serde(default)]
    pub name: Option<String>,
    /// Instance templates in declaration order.
    #[serde(default)]
    pub instances: Option<Vec<InstanceTemplate>>,
    /// Network templates in declaration order.
    #[serde(default)]
    pub networks: Vec<NetworkTemplate>,
}

impl Scenario {
    /// Returns the instance templates, or an empty slice when none were given.
    #[must_use]
    pub fn instance_templates(&self) -> &[InstanceTemplate] {
        self.instances.as_deref().unwrap_or_default()
    }

    /// Returns the network templates.
    #[must_use]
    pub fn network_templates(&self) -> &[NetworkTemplate] {
        &self.networks
    }
}
