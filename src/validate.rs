//! Pre-flight checks for scenarios.
//!
//! The validator works on reference data fetched beforehand (image labels,
//! size labels) so it never talks to a backend. It always runs every check
//! and reports all violations together.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::address::{parse_ipv4, prefix_len};
use crate::network::IpRange;
use crate::scenario::{NetworkTemplate, Scenario};
use crate::size::Size;

/// A single problem found in a scenario.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Violation {
    /// The scenario has no name.
    MissingName,
    /// The scenario has no `instances` list.
    MissingInstances,
    /// Image labels that the backend does not offer.
    UnknownImages(Vec<String>),
    /// Size labels outside the supported set.
    UnsupportedSizes(Vec<String>),
    /// A network field that is not a usable IPv4 value.
    InvalidAddress {
        /// Network template name.
        network: String,
        /// Field holding the value (`ip`, `netmask`, `start-ip`, `end-ip`).
        field: &'static str,
        /// Offending value.
        value: String,
    },
    /// A static address outside the network's declared range.
    AddressOutsideRange {
        /// Network template name.
        network: String,
        /// Offending address.
        ip: String,
    },
    /// `connects` hosts that name no instance template.
    UnknownHosts {
        /// Network template name.
        network: String,
        /// Host names without a matching template.
        hosts: Vec<String>,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => f.write_str("scenario name is missing"),
            Self::MissingInstances => f.write_str("scenario instances are missing"),
            Self::UnknownImages(images) => write!(f, "unknown images: {}", images.join(", ")),
            Self::UnsupportedSizes(sizes) => {
                write!(f, "unsupported sizes: {}", sizes.join(", "))
            }
            Self::InvalidAddress {
                network,
                field,
                value,
            } => write!(f, "network {network}: invalid {field} '{value}'"),
            Self::AddressOutsideRange { network, ip } => {
                write!(f, "network {network}: address {ip} is outside the declared range")
            }
            Self::UnknownHosts { network, hosts } => {
                write!(f, "network {network}: unknown hosts: {}", hosts.join(", "))
            }
        }
    }
}

/// Raised when a scenario fails validation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("invalid scenario: {}", render(.violations))]
pub struct ValidationError {
    /// Every violation found, in check order.
    pub violations: Vec<Violation>,
}

fn render(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Checks scenarios against available images and sizes.
#[derive(Clone, Debug)]
pub struct ScenarioValidator {
    images: BTreeSet<String>,
    sizes: BTreeSet<String>,
    strict_connections: bool,
}

impl ScenarioValidator {
    /// Creates a validator for the given images and the built-in size set.
    #[must_use]
    pub fn new<I, S>(images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            images: images.into_iter().map(Into::into).collect(),
            sizes: Size::labels().map(str::to_owned).collect(),
            strict_connections: false,
        }
    }

    /// Replaces the accepted size labels.
    #[must_use]
    pub fn with_sizes<I, S>(mut self, sizes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sizes = sizes.into_iter().map(Into::into).collect();
        self
    }

    /// Reports `connects` hosts that match no instance template.
    #[must_use]
    pub const fn strict_connections(mut self, strict: bool) -> Self {
        self.strict_connections = strict;
        self
    }

    /// Validates `scenario`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] listing every violation found.
    pub fn validate(&self, scenario: &Scenario) -> Result<(), ValidationError> {
        let mut violations = Vec::new();

        if scenario.name.as_deref().is_none_or(|name| name.trim().is_empty()) {
            violations.push(Violation::MissingName);
        }
        if scenario.instances.is_none() {
            violations.push(Violation::MissingInstances);
        }

        let templates = scenario.instance_templates();
        let unknown_images: BTreeSet<_> = templates
            .iter()
            .map(|template| template.image.as_str())
            .filter(|image| !self.images.contains(*image))
            .collect();
        if !unknown_images.is_empty() {
            violations.push(Violation::UnknownImages(to_owned_vec(unknown_images)));
        }

        let unsupported_sizes: BTreeSet<_> = templates
            .iter()
            .map(|template| template.size.as_str())
            .filter(|size| !self.sizes.contains(*size))
            .collect();
        if !unsupported_sizes.is_empty() {
            violations.push(Violation::UnsupportedSizes(to_owned_vec(unsupported_sizes)));
        }

        let hosts: BTreeSet<&str> = templates
            .iter()
            .map(|template| template.name.as_str())
            .collect();
        for network in scenario.network_templates() {
            check_addresses(network, &mut violations);
            if self.strict_connections {
                check_hosts(network, &hosts, &mut violations);
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations })
        }
    }
}

fn to_owned_vec(values: BTreeSet<&str>) -> Vec<String> {
    values.into_iter().map(str::to_owned).collect()
}

fn check_addresses(network: &NetworkTemplate, violations: &mut Vec<Violation>) {
    let invalid = |field: &'static str, value: &str| Violation::InvalidAddress {
        network: network.name.clone(),
        field,
        value: value.to_owned(),
    };

    for connection in &network.connects {
        if parse_ipv4(&connection.ip).is_none() {
            violations.push(invalid("ip", &connection.ip));
        }
    }

    let range_fields = [
        ("netmask", network.netmask.as_deref()),
        ("start-ip", network.start_ip.as_deref()),
        ("end-ip", network.end_ip.as_deref()),
    ];
    for (field, value) in range_fields {
        let Some(raw) = value.filter(|raw| !raw.trim().is_empty()) else {
            continue;
        };
        match parse_ipv4(raw) {
            None => violations.push(invalid(field, raw)),
            Some(mask) if field == "netmask" && prefix_len(mask).is_none() => {
                violations.push(invalid(field, raw));
            }
            Some(_) => {}
        }
    }

    let Some(subnet) = IpRange::from_template(network).and_then(|range| range.subnet()) else {
        return;
    };
    for connection in &network.connects {
        if let Some(ip) = parse_ipv4(&connection.ip)
            && !subnet.contains(ip)
        {
            violations.push(Violation::AddressOutsideRange {
                network: network.name.clone(),
                ip: connection.ip.clone(),
            });
        }
    }
}

fn check_hosts(network: &NetworkTemplate, hosts: &BTreeSet<&str>, violations: &mut Vec<Violation>) {
    let unknown: BTreeSet<&str> = network
        .connects
        .iter()
        .map(|connection| connection.host.as_str())
        .filter(|host| !hosts.contains(host))
        .collect();
    if !unknown.is_empty() {
        violations.push(Violation::UnknownHosts {
            network: network.name.clone(),
            hosts: to_owned_vec(unknown),
        });
    }
}
