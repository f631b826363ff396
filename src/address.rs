//! IPv4 helpers for private network ranges.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Parses a dotted IPv4 address, ignoring surrounding whitespace.
#[must_use]
pub fn parse_ipv4(value: &str) -> Option<Ipv4Addr> {
    Ipv4Addr::from_str(value.trim()).ok()
}

/// Returns the prefix length of a contiguous netmask such as `255.255.255.0`.
#[must_use]
pub fn prefix_len(netmask: Ipv4Addr) -> Option<u32> {
    let bits = u32::from(netmask);
    let ones = bits.leading_ones();
    (bits.count_ones() == ones).then_some(ones)
}

/// An IPv4 network in CIDR form.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Subnet {
    network: Ipv4Addr,
    prefix: u32,
}

impl Subnet {
    /// Builds the subnet containing `address` under `netmask`.
    ///
    /// Returns `None` when the netmask is not contiguous.
    #[must_use]
    pub fn containing(address: Ipv4Addr, netmask: Ipv4Addr) -> Option<Self> {
        let prefix = prefix_len(netmask)?;
        Some(Self {
            network: Ipv4Addr::from(u32::from(address) & u32::from(netmask)),
            prefix,
        })
    }

    /// Returns `true` when `address` lies inside the subnet.
    #[must_use]
    pub fn contains(self, address: Ipv4Addr) -> bool {
        let mask = self.mask();
        u32::from(address) & mask == u32::from(self.network)
    }

    /// Network address of the subnet.
    #[must_use]
    pub const fn network(self) -> Ipv4Addr {
        self.network
    }

    /// Prefix length of the subnet.
    #[must_use]
    pub const fn prefix(self) -> u32 {
        self.prefix
    }

    fn mask(self) -> u32 {
        u32::MAX.checked_shl(32 - self.prefix).unwrap_or(0)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}
