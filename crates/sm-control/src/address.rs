//! Device address validation
//!
//! Devices are addressed by IP literal only. Any valid IPv4 address is
//! accepted, as is any valid IPv6 address in full, compressed or
//! IPv4-mapped notation, optionally followed by a `%zone` identifier for
//! link-local use. Host names are rejected.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV6};
use std::str::FromStr;

use crate::error::AddressError;

/// Address used when none is configured
pub const DEFAULT_DEVICE_ADDRESS: &str = "192.168.1.29";

/// A validated device IP address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceAddress {
    V4(Ipv4Addr),
    V6 { addr: Ipv6Addr, zone: Option<String> },
}

impl DeviceAddress {
    /// Validate an IP literal
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let invalid = |reason: &str| AddressError {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("address is empty"));
        }

        if let Some((addr, zone)) = trimmed.split_once('%') {
            let addr = addr
                .parse::<Ipv6Addr>()
                .map_err(|_| invalid("zone identifiers are only valid on IPv6 addresses"))?;
            if zone.is_empty() {
                return Err(invalid("empty zone identifier"));
            }
            if zone.contains('%') || zone.chars().any(char::is_whitespace) {
                return Err(invalid("malformed zone identifier"));
            }
            return Ok(Self::V6 {
                addr,
                zone: Some(zone.to_string()),
            });
        }

        match trimmed.parse::<IpAddr>() {
            Ok(IpAddr::V4(addr)) => Ok(Self::V4(addr)),
            Ok(IpAddr::V6(addr)) => Ok(Self::V6 { addr, zone: None }),
            Err(_) => Err(invalid("does not appear to be an IPv4 or IPv6 address")),
        }
    }

    /// Returns true for IPv6 addresses
    pub fn is_ipv6(&self) -> bool {
        matches!(self, Self::V6 { .. })
    }

    /// Host part of a URL for this address
    ///
    /// IPv6 addresses are bracketed and a zone separator is percent-encoded.
    pub fn url_host(&self) -> String {
        match self {
            Self::V4(addr) => addr.to_string(),
            Self::V6 { addr, zone: None } => format!("[{}]", addr),
            Self::V6 {
                addr,
                zone: Some(zone),
            } => format!("[{}%25{}]", addr, zone),
        }
    }

    /// Socket address for `port`
    ///
    /// A zone is resolved to its interface index, either directly when it is
    /// numeric or by interface name.
    pub fn socket_addr(&self, port: u16) -> Result<SocketAddr, AddressError> {
        match self {
            Self::V4(addr) => Ok(SocketAddr::new(IpAddr::V4(*addr), port)),
            Self::V6 { addr, zone } => {
                let scope_id = match zone {
                    None => 0,
                    Some(zone) => zone_index(zone).ok_or_else(|| AddressError {
                        input: self.to_string(),
                        reason: format!("unknown network interface '{}'", zone),
                    })?,
                };
                Ok(SocketAddr::V6(SocketAddrV6::new(*addr, port, 0, scope_id)))
            }
        }
    }
}

fn zone_index(zone: &str) -> Option<u32> {
    if let Ok(index) = zone.parse::<u32>() {
        return Some(index);
    }
    interface_index(zone)
}

#[cfg(unix)]
fn interface_index(name: &str) -> Option<u32> {
    let name = std::ffi::CString::new(name).ok()?;
    // `name` is NUL-terminated and outlives the call.
    let index = unsafe { libc::if_nametoindex(name.as_ptr()) };
    (index != 0).then_some(index)
}

#[cfg(not(unix))]
fn interface_index(_name: &str) -> Option<u32> {
    None
}

impl FromStr for DeviceAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4(addr) => write!(f, "{}", addr),
            Self::V6 { addr, zone: None } => write!(f, "{}", addr),
            Self::V6 {
                addr,
                zone: Some(zone),
            } => write!(f, "{}%{}", addr, zone),
        }
    }
}

impl From<IpAddr> for DeviceAddress {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(addr) => Self::V4(addr),
            IpAddr::V6(addr) => Self::V6 { addr, zone: None },
        }
    }
}
