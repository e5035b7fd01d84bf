//! Provenance carried inside every frame.
//!
//! The original sender's address travels in the frame itself rather than
//! being read from the datagram envelope, so it survives relays. The address
//! family is decided once, when the text is parsed, and the wire codec only
//! ever matches on [`SourceAddress`].

use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    str::FromStr,
};

use super::EncodingError;

/// Address family of a [`SourceAddress`], as written in the `ipVersion` byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// Four address octets.
    V4,
    /// Sixteen address octets.
    V6,
}

impl AddressFamily {
    /// Value of the `ipVersion` wire byte.
    #[must_use]
    pub const fn version(self) -> u8 {
        match self {
            Self::V4 => 4,
            Self::V6 => 6,
        }
    }

    /// Number of address bytes on the wire.
    #[must_use]
    pub const fn address_len(self) -> usize {
        match self {
            Self::V4 => 4,
            Self::V6 => 16,
        }
    }

    /// Map an `ipVersion` byte back to a family.
    #[must_use]
    pub const fn from_version(version: u8) -> Option<Self> {
        match version {
            4 => Some(Self::V4),
            6 => Some(Self::V6),
            _ => None,
        }
    }
}

/// IPv4 or IPv6 address of the original sender.
///
/// # Examples
///
/// ```
/// use chunkwire::chunk::{AddressFamily, SourceAddress};
///
/// let v6: SourceAddress = "2001:db8::1".parse().expect("valid address");
/// assert_eq!(v6.family(), AddressFamily::V6);
/// assert_eq!(v6.to_string(), "2001:db8::1");
/// assert!("not-an-ip".parse::<SourceAddress>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceAddress {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
}

impl SourceAddress {
    /// Return the address family.
    #[must_use]
    pub const fn family(&self) -> AddressFamily {
        match self {
            Self::V4(_) => AddressFamily::V4,
            Self::V6(_) => AddressFamily::V6,
        }
    }

    /// Return the address as a standard library [`IpAddr`].
    #[must_use]
    pub const fn ip(&self) -> IpAddr {
        match self {
            Self::V4(addr) => IpAddr::V4(*addr),
            Self::V6(addr) => IpAddr::V6(*addr),
        }
    }
}

impl FromStr for SourceAddress {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<IpAddr>()
            .map(Self::from)
            .map_err(|_| EncodingError::InvalidAddress {
                address: s.to_owned(),
            })
    }
}

impl From<IpAddr> for SourceAddress {
    fn from(value: IpAddr) -> Self {
        match value {
            IpAddr::V4(addr) => Self::V4(addr),
            IpAddr::V6(addr) => Self::V6(addr),
        }
    }
}

impl From<Ipv4Addr> for SourceAddress {
    fn from(value: Ipv4Addr) -> Self { Self::V4(value) }
}

impl From<Ipv6Addr> for SourceAddress {
    fn from(value: Ipv6Addr) -> Self { Self::V6(value) }
}

impl fmt::Display for SourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.ip().fmt(f) }
}

/// Source address and port describing who originally sent a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Provenance {
    address: SourceAddress,
    port: u16,
}

impl Provenance {
    /// Create provenance from an already parsed address.
    #[must_use]
    pub const fn new(address: SourceAddress, port: u16) -> Self { Self { address, port } }

    /// Parse textual provenance.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::InvalidAddress`] when `address` is neither an
    /// IPv4 nor an IPv6 literal.
    pub fn parse(address: &str, port: u16) -> Result<Self, EncodingError> {
        Ok(Self::new(address.parse()?, port))
    }

    /// Return the sender address.
    #[must_use]
    pub const fn address(&self) -> SourceAddress { self.address }

    /// Return the sender port.
    #[must_use]
    pub const fn port(&self) -> u16 { self.port }

    /// Combine address and port into a socket address.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr { SocketAddr::new(self.address.ip(), self.port) }
}

impl From<SocketAddr> for Provenance {
    fn from(value: SocketAddr) -> Self { Self::new(value.ip().into(), value.port()) }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.socket_addr().fmt(f) }
}
