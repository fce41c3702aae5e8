use core::fmt;
use std::net::{AddrParseError, IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

/// Network address of an ECHONET Lite node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeAddress {
    Ip(SocketAddr),
}

impl NodeAddress {
    pub const ECHONET_LITE_PORT: u16 = 3610;
    pub const MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 23, 0);

    /// The ECHONET Lite multicast group on the standard port.
    pub fn multicast() -> Self {
        Self::echonet_default(IpAddr::V4(Self::MULTICAST_GROUP))
    }

    pub fn echonet_default(addr: IpAddr) -> Self {
        Self::Ip(SocketAddr::new(addr, Self::ECHONET_LITE_PORT))
    }

    pub fn as_socket_addr(self) -> SocketAddr {
        match self {
            Self::Ip(addr) => addr,
        }
    }

    pub fn ip(self) -> IpAddr {
        self.as_socket_addr().ip()
    }

    /// Multicast and broadcast destinations reach more than one node, so
    /// replies arrive from addresses other than this one.
    pub fn is_group(self) -> bool {
        match self.ip() {
            IpAddr::V4(v4) => v4.is_multicast() || v4.is_broadcast(),
            IpAddr::V6(v6) => v6.is_multicast(),
        }
    }
}

impl From<SocketAddr> for NodeAddress {
    fn from(addr: SocketAddr) -> Self {
        Self::Ip(addr)
    }
}

impl From<IpAddr> for NodeAddress {
    fn from(addr: IpAddr) -> Self {
        Self::echonet_default(addr)
    }
}

/// Accepts `ip` (standard port implied) or `ip:port`.
impl FromStr for NodeAddress {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<SocketAddr>() {
            Ok(addr) => Ok(Self::Ip(addr)),
            Err(_) => s.parse::<IpAddr>().map(Self::echonet_default),
        }
    }
}

/// Prints the bare IP when the node uses the standard port.
impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(addr) if addr.port() == Self::ECHONET_LITE_PORT => write!(f, "{}", addr.ip()),
            Self::Ip(addr) => write!(f, "{addr}"),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for NodeAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for NodeAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
