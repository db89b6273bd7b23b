//! PROXY protocol v1 preamble.
//!
//! Load balancers in front of the cache manager may require the original
//! client and destination endpoints before any protocol bytes. Only the
//! human-readable v1 form over TCP/IPv4 is produced.

use std::net::{Ipv4Addr, SocketAddrV4};

use bytes::Bytes;

/// Default advertised source endpoint.
pub const DEFAULT_SOURCE: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::LOCALHOST, 80);

/// Default advertised destination address (the port is the target port).
pub const DEFAULT_DESTINATION_IP: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// `PROXY TCP4 <src> <dst> <sport> <dport>\r\n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyHeaderV1 {
    pub source: SocketAddrV4,
    pub destination: SocketAddrV4,
}

impl ProxyHeaderV1 {
    pub fn new(source: SocketAddrV4, destination: SocketAddrV4) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Header with the default source and `127.0.0.1:<port>` as destination.
    pub fn for_port(port: u16) -> Self {
        Self::new(DEFAULT_SOURCE, SocketAddrV4::new(DEFAULT_DESTINATION_IP, port))
    }

    pub fn encode(&self) -> Bytes {
        Bytes::from(format!(
            "PROXY TCP4 {} {} {} {}\r\n",
            self.source.ip(),
            self.destination.ip(),
            self.source.port(),
            self.destination.port(),
        ))
    }
}
