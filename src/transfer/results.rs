//! Transfer result types

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

/// Address a PASV reply told the client to connect its data channel to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataEndpoint {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl DataEndpoint {
    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.host, self.port)
    }
}

impl fmt::Display for DataEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}
