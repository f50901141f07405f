//! Passive mode negotiation
//!
//! Issues PASV, extracts the `h1,h2,h3,h4,p1,p2` tuple from the reply and
//! prepares an unconnected data socket for it. There is no retry and no
//! fallback to active mode.

use log::{debug, info};
use regex::Regex;
use std::net::Ipv4Addr;
use std::sync::LazyLock;

use crate::error::{FtpClientError, ProtocolError};
use crate::protocol::Command;
use crate::session::SessionGuard;
use crate::transfer::DataEndpoint;
use crate::transport::FtpSocket;

static PASV_TUPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+),([0-9]+),([0-9]+),([0-9]+),([0-9]+),([0-9]+)")
        .expect("PASV tuple pattern is valid")
});

/// Parses the endpoint out of PASV reply text. Every number must fit a byte.
pub fn parse_pasv_reply(text: &str) -> Result<DataEndpoint, ProtocolError> {
    let malformed = || ProtocolError::MalformedPassiveReply(text.to_string());
    let caps = PASV_TUPLE.captures(text).ok_or_else(malformed)?;

    let mut values = [0u8; 6];
    for (index, value) in values.iter_mut().enumerate() {
        *value = caps[index + 1].parse().map_err(|_| malformed())?;
    }

    Ok(DataEndpoint {
        host: Ipv4Addr::new(values[0], values[1], values[2], values[3]),
        port: u16::from_be_bytes([values[4], values[5]]),
    })
}

/// Sends PASV and returns a data socket for the announced endpoint. The
/// socket is not connected yet; the caller connects it, typically as the
/// interim step of the data command, and closes it afterwards.
pub async fn open_data_connection(
    session: &mut SessionGuard<'_>,
) -> Result<FtpSocket, FtpClientError> {
    let reply = FtpClientError::check(session.execute(&Command::Pasv).await)?;
    let endpoint = parse_pasv_reply(reply.message())?;
    debug!("PASV endpoint {}", endpoint);

    let host = match session.control_peer_ip() {
        Some(peer) if session.config().passive_nat_workaround => {
            info!("Using control peer {} instead of PASV host {}", peer, endpoint.host);
            peer.to_string()
        }
        _ => endpoint.host.to_string(),
    };

    Ok(FtpSocket::new(host, endpoint.port, session.config().encoding))
}
