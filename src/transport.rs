//! Plain-TCP transport to the hub broker.
//!
//! The broker lives on the hub's LAN and speaks plaintext MQTT on
//! port 1883, so a connection is just a DNS lookup and a TCP connect.

use embassy_net::{dns::DnsQueryType, tcp::TcpSocket, Stack};
use embassy_time::Duration;
use log::info;

use crate::constants::SOCKET_TIMEOUT_SECS;

#[derive(Debug)]
pub enum Error {
    DnsLookupFailed,
    ConnectionFailed,
}

/// Open a TCP connection to `hostname:port`. The name may be an IP
/// literal; `dns_query` resolves those without hitting the resolver.
pub async fn connect<'a>(
    stack: Stack<'static>,
    rx_buffer: &'a mut [u8],
    tx_buffer: &'a mut [u8],
    hostname: &str,
    port: u16,
) -> Result<TcpSocket<'a>, Error> {
    let mut socket = TcpSocket::new(stack, rx_buffer, tx_buffer);
    socket.set_timeout(Some(Duration::from_secs(SOCKET_TIMEOUT_SECS)));

    let addr = stack
        .dns_query(hostname, DnsQueryType::A)
        .await
        .map_err(|_| Error::DnsLookupFailed)?
        .first()
        .copied()
        .ok_or(Error::DnsLookupFailed)?;

    info!("Connecting TCP socket to {}:{}", hostname, port);
    socket
        .connect((addr, port))
        .await
        .map_err(|_| Error::ConnectionFailed)?;

    Ok(socket)
}
