//! Minimal SNTPv4 client (RFC 4330) for syncing against the hub's
//! chrony server.
//!
//! One request/reply exchange per sync; only the server transmit
//! timestamp is used, which is plenty on a single-hop LAN.

use embassy_net::{
    dns::DnsQueryType,
    udp::{PacketMetadata, UdpSocket},
    Stack,
};
use embassy_time::{with_timeout, Duration, Instant};
use log::debug;

use crate::clock::NTP_UNIX_OFFSET;
use crate::constants::{SNTP_SOCKET_BUFFER_SIZE, SNTP_TIMEOUT_SECS};

/// SNTP packet size without extension fields
pub const PACKET_SIZE: usize = 48;

const NTP_PORT: u16 = 123;
/// LI = 0, VN = 4, mode = 3 (client)
const REQUEST_HEADER: u8 = 0x23;
const MODE_MASK: u8 = 0x07;
const MODE_SERVER: u8 = 4;
/// Offset of the transmit timestamp field
const TRANSMIT_TS_OFFSET: usize = 40;

#[derive(Debug)]
pub enum Error {
    DnsLookupFailed,
    BindFailed,
    SendFailed,
    Timeout,
    ReceiveFailed,
    PacketTooShort,
    NotAServerReply,
    KissOfDeath,
    InvalidTimestamp,
}

/// Fill `buf` with a client request packet.
pub fn build_request(buf: &mut [u8; PACKET_SIZE]) {
    buf.fill(0);
    buf[0] = REQUEST_HEADER;
}

/// Extract the transmit timestamp of a server reply as Unix seconds.
pub fn parse_reply(packet: &[u8]) -> Result<u64, Error> {
    if packet.len() < PACKET_SIZE {
        return Err(Error::PacketTooShort);
    }
    if packet[0] & MODE_MASK != MODE_SERVER {
        return Err(Error::NotAServerReply);
    }
    // Stratum 0 marks a kiss-of-death packet
    if packet[1] == 0 {
        return Err(Error::KissOfDeath);
    }

    let secs = u64::from(u32::from_be_bytes([
        packet[TRANSMIT_TS_OFFSET],
        packet[TRANSMIT_TS_OFFSET + 1],
        packet[TRANSMIT_TS_OFFSET + 2],
        packet[TRANSMIT_TS_OFFSET + 3],
    ]));
    if secs == 0 {
        return Err(Error::InvalidTimestamp);
    }

    // The 32-bit era-0 seconds wrap in 2036; values below the Unix
    // offset belong to era 1.
    let unix = if secs >= NTP_UNIX_OFFSET {
        secs - NTP_UNIX_OFFSET
    } else {
        secs + (1u64 << 32) - NTP_UNIX_OFFSET
    };
    Ok(unix)
}

/// Query `hostname` once and return `(unix_secs, uptime_secs)` where
/// `uptime_secs` is the device uptime at which the reply arrived.
pub async fn query(stack: Stack<'static>, hostname: &str) -> Result<(u64, u64), Error> {
    let addr = stack
        .dns_query(hostname, DnsQueryType::A)
        .await
        .map_err(|_| Error::DnsLookupFailed)?
        .first()
        .copied()
        .ok_or(Error::DnsLookupFailed)?;

    let mut rx_meta = [PacketMetadata::EMPTY; 4];
    let mut tx_meta = [PacketMetadata::EMPTY; 4];
    let mut rx_buffer = [0u8; SNTP_SOCKET_BUFFER_SIZE];
    let mut tx_buffer = [0u8; SNTP_SOCKET_BUFFER_SIZE];
    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );
    socket.bind(0).map_err(|_| Error::BindFailed)?;

    let mut request = [0u8; PACKET_SIZE];
    build_request(&mut request);
    socket
        .send_to(&request, (addr, NTP_PORT))
        .await
        .map_err(|_| Error::SendFailed)?;

    let mut reply = [0u8; SNTP_SOCKET_BUFFER_SIZE];
    let (len, _) = with_timeout(
        Duration::from_secs(SNTP_TIMEOUT_SECS),
        socket.recv_from(&mut reply),
    )
    .await
    .map_err(|_| Error::Timeout)?
    .map_err(|_| Error::ReceiveFailed)?;

    let unix = parse_reply(&reply[..len])?;
    let uptime = Instant::now().as_secs();
    debug!("SNTP reply from {}: unix {}", hostname, unix);
    Ok((unix, uptime))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_reply(stratum: u8, ntp_secs: u32) -> [u8; PACKET_SIZE] {
        let mut packet = [0u8; PACKET_SIZE];
        packet[0] = 0x24; // LI = 0, VN = 4, mode = 4 (server)
        packet[1] = stratum;
        packet[TRANSMIT_TS_OFFSET..TRANSMIT_TS_OFFSET + 4]
            .copy_from_slice(&ntp_secs.to_be_bytes());
        packet
    }

    #[test]
    fn request_is_version_4_client() {
        let mut buf = [0xAAu8; PACKET_SIZE];
        build_request(&mut buf);
        assert_eq!(buf[0], 0x23);
        assert!(buf[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn reply_timestamp_converts_to_unix() {
        // 2026-08-29 12:34:56 UTC
        let packet = server_reply(2, 3_996_995_696);
        assert_eq!(parse_reply(&packet).unwrap(), 1_788_006_896);
    }

    #[test]
    fn short_packet_is_rejected() {
        let packet = server_reply(2, 3_996_995_696);
        assert!(matches!(
            parse_reply(&packet[..40]),
            Err(Error::PacketTooShort)
        ));
    }

    #[test]
    fn echoed_client_packet_is_rejected() {
        let mut packet = server_reply(2, 3_996_995_696);
        packet[0] = 0x23; // mode 3, our own request
        assert!(matches!(parse_reply(&packet), Err(Error::NotAServerReply)));
    }

    #[test]
    fn kiss_of_death_is_rejected() {
        let packet = server_reply(0, 3_996_995_696);
        assert!(matches!(parse_reply(&packet), Err(Error::KissOfDeath)));
    }

    #[test]
    fn zero_timestamp_is_rejected() {
        let packet = server_reply(2, 0);
        assert!(matches!(parse_reply(&packet), Err(Error::InvalidTimestamp)));
    }

    #[test]
    fn era_1_timestamps_keep_counting() {
        // Era 0 wraps on 2036-02-07; a small era-1 value must land after it.
        let packet = server_reply(2, 1000);
        let unix = parse_reply(&packet).unwrap();
        assert_eq!(unix, 1000 + (1u64 << 32) - NTP_UNIX_OFFSET);
        assert!(unix > 2_085_000_000);
    }
}
