//! ICMP echo reachability probe.
//!
//! One echo request per call. Silence within the receive window is a
//! negative result, not an error; only transport problems and unexpected
//! or unparsable replies surface as [`ProbeError`]s.

use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, Read};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;
use thiserror::Error;

/// Receive window for a single echo reply.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(1);

const ICMP_ECHO_REQUEST: u8 = 8;
const ICMP_ECHO_REPLY: u8 = 0;
const ICMP_HEADER_LEN: usize = 8;

/// Payload carried in each echo request; identifies our probes in captures.
const PROBE_PAYLOAD: &[u8] = b"laysan-reachability-probe";

/// Probe-layer failures, distinct from a clean timeout.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Could not open the socket or transmit the request. Potentially
    /// transient, but worth surfacing distinctly from a timeout.
    #[error("probe transport failure: {0}")]
    Transport(#[source] io::Error),

    /// The reply did not parse as an ICMP message.
    #[error("malformed echo response ({len} bytes)")]
    MalformedResponse { len: usize },

    /// A well-formed ICMP message arrived, but not an echo reply.
    #[error("unexpected ICMP message type {message_type}")]
    ProtocolAnomaly { message_type: u8 },
}

/// Outcome of one probe. Produced fresh per attempt, never cached.
#[derive(Debug)]
pub enum ProbeResult {
    Reachable,
    Unreachable,
    Error(ProbeError),
}

impl ProbeResult {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Reachable)
    }
}

/// Sends a single echo request and classifies the outcome.
///
/// Repeated polling belongs to the caller, not this trait.
#[async_trait]
pub trait Pinger: Send + Sync {
    async fn check(&self, address: Ipv4Addr) -> ProbeResult;
}

/// Production pinger over an ICMP datagram socket.
pub struct IcmpPinger {
    reply_timeout: Duration,
}

impl IcmpPinger {
    pub fn new() -> Self {
        Self {
            reply_timeout: REPLY_TIMEOUT,
        }
    }

    /// Override the receive window (tests shrink it).
    pub fn with_timeout(reply_timeout: Duration) -> Self {
        Self { reply_timeout }
    }
}

impl Default for IcmpPinger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Pinger for IcmpPinger {
    async fn check(&self, address: Ipv4Addr) -> ProbeResult {
        let timeout = self.reply_timeout;
        // Socket I/O here is blocking; keep it off the async scheduler.
        match tokio::task::spawn_blocking(move || probe_once(address, timeout)).await {
            Ok(result) => result,
            Err(join) => ProbeResult::Error(ProbeError::Transport(io::Error::other(join))),
        }
    }
}

fn probe_once(address: Ipv4Addr, timeout: Duration) -> ProbeResult {
    let mut socket = match open_icmp_socket() {
        Ok(socket) => socket,
        Err(err) => return ProbeResult::Error(ProbeError::Transport(err)),
    };
    if let Err(err) = socket.set_read_timeout(Some(timeout)) {
        return ProbeResult::Error(ProbeError::Transport(err));
    }
    if let Err(err) = socket.connect(&SocketAddrV4::new(address, 0).into()) {
        return ProbeResult::Error(ProbeError::Transport(err));
    }

    let request = echo_request(std::process::id() as u16, 1);
    if let Err(err) = socket.send(&request) {
        return ProbeResult::Error(ProbeError::Transport(err));
    }

    let mut buf = [0u8; 512];
    match socket.read(&mut buf) {
        Ok(len) => classify_reply(&buf[..len]),
        Err(err) if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
            ProbeResult::Unreachable
        }
        Err(err) => ProbeResult::Error(ProbeError::Transport(err)),
    }
}

/// Unprivileged ping socket first; raw needs CAP_NET_RAW.
fn open_icmp_socket() -> io::Result<Socket> {
    Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::ICMPV4))
        .or_else(|_| Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4)))
}

/// Build one echo request: type 8, code 0, caller-supplied identifier and
/// sequence, internet checksum over the whole message.
fn echo_request(identifier: u16, sequence: u16) -> Vec<u8> {
    let mut packet = Vec::with_capacity(ICMP_HEADER_LEN + PROBE_PAYLOAD.len());
    packet.push(ICMP_ECHO_REQUEST);
    packet.push(0); // code
    packet.extend_from_slice(&[0, 0]); // checksum placeholder
    packet.extend_from_slice(&identifier.to_be_bytes());
    packet.extend_from_slice(&sequence.to_be_bytes());
    packet.extend_from_slice(PROBE_PAYLOAD);
    let sum = checksum(&packet);
    packet[2..4].copy_from_slice(&sum.to_be_bytes());
    packet
}

/// RFC 1071 internet checksum.
fn checksum(data: &[u8]) -> u16 {
    let mut sum = 0u32;
    for chunk in data.chunks(2) {
        let word = if chunk.len() == 2 {
            u16::from_be_bytes([chunk[0], chunk[1]])
        } else {
            u16::from_be_bytes([chunk[0], 0])
        };
        sum = sum.wrapping_add(u32::from(word));
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}

/// Classify a received datagram. Raw sockets deliver the IPv4 header in
/// front of the ICMP message; datagram ping sockets do not.
fn classify_reply(datagram: &[u8]) -> ProbeResult {
    let message = strip_ipv4_header(datagram);
    if message.len() < ICMP_HEADER_LEN {
        return ProbeResult::Error(ProbeError::MalformedResponse { len: message.len() });
    }
    match message[0] {
        ICMP_ECHO_REPLY => ProbeResult::Reachable,
        other => ProbeResult::Error(ProbeError::ProtocolAnomaly { message_type: other }),
    }
}

fn strip_ipv4_header(datagram: &[u8]) -> &[u8] {
    if let Some(&first) = datagram.first() {
        if first >> 4 == 4 {
            let header_len = usize::from(first & 0x0f) * 4;
            if header_len >= 20 && datagram.len() >= header_len {
                return &datagram[header_len..];
            }
        }
    }
    datagram
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_reply(identifier: u16, sequence: u16) -> Vec<u8> {
        let mut packet = echo_request(identifier, sequence);
        packet[0] = ICMP_ECHO_REPLY;
        packet[2..4].copy_from_slice(&[0, 0]);
        let sum = checksum(&packet);
        packet[2..4].copy_from_slice(&sum.to_be_bytes());
        packet
    }

    #[test]
    fn checksum_matches_rfc1071_example() {
        let data = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
        assert_eq!(checksum(&data), 0x220d);
    }

    #[test]
    fn echo_request_is_well_formed() {
        let packet = echo_request(0x1234, 1);
        assert_eq!(packet[0], ICMP_ECHO_REQUEST);
        assert_eq!(packet[1], 0);
        assert_eq!(&packet[4..6], &[0x12, 0x34]);
        assert_eq!(&packet[6..8], &[0x00, 0x01]);
        // Summing a message over its embedded checksum folds to zero.
        assert_eq!(checksum(&packet), 0);
    }

    #[test]
    fn echo_reply_classifies_as_reachable() {
        let reply = echo_reply(0x1234, 1);
        assert!(classify_reply(&reply).is_reachable());
    }

    #[test]
    fn raw_socket_reply_with_ip_header_classifies_as_reachable() {
        // Minimal IPv4 header (version 4, IHL 5) in front of the reply.
        let mut datagram = vec![0x45, 0, 0, 0, 0, 0, 0, 0, 64, 1, 0, 0, 127, 0, 0, 1, 127, 0, 0, 1];
        datagram.extend_from_slice(&echo_reply(0x1234, 1));
        assert!(classify_reply(&datagram).is_reachable());
    }

    #[test]
    fn truncated_reply_is_malformed() {
        let result = classify_reply(&[0, 0, 0]);
        assert!(matches!(
            result,
            ProbeResult::Error(ProbeError::MalformedResponse { len: 3 })
        ));
    }

    #[test]
    fn empty_reply_is_malformed() {
        assert!(matches!(
            classify_reply(&[]),
            ProbeResult::Error(ProbeError::MalformedResponse { len: 0 })
        ));
    }

    #[test]
    fn non_echo_message_is_a_protocol_anomaly() {
        // Destination unreachable (type 3).
        let message = [3u8, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            classify_reply(&message),
            ProbeResult::Error(ProbeError::ProtocolAnomaly { message_type: 3 })
        ));
    }
}
