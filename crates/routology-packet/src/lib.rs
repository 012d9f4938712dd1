//! Wire format views for the packets emitted by Routology.
//!
//! The following packets are supported:
//! - `IPv4`
//! - `UDP`
//! - `TCP`
//! - `ICMPv4` echo request
//!
//! Only what a probe sender needs is provided: each packet type can be
//! created over a mutable buffer and written field by field, or viewed over
//! an immutable buffer and read back.
//!
//! # Endianness
//!
//! The buffer always holds network byte order (big-endian) and the accessor
//! methods take and return host byte order values.
//!
//! # Example
//!
//! Build an `ICMPv4` echo request and check the wire bytes:
//!
//! ```rust
//! # fn main() -> anyhow::Result<()> {
//! use routology_packet::checksum::icmp_ipv4_checksum;
//! use routology_packet::icmp::EchoRequestPacket;
//!
//! let mut buf = [0; EchoRequestPacket::minimum_packet_size()];
//! let mut icmp = EchoRequestPacket::new(&mut buf)?;
//! icmp.set_icmp_type(8);
//! icmp.set_icmp_code(0);
//! icmp.set_identifier(1234);
//! icmp.set_sequence(10);
//! icmp.set_checksum(icmp_ipv4_checksum(icmp.packet()));
//! assert_eq!(icmp.packet(), &hex_literal::hex!("08 00 f3 23 04 d2 00 0a"));
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

mod buffer;

/// Packet errors.
pub mod error;

/// Internet checksums for `IPv4` headers and their payloads.
pub mod checksum;

/// `ICMPv4` echo request packets.
pub mod icmp;

/// `IPv4` packets.
pub mod ipv4;

/// `UDP` packets.
pub mod udp;

/// `TCP` packets.
pub mod tcp;

/// The protocol carried by an `IPv4` packet.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum IpProtocol {
    Icmp,
    Udp,
    Tcp,
    Other(u8),
}

impl IpProtocol {
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Icmp => 1,
            Self::Udp => 17,
            Self::Tcp => 6,
            Self::Other(id) => id,
        }
    }
}

impl From<u8> for IpProtocol {
    fn from(id: u8) -> Self {
        match id {
            1 => Self::Icmp,
            17 => Self::Udp,
            6 => Self::Tcp,
            p => Self::Other(p),
        }
    }
}

/// Format bytes as space separated hex.
#[must_use]
pub fn fmt_payload(bytes: &[u8]) -> String {
    use itertools::Itertools as _;
    format!("{:02x}", bytes.iter().format(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1, IpProtocol::Icmp)]
    #[test_case(6, IpProtocol::Tcp)]
    #[test_case(17, IpProtocol::Udp)]
    #[test_case(58, IpProtocol::Other(58))]
    fn test_ip_protocol(id: u8, expected: IpProtocol) {
        let protocol = IpProtocol::from(id);
        assert_eq!(expected, protocol);
        assert_eq!(id, protocol.id());
    }

    #[test]
    fn test_fmt_payload() {
        assert_eq!("00 0a ff", fmt_payload(&[0x00, 0x0a, 0xff]));
        assert_eq!("", fmt_payload(&[]));
    }
}
