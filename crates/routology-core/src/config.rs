use crate::error::{Error, Result};
use crate::types::{PacketSize, PayloadPattern, Port, Serie, TimeToLive, TraceId, TypeOfService};
use std::fmt::{Debug, Display, Formatter};
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Default values for configuration.
pub mod defaults {
    use crate::config::UdpPortMode;

    /// The default value for `packet-size`.
    pub const DEFAULT_PACKET_SIZE: u16 = 20;

    /// The default value for `payload-pattern`.
    pub const DEFAULT_PAYLOAD_PATTERN: u8 = b'0';

    /// The default value for `tos`.
    pub const DEFAULT_TOS: u8 = 0;

    /// The default value for `max-ttl`.
    pub const DEFAULT_MAX_TTL: u8 = 64;

    /// The default value for `max-serie`.
    pub const DEFAULT_MAX_SERIE: u16 = 255;

    /// The default value for `udp-port-mode`.
    pub const DEFAULT_UDP_PORT_MODE: UdpPortMode = UdpPortMode::Encoded;

    /// The lowest port drawn for a random port default.
    pub const DEFAULT_MIN_RANDOM_PORT: u16 = 2048;
}

/// The maximum size of an `IPv4` probe packet, header included.
pub const MAX_PACKET_SIZE: usize = 1024;

/// The size of the `IPv4` header written for each probe.
pub const IPV4_HEADER_SIZE: usize = 20;

/// The smallest supported `packet-size`, a bare `UDP` or `ICMP` header.
pub const MIN_PACKET_SIZE: usize = 8;

/// The largest supported `packet-size`.
pub const MAX_TRANSPORT_SIZE: usize = MAX_PACKET_SIZE - IPV4_HEADER_SIZE;

/// How `UDP` ports are assigned to probes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UdpPortMode {
    /// The destination port encodes the serie and ttl of the probe and the
    /// source port is drawn afresh for every host group.
    Encoded,
    /// Every probe uses the configured source and base destination port.
    Unified,
}

impl UdpPortMode {
    #[must_use]
    pub const fn is_unified(self) -> bool {
        match self {
            Self::Encoded => false,
            Self::Unified => true,
        }
    }
}

impl Display for UdpPortMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encoded => write!(f, "encoded"),
            Self::Unified => write!(f, "unified"),
        }
    }
}

/// Probe sender configuration.
///
/// All random defaults have already been drawn, a `SenderConfig` is fixed
/// for the lifetime of a [`crate::Sender`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SenderConfig {
    /// The size of the `UDP` and `ICMP` datagrams, header included.
    pub packet_size: PacketSize,
    /// The byte repeated to fill the `UDP` and `ICMP` payloads.
    pub payload_pattern: PayloadPattern,
    pub tos: TypeOfService,
    /// The IP source address, discovered per target when `None`.
    pub source_addr: Option<Ipv4Addr>,
    pub udp_port_mode: UdpPortMode,
    /// The `UDP` source port used in unified mode.
    pub udp_src_port: Port,
    /// The `UDP` destination port of the probe with serie 0 and ttl 1.
    pub udp_dest_port: Port,
    pub tcp_src_port: Port,
    pub tcp_dest_port: Port,
    pub icmp_identifier: TraceId,
    pub max_ttl: TimeToLive,
    pub max_serie: Serie,
}

impl SenderConfig {
    /// Check the configuration is usable.
    ///
    /// In encoded mode the highest destination port which can be produced,
    /// `udp_dest_port + max_serie + max_ttl - 1`, must fit in a port.
    pub fn validate(&self) -> Result<()> {
        let packet_size = usize::from(self.packet_size.0);
        if !(MIN_PACKET_SIZE..=MAX_TRANSPORT_SIZE).contains(&packet_size) {
            return Err(Error::InvalidPacketSize(packet_size));
        }
        if self.max_ttl.0 == 0 {
            return Err(Error::BadConfig("max_ttl must be at least 1".to_string()));
        }
        if self.udp_port_mode == UdpPortMode::Encoded {
            let highest = u32::from(self.udp_dest_port.0)
                + u32::from(self.max_serie.0)
                + u32::from(self.max_ttl.0)
                - 1;
            if highest > u32::from(u16::MAX) {
                return Err(Error::PortOverflow {
                    base: self.udp_dest_port.0,
                    serie: self.max_serie.0,
                    ttl: self.max_ttl.0,
                });
            }
        }
        Ok(())
    }

    /// The largest base destination port usable in encoded mode.
    pub(crate) fn max_udp_dest_port(max_serie: Serie, max_ttl: TimeToLive) -> Option<u16> {
        let span = u32::from(max_serie.0) + u32::from(max_ttl.0.max(1)) - 1;
        u32::from(u16::MAX)
            .checked_sub(span)
            .and_then(|port| u16::try_from(port).ok())
    }

    /// The `UDP` and `ICMP` payload for this configuration.
    pub(crate) fn payload(&self) -> Vec<u8> {
        let len = usize::from(self.packet_size.0).saturating_sub(MIN_PACKET_SIZE);
        vec![self.payload_pattern.0; len]
    }
}

/// A generator of `TCP` sequence numbers.
pub type TcpSequenceGenerator = Arc<dyn Fn() -> u32 + Send + Sync>;

/// A generator of `ICMP` echo sequence numbers.
pub type IcmpSequenceGenerator = Arc<dyn Fn() -> u16 + Send + Sync>;

/// The per request sequence number generators.
///
/// Each generator is called once per request, in request order.
#[derive(Clone)]
pub struct Generators {
    pub tcp_sequence: TcpSequenceGenerator,
    pub icmp_sequence: IcmpSequenceGenerator,
}

impl Default for Generators {
    fn default() -> Self {
        Self {
            tcp_sequence: Arc::new(rand::random::<u32>),
            icmp_sequence: Arc::new(rand::random::<u16>),
        }
    }
}

impl Debug for Generators {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generators").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn config() -> SenderConfig {
        SenderConfig {
            packet_size: PacketSize(defaults::DEFAULT_PACKET_SIZE),
            payload_pattern: PayloadPattern(defaults::DEFAULT_PAYLOAD_PATTERN),
            tos: TypeOfService(defaults::DEFAULT_TOS),
            source_addr: None,
            udp_port_mode: defaults::DEFAULT_UDP_PORT_MODE,
            udp_src_port: Port(5000),
            udp_dest_port: Port(33434),
            tcp_src_port: Port(6000),
            tcp_dest_port: Port(80),
            icmp_identifier: TraceId(1234),
            max_ttl: TimeToLive(defaults::DEFAULT_MAX_TTL),
            max_serie: Serie(defaults::DEFAULT_MAX_SERIE),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test_case(7, false)]
    #[test_case(8, true)]
    #[test_case(20, true)]
    #[test_case(1004, true)]
    #[test_case(1005, false)]
    fn test_validate_packet_size(size: u16, valid: bool) {
        let cfg = SenderConfig {
            packet_size: PacketSize(size),
            ..config()
        };
        assert_eq!(valid, cfg.validate().is_ok());
    }

    #[test_case(65535 - 255 - 64 + 1, true; "highest usable base")]
    #[test_case(65535 - 255 - 64 + 2, false; "one past highest")]
    #[test_case(65535, false; "max port")]
    fn test_validate_encoded_port_headroom(base: u16, valid: bool) {
        let cfg = SenderConfig {
            udp_dest_port: Port(base),
            ..config()
        };
        let res = cfg.validate();
        assert_eq!(valid, res.is_ok());
        if !valid {
            assert!(matches!(res, Err(Error::PortOverflow { .. })));
        }
    }

    #[test]
    fn test_validate_unified_ignores_headroom() {
        let cfg = SenderConfig {
            udp_port_mode: UdpPortMode::Unified,
            udp_dest_port: Port(65535),
            ..config()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_max_ttl() {
        let cfg = SenderConfig {
            max_ttl: TimeToLive(0),
            ..config()
        };
        assert!(matches!(cfg.validate(), Err(Error::BadConfig(_))));
    }

    #[test_case(255, 64, Some(65217))]
    #[test_case(0, 1, Some(65535))]
    #[test_case(u16::MAX, 2, None)]
    fn test_max_udp_dest_port(serie: u16, ttl: u8, expected: Option<u16>) {
        assert_eq!(
            expected,
            SenderConfig::max_udp_dest_port(Serie(serie), TimeToLive(ttl))
        );
    }

    #[test]
    fn test_payload() {
        assert_eq!(b"000000000000".to_vec(), config().payload());
        let bare = SenderConfig {
            packet_size: PacketSize(8),
            ..config()
        };
        assert!(bare.payload().is_empty());
    }
}
