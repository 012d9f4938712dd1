//! Per request protocol field derivation.
//!
//! The encoder turns one host group of [`SendRequest`] into the header values
//! which let a correlator recognise each probe from the truncated copy of it
//! quoted in an ICMP error.
use crate::config::{defaults, Generators, SenderConfig, UdpPortMode};
use crate::error::{Error, Result};
use crate::request::SendRequest;
use crate::types::{Port, Sequence, Serie, TcpSequence, TimeToLive};
use rand::Rng;

/// The protocol fields of one host group, index aligned with the requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEncoding {
    pub udp_src_port: Port,
    pub udp_dest_ports: Vec<Port>,
    pub icmp_sequences: Vec<Sequence>,
    pub tcp_sequences: Vec<TcpSequence>,
}

/// Check a request against the configured limits.
pub fn validate_request(config: &SenderConfig, request: &SendRequest) -> Result<()> {
    let ttl = request.ttl.0;
    if ttl == 0 || ttl > config.max_ttl.0 {
        return Err(Error::InvalidTtl(ttl, config.max_ttl.0));
    }
    if request.serie > config.max_serie {
        return Err(Error::SerieOutOfRange(request.serie.0, config.max_serie.0));
    }
    Ok(())
}

/// The `UDP` destination port of a probe.
///
/// In encoded mode this is `base + serie + ttl - 1`, so the first probe of the
/// first serie uses the base port itself.
pub fn udp_dest_port(config: &SenderConfig, ttl: TimeToLive, serie: Serie) -> Result<Port> {
    let base = config.udp_dest_port;
    match config.udp_port_mode {
        UdpPortMode::Unified => Ok(base),
        UdpPortMode::Encoded => (u32::from(base.0) + u32::from(serie.0) + u32::from(ttl.0))
            .checked_sub(1)
            .and_then(|port| u16::try_from(port).ok())
            .map(Port)
            .ok_or(Error::PortOverflow {
                base: base.0,
                serie: serie.0,
                ttl: ttl.0,
            }),
    }
}

/// Recover `serie + ttl` from an encoded `UDP` destination port.
///
/// Returns `None` if `dest_port` is below `base`.
#[must_use]
pub fn udp_probe_offset(base: Port, dest_port: Port) -> Option<u32> {
    u32::from(dest_port.0)
        .checked_sub(u32::from(base.0))
        .map(|offset| offset + 1)
}

/// Derive the protocol fields for a non-empty group of requests to one host.
///
/// Every request is validated before any generator is called.
pub fn encode_group<R: Rng>(
    config: &SenderConfig,
    generators: &Generators,
    rng: &mut R,
    requests: &[SendRequest],
) -> Result<GroupEncoding> {
    for request in requests {
        validate_request(config, request)?;
    }
    let udp_dest_ports = requests
        .iter()
        .map(|req| udp_dest_port(config, req.ttl, req.serie))
        .collect::<Result<Vec<_>>>()?;
    let udp_src_port = match config.udp_port_mode {
        UdpPortMode::Unified => config.udp_src_port,
        UdpPortMode::Encoded => Port(rng.gen_range(defaults::DEFAULT_MIN_RANDOM_PORT..=u16::MAX)),
    };
    let icmp_sequences = requests
        .iter()
        .map(|_| Sequence((generators.icmp_sequence)()))
        .collect();
    let tcp_sequences = requests
        .iter()
        .map(|_| TcpSequence((generators.tcp_sequence)()))
        .collect();
    Ok(GroupEncoding {
        udp_src_port,
        udp_dest_ports,
        icmp_sequences,
        tcp_sequences,
    })
}
