use crate::config::SenderConfig;
use crate::encoder::GroupEncoding;
use crate::error::{Error, Result};
use crate::probe::{ProbeFields, ProbeInfo, ProbeType};
use crate::request::{HostId, SendRequest};
use crate::types::{Port, Sequence, TcpSequence, TimeToLive, TraceId, TypeOfService};
use indexmap::IndexMap;
use routology_packet::checksum::{
    icmp_ipv4_checksum, ipv4_header_checksum, tcp_ipv4_checksum, udp_ipv4_checksum,
};
use routology_packet::icmp::{EchoRequestPacket, ECHO_REQUEST_TYPE};
use routology_packet::ipv4::Ipv4Packet;
use routology_packet::tcp::{TcpPacket, TCP_FLAG_SYN};
use routology_packet::udp::UdpPacket;
use routology_packet::IpProtocol;
use std::net::Ipv4Addr;
use std::time::SystemTime;

/// The don't fragment flag of the `IPv4` flags and fragment offset field.
const DONT_FRAGMENT: u16 = 0x4000;

/// The `TCP` header length in 32-bit words.
const TCP_DATA_OFFSET: u8 = 5;

/// The `TCP` receive window advertised in `SYN` probes.
const TCP_WINDOW_SIZE: u16 = 8192;

/// Group requests by host.
///
/// Groups are ordered by the first appearance of each host and requests keep
/// their relative order within a group.
#[must_use]
pub fn group_by_host(requests: &[SendRequest]) -> IndexMap<HostId, Vec<SendRequest>> {
    requests
        .iter()
        .fold(IndexMap::new(), |mut groups, request| {
            groups
                .entry(request.host.clone())
                .or_insert_with(Vec::new)
                .push(request.clone());
            groups
        })
}

/// The transport layer of a [`ProbeTemplate`].
///
/// List valued fields hold one value per probe, fixed fields are shared by
/// every probe of the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportTemplate {
    Udp {
        src_port: Port,
        dest_ports: Vec<Port>,
        payload: Vec<u8>,
    },
    Icmp {
        identifier: TraceId,
        sequences: Vec<Sequence>,
        payload: Vec<u8>,
    },
    Tcp {
        src_port: Port,
        dest_port: Port,
        sequences: Vec<TcpSequence>,
    },
}

impl TransportTemplate {
    #[must_use]
    pub const fn probe_type(&self) -> ProbeType {
        match self {
            Self::Udp { .. } => ProbeType::Udp,
            Self::Icmp { .. } => ProbeType::Icmp,
            Self::Tcp { .. } => ProbeType::Tcp,
        }
    }

    const fn ip_protocol(&self) -> IpProtocol {
        match self {
            Self::Udp { .. } => IpProtocol::Udp,
            Self::Icmp { .. } => IpProtocol::Icmp,
            Self::Tcp { .. } => IpProtocol::Tcp,
        }
    }

    /// The name and length of the list valued field.
    fn list_len(&self) -> (&'static str, usize) {
        match self {
            Self::Udp { dest_ports, .. } => ("dest_ports", dest_ports.len()),
            Self::Icmp { sequences, .. } => ("sequences", sequences.len()),
            Self::Tcp { sequences, .. } => ("sequences", sequences.len()),
        }
    }
}

/// A list valued description of the probes of one protocol to one host.
///
/// Expanding the template yields one packet per position, the `i`th packet
/// taking the `i`th value of every list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTemplate {
    dest_addr: Ipv4Addr,
    ttls: Vec<TimeToLive>,
    layer: TransportTemplate,
}

impl ProbeTemplate {
    /// Create a template, every list must have the same length as `ttls`.
    pub fn new(
        dest_addr: Ipv4Addr,
        ttls: Vec<TimeToLive>,
        layer: TransportTemplate,
    ) -> Result<Self> {
        let (field, actual) = layer.list_len();
        if actual != ttls.len() {
            return Err(Error::MisalignedTemplate {
                protocol: layer.probe_type(),
                field,
                expected: ttls.len(),
                actual,
            });
        }
        Ok(Self {
            dest_addr,
            ttls,
            layer,
        })
    }

    #[must_use]
    pub const fn dest_addr(&self) -> Ipv4Addr {
        self.dest_addr
    }

    #[must_use]
    pub fn ttls(&self) -> &[TimeToLive] {
        &self.ttls
    }

    #[must_use]
    pub const fn layer(&self) -> &TransportTemplate {
        &self.layer
    }

    #[must_use]
    pub const fn probe_type(&self) -> ProbeType {
        self.layer.probe_type()
    }

    /// The number of probes described by the template.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ttls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ttls.is_empty()
    }

    /// The protocol fields of the probe at `index`.
    #[must_use]
    pub fn fields(&self, index: usize) -> Option<ProbeFields> {
        match &self.layer {
            TransportTemplate::Udp {
                src_port,
                dest_ports,
                ..
            } => dest_ports.get(index).map(|&dest_port| ProbeFields::Udp {
                src_port: *src_port,
                dest_port,
            }),
            TransportTemplate::Icmp {
                identifier,
                sequences,
                ..
            } => sequences.get(index).map(|&sequence| ProbeFields::Icmp {
                identifier: *identifier,
                sequence,
            }),
            TransportTemplate::Tcp {
                src_port,
                dest_port,
                sequences,
            } => sequences.get(index).map(|&sequence| ProbeFields::Tcp {
                src_port: *src_port,
                dest_port: *dest_port,
                sequence,
            }),
        }
    }

    /// Expand the template into one `IPv4` packet per probe.
    pub fn expand(&self, src_addr: Ipv4Addr, tos: TypeOfService) -> Result<Vec<Packet>> {
        self.ttls
            .iter()
            .enumerate()
            .map(|(index, &ttl)| {
                let transport = self.transport_bytes(index, src_addr)?;
                let bytes = self.ipv4_bytes(src_addr, ttl, tos, &transport)?;
                Ok(Packet {
                    protocol: self.probe_type(),
                    dest_addr: self.dest_addr,
                    ttl,
                    bytes,
                })
            })
            .collect()
    }

    fn transport_bytes(&self, index: usize, src_addr: Ipv4Addr) -> Result<Vec<u8>> {
        let fields = self.fields(index).ok_or(Error::MisalignedTemplate {
            protocol: self.probe_type(),
            field: self.layer.list_len().0,
            expected: self.ttls.len(),
            actual: index,
        })?;
        match (&self.layer, fields) {
            (
                TransportTemplate::Udp { payload, .. },
                ProbeFields::Udp {
                    src_port,
                    dest_port,
                },
            ) => make_udp(src_addr, self.dest_addr, src_port, dest_port, payload),
            (
                TransportTemplate::Icmp { payload, .. },
                ProbeFields::Icmp {
                    identifier,
                    sequence,
                },
            ) => make_echo_request(identifier, sequence, payload),
            (
                TransportTemplate::Tcp { .. },
                ProbeFields::Tcp {
                    src_port,
                    dest_port,
                    sequence,
                },
            ) => make_tcp_syn(src_addr, self.dest_addr, src_port, dest_port, sequence),
            _ => Err(Error::Other(format!(
                "{} template produced mismatched fields",
                self.probe_type()
            ))),
        }
    }

    fn ipv4_bytes(
        &self,
        src_addr: Ipv4Addr,
        ttl: TimeToLive,
        tos: TypeOfService,
        transport: &[u8],
    ) -> Result<Vec<u8>> {
        let total_length = Ipv4Packet::minimum_packet_size() + transport.len();
        let total_length_header =
            u16::try_from(total_length).map_err(|_| Error::InvalidPacketSize(total_length))?;
        let mut buf = vec![0_u8; total_length];
        let mut ipv4 = Ipv4Packet::new(&mut buf)?;
        ipv4.set_version(4);
        ipv4.set_header_length(5);
        ipv4.set_tos(tos.0);
        ipv4.set_total_length(total_length_header);
        ipv4.set_identification(0);
        ipv4.set_flags_and_fragment_offset(DONT_FRAGMENT);
        ipv4.set_ttl(ttl.0);
        ipv4.set_protocol(self.layer.ip_protocol());
        ipv4.set_source(src_addr);
        ipv4.set_destination(self.dest_addr);
        ipv4.set_payload(transport)?;
        ipv4.set_checksum(ipv4_header_checksum(ipv4.header()));
        Ok(buf)
    }
}

fn make_udp(
    src_addr: Ipv4Addr,
    dest_addr: Ipv4Addr,
    src_port: Port,
    dest_port: Port,
    payload: &[u8],
) -> Result<Vec<u8>> {
    let size = UdpPacket::minimum_packet_size() + payload.len();
    let length = u16::try_from(size).map_err(|_| Error::InvalidPacketSize(size))?;
    let mut buf = vec![0_u8; size];
    let mut udp = UdpPacket::new(&mut buf)?;
    udp.set_source(src_port.0);
    udp.set_destination(dest_port.0);
    udp.set_length(length);
    udp.set_payload(payload)?;
    udp.set_checksum(udp_ipv4_checksum(udp.packet(), src_addr, dest_addr));
    Ok(buf)
}

fn make_echo_request(identifier: TraceId, sequence: Sequence, payload: &[u8]) -> Result<Vec<u8>> {
    let mut buf = vec![0_u8; EchoRequestPacket::minimum_packet_size() + payload.len()];
    let mut icmp = EchoRequestPacket::new(&mut buf)?;
    icmp.set_icmp_type(ECHO_REQUEST_TYPE);
    icmp.set_icmp_code(0);
    icmp.set_identifier(identifier.0);
    icmp.set_sequence(sequence.0);
    icmp.set_payload(payload)?;
    icmp.set_checksum(icmp_ipv4_checksum(icmp.packet()));
    Ok(buf)
}

fn make_tcp_syn(
    src_addr: Ipv4Addr,
    dest_addr: Ipv4Addr,
    src_port: Port,
    dest_port: Port,
    sequence: TcpSequence,
) -> Result<Vec<u8>> {
    let mut buf = vec![0_u8; TcpPacket::minimum_packet_size()];
    let mut tcp = TcpPacket::new(&mut buf)?;
    tcp.set_source(src_port.0);
    tcp.set_destination(dest_port.0);
    tcp.set_sequence(sequence.0);
    tcp.set_acknowledgement(0);
    tcp.set_data_offset(TCP_DATA_OFFSET);
    tcp.set_flags(TCP_FLAG_SYN);
    tcp.set_window_size(TCP_WINDOW_SIZE);
    tcp.set_urgent_pointer(0);
    tcp.set_checksum(tcp_ipv4_checksum(tcp.packet(), src_addr, dest_addr));
    Ok(buf)
}

/// A concrete `IPv4` probe packet ready for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub protocol: ProbeType,
    pub dest_addr: Ipv4Addr,
    pub ttl: TimeToLive,
    pub bytes: Vec<u8>,
}

/// The requests to one host and the three templates built for them.
#[derive(Debug, Clone)]
pub struct HostBatch {
    host: HostId,
    requests: Vec<SendRequest>,
    udp: ProbeTemplate,
    icmp: ProbeTemplate,
    tcp: ProbeTemplate,
}

impl HostBatch {
    /// Assemble the templates for a host group from its encoding.
    pub fn new(
        config: &SenderConfig,
        host: HostId,
        requests: Vec<SendRequest>,
        encoding: GroupEncoding,
    ) -> Result<Self> {
        let dest_addr = host.addr();
        let ttls: Vec<_> = requests.iter().map(|req| req.ttl).collect();
        let payload = config.payload();
        let udp = ProbeTemplate::new(
            dest_addr,
            ttls.clone(),
            TransportTemplate::Udp {
                src_port: encoding.udp_src_port,
                dest_ports: encoding.udp_dest_ports,
                payload: payload.clone(),
            },
        )?;
        let icmp = ProbeTemplate::new(
            dest_addr,
            ttls.clone(),
            TransportTemplate::Icmp {
                identifier: config.icmp_identifier,
                sequences: encoding.icmp_sequences,
                payload,
            },
        )?;
        let tcp = ProbeTemplate::new(
            dest_addr,
            ttls,
            TransportTemplate::Tcp {
                src_port: config.tcp_src_port,
                dest_port: config.tcp_dest_port,
                sequences: encoding.tcp_sequences,
            },
        )?;
        Ok(Self {
            host,
            requests,
            udp,
            icmp,
            tcp,
        })
    }

    #[must_use]
    pub const fn host(&self) -> &HostId {
        &self.host
    }

    #[must_use]
    pub fn requests(&self) -> &[SendRequest] {
        &self.requests
    }

    /// The templates in transmission order, `UDP` then `ICMP` then `TCP`.
    #[must_use]
    pub fn templates(&self) -> [&ProbeTemplate; 3] {
        [&self.udp, &self.icmp, &self.tcp]
    }

    /// The probe records, `UDP` then `TCP` then `ICMP` for each request.
    #[must_use]
    pub fn probe_infos(&self, time: SystemTime) -> Vec<ProbeInfo> {
        self.requests
            .iter()
            .enumerate()
            .flat_map(|(index, request)| {
                [&self.udp, &self.tcp, &self.icmp]
                    .into_iter()
                    .filter_map(move |template| template.fields(index))
                    .map(move |fields| ProbeInfo {
                        ttl: request.ttl,
                        serie: request.serie,
                        time,
                        host: request.host.clone(),
                        fields,
                    })
            })
            .collect()
    }
}
