use crate::request::HostId;
use crate::types::{Port, Sequence, Serie, TcpSequence, TimeToLive, TraceId};
use std::fmt::{Display, Formatter};
use std::time::SystemTime;

/// The protocol of a probe.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ProbeType {
    /// User Datagram Protocol
    Udp,
    /// Transmission Control Protocol (SYN)
    Tcp,
    /// Internet Control Message Protocol (echo request)
    Icmp,
}

impl Display for ProbeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Udp => write!(f, "udp"),
            Self::Tcp => write!(f, "tcp"),
            Self::Icmp => write!(f, "icmp"),
        }
    }
}

/// The record of a single sent probe.
///
/// Three `ProbeInfo` records, one per [`ProbeType`], are produced for every
/// [`crate::SendRequest`]. A correlator keeps these records and matches the
/// fields quoted back in ICMP error replies against [`ProbeInfo::fields`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeInfo {
    /// The TTL of the probe.
    pub ttl: TimeToLive,
    /// The probe series the probe belongs to.
    pub serie: Serie,
    /// When the record was created.
    ///
    /// This precedes the moment the packet is written to the wire.
    pub time: SystemTime,
    /// The target of the probe.
    pub host: HostId,
    /// The protocol header values of the probe.
    pub fields: ProbeFields,
}

impl ProbeInfo {
    #[must_use]
    pub const fn probe_type(&self) -> ProbeType {
        self.fields.probe_type()
    }
}

/// The protocol specific header values of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFields {
    Udp {
        src_port: Port,
        dest_port: Port,
    },
    Tcp {
        src_port: Port,
        dest_port: Port,
        sequence: TcpSequence,
    },
    Icmp {
        identifier: TraceId,
        sequence: Sequence,
    },
}

impl ProbeFields {
    #[must_use]
    pub const fn probe_type(&self) -> ProbeType {
        match self {
            Self::Udp { .. } => ProbeType::Udp,
            Self::Tcp { .. } => ProbeType::Tcp,
            Self::Icmp { .. } => ProbeType::Icmp,
        }
    }
}
