//! Routology - multi-protocol path discovery probes.
//!
//! This crate builds and sends the probes of a multi-protocol traceroute.
//! Every request to probe a host at a given ttl, as part of a given probe
//! serie, produces one `UDP`, one `TCP` `SYN` and one `ICMP` echo request
//! probe. The header values of each probe are chosen so that a downstream
//! correlator can tell which probe provoked an ICMP error, even though the
//! router which sent the error quotes only the first 8 bytes of the original
//! transport header.
//!
//! # Example
//!
//! The following example sends one serie of probes with ttl 1 to 30 to a
//! host and collects the probe records on a channel:
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use routology_core::{Builder, ProbeInfo, SendRequest};
//! use std::net::Ipv4Addr;
//! use std::time::Duration;
//!
//! let (tx, rx) = crossbeam::channel::unbounded::<ProbeInfo>();
//! let sender = Builder::new(tx).build()?;
//! let host = Ipv4Addr::new(1, 1, 1, 1);
//! let requests: Vec<_> = (1..=30).map(|ttl| SendRequest::new(ttl, 0, host)).collect();
//! let transmission = sender.send_probes(&requests, Duration::from_millis(1))?;
//! for probe in rx.try_iter() {
//!     println!("{} {} {}", probe.host, probe.ttl, probe.probe_type());
//! }
//! if let Some(transmission) = transmission {
//!     transmission.join()?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Encoding
//!
//! In [`UdpPortMode::Encoded`] mode the `UDP` destination port of a probe is
//! `base + serie + ttl - 1`, see [`udp_probe_offset`]. The `TCP` and `ICMP`
//! sequence numbers come from generators and must be matched against the
//! recorded [`ProbeInfo`].
//!
//! # See Also
//!
//! - [`Builder`] - Build a [`Sender`].
//! - [`Sender::send_probes`] - Record and send probes.
//! - [`ProbeSink`] - Consume probe records.
#![allow(
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::use_self,
    clippy::option_if_let_else,
    clippy::missing_const_for_fn,
    clippy::missing_errors_doc
)]
#![forbid(unsafe_code)]

mod batch;
mod builder;
mod config;
mod encoder;
mod error;
mod net;
mod probe;
mod request;
mod sender;
mod transmit;
mod types;

pub mod sink;

pub use batch::{group_by_host, HostBatch, Packet, ProbeTemplate, TransportTemplate};
pub use builder::Builder;
pub use config::{
    defaults, Generators, IcmpSequenceGenerator, SenderConfig, TcpSequenceGenerator, UdpPortMode,
    MAX_PACKET_SIZE, MAX_TRANSPORT_SIZE, MIN_PACKET_SIZE,
};
pub use encoder::{encode_group, udp_dest_port, udp_probe_offset, validate_request, GroupEncoding};
pub use error::{Error, IoError, IoOperation, IoResult, Result};
#[cfg(unix)]
pub use net::RawSocketTransport;
pub use net::Transport;
pub use probe::{ProbeFields, ProbeInfo, ProbeType};
pub use request::{HostId, SendRequest};
pub use sender::Sender;
pub use sink::ProbeSink;
pub use transmit::{TransmitFailure, TransmitReport, Transmission};
pub use types::{
    PacketSize, PayloadPattern, Port, Sequence, Serie, TcpSequence, TimeToLive, TraceId,
    TypeOfService,
};
