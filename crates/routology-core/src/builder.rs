use crate::config::{defaults, Generators, SenderConfig, UdpPortMode};
use crate::error::{Error, Result};
use crate::net::Transport;
use crate::sink::ProbeSink;
use crate::types::{PacketSize, PayloadPattern, Port, Serie, TimeToLive, TraceId, TypeOfService};
use crate::Sender;
use rand::Rng;
use std::fmt::{Debug, Formatter};
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Build a probe sender.
///
/// Any port or identifier which is not set is drawn at random when the
/// [`Sender`] is built, so each sender gets its own values.
///
/// # Examples
///
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// use routology_core::{sink, Builder, Port, UdpPortMode};
///
/// let sender = Builder::new(sink::from_fn(|probe| println!("{probe:?}")))
///     .udp_port_mode(UdpPortMode::Encoded)
///     .udp_dest_port(Port(33434))
///     .tcp_dest_port(Port(443))
///     .build()?;
/// # Ok(())
/// # }
/// ```
///
/// # See Also
///
/// - [`Sender`] - A multi-protocol probe sender.
pub struct Builder {
    sink: Arc<dyn ProbeSink>,
    source_addr: Option<Ipv4Addr>,
    packet_size: PacketSize,
    payload_pattern: PayloadPattern,
    tos: TypeOfService,
    udp_port_mode: UdpPortMode,
    udp_src_port: Option<Port>,
    udp_dest_port: Option<Port>,
    tcp_src_port: Option<Port>,
    tcp_dest_port: Option<Port>,
    icmp_identifier: Option<TraceId>,
    max_ttl: TimeToLive,
    max_serie: Serie,
    generators: Generators,
}

impl Builder {
    /// Build a sender builder which records probes to `sink`.
    ///
    /// # Examples
    ///
    /// Collect the probe records in memory:
    ///
    /// ```no_run
    /// # fn main() -> anyhow::Result<()> {
    /// use parking_lot::Mutex;
    /// use routology_core::{Builder, ProbeInfo};
    /// use std::sync::Arc;
    ///
    /// let records = Arc::new(Mutex::new(Vec::<ProbeInfo>::new()));
    /// let sender = Builder::new(records.clone()).build()?;
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn new<S: ProbeSink + 'static>(sink: S) -> Self {
        Self {
            sink: Arc::new(sink),
            source_addr: None,
            packet_size: PacketSize(defaults::DEFAULT_PACKET_SIZE),
            payload_pattern: PayloadPattern(defaults::DEFAULT_PAYLOAD_PATTERN),
            tos: TypeOfService(defaults::DEFAULT_TOS),
            udp_port_mode: defaults::DEFAULT_UDP_PORT_MODE,
            udp_src_port: None,
            udp_dest_port: None,
            tcp_src_port: None,
            tcp_dest_port: None,
            icmp_identifier: None,
            max_ttl: TimeToLive(defaults::DEFAULT_MAX_TTL),
            max_serie: Serie(defaults::DEFAULT_MAX_SERIE),
            generators: Generators::default(),
        }
    }

    /// Set the source address.
    ///
    /// If not set then the source address is discovered by the transport for
    /// each target.
    #[must_use]
    pub fn source_addr(self, source_addr: Option<Ipv4Addr>) -> Self {
        Self {
            source_addr,
            ..self
        }
    }

    /// Set the packet size.
    ///
    /// This is the size of the `UDP` and `ICMP` datagrams, including the
    /// 8 byte header and excluding the `IPv4` header. `TCP` probes carry no
    /// payload.
    ///
    /// If not set then 20 is used.
    #[must_use]
    pub fn packet_size(self, packet_size: PacketSize) -> Self {
        Self {
            packet_size,
            ..self
        }
    }

    /// Set the payload pattern.
    ///
    /// The payload of `UDP` and `ICMP` probes is filled with this byte.
    ///
    /// If not set then the ASCII digit `0` is used.
    #[must_use]
    pub fn payload_pattern(self, payload_pattern: PayloadPattern) -> Self {
        Self {
            payload_pattern,
            ..self
        }
    }

    /// Set the type-of-service (TOS) of the `IPv4` header.
    #[must_use]
    pub fn tos(self, tos: TypeOfService) -> Self {
        Self { tos, ..self }
    }

    /// Set how `UDP` ports are assigned.
    ///
    /// # Examples
    ///
    /// Use the same `UDP` ports for every probe:
    ///
    /// ```no_run
    /// # fn main() -> anyhow::Result<()> {
    /// use routology_core::{sink, Builder, Port, UdpPortMode};
    ///
    /// let sender = Builder::new(sink::from_fn(|_| {}))
    ///     .udp_port_mode(UdpPortMode::Unified)
    ///     .udp_src_port(Port(5000))
    ///     .udp_dest_port(Port(33434))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn udp_port_mode(self, udp_port_mode: UdpPortMode) -> Self {
        Self {
            udp_port_mode,
            ..self
        }
    }

    /// Set the `UDP` source port used in [`UdpPortMode::Unified`] mode.
    ///
    /// In [`UdpPortMode::Encoded`] mode a fresh source port is drawn for
    /// every host group instead.
    #[must_use]
    pub fn udp_src_port(self, port: Port) -> Self {
        Self {
            udp_src_port: Some(port),
            ..self
        }
    }

    /// Set the base `UDP` destination port.
    ///
    /// In [`UdpPortMode::Encoded`] mode the probe for serie `s` and ttl `t`
    /// is sent to `base + s + t - 1`, so `base + max_serie + max_ttl - 1` must
    /// not exceed 65535.
    ///
    /// If not set then a port is drawn at random from the range which leaves
    /// room for every serie and ttl.
    #[must_use]
    pub fn udp_dest_port(self, port: Port) -> Self {
        Self {
            udp_dest_port: Some(port),
            ..self
        }
    }

    #[must_use]
    pub fn tcp_src_port(self, port: Port) -> Self {
        Self {
            tcp_src_port: Some(port),
            ..self
        }
    }

    #[must_use]
    pub fn tcp_dest_port(self, port: Port) -> Self {
        Self {
            tcp_dest_port: Some(port),
            ..self
        }
    }

    /// Set the `ICMP` echo identifier.
    ///
    /// If not set then a random identifier is used.
    #[must_use]
    pub fn icmp_identifier(self, icmp_identifier: TraceId) -> Self {
        Self {
            icmp_identifier: Some(icmp_identifier),
            ..self
        }
    }

    /// Set the maximum ttl of a request.
    ///
    /// If not set then 64 is used.
    #[must_use]
    pub fn max_ttl(self, max_ttl: TimeToLive) -> Self {
        Self { max_ttl, ..self }
    }

    /// Set the maximum serie of a request.
    ///
    /// If not set then 255 is used.
    #[must_use]
    pub fn max_serie(self, max_serie: Serie) -> Self {
        Self { max_serie, ..self }
    }

    /// Set the generator of `TCP` sequence numbers.
    ///
    /// The generator is called once per request. If not set then sequence
    /// numbers are drawn uniformly at random.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # fn main() -> anyhow::Result<()> {
    /// use routology_core::{sink, Builder};
    /// use std::sync::atomic::{AtomicU32, Ordering};
    ///
    /// let next = AtomicU32::new(0);
    /// let sender = Builder::new(sink::from_fn(|_| {}))
    ///     .tcp_sequence_generator(move || next.fetch_add(1, Ordering::Relaxed))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn tcp_sequence_generator<F>(self, generator: F) -> Self
    where
        F: Fn() -> u32 + Send + Sync + 'static,
    {
        Self {
            generators: Generators {
                tcp_sequence: Arc::new(generator),
                ..self.generators
            },
            ..self
        }
    }

    /// Set the generator of `ICMP` echo sequence numbers.
    ///
    /// The generator is called once per request. If not set then sequence
    /// numbers are drawn uniformly at random.
    #[must_use]
    pub fn icmp_sequence_generator<F>(self, generator: F) -> Self
    where
        F: Fn() -> u16 + Send + Sync + 'static,
    {
        Self {
            generators: Generators {
                icmp_sequence: Arc::new(generator),
                ..self.generators
            },
            ..self
        }
    }

    /// Resolve the configuration, drawing every unset random default.
    pub fn config(&self) -> Result<SenderConfig> {
        let mut rng = rand::thread_rng();
        let udp_dest_port = match (self.udp_dest_port, self.udp_port_mode) {
            (Some(port), _) => port,
            (None, UdpPortMode::Unified) => random_port(&mut rng),
            (None, UdpPortMode::Encoded) => {
                let max = SenderConfig::max_udp_dest_port(self.max_serie, self.max_ttl).ok_or(
                    Error::PortOverflow {
                        base: 0,
                        serie: self.max_serie.0,
                        ttl: self.max_ttl.0,
                    },
                )?;
                Port(rng.gen_range(defaults::DEFAULT_MIN_RANDOM_PORT.min(max)..=max))
            }
        };
        let config = SenderConfig {
            packet_size: self.packet_size,
            payload_pattern: self.payload_pattern,
            tos: self.tos,
            source_addr: self.source_addr,
            udp_port_mode: self.udp_port_mode,
            udp_src_port: self.udp_src_port.unwrap_or_else(|| random_port(&mut rng)),
            udp_dest_port,
            tcp_src_port: self.tcp_src_port.unwrap_or_else(|| random_port(&mut rng)),
            tcp_dest_port: self.tcp_dest_port.unwrap_or_else(|| random_port(&mut rng)),
            icmp_identifier: self
                .icmp_identifier
                .unwrap_or_else(|| TraceId(rng.gen())),
            max_ttl: self.max_ttl,
            max_serie: self.max_serie,
        };
        config.validate()?;
        Ok(config)
    }

    /// Build the [`Sender`] over a raw socket.
    ///
    /// Requires the privilege to open a raw `IPv4` socket.
    #[cfg(unix)]
    pub fn build(self) -> Result<Sender> {
        let transport = crate::net::RawSocketTransport::new()?;
        self.build_with_transport(transport)
    }

    /// Build the [`Sender`] over the given [`Transport`].
    pub fn build_with_transport<T: Transport + 'static>(self, transport: T) -> Result<Sender> {
        let config = self.config()?;
        Ok(Sender::new(
            config,
            self.generators,
            self.sink,
            Arc::new(transport),
        ))
    }
}

impl Debug for Builder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("source_addr", &self.source_addr)
            .field("packet_size", &self.packet_size)
            .field("payload_pattern", &self.payload_pattern)
            .field("tos", &self.tos)
            .field("udp_port_mode", &self.udp_port_mode)
            .field("udp_src_port", &self.udp_src_port)
            .field("udp_dest_port", &self.udp_dest_port)
            .field("tcp_src_port", &self.tcp_src_port)
            .field("tcp_dest_port", &self.tcp_dest_port)
            .field("icmp_identifier", &self.icmp_identifier)
            .field("max_ttl", &self.max_ttl)
            .field("max_serie", &self.max_serie)
            .finish_non_exhaustive()
    }
}

fn random_port<R: Rng>(rng: &mut R) -> Port {
    Port(rng.gen_range(defaults::DEFAULT_MIN_RANDOM_PORT..=u16::MAX))
}
