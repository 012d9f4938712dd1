#![allow(clippy::needless_pass_by_value, clippy::redundant_clone)]

use parking_lot::Mutex;
use routology_core::{
    sink, udp_probe_offset, Builder, Error, IoResult, Port, ProbeFields, ProbeInfo, ProbeType,
    SendRequest, Sender, Transport, UdpPortMode,
};
use routology_packet::icmp::EchoRequestPacket;
use routology_packet::ipv4::Ipv4Packet;
use routology_packet::tcp::TcpPacket;
use routology_packet::udp::UdpPacket;
use routology_packet::IpProtocol;
use std::net::Ipv4Addr;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use test_case::test_case;

const SRC: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 10);
const HOST_A: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 1);
const HOST_B: Ipv4Addr = Ipv4Addr::new(198, 51, 100, 1);
const BASE_PORT: u16 = 33434;

static TRACING: OnceLock<()> = OnceLock::new();

fn init_tracing() {
    TRACING.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter("routology_core=debug")
            .with_test_writer()
            .init();
    });
}

/// A transport which records every packet it is given.
#[derive(Debug, Default)]
struct RecordingTransport {
    packets: Mutex<Vec<(Ipv4Addr, Vec<u8>)>>,
    send_delay: Duration,
}

impl RecordingTransport {
    fn slow(send_delay: Duration) -> Self {
        Self {
            send_delay,
            ..Self::default()
        }
    }

    fn packets(&self) -> Vec<(Ipv4Addr, Vec<u8>)> {
        self.packets.lock().clone()
    }
}

impl Transport for RecordingTransport {
    fn send_to(&self, packet: &[u8], dest_addr: Ipv4Addr) -> IoResult<()> {
        if !self.send_delay.is_zero() {
            std::thread::sleep(self.send_delay);
        }
        self.packets.lock().push((dest_addr, packet.to_vec()));
        Ok(())
    }

    fn local_addr_for(&self, _dest_addr: Ipv4Addr) -> IoResult<Ipv4Addr> {
        Ok(SRC)
    }
}

struct Harness {
    sender: Sender,
    records: Arc<Mutex<Vec<ProbeInfo>>>,
    transport: Arc<RecordingTransport>,
}

fn harness(builder: impl FnOnce(Builder) -> Builder) -> anyhow::Result<Harness> {
    harness_with(builder, RecordingTransport::default())
}

fn harness_with(
    builder: impl FnOnce(Builder) -> Builder,
    transport: RecordingTransport,
) -> anyhow::Result<Harness> {
    init_tracing();
    let records = Arc::new(Mutex::new(Vec::new()));
    let transport = Arc::new(transport);
    let sender = builder(Builder::new(records.clone()).udp_dest_port(Port(BASE_PORT)))
        .build_with_transport(transport.clone())?;
    Ok(Harness {
        sender,
        records,
        transport,
    })
}

fn send(harness: &Harness, requests: &[SendRequest]) -> anyhow::Result<()> {
    if let Some(transmission) = harness.sender.send_probes(requests, Duration::ZERO)? {
        let report = transmission.join()?;
        assert!(report.is_complete(), "{report:?}");
    }
    Ok(())
}

fn udp_ports(records: &[ProbeInfo]) -> Vec<(Port, Port)> {
    records
        .iter()
        .filter_map(|probe| match probe.fields {
            ProbeFields::Udp {
                src_port,
                dest_port,
            } => Some((src_port, dest_port)),
            _ => None,
        })
        .collect()
}

#[test_case(&[1]; "single request")]
#[test_case(&[1, 2, 3, 4, 5]; "five requests")]
#[test_case(&[3, 3, 3]; "repeated ttl")]
fn test_three_records_per_request(ttls: &[u8]) -> anyhow::Result<()> {
    let harness = harness(|b| b)?;
    let requests: Vec<_> = ttls
        .iter()
        .map(|&ttl| SendRequest::new(ttl, 0, HOST_A))
        .collect();
    send(&harness, &requests)?;
    let records = harness.records.lock();
    assert_eq!(3 * requests.len(), records.len());
    for (request, chunk) in requests.iter().zip(records.chunks(3)) {
        let types: Vec<_> = chunk.iter().map(ProbeInfo::probe_type).collect();
        assert_eq!(vec![ProbeType::Udp, ProbeType::Tcp, ProbeType::Icmp], types);
        assert!(chunk
            .iter()
            .all(|probe| probe.ttl == request.ttl && probe.serie == request.serie));
    }
    assert_eq!(3 * requests.len(), harness.transport.packets().len());
    Ok(())
}

#[test]
fn test_encoded_destination_ports() -> anyhow::Result<()> {
    let harness = harness(|b| b)?;
    send(
        &harness,
        &[SendRequest::new(1, 0, HOST_A), SendRequest::new(2, 0, HOST_A)],
    )?;
    let ports = udp_ports(&harness.records.lock());
    assert_eq!(
        vec![Port(33434), Port(33435)],
        ports.iter().map(|(_, dest)| *dest).collect::<Vec<_>>()
    );
    assert_eq!(ports[0].0, ports[1].0);
    Ok(())
}

#[test]
fn test_encoded_port_at_top_of_range() -> anyhow::Result<()> {
    let harness = harness(|b| b.udp_dest_port(Port(65217)))?;
    send(
        &harness,
        &[SendRequest::new(1, 0, HOST_A), SendRequest::new(64, 255, HOST_A)],
    )?;
    let ports = udp_ports(&harness.records.lock());
    assert_eq!(
        vec![Port(65217), Port(65535)],
        ports.iter().map(|(_, dest)| *dest).collect::<Vec<_>>()
    );
    let packets = harness.transport.packets();
    let ipv4 = Ipv4Packet::new_view(&packets[1].1)?;
    assert_eq!(IpProtocol::Udp, ipv4.get_protocol());
    assert_eq!(65535, UdpPacket::new_view(ipv4.payload())?.get_destination());
    Ok(())
}

#[test]
fn test_encoded_port_decodes_serie_and_ttl() -> anyhow::Result<()> {
    let harness = harness(|b| b)?;
    let requests: Vec<_> = (0..4)
        .flat_map(|serie| (1..=8).map(move |ttl| SendRequest::new(ttl, serie, HOST_A)))
        .collect();
    send(&harness, &requests)?;
    for probe in harness.records.lock().iter() {
        if let ProbeFields::Udp { dest_port, .. } = probe.fields {
            assert_eq!(
                Some(u32::from(probe.serie.0) + u32::from(probe.ttl.0)),
                udp_probe_offset(Port(BASE_PORT), dest_port)
            );
        }
    }
    Ok(())
}

#[test]
fn test_unified_ports() -> anyhow::Result<()> {
    let harness = harness(|b| {
        b.udp_port_mode(UdpPortMode::Unified)
            .udp_src_port(Port(5000))
    })?;
    send(
        &harness,
        &[
            SendRequest::new(1, 0, HOST_A),
            SendRequest::new(2, 1, HOST_B),
            SendRequest::new(3, 2, HOST_A),
        ],
    )?;
    send(&harness, &[SendRequest::new(4, 0, HOST_B)])?;
    let ports = udp_ports(&harness.records.lock());
    assert_eq!(4, ports.len());
    assert!(ports
        .iter()
        .all(|&(src, dest)| src == Port(5000) && dest == Port(BASE_PORT)));
    Ok(())
}

#[test]
fn test_interleaved_hosts_are_grouped() -> anyhow::Result<()> {
    let harness = harness(|b| b)?;
    send(
        &harness,
        &[
            SendRequest::new(1, 0, HOST_A),
            SendRequest::new(1, 0, HOST_B),
            SendRequest::new(2, 0, HOST_A),
        ],
    )?;
    let order: Vec<_> = harness
        .records
        .lock()
        .iter()
        .map(|probe| (probe.host.addr(), probe.ttl.0, probe.probe_type()))
        .collect();
    assert_eq!(
        vec![
            (HOST_A, 1, ProbeType::Udp),
            (HOST_A, 1, ProbeType::Tcp),
            (HOST_A, 1, ProbeType::Icmp),
            (HOST_A, 2, ProbeType::Udp),
            (HOST_A, 2, ProbeType::Tcp),
            (HOST_A, 2, ProbeType::Icmp),
            (HOST_B, 1, ProbeType::Udp),
            (HOST_B, 1, ProbeType::Tcp),
            (HOST_B, 1, ProbeType::Icmp),
        ],
        order
    );
    let destinations: Vec<_> = harness
        .transport
        .packets()
        .into_iter()
        .map(|(dest, _)| dest)
        .collect();
    assert_eq!(vec![HOST_A; 6], destinations[..6]);
    assert_eq!(vec![HOST_B; 3], destinations[6..]);
    Ok(())
}

#[test]
fn test_empty_requests() -> anyhow::Result<()> {
    let harness = harness(|b| b)?;
    assert!(harness.sender.send_probes(&[], Duration::ZERO)?.is_none());
    assert!(harness.records.lock().is_empty());
    assert!(harness.transport.packets().is_empty());
    Ok(())
}

#[test_case(SendRequest::new(0, 0, HOST_B); "zero ttl")]
#[test_case(SendRequest::new(65, 0, HOST_B); "ttl above max")]
#[test_case(SendRequest::new(1, 256, HOST_B); "serie above max")]
fn test_invalid_request_emits_nothing(invalid: SendRequest) -> anyhow::Result<()> {
    let harness = harness(|b| b)?;
    let res = harness
        .sender
        .send_probes(&[SendRequest::new(1, 0, HOST_A), invalid], Duration::ZERO);
    assert!(matches!(
        res,
        Err(Error::InvalidTtl(..) | Error::SerieOutOfRange(..))
    ));
    assert!(harness.records.lock().is_empty());
    assert!(harness.transport.packets().is_empty());
    Ok(())
}

#[test]
fn test_packets_match_records() -> anyhow::Result<()> {
    let harness = harness(|b| b.tcp_dest_port(Port(443)))?;
    send(
        &harness,
        &[SendRequest::new(1, 0, HOST_A), SendRequest::new(2, 0, HOST_A)],
    )?;
    let records = harness.records.lock();
    let packets = harness.transport.packets();
    for (_, bytes) in &packets {
        let ipv4 = Ipv4Packet::new_view(bytes)?;
        assert_eq!(SRC, ipv4.get_source());
        assert_eq!(HOST_A, ipv4.get_destination());
        let ttl = ipv4.get_ttl();
        let fields = match ipv4.get_protocol() {
            IpProtocol::Udp => {
                let udp = UdpPacket::new_view(ipv4.payload())?;
                assert_eq!(20, udp.payload().len() + 8);
                ProbeFields::Udp {
                    src_port: Port(udp.get_source()),
                    dest_port: Port(udp.get_destination()),
                }
            }
            IpProtocol::Tcp => {
                let tcp = TcpPacket::new_view(ipv4.payload())?;
                ProbeFields::Tcp {
                    src_port: Port(tcp.get_source()),
                    dest_port: Port(tcp.get_destination()),
                    sequence: tcp.get_sequence().into(),
                }
            }
            IpProtocol::Icmp => {
                let icmp = EchoRequestPacket::new_view(ipv4.payload())?;
                ProbeFields::Icmp {
                    identifier: icmp.get_identifier().into(),
                    sequence: icmp.get_sequence().into(),
                }
            }
            IpProtocol::Other(p) => anyhow::bail!("unexpected protocol {p}"),
        };
        assert!(
            records
                .iter()
                .any(|probe| probe.ttl.0 == ttl && probe.fields == fields),
            "no record for {fields:?} at ttl {ttl}"
        );
    }
    assert_eq!(records.len(), packets.len());
    Ok(())
}

#[test]
fn test_inter_packet_delay() -> anyhow::Result<()> {
    let harness = harness(|b| b)?;
    let start = Instant::now();
    let transmission = harness
        .sender
        .send_probes(&[SendRequest::new(1, 0, HOST_A)], Duration::from_millis(10))?
        .ok_or_else(|| anyhow::anyhow!("no transmission"))?;
    let report = transmission.join()?;
    assert_eq!(3, report.sent);
    assert!(start.elapsed() >= Duration::from_millis(20));
    Ok(())
}

#[test]
fn test_records_precede_transmission() -> anyhow::Result<()> {
    let harness = harness_with(|b| b, RecordingTransport::slow(Duration::from_millis(20)))?;
    let transmission = harness
        .sender
        .send_probes(&[SendRequest::new(1, 0, HOST_A)], Duration::ZERO)?
        .ok_or_else(|| anyhow::anyhow!("no transmission"))?;
    assert_eq!(3, harness.records.lock().len());
    transmission.join()?;
    Ok(())
}

#[test]
fn test_cancel_transmission() -> anyhow::Result<()> {
    let harness = harness(|b| b)?;
    let requests: Vec<_> = (1..=30).map(|ttl| SendRequest::new(ttl, 0, HOST_A)).collect();
    let transmission = harness
        .sender
        .send_probes(&requests, Duration::from_millis(50))?
        .ok_or_else(|| anyhow::anyhow!("no transmission"))?;
    transmission.cancel();
    let report = transmission.join()?;
    assert!(report.cancelled);
    assert!(report.sent < 90);
    assert_eq!(90, harness.records.lock().len());
    Ok(())
}

#[test]
fn test_fan_out_sink() -> anyhow::Result<()> {
    init_tracing();
    let store = Arc::new(Mutex::new(Vec::<ProbeInfo>::new()));
    let (tx, rx) = crossbeam::channel::unbounded::<ProbeInfo>();
    let sender = Builder::new((store.clone(), tx))
        .build_with_transport(RecordingTransport::default())?;
    if let Some(transmission) =
        sender.send_probes(&[SendRequest::new(1, 0, HOST_A)], Duration::ZERO)?
    {
        transmission.join()?;
    }
    let received: Vec<ProbeInfo> = rx.try_iter().collect();
    assert_eq!(3, received.len());
    assert_eq!(*store.lock(), received);
    Ok(())
}

#[test]
fn test_closure_sink() -> anyhow::Result<()> {
    init_tracing();
    let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = count.clone();
    let sender = Builder::new(sink::from_fn(move |_| {
        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }))
    .build_with_transport(RecordingTransport::default())?;
    sender.send_probes(
        &[SendRequest::new(1, 0, HOST_A), SendRequest::new(1, 0, HOST_B)],
        Duration::ZERO,
    )?;
    assert_eq!(6, count.load(std::sync::atomic::Ordering::SeqCst));
    Ok(())
}
