use crate::batch::{HostBatch, Packet};
use crate::error::{Error, Result};
use crate::net::Transport;
use crate::probe::ProbeType;
use crate::request::HostId;
use crate::types::{TimeToLive, TypeOfService};
use crossbeam::channel::{bounded, Sender};
use std::net::Ipv4Addr;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// A handle to the background transmission of one batch of probes.
///
/// Dropping the handle detaches the transmission, which runs to completion.
#[derive(Debug)]
pub struct Transmission {
    handle: JoinHandle<TransmitReport>,
    token: CancellationToken,
}

impl Transmission {
    /// Request that transmission stops before the next packet.
    ///
    /// Packets already handed to the transport are not recalled.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true once the background transmission has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// The name of the transmission thread.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.handle.thread().name()
    }

    /// Wait for the transmission to end.
    pub fn join(self) -> Result<TransmitReport> {
        self.handle
            .join()
            .map_err(|_| Error::Other("transmission thread panicked".to_string()))
    }
}

/// The outcome of a [`Transmission`].
#[derive(Debug, Default)]
pub struct TransmitReport {
    /// The number of packets handed to the transport without error.
    pub sent: usize,
    /// Packets, or whole templates, which could not be sent.
    pub failures: Vec<TransmitFailure>,
    /// Whether transmission was cancelled before every packet was sent.
    pub cancelled: bool,
}

impl TransmitReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failures.is_empty()
    }
}

/// A failure to send a probe.
#[derive(Debug)]
pub struct TransmitFailure {
    pub host: HostId,
    pub protocol: ProbeType,
    /// The ttl of the failed packet, `None` if the whole template failed.
    pub ttl: Option<TimeToLive>,
    pub error: Error,
}

/// Settings shared by every packet of a transmission.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TransmitParams {
    pub source_addr: Option<Ipv4Addr>,
    pub tos: TypeOfService,
    pub inter_packet_delay: Duration,
}

/// A transmission thread which has not yet been released to send.
///
/// Dropping it without calling [`PendingTransmission::start`] ends the thread
/// with a cancelled report and nothing sent.
#[derive(Debug)]
pub(crate) struct PendingTransmission {
    transmission: Transmission,
    start: Sender<()>,
}

impl PendingTransmission {
    pub(crate) fn start(self) -> Transmission {
        // The gate is only closed if the thread has already ended.
        let _ = self.start.send(());
        self.transmission
    }
}

/// Spawn a thread named `routology-tx-{id}` which transmits `batches` once
/// started.
pub(crate) fn spawn(
    id: usize,
    transport: Arc<dyn Transport>,
    batches: Vec<HostBatch>,
    params: TransmitParams,
) -> Result<PendingTransmission> {
    let token = CancellationToken::new();
    let child = token.clone();
    let (start, gate) = bounded(1);
    let handle = thread::Builder::new()
        .name(format!("routology-tx-{id}"))
        .spawn(move || {
            if gate.recv().is_err() {
                tracing::debug!("transmission released without start");
                return TransmitReport {
                    cancelled: true,
                    ..TransmitReport::default()
                };
            }
            transmit(transport.as_ref(), &batches, params, &child)
        })
        .map_err(|err| Error::Other(err.to_string()))?;
    Ok(PendingTransmission {
        transmission: Transmission { handle, token },
        start,
    })
}

/// Send every packet of every template of `batches`, in order.
///
/// A failure is recorded and transmission moves on to the next packet.
#[instrument(skip_all, level = "trace")]
pub(crate) fn transmit(
    transport: &dyn Transport,
    batches: &[HostBatch],
    params: TransmitParams,
    token: &CancellationToken,
) -> TransmitReport {
    let mut tx = Transmitter {
        transport,
        params,
        token,
        report: TransmitReport::default(),
        first: true,
    };
    for batch in batches {
        if tx.transmit_batch(batch).is_break() {
            tx.report.cancelled = true;
            break;
        }
    }
    tracing::debug!(
        sent = tx.report.sent,
        failed = tx.report.failures.len(),
        cancelled = tx.report.cancelled,
        "transmission ended"
    );
    tx.report
}

struct Transmitter<'a> {
    transport: &'a dyn Transport,
    params: TransmitParams,
    token: &'a CancellationToken,
    report: TransmitReport,
    first: bool,
}

impl Transmitter<'_> {
    fn transmit_batch(&mut self, batch: &HostBatch) -> ControlFlow<()> {
        if self.token.is_cancelled() {
            return ControlFlow::Break(());
        }
        let host = batch.host();
        let mut src_addr = None;
        for template in batch.templates() {
            let src = match src_addr {
                Some(addr) => addr,
                None => match self.source_addr(host.addr()) {
                    Ok(addr) => *src_addr.insert(addr),
                    Err(err) => {
                        self.failed(host, template.probe_type(), None, err);
                        continue;
                    }
                },
            };
            tracing::debug!(
                %host,
                protocol = %template.probe_type(),
                probes = template.len(),
                "transmitting template"
            );
            let packets = match template.expand(src, self.params.tos) {
                Ok(packets) => packets,
                Err(err) => {
                    self.failed(host, template.probe_type(), None, err);
                    continue;
                }
            };
            for packet in &packets {
                if self.token.is_cancelled() {
                    return ControlFlow::Break(());
                }
                self.send(host, packet);
            }
        }
        ControlFlow::Continue(())
    }

    fn source_addr(&self, dest_addr: Ipv4Addr) -> Result<Ipv4Addr> {
        match self.params.source_addr {
            Some(addr) => Ok(addr),
            None => Ok(self.transport.local_addr_for(dest_addr)?),
        }
    }

    fn send(&mut self, host: &HostId, packet: &Packet) {
        if !self.first && !self.params.inter_packet_delay.is_zero() {
            thread::sleep(self.params.inter_packet_delay);
        }
        self.first = false;
        tracing::trace!(
            protocol = %packet.protocol,
            ttl = %packet.ttl,
            bytes = %routology_packet::fmt_payload(&packet.bytes),
            "send"
        );
        match self.transport.send_to(&packet.bytes, packet.dest_addr) {
            Ok(()) => self.report.sent += 1,
            Err(err) => {
                self.failed(host, packet.protocol, Some(packet.ttl), Error::IoError(err));
            }
        }
    }

    fn failed(
        &mut self,
        host: &HostId,
        protocol: ProbeType,
        ttl: Option<TimeToLive>,
        error: Error,
    ) {
        tracing::warn!(%host, %protocol, ?ttl, %error, "failed to send probe");
        self.report.failures.push(TransmitFailure {
            host: host.clone(),
            protocol,
            ttl,
            error,
        });
    }
}
