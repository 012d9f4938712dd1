use crate::batch::{group_by_host, HostBatch};
use crate::config::{Generators, SenderConfig};
use crate::encoder::encode_group;
use crate::error::Result;
use crate::net::Transport;
use crate::sink::ProbeSink;
use crate::transmit::{self, TransmitParams, Transmission};
use crate::SendRequest;
use itertools::Itertools;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::instrument;

/// A multi-protocol probe sender.
///
/// Every [`SendRequest`] produces one `UDP`, one `TCP` and one `ICMP` echo
/// probe. The [`crate::ProbeInfo`] records of the probes are given to the
/// [`ProbeSink`] before the packets are transmitted, in the background, by
/// the [`Transport`].
///
/// Use the [`crate::Builder`] type to create a [`Sender`].
///
/// # Example
///
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// use routology_core::{sink, Builder, SendRequest};
/// use std::net::Ipv4Addr;
/// use std::time::Duration;
///
/// let sender = Builder::new(sink::from_fn(|probe| println!("{probe:?}"))).build()?;
/// let host = Ipv4Addr::new(1, 1, 1, 1);
/// let requests: Vec<_> = (1..=16).map(|ttl| SendRequest::new(ttl, 0, host)).collect();
/// if let Some(transmission) = sender.send_probes(&requests, Duration::from_millis(5))? {
///     let report = transmission.join()?;
///     println!("sent {} packets", report.sent);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Sender {
    config: SenderConfig,
    generators: Generators,
    sink: Arc<dyn ProbeSink>,
    transport: Arc<dyn Transport>,
    transmissions: AtomicUsize,
}

impl Sender {
    pub(crate) fn new(
        config: SenderConfig,
        generators: Generators,
        sink: Arc<dyn ProbeSink>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            generators,
            sink,
            transport,
            transmissions: AtomicUsize::new(0),
        }
    }

    /// Encode, record and transmit probes for a batch of requests.
    ///
    /// Requests are grouped by host in order of first appearance. Every group
    /// is encoded before any record is given to the sink, so an invalid
    /// request fails the whole call and nothing is recorded or sent.
    ///
    /// Three records are recorded per request, `UDP` then `TCP` then `ICMP`,
    /// group by group. The packets are then sent on a new thread, one every
    /// `inter_packet_delay`, and the returned [`Transmission`] may be used to
    /// observe or cancel the transmission.
    ///
    /// Returns `Ok(None)` if `requests` is empty.
    #[instrument(skip_all, level = "trace")]
    pub fn send_probes(
        &self,
        requests: &[SendRequest],
        inter_packet_delay: Duration,
    ) -> Result<Option<Transmission>> {
        if requests.is_empty() {
            return Ok(None);
        }
        let groups = group_by_host(requests);
        tracing::debug!(
            hosts = %groups.keys().join(", "),
            requests = requests.len(),
            "sending probes"
        );
        let mut rng = rand::thread_rng();
        let batches = groups
            .into_iter()
            .map(|(host, requests)| {
                let encoding = encode_group(&self.config, &self.generators, &mut rng, &requests)?;
                HostBatch::new(&self.config, host, requests, encoding)
            })
            .collect::<Result<Vec<_>>>()?;
        let probes: Vec<_> = batches
            .iter()
            .flat_map(|batch| batch.probe_infos(SystemTime::now()))
            .collect();
        let params = TransmitParams {
            source_addr: self.config.source_addr,
            tos: self.config.tos,
            inter_packet_delay,
        };
        let id = self.transmissions.fetch_add(1, Ordering::Relaxed);
        let pending = transmit::spawn(id, self.transport.clone(), batches, params)?;
        for probe in probes {
            self.sink.record(probe);
        }
        Ok(Some(pending.start()))
    }

    #[must_use]
    pub const fn config(&self) -> &SenderConfig {
        &self.config
    }

    #[must_use]
    pub fn transmissions(&self) -> usize {
        self.transmissions.load(Ordering::Relaxed)
    }
}

impl Debug for Sender {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender")
            .field("config", &self.config)
            .field("transmissions", &self.transmissions)
            .finish_non_exhaustive()
    }
}
