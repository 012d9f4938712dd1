use crate::probe::ProbeInfo;
use parking_lot::Mutex;
use std::sync::Arc;

/// A consumer of [`ProbeInfo`] records.
///
/// The sender calls [`ProbeSink::record`] synchronously on the thread which
/// called [`crate::Sender::send_probes`], so implementations should return
/// quickly.
///
/// Sinks compose: a pair `(A, B)` records into both, in order.
///
/// # Example
///
/// ```
/// use parking_lot::Mutex;
/// use routology_core::sink::{self, ProbeSink};
/// use routology_core::ProbeInfo;
/// use std::sync::Arc;
///
/// fn combine() -> impl ProbeSink {
///     let store = Arc::new(Mutex::new(Vec::<ProbeInfo>::new()));
///     let printer = sink::from_fn(|probe| println!("{probe:?}"));
///     (store, printer)
/// }
/// # let _ = combine();
/// ```
pub trait ProbeSink: Send + Sync {
    /// Consume a single probe record.
    fn record(&self, probe: ProbeInfo);
}

/// Create a [`ProbeSink`] from a closure.
pub fn from_fn<F: Fn(ProbeInfo) + Send + Sync>(func: F) -> FromFn<F> {
    FromFn(func)
}

/// A [`ProbeSink`] backed by a closure, see [`from_fn`].
#[derive(Debug, Clone)]
pub struct FromFn<F>(F);

impl<F: Fn(ProbeInfo) + Send + Sync> ProbeSink for FromFn<F> {
    fn record(&self, probe: ProbeInfo) {
        (self.0)(probe);
    }
}

impl<S: ProbeSink + ?Sized> ProbeSink for Arc<S> {
    fn record(&self, probe: ProbeInfo) {
        (**self).record(probe);
    }
}

impl<S: ProbeSink + ?Sized> ProbeSink for Box<S> {
    fn record(&self, probe: ProbeInfo) {
        (**self).record(probe);
    }
}

impl<A: ProbeSink, B: ProbeSink> ProbeSink for (A, B) {
    fn record(&self, probe: ProbeInfo) {
        self.0.record(probe.clone());
        self.1.record(probe);
    }
}

impl ProbeSink for Mutex<Vec<ProbeInfo>> {
    fn record(&self, probe: ProbeInfo) {
        self.lock().push(probe);
    }
}

/// Records are sent on the channel, blocking while a bounded channel is full.
///
/// Records are dropped with a warning once every receiver has gone.
impl ProbeSink for crossbeam::channel::Sender<ProbeInfo> {
    fn record(&self, probe: ProbeInfo) {
        if let Err(err) = self.send(probe) {
            tracing::warn!(
                host = %err.0.host,
                ttl = %err.0.ttl,
                "probe record dropped: channel disconnected"
            );
        }
    }
}
