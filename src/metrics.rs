//! Best-effort submission metrics.
//!
//! Counters ride a fire-and-forget statsd path over non-blocking UDP. A
//! failure to reach the metrics backend is logged and swallowed; it never
//! fails or delays a request.

use std::io;
use std::net::UdpSocket;

use cadence::{CountedExt, NopMetricSink, StatsdClient, UdpMetricSink};

/// Prefix shared by every counter this service emits.
const METRIC_PREFIX: &str = "voting_app";

/// Counter fired once per accepted vote submission.
pub const VOTE_SUBMITTED: &str = "vote.submitted";

/// Sink for counter increments. Implementations must be infallible from the
/// caller's point of view.
pub trait Count: Send + Sync {
    fn incr(&self, metric: &str, tags: &[(&str, &str)]);
}

impl Count for StatsdClient {
    fn incr(&self, metric: &str, tags: &[(&str, &str)]) {
        let mut builder = self.incr_with_tags(metric);
        for (key, value) in tags {
            builder = builder.with_tag(key, value);
        }
        // Transport errors go to the client's error handler.
        builder.send();
    }
}

/// Managed handle used by request handlers.
pub struct Metrics(Box<dyn Count>);

impl Metrics {
    /// Statsd-backed metrics over a non-blocking UDP socket.
    pub fn statsd(addr: &str) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        let sink = UdpMetricSink::from(addr, socket)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let client = StatsdClient::builder(METRIC_PREFIX, sink)
            .with_error_handler(|err| warn!("Failed to emit metric: {err}"))
            .build();
        Ok(Self(Box::new(client)))
    }

    /// No-op metrics, used when the backend socket cannot be set up.
    pub fn disabled() -> Self {
        Self(Box::new(StatsdClient::from_sink(METRIC_PREFIX, NopMetricSink)))
    }

    /// Count one accepted submission for the given option.
    pub fn vote_submitted(&self, option: &str) {
        self.0
            .incr(VOTE_SUBMITTED, &[("option", option), ("service", "vote")]);
    }
}

/// Test double that records every increment.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct Recorder {
    counts: std::sync::Arc<std::sync::Mutex<Vec<(String, Vec<(String, String)>)>>>,
}

#[cfg(test)]
impl Recorder {
    /// The tag sets recorded for the given metric, one entry per increment.
    pub fn increments(&self, metric: &str) -> Vec<Vec<(String, String)>> {
        self.counts
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == metric)
            .map(|(_, tags)| tags.clone())
            .collect()
    }

    /// Total number of increments recorded, across all metrics.
    pub fn total(&self) -> usize {
        self.counts.lock().unwrap().len()
    }
}

#[cfg(test)]
impl Count for Recorder {
    fn incr(&self, metric: &str, tags: &[(&str, &str)]) {
        let tags = tags
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        self.counts.lock().unwrap().push((metric.to_string(), tags));
    }
}

#[cfg(test)]
impl Metrics {
    /// Metrics backed by a recorder, used by tests.
    pub fn recording(recorder: Recorder) -> Self {
        Self(Box::new(recorder))
    }
}
