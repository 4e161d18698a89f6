//! Metric delivery
//!
//! Estimators hand finished metrics to a [`MetricSink`]. Delivery is
//! fire-and-forget: a sink never fails back into the estimator.

use crate::types::MetricEvent;
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{trace, warn};

/// Receiver side of metric delivery
pub trait MetricSink: Send {
    fn emit(&mut self, event: MetricEvent);

    /// Take any events held by the sink
    ///
    /// Sinks that forward elsewhere hold nothing and return an empty list.
    fn drain(&mut self) -> Vec<MetricEvent> {
        Vec::new()
    }
}

/// Forwards events over an unbounded crossbeam channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<MetricEvent>,
    disconnected: bool,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<MetricEvent>) {
        let (tx, rx) = unbounded();
        (
            Self {
                tx,
                disconnected: false,
            },
            rx,
        )
    }
}

impl MetricSink for ChannelSink {
    fn emit(&mut self, event: MetricEvent) {
        if self.disconnected {
            return;
        }
        if self.tx.send(event).is_err() {
            // Report once; later events are dropped silently
            warn!("metric receiver disconnected, dropping events");
            self.disconnected = true;
        }
    }
}

/// Keeps events in memory until drained
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    events: Vec<MetricEvent>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[MetricEvent] {
        &self.events
    }
}

impl MetricSink for CollectingSink {
    fn emit(&mut self, event: MetricEvent) {
        trace!(metric = event.name(), "collected");
        self.events.push(event);
    }

    fn drain(&mut self) -> Vec<MetricEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl MetricSink for NullSink {
    fn emit(&mut self, _event: MetricEvent) {}
}
