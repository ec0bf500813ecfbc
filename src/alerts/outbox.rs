//! Bounded outbound queue between the alert decision and the transport.
//!
//! Decisions are made first; sends happen at the end of the tick, after the
//! safety outputs have been driven, so a slow link never delays the
//! interlock.  When full, the oldest queued message is discarded.

use heapless::Deque;
use log::warn;

use super::StructuredMessage;
use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, TransportPort};

pub const OUTBOX_CAPACITY: usize = 8;

/// Counts from one [`Outbox::drain`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct Outbox {
    queue: Deque<StructuredMessage, OUTBOX_CAPACITY>,
}

impl Outbox {
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queue a message, discarding the oldest one if the queue is full.
    pub fn push(&mut self, message: StructuredMessage, sink: &mut impl EventSink) {
        if let Err(message) = self.queue.push_back(message) {
            if let Some(old) = self.queue.pop_front() {
                warn!("Outbox full; dropping oldest {} message", old.kind());
                sink.emit(&AppEvent::AlertDropped(old.kind()));
            }
            let pushed = self.queue.push_back(message);
            debug_assert!(pushed.is_ok(), "slot freed by pop_front");
        }
    }

    /// Hand up to `max` messages to the transport, oldest first.
    ///
    /// A failed send is logged, reported, and the message dropped.
    pub fn drain(
        &mut self,
        transport: &mut impl TransportPort,
        max: usize,
        sink: &mut impl EventSink,
    ) -> DrainReport {
        let mut report = DrainReport::default();
        for _ in 0..max {
            let Some(message) = self.queue.pop_front() else {
                break;
            };
            match transport.send(&message) {
                Ok(()) => report.sent += 1,
                Err(error) => {
                    let kind = message.kind();
                    warn!("Send of {} message failed: {}", kind, error);
                    sink.emit(&AppEvent::TransportFailed { kind, error });
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Send everything that is queued.  Used on shutdown.
    pub fn flush(
        &mut self,
        transport: &mut impl TransportPort,
        sink: &mut impl EventSink,
    ) -> DrainReport {
        self.drain(transport, OUTBOX_CAPACITY, sink)
    }
}
