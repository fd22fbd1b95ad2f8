//! Progress channel between the engine and whoever is watching it.
//!
//! Indexing and search hold an `EventSender`; a front end drains the
//! matching `EventReceiver`, typically from its own thread. Sends never block.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Cloneable sending half handed to pipelines
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Publish an event. Nobody listening is not an error.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Receiving half for a progress display
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Events until every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Creates connected sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    pub fn new() -> (EventSender, EventReceiver) {
        let (inner_tx, inner_rx) = unbounded();
        (
            EventSender { inner: inner_tx },
            EventReceiver { inner: inner_rx },
        )
    }
}

/// Sender for callers that do not track progress
pub fn null_sender() -> EventSender {
    EventChannel::new().0
}
