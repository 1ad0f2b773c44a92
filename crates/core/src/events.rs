//! Event System
//!
//! Provides a pub/sub event bus for inter-component communication.

use std::path::PathBuf;
use parking_lot::RwLock;
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

/// Events emitted by the designer
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Configuration changed
    ConfigChanged,
    /// Layout file opened
    LayoutOpened(PathBuf),
    /// Layout file saved
    LayoutSaved(PathBuf),
    /// A grid edit was committed to the document
    GridEdited { label: String },
    /// A drag entered a grid container
    DropEntered,
    /// A drop was committed
    DropCommitted,
    /// A drag left the container or was refused
    DropCancelled,
    /// Error occurred
    Error { message: String, details: Option<String> },
}

/// Subscriber handle for receiving events
#[derive(Clone)]
pub struct EventSubscription {
    receiver: Receiver<Event>,
}

impl EventSubscription {
    /// Receive the next event (blocking)
    pub fn recv(&self) -> Result<Event, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv(&self) -> Result<Event, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Drain all pending events
    pub fn drain(&self) -> Vec<Event> {
        self.receiver.try_iter().collect()
    }
}

/// Event bus for publish/subscribe pattern
pub struct EventBus {
    subscribers: RwLock<Vec<Sender<Event>>>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> EventSubscription {
        let (sender, receiver) = unbounded();
        self.subscribers.write().push(sender);
        EventSubscription { receiver }
    }

    /// Emit an event to all subscribers, dropping those that went away
    pub fn emit(&self, event: Event) -> usize {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());

        let delivered = subscribers.len();
        debug!("Event {:?} delivered to {} subscribers", event, delivered);
        delivered
    }

    /// Get the number of subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
