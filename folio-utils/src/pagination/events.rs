//! Fan-out of surface events to every running navigator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::trace;

use super::surface::{ActorId, SurfaceId};

/// Something that happened to a surface, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// An actor pressed a control on a surface.
    ControlPressed {
        surface: SurfaceId,
        symbol: String,
        actor: ActorId,
    },
    /// A surface disappeared.
    SurfaceDeleted { surface: SurfaceId },
    /// An actor posted a message in a scope.
    Reply {
        scope: u64,
        surface: SurfaceId,
        actor: ActorId,
        content: String,
    },
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    subscribers: HashMap<u64, mpsc::UnboundedSender<SurfaceEvent>>,
}

/// Clonable publish/subscribe hub for [`SurfaceEvent`]s.
#[derive(Debug, Clone, Default)]
pub struct EventHub {
    registry: Arc<Mutex<Registry>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new listener. Events published afterwards are delivered to it in order.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.insert(id, sender);

        Subscription {
            id,
            hub: self.clone(),
            receiver,
        }
    }

    /// Deliver an event to every live subscriber, returning how many received it.
    pub fn publish(&self, event: SurfaceEvent) -> usize {
        let mut registry = self.lock();
        registry
            .subscribers
            .retain(|_, sender| sender.send(event.clone()).is_ok());
        trace!(?event, subscribers = registry.subscribers.len(), "published surface event");
        registry.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn unsubscribe(&self, id: u64) {
        self.lock().subscribers.remove(&id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A registered listener. Unsubscribes when dropped.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    hub: EventHub,
    receiver: mpsc::UnboundedReceiver<SurfaceEvent>,
}

impl Subscription {
    /// Wait for the next event. Returns `None` once unsubscribed and drained.
    pub async fn recv(&mut self) -> Option<SurfaceEvent> {
        self.receiver.recv().await
    }

    /// Stop receiving new events.
    pub fn unsubscribe(&mut self) {
        self.hub.unsubscribe(self.id);
        self.receiver.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}
