//! Shared, lazily attached view of an engine's event source.
//!
//! One native listener per engine fans out to any number of
//! `EventSubscription`s. The listener is attached when the first lease is
//! taken and detached when the last one is released, so an engine with
//! nobody watching carries no callbacks. Every dispatched event is also
//! handed once to a forwarding hook (the session's state channel) before
//! subscribers see it.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

use parking_lot::Mutex;

use crate::engine::{EngineListener, ListenerId, MediaEngine, PlaybackEvent};

/// Hook receiving every dispatched event exactly once.
pub(crate) type Forward = Arc<dyn Fn(&PlaybackEvent) + Send + Sync>;

/// Subscribers plus the forwarding hook. This is what the native listener
/// captures; it holds no reference to the engine.
struct Fanout {
    forward: Forward,
    subscribers: Mutex<Vec<(u64, Sender<PlaybackEvent>)>>,
}

impl Fanout {
    fn dispatch(&self, event: &PlaybackEvent) {
        // Holding the lock across forward + fan-out keeps every consumer on
        // the same total order.
        let mut subs = self.subscribers.lock();
        (self.forward)(event);
        subs.retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }
}

#[derive(Default)]
struct Attachment {
    leases: usize,
    native: Option<ListenerId>,
    /// Bumped by a forced detach so leases taken before it release nothing.
    epoch: u64,
}

struct Shared<E: MediaEngine> {
    engine: Arc<Mutex<E>>,
    fanout: Arc<Fanout>,
    attachment: Mutex<Attachment>,
    next_id: Mutex<u64>,
}

/// Reference-counted hold on the native listener.
pub(crate) trait LeaseHolder: Send + Sync {
    /// Returns the epoch the lease belongs to.
    fn retain(&self) -> u64;
    fn release(&self, epoch: u64);
}

impl<E: MediaEngine> LeaseHolder for Shared<E> {
    fn retain(&self) -> u64 {
        let mut att = self.attachment.lock();
        if att.native.is_none() {
            let fanout = self.fanout.clone();
            let listener: EngineListener = Arc::new(move |event: &PlaybackEvent| fanout.dispatch(event));
            att.native = Some(self.engine.lock().add_listener(listener));
            log::debug!("playstream: attached engine listener");
        }
        att.leases += 1;
        att.epoch
    }

    fn release(&self, epoch: u64) {
        let mut att = self.attachment.lock();
        if att.epoch != epoch {
            return;
        }
        att.leases = att.leases.saturating_sub(1);
        if att.leases == 0 {
            if let Some(id) = att.native.take() {
                self.engine.lock().remove_listener(id);
                log::debug!("playstream: detached engine listener");
            }
        }
    }
}

/// RAII lease; dropping it releases the hold.
pub(crate) struct Lease {
    holder: Arc<dyn LeaseHolder>,
    epoch: u64,
}

impl Lease {
    fn take(holder: Arc<dyn LeaseHolder>) -> Self {
        let epoch = holder.retain();
        Self { holder, epoch }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.holder.release(self.epoch);
    }
}

pub struct EventMulticast<E: MediaEngine> {
    shared: Arc<Shared<E>>,
}

impl<E: MediaEngine> EventMulticast<E> {
    pub(crate) fn new(engine: Arc<Mutex<E>>, forward: Forward) -> Self {
        Self {
            shared: Arc::new(Shared {
                engine,
                fanout: Arc::new(Fanout {
                    forward,
                    subscribers: Mutex::new(Vec::new()),
                }),
                attachment: Mutex::new(Attachment::default()),
                next_id: Mutex::new(0),
            }),
        }
    }

    /// Subscribe to the engine's events, attaching the native listener if
    /// nobody else is watching yet.
    pub fn subscribe(&self) -> EventSubscription {
        let (tx, rx) = mpsc::channel();
        let id = self.next_id();
        self.shared.fanout.subscribers.lock().push((id, tx));
        EventSubscription {
            rx,
            id,
            fanout: self.shared.fanout.clone(),
            _lease: self.lease(),
        }
    }

    /// Keep the native listener attached without receiving events.
    pub(crate) fn lease(&self) -> Lease {
        Lease::take(self.shared.clone())
    }

    pub fn is_attached(&self) -> bool {
        self.shared.attachment.lock().native.is_some()
    }

    /// Number of live event subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.shared.fanout.subscribers.lock().len()
    }

    /// Detach from the engine and disconnect every subscriber, regardless of
    /// outstanding leases. Later releases are no-ops.
    pub(crate) fn detach_all(&self) {
        {
            let mut att = self.shared.attachment.lock();
            att.leases = 0;
            att.epoch += 1;
            if let Some(id) = att.native.take() {
                self.shared.engine.lock().remove_listener(id);
            }
        }
        self.shared.fanout.subscribers.lock().clear();
    }

    fn next_id(&self) -> u64 {
        let mut next = self.shared.next_id.lock();
        *next += 1;
        *next
    }
}

/// One consumer's view of the multicast event stream.
///
/// Dropping the subscription unsubscribes it; the last one to go detaches
/// the engine listener.
pub struct EventSubscription {
    rx: Receiver<PlaybackEvent>,
    id: u64,
    fanout: Arc<Fanout>,
    _lease: Lease,
}

impl EventSubscription {
    pub fn recv(&self) -> Result<PlaybackEvent, RecvError> {
        self.rx.recv()
    }

    pub fn try_recv(&self) -> Result<PlaybackEvent, TryRecvError> {
        self.rx.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<PlaybackEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Drain everything already delivered without blocking.
    pub fn try_iter(&self) -> impl Iterator<Item = PlaybackEvent> + '_ {
        self.rx.try_iter()
    }

    pub fn unsubscribe(self) {}
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        let id = self.id;
        self.fanout.subscribers.lock().retain(|(i, _)| *i != id);
    }
}

#[cfg(test)]
mod tests;
