use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::model::ProjectedState;
use crate::engine::{EventKind, PlaybackEvent};
use crate::events::Lease;

/// Folds playback events into a snapshot. No I/O; the engine payload carried
/// by each event is the only input.
#[derive(Debug, Default)]
pub struct StateProjector<S> {
    state: S,
}

impl<S: ProjectedState> StateProjector<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &PlaybackEvent) {
        let stream = self.state.stream_mut();
        let info = &mut stream.track_info;
        match event.kind {
            EventKind::CanPlay => {
                info.duration = Some(event.duration);
                stream.playing = false;
            }
            EventKind::Playing => stream.playing = true,
            EventKind::Pause => stream.playing = false,
            EventKind::TimeUpdate => info.current_time = Some(event.current_time),
            EventKind::Error => {
                stream.playing = false;
                info.current_time = Some(0.0);
                info.duration = Some(0.0);
            }
            EventKind::Ended
            | EventKind::Play
            | EventKind::LoadedMetadata
            | EventKind::LoadStart => {}
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }
}

/// One publication on the state channel. Both variants carry the whole
/// snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate<S> {
    /// An engine event was applied.
    Event { kind: EventKind, state: S },
    /// A property changed without an engine event (e.g. a track was loaded).
    Changed(S),
}

impl<S> StateUpdate<S> {
    pub fn state(&self) -> &S {
        match self {
            StateUpdate::Event { state, .. } | StateUpdate::Changed(state) => state,
        }
    }

    pub fn into_state(self) -> S {
        match self {
            StateUpdate::Event { state, .. } | StateUpdate::Changed(state) => state,
        }
    }

    /// The event behind this update, if any.
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            StateUpdate::Event { kind, .. } => Some(*kind),
            StateUpdate::Changed(_) => None,
        }
    }
}

struct ChannelInner<S> {
    projector: StateProjector<S>,
    subscribers: Vec<(u64, Sender<StateUpdate<S>>)>,
    next_id: u64,
}

impl<S: ProjectedState> ChannelInner<S> {
    fn publish(&mut self, update: StateUpdate<S>) {
        self.subscribers.retain(|(_, tx)| tx.send(update.clone()).is_ok());
    }
}

/// Projector plus the subscribers of its snapshots.
///
/// Event-driven and programmatic updates go through the same lock, so every
/// subscriber observes them in one total order and none is lost.
pub struct StateChannel<S> {
    inner: Arc<Mutex<ChannelInner<S>>>,
}

impl<S> Clone for StateChannel<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: ProjectedState> Default for StateChannel<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ProjectedState> StateChannel<S> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ChannelInner {
                projector: StateProjector::new(),
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    pub fn apply(&self, event: &PlaybackEvent) {
        let mut inner = self.inner.lock();
        inner.projector.apply(event);
        let update = StateUpdate::Event {
            kind: event.kind,
            state: inner.projector.state().clone(),
        };
        inner.publish(update);
    }

    /// Apply a programmatic change and publish it as `Changed`.
    pub fn update(&self, change: impl FnOnce(&mut S)) {
        let mut inner = self.inner.lock();
        change(inner.projector.state_mut());
        let update = StateUpdate::Changed(inner.projector.state().clone());
        inner.publish(update);
    }

    pub fn snapshot(&self) -> S {
        self.inner.lock().projector.state().clone()
    }

    pub fn subscribe(&self) -> StateSubscription<S> {
        self.subscribe_with(None)
    }

    pub(crate) fn subscribe_with(&self, lease: Option<Lease>) -> StateSubscription<S> {
        let (tx, rx) = mpsc::channel();
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.subscribers.push((id, tx));
        StateSubscription {
            rx,
            id,
            channel: self.inner.clone(),
            _lease: lease,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    /// Disconnect every subscriber.
    pub(crate) fn close(&self) {
        self.inner.lock().subscribers.clear();
    }
}

/// A consumer of state updates. Dropping it unsubscribes.
pub struct StateSubscription<S> {
    rx: Receiver<StateUpdate<S>>,
    id: u64,
    channel: Arc<Mutex<ChannelInner<S>>>,
    _lease: Option<Lease>,
}

impl<S> StateSubscription<S> {
    pub fn recv(&self) -> Result<StateUpdate<S>, RecvError> {
        self.rx.recv()
    }

    pub fn try_recv(&self) -> Result<StateUpdate<S>, TryRecvError> {
        self.rx.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<StateUpdate<S>, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    pub fn try_iter(&self) -> impl Iterator<Item = StateUpdate<S>> + '_ {
        self.rx.try_iter()
    }

    /// Block until an update satisfies `pred` or `timeout` elapses.
    pub fn wait_for(&self, timeout: Duration, mut pred: impl FnMut(&S) -> bool) -> Option<S> {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.checked_duration_since(Instant::now())?;
            match self.rx.recv_timeout(left) {
                Ok(update) if pred(update.state()) => return Some(update.into_state()),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}

impl<S> Drop for StateSubscription<S> {
    fn drop(&mut self) {
        let id = self.id;
        self.channel.lock().subscribers.retain(|(i, _)| *i != id);
    }
}
