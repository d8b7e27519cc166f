//! Engine-facing event types and the listener registry.
//!
//! These are the shapes that cross the boundary between a media engine and
//! the rest of the crate: the closed set of event kinds, the payload sampled
//! at emission time and the callbacks engines invoke.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Playback reached the end of the source.
    Ended,
    /// The engine failed to load or decode the source.
    Error,
    /// Playback was requested.
    Play,
    /// Playback actually started producing output.
    Playing,
    Pause,
    /// Periodic position update.
    TimeUpdate,
    /// Enough data is buffered to start playback.
    CanPlay,
    /// Duration and format are known.
    LoadedMetadata,
    /// The engine started fetching a new source.
    LoadStart,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        EventKind::Ended,
        EventKind::Error,
        EventKind::Play,
        EventKind::Playing,
        EventKind::Pause,
        EventKind::TimeUpdate,
        EventKind::CanPlay,
        EventKind::LoadedMetadata,
        EventKind::LoadStart,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Ended => "ended",
            EventKind::Error => "error",
            EventKind::Play => "play",
            EventKind::Playing => "playing",
            EventKind::Pause => "pause",
            EventKind::TimeUpdate => "timeupdate",
            EventKind::CanPlay => "canplay",
            EventKind::LoadedMetadata => "loadedmetadata",
            EventKind::LoadStart => "loadstart",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown playback event kind {0:?}")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

/// One occurrence emitted by a media engine.
///
/// `current_time` and `duration` (seconds) are read from the engine when the
/// event is emitted, so consumers never have to query the engine afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackEvent {
    pub kind: EventKind,
    pub current_time: f64,
    pub duration: f64,
    /// Error detail, only present on `error` events.
    pub error: Option<String>,
}

impl PlaybackEvent {
    pub fn new(kind: EventKind, current_time: f64, duration: f64) -> Self {
        Self {
            kind,
            current_time,
            duration,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Error,
            current_time: 0.0,
            duration: 0.0,
            error: Some(message.into()),
        }
    }
}

/// Callback an engine invokes for every event it emits.
pub type EngineListener = Arc<dyn Fn(&PlaybackEvent) + Send + Sync>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listener registry for engine implementations.
///
/// Engines must call listeners without holding their own locks, so the
/// registry hands out a snapshot to iterate over.
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, EngineListener)>,
}

impl Listeners {
    pub fn add(&mut self, listener: EngineListener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(i, _)| *i != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> Vec<EngineListener> {
        self.entries.iter().map(|(_, l)| l.clone()).collect()
    }
}

/// Deliver `event` to every listener in `listeners`.
pub fn notify(listeners: &[EngineListener], event: &PlaybackEvent) {
    for listener in listeners {
        listener(event);
    }
}
