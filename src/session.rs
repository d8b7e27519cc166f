//! Single-track session: one engine handle, its events and its state.
//!
//! The session is the only thing allowed to command its engine. Transport
//! calls are fire-and-forget; their effects come back as events, which the
//! session's state channel folds into snapshots.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::SessionConfig;
use crate::engine::{MediaEngine, PlaybackEvent};
use crate::error::{Error, Result};
use crate::events::{EventMulticast, EventSubscription, Forward};
use crate::state::{ProjectedState, StateChannel, StateSubscription, StreamState};

/// Transport controls shared by sessions and playlists.
pub trait Transport {
    type State: ProjectedState;

    fn play(&self);
    fn pause(&self);
    /// Seek to the start and pause.
    fn stop(&self);
    /// Seek to `seconds`; negative and non-finite positions seek to 0.
    fn seek_to(&self, seconds: f64);
    /// Set the volume, clamped to `[0, 1]`. NaN is ignored.
    fn set_volume(&self, volume: f64);
    fn set_mute(&self, muted: bool);
    /// Route output to `device_id`; `Error::Unsupported` if the engine can't.
    fn set_output_device(&self, device_id: &str) -> Result<()>;
    /// Subscribe to the raw engine events.
    fn events(&self) -> EventSubscription;
    /// Subscribe to state updates.
    fn state(&self) -> StateSubscription<Self::State>;
    /// The current snapshot.
    ///
    /// Engine events only reach the projector while the engine listener is
    /// attached, i.e. while at least one `events()` or `state()` subscription
    /// (or an auto-advancing playlist) is alive. Without one, the snapshot
    /// reflects loads and other programmatic changes but not playback.
    fn snapshot(&self) -> Self::State;
}

pub struct Session<E: MediaEngine, S: ProjectedState = StreamState> {
    engine: Arc<Mutex<E>>,
    events: EventMulticast<E>,
    state: StateChannel<S>,
    config: SessionConfig,
    loaded: Mutex<bool>,
}

impl<E: MediaEngine, S: ProjectedState> Session<E, S> {
    pub fn new(engine: E, config: SessionConfig) -> Self {
        Self::with_observer(engine, config, None)
    }

    /// Like `new`, with `observer` called for every dispatched event right
    /// after the state channel has applied it.
    pub(crate) fn with_observer(engine: E, config: SessionConfig, observer: Option<Forward>) -> Self {
        let engine = Arc::new(Mutex::new(engine));
        let state = StateChannel::new();
        let sink = state.clone();
        let forward: Forward = Arc::new(move |event: &PlaybackEvent| {
            sink.apply(event);
            if let Some(observer) = &observer {
                observer(event);
            }
        });
        Self {
            events: EventMulticast::new(engine.clone(), forward),
            engine,
            state,
            config,
            loaded: Mutex::new(false),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The multicast facade over this session's engine.
    pub fn multicast(&self) -> &EventMulticast<E> {
        &self.events
    }

    /// Load `source` as track 0.
    pub fn load_track(&self, source: &str) {
        self.load_with(source, |s| {
            s.stream_mut().track_info.current_track = Some(0);
        });
    }

    /// Load `source` and publish `change` together with the new source as a
    /// single programmatic update.
    ///
    /// Anything already loaded is stopped first. The engine autoplays the new
    /// source if the session was playing when the load was requested or the
    /// config asks for it.
    pub(crate) fn load_with(&self, source: &str, change: impl FnOnce(&mut S)) {
        let mut loaded = self.loaded.lock();
        // Read before stopping: the pause it causes may be projected at once.
        let was_playing = self.state.snapshot().stream().playing;
        if *loaded {
            self.stop();
        }
        let autoplay = was_playing || self.config.auto_play;
        {
            let mut engine = self.engine.lock();
            engine.set_source(source);
            engine.set_autoplay(autoplay);
            engine.load();
        }
        *loaded = true;
        log::debug!("playstream: loading {source:?} (autoplay: {autoplay})");

        self.state.update(|s| {
            s.stream_mut().track_info.source = Some(source.to_string());
            change(s);
        });
    }
}

impl<E: MediaEngine, S: ProjectedState> Transport for Session<E, S> {
    type State = S;

    fn play(&self) {
        self.engine.lock().play();
    }

    fn pause(&self) {
        self.engine.lock().pause();
    }

    fn stop(&self) {
        let mut engine = self.engine.lock();
        engine.set_current_time(0.0);
        engine.pause();
    }

    fn seek_to(&self, seconds: f64) {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        self.engine.lock().set_current_time(seconds);
    }

    fn set_volume(&self, volume: f64) {
        if volume.is_nan() {
            log::warn!("playstream: ignoring NaN volume");
            return;
        }
        self.engine.lock().set_volume(volume.clamp(0.0, 1.0));
    }

    fn set_mute(&self, muted: bool) {
        self.engine.lock().set_muted(muted);
    }

    fn set_output_device(&self, device_id: &str) -> Result<()> {
        let mut engine = self.engine.lock();
        match engine.output_routing() {
            Some(routing) => routing.set_output_device(device_id),
            None => Err(Error::Unsupported {
                operation: "set_output_device",
            }),
        }
    }

    fn events(&self) -> EventSubscription {
        self.events.subscribe()
    }

    fn state(&self) -> StateSubscription<S> {
        self.state.subscribe_with(Some(self.events.lease()))
    }

    fn snapshot(&self) -> S {
        self.state.snapshot()
    }
}

impl<E: MediaEngine, S: ProjectedState> Drop for Session<E, S> {
    fn drop(&mut self) {
        self.events.detach_all();
        self.state.close();
    }
}
