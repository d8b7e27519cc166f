//! Playlist navigation on top of a single-track session.
//!
//! A `Playlist` owns one `Session` plus an immutable list of sources and the
//! index into it. Index changes and the boundary flags are published in the
//! same update as the new `current_track`. With `auto_play_next`, every
//! dispatched event is fed to the advance machine as it happens; when a
//! track that became ready has ended, a worker thread moves on, unless the
//! user already switched tracks in the meantime.

mod cursor;
mod tracks;

pub use tracks::TrackList;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use cursor::{Advance, Cursor};

use crate::config::PlaylistConfig;
use crate::engine::{MediaEngine, PlaybackEvent};
use crate::error::{Error, Result};
use crate::events::{EventSubscription, Forward, Lease};
use crate::session::{Session, Transport};
use crate::state::{PlaylistState, StateSubscription};

/// How long the advance worker waits for a decision before rechecking shutdown.
const WORKER_POLL: Duration = Duration::from_millis(50);

struct Navigator<E: MediaEngine> {
    session: Session<E, PlaylistState>,
    tracks: TrackList,
    cursor: Mutex<Cursor>,
    /// Only ever locked briefly and never while calling out, so the dispatch
    /// path can take it while a navigation holds `cursor`.
    advance: Arc<Mutex<Advance>>,
    config: PlaylistConfig,
}

impl<E: MediaEngine> Navigator<E> {
    /// Point the cursor at `index` and load that source. Out-of-range indices
    /// are ignored and return `false`.
    fn load_at(&self, cursor: &mut Cursor, index: usize) -> bool {
        if !cursor.enter(index) {
            return false;
        }
        self.advance.lock().rearm();
        let (first, last) = (cursor.is_first(), cursor.is_last());
        self.session.load_with(&self.tracks[index], |s| {
            s.stream.track_info.current_track = Some(index);
            s.is_first_track = first;
            s.is_last_track = last;
        });
        true
    }

    fn next(&self) {
        let mut cursor = self.cursor.lock();
        if let Some(index) = cursor.following() {
            self.load_at(&mut cursor, index);
        }
    }

    fn previous(&self) {
        let mut cursor = self.cursor.lock();
        if let Some(index) = cursor.preceding() {
            self.load_at(&mut cursor, index);
        }
    }

    fn switch_to(&self, index: usize) -> bool {
        let mut cursor = self.cursor.lock();
        self.load_at(&mut cursor, index)
    }

    /// Act on "the track of `load` ended": next, then play. Dropped when
    /// another load started since the decision was taken.
    fn advance_from(&self, load: u64) {
        let mut cursor = self.cursor.lock();
        if self.advance.lock().load() != load {
            log::debug!("playstream: ignoring end of superseded load {load}");
            return;
        }
        match cursor.following() {
            Some(index) => {
                log::debug!("playstream: track {} ended, advancing", cursor.index());
                self.load_at(&mut cursor, index);
            }
            None => log::debug!("playstream: end of playlist"),
        }
        self.session.play();
    }
}

/// Dispatch-side half of auto-advance: feeds every event to the machine and
/// hands decisions to the worker.
fn advance_observer(advance: Arc<Mutex<Advance>>, decisions: mpsc::Sender<u64>) -> Forward {
    Arc::new(move |event: &PlaybackEvent| {
        let decision = advance.lock().observe(event.kind);
        if let Some(load) = decision {
            // The worker only goes away on shutdown.
            let _ = decisions.send(load);
        }
    })
}

fn spawn_advance_worker<E: MediaEngine>(
    nav: Arc<Navigator<E>>,
    decisions: Receiver<u64>,
    lease: Lease,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        // Keeps the engine listener attached for as long as we advance.
        let _lease = lease;
        while !shutdown.load(Ordering::SeqCst) {
            match decisions.recv_timeout(WORKER_POLL) {
                Ok(load) => nav.advance_from(load),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}

pub struct Playlist<E: MediaEngine> {
    nav: Arc<Navigator<E>>,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl<E: MediaEngine> Playlist<E> {
    /// Build a playlist over `tracks` and load the initial track.
    ///
    /// An `initial_track` past the end of the list falls back to 0.
    pub fn new(engine: E, tracks: impl Into<TrackList>, config: PlaylistConfig) -> Result<Self> {
        let tracks = tracks.into();
        if tracks.is_empty() {
            return Err(Error::EmptyPlaylist);
        }
        let initial = if config.initial_track < tracks.len() {
            config.initial_track
        } else {
            log::warn!(
                "playstream: initial track {} out of range for {} tracks, starting at 0",
                config.initial_track,
                tracks.len()
            );
            0
        };

        let advance = Arc::new(Mutex::new(Advance::default()));
        let (observer, decisions) = if config.auto_play_next {
            let (tx, rx) = mpsc::channel();
            (Some(advance_observer(advance.clone(), tx)), Some(rx))
        } else {
            (None, None)
        };

        let nav = Arc::new(Navigator {
            session: Session::with_observer(engine, config.session(), observer),
            cursor: Mutex::new(Cursor::new(tracks.len(), initial)),
            advance,
            tracks,
            config,
        });
        let shutdown = Arc::new(AtomicBool::new(false));
        // Attach before the first load so its canplay is not missed.
        let worker = decisions.map(|rx| {
            let lease = nav.session.multicast().lease();
            spawn_advance_worker(nav.clone(), rx, lease, shutdown.clone())
        });

        {
            let mut cursor = nav.cursor.lock();
            nav.load_at(&mut cursor, initial);
        }

        Ok(Self {
            nav,
            shutdown,
            worker,
        })
    }

    /// Select the next track without starting it. No-op at the last track.
    pub fn next(&self) {
        self.nav.next();
    }

    /// Select the previous track without starting it. No-op at the first track.
    pub fn previous(&self) {
        self.nav.previous();
    }

    /// Load and play the track at `index`.
    ///
    /// Indices outside the list are silently ignored, as with `switch_to`.
    pub fn play_at(&self, index: usize) {
        if self.nav.switch_to(index) {
            self.nav.session.play();
        }
    }

    /// Load the track at `index` without playing it.
    pub fn switch_to(&self, index: usize) {
        self.nav.switch_to(index);
    }

    pub fn is_first_playing(&self) -> bool {
        self.nav.cursor.lock().is_first()
    }

    pub fn is_last_playing(&self) -> bool {
        self.nav.cursor.lock().is_last()
    }

    pub fn current_index(&self) -> usize {
        self.nav.cursor.lock().index()
    }

    pub fn tracks(&self) -> &TrackList {
        &self.nav.tracks
    }

    pub fn config(&self) -> &PlaylistConfig {
        &self.nav.config
    }
}

impl<E: MediaEngine> Transport for Playlist<E> {
    type State = PlaylistState;

    fn play(&self) {
        self.nav.session.play();
    }

    fn pause(&self) {
        self.nav.session.pause();
    }

    fn stop(&self) {
        self.nav.session.stop();
    }

    fn seek_to(&self, seconds: f64) {
        self.nav.session.seek_to(seconds);
    }

    fn set_volume(&self, volume: f64) {
        self.nav.session.set_volume(volume);
    }

    fn set_mute(&self, muted: bool) {
        self.nav.session.set_mute(muted);
    }

    fn set_output_device(&self, device_id: &str) -> Result<()> {
        self.nav.session.set_output_device(device_id)
    }

    fn events(&self) -> EventSubscription {
        self.nav.session.events()
    }

    fn state(&self) -> StateSubscription<PlaylistState> {
        self.nav.session.state()
    }

    fn snapshot(&self) -> PlaylistState {
        self.nav.session.snapshot()
    }
}

impl<E: MediaEngine> Drop for Playlist<E> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(h) = self.worker.take() {
            if h.join().is_err() {
                log::error!("playstream: auto-advance worker panicked");
            }
        }
    }
}
