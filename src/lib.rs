//! Reactive playback over a black-box media engine.
//!
//! Engine events are multicast to any number of observers and folded into
//! immutable state snapshots published on a channel. A [`Session`] drives one
//! engine; a [`Playlist`] composes a session with an ordered track list,
//! next/previous navigation and optional auto-advance.
//!
//! ```no_run
//! use playstream::{Playlist, PlaylistConfig, ScriptedEngine, Transport};
//!
//! let config = PlaylistConfig { auto_play_next: true, ..Default::default() };
//! let playlist = Playlist::new(ScriptedEngine::new(), ["intro.ogg", "theme.ogg"], config)?;
//! let state = playlist.state();
//! playlist.play();
//! while let Ok(update) = state.recv() {
//!     println!("{:?}", update.state());
//! }
//! # Ok::<(), playstream::Error>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod playlist;
pub mod session;
pub mod state;

pub use config::{EngineSettings, PlaylistConfig, SessionConfig, Settings};
#[cfg(feature = "rodio")]
pub use engine::RodioEngine;
pub use engine::{EventKind, MediaEngine, PlaybackEvent, ScriptedEngine};
pub use error::{Error, Result};
pub use events::{EventMulticast, EventSubscription};
pub use playlist::{Playlist, TrackList};
pub use session::{Session, Transport};
pub use state::{PlaylistState, StateSubscription, StateUpdate, StreamState, TrackInfo};
