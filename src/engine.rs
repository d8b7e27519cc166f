//! The media engine boundary.
//!
//! A `MediaEngine` is the black-box playback primitive this crate
//! orchestrates: it takes fire-and-forget commands and reports what happened
//! through listeners. Decoding, buffering and device output stay inside the
//! engine.

mod scripted;
mod types;

#[cfg(feature = "rodio")]
mod rodio_backend;

pub use scripted::{EngineCommand, ScriptedEngine};
pub use types::*;

#[cfg(feature = "rodio")]
pub use rodio_backend::RodioEngine;

use crate::error::Result;

/// Commands consumed from a playback engine.
///
/// Every command returns immediately; its effect is observed later through
/// the events delivered to registered listeners. Listeners may be invoked
/// from any thread, but implementations must not hold internal locks while
/// calling them.
pub trait MediaEngine: Send + 'static {
    fn play(&mut self);
    fn pause(&mut self);
    /// Start fetching the current source.
    fn load(&mut self);
    fn set_source(&mut self, source: &str);
    /// Whether the next `load` should start playing once ready.
    fn set_autoplay(&mut self, autoplay: bool);
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    fn duration(&self) -> f64;
    fn set_volume(&mut self, volume: f64);
    fn set_muted(&mut self, muted: bool);

    fn add_listener(&mut self, listener: EngineListener) -> ListenerId;
    fn remove_listener(&mut self, id: ListenerId);

    /// Output-device routing, if the engine can do it.
    fn output_routing(&mut self) -> Option<&mut dyn OutputRouting> {
        None
    }
}

/// Optional capability: route audio to a specific output device.
pub trait OutputRouting {
    fn set_output_device(&mut self, device_id: &str) -> Result<()>;
}
