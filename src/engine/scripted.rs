//! A headless engine driven by its owner.
//!
//! `ScriptedEngine` produces no audio. It records every command it receives
//! and emits events only when told to, which makes it a data-only backend
//! for headless use and the engine double in tests. Clones share the same
//! engine, so one clone can be handed to a session while another keeps
//! emitting and inspecting.

use std::sync::Arc;

use parking_lot::Mutex;

use super::types::{EngineListener, EventKind, ListenerId, Listeners, PlaybackEvent, notify};
use super::{MediaEngine, OutputRouting};
use crate::error::Result;

/// A command as received by a `ScriptedEngine`.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    Play,
    Pause,
    Load,
    SetSource(String),
    SetAutoplay(bool),
    SetCurrentTime(f64),
    SetVolume(f64),
    SetMuted(bool),
    SetOutputDevice(String),
}

#[derive(Default)]
struct Inner {
    listeners: Listeners,
    commands: Vec<EngineCommand>,
    current_time: f64,
    duration: f64,
    routing: bool,
}

#[derive(Clone, Default)]
pub struct ScriptedEngine {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the output-device routing capability.
    pub fn with_output_routing(self) -> Self {
        self.inner.lock().routing = true;
        self
    }

    /// Set what `duration()` reports and what the next events carry.
    pub fn set_duration(&self, seconds: f64) {
        self.inner.lock().duration = seconds;
    }

    /// Move the playhead without recording a command, as playback would.
    pub fn advance_to(&self, seconds: f64) {
        self.inner.lock().current_time = seconds;
    }

    /// Emit `kind` carrying the engine's current time and duration.
    pub fn emit(&self, kind: EventKind) {
        let event = {
            let inner = self.inner.lock();
            PlaybackEvent::new(kind, inner.current_time, inner.duration)
        };
        self.emit_event(event);
    }

    /// Emit an `error` event with the given detail.
    pub fn fail(&self, message: &str) {
        self.emit_event(PlaybackEvent::failure(message));
    }

    pub fn emit_event(&self, event: PlaybackEvent) {
        let listeners = self.inner.lock().listeners.snapshot();
        notify(&listeners, &event);
    }

    pub fn commands(&self) -> Vec<EngineCommand> {
        self.inner.lock().commands.clone()
    }

    /// Return and forget the recorded commands.
    pub fn take_commands(&self) -> Vec<EngineCommand> {
        std::mem::take(&mut self.inner.lock().commands)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    fn record(&self, command: EngineCommand) {
        self.inner.lock().commands.push(command);
    }
}

impl MediaEngine for ScriptedEngine {
    fn play(&mut self) {
        self.record(EngineCommand::Play);
    }

    fn pause(&mut self) {
        self.record(EngineCommand::Pause);
    }

    fn load(&mut self) {
        self.record(EngineCommand::Load);
    }

    fn set_source(&mut self, source: &str) {
        self.record(EngineCommand::SetSource(source.to_string()));
    }

    fn set_autoplay(&mut self, autoplay: bool) {
        self.record(EngineCommand::SetAutoplay(autoplay));
    }

    fn current_time(&self) -> f64 {
        self.inner.lock().current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut inner = self.inner.lock();
        inner.current_time = seconds;
        inner.commands.push(EngineCommand::SetCurrentTime(seconds));
    }

    fn duration(&self) -> f64 {
        self.inner.lock().duration
    }

    fn set_volume(&mut self, volume: f64) {
        self.record(EngineCommand::SetVolume(volume));
    }

    fn set_muted(&mut self, muted: bool) {
        self.record(EngineCommand::SetMuted(muted));
    }

    fn add_listener(&mut self, listener: EngineListener) -> ListenerId {
        self.inner.lock().listeners.add(listener)
    }

    fn remove_listener(&mut self, id: ListenerId) {
        if !self.inner.lock().listeners.remove(id) {
            log::debug!("playstream: scripted engine had no listener {id:?}");
        }
    }

    fn output_routing(&mut self) -> Option<&mut dyn OutputRouting> {
        if self.inner.lock().routing {
            Some(self)
        } else {
            None
        }
    }
}

impl OutputRouting for ScriptedEngine {
    fn set_output_device(&mut self, device_id: &str) -> Result<()> {
        self.record(EngineCommand::SetOutputDevice(device_id.to_string()));
        Ok(())
    }
}
