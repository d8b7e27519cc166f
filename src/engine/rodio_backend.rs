//! `MediaEngine` on top of `rodio`.
//!
//! The output stream is not `Send`, so a dedicated audio thread owns it
//! together with the current `Sink`. `RodioEngine` itself is only a handle:
//! commands travel to the thread over a channel and the thread reports back
//! by emitting events. A periodic tick publishes `timeupdate` and notices
//! when the sink has drained.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use super::MediaEngine;
use super::types::{EngineListener, EventKind, ListenerId, Listeners, PlaybackEvent, notify};
use crate::config::EngineSettings;
use crate::error::{Error, Result};

#[derive(Debug)]
enum RodioCmd {
    Load { source: String, autoplay: bool },
    Play,
    Pause,
    Seek(f64),
    Volume(f32),
    Quit,
}

/// State the audio thread shares with the handle.
#[derive(Default)]
struct Shared {
    listeners: Listeners,
    current_time: f64,
    duration: f64,
}

type SharedHandle = Arc<Mutex<Shared>>;

pub struct RodioEngine {
    tx: Sender<RodioCmd>,
    shared: SharedHandle,
    source: String,
    autoplay: bool,
    volume: f64,
    muted: bool,
    join: Option<JoinHandle<()>>,
}

impl RodioEngine {
    /// Spawn the audio thread on the default output device.
    ///
    /// Fails with `Error::Output` when no output stream can be opened.
    pub fn new(settings: &EngineSettings) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<RodioCmd>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<std::result::Result<(), String>>(1);
        let shared: SharedHandle = Arc::new(Mutex::new(Shared::default()));
        let join = spawn_audio_thread(
            rx,
            ready_tx,
            shared.clone(),
            Duration::from_millis(settings.tick_ms.max(1)),
            settings.initial_volume as f32,
        );

        let opened = ready_rx
            .recv()
            .unwrap_or_else(|_| Err("audio thread exited during startup".to_string()));
        if let Err(msg) = opened {
            let _ = join.join();
            return Err(Error::Output(msg));
        }

        Ok(Self {
            tx,
            shared,
            source: String::new(),
            autoplay: false,
            volume: settings.initial_volume,
            muted: false,
            join: Some(join),
        })
    }

    fn send(&self, cmd: RodioCmd) {
        if let Err(e) = self.tx.send(cmd) {
            log::warn!("playstream: audio thread is gone, dropping {:?}", e.0);
        }
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume as f32 }
    }
}

impl MediaEngine for RodioEngine {
    fn play(&mut self) {
        self.send(RodioCmd::Play);
    }

    fn pause(&mut self) {
        self.send(RodioCmd::Pause);
    }

    fn load(&mut self) {
        self.send(RodioCmd::Load {
            source: self.source.clone(),
            autoplay: self.autoplay,
        });
    }

    fn set_source(&mut self, source: &str) {
        self.source = source.to_string();
    }

    fn set_autoplay(&mut self, autoplay: bool) {
        self.autoplay = autoplay;
    }

    fn current_time(&self) -> f64 {
        self.shared.lock().current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.shared.lock().current_time = seconds;
        self.send(RodioCmd::Seek(seconds));
    }

    fn duration(&self) -> f64 {
        self.shared.lock().duration
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
        self.send(RodioCmd::Volume(self.effective_volume()));
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.send(RodioCmd::Volume(self.effective_volume()));
    }

    fn add_listener(&mut self, listener: EngineListener) -> ListenerId {
        self.shared.lock().listeners.add(listener)
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.shared.lock().listeners.remove(id);
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        let _ = self.tx.send(RodioCmd::Quit);
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}

/// Emit an event stamped with the shared position, outside the lock.
fn emit(shared: &SharedHandle, kind: EventKind) {
    let (listeners, event) = {
        let s = shared.lock();
        (
            s.listeners.snapshot(),
            PlaybackEvent::new(kind, s.current_time, s.duration),
        )
    };
    notify(&listeners, &event);
}

fn emit_failure(shared: &SharedHandle, message: String) {
    log::warn!("playstream: {message}");
    let listeners = {
        let mut s = shared.lock();
        s.current_time = 0.0;
        s.duration = 0.0;
        s.listeners.snapshot()
    };
    notify(&listeners, &PlaybackEvent::failure(message));
}

/// Open and decode `source`, returning a paused sink and its duration.
///
/// Sources of unknown length report an infinite duration.
fn open_sink(stream: &OutputStream, source: &str) -> std::result::Result<(Sink, f64), String> {
    let file = File::open(source).map_err(|e| format!("failed to open {source:?}: {e}"))?;
    let decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| format!("failed to decode {source:?}: {e}"))?;
    let duration = decoder
        .total_duration()
        .map_or(f64::INFINITY, |d| d.as_secs_f64());

    let sink = Sink::connect_new(stream.mixer());
    sink.append(decoder);
    sink.pause();
    Ok((sink, duration))
}

fn spawn_audio_thread(
    rx: Receiver<RodioCmd>,
    ready: SyncSender<std::result::Result<(), String>>,
    shared: SharedHandle,
    tick: Duration,
    initial_volume: f32,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(s) => s,
            Err(e) => {
                let _ = ready.send(Err(format!("no audio output device: {e}")));
                return;
            }
        };
        let _ = ready.send(Ok(()));
        // rodio logs to stderr when the stream is dropped.
        stream.log_on_drop(false);

        let mut sink: Option<Sink> = None;
        let mut source = String::new();
        let mut playing = false;
        let mut volume = initial_volume;

        // Reopen the current source, used both for loads and for replays after
        // the sink drained.
        let reload = |source: &str, sink: &mut Option<Sink>, volume: f32| -> bool {
            if let Some(old) = sink.take() {
                old.stop();
            }
            {
                let mut s = shared.lock();
                s.current_time = 0.0;
            }
            emit(&shared, EventKind::LoadStart);
            match open_sink(&stream, source) {
                Ok((new_sink, duration)) => {
                    new_sink.set_volume(volume);
                    *sink = Some(new_sink);
                    shared.lock().duration = duration;
                    emit(&shared, EventKind::LoadedMetadata);
                    emit(&shared, EventKind::CanPlay);
                    true
                }
                Err(msg) => {
                    emit_failure(&shared, msg);
                    false
                }
            }
        };

        let start = |sink: &Sink, playing: &mut bool| {
            sink.play();
            *playing = true;
            emit(&shared, EventKind::Play);
            emit(&shared, EventKind::Playing);
        };

        loop {
            match rx.recv_timeout(tick) {
                Ok(cmd) => match cmd {
                    RodioCmd::Load {
                        source: next,
                        autoplay,
                    } => {
                        source = next;
                        playing = false;
                        if reload(&source, &mut sink, volume) && autoplay {
                            if let Some(s) = sink.as_ref() {
                                start(s, &mut playing);
                            }
                        }
                    }
                    RodioCmd::Play => {
                        let drained = sink.as_ref().is_some_and(|s| s.empty());
                        if drained && !reload(&source, &mut sink, volume) {
                            continue;
                        }
                        if let Some(s) = sink.as_ref() {
                            start(s, &mut playing);
                        }
                    }
                    RodioCmd::Pause => {
                        if let Some(s) = sink.as_ref() {
                            s.pause();
                        }
                        playing = false;
                        emit(&shared, EventKind::Pause);
                    }
                    RodioCmd::Seek(seconds) => {
                        let Some(s) = sink.as_ref() else {
                            continue;
                        };
                        let target = match Duration::try_from_secs_f64(seconds.max(0.0)) {
                            Ok(d) => d,
                            Err(e) => {
                                log::warn!("playstream: ignoring seek to {seconds}s: {e}");
                                continue;
                            }
                        };
                        if let Err(e) = s.try_seek(target) {
                            log::warn!("playstream: seek to {seconds}s failed: {e}");
                        }
                        shared.lock().current_time = s.get_pos().as_secs_f64();
                        emit(&shared, EventKind::TimeUpdate);
                    }
                    RodioCmd::Volume(v) => {
                        volume = v;
                        if let Some(s) = sink.as_ref() {
                            s.set_volume(v);
                        }
                    }
                    RodioCmd::Quit => {
                        if let Some(s) = sink.take() {
                            s.stop();
                        }
                        break;
                    }
                },
                Err(RecvTimeoutError::Timeout) => {
                    if !playing {
                        continue;
                    }
                    let Some(s) = sink.as_ref() else {
                        continue;
                    };
                    shared.lock().current_time = s.get_pos().as_secs_f64();
                    emit(&shared, EventKind::TimeUpdate);
                    if s.empty() {
                        playing = false;
                        emit(&shared, EventKind::Pause);
                        emit(&shared, EventKind::Ended);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}
