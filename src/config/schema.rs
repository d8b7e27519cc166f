use serde::Deserialize;

/// Top-level settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/playstream/config.toml` or `~/.config/playstream/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `PLAYSTREAM__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub session: SessionConfig,
    pub playlist: PlaylistConfig,
    pub engine: EngineSettings,
}

/// Behavior of a single-track session. Read-only once the session exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Start playing as soon as a loaded track is ready.
    pub auto_play: bool,
}

/// Behavior of a playlist. Read-only once the playlist exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlaylistConfig {
    /// Start playing as soon as a loaded track is ready.
    pub auto_play: bool,
    /// Index loaded on construction. Out-of-range values fall back to 0.
    pub initial_track: usize,
    /// Move on to the next track (and play it) when the current one ends.
    pub auto_play_next: bool,
}

impl PlaylistConfig {
    /// The session-level part of this config.
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            auto_play: self.auto_play,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Interval between `timeupdate` events while playing (milliseconds).
    pub tick_ms: u64,
    /// Volume applied to freshly opened outputs, in `[0, 1]`.
    pub initial_volume: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick_ms: 250,
            initial_volume: 1.0,
        }
    }
}
