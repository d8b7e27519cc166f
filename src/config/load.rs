use std::env;
use std::path::{Path, PathBuf};

use super::schema::Settings;
use crate::error::{Error, Result};

impl Settings {
    /// Load settings from the file at `config_path()` (if it exists) and
    /// `PLAYSTREAM__*` environment variables.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path().as_deref())
    }

    /// Load settings from an optional TOML file, then environment overrides
    /// (`PLAYSTREAM__ENGINE__TICK_MS=100` sets `engine.tick_ms`). A missing
    /// file is not an error.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(false));
        }
        let cfg = builder
            .add_source(
                ::config::Environment::with_prefix("PLAYSTREAM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(cfg.try_deserialize()?)
    }

    /// Parse settings from an inline TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Like `load` followed by `validate`, falling back to defaults (with a
    /// warning) on any failure.
    pub fn load_or_default() -> Self {
        Self::load()
            .and_then(|s| s.validate().map(|()| s))
            .unwrap_or_else(|e| {
                log::warn!("playstream: {e}, using default settings");
                Self::default()
            })
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<()> {
        if self.engine.tick_ms == 0 {
            return Err(Error::InvalidSettings(
                "engine.tick_ms must be >= 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.engine.initial_volume) {
            return Err(Error::InvalidSettings(
                "engine.initial_volume must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings file location: `$PLAYSTREAM_CONFIG_PATH` when set, otherwise
/// `playstream/config.toml` under `$XDG_CONFIG_HOME` or `~/.config`.
pub fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = env::var_os("PLAYSTREAM_CONFIG_PATH") {
        return Some(PathBuf::from(explicit));
    }
    let base = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;
    Some(base.join("playstream").join("config.toml"))
}
