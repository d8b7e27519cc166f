//! Crate-wide error type.
//!
//! Only failures the caller can act on synchronously live here. Errors
//! reported by the media engine itself arrive as `error` events and are
//! projected into state instead of being raised.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The engine lacks a requested capability (e.g. output-device routing).
    #[error("{operation} is not supported by this playback engine")]
    Unsupported { operation: &'static str },

    #[error("a playlist needs at least one track")]
    EmptyPlaylist,

    #[error("failed to load settings: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("failed to parse settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The audio output could not be opened or rejected a request.
    #[error("audio output error: {0}")]
    Output(String),
}

pub type Result<T> = std::result::Result<T, Error>;
