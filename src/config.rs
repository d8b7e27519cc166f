//! Configuration loader and schema types.
//!
//! Sessions and playlists take their config structs directly; `Settings`
//! bundles them with engine tuning and knows how to load everything from a
//! TOML file and the environment.

mod load;
mod schema;

pub use load::config_path;
pub use schema::*;

#[cfg(test)]
mod tests;
