//! Projected playback state.
//!
//! The projector turns engine events into immutable snapshots; the channel
//! republishes every snapshot to its subscribers. Consumers receive owned
//! copies, so mutating a snapshot never feeds back into the projector.

mod model;
mod projector;

pub use model::*;
pub use projector::*;

#[cfg(test)]
mod tests;
