use serde::Serialize;

/// What is known about the loaded track. Times are in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackInfo {
    /// Index of the loaded track in its list.
    pub current_track: Option<usize>,
    /// Source identifier handed to the engine.
    pub source: Option<String>,
    pub duration: Option<f64>,
    pub current_time: Option<f64>,
}

/// State of a single-track session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamState {
    pub playing: bool,
    pub track_info: TrackInfo,
}

/// State of a playlist: the session state plus boundary flags.
///
/// `is_first_track` and `is_last_track` are always written together with
/// `track_info.current_track`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaylistState {
    #[serde(flatten)]
    pub stream: StreamState,
    pub is_first_track: bool,
    pub is_last_track: bool,
}

/// A snapshot shape the projector can fold events into.
pub trait ProjectedState: Clone + Default + Send + 'static {
    fn stream(&self) -> &StreamState;
    fn stream_mut(&mut self) -> &mut StreamState;
}

impl ProjectedState for StreamState {
    fn stream(&self) -> &StreamState {
        self
    }

    fn stream_mut(&mut self) -> &mut StreamState {
        self
    }
}

impl ProjectedState for PlaylistState {
    fn stream(&self) -> &StreamState {
        &self.stream
    }

    fn stream_mut(&mut self) -> &mut StreamState {
        &mut self.stream
    }
}
