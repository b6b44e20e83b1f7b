//! Error types for playback management

use crate::types::TrackId;
use thiserror::Error;

/// Playback errors
///
/// None of these are fatal to a session. Each one is scoped to the operation
/// that raised it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// The media endpoint has no playable data yet
    #[error("Media endpoint not ready")]
    NotReady,

    /// The host refused to start output (e.g. autoplay policy)
    ///
    /// Retry only after a fresh user gesture.
    #[error("Playback blocked: {0}")]
    Blocked(String),

    /// The host has no audio-graph capability
    #[error("Unsupported environment: {0}")]
    UnsupportedEnvironment(String),

    /// Building the analysis route failed
    #[error("Audio routing failed: {0}")]
    Routing(String),

    /// Playlist contains no tracks
    #[error("Playlist is empty")]
    EmptyPlaylist,

    /// Two tracks share an id
    #[error("Duplicate track id: {0}")]
    DuplicateTrack(TrackId),

    /// Track id is not part of the playlist
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    /// Configuration could not be parsed or is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PlaybackError {
    /// Whether a later user intent may succeed where this one failed
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlaybackError::NotReady | PlaybackError::Blocked(_))
    }

    /// Whether this error only disables visualization
    pub fn disables_visualizer(&self) -> bool {
        matches!(
            self,
            PlaybackError::UnsupportedEnvironment(_) | PlaybackError::Routing(_)
        )
    }
}

impl From<serde_json::Error> for PlaybackError {
    fn from(err: serde_json::Error) -> Self {
        PlaybackError::InvalidConfig(err.to_string())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
