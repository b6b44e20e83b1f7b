//! Playback Events
//!
//! Event-based communication for UI synchronization. The manager queues
//! events as state changes; the presentation layer drains them once per frame
//! (or after every intent) and re-renders.

use crate::types::{PlayerStatus, TrackId};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PlaybackEvent {
    /// Transport status changed
    StateChanged { status: PlayerStatus },

    /// A different track was bound to the endpoint
    TrackChanged {
        track_id: TrackId,
        previous_track_id: Option<TrackId>,
    },

    /// Track reached its end
    TrackFinished { track_id: TrackId },

    /// Position or duration changed
    PositionUpdate {
        elapsed_secs: f64,
        duration_secs: f64,
        progress_percent: f64,
    },

    /// Effective volume changed (0.0-1.0)
    VolumeChanged { level: f64 },

    ShuffleChanged { enabled: bool },

    RepeatChanged { enabled: bool },

    /// Visualizer preference or availability changed
    VisualizerChanged { enabled: bool, available: bool },

    /// An operation failed; `retryable` errors need a fresh user intent
    Error { message: String, retryable: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = PlaybackEvent::StateChanged {
            status: PlayerStatus::Playing,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "stateChanged");
        assert_eq!(json["status"], "playing");
    }

    #[test]
    fn track_change_round_trips() {
        let event = PlaybackEvent::TrackChanged {
            track_id: TrackId::from("b"),
            previous_track_id: Some(TrackId::from("a")),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: PlaybackEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
