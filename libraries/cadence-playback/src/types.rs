//! Core types for playback management

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Stable track identifier supplied by the track source
///
/// Serializes as a string. Numeric ids in playlist data are accepted and
/// kept in their decimal form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TrackId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTrackId {
    Text(String),
    Integer(i64),
    Number(f64),
}

impl<'de> Deserialize<'de> for TrackId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match RawTrackId::deserialize(deserializer)? {
            RawTrackId::Text(id) => Self(id),
            RawTrackId::Integer(id) => Self(id.to_string()),
            // JS numbers arrive as f64; whole values print without a fraction
            RawTrackId::Number(id) => Self(id.to_string()),
        })
    }
}

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Track metadata for playback and display
///
/// Immutable once handed to a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Media locator bound to the endpoint (URL or path)
    pub locator: String,
}

impl Track {
    pub fn new(
        id: impl Into<TrackId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        locator: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            locator: locator.into(),
        }
    }
}

/// Transport status of the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    /// Track bound, no media data yet
    Idle,

    /// Media data loaded, never started
    Ready,

    /// Output running
    Playing,

    /// Stopped mid-track
    Paused,
}

impl PlayerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerStatus::Idle => "idle",
            PlayerStatus::Ready => "ready",
            PlayerStatus::Playing => "playing",
            PlayerStatus::Paused => "paused",
        }
    }
}

/// Everything the presentation layer renders, in one value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub track: Track,
    pub current_index: usize,
    pub status: PlayerStatus,
    pub is_playing: bool,
    /// A play request is waiting on the host
    pub play_pending: bool,
    pub is_seeking: bool,
    pub progress_percent: f64,
    pub elapsed_secs: f64,
    pub duration_secs: f64,
    /// `elapsed_secs` as `M:SS`
    pub elapsed: String,
    /// `duration_secs` as `M:SS`
    pub duration: String,
    pub shuffle: bool,
    pub repeat: bool,
    pub volume: f64,
    pub visualizer: bool,
    pub visualizer_available: bool,
}

/// Navigation direction requested by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

/// Index arithmetic used by next/prev
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationMode {
    /// Both directions step to `index - 1` (wrapping)
    ///
    /// Matches the shipped player, where next and prev move the same way.
    #[default]
    Reference,

    /// Forward steps to `index + 1`, backward to `index - 1` (wrapping)
    Directional,
}

/// Settings for the frequency analyser
///
/// Defaults mirror the Web Audio `AnalyserNode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyserSettings {
    /// FFT window size (power of two, 32..=32768, default: 2048)
    pub fft_size: u32,

    /// Averaging constant between frames (0.0-1.0, default: 0.8)
    pub smoothing: f64,

    /// Level mapped to byte 0 (default: -100 dB)
    pub min_decibels: f64,

    /// Level mapped to byte 255 (default: -30 dB)
    pub max_decibels: f64,
}

impl AnalyserSettings {
    pub const MIN_FFT_SIZE: u32 = 32;
    pub const MAX_FFT_SIZE: u32 = 32768;

    /// Number of frequency bins exposed by the tap
    pub fn frequency_bin_count(&self) -> usize {
        (self.fft_size / 2) as usize
    }

    pub fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two()
            || !(Self::MIN_FFT_SIZE..=Self::MAX_FFT_SIZE).contains(&self.fft_size)
        {
            return Err(PlaybackError::InvalidConfig(format!(
                "fft_size must be a power of two in {}..={}, got {}",
                Self::MIN_FFT_SIZE,
                Self::MAX_FFT_SIZE,
                self.fft_size
            )));
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(PlaybackError::InvalidConfig(format!(
                "smoothing must be within 0..=1, got {}",
                self.smoothing
            )));
        }
        if !self.min_decibels.is_finite() || !self.max_decibels.is_finite() {
            return Err(PlaybackError::InvalidConfig(format!(
                "decibel range must be finite, got {}..{}",
                self.min_decibels, self.max_decibels
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(PlaybackError::InvalidConfig(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}

impl Default for AnalyserSettings {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

/// Configuration for playback manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial volume (0.0-1.0, default: 0.7)
    pub volume: f64,

    /// Initial repeat flag (default: false)
    pub repeat: bool,

    /// Initial shuffle flag (default: false)
    pub shuffle: bool,

    /// Visualizer shown at startup (default: false)
    pub visualizer: bool,

    /// Next/prev index arithmetic (default: Reference)
    pub navigation: NavigationMode,

    /// Frequency analyser settings
    pub analyser: AnalyserSettings,
}

impl PlaybackConfig {
    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.volume.is_finite() || !(0.0..=1.0).contains(&self.volume) {
            return Err(PlaybackError::InvalidConfig(format!(
                "volume must be within 0..=1, got {}",
                self.volume
            )));
        }
        self.analyser.validate()
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 0.7,
            repeat: false,
            shuffle: false,
            visualizer: false,
            navigation: NavigationMode::Reference,
            analyser: AnalyserSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.volume, 0.7);
        assert!(!config.repeat);
        assert!(!config.shuffle);
        assert!(!config.visualizer);
        assert_eq!(config.navigation, NavigationMode::Reference);
        assert_eq!(config.analyser.fft_size, 2048);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config =
            PlaybackConfig::from_json(r#"{"repeat": true, "navigation": "directional"}"#).unwrap();
        assert!(config.repeat);
        assert_eq!(config.navigation, NavigationMode::Directional);
        assert_eq!(config.volume, 0.7);
        assert_eq!(config.analyser, AnalyserSettings::default());
    }

    #[test]
    fn rejects_out_of_range_config() {
        assert!(matches!(
            PlaybackConfig::from_json(r#"{"volume": 1.5}"#),
            Err(PlaybackError::InvalidConfig(_))
        ));
        assert!(matches!(
            PlaybackConfig::from_json(r#"{"analyser": {"fft_size": 1000}}"#),
            Err(PlaybackError::InvalidConfig(_))
        ));
        assert!(matches!(
            PlaybackConfig::from_json("not json"),
            Err(PlaybackError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_non_finite_decibel_range() {
        for (min, max) in [(f64::NAN, -30.0), (-100.0, f64::NAN), (f64::NEG_INFINITY, -30.0)] {
            let settings = AnalyserSettings {
                min_decibels: min,
                max_decibels: max,
                ..Default::default()
            };
            assert!(matches!(
                settings.validate(),
                Err(PlaybackError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn analyser_bin_count_is_half_fft() {
        let settings = AnalyserSettings {
            fft_size: 512,
            ..Default::default()
        };
        assert_eq!(settings.frequency_bin_count(), 256);
    }

    #[test]
    fn numeric_track_ids_are_accepted() {
        let tracks: Vec<Track> = serde_json::from_str(
            r#"[
                {"id": 7, "title": "A", "artist": "X", "locator": "/a.mp3"},
                {"id": 12.0, "title": "B", "artist": "X", "locator": "/b.mp3"},
                {"id": "c-3", "title": "C", "artist": "X", "locator": "/c.mp3"}
            ]"#,
        )
        .unwrap();

        assert_eq!(tracks[0].id, TrackId::from("7"));
        assert_eq!(tracks[1].id, TrackId::from("12"));
        assert_eq!(tracks[2].id, TrackId::from("c-3"));

        let json = serde_json::to_value(&tracks[0]).unwrap();
        assert_eq!(json["id"], "7");
    }

    #[test]
    fn non_scalar_track_id_is_rejected() {
        let result: std::result::Result<Track, _> = serde_json::from_str(
            r#"{"id": true, "title": "A", "artist": "X", "locator": "/a.mp3"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn track_id_serializes_as_plain_string() {
        let track = Track::new("t1", "Song", "Artist", "/music/t1.mp3");
        let json = serde_json::to_string(&track).unwrap();
        assert!(json.contains(r#""id":"t1""#));
    }
}
