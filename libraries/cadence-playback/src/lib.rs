//! Cadence Player - Playback Core
//!
//! Playback state machine, playlist navigation and audio analysis for the
//! Cadence browser player.
//!
//! This crate provides:
//! - Transport state machine (idle, ready, playing, paused)
//! - Progress tracking with a seek lock for drag gestures
//! - Next/previous navigation with wrap-around
//! - Shuffle that keeps the current track at the head of the shuffled view
//! - Repeat of the current track
//! - Volume clamped to 0.0-1.0
//! - A single analysis graph per session feeding the spectrum visualizer
//!
//! # Architecture
//!
//! `cadence-playback` knows nothing about the DOM. Everything that makes sound
//! sits behind [`MediaEndpoint`]; the browser implementation lives in the
//! `wasm` module behind the `wasm` feature. Starting playback waits on the
//! host, so intents that start playback hand back a [`PlayRequest`] whose
//! future the platform drives.
//!
//! # Example: Basic Playback
//!
//! ```rust
//! use cadence_playback::{
//!     EndpointId, EngineEvent, EngineFuture, MediaEndpoint, PlaybackConfig,
//!     PlaybackManager, Playlist, SessionContext, Track,
//! };
//! use futures::future::{self, FutureExt};
//!
//! struct SilentEndpoint {
//!     id: EndpointId,
//!     time: f64,
//! }
//!
//! impl MediaEndpoint for SilentEndpoint {
//!     fn id(&self) -> EndpointId { self.id }
//!     fn set_source(&mut self, _locator: &str) { self.time = 0.0; }
//!     fn play(&mut self) -> EngineFuture { future::ready(Ok(())).boxed_local() }
//!     fn pause(&mut self) {}
//!     fn current_time(&self) -> f64 { self.time }
//!     fn set_current_time(&mut self, seconds: f64) { self.time = seconds; }
//!     fn duration(&self) -> f64 { 180.0 }
//!     fn set_volume(&mut self, _level: f64) {}
//! }
//!
//! let playlist = Playlist::new(vec![
//!     Track::new("1", "First", "Artist", "/music/1.mp3"),
//!     Track::new("2", "Second", "Artist", "/music/2.mp3"),
//! ])?;
//! let config = PlaybackConfig::default();
//! let endpoint = SilentEndpoint { id: EndpointId::next(), time: 0.0 };
//! let context = SessionContext::new(endpoint, &config);
//! let mut manager = PlaybackManager::new(config, playlist, context)?;
//!
//! manager.handle_event(EngineEvent::DataLoaded { duration: 180.0 });
//! if let Some(request) = manager.toggle_play() {
//!     futures::executor::block_on(manager.complete(request))?;
//! }
//! assert!(manager.is_playing());
//!
//! manager.handle_event(EngineEvent::TimeUpdate { current_time: 45.0 });
//! assert_eq!(manager.snapshot().elapsed, "0:45");
//! # Ok::<(), cadence_playback::PlaybackError>(())
//! ```
//!
//! # Example: Shuffle and Repeat
//!
//! ```rust
//! use cadence_playback::{reshuffle_with, Track, TrackId};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let tracks: Vec<Track> = (0..5)
//!     .map(|i| Track::new(i.to_string(), "Song", "Artist", format!("/music/{}.mp3", i)))
//!     .collect();
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let shuffled = reshuffle_with(&tracks, &TrackId::from("3"), &mut rng)?;
//! assert_eq!(shuffled[0].id.as_str(), "3");
//! assert_eq!(shuffled.len(), tracks.len());
//! # Ok::<(), cadence_playback::PlaybackError>(())
//! ```

mod analysis;
mod engine;
mod error;
mod events;
mod manager;
mod navigation;
mod shuffle;
mod spectrum;
mod time;
pub mod types;
mod volume;

#[cfg(feature = "wasm")]
pub mod wasm;

// Public exports
pub use analysis::{AnalysisGraph, FrequencyTap, GraphHandle, RoutingGraph};
pub use engine::{AudioEngine, EndpointId, EngineEvent, EngineFuture, MediaEndpoint};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use manager::{PlayRequest, PlayTicket, PlaybackManager, SessionContext};
pub use navigation::{step_index, Navigator, Playlist};
pub use shuffle::{reshuffle, reshuffle_with};
pub use spectrum::SpectrumAnalyser;
pub use time::{format_time, progress_percent};
pub use types::{
    AnalyserSettings, Direction, NavigationMode, PlaybackConfig, PlaybackSnapshot, PlayerStatus,
    Track, TrackId,
};
pub use volume::Volume;
