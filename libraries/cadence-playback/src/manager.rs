//! Playback manager - core orchestration
//!
//! Owns the transport status, progress, seeking and repeat flags, reacts to
//! endpoint events and user intents, and drives the audio engine.
//!
//! Starting playback waits on the host, so it is split in two: intents that
//! start playback return a [`PlayRequest`], the platform awaits its future
//! and reports the outcome through [`PlaybackManager::finish_play`]. Requests
//! superseded in the meantime (pause, next, another play) are ignored when
//! they complete.

use crate::{
    analysis::{AnalysisGraph, FrequencyTap},
    engine::{AudioEngine, EngineEvent, EngineFuture, MediaEndpoint},
    error::{PlaybackError, Result},
    events::PlaybackEvent,
    navigation::{Navigator, Playlist},
    time::{clamp_percent, format_time, is_known_duration, progress_percent, round_tenth},
    types::{Direction, PlaybackConfig, PlaybackSnapshot, PlayerStatus, Track, TrackId},
};
use std::fmt;

/// The session-wide singletons: one media endpoint and its analysis graph
pub struct SessionContext<M: MediaEndpoint> {
    pub endpoint: M,
    pub analysis: AnalysisGraph,
}

impl<M: MediaEndpoint> SessionContext<M> {
    pub fn new(endpoint: M, config: &PlaybackConfig) -> Self {
        Self {
            endpoint,
            analysis: AnalysisGraph::new(config.analyser.clone()),
        }
    }
}

/// Identity of one play request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayTicket {
    request: u64,
    load_generation: u64,
}

/// A started play request
///
/// The future resumes the output context and starts the endpoint; it does
/// not borrow the manager.
pub struct PlayRequest {
    ticket: PlayTicket,
    future: EngineFuture,
}

impl PlayRequest {
    pub fn ticket(&self) -> PlayTicket {
        self.ticket
    }

    pub fn into_parts(self) -> (PlayTicket, EngineFuture) {
        (self.ticket, self.future)
    }
}

impl fmt::Debug for PlayRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayRequest")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

/// Central playback management
pub struct PlaybackManager<M: MediaEndpoint> {
    // State
    status: PlayerStatus,
    navigator: Navigator,

    // Session singletons
    engine: AudioEngine<M>,
    analysis: AnalysisGraph,

    // Position
    elapsed: f64,
    duration: f64,
    progress: f64,
    seeking: bool,

    // Settings
    repeat: bool,
    visualizer: bool,

    // Set by `Ended`, consumed by the finish reaction
    just_finished: bool,

    // Play request awaiting its outcome
    pending_play: Option<PlayTicket>,
    request_counter: u64,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,
}

impl<M: MediaEndpoint> PlaybackManager<M> {
    /// Create a manager and bind the first track of the active view
    pub fn new(config: PlaybackConfig, playlist: Playlist, context: SessionContext<M>) -> Result<Self> {
        config.validate()?;

        let mut navigator = Navigator::new(playlist, config.navigation);
        if config.shuffle {
            navigator.set_shuffle(true)?;
        }

        let mut engine = AudioEngine::new(context.endpoint, config.volume);
        engine.set_looping(config.repeat);

        let mut manager = Self {
            status: PlayerStatus::Idle,
            navigator,
            engine,
            analysis: context.analysis,
            elapsed: 0.0,
            duration: 0.0,
            progress: 0.0,
            seeking: false,
            repeat: config.repeat,
            visualizer: config.visualizer,
            just_finished: false,
            pending_play: None,
            request_counter: 0,
            pending_events: Vec::new(),
        };
        manager.load_current(None);
        Ok(manager)
    }

    // ===== Endpoint Events =====

    /// React to an event from the media endpoint
    ///
    /// Returns a play request when the event leads to new playback (end of
    /// track with autoplay of the next one, or a repeat restart).
    pub fn handle_event(&mut self, event: EngineEvent) -> Option<PlayRequest> {
        match event {
            EngineEvent::TimeUpdate { current_time } => {
                self.on_time_update(current_time);
                None
            }
            EngineEvent::DataLoaded { duration } => {
                self.on_data_loaded(duration);
                None
            }
            EngineEvent::Ended => {
                self.on_ended();
                self.react_to_finish()
            }
        }
    }

    fn on_time_update(&mut self, current_time: f64) {
        let current_time = if current_time.is_finite() {
            current_time.max(0.0)
        } else {
            0.0
        };
        self.elapsed = current_time;

        // A drag in progress owns the progress value
        if !self.seeking {
            self.progress = progress_percent(current_time, self.engine.duration());
        }

        tracing::trace!(current_time, progress = self.progress, "Time update");
        self.emit_position_update();
    }

    fn on_data_loaded(&mut self, duration: f64) {
        self.duration = if is_known_duration(duration) {
            duration
        } else {
            0.0
        };
        self.elapsed = self.engine.current_time().max(0.0);

        if self.status == PlayerStatus::Idle {
            self.set_status(PlayerStatus::Ready);
        }

        let endpoint = self.engine.endpoint();
        if !self.analysis.is_settled_for(endpoint.id()) {
            // Failure is logged by the graph; playback continues without it
            if let Err(err) = self.analysis.ensure(endpoint) {
                if err.disables_visualizer() {
                    self.emit_visualizer_changed();
                } else {
                    self.emit_error(&err);
                }
            }
        }

        tracing::debug!(duration = self.duration, "Media data loaded");
        self.emit_position_update();
    }

    fn on_ended(&mut self) {
        self.just_finished = true;
        self.pending_play = None;
        if self.status == PlayerStatus::Playing {
            self.set_status(PlayerStatus::Paused);
        }

        let track_id = self.navigator.current().id.clone();
        tracing::debug!(track = %track_id, repeat = self.repeat, "Track finished");
        self.pending_events
            .push(PlaybackEvent::TrackFinished { track_id });
    }

    /// Second half of `Ended`: repeat or move on, then clear the flag
    fn react_to_finish(&mut self) -> Option<PlayRequest> {
        if !self.just_finished {
            return None;
        }

        let request = if self.repeat {
            self.engine.restart();
            self.elapsed = 0.0;
            if !self.seeking {
                self.progress = 0.0;
            }
            self.emit_position_update();
            Some(self.request_play())
        } else {
            match self.advance(Direction::Forward) {
                Ok(request) => Some(request),
                Err(err) => {
                    tracing::warn!(error = %err, "Could not advance after track end");
                    self.emit_error(&err);
                    None
                }
            }
        };

        self.just_finished = false;
        request
    }

    // ===== Playback Control =====

    /// Start playback unless already playing or requested
    pub fn play(&mut self) -> Option<PlayRequest> {
        if self.status == PlayerStatus::Playing || self.pending_play.is_some() {
            return None;
        }
        Some(self.request_play())
    }

    /// Stop playback; cancels a pending play request
    pub fn pause(&mut self) {
        if self.pending_play.take().is_some() {
            tracing::debug!("Cancelled pending play request");
        }
        self.engine.pause();
        if self.status == PlayerStatus::Playing {
            self.set_status(PlayerStatus::Paused);
        }
    }

    /// Play when stopped, pause when playing or about to play
    pub fn toggle_play(&mut self) -> Option<PlayRequest> {
        if self.status == PlayerStatus::Playing || self.pending_play.is_some() {
            self.pause();
            None
        } else {
            self.play()
        }
    }

    /// Apply the outcome of a play request
    ///
    /// Outcomes of superseded requests are dropped. A refusal leaves the
    /// status unchanged and is returned so the caller can prompt for a
    /// user gesture.
    pub fn finish_play(&mut self, ticket: PlayTicket, result: Result<()>) -> Result<()> {
        if self.pending_play != Some(ticket) || ticket.load_generation != self.engine.generation() {
            tracing::debug!(?ticket, "Ignoring outcome of superseded play request");
            // A cancelled request that started anyway must not keep sounding
            if result.is_ok() && self.pending_play.is_none() && !self.is_playing() {
                self.engine.pause();
            }
            return Ok(());
        }
        self.pending_play = None;

        match result {
            Ok(()) => {
                self.set_status(PlayerStatus::Playing);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, status = self.status.as_str(), "Playback refused");
                self.emit_error(&err);
                Err(err)
            }
        }
    }

    /// Await a play request and apply its outcome
    ///
    /// Convenience for hosts that own the manager exclusively; shared hosts
    /// split the request with [`PlayRequest::into_parts`] instead.
    pub async fn complete(&mut self, request: PlayRequest) -> Result<()> {
        let (ticket, future) = request.into_parts();
        let result = future.await;
        self.finish_play(ticket, result)
    }

    fn request_play(&mut self) -> PlayRequest {
        self.request_counter += 1;
        let ticket = PlayTicket {
            request: self.request_counter,
            load_generation: self.engine.generation(),
        };
        self.pending_play = Some(ticket);

        tracing::debug!(?ticket, track = %self.navigator.current().id, "Requesting playback");
        let future = self.engine.play(self.analysis.handle());
        PlayRequest { ticket, future }
    }

    // ===== Navigation =====

    /// Skip to the next track and start it
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<PlayRequest> {
        self.advance(Direction::Forward)
    }

    /// Go to the previous track and start it
    pub fn prev(&mut self) -> Result<PlayRequest> {
        self.advance(Direction::Backward)
    }

    /// Move through the active view and autoplay the new track
    pub fn advance(&mut self, direction: Direction) -> Result<PlayRequest> {
        let previous = self.navigator.current().id.clone();
        self.navigator.advance(direction)?;
        self.load_current(Some(previous));
        Ok(self.request_play())
    }

    /// Bind the navigator's current track to the endpoint
    fn load_current(&mut self, previous: Option<TrackId>) {
        self.pending_play = None;

        let track = self.navigator.current().clone();
        self.engine.load(&track);

        self.elapsed = 0.0;
        self.duration = 0.0;
        if !self.seeking {
            self.progress = 0.0;
        }
        self.set_status(PlayerStatus::Idle);

        self.pending_events.push(PlaybackEvent::TrackChanged {
            track_id: track.id,
            previous_track_id: previous,
        });
        self.emit_position_update();
    }

    // ===== Seek =====

    /// User grabbed the progress bar
    pub fn seek_start(&mut self) {
        self.seeking = true;
    }

    /// User is dragging; only the displayed progress moves
    pub fn seek_drag(&mut self, percent: f64) {
        self.progress = round_tenth(clamp_percent(percent));
        self.emit_position_update();
    }

    /// User released the progress bar at `percent`
    pub fn seek_end(&mut self, percent: f64) {
        let percent = clamp_percent(percent);
        match self.engine.seek(percent) {
            Some(time) => {
                self.elapsed = time;
                self.progress = round_tenth(percent);
            }
            None => self.progress = 0.0,
        }
        self.seeking = false;
        self.emit_position_update();
    }

    // ===== Volume =====

    /// Set volume (clamped into 0.0-1.0); returns the applied level
    pub fn set_volume(&mut self, level: f64) -> f64 {
        let applied = self.engine.set_volume(level);
        self.pending_events
            .push(PlaybackEvent::VolumeChanged { level: applied });
        applied
    }

    pub fn volume(&self) -> f64 {
        self.engine.volume()
    }

    // ===== Shuffle, Repeat & Visualizer =====

    /// Flip repeat; the endpoint loops natively while it is on
    pub fn toggle_repeat(&mut self) -> bool {
        self.repeat = !self.repeat;
        self.engine.set_looping(self.repeat);
        self.pending_events.push(PlaybackEvent::RepeatChanged {
            enabled: self.repeat,
        });
        self.repeat
    }

    /// Flip shuffle without changing the current track
    pub fn toggle_shuffle(&mut self) -> Result<bool> {
        let enabled = !self.navigator.is_shuffled();
        self.navigator.set_shuffle(enabled)?;
        tracing::debug!(enabled, index = self.navigator.current_index(), "Shuffle toggled");
        self.pending_events
            .push(PlaybackEvent::ShuffleChanged { enabled });
        Ok(enabled)
    }

    /// Flip the visualizer preference
    pub fn toggle_visualizer(&mut self) -> bool {
        self.visualizer = !self.visualizer;
        self.emit_visualizer_changed();
        self.visualizer
    }

    /// Spectrum read handle while the visualizer is on and a graph exists
    pub fn frequency_tap(&self) -> Option<FrequencyTap> {
        if !self.visualizer {
            return None;
        }
        self.analysis.handle().map(|graph| graph.frequency_tap())
    }

    // ===== State Queries =====

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlayerStatus::Playing
    }

    pub fn is_play_pending(&self) -> bool {
        self.pending_play.is_some()
    }

    pub fn is_seeking(&self) -> bool {
        self.seeking
    }

    pub fn current_track(&self) -> &Track {
        self.navigator.current()
    }

    /// Index into the active view
    pub fn current_index(&self) -> usize {
        self.navigator.current_index()
    }

    pub fn progress_percent(&self) -> f64 {
        self.progress
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Total duration in seconds, 0 while unknown
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn shuffle(&self) -> bool {
        self.navigator.is_shuffled()
    }

    /// Visualizer preference, reported off when the host cannot analyse
    pub fn visualizer_enabled(&self) -> bool {
        self.visualizer && self.visualizer_available()
    }

    pub fn visualizer_available(&self) -> bool {
        !self.analysis.is_unavailable()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn analysis(&self) -> &AnalysisGraph {
        &self.analysis
    }

    pub fn endpoint(&self) -> &M {
        self.engine.endpoint()
    }

    /// Direct endpoint access for platform glue (event wiring, PCM taps)
    ///
    /// Transport changes must go through the manager's intents.
    pub fn endpoint_mut(&mut self) -> &mut M {
        self.engine.endpoint_mut()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            track: self.navigator.current().clone(),
            current_index: self.navigator.current_index(),
            status: self.status,
            is_playing: self.is_playing(),
            play_pending: self.is_play_pending(),
            is_seeking: self.seeking,
            progress_percent: self.progress,
            elapsed_secs: self.elapsed,
            duration_secs: self.duration,
            elapsed: format_time(self.elapsed),
            duration: format_time(self.duration),
            shuffle: self.shuffle(),
            repeat: self.repeat,
            volume: self.volume(),
            visualizer: self.visualizer_enabled(),
            visualizer_available: self.visualizer_available(),
        }
    }

    // ===== Events =====

    /// Drain all pending events
    ///
    /// The UI should call this after every intent and endpoint event.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    fn set_status(&mut self, status: PlayerStatus) {
        if self.status != status {
            tracing::debug!(from = self.status.as_str(), to = status.as_str(), "Status changed");
            self.status = status;
            self.pending_events
                .push(PlaybackEvent::StateChanged { status });
        }
    }

    fn emit_position_update(&mut self) {
        self.pending_events.push(PlaybackEvent::PositionUpdate {
            elapsed_secs: self.elapsed,
            duration_secs: self.duration,
            progress_percent: self.progress,
        });
    }

    fn emit_visualizer_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::VisualizerChanged {
            enabled: self.visualizer_enabled(),
            available: self.visualizer_available(),
        });
    }

    fn emit_error(&mut self, err: &PlaybackError) {
        self.pending_events.push(PlaybackEvent::Error {
            message: err.to_string(),
            retryable: err.is_retryable(),
        });
    }
}
