//! Audio engine over a single media endpoint
//!
//! The endpoint is whatever actually produces sound: an `<audio>` element in
//! the browser, a decoder/output pair natively. The engine adds the clamping
//! rules on top and tracks which track is bound.

use crate::analysis::{GraphHandle, RoutingGraph};
use crate::error::{PlaybackError, Result};
use crate::time::{clamp_percent, is_known_duration};
use crate::types::{AnalyserSettings, Track, TrackId};
use crate::volume::Volume;
use futures::future::{FutureExt, LocalBoxFuture};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Future returned by operations that wait on the host (resume, play)
pub type EngineFuture = LocalBoxFuture<'static, Result<()>>;

/// Identity of a media endpoint for the lifetime of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointId(u64);

impl EndpointId {
    /// Allocate a process-unique id
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Events emitted by a media endpoint
///
/// `TimeUpdate` frequency is chosen by the host; consumers must not assume
/// a fixed period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    /// Playback position moved
    TimeUpdate { current_time: f64 },

    /// Media data for the bound locator is available
    DataLoaded { duration: f64 },

    /// Playback reached the end of the media
    Ended,
}

/// Platform media endpoint
///
/// Implementors wrap the one playable element of a session. Times are in
/// seconds; `duration` is NaN while unknown.
pub trait MediaEndpoint {
    /// Stable identity of this endpoint
    fn id(&self) -> EndpointId;

    /// Bind a new media locator
    fn set_source(&mut self, locator: &str);

    /// Start playback
    ///
    /// The returned future must not start output before it is first polled,
    /// so callers can sequence it after an output-context resume. It fails
    /// with [`PlaybackError::NotReady`] or [`PlaybackError::Blocked`].
    fn play(&mut self) -> EngineFuture;

    /// Stop playback immediately
    fn pause(&mut self);

    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64);

    fn duration(&self) -> f64;

    /// Apply a linear volume in 0.0-1.0
    fn set_volume(&mut self, level: f64);

    /// Restart automatically at the end of the media
    fn set_looping(&mut self, _looping: bool) {}

    /// Build the capture → analyser → output route for this endpoint
    ///
    /// Hosts without an audio graph keep the default.
    fn create_graph(&self, _settings: &AnalyserSettings) -> Result<Rc<dyn RoutingGraph>> {
        Err(PlaybackError::UnsupportedEnvironment(
            "endpoint has no audio graph".to_string(),
        ))
    }
}

/// Transport over one media endpoint
pub struct AudioEngine<M: MediaEndpoint> {
    endpoint: M,
    volume: Volume,
    loaded: Option<TrackId>,
    generation: u64,
}

impl<M: MediaEndpoint> AudioEngine<M> {
    pub fn new(mut endpoint: M, volume: f64) -> Self {
        let volume = Volume::new(volume);
        endpoint.set_volume(volume.level());
        Self {
            endpoint,
            volume,
            loaded: None,
            generation: 0,
        }
    }

    /// Bind `track` to the endpoint
    pub fn load(&mut self, track: &Track) {
        self.endpoint.set_source(&track.locator);
        self.loaded = Some(track.id.clone());
        self.generation += 1;
        tracing::debug!(track = %track.id, generation = self.generation, "Loaded track");
    }

    /// Resume the output context (if any), then start playback
    pub fn play(&mut self, output: Option<&GraphHandle>) -> EngineFuture {
        let resume = output.map(|graph| graph.resume());
        let start = self.endpoint.play();
        async move {
            if let Some(resume) = resume {
                resume.await?;
            }
            start.await
        }
        .boxed_local()
    }

    pub fn pause(&mut self) {
        self.endpoint.pause();
    }

    /// Seek to `percent` of the duration
    ///
    /// Out-of-range targets are clamped. Returns the applied time, or `None`
    /// when the duration is unknown and nothing was done.
    pub fn seek(&mut self, percent: f64) -> Option<f64> {
        let duration = self.endpoint.duration();
        if !is_known_duration(duration) {
            tracing::debug!(percent, duration, "Ignoring seek without a known duration");
            return None;
        }

        let clamped = clamp_percent(percent);
        if clamped != percent {
            tracing::debug!(percent, clamped, "Seek target clamped");
        }
        let time = (clamped / 100.0 * duration).clamp(0.0, duration);
        self.endpoint.set_current_time(time);
        Some(time)
    }

    /// Rewind to the start of the bound media
    pub fn restart(&mut self) {
        self.endpoint.set_current_time(0.0);
    }

    /// Set volume, clamped into 0.0-1.0; returns the applied level
    pub fn set_volume(&mut self, level: f64) -> f64 {
        self.volume.set_level(level);
        self.endpoint.set_volume(self.volume.level());
        self.volume.level()
    }

    pub fn volume(&self) -> f64 {
        self.volume.level()
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.endpoint.set_looping(looping);
    }

    pub fn current_time(&self) -> f64 {
        self.endpoint.current_time()
    }

    pub fn duration(&self) -> f64 {
        self.endpoint.duration()
    }

    /// Track currently bound to the endpoint
    pub fn loaded_track(&self) -> Option<&TrackId> {
        self.loaded.as_ref()
    }

    /// Incremented on every `load`
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn endpoint(&self) -> &M {
        &self.endpoint
    }

    pub fn endpoint_mut(&mut self) -> &mut M {
        &mut self.endpoint
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory endpoint for unit tests

    use super::*;
    use futures::future;
    use std::cell::RefCell;

    #[derive(Debug, Default)]
    pub struct EndpointLog {
        pub sources: Vec<String>,
        pub plays: usize,
        pub pauses: usize,
        pub seeks: Vec<f64>,
        pub volumes: Vec<f64>,
        pub looping: bool,
        pub graphs_built: usize,
    }

    pub struct DummyEndpoint {
        id: EndpointId,
        pub log: Rc<RefCell<EndpointLog>>,
        pub current_time: f64,
        pub duration: f64,
        pub refuse_play: bool,
        pub graph: bool,
    }

    impl DummyEndpoint {
        pub fn new() -> Self {
            Self {
                id: EndpointId::next(),
                log: Rc::new(RefCell::new(EndpointLog::default())),
                current_time: 0.0,
                duration: f64::NAN,
                refuse_play: false,
                graph: false,
            }
        }
    }

    impl Default for DummyEndpoint {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MediaEndpoint for DummyEndpoint {
        fn id(&self) -> EndpointId {
            self.id
        }

        fn set_source(&mut self, locator: &str) {
            self.log.borrow_mut().sources.push(locator.to_string());
            self.current_time = 0.0;
            self.duration = f64::NAN;
        }

        fn play(&mut self) -> EngineFuture {
            self.log.borrow_mut().plays += 1;
            if self.refuse_play {
                future::ready(Err(PlaybackError::Blocked("NotAllowedError".into()))).boxed_local()
            } else {
                future::ready(Ok(())).boxed_local()
            }
        }

        fn pause(&mut self) {
            self.log.borrow_mut().pauses += 1;
        }

        fn current_time(&self) -> f64 {
            self.current_time
        }

        fn set_current_time(&mut self, seconds: f64) {
            self.log.borrow_mut().seeks.push(seconds);
            self.current_time = seconds;
        }

        fn duration(&self) -> f64 {
            self.duration
        }

        fn set_volume(&mut self, level: f64) {
            self.log.borrow_mut().volumes.push(level);
        }

        fn set_looping(&mut self, looping: bool) {
            self.log.borrow_mut().looping = looping;
        }

        fn create_graph(&self, settings: &AnalyserSettings) -> Result<Rc<dyn RoutingGraph>> {
            if !self.graph {
                return Err(PlaybackError::UnsupportedEnvironment("no AudioContext".into()));
            }
            self.log.borrow_mut().graphs_built += 1;
            let analyser = crate::spectrum::SpectrumAnalyser::new(settings.clone(), 44100)?;
            Ok(Rc::new(analyser))
        }
    }
}
