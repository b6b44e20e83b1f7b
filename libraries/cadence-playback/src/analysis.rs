//! Analysis graph
//!
//! Routes the endpoint's signal through an analyser node on its way to the
//! output, so the visualizer can read a spectrum without touching the audible
//! path. A media endpoint can only be captured once per lifetime, so the graph
//! is built at most once per endpoint identity and reused for every track.

use crate::engine::{EndpointId, EngineFuture, MediaEndpoint};
use crate::error::{PlaybackError, Result};
use crate::types::AnalyserSettings;
use std::fmt;
use std::rc::Rc;

/// A built capture → analyser → output route
pub trait RoutingGraph {
    /// Resume the output context
    ///
    /// Browser contexts start suspended until a user gesture.
    fn resume(&self) -> EngineFuture;

    /// Number of bins in one spectrum frame
    fn frequency_bin_count(&self) -> usize;

    /// Copy the current spectrum into `out`, one byte (0-255) per bin
    ///
    /// Writes `min(out.len(), frequency_bin_count())` bins.
    fn byte_frequency_data(&self, out: &mut [u8]);
}

/// Shared handle to the session's routing graph
#[derive(Clone)]
pub struct GraphHandle {
    endpoint: EndpointId,
    graph: Rc<dyn RoutingGraph>,
}

impl GraphHandle {
    /// Endpoint this graph captures
    pub fn endpoint(&self) -> EndpointId {
        self.endpoint
    }

    pub fn resume(&self) -> EngineFuture {
        self.graph.resume()
    }

    /// Whether both handles point at the same constructed graph
    pub fn same_graph(&self, other: &GraphHandle) -> bool {
        Rc::as_ptr(&self.graph) as *const () == Rc::as_ptr(&other.graph) as *const ()
    }

    pub fn frequency_tap(&self) -> FrequencyTap {
        FrequencyTap {
            graph: Rc::clone(&self.graph),
        }
    }
}

impl fmt::Debug for GraphHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphHandle")
            .field("endpoint", &self.endpoint)
            .field("bins", &self.graph.frequency_bin_count())
            .finish()
    }
}

/// Read-only view of the analyser for the visualizer
#[derive(Clone)]
pub struct FrequencyTap {
    graph: Rc<dyn RoutingGraph>,
}

impl FrequencyTap {
    pub fn bin_count(&self) -> usize {
        self.graph.frequency_bin_count()
    }

    /// Snapshot of the current spectrum
    pub fn read(&self) -> Vec<u8> {
        let mut bins = vec![0u8; self.bin_count()];
        self.graph.byte_frequency_data(&mut bins);
        bins
    }

    /// Fill a caller-owned buffer, avoiding allocation per frame
    pub fn read_into(&self, out: &mut [u8]) {
        self.graph.byte_frequency_data(out);
    }
}

impl fmt::Debug for FrequencyTap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrequencyTap")
            .field("bins", &self.bin_count())
            .finish()
    }
}

#[derive(Debug)]
enum GraphSlot {
    Empty,
    Built(GraphHandle),
    Unavailable {
        endpoint: EndpointId,
        reason: PlaybackError,
    },
}

/// Owner of the session's single routing graph
#[derive(Debug)]
pub struct AnalysisGraph {
    settings: AnalyserSettings,
    slot: GraphSlot,
}

impl AnalysisGraph {
    pub fn new(settings: AnalyserSettings) -> Self {
        Self {
            settings,
            slot: GraphSlot::Empty,
        }
    }

    /// Build the graph for `endpoint` unless it already exists
    ///
    /// Repeated calls for the same endpoint return the same handle, and a
    /// failed build is remembered rather than retried.
    pub fn ensure<M: MediaEndpoint + ?Sized>(&mut self, endpoint: &M) -> Result<GraphHandle> {
        let id = endpoint.id();
        match &self.slot {
            GraphSlot::Built(handle) if handle.endpoint == id => return Ok(handle.clone()),
            GraphSlot::Unavailable {
                endpoint: failed,
                reason,
            } if *failed == id => return Err(reason.clone()),
            _ => {}
        }

        let built = self
            .settings
            .validate()
            .and_then(|()| endpoint.create_graph(&self.settings));
        match built {
            Ok(graph) => {
                tracing::debug!(
                    endpoint = id.get(),
                    bins = graph.frequency_bin_count(),
                    "Built analysis graph"
                );
                let handle = GraphHandle {
                    endpoint: id,
                    graph,
                };
                self.slot = GraphSlot::Built(handle.clone());
                Ok(handle)
            }
            Err(reason) => {
                tracing::warn!(
                    endpoint = id.get(),
                    error = %reason,
                    "Analysis graph unavailable, continuing without visualization"
                );
                self.slot = GraphSlot::Unavailable {
                    endpoint: id,
                    reason: reason.clone(),
                };
                Err(reason)
            }
        }
    }

    /// Graph built so far, if any
    pub fn handle(&self) -> Option<&GraphHandle> {
        match &self.slot {
            GraphSlot::Built(handle) => Some(handle),
            _ => None,
        }
    }

    /// Whether `ensure` has already run for `endpoint`
    pub fn is_settled_for(&self, endpoint: EndpointId) -> bool {
        match &self.slot {
            GraphSlot::Empty => false,
            GraphSlot::Built(handle) => handle.endpoint == endpoint,
            GraphSlot::Unavailable { endpoint: failed, .. } => *failed == endpoint,
        }
    }

    /// Whether the last build attempt failed
    pub fn is_unavailable(&self) -> bool {
        matches!(self.slot, GraphSlot::Unavailable { .. })
    }

    pub fn settings(&self) -> &AnalyserSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::DummyEndpoint;

    #[test]
    fn ensure_builds_once_per_endpoint() {
        let mut endpoint = DummyEndpoint::new();
        endpoint.graph = true;
        let mut analysis = AnalysisGraph::new(AnalyserSettings::default());

        let first = analysis.ensure(&endpoint).unwrap();
        let second = analysis.ensure(&endpoint).unwrap();

        assert!(first.same_graph(&second));
        assert_eq!(endpoint.log.borrow().graphs_built, 1);
        assert!(analysis.is_settled_for(endpoint.id()));
    }

    #[test]
    fn new_endpoint_gets_new_graph() {
        let mut first_endpoint = DummyEndpoint::new();
        first_endpoint.graph = true;
        let mut second_endpoint = DummyEndpoint::new();
        second_endpoint.graph = true;
        let mut analysis = AnalysisGraph::new(AnalyserSettings::default());

        let first = analysis.ensure(&first_endpoint).unwrap();
        let second = analysis.ensure(&second_endpoint).unwrap();

        assert!(!first.same_graph(&second));
        assert_eq!(analysis.handle().unwrap().endpoint(), second_endpoint.id());
    }

    #[test]
    fn unsupported_environment_is_remembered() {
        let endpoint = DummyEndpoint::new();
        let mut analysis = AnalysisGraph::new(AnalyserSettings::default());

        let err = analysis.ensure(&endpoint).unwrap_err();
        assert!(matches!(err, PlaybackError::UnsupportedEnvironment(_)));
        assert!(analysis.is_unavailable());
        assert!(analysis.handle().is_none());

        // Second call does not retry the build
        let again = analysis.ensure(&endpoint).unwrap_err();
        assert_eq!(err, again);
        assert_eq!(endpoint.log.borrow().graphs_built, 0);
    }

    #[test]
    fn invalid_settings_never_reach_the_endpoint() {
        let mut endpoint = DummyEndpoint::new();
        endpoint.graph = true;
        let mut analysis = AnalysisGraph::new(AnalyserSettings {
            fft_size: 0,
            ..Default::default()
        });

        let err = analysis.ensure(&endpoint).unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidConfig(_)));
        assert!(analysis.is_unavailable());
        assert!(analysis.is_settled_for(endpoint.id()));
        assert_eq!(endpoint.log.borrow().graphs_built, 0);
    }

    #[test]
    fn tap_reads_full_frame() {
        let mut endpoint = DummyEndpoint::new();
        endpoint.graph = true;
        let mut analysis = AnalysisGraph::new(AnalyserSettings {
            fft_size: 256,
            ..Default::default()
        });

        let tap = analysis.ensure(&endpoint).unwrap().frequency_tap();
        assert_eq!(tap.bin_count(), 128);
        assert_eq!(tap.read().len(), 128);
    }
}
