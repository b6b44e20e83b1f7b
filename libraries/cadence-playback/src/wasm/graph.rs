//! Web Audio routing graph: element source → analyser → destination

use super::{refusal, routing, unsupported};
use crate::analysis::RoutingGraph;
use crate::engine::EngineFuture;
use crate::error::Result;
use crate::types::AnalyserSettings;
use futures::future::FutureExt;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AnalyserNode, AudioContext, HtmlMediaElement, MediaElementAudioSourceNode};

/// The session's capture graph
///
/// An element can be captured by one `MediaElementAudioSourceNode` per
/// lifetime, so this is built once per element and kept for the session.
pub struct WebAudioGraph {
    context: AudioContext,
    // Kept so the route stays connected for as long as the graph lives
    _source: MediaElementAudioSourceNode,
    analyser: AnalyserNode,
}

impl WebAudioGraph {
    pub fn build(element: &HtmlMediaElement, settings: &AnalyserSettings) -> Result<Self> {
        settings.validate()?;

        let context = AudioContext::new().map_err(|e| unsupported(&e))?;
        let source = context
            .create_media_element_source(element)
            .map_err(|e| routing("capture element", &e))?;
        let analyser = context
            .create_analyser()
            .map_err(|e| routing("create analyser", &e))?;

        analyser.set_fft_size(settings.fft_size);
        analyser.set_smoothing_time_constant(settings.smoothing);
        analyser.set_min_decibels(settings.min_decibels);
        analyser.set_max_decibels(settings.max_decibels);

        source
            .connect_with_audio_node(&analyser)
            .map_err(|e| routing("connect source", &e))?;
        analyser
            .connect_with_audio_node(&context.destination())
            .map_err(|e| routing("connect destination", &e))?;

        Ok(Self {
            context,
            _source: source,
            analyser,
        })
    }

    pub fn context(&self) -> &AudioContext {
        &self.context
    }
}

impl RoutingGraph for WebAudioGraph {
    fn resume(&self) -> EngineFuture {
        let context = self.context.clone();
        async move {
            let promise = context.resume().map_err(|e| refusal(&e))?;
            JsFuture::from(promise).await.map_err(|e| refusal(&e))?;
            Ok(())
        }
        .boxed_local()
    }

    fn frequency_bin_count(&self) -> usize {
        self.analyser.frequency_bin_count() as usize
    }

    fn byte_frequency_data(&self, out: &mut [u8]) {
        self.analyser.get_byte_frequency_data(out);
    }
}
