//! `<audio>` element endpoint

use super::graph::WebAudioGraph;
use super::{refusal, unsupported};
use crate::analysis::RoutingGraph;
use crate::engine::{EndpointId, EngineFuture, MediaEndpoint};
use crate::error::Result;
use crate::types::AnalyserSettings;
use futures::future::FutureExt;
use std::rc::Rc;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlAudioElement;

/// One detached `<audio>` element, reused for every track of the session
pub struct WebMediaEndpoint {
    id: EndpointId,
    element: HtmlAudioElement,
}

impl WebMediaEndpoint {
    pub fn new() -> Result<Self> {
        let element = HtmlAudioElement::new().map_err(|e| unsupported(&e))?;
        // Cross-origin media must be CORS-enabled to be readable by the analyser
        element.set_cross_origin(Some("anonymous"));
        element.set_preload("auto");

        Ok(Self {
            id: EndpointId::next(),
            element,
        })
    }

    pub fn element(&self) -> &HtmlAudioElement {
        &self.element
    }
}

impl MediaEndpoint for WebMediaEndpoint {
    fn id(&self) -> EndpointId {
        self.id
    }

    fn set_source(&mut self, locator: &str) {
        self.element.set_src(locator);
    }

    fn play(&mut self) -> EngineFuture {
        let element = self.element.clone();
        async move {
            let promise = element.play().map_err(|e| refusal(&e))?;
            JsFuture::from(promise).await.map_err(|e| refusal(&e))?;
            Ok(())
        }
        .boxed_local()
    }

    fn pause(&mut self) {
        if let Err(e) = self.element.pause() {
            tracing::warn!(error = ?e, "Failed to pause media element");
        }
    }

    fn current_time(&self) -> f64 {
        self.element.current_time()
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.element.set_current_time(seconds);
    }

    fn duration(&self) -> f64 {
        self.element.duration()
    }

    fn set_volume(&mut self, level: f64) {
        self.element.set_volume(level);
    }

    fn set_looping(&mut self, looping: bool) {
        self.element.set_loop(looping);
    }

    fn create_graph(&self, settings: &AnalyserSettings) -> Result<Rc<dyn RoutingGraph>> {
        let graph = WebAudioGraph::build(&self.element, settings)?;
        Ok(Rc::new(graph))
    }
}
