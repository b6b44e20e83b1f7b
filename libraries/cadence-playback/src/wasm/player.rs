//! JavaScript-facing player
//!
//! Owns the playback manager behind `Rc<RefCell<..>>` so element listeners
//! and pending play requests can reach it. No borrow is held across an
//! await or a call into JavaScript.

use super::endpoint::WebMediaEndpoint;
use super::to_js_error;
use crate::{
    format_time, EngineEvent, PlayRequest, PlaybackConfig, PlaybackManager, Playlist,
    SessionContext, Track,
};
use js_sys::Function;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::Event;

struct Shared {
    manager: RefCell<PlaybackManager<WebMediaEndpoint>>,
    on_event: RefCell<Option<Function>>,
}

type Listener = Closure<dyn FnMut(Event)>;

/// Browser player
#[wasm_bindgen]
pub struct WasmPlayer {
    shared: Rc<Shared>,
    listeners: Vec<(&'static str, Listener)>,
}

#[wasm_bindgen]
impl WasmPlayer {
    /// Create a player over `tracks` (array of `{id, title, artist, locator}`)
    ///
    /// `config` is optional; missing fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(tracks: JsValue, config: JsValue) -> Result<WasmPlayer, JsValue> {
        console_error_panic_hook::set_once();

        let tracks: Vec<Track> = serde_wasm_bindgen::from_value(tracks)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse tracks: {}", e)))?;
        let config: PlaybackConfig = if config.is_undefined() || config.is_null() {
            PlaybackConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Failed to parse config: {}", e)))?
        };

        let playlist = Playlist::new(tracks).map_err(to_js_error)?;
        let endpoint = WebMediaEndpoint::new().map_err(to_js_error)?;
        let context = SessionContext::new(endpoint, &config);
        let manager = PlaybackManager::new(config, playlist, context).map_err(to_js_error)?;

        let shared = Rc::new(Shared {
            manager: RefCell::new(manager),
            on_event: RefCell::new(None),
        });

        let mut player = Self {
            shared,
            listeners: Vec::new(),
        };
        player.listen("timeupdate", |manager| {
            let current_time = manager.endpoint().element().current_time();
            manager.handle_event(EngineEvent::TimeUpdate { current_time })
        })?;
        player.listen("loadeddata", |manager| {
            let duration = manager.endpoint().element().duration();
            manager.handle_event(EngineEvent::DataLoaded { duration })
        })?;
        player.listen("ended", |manager| manager.handle_event(EngineEvent::Ended))?;

        Ok(player)
    }

    // ===== Playback Control =====

    pub fn play(&self) {
        let request = self.shared.manager.borrow_mut().play();
        drive(&self.shared, request);
    }

    pub fn pause(&self) {
        self.shared.manager.borrow_mut().pause();
        dispatch(&self.shared);
    }

    #[wasm_bindgen(js_name = togglePlay)]
    pub fn toggle_play(&self) {
        let request = self.shared.manager.borrow_mut().toggle_play();
        drive(&self.shared, request);
    }

    pub fn next(&self) -> Result<(), JsValue> {
        let request = self.shared.manager.borrow_mut().next().map_err(to_js_error)?;
        drive(&self.shared, Some(request));
        Ok(())
    }

    pub fn prev(&self) -> Result<(), JsValue> {
        let request = self.shared.manager.borrow_mut().prev().map_err(to_js_error)?;
        drive(&self.shared, Some(request));
        Ok(())
    }

    // ===== Seeking =====

    #[wasm_bindgen(js_name = seekStart)]
    pub fn seek_start(&self) {
        self.shared.manager.borrow_mut().seek_start();
    }

    /// Progress bar moved to `percent` (0-100) while held
    #[wasm_bindgen(js_name = seekDrag)]
    pub fn seek_drag(&self, percent: f64) {
        self.shared.manager.borrow_mut().seek_drag(percent);
        dispatch(&self.shared);
    }

    /// Progress bar released at `percent` (0-100)
    #[wasm_bindgen(js_name = seekEnd)]
    pub fn seek_end(&self, percent: f64) {
        self.shared.manager.borrow_mut().seek_end(percent);
        dispatch(&self.shared);
    }

    // ===== Volume & Modes =====

    /// Set volume (0.0-1.0); returns the applied level
    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&self, level: f64) -> f64 {
        let applied = self.shared.manager.borrow_mut().set_volume(level);
        dispatch(&self.shared);
        applied
    }

    #[wasm_bindgen(js_name = toggleShuffle)]
    pub fn toggle_shuffle(&self) -> Result<bool, JsValue> {
        let enabled = self
            .shared
            .manager
            .borrow_mut()
            .toggle_shuffle()
            .map_err(to_js_error)?;
        dispatch(&self.shared);
        Ok(enabled)
    }

    #[wasm_bindgen(js_name = toggleRepeat)]
    pub fn toggle_repeat(&self) -> bool {
        let enabled = self.shared.manager.borrow_mut().toggle_repeat();
        dispatch(&self.shared);
        enabled
    }

    #[wasm_bindgen(js_name = toggleVisualizer)]
    pub fn toggle_visualizer(&self) -> bool {
        let enabled = self.shared.manager.borrow_mut().toggle_visualizer();
        dispatch(&self.shared);
        enabled
    }

    // ===== State Queries =====

    /// Render state as a plain object
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> Result<JsValue, JsValue> {
        let snapshot = self.shared.manager.borrow().snapshot();
        serde_wasm_bindgen::to_value(&snapshot)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Bins per spectrum frame, 0 while the visualizer is off
    #[wasm_bindgen(js_name = frequencyBinCount)]
    pub fn frequency_bin_count(&self) -> usize {
        self.shared
            .manager
            .borrow()
            .frequency_tap()
            .map_or(0, |tap| tap.bin_count())
    }

    /// Fill `out` with the current spectrum; false while the visualizer is off
    #[wasm_bindgen(js_name = frequencyData)]
    pub fn frequency_data(&self, out: &mut [u8]) -> bool {
        match self.shared.manager.borrow().frequency_tap() {
            Some(tap) => {
                tap.read_into(out);
                true
            }
            None => false,
        }
    }

    // ===== Event Listeners =====

    /// Register the event callback; receives one object per playback event
    #[wasm_bindgen(js_name = onEvent)]
    pub fn on_event(&self, callback: Function) {
        *self.shared.on_event.borrow_mut() = Some(callback);
    }
}

impl WasmPlayer {
    fn listen<F>(&mut self, name: &'static str, mut handler: F) -> Result<(), JsValue>
    where
        F: FnMut(&mut PlaybackManager<WebMediaEndpoint>) -> Option<PlayRequest> + 'static,
    {
        let shared = Rc::clone(&self.shared);
        let closure = Closure::wrap(Box::new(move |_event: Event| {
            let request = handler(&mut shared.manager.borrow_mut());
            drive(&shared, request);
        }) as Box<dyn FnMut(Event)>);

        self.shared
            .manager
            .borrow()
            .endpoint()
            .element()
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        self.listeners.push((name, closure));
        Ok(())
    }
}

impl Drop for WasmPlayer {
    fn drop(&mut self) {
        let manager = self.shared.manager.borrow();
        let element = manager.endpoint().element();
        element.pause().ok();
        for (name, closure) in &self.listeners {
            element
                .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
                .ok();
        }
    }
}

/// `M:SS` label for a time in seconds
#[wasm_bindgen(js_name = formatTime)]
pub fn format_time_js(seconds: f64) -> String {
    format_time(seconds)
}

/// Await a play request off the call stack, then publish what changed
fn drive(shared: &Rc<Shared>, request: Option<PlayRequest>) {
    if let Some(request) = request {
        let (ticket, future) = request.into_parts();
        let shared = Rc::clone(shared);
        spawn_local(async move {
            let result = future.await;
            let outcome = shared.manager.borrow_mut().finish_play(ticket, result);
            if let Err(err) = outcome {
                tracing::debug!(error = %err, "Play request refused");
            }
            dispatch(&shared);
        });
    }
    dispatch(shared);
}

/// Hand drained events to the registered callback
fn dispatch(shared: &Shared) {
    let events = shared.manager.borrow_mut().drain_events();
    let callback = shared.on_event.borrow().clone();
    let Some(callback) = callback else {
        return;
    };

    for event in events {
        match serde_wasm_bindgen::to_value(&event) {
            Ok(value) => {
                callback.call1(&JsValue::NULL, &value).ok();
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize playback event"),
        }
    }
}
