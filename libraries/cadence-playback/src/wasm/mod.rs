//! WASM bindings for cadence-playback
//!
//! Browser implementation of the media endpoint (an `<audio>` element routed
//! through Web Audio) and a JavaScript-facing player that wires element
//! events into the playback manager.

mod endpoint;
mod graph;
mod player;

pub use endpoint::WebMediaEndpoint;
pub use graph::WebAudioGraph;
pub use player::WasmPlayer;

use crate::PlaybackError;
use wasm_bindgen::JsValue;

/// `name` and `message` of a thrown DOM exception, when present
fn describe(value: &JsValue) -> (String, String) {
    let field = |key: &str| {
        js_sys::Reflect::get(value, &JsValue::from_str(key))
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_default()
    };
    let name = field("name");
    let message = field("message");
    if name.is_empty() && message.is_empty() {
        (String::new(), format!("{:?}", value))
    } else {
        (name, message)
    }
}

fn unsupported(value: &JsValue) -> PlaybackError {
    let (name, message) = describe(value);
    PlaybackError::UnsupportedEnvironment(format!("{} {}", name, message).trim().to_string())
}

fn routing(step: &str, value: &JsValue) -> PlaybackError {
    let (name, message) = describe(value);
    PlaybackError::Routing(format!("{}: {} {}", step, name, message).trim().to_string())
}

/// Map a rejected `play()` / `resume()` promise to a playback error
fn refusal(value: &JsValue) -> PlaybackError {
    let (name, message) = describe(value);
    match name.as_str() {
        "NotAllowedError" => PlaybackError::Blocked(message),
        _ => {
            tracing::debug!(name = %name, message = %message, "Media not ready");
            PlaybackError::NotReady
        }
    }
}

fn to_js_error(err: PlaybackError) -> JsValue {
    JsValue::from_str(&err.to_string())
}
