use std::sync::{Mutex, MutexGuard};

use careerline_core::source::parse_payload;
use careerline_core::{EngineConfig, InputEvent, LoadTicket, SourceError, TimelineView};
use careerline_protocol::TimelineId;
use wasm_bindgen::prelude::*;

/// Open views by handle. A dropped view leaves an empty slot so later
/// handles stay valid.
#[derive(Debug)]
struct ViewRegistry {
    slots: Vec<Option<TimelineView>>,
}

impl ViewRegistry {
    const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    fn insert(&mut self, view: TimelineView) -> usize {
        self.slots.push(Some(view));
        self.slots.len() - 1
    }

    fn get_mut(&mut self, handle: usize) -> Option<&mut TimelineView> {
        self.slots.get_mut(handle).and_then(Option::as_mut)
    }

    fn remove(&mut self, handle: usize) -> Option<TimelineView> {
        self.slots.get_mut(handle).and_then(Option::take)
    }
}

static VIEWS: Mutex<ViewRegistry> = Mutex::new(ViewRegistry::new());

fn js_err(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

fn views() -> Result<MutexGuard<'static, ViewRegistry>, JsError> {
    VIEWS.lock().map_err(|_| JsError::new("view registry poisoned"))
}

fn with_view<T>(
    handle: usize,
    f: impl FnOnce(&mut TimelineView) -> Result<T, JsError>,
) -> Result<T, JsError> {
    let mut views = views()?;
    let view = views
        .get_mut(handle)
        .ok_or_else(|| JsError::new("invalid view handle"))?;
    f(view)
}

fn parse_ticket(ticket_json: &str) -> Result<LoadTicket, JsError> {
    serde_json::from_str(ticket_json).map_err(js_err)
}

/// Create a view. `config_json` may be omitted for defaults. Returns a handle.
#[wasm_bindgen]
pub fn create_view(config_json: Option<String>, now_ms: f64) -> Result<usize, JsError> {
    let config = match config_json {
        Some(json) => EngineConfig::from_json(json.as_bytes()).map_err(js_err)?,
        None => EngineConfig::default(),
    };
    let view = TimelineView::new(config, now_ms).map_err(js_err)?;
    Ok(views()?.insert(view))
}

/// Discard a view when the host closes its timeline. Its handle becomes
/// invalid; other handles are unaffected.
#[wasm_bindgen]
pub fn drop_view(handle: usize) -> Result<(), JsError> {
    views()?
        .remove(handle)
        .map(drop)
        .ok_or_else(|| JsError::new("invalid view handle"))
}

/// Start loading a timeline. Returns the load ticket as JSON; pass it back
/// to [`finish_load`] or [`fail_load`] when the fetch settles.
#[wasm_bindgen]
pub fn begin_load(handle: usize, timeline_id: u64) -> Result<String, JsError> {
    with_view(handle, |view| {
        let ticket = view.open(TimelineId(timeline_id));
        serde_json::to_string(&ticket).map_err(js_err)
    })
}

/// Deliver fetched bytes: a timeline document or a bare node array.
///
/// Returns `false` when the ticket was superseded or the payload failed to
/// parse; the latter shows up in the load state.
#[wasm_bindgen]
pub fn finish_load(
    handle: usize,
    ticket_json: &str,
    data: &[u8],
    now_ms: f64,
) -> Result<bool, JsError> {
    let ticket = parse_ticket(ticket_json)?;
    let result = parse_payload(data).map(careerline_core::source::Payload::into_events);
    with_view(handle, |view| Ok(view.finish_load(ticket, result, now_ms)))
}

/// Report a failed fetch for `ticket_json`.
#[wasm_bindgen]
pub fn fail_load(
    handle: usize,
    ticket_json: &str,
    message: &str,
    now_ms: f64,
) -> Result<(), JsError> {
    let ticket = parse_ticket(ticket_json)?;
    with_view(handle, |view| {
        view.finish_load(ticket, Err(SourceError::Remote(message.to_owned())), now_ms);
        Ok(())
    })
}

/// Apply a JSON-encoded input event. Returns whether the viewport changed.
#[wasm_bindgen]
pub fn handle_input(handle: usize, input_json: &str) -> Result<bool, JsError> {
    let input: InputEvent = serde_json::from_str(input_json).map_err(js_err)?;
    with_view(handle, |view| Ok(view.handle(input)))
}

/// Compute the layout for the current viewport, as JSON.
#[wasm_bindgen]
pub fn compute_layout(handle: usize, now_ms: f64) -> Result<String, JsError> {
    with_view(handle, |view| {
        serde_json::to_string(&view.layout(now_ms)).map_err(js_err)
    })
}

/// Render the current viewport to draw commands, as JSON.
#[wasm_bindgen]
pub fn render(handle: usize, now_ms: f64) -> Result<String, JsError> {
    with_view(handle, |view| {
        serde_json::to_string(&view.render(now_ms)).map_err(js_err)
    })
}

/// Current viewport state, as JSON.
#[wasm_bindgen]
pub fn viewport_state(handle: usize) -> Result<String, JsError> {
    with_view(handle, |view| {
        serde_json::to_string(view.viewport()).map_err(js_err)
    })
}

/// Current load state, as JSON.
#[wasm_bindgen]
pub fn load_state(handle: usize) -> Result<String, JsError> {
    with_view(handle, |view| {
        serde_json::to_string(view.load_state()).map_err(js_err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> TimelineView {
        TimelineView::new(EngineConfig::default(), 1_717_200_000_000.0).unwrap()
    }

    #[test]
    fn dropped_views_free_their_slot_only() {
        let mut registry = ViewRegistry::new();
        let first = registry.insert(view());
        let second = registry.insert(view());

        assert!(registry.remove(first).is_some());
        assert!(registry.get_mut(first).is_none());
        assert!(registry.remove(first).is_none());
        assert!(registry.get_mut(second).is_some());

        // Handles are never reused.
        assert_eq!(registry.insert(view()), 2);
    }

    #[test]
    fn unknown_handles_are_rejected() {
        let mut registry = ViewRegistry::new();
        assert!(registry.get_mut(0).is_none());
        assert!(registry.remove(7).is_none());
    }
}
