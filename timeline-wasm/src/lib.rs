//! Framework-neutral WASM <-> JavaScript bridge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value, Serializer};
use timeline_board::BoardMapping;
use timeline_core::{
    capture_positions, generate_markers, rebase_deltas, resolve, CapturedPosition, CustomYDelta,
    DateLabelPosition, DateRange, LayoutConfig, LayoutRequest, MeasuredItem, PositionMode, Scale,
    TimelineError, TimelineItem, TimelineLayout,
};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsLayoutConfig {
    #[serde(default)]
    default_offset: Option<f64>,
    #[serde(default)]
    padding: Option<f64>,
    #[serde(default)]
    max_drag: Option<f64>,
    #[serde(default)]
    assumed_item_height: Option<f64>,
    #[serde(default)]
    max_markers: Option<usize>,
}

impl From<JsLayoutConfig> for LayoutConfig {
    fn from(cfg: JsLayoutConfig) -> Self {
        let mut base = LayoutConfig::default();
        if let Some(offset) = cfg.default_offset {
            base.default_offset = offset;
        }
        if let Some(padding) = cfg.padding {
            base.padding = padding;
        }
        if let Some(max_drag) = cfg.max_drag {
            base.max_drag = max_drag;
        }
        if let Some(height) = cfg.assumed_item_height {
            base.assumed_item_height = height;
        }
        if let Some(max_markers) = cfg.max_markers {
            base.max_markers = max_markers;
        }
        base.sanitized()
    }
}

#[derive(Deserialize)]
struct JsCaptureRequest {
    items: Vec<MeasuredItem>,
    axis: kurbo::Rect,
    container: kurbo::Rect,
    /// Items laid out under the new settings, before offsets.
    timeline_items: Vec<TimelineItem>,
    range: DateRange,
    position_mode: PositionMode,
    #[serde(default)]
    custom_y_delta: CustomYDelta,
}

#[derive(Serialize)]
struct JsCaptureResult {
    positions: BTreeMap<String, CapturedPosition>,
    custom_y_delta: CustomYDelta,
}

/// Maps go out as plain objects rather than ES `Map`s.
fn to_js_object<T: Serialize>(value: &T, what: &str) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|err| JsValue::from_str(&format!("Could not serialize {what}: {err}")))
}

fn read_config(config: Option<JsValue>) -> Result<LayoutConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsLayoutConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Could not read config: {err}")))?;
            Ok(LayoutConfig::from(cfg))
        }
        _ => Ok(LayoutConfig::default()),
    }
}

/// Resolve item positions and scale markers for a layout request.
#[wasm_bindgen]
pub fn resolve_layout(request: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let request: LayoutRequest = from_value(request)
        .map_err(|err| JsValue::from_str(&format!("Could not read layout request: {err}")))?;
    let cfg = read_config(config)?;

    let layout = TimelineLayout::build(&request, &cfg);
    to_value(&layout)
        .map_err(|err| JsValue::from_str(&format!("Could not serialize layout: {err}")))
}

/// Tick marks for a range, independent of item positions.
#[wasm_bindgen]
pub fn generate_scale_markers(
    range: JsValue,
    scale: &str,
    date_label_position: &str,
) -> Result<JsValue, JsValue> {
    let range: DateRange = from_value(range)
        .map_err(|err| JsValue::from_str(&format!("Could not read date range: {err}")))?;
    let scale = Scale::parse(scale).unwrap_or_default();
    let label_position = DateLabelPosition::parse(date_label_position).unwrap_or_default();

    let markers = generate_markers(&range, scale, label_position, &LayoutConfig::default());
    to_value(&markers)
        .map_err(|err| JsValue::from_str(&format!("Could not serialize markers: {err}")))
}

/// Parse a board API payload into items and stored offsets.
#[wasm_bindgen]
pub fn load_board(payload: JsValue, mapping: JsValue) -> Result<JsValue, JsValue> {
    let payload = from_value::<serde_json::Value>(payload)
        .map_err(|err| JsValue::from_str(&format!("Could not read board JSON: {err}")))?;
    let mapping: BoardMapping = if mapping.is_undefined() || mapping.is_null() {
        BoardMapping::default()
    } else {
        from_value(mapping)
            .map_err(|err| JsValue::from_str(&format!("Could not read column mapping: {err}")))?
    };

    let snapshot = timeline_board::load_board_value(&payload, &mapping)
        .map_err(|err| JsValue::from_str(&format_timeline_error(err)))?;

    to_js_object(&snapshot, "board")
}

/// GraphQL request persisting one item's offset; `delta: undefined` clears it.
#[wasm_bindgen]
pub fn offset_update(
    board_id: &str,
    item_id: &str,
    column_id: &str,
    delta: Option<f64>,
) -> Result<JsValue, JsValue> {
    let payload = timeline_board::offset_update_payload(board_id, item_id, column_id, delta);
    to_js_object(&payload, "offset update")
}

/// Turn measured rectangles into positions and rebased offsets.
///
/// Returns `{ positions, custom_y_delta }`.
#[wasm_bindgen]
pub fn capture_render_positions(
    request: JsValue,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    let request: JsCaptureRequest = from_value(request)
        .map_err(|err| JsValue::from_str(&format!("Could not read capture request: {err}")))?;
    let cfg = read_config(config)?;

    let positions = capture_positions(&request.items, request.axis, request.container, &cfg);
    let defaults = resolve(
        &request.timeline_items,
        &request.range,
        request.position_mode,
        &CustomYDelta::new(),
        &cfg,
    );
    let custom_y_delta = rebase_deltas(&positions, &defaults, &request.custom_y_delta);

    to_js_object(
        &JsCaptureResult {
            positions,
            custom_y_delta,
        },
        "capture",
    )
}

fn format_timeline_error(err: TimelineError) -> String {
    format!("Timeline error: {err}")
}
