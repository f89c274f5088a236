#![cfg(target_arch = "wasm32")]

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Node};

const STYLE_TAG_SELECTOR: &str = "style[data-timeline-ui]";

/// Default CSS for the widget along with easy-to-override design tokens.
pub const DEFAULT_STYLES: &str = r#"
:root {
  --timeline-font-family: 'Figtree', 'Roboto', system-ui, -apple-system, 'Segoe UI', sans-serif;
  --timeline-bg: #ffffff;
  --timeline-text: #323338;
  --timeline-muted: #676879;
  --timeline-axis: #c3c6d4;
  --timeline-axis-width: 2px;
  --timeline-card-bg: #ffffff;
  --timeline-card-border: rgba(50, 51, 56, 0.16);
  --timeline-card-radius: 8px;
  --timeline-card-shadow: 0 4px 12px rgba(29, 35, 60, 0.12);
  --timeline-accent: #0073ea;
  --timeline-custom: #a25ddc;
}

.timeline-widget {
  font-family: var(--timeline-font-family);
  background: var(--timeline-bg);
  color: var(--timeline-text);
  position: relative;
  width: 100%;
  height: 100%;
  min-height: 480px;
  overflow: hidden;
  user-select: none;
  touch-action: none;
}

.timeline-axis {
  position: absolute;
  left: 20px;
  right: 20px;
  top: 50%;
  height: var(--timeline-axis-width);
  background: var(--timeline-axis);
}

.timeline-marker {
  position: absolute;
  top: 0;
  transform: translateX(-50%);
}

.timeline-marker::before {
  content: '';
  position: absolute;
  left: 50%;
  top: -4px;
  width: 1px;
  height: 10px;
  background: var(--timeline-axis);
}

.timeline-marker-label {
  position: absolute;
  left: 50%;
  transform: translateX(-50%);
  white-space: nowrap;
  font-size: 0.72rem;
  color: var(--timeline-muted);
}

.timeline-marker[data-side="above"] .timeline-marker-label {
  bottom: 10px;
}

.timeline-marker[data-side="below"] .timeline-marker-label {
  top: 10px;
}

.timeline-item {
  position: absolute;
  box-sizing: border-box;
  display: flex;
  flex-direction: column;
  gap: 4px;
  padding: 10px 12px;
  background: var(--timeline-card-bg);
  border: 1px solid var(--timeline-card-border);
  border-radius: var(--timeline-card-radius);
  box-shadow: var(--timeline-card-shadow);
  cursor: grab;
}

.timeline-item.is-dragging {
  cursor: grabbing;
  z-index: 10;
  border-color: var(--timeline-accent);
}

.timeline-item.is-custom {
  border-left: 3px solid var(--timeline-custom);
}

.timeline-item-name {
  font-weight: 600;
  font-size: 0.9rem;
  overflow: hidden;
  text-overflow: ellipsis;
  white-space: nowrap;
}

.timeline-item-date {
  font-size: 0.75rem;
  color: var(--timeline-muted);
}

.timeline-item[data-label="top"] .timeline-item-date {
  order: -1;
}

.timeline-resize-handle {
  position: absolute;
  right: 2px;
  bottom: 2px;
  width: 10px;
  height: 10px;
  cursor: nwse-resize;
  border-right: 2px solid var(--timeline-card-border);
  border-bottom: 2px solid var(--timeline-card-border);
}

.timeline-empty {
  position: absolute;
  inset: 0;
  display: grid;
  place-items: center;
  color: var(--timeline-muted);
}
"#;

pub fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.query_selector(STYLE_TAG_SELECTOR)?.is_some() {
        return Ok(());
    }

    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("Document has no <head> element"))?;

    let style_el = document.create_element("style")?;
    style_el.set_attribute("data-timeline-ui", "v1")?;
    style_el.set_text_content(Some(DEFAULT_STYLES));
    head.append_child(&style_el.clone().dyn_into::<Node>()?)?;

    Ok(())
}
