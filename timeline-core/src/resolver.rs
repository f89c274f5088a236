//! Merges default positions with stored user offsets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::LayoutConfig;
use crate::mapper::map_items;
use crate::model::{CustomYDelta, DateRange, PositionMode, RenderPosition, TimelineItem};

/// An item ready to be drawn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedItem {
    pub id: String,
    pub name: String,
    pub date: Option<DateTime<Utc>>,
    pub render_position: RenderPosition,
    /// Position the item would have without a stored offset.
    pub default_position: RenderPosition,
    pub is_custom_position: bool,
}

/// Final positions for `items`, in input order.
///
/// `final_y = clamp(default_y + delta, min_y, max_y)`. An item counts as
/// custom-positioned whenever `deltas` has an entry for it.
pub fn resolve(
    items: &[TimelineItem],
    range: &DateRange,
    mode: PositionMode,
    deltas: &CustomYDelta,
    config: &LayoutConfig,
) -> Vec<ResolvedItem> {
    let config = &config.sanitized();
    if items.len() > config.max_items {
        warn!(
            count = items.len(),
            max = config.max_items,
            "more items than the timeline is designed for"
        );
    }

    map_items(items, range, mode, config)
        .into_iter()
        .map(|mapped| {
            let delta = deltas.get(&mapped.item.id);
            let default_position = mapped.position;
            let y = clamp_y(
                default_position.y + delta.unwrap_or(0.0),
                default_position.y,
                config,
            );
            ResolvedItem {
                id: mapped.item.id.clone(),
                name: mapped.item.name.clone(),
                date: mapped.item.date,
                render_position: RenderPosition::new(default_position.x, y),
                default_position,
                is_custom_position: delta.is_some(),
            }
        })
        .collect()
}

/// A NaN offset falls back to the default position.
fn clamp_y(y: f64, default_y: f64, config: &LayoutConfig) -> f64 {
    let y = if y.is_nan() { default_y } else { y };
    y.clamp(config.min_y, config.max_y)
}
