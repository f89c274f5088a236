//! Reconciles measured on-screen positions back into the offset model.
//!
//! After a layout-affecting settings change (a position-mode switch, a resize
//! of the widget) the host waits for the next paint, measures every item, and
//! feeds the rectangles to [`capture_positions`]. [`rebase_deltas`] then turns
//! those absolute positions into offsets against the new defaults so custom
//! placements stay where the user left them.

use std::collections::BTreeMap;

use kurbo::Rect;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LayoutConfig;
use crate::model::CustomYDelta;
use crate::resolver::ResolvedItem;

/// Bounding box of one rendered item, in page coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeasuredItem {
    pub id: String,
    pub rect: Rect,
}

/// Position read back from the rendered tree.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CapturedPosition {
    /// Percent of the container width.
    pub x: f64,
    /// Pixels from the axis top, clamped to stay inside the container.
    pub y: f64,
}

/// Convert measured rectangles into `{x%, y}` keyed by item id.
pub fn capture_positions(
    measured: &[MeasuredItem],
    axis: Rect,
    container: Rect,
    config: &LayoutConfig,
) -> BTreeMap<String, CapturedPosition> {
    let config = &config.sanitized();
    let min_y = -(axis.y0 - container.y0) + config.padding;
    let max_y = (container.y1 - axis.y0) - config.assumed_item_height - config.padding;
    let width = container.width();

    measured
        .iter()
        .map(|item| {
            let x = if width > 0.0 {
                (item.rect.x0 - container.x0) / width * 100.0
            } else {
                50.0
            };
            let y = item.rect.y0 - axis.y0;
            let position = CapturedPosition {
                x: x.clamp(config.capture_min_x, config.capture_max_x),
                y: if min_y <= max_y { y.clamp(min_y, max_y) } else { min_y },
            };
            (item.id.clone(), position)
        })
        .collect()
}

/// Re-derive offsets for custom-positioned items against new defaults.
///
/// Only ids present in `previous` are kept; items that were never moved keep
/// following their mode defaults. Ids missing from `captured` keep their old
/// offset.
pub fn rebase_deltas(
    captured: &BTreeMap<String, CapturedPosition>,
    new_defaults: &[ResolvedItem],
    previous: &CustomYDelta,
) -> CustomYDelta {
    let mut rebased = previous.clone();
    for item in new_defaults {
        if !previous.contains(&item.id) {
            continue;
        }
        if let Some(position) = captured.get(&item.id) {
            let delta = rebased.record(item.id.clone(), item.default_position.y, position.y);
            debug!(item = %item.id, delta, "rebased custom offset");
        }
    }
    rebased
}

/// Stamp handed out when a deferred capture is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTicket(u64);

/// Tracks which deferred capture, if any, is still allowed to run.
///
/// Scheduling a new capture or cancelling invalidates every earlier ticket,
/// so a timer that fires after unmount or after newer props is ignored.
#[derive(Debug, Default)]
pub struct CaptureScheduler {
    generation: u64,
    pending: Option<u64>,
}

impl CaptureScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self) -> CaptureTicket {
        self.generation += 1;
        self.pending = Some(self.generation);
        CaptureTicket(self.generation)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_current(&self, ticket: CaptureTicket) -> bool {
        self.pending == Some(ticket.0)
    }

    /// Consume `ticket` if it is still current. A capture runs at most once.
    pub fn fire(&mut self, ticket: CaptureTicket) -> bool {
        if self.is_current(ticket) {
            self.pending = None;
            true
        } else {
            debug!("stale capture ignored");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RenderPosition;

    fn container() -> Rect {
        Rect::new(100.0, 50.0, 900.0, 650.0)
    }

    fn axis() -> Rect {
        Rect::new(100.0, 350.0, 900.0, 352.0)
    }

    fn measured(id: &str, x: f64, y: f64) -> MeasuredItem {
        MeasuredItem {
            id: id.to_string(),
            rect: Rect::new(x, y, x + 160.0, y + 80.0),
        }
    }

    fn resolved(id: &str, default_y: f64) -> ResolvedItem {
        ResolvedItem {
            id: id.to_string(),
            name: String::new(),
            date: None,
            render_position: RenderPosition::new(50.0, default_y),
            default_position: RenderPosition::new(50.0, default_y),
            is_custom_position: false,
        }
    }

    #[test]
    fn positions_are_relative_to_axis_and_container() {
        let captured = capture_positions(
            &[measured("a", 500.0, 250.0)],
            axis(),
            container(),
            &LayoutConfig::default(),
        );
        assert_eq!(captured["a"], CapturedPosition { x: 50.0, y: -100.0 });
    }

    #[test]
    fn positions_are_clamped() {
        let captured = capture_positions(
            &[measured("left", 100.0, 0.0), measured("right", 890.0, 700.0)],
            axis(),
            container(),
            &LayoutConfig::default(),
        );
        // axis sits 300px below the container top
        assert_eq!(captured["left"], CapturedPosition { x: 15.0, y: -280.0 });
        // 300px below the axis minus 80px item and 20px padding
        assert_eq!(captured["right"], CapturedPosition { x: 85.0, y: 200.0 });
    }

    #[test]
    fn rebase_keeps_custom_items_visually_stable() {
        let captured = capture_positions(
            &[measured("a", 500.0, 250.0), measured("b", 500.0, 450.0)],
            axis(),
            container(),
            &LayoutConfig::default(),
        );
        let previous: CustomYDelta = [("a".to_string(), 0.0)].into_iter().collect();

        // switching to center: new default y is 0 for everyone
        let rebased = rebase_deltas(
            &captured,
            &[resolved("a", 0.0), resolved("b", 0.0)],
            &previous,
        );

        assert_eq!(rebased.get("a"), Some(-100.0));
        assert!(!rebased.contains("b"));
    }

    #[test]
    fn scheduler_only_honours_latest_ticket() {
        let mut scheduler = CaptureScheduler::new();
        let first = scheduler.schedule();
        let second = scheduler.schedule();
        assert!(!scheduler.fire(first));
        assert!(scheduler.fire(second));
        assert!(!scheduler.fire(second));
    }

    #[test]
    fn rescheduled_capture_rebases_latest_offsets() {
        let mut scheduler = CaptureScheduler::new();
        let captured = capture_positions(
            &[measured("a", 500.0, 250.0), measured("b", 500.0, 450.0)],
            axis(),
            container(),
            &LayoutConfig::default(),
        );

        let stale = scheduler.schedule();
        // the host stores an offset for "b" before the first timer fires
        let latest: CustomYDelta = [("a".to_string(), 0.0), ("b".to_string(), 40.0)]
            .into_iter()
            .collect();
        let fresh = scheduler.schedule();

        assert!(!scheduler.fire(stale));
        assert!(scheduler.fire(fresh));
        let rebased = rebase_deltas(
            &captured,
            &[resolved("a", -100.0), resolved("b", 100.0)],
            &latest,
        );
        assert_eq!(rebased.get("a"), Some(0.0));
        assert_eq!(rebased.get("b"), Some(0.0));
    }

    #[test]
    fn inverted_capture_window_does_not_panic() {
        let config = LayoutConfig {
            capture_min_x: 85.0,
            capture_max_x: 15.0,
            ..LayoutConfig::default()
        };
        let captured = capture_positions(
            &[measured("a", 100.0, 250.0)],
            axis(),
            container(),
            &config,
        );
        assert_eq!(captured["a"].x, 15.0);
    }

    #[test]
    fn cancelled_capture_never_fires() {
        let mut scheduler = CaptureScheduler::new();
        let ticket = scheduler.schedule();
        scheduler.cancel();
        assert!(!scheduler.is_pending());
        assert!(!scheduler.fire(ticket));
    }
}
