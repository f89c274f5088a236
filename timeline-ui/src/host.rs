//! Payloads the widget reports to its embedding page.

use std::collections::BTreeMap;

use serde::Serialize;
use timeline_core::{CapturedPosition, CustomYDelta, GesturePhase, ItemSize, RenderPosition};

/// Result of a deferred measurement pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureOutcome {
    pub positions: BTreeMap<String, CapturedPosition>,
    pub custom_y_delta: CustomYDelta,
}

/// One step of a drag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionChange {
    pub id: String,
    pub position: RenderPosition,
    pub phase: GesturePhase,
    /// Offset from the item's default Y, set on the final step only.
    pub delta: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeChange {
    pub id: String,
    pub size: ItemSize,
    pub phase: GesturePhase,
}

/// Event payload handed to the JavaScript host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostEvent {
    Position {
        id: String,
        x: f64,
        y: f64,
        phase: GesturePhase,
        #[serde(skip_serializing_if = "Option::is_none")]
        delta: Option<f64>,
    },
    Size {
        id: String,
        width: f64,
        height: f64,
        phase: GesturePhase,
    },
    Capture(CaptureOutcome),
}

impl From<PositionChange> for HostEvent {
    fn from(change: PositionChange) -> Self {
        HostEvent::Position {
            id: change.id,
            x: change.position.x,
            y: change.position.y,
            phase: change.phase,
            delta: change.delta,
        }
    }
}

impl From<SizeChange> for HostEvent {
    fn from(change: SizeChange) -> Self {
        HostEvent::Size {
            id: change.id,
            width: change.size.width,
            height: change.size.height,
            phase: change.phase,
        }
    }
}

impl From<CaptureOutcome> for HostEvent {
    fn from(outcome: CaptureOutcome) -> Self {
        HostEvent::Capture(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use serde_json::json;
    use timeline_core::{
        ContainerGeometry, GestureController, GestureEvent, LayoutConfig, PositionMode,
        PRIMARY_BUTTON,
    };

    fn drag_events() -> (HostEvent, HostEvent) {
        let mut gestures = GestureController::new(PositionMode::Above, LayoutConfig::default());
        let geometry = ContainerGeometry::new(800.0, 600.0, 300.0);
        gestures
            .begin_drag(
                "7",
                PRIMARY_BUTTON,
                Point::ZERO,
                RenderPosition::new(25.0, -100.0),
                ItemSize::default(),
            )
            .unwrap();
        let mut deltas = CustomYDelta::new();

        let live = gestures
            .pointer_move(Point::new(0.0, -40.0), Some(&geometry))
            .unwrap();
        let done = gestures.pointer_up().unwrap();

        let to_host = |event: GestureEvent, deltas: &mut CustomYDelta| {
            let delta = event.commit_offset(-100.0, deltas);
            HostEvent::from(PositionChange {
                id: event.id().to_string(),
                position: event.position().unwrap(),
                phase: event.phase(),
                delta,
            })
        };
        (to_host(live, &mut deltas), to_host(done, &mut deltas))
    }

    #[test]
    fn live_moves_carry_phase_without_delta() {
        let (live, _) = drag_events();
        assert_eq!(
            serde_json::to_value(live).unwrap(),
            json!({ "kind": "position", "id": "7", "x": 25.0, "y": -140.0, "phase": "live" })
        );
    }

    #[test]
    fn final_move_carries_offset_to_persist() {
        let (_, done) = drag_events();
        assert_eq!(
            serde_json::to_value(done).unwrap(),
            json!({
                "kind": "position",
                "id": "7",
                "x": 25.0,
                "y": -140.0,
                "phase": "final",
                "delta": -40.0
            })
        );
    }

    #[test]
    fn capture_outcome_is_tagged() {
        let outcome = CaptureOutcome {
            positions: BTreeMap::from([("a".to_string(), CapturedPosition { x: 50.0, y: -100.0 })]),
            custom_y_delta: [("a".to_string(), 0.0)].into_iter().collect(),
        };
        assert_eq!(
            serde_json::to_value(HostEvent::from(outcome)).unwrap(),
            json!({
                "kind": "capture",
                "positions": { "a": { "x": 50.0, "y": -100.0 } },
                "custom_y_delta": { "a": 0.0 }
            })
        );
    }
}
