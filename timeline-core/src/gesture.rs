//! Pointer-driven drag and resize of timeline items.
//!
//! A [`GestureController`] is idle until a primary-button press starts either
//! a drag or a resize on one item. The session created at that point holds the
//! pointer origin and the item's pre-gesture geometry; every pointer move is
//! turned into a clamped position (or size) and reported as a
//! [`GestureEvent`]. Releasing the pointer reports the final value and drops
//! the session.
//!
//! ```
//! use kurbo::Point;
//! use timeline_core::{
//!     ContainerGeometry, GestureController, ItemSize, LayoutConfig, PositionMode, RenderPosition,
//! };
//!
//! let mut gestures = GestureController::new(PositionMode::Above, LayoutConfig::default());
//! let geometry = ContainerGeometry::new(800.0, 600.0, 300.0);
//!
//! gestures
//!     .begin_drag(
//!         "a",
//!         0,
//!         Point::new(100.0, 100.0),
//!         RenderPosition::new(10.0, -100.0),
//!         ItemSize::default(),
//!     )
//!     .unwrap();
//! gestures.pointer_move(Point::new(100.0, 40.0), Some(&geometry)).unwrap();
//! let done = gestures.pointer_up().unwrap();
//! assert_eq!(done.position().unwrap().y, -160.0);
//! ```

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LayoutConfig;
use crate::error::TimelineError;
use crate::model::{ContainerGeometry, CustomYDelta, ItemSize, PositionMode, RenderPosition};

/// Button index of the primary (usually left) pointer button.
pub const PRIMARY_BUTTON: i16 = 0;

/// Allowed travel for a dragged item, in pixels.
///
/// X bounds apply to the item's left edge measured from the container's left
/// edge; Y bounds are offsets from the axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn clamp_x(&self, x: f64) -> f64 {
        x.clamp(self.min_x, self.max_x)
    }

    pub fn clamp_y(&self, y: f64) -> f64 {
        y.clamp(self.min_y, self.max_y)
    }
}

/// Bounds for an item of `item_size` that started the gesture at `start_y`.
///
/// In alternate mode the side of the axis is taken from `start_y`, so an item
/// may only cross the axis by `config.crossing_window`.
pub fn compute_bounds(
    geometry: &ContainerGeometry,
    mode: PositionMode,
    item_size: ItemSize,
    start_y: f64,
    config: &LayoutConfig,
) -> Bounds {
    let config = &config.sanitized();
    let min_x = config.padding;
    let max_x = (geometry.width - item_size.width - config.padding).max(min_x);

    let room_above = (geometry.axis_y - config.padding).max(0.0);
    let room_below = (geometry.below_space() - item_size.height - config.padding).max(0.0);

    let above = || {
        let window = geometry.below_space() - item_size.height - config.reserved_gap;
        (
            -room_above.min(config.max_drag),
            window.clamp(0.0, config.max_drag),
        )
    };
    let below = || {
        let window = geometry.axis_y - config.reserved_gap;
        (
            -window.clamp(0.0, config.max_drag),
            room_below.min(config.max_drag),
        )
    };

    let (min_y, max_y) = match mode {
        PositionMode::Above => above(),
        PositionMode::Below => below(),
        PositionMode::Alternate if start_y < 0.0 => {
            let (min_y, max_y) = above();
            (min_y, max_y.min(config.crossing_window))
        }
        PositionMode::Alternate => {
            let (min_y, max_y) = below();
            (min_y.max(-config.crossing_window), max_y)
        }
        PositionMode::Center => {
            let reach = config.max_drag.min(room_above).min(room_below);
            (-reach, reach)
        }
    };

    Bounds {
        min_x,
        max_x,
        min_y,
        max_y,
    }
}

/// Whether an event is mid-gesture or the last one of it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GesturePhase {
    Live,
    Final,
}

/// Notification emitted to the host while a gesture runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GestureEvent {
    PositionChanged {
        id: String,
        position: RenderPosition,
        phase: GesturePhase,
    },
    SizeChanged {
        id: String,
        size: ItemSize,
        phase: GesturePhase,
    },
}

impl GestureEvent {
    pub fn id(&self) -> &str {
        match self {
            Self::PositionChanged { id, .. } | Self::SizeChanged { id, .. } => id,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        match self {
            Self::PositionChanged { phase, .. } | Self::SizeChanged { phase, .. } => *phase,
        }
    }

    pub fn position(&self) -> Option<RenderPosition> {
        match self {
            Self::PositionChanged { position, .. } => Some(*position),
            Self::SizeChanged { .. } => None,
        }
    }

    pub fn size(&self) -> Option<ItemSize> {
        match self {
            Self::SizeChanged { size, .. } => Some(*size),
            Self::PositionChanged { .. } => None,
        }
    }

    /// Record the offset a finished drag leaves behind.
    ///
    /// Only a `Final` position event counts; live moves and resizes return
    /// `None` and leave `deltas` untouched.
    pub fn commit_offset(&self, default_y: f64, deltas: &mut CustomYDelta) -> Option<f64> {
        match self {
            Self::PositionChanged {
                id,
                position,
                phase: GesturePhase::Final,
            } => Some(deltas.record(id.clone(), default_y, position.y)),
            _ => None,
        }
    }
}

/// Scratch state of one drag, dropped when the pointer is released.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub item_id: String,
    pub origin: Point,
    pub start_position: RenderPosition,
    pub item_size: ItemSize,
    pub current: RenderPosition,
}

/// Scratch state of one resize.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    pub item_id: String,
    pub origin: Point,
    pub start_size: ItemSize,
    pub current: ItemSize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging(DragSession),
    Resizing(ResizeSession),
}

/// Single-pointer gesture state machine.
#[derive(Debug, Clone)]
pub struct GestureController {
    mode: PositionMode,
    config: LayoutConfig,
    state: GestureState,
}

impl GestureController {
    pub fn new(mode: PositionMode, config: LayoutConfig) -> Self {
        Self {
            mode,
            config: config.sanitized(),
            state: GestureState::Idle,
        }
    }

    pub fn mode(&self) -> PositionMode {
        self.mode
    }

    /// Switching modes mid-gesture only affects bounds of later moves.
    pub fn set_mode(&mut self, mode: PositionMode) {
        self.mode = mode;
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, GestureState::Idle)
    }

    pub fn active_item(&self) -> Option<&str> {
        match &self.state {
            GestureState::Idle => None,
            GestureState::Dragging(session) => Some(&session.item_id),
            GestureState::Resizing(session) => Some(&session.item_id),
        }
    }

    pub fn begin_drag(
        &mut self,
        item_id: impl Into<String>,
        button: i16,
        pointer: Point,
        start_position: RenderPosition,
        item_size: ItemSize,
    ) -> Result<(), TimelineError> {
        self.ensure_can_start(button)?;
        let item_id = item_id.into();
        debug!(item = %item_id, "drag started");
        self.state = GestureState::Dragging(DragSession {
            item_id,
            origin: pointer,
            start_position,
            item_size,
            current: start_position,
        });
        Ok(())
    }

    pub fn begin_resize(
        &mut self,
        item_id: impl Into<String>,
        button: i16,
        pointer: Point,
        size: ItemSize,
    ) -> Result<(), TimelineError> {
        self.ensure_can_start(button)?;
        let item_id = item_id.into();
        debug!(item = %item_id, "resize started");
        self.state = GestureState::Resizing(ResizeSession {
            item_id,
            origin: pointer,
            start_size: size,
            current: size,
        });
        Ok(())
    }

    fn ensure_can_start(&self, button: i16) -> Result<(), TimelineError> {
        if button != PRIMARY_BUTTON {
            return Err(TimelineError::UnsupportedButton(button));
        }
        match self.active_item() {
            Some(active) => Err(TimelineError::GestureInProgress(active.to_string())),
            None => Ok(()),
        }
    }

    /// Apply a pointer move to the active gesture.
    ///
    /// Drags need the container geometry; without it the move is skipped and
    /// the session keeps its last position.
    pub fn pointer_move(
        &mut self,
        pointer: Point,
        geometry: Option<&ContainerGeometry>,
    ) -> Result<GestureEvent, TimelineError> {
        match &mut self.state {
            GestureState::Idle => Err(TimelineError::NoActiveGesture),
            GestureState::Dragging(session) => {
                let Some(geometry) = geometry else {
                    warn!(item = %session.item_id, "timeline container missing, drag move skipped");
                    return Err(TimelineError::MissingContainer);
                };
                let delta = pointer - session.origin;
                session.current = drag_position(session, delta, geometry, self.mode, &self.config);
                Ok(GestureEvent::PositionChanged {
                    id: session.item_id.clone(),
                    position: session.current,
                    phase: GesturePhase::Live,
                })
            }
            GestureState::Resizing(session) => {
                let delta = pointer - session.origin;
                session.current = ItemSize::new(
                    (session.start_size.width + delta.x).max(self.config.min_item_width),
                    (session.start_size.height + delta.y).max(self.config.min_item_height),
                );
                Ok(GestureEvent::SizeChanged {
                    id: session.item_id.clone(),
                    size: session.current,
                    phase: GesturePhase::Live,
                })
            }
        }
    }

    /// End the active gesture, reporting its last good value.
    pub fn pointer_up(&mut self) -> Result<GestureEvent, TimelineError> {
        match std::mem::take(&mut self.state) {
            GestureState::Idle => Err(TimelineError::NoActiveGesture),
            GestureState::Dragging(session) => {
                debug!(item = %session.item_id, "drag finished");
                Ok(GestureEvent::PositionChanged {
                    id: session.item_id,
                    position: session.current,
                    phase: GesturePhase::Final,
                })
            }
            GestureState::Resizing(session) => {
                debug!(item = %session.item_id, "resize finished");
                Ok(GestureEvent::SizeChanged {
                    id: session.item_id,
                    size: session.current,
                    phase: GesturePhase::Final,
                })
            }
        }
    }

    /// Drop the active gesture without a final event.
    pub fn cancel(&mut self) {
        self.state = GestureState::Idle;
    }
}

fn drag_position(
    session: &DragSession,
    delta: Vec2,
    geometry: &ContainerGeometry,
    mode: PositionMode,
    config: &LayoutConfig,
) -> RenderPosition {
    let start = session.start_position;
    let bounds = compute_bounds(geometry, mode, session.item_size, start.y, config);
    let left = bounds.clamp_x(geometry.percent_to_px(start.x) + delta.x);
    RenderPosition::new(
        geometry.px_to_percent(left),
        bounds.clamp_y(start.y + delta.y),
    )
}
