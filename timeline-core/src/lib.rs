//! Layout engine for the board timeline widget.
//!
//! Maps dated items onto a horizontal axis, applies user offsets, generates
//! scale markers and drives drag/resize gestures. Everything here is
//! synchronous and free of I/O; the host feeds in items, settings and stored
//! offsets and draws what comes out.

mod capture;
mod config;
mod error;
mod gesture;
mod mapper;
mod markers;
mod model;
mod resolver;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use capture::{
    capture_positions, rebase_deltas, CaptureScheduler, CaptureTicket, CapturedPosition,
    MeasuredItem,
};
pub use config::{LayoutConfig, CAPTURE_DELAY_MS};
pub use error::TimelineError;
pub use gesture::{
    compute_bounds, Bounds, DragSession, GestureController, GestureEvent, GesturePhase,
    GestureState, ResizeSession, PRIMARY_BUTTON,
};
pub use mapper::{map_items, MappedItem};
pub use markers::{generate_markers, ScaleMarker};
pub use model::{
    ContainerGeometry, CustomYDelta, DateLabelPosition, DateRange, ItemReference, ItemSize,
    LabelSide, PositionMode, RenderPosition, Scale, TimelineItem, TimelineSettings,
};
pub use resolver::{resolve, ResolvedItem};

/// Everything the host hands over for one layout pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LayoutRequest {
    pub items: Vec<TimelineItem>,
    #[serde(default)]
    pub settings: TimelineSettings,
    #[serde(default)]
    pub custom_y_delta: CustomYDelta,
}

/// Result of one layout pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineLayout {
    pub generated_at: DateTime<Utc>,
    pub range: DateRange,
    pub position_mode: PositionMode,
    pub items: Vec<ResolvedItem>,
    pub markers: Vec<ScaleMarker>,
}

impl TimelineLayout {
    /// Resolve item positions and markers for `request`.
    ///
    /// The range comes from the settings when both ends are set, otherwise it
    /// spans the dated items.
    pub fn build(request: &LayoutRequest, config: &LayoutConfig) -> Self {
        let now = Utc::now();
        let settings = &request.settings;
        let range = settings
            .explicit_range()
            .unwrap_or_else(|| DateRange::from_items(&request.items, now));

        Self {
            generated_at: now,
            range,
            position_mode: settings.position_mode,
            items: resolve(
                &request.items,
                &range,
                settings.position_mode,
                &request.custom_y_delta,
                config,
            ),
            markers: generate_markers(&range, settings.scale, settings.date_label_position, config),
        }
    }

    pub fn item(&self, id: &str) -> Option<&ResolvedItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn custom_items(&self) -> impl Iterator<Item = &ResolvedItem> {
        self.items.iter().filter(|item| item.is_custom_position)
    }
}

/// An empty layout over today's date (used for mocks and first paint).
pub fn empty_layout() -> TimelineLayout {
    let now = Utc::now();
    TimelineLayout {
        generated_at: now,
        range: DateRange::new(now, now),
        position_mode: PositionMode::default(),
        items: Vec::new(),
        markers: Vec::new(),
    }
}
