use serde::{Deserialize, Serialize};

/// Tunable constants for layout, drag bounds and capture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Distance (px) between the axis and an item placed above or below it.
    pub default_offset: f64,
    /// Lowest resolved Y (px, above the axis).
    pub min_y: f64,
    /// Highest resolved Y (px, below the axis).
    pub max_y: f64,
    /// Margin (px) kept between items and the container edges.
    pub padding: f64,
    /// Furthest an item may be dragged from the axis (px).
    pub max_drag: f64,
    /// Space (px) kept free on the opposite side of the axis for date labels.
    pub reserved_gap: f64,
    /// How far (px) an alternate-mode item may cross over the axis.
    pub crossing_window: f64,
    /// Horizontal clamp (percent) applied to captured positions.
    pub capture_min_x: f64,
    pub capture_max_x: f64,
    /// Item height (px) assumed when clamping captured positions.
    pub assumed_item_height: f64,
    /// Smallest size a resize gesture may produce (px).
    pub min_item_width: f64,
    pub min_item_height: f64,
    /// Item count above which layouts are still produced but flagged.
    pub max_items: usize,
    /// Upper bound on generated scale markers.
    pub max_markers: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_offset: 100.0,
            min_y: -300.0,
            max_y: 300.0,
            padding: 20.0,
            max_drag: 300.0,
            reserved_gap: 60.0,
            crossing_window: 40.0,
            capture_min_x: 15.0,
            capture_max_x: 85.0,
            assumed_item_height: 80.0,
            min_item_width: 80.0,
            min_item_height: 40.0,
            max_items: 15,
            max_markers: 60,
        }
    }
}

impl LayoutConfig {
    /// Copy with non-finite values replaced by defaults, negative distances
    /// raised to zero and inverted ranges swapped, so every clamp built from
    /// it has `min <= max`.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let (min_y, max_y) = ordered(
            finite(self.min_y, defaults.min_y),
            finite(self.max_y, defaults.max_y),
        );
        let (capture_min_x, capture_max_x) = ordered(
            finite(self.capture_min_x, defaults.capture_min_x),
            finite(self.capture_max_x, defaults.capture_max_x),
        );

        Self {
            default_offset: finite(self.default_offset, defaults.default_offset),
            min_y,
            max_y,
            padding: finite(self.padding, defaults.padding).max(0.0),
            max_drag: finite(self.max_drag, defaults.max_drag).max(0.0),
            reserved_gap: finite(self.reserved_gap, defaults.reserved_gap).max(0.0),
            crossing_window: finite(self.crossing_window, defaults.crossing_window).max(0.0),
            capture_min_x,
            capture_max_x,
            assumed_item_height: finite(self.assumed_item_height, defaults.assumed_item_height)
                .max(0.0),
            min_item_width: finite(self.min_item_width, defaults.min_item_width).max(0.0),
            min_item_height: finite(self.min_item_height, defaults.min_item_height).max(0.0),
            max_items: self.max_items,
            max_markers: self.max_markers,
        }
    }
}

fn finite(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Delay (ms) before measuring rendered positions after a layout change.
pub const CAPTURE_DELAY_MS: u32 = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: LayoutConfig =
            serde_json::from_str(r#"{ "padding": 8.0, "max_items": 20 }"#).unwrap();
        assert_eq!(cfg.padding, 8.0);
        assert_eq!(cfg.max_items, 20);
        assert_eq!(cfg.max_y, LayoutConfig::default().max_y);
    }

    #[test]
    fn sanitized_repairs_unusable_limits() {
        let cfg = LayoutConfig {
            min_y: 250.0,
            max_y: -250.0,
            max_drag: -10.0,
            padding: f64::NAN,
            capture_min_x: 90.0,
            capture_max_x: 10.0,
            ..LayoutConfig::default()
        }
        .sanitized();

        assert_eq!((cfg.min_y, cfg.max_y), (-250.0, 250.0));
        assert_eq!(cfg.max_drag, 0.0);
        assert_eq!(cfg.padding, 20.0);
        assert_eq!((cfg.capture_min_x, cfg.capture_max_x), (10.0, 90.0));
    }

    #[test]
    fn sanitized_leaves_defaults_alone() {
        assert_eq!(LayoutConfig::default().sanitized(), LayoutConfig::default());
    }
}
