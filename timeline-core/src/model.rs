//! Data types shared by every layout stage.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A dated record placed on the timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// `None` when the source date column is unset or could not be parsed.
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: Option<ItemReference>,
}

impl TimelineItem {
    pub fn new(id: impl Into<String>, date: Option<DateTime<Utc>>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            date,
            source: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Back-reference to the board record an item was built from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemReference {
    pub board_id: Option<String>,
    pub item_id: String,
    pub group: Option<String>,
}

/// Final coordinates of an item: `x` is a percentage of the container width,
/// `y` a signed pixel offset from the axis (negative is above).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct RenderPosition {
    pub x: f64,
    pub y: f64,
}

impl RenderPosition {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Placement strategy of items relative to the axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PositionMode {
    Above,
    #[default]
    Below,
    Alternate,
    Center,
}

impl PositionMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "above" | "top" => Some(Self::Above),
            "below" | "bottom" => Some(Self::Below),
            "alternate" | "alternating" => Some(Self::Alternate),
            "center" | "centre" | "middle" => Some(Self::Center),
            _ => None,
        }
    }
}

/// Where item date labels are drawn relative to the item card.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DateLabelPosition {
    Top,
    #[default]
    Bottom,
}

impl DateLabelPosition {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "top" | "above" => Some(Self::Top),
            "bottom" | "below" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// Side of the axis a scale label renders on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LabelSide {
    Above,
    Below,
}

/// Calendar granularity of the axis tick marks.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    #[default]
    None,
    Days,
    Weeks,
    Months,
    Quarters,
    Years,
}

impl Scale {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Some(Self::None),
            "day" | "days" | "daily" => Some(Self::Days),
            "week" | "weeks" | "weekly" => Some(Self::Weeks),
            "month" | "months" | "monthly" => Some(Self::Months),
            "quarter" | "quarters" | "quarterly" => Some(Self::Quarters),
            "year" | "years" | "yearly" => Some(Self::Years),
            _ => None,
        }
    }

    /// Next coarser granularity, `None` once at years.
    pub fn coarser(self) -> Option<Self> {
        match self {
            Self::None => None,
            Self::Days => Some(Self::Weeks),
            Self::Weeks => Some(Self::Months),
            Self::Months => Some(Self::Quarters),
            Self::Quarters => Some(Self::Years),
            Self::Years => None,
        }
    }
}

/// Inclusive date span covered by the axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn span(&self) -> Duration {
        self.end - self.start
    }

    /// A zero (or negative) span cannot be divided over the axis.
    pub fn is_degenerate(&self) -> bool {
        self.end <= self.start
    }

    /// Span from the earliest to the latest dated item. Falls back to a
    /// zero-length range at `fallback` when no item carries a date.
    pub fn from_items(items: &[TimelineItem], fallback: DateTime<Utc>) -> Self {
        let mut dates = items.iter().filter_map(|item| item.date);
        let Some(first) = dates.next() else {
            return Self::new(fallback, fallback);
        };
        let (start, end) = dates.fold((first, first), |(lo, hi), date| {
            (lo.min(date), hi.max(date))
        });
        Self::new(start, end)
    }

    /// Percentage of the span at which `date` lies, clamped to `[0, 100]`.
    /// Degenerate ranges place everything at the midpoint.
    pub fn percent_of(&self, date: DateTime<Utc>) -> f64 {
        if self.is_degenerate() {
            return 50.0;
        }
        let total = self.span().num_milliseconds() as f64;
        let offset = (date - self.start).num_milliseconds() as f64;
        (offset / total * 100.0).clamp(0.0, 100.0)
    }
}

/// Host settings that drive a layout pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TimelineSettings {
    #[serde(default)]
    pub position_mode: PositionMode,
    #[serde(default)]
    pub date_label_position: DateLabelPosition,
    #[serde(default)]
    pub scale: Scale,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl TimelineSettings {
    /// Explicit range from the settings, when both ends are present.
    pub fn explicit_range(&self) -> Option<DateRange> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(DateRange::new(start, end)),
            _ => None,
        }
    }
}

/// Pixel size of an item card.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ItemSize {
    pub width: f64,
    pub height: f64,
}

impl ItemSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for ItemSize {
    fn default() -> Self {
        Self::new(160.0, 80.0)
    }
}

/// Current geometry of the timeline container, in pixels.
///
/// `axis_y` is the distance from the container's top edge to the axis line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ContainerGeometry {
    pub width: f64,
    pub height: f64,
    pub axis_y: f64,
}

impl ContainerGeometry {
    pub const fn new(width: f64, height: f64, axis_y: f64) -> Self {
        Self {
            width,
            height,
            axis_y,
        }
    }

    /// Room between the axis and the container's bottom edge.
    pub fn below_space(&self) -> f64 {
        (self.height - self.axis_y).max(0.0)
    }

    pub fn percent_to_px(&self, percent: f64) -> f64 {
        percent / 100.0 * self.width
    }

    pub fn px_to_percent(&self, px: f64) -> f64 {
        if self.width <= 0.0 {
            return 0.0;
        }
        px / self.width * 100.0
    }
}

/// User-applied vertical offsets keyed by item id.
///
/// Presence of an entry marks the item as custom-positioned, even when the
/// stored offset is zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct CustomYDelta(BTreeMap<String, f64>);

impl CustomYDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.0.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, delta: f64) -> Option<f64> {
        self.0.insert(id.into(), delta)
    }

    pub fn remove(&mut self, id: &str) -> Option<f64> {
        self.0.remove(id)
    }

    /// Store the offset that moves an item from `default_y` to `final_y`.
    pub fn record(&mut self, id: impl Into<String>, default_y: f64, final_y: f64) -> f64 {
        let delta = final_y - default_y;
        self.0.insert(id.into(), delta);
        delta
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(id, delta)| (id.as_str(), *delta))
    }
}

impl FromIterator<(String, f64)> for CustomYDelta {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, f64>> for CustomYDelta {
    fn from(map: BTreeMap<String, f64>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn range_from_items_spans_dated_items_only() {
        let items = vec![
            TimelineItem::new("a", Some(day(10))),
            TimelineItem::new("b", None),
            TimelineItem::new("c", Some(day(3))),
        ];
        let range = DateRange::from_items(&items, day(1));
        assert_eq!(range, DateRange::new(day(3), day(10)));
    }

    #[test]
    fn range_from_undated_items_is_degenerate() {
        let items = vec![TimelineItem::new("a", None)];
        let range = DateRange::from_items(&items, day(7));
        assert!(range.is_degenerate());
        assert_eq!(range.percent_of(day(20)), 50.0);
    }

    #[test]
    fn percent_of_clamps_outside_dates() {
        let range = DateRange::new(day(5), day(15));
        assert_eq!(range.percent_of(day(1)), 0.0);
        assert_eq!(range.percent_of(day(10)), 50.0);
        assert_eq!(range.percent_of(day(31)), 100.0);
    }

    #[test]
    fn custom_delta_presence_is_independent_of_value() {
        let mut deltas = CustomYDelta::new();
        deltas.insert("a", 0.0);
        assert!(deltas.contains("a"));
        assert!(!deltas.contains("b"));
        assert_eq!(deltas.record("b", 100.0, 40.0), -60.0);
        assert_eq!(deltas.get("b"), Some(-60.0));
    }

    #[test]
    fn settings_keywords_parse_loosely() {
        assert_eq!(PositionMode::parse(" Alternate "), Some(PositionMode::Alternate));
        assert_eq!(PositionMode::parse("sideways"), None);
        assert_eq!(Scale::parse("weekly"), Some(Scale::Weeks));
        assert_eq!(DateLabelPosition::parse("TOP"), Some(DateLabelPosition::Top));
    }
}
