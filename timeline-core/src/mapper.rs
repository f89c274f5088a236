//! Date-to-coordinate mapping: default positions before any user offset.

use tracing::debug;

use crate::config::LayoutConfig;
use crate::model::{DateRange, PositionMode, RenderPosition, TimelineItem};

/// An item paired with its default (unmodified) position.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedItem<'a> {
    pub item: &'a TimelineItem,
    pub position: RenderPosition,
}

/// Map every item onto the axis. Output order matches input order.
///
/// Undated items sit on the start edge; dates outside `range` are clamped to
/// the nearest edge. Nothing is filtered out here.
pub fn map_items<'a>(
    items: &'a [TimelineItem],
    range: &DateRange,
    mode: PositionMode,
    config: &LayoutConfig,
) -> Vec<MappedItem<'a>> {
    if range.is_degenerate() {
        debug!(start = %range.start, end = %range.end, "degenerate date range, centering items");
    }

    let sides = match mode {
        PositionMode::Alternate => alternate_sides(items),
        _ => Vec::new(),
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let x = map_x(item, range);
            let y = match mode {
                PositionMode::Above => -config.default_offset,
                PositionMode::Below => config.default_offset,
                PositionMode::Center => 0.0,
                PositionMode::Alternate => {
                    if sides[index] {
                        -config.default_offset
                    } else {
                        config.default_offset
                    }
                }
            };
            MappedItem {
                item,
                position: RenderPosition::new(x, y),
            }
        })
        .collect()
}

fn map_x(item: &TimelineItem, range: &DateRange) -> f64 {
    if range.is_degenerate() {
        return 50.0;
    }
    match item.date {
        Some(date) => range.percent_of(date),
        None => {
            debug!(id = %item.id, "item has no valid date, placing at start edge");
            0.0
        }
    }
}

/// For each input index, whether the item goes above the axis.
///
/// Items are ordered chronologically (undated first) with ties kept in input
/// order; even positions in that sequence go above, odd ones below.
fn alternate_sides(items: &[TimelineItem]) -> Vec<bool> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by_key(|&index| items[index].date);

    let mut above = vec![false; items.len()];
    for (sequence, index) in order.into_iter().enumerate() {
        above[index] = sequence % 2 == 0;
    }
    above
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn january() -> DateRange {
        DateRange::new(day(1), day(31))
    }

    fn positions(items: &[TimelineItem], mode: PositionMode) -> Vec<RenderPosition> {
        map_items(items, &january(), mode, &LayoutConfig::default())
            .into_iter()
            .map(|mapped| mapped.position)
            .collect()
    }

    #[test]
    fn x_is_linear_in_date() {
        let items = vec![
            TimelineItem::new("a", Some(day(1))),
            TimelineItem::new("b", Some(day(16))),
            TimelineItem::new("c", Some(day(31))),
        ];
        let xs: Vec<f64> = positions(&items, PositionMode::Below)
            .iter()
            .map(|p| p.x)
            .collect();
        assert_eq!(xs, vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn undated_and_out_of_range_items_are_clamped_not_dropped() {
        let items = vec![
            TimelineItem::new("none", None),
            TimelineItem::new("late", Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())),
            TimelineItem::new("early", Some(Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap())),
        ];
        let result = positions(&items, PositionMode::Center);
        assert_eq!(result.len(), 3);
        assert_eq!(result[0], RenderPosition::new(0.0, 0.0));
        assert_eq!(result[1].x, 100.0);
        assert_eq!(result[2].x, 0.0);
    }

    #[test]
    fn fixed_modes_pick_a_side() {
        let items = vec![TimelineItem::new("a", Some(day(5)))];
        assert_eq!(positions(&items, PositionMode::Above)[0].y, -100.0);
        assert_eq!(positions(&items, PositionMode::Below)[0].y, 100.0);
        assert_eq!(positions(&items, PositionMode::Center)[0].y, 0.0);
    }

    #[test]
    fn alternate_follows_chronological_order() {
        // Input order differs from date order on purpose.
        let items = vec![
            TimelineItem::new("late", Some(day(20))),
            TimelineItem::new("early", Some(day(2))),
            TimelineItem::new("middle", Some(day(10))),
        ];
        let ys: Vec<f64> = positions(&items, PositionMode::Alternate)
            .iter()
            .map(|p| p.y)
            .collect();
        assert_eq!(ys, vec![-100.0, -100.0, 100.0]);
    }

    #[test]
    fn alternate_breaks_same_date_ties_by_input_order() {
        let items = vec![
            TimelineItem::new("first", Some(day(5))),
            TimelineItem::new("second", Some(day(5))),
            TimelineItem::new("undated", None),
        ];
        let ys: Vec<f64> = positions(&items, PositionMode::Alternate)
            .iter()
            .map(|p| p.y)
            .collect();
        // undated sorts first (above), then first (below), second (above)
        assert_eq!(ys, vec![100.0, -100.0, -100.0]);
        assert_eq!(
            positions(&items, PositionMode::Alternate),
            positions(&items, PositionMode::Alternate)
        );
    }

    #[test]
    fn degenerate_range_centers_everything() {
        let items = vec![
            TimelineItem::new("a", Some(day(1))),
            TimelineItem::new("b", None),
        ];
        let range = DateRange::new(day(3), day(3));
        let mapped = map_items(&items, &range, PositionMode::Below, &LayoutConfig::default());
        for m in mapped {
            assert_eq!(m.position.x, 50.0);
            assert!(!m.position.y.is_nan());
        }
    }
}
