//! Axis tick marks at calendar boundaries.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LayoutConfig;
use crate::model::{DateLabelPosition, DateRange, LabelSide, Scale};

/// One tick on the axis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScaleMarker {
    /// Percent of the axis width, `0..=100`.
    pub position: f64,
    pub label: String,
    pub date: DateTime<Utc>,
    pub label_side: LabelSide,
}

/// Build the tick marks for `range` at the requested granularity.
///
/// The first marker is the start of the period containing `range.start`, so it
/// may sit before the range and is clamped to position 0. When the requested
/// granularity would produce more than `config.max_markers` ticks, coarser
/// ones are used instead, ending with multi-year strides.
pub fn generate_markers(
    range: &DateRange,
    scale: Scale,
    label_position: DateLabelPosition,
    config: &LayoutConfig,
) -> Vec<ScaleMarker> {
    if scale == Scale::None || config.max_markers == 0 {
        return Vec::new();
    }

    let label_side = match label_position {
        DateLabelPosition::Top => LabelSide::Below,
        DateLabelPosition::Bottom => LabelSide::Above,
    };

    if range.is_degenerate() {
        return vec![ScaleMarker {
            position: 50.0,
            label: format_label(range.start, scale),
            date: range.start,
            label_side,
        }];
    }

    let mut current = scale;
    loop {
        if let Some(markers) = collect(range, current, 1, label_side, config.max_markers) {
            if current != scale {
                debug!(requested = ?scale, used = ?current, "coarsened scale to cap marker count");
            }
            return markers;
        }
        match current.coarser() {
            Some(next) => current = next,
            None => break,
        }
    }

    let years = (range.end.year() - range.start.year() + 1).max(1) as usize;
    let stride = years.div_ceil(config.max_markers).max(1) as u32;
    debug!(years, stride, "striding yearly markers");
    collect(range, Scale::Years, stride, label_side, config.max_markers).unwrap_or_default()
}

/// Walk period boundaries, giving up once more than `limit` markers appear.
fn collect(
    range: &DateRange,
    scale: Scale,
    stride: u32,
    label_side: LabelSide,
    limit: usize,
) -> Option<Vec<ScaleMarker>> {
    let mut markers = Vec::new();
    let mut cursor = Some(period_start(range.start, scale));

    while let Some(date) = cursor {
        if date > range.end {
            break;
        }
        if markers.len() == limit {
            return None;
        }
        markers.push(ScaleMarker {
            position: range.percent_of(date),
            label: format_label(date, scale),
            date,
            label_side,
        });
        cursor = advance(date, scale, stride);
    }

    Some(markers)
}

fn period_start(date: DateTime<Utc>, scale: Scale) -> DateTime<Utc> {
    let day = date.date_naive();
    let start = match scale {
        Scale::None | Scale::Days => Some(day),
        Scale::Weeks => Some(day - Duration::days(i64::from(day.weekday().num_days_from_monday()))),
        Scale::Months => NaiveDate::from_ymd_opt(day.year(), day.month(), 1),
        Scale::Quarters => NaiveDate::from_ymd_opt(day.year(), (day.month0() / 3) * 3 + 1, 1),
        Scale::Years => NaiveDate::from_ymd_opt(day.year(), 1, 1),
    };
    start.unwrap_or(day).and_time(NaiveTime::MIN).and_utc()
}

fn advance(date: DateTime<Utc>, scale: Scale, stride: u32) -> Option<DateTime<Utc>> {
    match scale {
        Scale::None | Scale::Days => date.checked_add_signed(Duration::days(i64::from(stride))),
        Scale::Weeks => date.checked_add_signed(Duration::weeks(i64::from(stride))),
        Scale::Months => date.checked_add_months(Months::new(stride)),
        Scale::Quarters => date.checked_add_months(Months::new(3 * stride)),
        Scale::Years => date.checked_add_months(Months::new(12 * stride)),
    }
}

fn format_label(date: DateTime<Utc>, scale: Scale) -> String {
    match scale {
        Scale::None | Scale::Days | Scale::Weeks => date.format("%b %d").to_string(),
        Scale::Months => date.format("%b %Y").to_string(),
        Scale::Quarters => format!("Q{} {}", date.month0() / 3 + 1, date.year()),
        Scale::Years => date.format("%Y").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn markers(range: DateRange, scale: Scale) -> Vec<ScaleMarker> {
        generate_markers(
            &range,
            scale,
            DateLabelPosition::Bottom,
            &LayoutConfig::default(),
        )
    }

    #[test]
    fn none_scale_is_empty() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 12, 31));
        assert!(markers(range, Scale::None).is_empty());
    }

    #[test]
    fn four_weeks_give_five_markers() {
        // 2024-01-01 is a Monday.
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 29));
        let result = markers(range, Scale::Weeks);
        assert_eq!(result.len(), 5);
        assert_eq!(result[0].position, 0.0);
        assert_eq!(result[4].position, 100.0);
        assert_eq!(result[1].label, "Jan 08");
    }

    #[test]
    fn first_marker_may_precede_start() {
        let range = DateRange::new(date(2024, 1, 17), date(2024, 4, 10));
        let result = markers(range, Scale::Months);
        let labels: Vec<&str> = result.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["Jan 2024", "Feb 2024", "Mar 2024", "Apr 2024"]);
        assert_eq!(result[0].date, date(2024, 1, 1));
        assert_eq!(result[0].position, 0.0);
        assert!(result.windows(2).all(|w| w[0].position <= w[1].position));
    }

    #[test]
    fn quarters_are_labelled() {
        let range = DateRange::new(date(2023, 11, 5), date(2024, 7, 1));
        let labels: Vec<String> = markers(range, Scale::Quarters)
            .into_iter()
            .map(|m| m.label)
            .collect();
        assert_eq!(labels, vec!["Q4 2023", "Q1 2024", "Q2 2024", "Q3 2024"]);
    }

    #[test]
    fn long_ranges_are_coarsened_under_the_cap() {
        let range = DateRange::new(date(2010, 1, 1), date(2024, 1, 1));
        let result = markers(range, Scale::Days);
        assert!(!result.is_empty());
        assert!(result.len() <= LayoutConfig::default().max_markers);
        assert_eq!(result[0].label, "Q1 2010");
    }

    #[test]
    fn huge_ranges_stride_years() {
        let range = DateRange::new(date(1000, 1, 1), date(2500, 1, 1));
        let result = markers(range, Scale::Years);
        assert!(result.len() <= LayoutConfig::default().max_markers);
        assert!(result.len() > 1);
    }

    #[test]
    fn labels_flip_opposite_item_dates() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 3));
        let cfg = LayoutConfig::default();
        let top = generate_markers(&range, Scale::Days, DateLabelPosition::Top, &cfg);
        let bottom = generate_markers(&range, Scale::Days, DateLabelPosition::Bottom, &cfg);
        assert!(top.iter().all(|m| m.label_side == LabelSide::Below));
        assert!(bottom.iter().all(|m| m.label_side == LabelSide::Above));
    }

    #[test]
    fn degenerate_range_yields_single_centered_marker() {
        let range = DateRange::new(date(2024, 5, 5), date(2024, 5, 5));
        let result = markers(range, Scale::Weeks);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].position, 50.0);
    }
}
