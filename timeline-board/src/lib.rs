//! Board JSON to timeline input converter.
//!
//! Reads the item page returned by the board API (items, their date column and
//! the numeric column that stores each item's vertical offset), host settings
//! payloads, and builds the update payload that persists one offset.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use timeline_core::{
    CustomYDelta, DateLabelPosition, ItemReference, PositionMode, Scale, TimelineError,
    TimelineItem, TimelineSettings,
};
use tracing::{debug, warn};

/// Mutation used to persist a single offset column value.
pub const OFFSET_MUTATION: &str = "mutation ($boardId: ID!, $itemId: ID!, $columnId: String!, $value: String!) { change_simple_column_value(board_id: $boardId, item_id: $itemId, column_id: $columnId, value: $value) { id } }";

/// Which board columns feed the timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardMapping {
    pub date_column: String,
    /// Numeric column holding the per-item vertical offset, if configured.
    #[serde(default)]
    pub offset_column: Option<String>,
}

impl Default for BoardMapping {
    fn default() -> Self {
        Self {
            date_column: "date".to_string(),
            offset_column: None,
        }
    }
}

/// Items and stored offsets read from one board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BoardSnapshot {
    pub board_id: Option<String>,
    pub board_name: Option<String>,
    pub items: Vec<TimelineItem>,
    pub custom_y_delta: CustomYDelta,
}

/// Parse a board payload from a JSON string.
pub fn load_board_str(
    json: &str,
    mapping: &BoardMapping,
) -> Result<BoardSnapshot, TimelineError> {
    let value: Value =
        serde_json::from_str(json).map_err(|err| TimelineError::Parse(err.to_string()))?;
    load_board_value(&value, mapping)
}

/// Parse a board payload from a `serde_json::Value`.
///
/// Accepts the full API response (`data.boards[0].items_page.items`), a
/// single board object, or a bare item array.
pub fn load_board_value(
    payload: &Value,
    mapping: &BoardMapping,
) -> Result<BoardSnapshot, TimelineError> {
    if let Some(errors) = payload.get("errors").and_then(Value::as_array) {
        if let Some(message) = errors
            .iter()
            .find_map(|err| err.get("message").and_then(Value::as_str))
        {
            return Err(TimelineError::Parse(format!("Board API error: {message}")));
        }
    }

    let board = payload
        .get("data")
        .and_then(|data| data.get("boards"))
        .and_then(Value::as_array)
        .and_then(|boards| boards.first())
        .or_else(|| payload.get("items_page").map(|_| payload));

    let entries = match board {
        Some(board) => board
            .get("items_page")
            .and_then(|page| page.get("items"))
            .and_then(Value::as_array),
        None => payload.as_array(),
    }
    .ok_or(TimelineError::MissingData)?;

    let board_id = board.and_then(|b| string_field(b, "id"));
    let board_name = board.and_then(|b| string_field(b, "name"));

    let mut snapshot = BoardSnapshot {
        board_id: board_id.clone(),
        board_name,
        ..BoardSnapshot::default()
    };

    for entry in entries {
        let Some(id) = string_field(entry, "id") else {
            warn!("board item without id skipped");
            continue;
        };

        let date = find_column(entry, &mapping.date_column).and_then(column_date);
        if date.is_none() {
            debug!(item = %id, column = %mapping.date_column, "item date missing or invalid");
        }

        if let Some(column) = mapping.offset_column.as_deref() {
            if let Some(offset) = find_column(entry, column).and_then(column_number) {
                snapshot.custom_y_delta.insert(id.clone(), offset);
            }
        }

        snapshot.items.push(TimelineItem {
            id: id.clone(),
            name: string_field(entry, "name").unwrap_or_default(),
            date,
            source: Some(ItemReference {
                board_id: board_id.clone(),
                item_id: id,
                group: entry
                    .get("group")
                    .and_then(|group| string_field(group, "title")),
            }),
        });
    }

    Ok(snapshot)
}

/// Read host settings, falling back to defaults for anything unknown.
///
/// Dates may be RFC 3339 timestamps or plain `YYYY-MM-DD` days.
pub fn parse_settings_value(settings: &Value) -> TimelineSettings {
    let mut parsed = TimelineSettings::default();
    if let Some(mode) = setting(settings, &["positionMode", "position_mode"]) {
        match PositionMode::parse(&mode) {
            Some(parsed_mode) => parsed.position_mode = parsed_mode,
            None => debug!(%mode, "unknown position mode, using default"),
        }
    }
    if let Some(position) = setting(settings, &["dateLabelPosition", "date_label_position"]) {
        parsed.date_label_position =
            DateLabelPosition::parse(&position).unwrap_or(parsed.date_label_position);
    }
    if let Some(scale) = setting(settings, &["scale"]) {
        parsed.scale = Scale::parse(&scale).unwrap_or(parsed.scale);
    }
    parsed.start_date =
        setting(settings, &["startDate", "start_date"]).and_then(|v| parse_date_text(&v));
    parsed.end_date =
        setting(settings, &["endDate", "end_date"]).and_then(|v| parse_date_text(&v));
    parsed
}

/// Request body that stores `delta` in the offset column. `None` clears it.
pub fn offset_update_payload(
    board_id: &str,
    item_id: &str,
    column_id: &str,
    delta: Option<f64>,
) -> Value {
    let value = delta.map(format_offset).unwrap_or_default();
    json!({
        "query": OFFSET_MUTATION,
        "variables": {
            "boardId": board_id,
            "itemId": item_id,
            "columnId": column_id,
            "value": value,
        }
    })
}

fn format_offset(delta: f64) -> String {
    let rounded = delta.round();
    if (delta - rounded).abs() < f64::EPSILON {
        format!("{rounded:.0}")
    } else {
        format!("{delta:.2}")
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn setting(settings: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| settings.get(*key).and_then(setting_text))
}

fn setting_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        // Dropdown-style settings arrive as `{ "value": "above" }`.
        Value::Object(map) => map.get("value").and_then(setting_text),
        _ => None,
    }
}

fn find_column<'a>(item: &'a Value, column_id: &str) -> Option<&'a Value> {
    item.get("column_values")?
        .as_array()?
        .iter()
        .find(|column| column.get("id").and_then(Value::as_str) == Some(column_id))
}

/// Decode the JSON string stored in a column's `value` field.
fn column_value(column: &Value) -> Option<Value> {
    match column.get("value")? {
        Value::String(raw) => serde_json::from_str(raw).ok(),
        Value::Null => None,
        other => Some(other.clone()),
    }
}

fn column_date(column: &Value) -> Option<DateTime<Utc>> {
    if let Some(value) = column_value(column) {
        if let Some(day) = value.get("date").and_then(Value::as_str) {
            let time = value.get("time").and_then(Value::as_str);
            if let Some(dt) = combine_date_time(day, time) {
                return Some(dt);
            }
        }
    }

    column
        .get("text")
        .and_then(Value::as_str)
        .and_then(parse_date_text)
}

fn column_number(column: &Value) -> Option<f64> {
    let from_text = column
        .get("text")
        .and_then(Value::as_str)
        .and_then(|text| text.trim().parse::<f64>().ok());

    let number = from_text.or_else(|| match column_value(column)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    })?;

    number.is_finite().then_some(number)
}

fn combine_date_time(day: &str, time: Option<&str>) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(day.trim(), "%Y-%m-%d").ok()?;
    let time = time
        .and_then(|t| NaiveTime::parse_from_str(t.trim(), "%H:%M:%S").ok())
        .unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time).and_utc())
}

fn parse_date_text(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
                .ok()
                .map(|dt| dt.and_utc())
        })
        .or_else(|| combine_date_time(value, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn mapping() -> BoardMapping {
        BoardMapping {
            date_column: "date4".to_string(),
            offset_column: Some("offset".to_string()),
        }
    }

    #[test]
    fn bare_item_array_is_accepted() {
        let payload = json!([
            { "id": "7", "name": "Launch", "column_values": [
                { "id": "date4", "text": "2024-03-02", "value": null }
            ]}
        ]);
        let snapshot = load_board_value(&payload, &mapping()).unwrap();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(
            snapshot.items[0].date,
            Some(Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap())
        );
        assert!(snapshot.board_id.is_none());
    }

    #[test]
    fn invalid_dates_keep_the_item() {
        let payload = json!([
            { "id": "1", "column_values": [ { "id": "date4", "text": "soon", "value": "{\"date\":\"not-a-date\"}" } ] },
            { "id": "2", "column_values": [] }
        ]);
        let snapshot = load_board_value(&payload, &mapping()).unwrap();
        assert_eq!(snapshot.items.len(), 2);
        assert!(snapshot.items.iter().all(|item| item.date.is_none()));
    }

    #[test]
    fn blank_offsets_are_not_custom() {
        let payload = json!([
            { "id": "1", "column_values": [ { "id": "offset", "text": "", "value": null } ] },
            { "id": "2", "column_values": [ { "id": "offset", "text": "0", "value": "\"0\"" } ] },
            { "id": "3", "column_values": [ { "id": "offset", "text": null, "value": "\"-12.5\"" } ] }
        ]);
        let snapshot = load_board_value(&payload, &mapping()).unwrap();
        assert!(!snapshot.custom_y_delta.contains("1"));
        assert_eq!(snapshot.custom_y_delta.get("2"), Some(0.0));
        assert_eq!(snapshot.custom_y_delta.get("3"), Some(-12.5));
    }

    #[test]
    fn api_errors_are_reported() {
        let payload = json!({ "errors": [ { "message": "Not authenticated" } ] });
        let err = load_board_value(&payload, &mapping()).unwrap_err();
        assert_eq!(
            err,
            TimelineError::Parse("Board API error: Not authenticated".to_string())
        );
    }

    #[test]
    fn missing_items_is_missing_data() {
        let err = load_board_value(&json!({ "data": {} }), &mapping()).unwrap_err();
        assert_eq!(err, TimelineError::MissingData);
    }

    #[test]
    fn settings_accept_host_keys_and_dropdowns() {
        let settings = parse_settings_value(&json!({
            "positionMode": { "value": "alternate" },
            "dateLabelPosition": "top",
            "scale": "monthly",
            "startDate": "2024-01-01",
            "endDate": "2024-06-30T12:00:00Z"
        }));
        assert_eq!(settings.position_mode, PositionMode::Alternate);
        assert_eq!(settings.date_label_position, DateLabelPosition::Top);
        assert_eq!(settings.scale, Scale::Months);
        assert_eq!(
            settings.start_date,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            settings.end_date,
            Some(Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn unknown_settings_fall_back() {
        let settings = parse_settings_value(&json!({ "positionMode": "diagonal", "scale": 3 }));
        assert_eq!(settings, TimelineSettings::default());
    }

    #[test]
    fn offset_payload_formats_value() {
        let payload = offset_update_payload("10", "20", "offset", Some(42.0));
        assert_eq!(payload["variables"]["value"], "42");
        assert_eq!(payload["variables"]["itemId"], "20");

        let fractional = offset_update_payload("10", "20", "offset", Some(-7.25));
        assert_eq!(fractional["variables"]["value"], "-7.25");

        let cleared = offset_update_payload("10", "20", "offset", None);
        assert_eq!(cleared["variables"]["value"], "");
    }
}
