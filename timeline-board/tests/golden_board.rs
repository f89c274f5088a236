use std::fs;

use serde_json::{json, Value};
use timeline_board::{load_board_str, parse_settings_value, BoardMapping};
use timeline_core::{LayoutConfig, LayoutRequest, PositionMode, TimelineLayout};

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn mapping() -> BoardMapping {
    BoardMapping {
        date_column: "date4".to_string(),
        offset_column: Some("numbers".to_string()),
    }
}

#[test]
fn launch_plan_board_matches_golden() {
    let payload = fs::read_to_string(fixture_path("launch_plan_board.json"))
        .expect("Could not read board fixture");

    let snapshot = load_board_str(&payload, &mapping()).expect("Could not load board");
    let actual = serde_json::to_value(snapshot).expect("Could not serialize snapshot");

    let expected = fs::read_to_string(fixture_path("launch_plan_snapshot.json"))
        .expect("Could not read golden snapshot");
    let expected: Value = serde_json::from_str(&expected).expect("Golden is not valid JSON");

    assert_eq!(actual, expected);
}

#[test]
fn launch_plan_board_lays_out() {
    let payload = fs::read_to_string(fixture_path("launch_plan_board.json"))
        .expect("Could not read board fixture");
    let snapshot = load_board_str(&payload, &mapping()).expect("Could not load board");

    let settings = parse_settings_value(&json!({
        "positionMode": "above",
        "scale": "weeks",
        "startDate": "2024-01-01",
        "endDate": "2024-01-29"
    }));
    let request = LayoutRequest {
        items: snapshot.items,
        settings,
        custom_y_delta: snapshot.custom_y_delta,
    };
    let layout = TimelineLayout::build(&request, &LayoutConfig::default());

    assert_eq!(layout.position_mode, PositionMode::Above);
    assert_eq!(layout.items.len(), 3);
    assert_eq!(layout.markers.len(), 5);

    let kickoff = layout.item("101").expect("kickoff missing");
    assert_eq!(kickoff.render_position.y, -100.0);
    assert!(!kickoff.is_custom_position);

    let review = layout.item("102").expect("review missing");
    assert_eq!(review.render_position.y, -50.0);
    assert!(review.is_custom_position);

    // undated items stay on the timeline at the start edge
    let beta = layout.item("103").expect("beta missing");
    assert_eq!(beta.render_position.x, 0.0);
    assert_eq!(beta.render_position.y, -120.5);
}
