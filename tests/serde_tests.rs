mod common;

use common::{two_player_match, HOME_PLAYER};
use gridbowl_core::dice::ScriptedDice;
use gridbowl_core::model::action::Action;
use gridbowl_core::model::ball::Ball;
use gridbowl_core::model::game::GameState;
use gridbowl_core::model::roster::{build_match, Roster};
use gridbowl_core::rules::resolve;

#[test]
fn test_fresh_match_round_trips() {
    let state = build_match("Reavers", &Roster::human(), "Raiders", &Roster::orc());
    let json = state.to_json().unwrap();
    let back = GameState::from_json(&json).unwrap();
    assert_eq!(state, back);
}

#[test]
fn test_mid_game_state_round_trips() {
    let state = two_player_match((10, 7), (9, 7), Some((12, 7)));
    let mut dice = ScriptedDice::new(&[5, 3, 3]);
    let action = Action::Move {
        player_id: HOME_PLAYER,
        x: 11,
        y: 7,
    };
    let resolution = resolve(&state, &action, &mut dice).unwrap();
    let json = resolution.state.to_json().unwrap();
    let back = GameState::from_json(&json).unwrap();
    assert_eq!(resolution.state, back);
}

#[test]
fn test_enums_serialise_snake_case() {
    let mut state = two_player_match((10, 7), (9, 7), None);
    state.ball = Ball::Carried(HOME_PLAYER);
    let json = state.to_json().unwrap();
    assert!(json.contains("\"phase\":\"play\""));
    assert!(json.contains("\"weather\":\"nice\""));
    assert!(json.contains("\"state\":\"carried\""));
}

#[test]
fn test_positions_serialise_as_xy_objects() {
    let state = two_player_match((10, 7), (9, 7), Some((3, 4)));
    let json = state.to_json().unwrap();
    assert!(json.contains("\"x\":10"));
    assert!(json.contains("{\"x\":3,\"y\":4}"));
}

#[test]
fn test_players_keyed_by_id() {
    let state = two_player_match((10, 7), (9, 7), None);
    let value: serde_json::Value = serde_json::from_str(&state.to_json().unwrap()).unwrap();
    let players = value.get("players").unwrap().as_object().unwrap();
    assert!(players.contains_key("1"));
    assert!(players.contains_key("12"));
    assert_eq!(players.len(), 2);
}

#[test]
fn test_unknown_fields_ignored() {
    let state = two_player_match((10, 7), (9, 7), None);
    let mut value: serde_json::Value =
        serde_json::from_str(&state.to_json().unwrap()).unwrap();
    value
        .as_object_mut()
        .unwrap()
        .insert("future_field".to_string(), serde_json::json!({"a": 1}));
    let back = GameState::from_json(&value.to_string()).unwrap();
    assert_eq!(state, back);
}

#[test]
fn test_missing_optional_fields_default() {
    let state = two_player_match((10, 7), (9, 7), None);
    let mut value: serde_json::Value =
        serde_json::from_str(&state.to_json().unwrap()).unwrap();
    let object = value.as_object_mut().unwrap();
    object.remove("turnover_pending");
    object.remove("weather");
    object.remove("pending_kick_target");
    let back = GameState::from_json(&value.to_string()).unwrap();
    assert_eq!(state, back);
}

#[test]
fn test_event_log_serialises_with_type_and_data() {
    let state = two_player_match((10, 7), (9, 7), None);
    let mut dice = ScriptedDice::new(&[2, 3, 3]);
    let action = Action::Move {
        player_id: HOME_PLAYER,
        x: 11,
        y: 7,
    };
    let resolution = resolve(&state, &action, &mut dice).unwrap();
    let json = serde_json::to_string(&resolution.events).unwrap();
    assert!(json.contains("\"type\":\"dodge\""));
    assert!(json.contains("\"type\":\"player_fell\""));
    assert!(json.contains("\"type\":\"turnover\""));
    // Round-trip the whole log.
    let back: Vec<gridbowl_core::model::event::GameEvent> =
        serde_json::from_str(&json).unwrap();
    assert_eq!(resolution.events, back);
}
