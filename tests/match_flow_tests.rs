use gridbowl_core::ai::policy::{ActionPolicy, RandomPolicy};
use gridbowl_core::dice::SeededDice;
use gridbowl_core::model::enums::{Phase, Side};
use gridbowl_core::model::event::GameEvent;
use gridbowl_core::model::game::GameState;
use gridbowl_core::model::roster::{build_match, Roster};
use gridbowl_core::rules;

/// Drive a match with a random policy and seeded dice, collecting every
/// event. Bounded by a decision cap so a bug cannot hang the suite.
fn play_match(seed: u64, max_decisions: usize) -> (GameState, Vec<GameEvent>) {
    let mut dice = SeededDice::new(seed);
    let mut policy = RandomPolicy::new(seed ^ 0xabcd);
    let mut state = build_match("Reavers", &Roster::human(), "Raiders", &Roster::orc());
    // Pin the random match id so two runs compare equal structurally.
    state.match_id = uuid::Uuid::nil();
    let mut log = Vec::new();

    let resolution = rules::start_game(&state, &mut dice).unwrap();
    log.extend(resolution.events);
    state = resolution.state;

    for _ in 0..max_decisions {
        if state.is_game_over() {
            break;
        }
        let resolution = match state.phase {
            Phase::Touchdown | Phase::HalfTime => {
                rules::next_drive(&state, &mut dice).unwrap()
            }
            Phase::Setup | Phase::Play => {
                let action = policy.choose(&state).unwrap();
                rules::resolve(&state, &action, &mut dice).unwrap()
            }
            other => panic!("match loop stuck in phase {other:?}"),
        };
        resolution
            .state
            .check_invariants()
            .unwrap_or_else(|e| panic!("invariant broken: {e}"));
        log.extend(resolution.events);
        state = resolution.state;
    }
    (state, log)
}

#[test]
fn test_seeded_match_is_deterministic() {
    let (state_a, log_a) = play_match(2024, 600);
    let (state_b, log_b) = play_match(2024, 600);
    assert_eq!(state_a, state_b);
    let json_a = serde_json::to_string(&log_a).unwrap();
    let json_b = serde_json::to_string(&log_b).unwrap();
    assert_eq!(json_a, json_b, "event logs must be byte-identical");
}

#[test]
fn test_different_seeds_diverge() {
    let (_, log_a) = play_match(1, 300);
    let (_, log_b) = play_match(2, 300);
    let json_a = serde_json::to_string(&log_a).unwrap();
    let json_b = serde_json::to_string(&log_b).unwrap();
    assert_ne!(json_a, json_b);
}

#[test]
fn test_match_reaches_play_and_turns_alternate() {
    let mut dice = SeededDice::new(77);
    let mut policy = RandomPolicy::new(78);
    let mut state = build_match("Reavers", &Roster::human(), "Raiders", &Roster::human());
    state = rules::start_game(&state, &mut dice).unwrap().state;
    assert_eq!(state.phase, Phase::Setup);

    // Two setups take the match into play.
    for _ in 0..2 {
        let action = policy.choose(&state).unwrap();
        state = rules::resolve(&state, &action, &mut dice).unwrap().state;
    }
    assert_eq!(state.phase, Phase::Play);
    let receiving = state.active_team.unwrap();
    assert_eq!(Some(receiving.opponent()), state.kicking_team);
    assert_eq!(state.team(receiving).turn_number, 1);

    // Both sides field eleven players.
    for side in [Side::Home, Side::Away] {
        let fielded = state.players_of(side).filter(|p| p.is_on_pitch()).count();
        assert_eq!(fielded, 11);
    }
    state.check_invariants().unwrap();
}

#[test]
fn test_turn_counters_never_exceed_eight() {
    let (state, _) = play_match(99, 1500);
    assert!(state.home.turn_number <= 8);
    assert!(state.away.turn_number <= 8);
}

#[test]
fn test_long_match_emits_closing_events() {
    let (state, log) = play_match(5, 4000);
    // With 4000 decisions a random-vs-random match always finishes.
    assert!(state.is_game_over());
    assert!(log.iter().any(|e| matches!(e, GameEvent::HalfTime)));
    assert!(log.iter().any(|e| matches!(e, GameEvent::GameOver { .. })));
}
