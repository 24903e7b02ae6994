mod common;

use common::{two_player_match, AWAY_PLAYER, HOME_PLAYER};
use gridbowl_core::dice::ScriptedDice;
use gridbowl_core::model::action::Action;
use gridbowl_core::model::ball::Ball;
use gridbowl_core::model::enums::{ActionOutcome, Phase, PlayerStatus, Side, Weather};
use gridbowl_core::model::event::GameEvent;
use gridbowl_core::model::player::PlayerId;
use gridbowl_core::model::position::Square;
use gridbowl_core::model::skills::Skill;
use gridbowl_core::rules::resolve;

#[test]
fn test_simple_move() {
    // Player at (10,7), MA 6, no tacklezones: one step east needs no dice.
    let state = two_player_match((10, 7), (20, 12), None);
    let mut dice = ScriptedDice::new(&[]);
    let action = Action::Move {
        player_id: HOME_PLAYER,
        x: 11,
        y: 7,
    };
    let resolution = resolve(&state, &action, &mut dice).unwrap();
    assert_eq!(resolution.outcome, ActionOutcome::Success);
    let player = resolution.state.player(HOME_PLAYER).unwrap();
    assert_eq!(player.position, Some(Square::new(11, 7)));
    assert_eq!(player.flags.movement_remaining, 5);
    assert!(!resolution
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::Dodge { .. })));
    resolution.state.check_invariants().unwrap();
}

#[test]
fn test_dodge_failure_turnover() {
    // Enemy at (9,7) marks the mover; AG 3 needs 4+. Dodge 2 fails,
    // armour 3+3 holds: prone at the destination, turnover.
    let state = two_player_match((10, 7), (9, 7), None);
    let mut dice = ScriptedDice::new(&[2, 3, 3]);
    let action = Action::Move {
        player_id: HOME_PLAYER,
        x: 11,
        y: 7,
    };
    let resolution = resolve(&state, &action, &mut dice).unwrap();
    assert_eq!(resolution.outcome, ActionOutcome::Turnover);
    let player = resolution.state.player(HOME_PLAYER).unwrap();
    assert_eq!(player.status, PlayerStatus::Prone);
    assert!(resolution
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::Dodge { success: false, .. })));
    assert!(resolution
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::PlayerFell { .. })));
    assert!(resolution
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::Turnover { .. })));
    // The turn moved on.
    assert_eq!(resolution.state.active_team, Some(Side::Away));
}

#[test]
fn test_touchdown_on_carry_in() {
    // Carrier one step from the endzone walks in and scores.
    let mut state = two_player_match((24, 7), (3, 3), None);
    state.ball = Ball::Carried(HOME_PLAYER);
    let mut dice = ScriptedDice::new(&[]);
    let action = Action::Move {
        player_id: HOME_PLAYER,
        x: 25,
        y: 7,
    };
    let resolution = resolve(&state, &action, &mut dice).unwrap();
    assert_eq!(resolution.state.home.score, 1);
    assert_eq!(resolution.state.phase, Phase::Touchdown);
    // Ball stays with the scorer until the drive reset runs.
    assert_eq!(resolution.state.ball, Ball::Carried(HOME_PLAYER));
    assert!(resolution
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::Touchdown { side: Side::Home, .. })));
}

#[test]
fn test_block_two_dice_armour_broken() {
    // ST 4 attacker with Block against ST 3 AV 7: two dice, attacker
    // chooses. Dice [6, 3]: defender down. Armour 5+4 = 9 breaks AV 7,
    // injury 3+3 = 6: stunned.
    let mut state = two_player_match((10, 7), (11, 7), None);
    {
        let attacker = state.player_mut(HOME_PLAYER).unwrap();
        attacker.st = 4;
        attacker.skills.add(Skill::Block);
    }
    state.player_mut(AWAY_PLAYER).unwrap().av = 7;
    let mut dice = ScriptedDice::new(&[6, 3, 5, 4, 3, 3]);
    let action = Action::Block {
        attacker_id: HOME_PLAYER,
        target_id: AWAY_PLAYER,
    };
    let resolution = resolve(&state, &action, &mut dice).unwrap();
    assert_eq!(resolution.outcome, ActionOutcome::Success);
    let defender = resolution.state.player(AWAY_PLAYER).unwrap();
    assert_eq!(defender.status, PlayerStatus::Stunned);
    // Pushed one square back off his original cell.
    assert_ne!(defender.position, Some(Square::new(11, 7)));
    // Attacker followed up.
    assert_eq!(
        resolution.state.player(HOME_PLAYER).unwrap().position,
        Some(Square::new(11, 7))
    );
    assert!(!resolution.state.turnover_pending);
    assert_eq!(resolution.state.active_team, Some(Side::Home));
}

#[test]
fn test_pickup_under_pouring_rain() {
    // Weather pouring rain, AG 3, no zones: target clamp(2,6,7-3+1) = 5.
    // Roll 4 fails; the ball bounces and the action is a turnover.
    let mut state = two_player_match((10, 7), (20, 12), Some((11, 7)));
    state.weather = Weather::PouringRain;
    let mut dice = ScriptedDice::new(&[4, 3]);
    let action = Action::Move {
        player_id: HOME_PLAYER,
        x: 11,
        y: 7,
    };
    let resolution = resolve(&state, &action, &mut dice).unwrap();
    assert_eq!(resolution.outcome, ActionOutcome::Turnover);
    assert!(resolution.events.iter().any(|e| matches!(
        e,
        GameEvent::Pickup {
            target: 5,
            success: false,
            ..
        }
    )));
    assert!(resolution
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::BallBounce { .. })));
    assert!(resolution
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::Turnover { .. })));
    assert_eq!(
        resolution.state.ball,
        Ball::OnGround(Square::new(12, 7))
    );
}

#[test]
fn test_resolution_leaves_input_untouched() {
    let state = two_player_match((10, 7), (9, 7), None);
    let snapshot = state.clone();
    let mut dice = ScriptedDice::new(&[2, 3, 3]);
    let action = Action::Move {
        player_id: HOME_PLAYER,
        x: 11,
        y: 7,
    };
    let _ = resolve(&state, &action, &mut dice).unwrap();
    assert_eq!(state, snapshot);
}

#[test]
fn test_invariants_hold_across_resolutions() {
    let mut state = two_player_match((10, 7), (11, 8), Some((12, 7)));
    // Dodge clear of the marker, then muff the pickup in his zone; every
    // intermediate result must satisfy the structural invariants.
    let mut dice = ScriptedDice::new(&[5, 4, 4]);
    let action = Action::Move {
        player_id: HOME_PLAYER,
        x: 12,
        y: 7,
    };
    let resolution = resolve(&state, &action, &mut dice).unwrap();
    resolution.state.check_invariants().unwrap();
    state = resolution.state;
    let mut dice = ScriptedDice::new(&[]);
    let resolution = resolve(&state, &Action::EndTurn, &mut dice).unwrap();
    resolution.state.check_invariants().unwrap();
}

#[test]
fn test_movement_floor_respected() {
    let state = two_player_match((10, 7), (20, 12), None);
    // Full sprint: MA 6 plus both GFI squares, all passing on 2+.
    let mut dice = ScriptedDice::new(&[2, 2]);
    let action = Action::Move {
        player_id: HOME_PLAYER,
        x: 18,
        y: 7,
    };
    let resolution = resolve(&state, &action, &mut dice).unwrap();
    let player = resolution.state.player(HOME_PLAYER).unwrap();
    assert_eq!(player.position, Some(Square::new(18, 7)));
    assert_eq!(player.flags.movement_remaining, -2);
    assert!(player.flags.movement_remaining >= -3);
}

#[test]
fn test_stunned_player_cannot_act() {
    let mut state = two_player_match((10, 7), (20, 12), None);
    state.player_mut(PlayerId(1)).unwrap().status = PlayerStatus::Stunned;
    let mut dice = ScriptedDice::new(&[]);
    let action = Action::Move {
        player_id: HOME_PLAYER,
        x: 11,
        y: 7,
    };
    assert!(resolve(&state, &action, &mut dice).is_err());
}
