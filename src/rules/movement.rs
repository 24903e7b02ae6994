use crate::dice::DiceSource;
use crate::model::constants::{
    GFI_TARGET_BLIZZARD, GFI_TARGET_NORMAL, LEAP_COST, STAND_UP_COST,
};
use crate::model::enums::{ActionOutcome, PlayerStatus, Weather};
use crate::model::event::GameEvent;
use crate::model::game::GameState;
use crate::model::player::PlayerId;
use crate::model::position::Square;
use crate::model::skills::Skill;
use crate::pathfinding::{Path, Pathfinder};

use super::injury::{knock_down, InjuryContext};
use super::turn::{roll_with_cascade, RollSpec};

/// Move a player onto `cell` and knock him down there. Used for failed
/// dodges, GFIs and leaps, which all end with the mover on the target cell.
fn fall_at(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    player_id: PlayerId,
    cell: Square,
) -> Result<(), String> {
    let player = state
        .player_mut(player_id)
        .ok_or_else(|| format!("fall for unknown {player_id}"))?;
    player.position = Some(cell);
    knock_down(state, events, dice, player_id, &InjuryContext::default())
}

/// Resolve the Move action: walk the planned path, rolling whatever each
/// step demands. A failed roll drops the mover at the step's destination
/// and ends the team's turn.
pub fn resolve_move(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    player_id: PlayerId,
    to: Square,
) -> Result<ActionOutcome, String> {
    let player = state
        .player(player_id)
        .ok_or_else(|| format!("move by unknown {player_id}"))?;
    let start = player.position.ok_or("move by off-pitch player")?;

    if player.status == PlayerStatus::Prone {
        let player = state.player_mut(player_id).expect("player vanished");
        player.status = PlayerStatus::Standing;
        player.flags.movement_remaining -= STAND_UP_COST;
        player.flags.has_moved = true;
    }

    if to == start {
        // Standing up (or staying put) is a complete move.
        return Ok(ActionOutcome::Success);
    }

    let path = {
        let player = state.player(player_id).expect("player vanished");
        let finder = Pathfinder::new(state, player)?;
        finder
            .find_path_to(to)
            .ok_or_else(|| format!("no route from {start:?} to {to:?}"))?
    };

    walk_path(state, events, dice, player_id, &path)?;

    // The walk may have ended early (turnover, tentacles, touchdown); the
    // outcome reflects what the walk left behind.
    if state.turnover_pending {
        return Ok(ActionOutcome::Turnover);
    }
    state
        .player_mut(player_id)
        .expect("player vanished")
        .flags
        .has_moved = true;
    Ok(ActionOutcome::Success)
}

/// Walk an annotated path step by step. Returns early on anything that ends
/// the action; `turnover_pending` signals how it ended.
pub fn walk_path(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    player_id: PlayerId,
    path: &Path,
) -> Result<(), String> {
    let side = state
        .player(player_id)
        .ok_or_else(|| format!("walk by unknown {player_id}"))?
        .side();

    for step in &path.steps {
        let from = state
            .player(player_id)
            .and_then(|p| p.position)
            .ok_or("mover lost his position mid-path")?;

        let markers: Vec<PlayerId> = state.markers_at(side, &from).iter().map(|p| p.id).collect();

        // Tentacles hold the mover in place; not a turnover.
        if !markers.is_empty() && tentacles_hold(state, events, dice, player_id, &markers)? {
            return Ok(());
        }

        if step.is_leap {
            events.push(GameEvent::SkillUsed {
                player_id,
                skill: Skill::Leap,
            });
            let spec = RollSpec {
                player_id,
                target: step.dodge_target,
                skill_reroll: None,
                skill_reroll_blocked: false,
            };
            let success =
                roll_with_cascade(state, events, dice, &spec, &mut |events, roll, success| {
                    events.push(GameEvent::Leap {
                        player_id,
                        roll,
                        target: step.dodge_target,
                        success,
                    });
                })?;
            spend_movement(state, player_id, LEAP_COST);
            if !success {
                fall_at(state, events, dice, player_id, step.square)?;
                state.turnover_pending = true;
                return Ok(());
            }
        } else if step.requires_dodge {
            let tackle_adjacent = state
                .markers_at(side, &from)
                .iter()
                .any(|p| p.has_skill(Skill::Tackle));
            let spec = RollSpec {
                player_id,
                target: step.dodge_target,
                skill_reroll: Some(Skill::Dodge),
                skill_reroll_blocked: tackle_adjacent,
            };
            let mut last_roll = 0;
            let success =
                roll_with_cascade(state, events, dice, &spec, &mut |events, roll, success| {
                    last_roll = roll;
                    events.push(GameEvent::Dodge {
                        player_id,
                        roll,
                        target: step.dodge_target,
                        success,
                    });
                })?;
            if !success {
                spend_movement(state, player_id, 1);
                fall_at(state, events, dice, player_id, step.square)?;
                state.turnover_pending = true;
                return Ok(());
            }
            // Diving Tackle: a marker throws himself down to make the dodge
            // one harder. Worth it only when it flips the result.
            if last_roll == step.dodge_target {
                let diver = state
                    .markers_at(side, &from)
                    .iter()
                    .filter(|p| p.has_skill(Skill::DivingTackle))
                    .map(|p| p.id)
                    .min();
                if let Some(diver) = diver {
                    events.push(GameEvent::DivingTackle { player_id: diver });
                    state.player_mut(diver).expect("diver vanished").status = PlayerStatus::Prone;
                    spend_movement(state, player_id, 1);
                    fall_at(state, events, dice, player_id, step.square)?;
                    state.turnover_pending = true;
                    return Ok(());
                }
            }
            spend_movement(state, player_id, 1);
        } else {
            spend_movement(state, player_id, 1);
        }

        if step.is_gfi {
            let target = if state.weather == Weather::Blizzard {
                GFI_TARGET_BLIZZARD
            } else {
                GFI_TARGET_NORMAL
            };
            let spec = RollSpec {
                player_id,
                target,
                skill_reroll: Some(Skill::SureFeet),
                skill_reroll_blocked: false,
            };
            let success =
                roll_with_cascade(state, events, dice, &spec, &mut |events, roll, success| {
                    events.push(GameEvent::Gfi {
                        player_id,
                        roll,
                        target,
                        success,
                    });
                })?;
            if !success {
                fall_at(state, events, dice, player_id, step.square)?;
                state.turnover_pending = true;
                return Ok(());
            }
        }

        // The step is made.
        events.push(GameEvent::Move {
            player_id,
            from,
            to: step.square,
        });
        state
            .player_mut(player_id)
            .expect("mover vanished")
            .position = Some(step.square);

        shadowing_follows(state, events, dice, player_id, from)?;

        // Walking onto a loose ball forces a pickup.
        if state.ball.on_ground_at() == Some(step.square) {
            let picked = super::ball::attempt_pickup(state, events, dice, player_id)?;
            if !picked {
                state.turnover_pending = true;
                return Ok(());
            }
        }

        if super::flow::check_touchdown(state, events)? {
            return Ok(());
        }
    }
    Ok(())
}

fn spend_movement(state: &mut GameState, player_id: PlayerId, cost: i8) {
    let player = state.player_mut(player_id).expect("mover vanished");
    player.flags.movement_remaining -= cost;
}

/// Opposed D6 + ST against the strongest tentacled marker. The mover loses
/// ties; being held ends the move without a turnover.
fn tentacles_hold(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    mover_id: PlayerId,
    markers: &[PlayerId],
) -> Result<bool, String> {
    let holder = markers
        .iter()
        .filter_map(|id| state.player(*id))
        .filter(|p| p.has_skill(Skill::Tentacles))
        .max_by_key(|p| (p.get_st(), std::cmp::Reverse(p.id)))
        .map(|p| (p.id, p.get_st()));
    let Some((holder_id, holder_st)) = holder else {
        return Ok(false);
    };
    let mover_st = state
        .player(mover_id)
        .ok_or("tentacled mover vanished")?
        .get_st();
    let holder_total = dice.roll_d6() + holder_st;
    let mover_total = dice.roll_d6() + mover_st;
    let held = holder_total >= mover_total;
    events.push(GameEvent::Tentacles {
        player_id: holder_id,
        mover_id,
        held,
    });
    Ok(held)
}

/// A shadowing marker may chase the mover into the vacated cell on
/// D6 + own MA - mover MA >= 6.
fn shadowing_follows(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    mover_id: PlayerId,
    vacated: Square,
) -> Result<(), String> {
    let side = state
        .player(mover_id)
        .ok_or("shadowed mover vanished")?
        .side();
    let mover_ma = state.player(mover_id).expect("mover vanished").get_ma() as i16;
    let shadower = state
        .players_of(side.opponent())
        .filter(|p| p.exerts_tacklezone())
        .filter(|p| p.has_skill(Skill::Shadowing))
        .filter(|p| p.position.is_some_and(|pos| pos.is_adjacent(&vacated)))
        .map(|p| p.id)
        .min();
    let Some(shadower_id) = shadower else {
        return Ok(());
    };
    if state.is_occupied(&vacated) {
        return Ok(());
    }
    let shadower_ma = state.player(shadower_id).expect("shadower vanished").get_ma() as i16;
    let roll = dice.roll_d6();
    let follows = roll as i16 + shadower_ma - mover_ma >= 6;
    events.push(GameEvent::Shadowing {
        player_id: shadower_id,
        mover_id,
        roll,
        follows,
    });
    if follows {
        state
            .player_mut(shadower_id)
            .expect("shadower vanished")
            .position = Some(vacated);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::model::ball::Ball;
    use crate::model::enums::Side;
    use crate::model::player::Player;
    use crate::model::team::TeamState;

    fn state_with_mover() -> GameState {
        let mut state = GameState::new(
            TeamState::new("H", "human", Side::Home, 0, false),
            TeamState::new("A", "orc", Side::Away, 0, false),
        );
        let mut player = Player {
            id: PlayerId(1),
            ma: 6,
            ag: 3,
            status: PlayerStatus::Standing,
            position: Some(Square::new(10, 7)),
            ..Default::default()
        };
        player.begin_turn();
        state.players.insert(player.id, player);
        state.active_team = Some(Side::Home);
        state
    }

    fn add_away(state: &mut GameState, id: u8, x: i32, y: i32, skills: &[Skill]) {
        let mut player = Player {
            id: PlayerId(id),
            status: PlayerStatus::Standing,
            position: Some(Square::new(x, y)),
            skills: skills.into(),
            ..Default::default()
        };
        player.begin_turn();
        state.players.insert(player.id, player);
    }

    #[test]
    fn test_simple_move_no_rolls() {
        let mut state = state_with_mover();
        let mut events = vec![];
        let mut dice = ScriptedDice::new(&[]);
        let outcome =
            resolve_move(&mut state, &mut events, &mut dice, PlayerId(1), Square::new(11, 7))
                .unwrap();
        assert_eq!(outcome, ActionOutcome::Success);
        let player = state.player(PlayerId(1)).unwrap();
        assert_eq!(player.position, Some(Square::new(11, 7)));
        assert_eq!(player.flags.movement_remaining, 5);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Dodge { .. })));
    }

    #[test]
    fn test_dodge_failure_is_turnover() {
        let mut state = state_with_mover();
        add_away(&mut state, 12, 9, 7, &[]);
        let mut events = vec![];
        // Dodge roll 2 fails (target 4), armour 3+3 holds.
        let mut dice = ScriptedDice::new(&[2, 3, 3]);
        let outcome =
            resolve_move(&mut state, &mut events, &mut dice, PlayerId(1), Square::new(11, 7))
                .unwrap();
        assert_eq!(outcome, ActionOutcome::Turnover);
        let player = state.player(PlayerId(1)).unwrap();
        assert_eq!(player.status, PlayerStatus::Prone);
        assert_eq!(player.position, Some(Square::new(11, 7)));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::Dodge { success: false, .. }
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::PlayerFell { .. })));
        assert!(state.turnover_pending);
    }

    #[test]
    fn test_stand_up_costs_three() {
        let mut state = state_with_mover();
        state.player_mut(PlayerId(1)).unwrap().status = PlayerStatus::Prone;
        let mut events = vec![];
        let mut dice = ScriptedDice::new(&[]);
        let outcome =
            resolve_move(&mut state, &mut events, &mut dice, PlayerId(1), Square::new(10, 7))
                .unwrap();
        assert_eq!(outcome, ActionOutcome::Success);
        let player = state.player(PlayerId(1)).unwrap();
        assert_eq!(player.status, PlayerStatus::Standing);
        assert_eq!(player.flags.movement_remaining, 3);
    }

    #[test]
    fn test_pickup_on_path() {
        let mut state = state_with_mover();
        state.ball = Ball::OnGround(Square::new(11, 7));
        let mut events = vec![];
        // Pickup: AG 3, no zones -> 4+; roll 4.
        let mut dice = ScriptedDice::new(&[4]);
        let outcome =
            resolve_move(&mut state, &mut events, &mut dice, PlayerId(1), Square::new(12, 7))
                .unwrap();
        assert_eq!(outcome, ActionOutcome::Success);
        assert_eq!(state.ball, Ball::Carried(PlayerId(1)));
        assert_eq!(
            state.player(PlayerId(1)).unwrap().position,
            Some(Square::new(12, 7))
        );
    }

    #[test]
    fn test_failed_pickup_turnover() {
        let mut state = state_with_mover();
        state.ball = Ball::OnGround(Square::new(11, 7));
        let mut events = vec![];
        // Pickup 3 fails, bounce east.
        let mut dice = ScriptedDice::new(&[3, 3]);
        let outcome =
            resolve_move(&mut state, &mut events, &mut dice, PlayerId(1), Square::new(12, 7))
                .unwrap();
        assert_eq!(outcome, ActionOutcome::Turnover);
        assert!(state.turnover_pending);
    }

    #[test]
    fn test_gfi_failure_falls() {
        let mut state = state_with_mover();
        state
            .player_mut(PlayerId(1))
            .unwrap()
            .flags
            .movement_remaining = 0;
        let mut events = vec![];
        // GFI roll 1 fails, armour 2+2 holds.
        let mut dice = ScriptedDice::new(&[1, 2, 2]);
        let outcome =
            resolve_move(&mut state, &mut events, &mut dice, PlayerId(1), Square::new(11, 7))
                .unwrap();
        assert_eq!(outcome, ActionOutcome::Turnover);
        assert_eq!(
            state.player(PlayerId(1)).unwrap().status,
            PlayerStatus::Prone
        );
    }

    #[test]
    fn test_tentacles_hold_ends_move_without_turnover() {
        let mut state = state_with_mover();
        add_away(&mut state, 12, 9, 7, &[Skill::Tentacles]);
        let mut events = vec![];
        // Holder d6 4 + ST 3 = 7 vs mover d6 3 + ST 3 = 6: held.
        let mut dice = ScriptedDice::new(&[4, 3]);
        let outcome =
            resolve_move(&mut state, &mut events, &mut dice, PlayerId(1), Square::new(11, 7))
                .unwrap();
        assert_eq!(outcome, ActionOutcome::Success);
        assert!(!state.turnover_pending);
        assert_eq!(
            state.player(PlayerId(1)).unwrap().position,
            Some(Square::new(10, 7))
        );
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::Tentacles { held: true, .. })));
    }

    #[test]
    fn test_shadowing_marker_follows() {
        let mut state = state_with_mover();
        // Shadower MA 8 vs mover MA 6: follows on a 4+.
        add_away(&mut state, 12, 9, 7, &[Skill::Shadowing]);
        state.player_mut(PlayerId(12)).unwrap().ma = 8;
        let mut events = vec![];
        // Dodge 5 succeeds (target 4), shadowing roll 4: 4 + 8 - 6 = 6.
        let mut dice = ScriptedDice::new(&[5, 4]);
        let outcome =
            resolve_move(&mut state, &mut events, &mut dice, PlayerId(1), Square::new(11, 7))
                .unwrap();
        assert_eq!(outcome, ActionOutcome::Success);
        assert_eq!(
            state.player(PlayerId(12)).unwrap().position,
            Some(Square::new(10, 7))
        );
    }

    #[test]
    fn test_diving_tackle_flips_marginal_dodge() {
        let mut state = state_with_mover();
        add_away(&mut state, 12, 9, 7, &[Skill::DivingTackle]);
        let mut events = vec![];
        // Dodge rolls exactly the target (4): diving tackle turns it into a
        // failure. Armour 2+2 holds.
        let mut dice = ScriptedDice::new(&[4, 2, 2]);
        let outcome =
            resolve_move(&mut state, &mut events, &mut dice, PlayerId(1), Square::new(11, 7))
                .unwrap();
        assert_eq!(outcome, ActionOutcome::Turnover);
        assert_eq!(
            state.player(PlayerId(12)).unwrap().status,
            PlayerStatus::Prone
        );
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::DivingTackle { .. })));
    }
}
