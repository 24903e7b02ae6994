use crate::dice::DiceSource;
use crate::model::constants::clamp_target;
use crate::model::enums::{ActionOutcome, PassOutcome, PassRange, PlayerStatus};
use crate::model::event::GameEvent;
use crate::model::game::GameState;
use crate::model::player::PlayerId;
use crate::model::position::Square;
use crate::model::skills::Skill;

use super::injury::{knock_down, InjuryContext};
use super::strength::{block_dice, choose_face};

/// Stare an adjacent opponent into a stupor: an AG roll against the zones
/// on the gazer (the target's own zone excepted). Success switches the
/// victim's tacklezone off until his next turn. Failure just wastes the
/// action.
pub fn resolve_hypnotic_gaze(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    player_id: PlayerId,
    target_id: PlayerId,
) -> Result<ActionOutcome, String> {
    let gazer = state
        .player(player_id)
        .ok_or_else(|| format!("gaze by unknown {player_id}"))?;
    let cell = gazer.position.ok_or("gaze by off-pitch player")?;
    let side = gazer.side();
    let ag = gazer.get_ag();

    let zones = state
        .markers_at(side, &cell)
        .iter()
        .filter(|p| p.id != target_id)
        .count() as i8;
    let target_number = clamp_target(7 - ag as i8 + zones);
    let roll = dice.roll_d6();
    let success = roll >= target_number;
    events.push(GameEvent::HypnoticGaze {
        player_id,
        target_id,
        roll,
        target_number,
        success,
    });

    if success {
        state
            .player_mut(target_id)
            .ok_or_else(|| format!("gaze at unknown {target_id}"))?
            .flags
            .lost_tacklezones = true;
    }
    if let Some(player) = state.player_mut(player_id) {
        player.flags.has_acted = true;
    }
    Ok(if success {
        ActionOutcome::Success
    } else {
        ActionOutcome::Failure
    })
}

/// A ball-and-chain player careens across the pitch: a D8 direction for
/// every square of movement, flattening whoever gets in the way. He never
/// dodges and never steers.
pub fn resolve_ball_and_chain(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    player_id: PlayerId,
) -> Result<ActionOutcome, String> {
    let player = state
        .player(player_id)
        .ok_or_else(|| format!("ball-and-chain by unknown {player_id}"))?;
    let squares = player.flags.movement_remaining.max(0);
    let mut outcome = ActionOutcome::Success;

    for _ in 0..squares {
        let from = state
            .player(player_id)
            .and_then(|p| p.position)
            .ok_or("ball-and-chain player left the pitch mid-move")?;
        let direction = dice.roll_d8();
        let next = from.compass_neighbour(direction);

        if !next.is_on_pitch() {
            // Into the crowd he goes.
            super::injury::crowd_injury(state, events, dice, player_id)?;
            state.turnover_pending = true;
            outcome = ActionOutcome::Turnover;
            break;
        }

        let occupant = state.player_at(&next).map(|p| p.id);
        if let Some(occupant) = occupant {
            if state.player(occupant).is_some_and(|p| p.is_standing()) {
                events.push(GameEvent::BallAndChainBlock {
                    attacker_id: player_id,
                    target_id: occupant,
                });
                let (att_st, def_st) =
                    super::strength::effective_strengths(state, player_id, occupant);
                let (count, chooser) = block_dice(att_st, def_st);
                let faces: Vec<_> = (0..count)
                    .map(|_| crate::model::enums::BlockFace::from_d6(dice.roll_d6()))
                    .collect();
                let face = choose_face(state, &faces, chooser, player_id, occupant);
                events.push(GameEvent::Block {
                    attacker_id: player_id,
                    target_id: occupant,
                    dice: faces,
                    chosen: face,
                });
                use crate::model::enums::BlockFace;
                match face {
                    BlockFace::AttackerDown | BlockFace::BothDown => {
                        knock_down(
                            state,
                            events,
                            dice,
                            player_id,
                            &InjuryContext::default(),
                        )?;
                        if face == BlockFace::BothDown {
                            knock_down(
                                state,
                                events,
                                dice,
                                occupant,
                                &InjuryContext {
                                    attacker: Some(player_id),
                                    ..Default::default()
                                },
                            )?;
                        }
                        state.turnover_pending = true;
                        outcome = ActionOutcome::Turnover;
                    }
                    _ => {
                        knock_down(
                            state,
                            events,
                            dice,
                            occupant,
                            &InjuryContext {
                                attacker: Some(player_id),
                                ..Default::default()
                            },
                        )?;
                    }
                }
            }
            // Movement stops at any occupied square.
            break;
        }

        events.push(GameEvent::BallAndChainMove {
            player_id,
            to: next,
        });
        let player = state.player_mut(player_id).expect("player vanished");
        player.position = Some(next);
        player.flags.movement_remaining -= 1;

        if outcome == ActionOutcome::Turnover {
            break;
        }
    }

    if let Some(player) = state.player_mut(player_id) {
        player.flags.has_acted = true;
    }
    Ok(outcome)
}

/// Throw a Right Stuff teammate downfield. Always wayward: the passenger
/// scatters from the aiming point and must land on his feet.
pub fn resolve_throw_teammate(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    thrower_id: PlayerId,
    teammate_id: PlayerId,
    target: Square,
) -> Result<ActionOutcome, String> {
    let thrower = state
        .player(thrower_id)
        .ok_or_else(|| format!("throw by unknown {thrower_id}"))?;
    let side = thrower.side();
    let from = thrower.position.ok_or("throw by off-pitch player")?;
    let ag = thrower.get_ag();
    let range = PassRange::from_distance(from.distance(&target))
        .filter(|r| *r <= PassRange::Long)
        .ok_or("teammate thrown beyond long range")?;

    state.team_mut(side).pass_used_this_turn = true;
    events.push(GameEvent::SkillUsed {
        player_id: thrower_id,
        skill: Skill::ThrowTeamMate,
    });

    // A living projectile is always one band harder than a ball.
    let target_number = clamp_target(7 - ag as i8 + range.modifier() + 1);
    let roll = dice.roll_d6();
    let fumbled = roll == 1;
    events.push(GameEvent::PassAttempt {
        player_id: thrower_id,
        target,
        range,
        roll,
        target_number,
        outcome: if fumbled {
            PassOutcome::Fumble
        } else {
            PassOutcome::Inaccurate
        },
    });

    let was_carrying = state.ball.is_carried_by(teammate_id);

    let landing = if fumbled {
        // Dropped at the thrower's feet, more or less.
        state
            .player(teammate_id)
            .and_then(|p| p.position)
            .ok_or("thrown teammate has no position")?
    } else {
        // Scatter from the aiming point until a free on-pitch cell turns up.
        let mut cell = target;
        loop {
            if cell.is_on_pitch() && state.player_at(&cell).is_none() {
                break cell;
            }
            let direction = dice.roll_d8();
            cell = if cell.is_on_pitch() {
                cell.compass_neighbour(direction)
            } else {
                cell.clamped_to_pitch()
            };
        }
    };

    // Relocate the passenger, then the landing roll.
    {
        let teammate = state
            .player_mut(teammate_id)
            .ok_or_else(|| format!("thrown teammate {teammate_id} unknown"))?;
        let old = teammate.position.ok_or("thrown teammate off pitch")?;
        teammate.position = Some(landing);
        events.push(GameEvent::Move {
            player_id: teammate_id,
            from: old,
            to: landing,
        });
    }

    let teammate_ag = state.player(teammate_id).expect("teammate vanished").get_ag();
    let landing_target = clamp_target(7 - teammate_ag as i8 + 1);
    let landing_roll = dice.roll_d6();
    let landed = !fumbled && landing_roll >= landing_target;
    if landed {
        events.push(GameEvent::Leap {
            player_id: teammate_id,
            roll: landing_roll,
            target: landing_target,
            success: true,
        });
    } else {
        knock_down(state, events, dice, teammate_id, &InjuryContext::default())?;
    }

    for id in [thrower_id, teammate_id] {
        if let Some(player) = state.player_mut(id) {
            player.flags.has_acted = true;
        }
    }

    if was_carrying && !landed {
        // knock_down already bounced the ball; losing it ends the turn.
        state.turnover_pending = true;
        return Ok(ActionOutcome::Turnover);
    }
    super::flow::check_touchdown(state, events)?;
    Ok(if landed {
        ActionOutcome::Success
    } else {
        ActionOutcome::Failure
    })
}

/// Block two adjacent opponents at once. Frozen rule: each defender is
/// resolved against the attacker's ST + 2 with no assists either way, and
/// there is no follow-up.
pub fn resolve_multiple_block(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    attacker_id: PlayerId,
    target_ids: [PlayerId; 2],
) -> Result<ActionOutcome, String> {
    events.push(GameEvent::SkillUsed {
        player_id: attacker_id,
        skill: Skill::MultipleBlock,
    });

    let att_st = state
        .player(attacker_id)
        .ok_or_else(|| format!("multiple block by unknown {attacker_id}"))?
        .get_st()
        + 2;

    let mut turnover = false;
    for target_id in target_ids {
        if turnover {
            break;
        }
        if !state.player(target_id).is_some_and(|p| p.is_standing()) {
            continue;
        }
        let def_st = state
            .player(target_id)
            .ok_or_else(|| format!("multiple block at unknown {target_id}"))?
            .get_st();
        let (count, chooser) = block_dice(att_st, def_st);
        let faces: Vec<_> = (0..count)
            .map(|_| crate::model::enums::BlockFace::from_d6(dice.roll_d6()))
            .collect();
        let face = choose_face(state, &faces, chooser, attacker_id, target_id);
        events.push(GameEvent::Block {
            attacker_id,
            target_id,
            dice: faces,
            chosen: face,
        });

        use crate::model::enums::BlockFace;
        match face {
            BlockFace::AttackerDown => {
                knock_down(
                    state,
                    events,
                    dice,
                    attacker_id,
                    &InjuryContext {
                        attacker: Some(target_id),
                        ..Default::default()
                    },
                )?;
                turnover = true;
            }
            BlockFace::BothDown => {
                let att_block = state
                    .player(attacker_id)
                    .is_some_and(|p| p.has_skill(Skill::Block));
                if !state
                    .player(target_id)
                    .is_some_and(|p| p.has_skill(Skill::Block))
                {
                    knock_down(
                        state,
                        events,
                        dice,
                        target_id,
                        &InjuryContext {
                            attacker: Some(attacker_id),
                            ..Default::default()
                        },
                    )?;
                }
                if !att_block {
                    knock_down(
                        state,
                        events,
                        dice,
                        attacker_id,
                        &InjuryContext {
                            attacker: Some(target_id),
                            ..Default::default()
                        },
                    )?;
                    turnover = true;
                }
            }
            BlockFace::Push | BlockFace::Stumble | BlockFace::DefenderDown => {
                let dodges = face == BlockFace::Stumble
                    && state
                        .player(target_id)
                        .is_some_and(|p| p.has_skill(Skill::Dodge))
                    && !state
                        .player(attacker_id)
                        .is_some_and(|p| p.has_skill(Skill::Tackle));
                let down = face == BlockFace::DefenderDown
                    || (face == BlockFace::Stumble && !dodges);
                // No follow-up in a multiple block, so resolve the shove
                // in place: a simple one-cell push without a chain would
                // still need the push template, reuse the block module's.
                super::block::push_without_follow_up(
                    state, events, dice, attacker_id, target_id, down,
                )?;
            }
        }
    }

    if let Some(player) = state.player_mut(attacker_id) {
        player.flags.has_acted = true;
    }
    super::flow::check_touchdown(state, events)?;
    if turnover {
        state.turnover_pending = true;
        return Ok(ActionOutcome::Turnover);
    }
    Ok(ActionOutcome::Success)
}
