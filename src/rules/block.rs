use crate::dice::DiceSource;
use crate::model::enums::{ActionOutcome, BlockFace, PlayerStatus};
use crate::model::event::GameEvent;
use crate::model::game::GameState;
use crate::model::player::PlayerId;
use crate::model::position::Square;
use crate::model::skills::Skill;

use super::injury::{armour_roll, crowd_injury, injury_roll, knock_down, InjuryContext};
use super::strength::{block_dice, choose_face, effective_strengths, Chooser};

fn has(state: &GameState, id: PlayerId, skill: Skill) -> bool {
    state.player(id).is_some_and(|p| p.has_skill(skill))
}

/// Resolve a declared block, including the blitz variant. Stab and
/// Chainsaw replace the block dice entirely and never cause a turnover.
pub fn resolve_block(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    attacker_id: PlayerId,
    target_id: PlayerId,
    is_blitz: bool,
) -> Result<ActionOutcome, String> {
    // Foul Appearance stops the block before it starts.
    if has(state, target_id, Skill::FoulAppearance) {
        let roll = dice.roll_d6();
        let success = roll >= 2;
        events.push(GameEvent::FoulAppearance {
            player_id: attacker_id,
            roll,
            success,
        });
        if !success {
            set_acted(state, attacker_id);
            return Ok(ActionOutcome::Failure);
        }
    }

    if has(state, attacker_id, Skill::Stab) {
        return resolve_stab(state, events, dice, attacker_id, target_id);
    }
    if has(state, attacker_id, Skill::Chainsaw) {
        return resolve_chainsaw(state, events, dice, attacker_id, target_id);
    }

    let mut turnover = false;
    let mut frenzied = false;
    loop {
        let continue_frenzy =
            throw_block(state, events, dice, attacker_id, target_id, is_blitz, &mut turnover)?;
        if turnover || frenzied || !continue_frenzy {
            break;
        }
        // Frenzy: exactly one follow-up block against the same target.
        frenzied = true;
    }

    set_acted(state, attacker_id);
    super::flow::check_touchdown(state, events)?;
    if turnover {
        state.turnover_pending = true;
        return Ok(ActionOutcome::Turnover);
    }
    Ok(ActionOutcome::Success)
}

/// One set of block dice and its consequences. Returns whether Frenzy wants
/// a second block (target pushed, still standing, attacker able).
fn throw_block(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    attacker_id: PlayerId,
    target_id: PlayerId,
    is_blitz: bool,
    turnover: &mut bool,
) -> Result<bool, String> {
    let (att_st, def_st) = effective_strengths(state, attacker_id, target_id);
    let (count, chooser) = block_dice(att_st, def_st);
    let faces: Vec<BlockFace> = (0..count).map(|_| BlockFace::from_d6(dice.roll_d6())).collect();
    let chosen = choose_face(state, &faces, chooser, attacker_id, target_id);
    events.push(GameEvent::Block {
        attacker_id,
        target_id,
        dice: faces,
        chosen,
    });

    match chosen {
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
            *turnover = true;
            Ok(false)
        }
        BlockFace::BothDown => {
            if has(state, attacker_id, Skill::Juggernaut) && is_blitz {
                events.push(GameEvent::SkillUsed {
                    player_id: attacker_id,
                    skill: Skill::Juggernaut,
                });
                return apply_push_result(
                    state, events, dice, attacker_id, target_id, false, is_blitz,
                );
            }
            if has(state, attacker_id, Skill::Wrestle) || has(state, target_id, Skill::Wrestle) {
                let user = if has(state, attacker_id, Skill::Wrestle) {
                    attacker_id
                } else {
                    target_id
                };
                events.push(GameEvent::SkillUsed {
                    player_id: user,
                    skill: Skill::Wrestle,
                });
                *turnover = place_both_prone(state, events, dice, attacker_id, target_id)?;
                return Ok(false);
            }
            let mut attacker_down = true;
            if has(state, attacker_id, Skill::Block) {
                attacker_down = false;
            }
            if !has(state, target_id, Skill::Block) {
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
            if attacker_down {
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
                *turnover = true;
            }
            Ok(false)
        }
        BlockFace::Push => {
            apply_push_result(state, events, dice, attacker_id, target_id, false, is_blitz)
        }
        BlockFace::Stumble => {
            let dodges = has(state, target_id, Skill::Dodge)
                && !has(state, attacker_id, Skill::Tackle);
            if dodges {
                events.push(GameEvent::SkillUsed {
                    player_id: target_id,
                    skill: Skill::Dodge,
                });
            }
            apply_push_result(state, events, dice, attacker_id, target_id, !dodges, is_blitz)
        }
        BlockFace::DefenderDown => {
            apply_push_result(state, events, dice, attacker_id, target_id, true, is_blitz)
        }
    }
}

/// Wrestle: both placed prone, no armour. Turnover only when the active
/// attacker loses the ball doing it.
fn place_both_prone(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    attacker_id: PlayerId,
    target_id: PlayerId,
) -> Result<bool, String> {
    let mut turnover = false;
    for id in [target_id, attacker_id] {
        let cell = state
            .player(id)
            .and_then(|p| p.position)
            .ok_or("wrestle with off-pitch player")?;
        events.push(GameEvent::PlayerFell { player_id: id, at: cell });
        state.player_mut(id).expect("player vanished").status = PlayerStatus::Prone;
        if state.ball.is_carried_by(id) {
            super::ball::drop_ball(state, events, dice, cell)?;
            if id == attacker_id {
                turnover = true;
            }
        }
    }
    Ok(turnover)
}

/// Push the target, maybe knock him down where he lands, maybe follow up,
/// and report whether Frenzy may continue.
fn apply_push_result(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    attacker_id: PlayerId,
    target_id: PlayerId,
    down_after: bool,
    _is_blitz: bool,
) -> Result<bool, String> {
    let attacker_pos = state
        .player(attacker_id)
        .and_then(|p| p.position)
        .ok_or("pushing attacker has no position")?;
    let target_old = state
        .player(target_id)
        .and_then(|p| p.position)
        .ok_or("pushed target has no position")?;

    let surfed = push_player(state, events, dice, attacker_pos, target_id)?;

    if surfed {
        // Off the pitch: the crowd handles armour and the throw-in.
        crowd_injury(state, events, dice, target_id)?;
    } else {
        // Strip Ball knocks the ball loose on any push.
        let target_new = state
            .player(target_id)
            .and_then(|p| p.position)
            .ok_or("pushed target vanished")?;
        if !down_after
            && state.ball.is_carried_by(target_id)
            && has(state, attacker_id, Skill::StripBall)
            && !has(state, target_id, Skill::SureHands)
        {
            events.push(GameEvent::SkillUsed {
                player_id: attacker_id,
                skill: Skill::StripBall,
            });
            super::ball::drop_ball(state, events, dice, target_new)?;
        }
        if down_after {
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
    }

    // Follow up into the vacated cell. Frenzy must; Fend forbids.
    let moved = state
        .player(target_id)
        .and_then(|p| p.position)
        .map_or(true, |pos| pos != target_old);
    if moved && !has(state, target_id, Skill::Fend) {
        let attacker_standing = state
            .player(attacker_id)
            .is_some_and(|p| p.is_standing());
        if attacker_standing {
            events.push(GameEvent::FollowUp {
                player_id: attacker_id,
                to: target_old,
            });
            state
                .player_mut(attacker_id)
                .expect("attacker vanished")
                .position = Some(target_old);
        }
    }

    // Frenzy continues only against a standing target still adjacent.
    let frenzy = has(state, attacker_id, Skill::Frenzy)
        && !down_after
        && !surfed
        && state.player(target_id).is_some_and(|p| p.is_standing())
        && state
            .player(attacker_id)
            .and_then(|p| p.position)
            .zip(state.player(target_id).and_then(|p| p.position))
            .is_some_and(|(a, t)| a.is_adjacent(&t));
    Ok(frenzy)
}

/// Push used by Multiple Block: shove the target (chains included), knock
/// him down where he lands if the face says so, but never follow up.
pub(crate) fn push_without_follow_up(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    attacker_id: PlayerId,
    target_id: PlayerId,
    down_after: bool,
) -> Result<(), String> {
    let attacker_pos = state
        .player(attacker_id)
        .and_then(|p| p.position)
        .ok_or("pushing attacker has no position")?;
    let surfed = push_player(state, events, dice, attacker_pos, target_id)?;
    if surfed {
        crowd_injury(state, events, dice, target_id)?;
    } else if down_after {
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
    Ok(())
}

/// Move a pushed player one cell away from the pusher, chaining through
/// occupied cells. Returns true when the player went into the crowd.
fn push_player(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    pusher_pos: Square,
    pushed_id: PlayerId,
) -> Result<bool, String> {
    let pushed_pos = state
        .player(pushed_id)
        .and_then(|p| p.position)
        .ok_or("pushed player has no position")?;

    if has(state, pushed_id, Skill::StandFirm) {
        events.push(GameEvent::SkillUsed {
            player_id: pushed_id,
            skill: Skill::StandFirm,
        });
        return Ok(false);
    }

    let cell = select_push_cell(state, pusher_pos, pushed_pos, pushed_id)?;

    if !cell.is_on_pitch() {
        events.push(GameEvent::Push {
            player_id: pushed_id,
            from: pushed_pos,
            to: cell,
        });
        return Ok(true);
    }

    let occupant = state.player_at(&cell).map(|p| p.id);
    if let Some(occupant) = occupant {
        // Chain push: clear the cell first.
        let surfed = push_player(state, events, dice, pushed_pos, occupant)?;
        if surfed {
            crowd_injury(state, events, dice, occupant)?;
        }
    }

    events.push(GameEvent::Push {
        player_id: pushed_id,
        from: pushed_pos,
        to: cell,
    });
    state
        .player_mut(pushed_id)
        .expect("pushed player vanished")
        .position = Some(cell);
    Ok(false)
}

/// The cell a push sends the target to. Standard three-cone geometry;
/// Side Step frees the choice for the defender, Grab widens it for the
/// attacker before resorting to a chain.
fn select_push_cell(
    state: &GameState,
    pusher_pos: Square,
    pushed_pos: Square,
    pushed_id: PlayerId,
) -> Result<Square, String> {
    // All 8 neighbours, off-pitch included; direction filter as in the
    // standard push template.
    let mut cones = Vec::new();
    for dx in -1..=1i32 {
        for dy in -1..=1i32 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let cell = Square::new(pushed_pos.x + dx, pushed_pos.y + dy);
            let straight = pusher_pos.x == pushed_pos.x || pusher_pos.y == pushed_pos.y;
            let include = if straight {
                pusher_pos.distance(&cell) >= 2
            } else {
                pusher_pos.manhattan_distance(&cell) >= 3
            };
            if include {
                cones.push(cell);
            }
        }
    }

    let side_step = has(state, pushed_id, Skill::SideStep);
    if side_step {
        // The defender picks any free adjacent cell instead.
        let free: Vec<Square> = pushed_pos
            .adjacent_squares()
            .into_iter()
            .filter(|c| !state.is_occupied(c))
            .collect();
        if let Some(cell) = free.first() {
            return Ok(*cell);
        }
    }

    let empty: Vec<Square> = cones
        .iter()
        .copied()
        .filter(|c| c.is_on_pitch() && !state.is_occupied(c))
        .collect();
    if let Some(cell) = empty.first() {
        return Ok(*cell);
    }

    let out: Vec<Square> = cones.iter().copied().filter(|c| !c.is_on_pitch()).collect();
    if let Some(cell) = out.first() {
        return Ok(*cell);
    }

    // Everything in the cone is occupied: chain push, unless the attacker
    // can Grab the defender into any free adjacent cell.
    let grab_attacker = state
        .player_at(&pusher_pos)
        .is_some_and(|p| p.has_skill(Skill::Grab));
    if grab_attacker {
        if let Some(cell) = pushed_pos
            .adjacent_squares()
            .into_iter()
            .find(|c| !state.is_occupied(c))
        {
            return Ok(cell);
        }
    }

    cones
        .first()
        .copied()
        .ok_or_else(|| "push with no candidate cells".to_string())
}

fn set_acted(state: &mut GameState, player_id: PlayerId) {
    if let Some(player) = state.player_mut(player_id) {
        player.flags.has_acted = true;
    }
}

fn resolve_stab(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    attacker_id: PlayerId,
    target_id: PlayerId,
) -> Result<ActionOutcome, String> {
    events.push(GameEvent::Stab {
        attacker_id,
        target_id,
    });
    let was_carrying = state.ball.is_carried_by(target_id);
    let cell = state.player(target_id).and_then(|p| p.position);
    let ctx = InjuryContext::default();
    let armour = armour_roll(state, events, dice, target_id, &ctx)?;
    if armour.broken {
        injury_roll(state, events, dice, target_id, &ctx)?;
        if was_carrying {
            if let Some(cell) = cell {
                super::ball::drop_ball(state, events, dice, cell)?;
            }
        }
    }
    set_acted(state, attacker_id);
    Ok(ActionOutcome::Success)
}

fn resolve_chainsaw(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    attacker_id: PlayerId,
    target_id: PlayerId,
) -> Result<ActionOutcome, String> {
    let roll = dice.roll_d6();
    let kickback = roll == 1;
    events.push(GameEvent::Chainsaw {
        attacker_id,
        target_id,
        kickback,
    });
    let victim = if kickback { attacker_id } else { target_id };
    let was_carrying = state.ball.is_carried_by(victim);
    let cell = state.player(victim).and_then(|p| p.position);
    let ctx = InjuryContext {
        armour_modifier: 3,
        ..Default::default()
    };
    let armour = armour_roll(state, events, dice, victim, &ctx)?;
    if armour.broken {
        injury_roll(state, events, dice, victim, &ctx)?;
        if was_carrying {
            if let Some(cell) = cell {
                super::ball::drop_ball(state, events, dice, cell)?;
            }
        }
    }
    set_acted(state, attacker_id);
    if kickback {
        return Ok(ActionOutcome::Failure);
    }
    Ok(ActionOutcome::Success)
}

/// Blitz: move, then block, one team blitz per turn. The block itself costs
/// one square of movement.
pub fn resolve_blitz(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    player_id: PlayerId,
    to: Square,
    target_id: PlayerId,
) -> Result<ActionOutcome, String> {
    let side = state
        .player(player_id)
        .ok_or_else(|| format!("blitz by unknown {player_id}"))?
        .side();
    state.team_mut(side).blitz_used_this_turn = true;
    if let Some(player) = state.player_mut(player_id) {
        player.flags.used_blitz = true;
    }

    let move_outcome = super::movement::resolve_move(state, events, dice, player_id, to)?;
    if move_outcome == ActionOutcome::Turnover {
        return Ok(ActionOutcome::Turnover);
    }
    // Movement can end early (tentacles) or elsewhere; block only when the
    // target ended up adjacent and standing.
    let adjacent = state
        .player(player_id)
        .and_then(|p| p.position)
        .zip(state.player(target_id).and_then(|p| p.position))
        .is_some_and(|(a, t)| a.is_adjacent(&t));
    let target_standing = state.player(target_id).is_some_and(|p| p.is_standing());
    if !adjacent || !target_standing {
        set_acted(state, player_id);
        return Ok(ActionOutcome::Failure);
    }

    if let Some(player) = state.player_mut(player_id) {
        player.flags.movement_remaining -= 1;
    }
    resolve_block(state, events, dice, player_id, target_id, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::model::ball::Ball;
    use crate::model::enums::Side;
    use crate::model::player::Player;
    use crate::model::team::TeamState;

    fn blockers_state(att_skills: &[Skill], def_skills: &[Skill]) -> GameState {
        let mut state = GameState::new(
            TeamState::new("H", "human", Side::Home, 0, false),
            TeamState::new("A", "orc", Side::Away, 0, false),
        );
        let mut attacker = Player {
            id: PlayerId(1),
            st: 3,
            status: PlayerStatus::Standing,
            position: Some(Square::new(10, 7)),
            skills: att_skills.into(),
            ..Default::default()
        };
        attacker.begin_turn();
        let defender = Player {
            id: PlayerId(12),
            st: 3,
            av: 7,
            status: PlayerStatus::Standing,
            position: Some(Square::new(11, 7)),
            skills: def_skills.into(),
            ..Default::default()
        };
        state.players.insert(attacker.id, attacker);
        state.players.insert(defender.id, defender);
        state.active_team = Some(Side::Home);
        state
    }

    #[test]
    fn test_defender_down_pushed_and_stunned() {
        // Spec scenario 4 geometry: ST 4 attacker with Block, ST 3 AV 7
        // defender. Two dice attacker chooses; 6 = defender down, 3 = push.
        let mut state = blockers_state(&[Skill::Block], &[]);
        state.player_mut(PlayerId(1)).unwrap().st = 4;
        let mut events = vec![];
        // Block dice [6, 3], armour 5+4=9 breaks AV 7, injury 3+3=6 stunned.
        let mut dice = ScriptedDice::new(&[6, 3, 5, 4, 3, 3]);
        let outcome =
            resolve_block(&mut state, &mut events, &mut dice, PlayerId(1), PlayerId(12), false)
                .unwrap();
        assert_eq!(outcome, ActionOutcome::Success);
        let defender = state.player(PlayerId(12)).unwrap();
        assert_eq!(defender.status, PlayerStatus::Stunned);
        // Pushed one square back (east, lexicographic first in the cone is
        // the north-east cell).
        assert_ne!(defender.position, Some(Square::new(11, 7)));
        // Attacker followed up into the vacated cell.
        assert_eq!(
            state.player(PlayerId(1)).unwrap().position,
            Some(Square::new(11, 7))
        );
        assert!(!state.turnover_pending);
    }

    #[test]
    fn test_attacker_down_is_turnover() {
        let mut state = blockers_state(&[], &[]);
        let mut events = vec![];
        // One die (equal strength): 1 = attacker down; armour 2+2 holds.
        let mut dice = ScriptedDice::new(&[1, 2, 2]);
        let outcome =
            resolve_block(&mut state, &mut events, &mut dice, PlayerId(1), PlayerId(12), false)
                .unwrap();
        assert_eq!(outcome, ActionOutcome::Turnover);
        assert_eq!(
            state.player(PlayerId(1)).unwrap().status,
            PlayerStatus::Prone
        );
        assert!(state.turnover_pending);
    }

    #[test]
    fn test_both_down_with_block_skill() {
        let mut state = blockers_state(&[Skill::Block], &[]);
        let mut events = vec![];
        // 2 = both down; attacker has Block and stays up, defender falls.
        // Armour 2+2 holds.
        let mut dice = ScriptedDice::new(&[2, 2, 2]);
        let outcome =
            resolve_block(&mut state, &mut events, &mut dice, PlayerId(1), PlayerId(12), false)
                .unwrap();
        assert_eq!(outcome, ActionOutcome::Success);
        assert!(state.player(PlayerId(1)).unwrap().is_standing());
        assert_eq!(
            state.player(PlayerId(12)).unwrap().status,
            PlayerStatus::Prone
        );
    }

    #[test]
    fn test_wrestle_puts_both_prone_without_armour() {
        let mut state = blockers_state(&[], &[Skill::Wrestle]);
        let mut events = vec![];
        // 2 = both down; wrestle: no armour dice consumed.
        let mut dice = ScriptedDice::new(&[2]);
        let outcome =
            resolve_block(&mut state, &mut events, &mut dice, PlayerId(1), PlayerId(12), false)
                .unwrap();
        assert_eq!(outcome, ActionOutcome::Success);
        assert_eq!(
            state.player(PlayerId(1)).unwrap().status,
            PlayerStatus::Prone
        );
        assert_eq!(
            state.player(PlayerId(12)).unwrap().status,
            PlayerStatus::Prone
        );
        assert_eq!(dice.remaining(), 0);
    }

    #[test]
    fn test_dodge_turns_stumble_into_push() {
        let mut state = blockers_state(&[], &[Skill::Dodge]);
        let mut events = vec![];
        // 5 = stumble; defender dodges, stays standing.
        let mut dice = ScriptedDice::new(&[5]);
        let outcome =
            resolve_block(&mut state, &mut events, &mut dice, PlayerId(1), PlayerId(12), false)
                .unwrap();
        assert_eq!(outcome, ActionOutcome::Success);
        assert!(state.player(PlayerId(12)).unwrap().is_standing());
    }

    #[test]
    fn test_tackle_negates_dodge_on_stumble() {
        let mut state = blockers_state(&[Skill::Tackle], &[Skill::Dodge]);
        let mut events = vec![];
        // 5 = stumble; Tackle: defender goes down. Armour 2+2 holds.
        let mut dice = ScriptedDice::new(&[5, 2, 2]);
        resolve_block(&mut state, &mut events, &mut dice, PlayerId(1), PlayerId(12), false)
            .unwrap();
        assert_eq!(
            state.player(PlayerId(12)).unwrap().status,
            PlayerStatus::Prone
        );
    }

    #[test]
    fn test_stand_firm_refuses_push() {
        let mut state = blockers_state(&[], &[Skill::StandFirm]);
        let mut events = vec![];
        // 3 = push; stand firm: no movement, no follow-up.
        let mut dice = ScriptedDice::new(&[3]);
        resolve_block(&mut state, &mut events, &mut dice, PlayerId(1), PlayerId(12), false)
            .unwrap();
        assert_eq!(
            state.player(PlayerId(12)).unwrap().position,
            Some(Square::new(11, 7))
        );
        assert_eq!(
            state.player(PlayerId(1)).unwrap().position,
            Some(Square::new(10, 7))
        );
    }

    #[test]
    fn test_fend_blocks_follow_up() {
        let mut state = blockers_state(&[], &[Skill::Fend]);
        let mut events = vec![];
        let mut dice = ScriptedDice::new(&[3]);
        resolve_block(&mut state, &mut events, &mut dice, PlayerId(1), PlayerId(12), false)
            .unwrap();
        assert_eq!(
            state.player(PlayerId(1)).unwrap().position,
            Some(Square::new(10, 7))
        );
        assert_ne!(
            state.player(PlayerId(12)).unwrap().position,
            Some(Square::new(11, 7))
        );
    }

    #[test]
    fn test_crowd_surf_off_the_pitch() {
        let mut state = blockers_state(&[], &[]);
        // Defender against the sideline, pushed north off the pitch.
        state.player_mut(PlayerId(1)).unwrap().position = Some(Square::new(11, 1));
        state.player_mut(PlayerId(12)).unwrap().position = Some(Square::new(11, 0));
        let mut events = vec![];
        // 6 = defender down; all cone cells are off pitch. Crowd injury
        // 4+4 = 8 knocks him out.
        let mut dice = ScriptedDice::new(&[6, 4, 4]);
        let outcome =
            resolve_block(&mut state, &mut events, &mut dice, PlayerId(1), PlayerId(12), false)
                .unwrap();
        assert_eq!(outcome, ActionOutcome::Success);
        let defender = state.player(PlayerId(12)).unwrap();
        assert_eq!(defender.status, PlayerStatus::KnockedOut);
        assert!(defender.position.is_none());
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::CrowdSurf { .. })));
    }

    #[test]
    fn test_chain_push() {
        let mut state = blockers_state(&[], &[]);
        // A third player directly behind the defender on the push line;
        // flank cells occupied too so the cone is full.
        for (id, x, y) in [(13u8, 12, 7), (14u8, 12, 6), (15u8, 12, 8)] {
            let player = Player {
                id: PlayerId(id),
                status: PlayerStatus::Standing,
                position: Some(Square::new(x, y)),
                ..Default::default()
            };
            state.players.insert(player.id, player);
        }
        let mut events = vec![];
        let mut dice = ScriptedDice::new(&[3]);
        resolve_block(&mut state, &mut events, &mut dice, PlayerId(1), PlayerId(12), false)
            .unwrap();
        // The defender moved into the chained player's old cell; the chained
        // player got shoved onward.
        let pushes: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Push { .. }))
            .collect();
        assert_eq!(pushes.len(), 2);
        assert_eq!(
            state.player(PlayerId(12)).unwrap().position,
            Some(Square::new(12, 6))
        );
        assert_ne!(
            state.player(PlayerId(14)).unwrap().position,
            Some(Square::new(12, 6))
        );
    }

    #[test]
    fn test_strip_ball_drops_carried_ball() {
        let mut state = blockers_state(&[Skill::StripBall], &[]);
        state.ball = Ball::Carried(PlayerId(12));
        let mut events = vec![];
        // 3 = push, then the loose ball bounces (direction 3).
        let mut dice = ScriptedDice::new(&[3, 3]);
        resolve_block(&mut state, &mut events, &mut dice, PlayerId(1), PlayerId(12), false)
            .unwrap();
        assert!(state.ball.carrier() != Some(PlayerId(12)));
    }

    #[test]
    fn test_stab_never_turnover() {
        let mut state = blockers_state(&[Skill::Stab], &[]);
        let mut events = vec![];
        // Armour 6+5 = 11 breaks, injury 4+4 KO.
        let mut dice = ScriptedDice::new(&[6, 5, 4, 4]);
        let outcome =
            resolve_block(&mut state, &mut events, &mut dice, PlayerId(1), PlayerId(12), false)
                .unwrap();
        assert_eq!(outcome, ActionOutcome::Success);
        assert!(!state.turnover_pending);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Stab { .. })));
    }

    #[test]
    fn test_foul_appearance_wastes_action() {
        let mut state = blockers_state(&[], &[Skill::FoulAppearance]);
        let mut events = vec![];
        let mut dice = ScriptedDice::new(&[1]);
        let outcome =
            resolve_block(&mut state, &mut events, &mut dice, PlayerId(1), PlayerId(12), false)
                .unwrap();
        assert_eq!(outcome, ActionOutcome::Failure);
        assert!(state.player(PlayerId(1)).unwrap().flags.has_acted);
        assert_eq!(dice.remaining(), 0);
    }
}
