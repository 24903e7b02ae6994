pub mod ball;
pub mod block;
pub mod flow;
pub mod foul;
pub mod injury;
pub mod kickoff;
pub mod movement;
pub mod pass;
pub mod special;
pub mod strength;
pub mod turn;

use crate::dice::DiceSource;
use crate::model::action::Action;
use crate::model::enums::{
    ActionOutcome, Formation, PassRange, Phase, PlayerStatus, Side, Weather,
};
use crate::model::event::GameEvent;
use crate::model::game::GameState;
use crate::model::player::{Player, PlayerId};
use crate::model::position::Square;
use crate::model::skills::Skill;
use crate::pathfinding::Pathfinder;
use thiserror::Error;

/// Caller errors: the declared action is not admissible from this state.
/// The input state is untouched when one of these comes back.
#[derive(Error, Debug)]
pub enum RulesError {
    #[error("no player with id {0}")]
    UnknownPlayer(PlayerId),

    #[error("action not admissible in phase {0:?}")]
    WrongPhase(Phase),

    #[error("player {0} does not belong to the active team")]
    NotActiveTeam(PlayerId),

    #[error("player {0} cannot act: {1}")]
    CannotAct(PlayerId, String),

    #[error("cell ({x}, {y}) is not on the pitch")]
    OffPitch { x: i32, y: i32 },

    #[error("inadmissible action: {0}")]
    Inadmissible(String),

    #[error("engine invariant violated: {0}")]
    Internal(String),
}

/// What a resolution hands back: the fresh state, the ordered event log
/// and how the action went.
#[derive(Debug)]
pub struct Resolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    pub outcome: ActionOutcome,
}

/// Resolve one declared action. Pure over the input: a fresh state comes
/// back and the argument is never mutated.
pub fn resolve(
    state: &GameState,
    action: &Action,
    dice: &mut dyn DiceSource,
) -> Result<Resolution, RulesError> {
    validate(state, action)?;

    let mut next = state.clone();
    let mut events = Vec::new();

    // Big-guy pre-action gate for player actions during play.
    if next.phase == Phase::Play {
        if let Some(player_id) = action.player_id() {
            let is_violent = matches!(
                action,
                Action::Block { .. } | Action::Blitz { .. } | Action::MultipleBlock { .. }
            );
            let gated =
                turn::pre_action_check(&mut next, &mut events, dice, player_id, is_violent)
                    .map_err(RulesError::Internal)?;
            if let Some(outcome) = gated {
                if next.turnover_pending && next.phase == Phase::Play {
                    turn::apply_end_of_turn(&mut next, &mut events, dice)
                        .map_err(RulesError::Internal)?;
                }
                return Ok(Resolution {
                    state: next,
                    events,
                    outcome,
                });
            }
        }
    }

    let outcome = dispatch(&mut next, &mut events, dice, action).map_err(RulesError::Internal)?;

    flow::check_touchdown(&mut next, &mut events).map_err(RulesError::Internal)?;
    if next.turnover_pending && next.phase == Phase::Play {
        turn::apply_end_of_turn(&mut next, &mut events, dice).map_err(RulesError::Internal)?;
    }

    Ok(Resolution {
        state: next,
        events,
        outcome,
    })
}

fn dispatch(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    action: &Action,
) -> Result<ActionOutcome, String> {
    match action {
        Action::Move { player_id, x, y } => {
            movement::resolve_move(state, events, dice, *player_id, Square::new(*x, *y))
        }
        Action::Block {
            attacker_id,
            target_id,
        } => block::resolve_block(state, events, dice, *attacker_id, *target_id, false),
        Action::Blitz {
            player_id,
            x,
            y,
            target_id,
        } => block::resolve_blitz(
            state,
            events,
            dice,
            *player_id,
            Square::new(*x, *y),
            *target_id,
        ),
        Action::Pass { player_id, target } => {
            pass::resolve_pass(state, events, dice, *player_id, *target)
        }
        Action::HandOff {
            player_id,
            target_id,
        } => pass::resolve_handoff(state, events, dice, *player_id, *target_id),
        Action::Foul {
            player_id,
            target_id,
        } => foul::resolve_foul(state, events, dice, *player_id, *target_id),
        Action::ThrowTeammate {
            player_id,
            teammate_id,
            target,
        } => special::resolve_throw_teammate(
            state,
            events,
            dice,
            *player_id,
            *teammate_id,
            *target,
        ),
        Action::BombThrow { player_id, target } => {
            pass::resolve_bomb(state, events, dice, *player_id, *target)
        }
        Action::HypnoticGaze {
            player_id,
            target_id,
        } => special::resolve_hypnotic_gaze(state, events, dice, *player_id, *target_id),
        Action::BallAndChain { player_id } => {
            special::resolve_ball_and_chain(state, events, dice, *player_id)
        }
        Action::MultipleBlock {
            player_id,
            target_ids,
        } => special::resolve_multiple_block(state, events, dice, *player_id, *target_ids),
        Action::EndTurn => {
            turn::apply_end_of_turn(state, events, dice)?;
            Ok(ActionOutcome::Success)
        }
        Action::Setup {
            formation,
            kick_target,
        } => kickoff::resolve_setup(state, events, dice, *formation, *kick_target),
    }
}

/// Open the match (coin toss and opening weather), returning the usual
/// resolution triple.
pub fn start_game(state: &GameState, dice: &mut dyn DiceSource) -> Result<Resolution, RulesError> {
    let mut next = state.clone();
    let mut events = Vec::new();
    flow::start_game(&mut next, &mut events, dice).map_err(RulesError::Internal)?;
    Ok(Resolution {
        state: next,
        events,
        outcome: ActionOutcome::Success,
    })
}

/// Advance past a touchdown or half-time into the next drive (or the final
/// whistle).
pub fn next_drive(state: &GameState, dice: &mut dyn DiceSource) -> Result<Resolution, RulesError> {
    if !matches!(state.phase, Phase::Touchdown | Phase::HalfTime) {
        return Err(RulesError::WrongPhase(state.phase));
    }
    let mut next = state.clone();
    let mut events = Vec::new();
    flow::next_drive(&mut next, &mut events, dice).map_err(RulesError::Internal)?;
    Ok(Resolution {
        state: next,
        events,
        outcome: ActionOutcome::Success,
    })
}

fn active_side(state: &GameState) -> Result<Side, RulesError> {
    state
        .active_team
        .ok_or(RulesError::Inadmissible("no active team".to_string()))
}

fn get_player<'a>(state: &'a GameState, id: PlayerId) -> Result<&'a Player, RulesError> {
    state.player(id).ok_or(RulesError::UnknownPlayer(id))
}

fn require_ready(player: &Player) -> Result<(), RulesError> {
    if !player.is_on_pitch() {
        return Err(RulesError::CannotAct(
            player.id,
            "not on the pitch".to_string(),
        ));
    }
    if player.status == PlayerStatus::Stunned {
        return Err(RulesError::CannotAct(player.id, "stunned".to_string()));
    }
    if player.flags.has_acted {
        return Err(RulesError::CannotAct(
            player.id,
            "has already acted this turn".to_string(),
        ));
    }
    Ok(())
}

fn require_standing(player: &Player) -> Result<(), RulesError> {
    require_ready(player)?;
    if !player.is_standing() {
        return Err(RulesError::CannotAct(player.id, "not standing".to_string()));
    }
    Ok(())
}

fn require_own(state: &GameState, id: PlayerId) -> Result<&Player, RulesError> {
    let player = get_player(state, id)?;
    if Some(player.side()) != state.active_team {
        return Err(RulesError::NotActiveTeam(id));
    }
    Ok(player)
}

/// A scratch copy of the player for reachability checks, with stand-up and
/// reserved movement already paid.
fn scratch_mover(player: &Player, reserve: i8) -> Player {
    let mut scratch = player.clone();
    if scratch.status == PlayerStatus::Prone {
        scratch.status = PlayerStatus::Standing;
        scratch.flags.movement_remaining -= crate::model::constants::STAND_UP_COST;
    }
    scratch.flags.movement_remaining -= reserve;
    scratch
}

fn check_reachable(
    state: &GameState,
    player: &Player,
    to: Square,
    reserve: i8,
) -> Result<(), RulesError> {
    let scratch = scratch_mover(player, reserve);
    if scratch.flags.movement_remaining + scratch.gfi_allowance() < 0 {
        return Err(RulesError::CannotAct(
            player.id,
            "not enough movement".to_string(),
        ));
    }
    if to == player.position.unwrap_or_default() {
        return Ok(());
    }
    let finder = Pathfinder::new(state, &scratch).map_err(RulesError::Internal)?;
    if finder.find_path_to(to).is_none() {
        return Err(RulesError::Inadmissible(format!(
            "no route to ({}, {})",
            to.x, to.y
        )));
    }
    Ok(())
}

/// Admissibility check: no state change, typed failure on a caller bug.
pub fn validate(state: &GameState, action: &Action) -> Result<(), RulesError> {
    match action {
        Action::Setup { .. } => {
            if state.phase != Phase::Setup {
                return Err(RulesError::WrongPhase(state.phase));
            }
            return Ok(());
        }
        _ => {
            if state.phase != Phase::Play {
                return Err(RulesError::WrongPhase(state.phase));
            }
        }
    }
    let side = active_side(state)?;

    match action {
        Action::EndTurn => Ok(()),
        Action::Move { player_id, x, y } => {
            let player = require_own(state, *player_id)?;
            require_ready(player)?;
            let to = Square::new(*x, *y);
            if !to.is_on_pitch() {
                return Err(RulesError::OffPitch { x: *x, y: *y });
            }
            if to != player.position.unwrap_or_default() && state.is_occupied(&to) {
                return Err(RulesError::Inadmissible("destination occupied".to_string()));
            }
            check_reachable(state, player, to, 0)
        }
        Action::Block {
            attacker_id,
            target_id,
        } => {
            let attacker = require_own(state, *attacker_id)?;
            require_standing(attacker)?;
            if attacker.flags.has_moved {
                return Err(RulesError::CannotAct(
                    *attacker_id,
                    "cannot block after moving".to_string(),
                ));
            }
            let target = get_player(state, *target_id)?;
            if target.side() == side {
                return Err(RulesError::Inadmissible("cannot block a teammate".to_string()));
            }
            if !target.is_standing() {
                return Err(RulesError::Inadmissible("target is not standing".to_string()));
            }
            let adjacent = attacker
                .position
                .zip(target.position)
                .is_some_and(|(a, t)| a.is_adjacent(&t));
            if !adjacent {
                return Err(RulesError::Inadmissible("target is not adjacent".to_string()));
            }
            Ok(())
        }
        Action::Blitz {
            player_id,
            x,
            y,
            target_id,
        } => {
            let player = require_own(state, *player_id)?;
            require_ready(player)?;
            if state.team(side).blitz_used_this_turn || player.flags.used_blitz {
                return Err(RulesError::Inadmissible(
                    "blitz already used this turn".to_string(),
                ));
            }
            let to = Square::new(*x, *y);
            if !to.is_on_pitch() {
                return Err(RulesError::OffPitch { x: *x, y: *y });
            }
            let target = get_player(state, *target_id)?;
            if target.side() == side || !target.is_standing() {
                return Err(RulesError::Inadmissible(
                    "blitz target must be a standing opponent".to_string(),
                ));
            }
            let adjacent = target
                .position
                .is_some_and(|t| t.is_adjacent(&to) && t != to);
            if !adjacent {
                return Err(RulesError::Inadmissible(
                    "blitz destination must be adjacent to the target".to_string(),
                ));
            }
            if to != player.position.unwrap_or_default() && state.is_occupied(&to) {
                return Err(RulesError::Inadmissible("destination occupied".to_string()));
            }
            check_reachable(state, player, to, 1)
        }
        Action::Pass { player_id, target } => {
            let player = require_own(state, *player_id)?;
            require_standing(player)?;
            require_pass_slot(state, side)?;
            if !state.ball.is_carried_by(*player_id) {
                return Err(RulesError::Inadmissible("passer has no ball".to_string()));
            }
            if !target.is_on_pitch() {
                return Err(RulesError::OffPitch {
                    x: target.x,
                    y: target.y,
                });
            }
            let from = player.position.unwrap_or_default();
            let range = PassRange::from_distance(from.distance(target))
                .ok_or(RulesError::Inadmissible("target out of range".to_string()))?;
            if state.weather == Weather::Blizzard && range > PassRange::Short {
                return Err(RulesError::Inadmissible(
                    "no long passes in a blizzard".to_string(),
                ));
            }
            Ok(())
        }
        Action::HandOff {
            player_id,
            target_id,
        } => {
            let player = require_own(state, *player_id)?;
            require_standing(player)?;
            require_pass_slot(state, side)?;
            if !state.ball.is_carried_by(*player_id) {
                return Err(RulesError::Inadmissible("no ball to hand off".to_string()));
            }
            let target = get_player(state, *target_id)?;
            if target.side() != side || !target.is_standing() {
                return Err(RulesError::Inadmissible(
                    "handoff needs a standing teammate".to_string(),
                ));
            }
            let adjacent = player
                .position
                .zip(target.position)
                .is_some_and(|(a, t)| a.is_adjacent(&t));
            if !adjacent {
                return Err(RulesError::Inadmissible("teammate not adjacent".to_string()));
            }
            Ok(())
        }
        Action::Foul {
            player_id,
            target_id,
        } => {
            let player = require_own(state, *player_id)?;
            require_standing(player)?;
            if state.team(side).foul_used_this_turn {
                return Err(RulesError::Inadmissible(
                    "foul already used this turn".to_string(),
                ));
            }
            let target = get_player(state, *target_id)?;
            if target.side() == side {
                return Err(RulesError::Inadmissible("cannot foul a teammate".to_string()));
            }
            if !matches!(target.status, PlayerStatus::Prone | PlayerStatus::Stunned) {
                return Err(RulesError::Inadmissible(
                    "foul target must be down".to_string(),
                ));
            }
            let adjacent = player
                .position
                .zip(target.position)
                .is_some_and(|(a, t)| a.is_adjacent(&t));
            if !adjacent {
                return Err(RulesError::Inadmissible("target not adjacent".to_string()));
            }
            Ok(())
        }
        Action::ThrowTeammate {
            player_id,
            teammate_id,
            target,
        } => {
            let player = require_own(state, *player_id)?;
            require_standing(player)?;
            require_pass_slot(state, side)?;
            require_skill(player, Skill::ThrowTeamMate)?;
            let teammate = get_player(state, *teammate_id)?;
            if teammate.side() != side
                || !teammate.is_standing()
                || !teammate.has_skill(Skill::RightStuff)
            {
                return Err(RulesError::Inadmissible(
                    "needs an adjacent Right Stuff teammate".to_string(),
                ));
            }
            let adjacent = player
                .position
                .zip(teammate.position)
                .is_some_and(|(a, t)| a.is_adjacent(&t));
            if !adjacent {
                return Err(RulesError::Inadmissible("teammate not adjacent".to_string()));
            }
            if !target.is_on_pitch() {
                return Err(RulesError::OffPitch {
                    x: target.x,
                    y: target.y,
                });
            }
            Ok(())
        }
        Action::BombThrow { player_id, target } => {
            let player = require_own(state, *player_id)?;
            require_standing(player)?;
            require_pass_slot(state, side)?;
            require_skill(player, Skill::Bombardier)?;
            if !target.is_on_pitch() {
                return Err(RulesError::OffPitch {
                    x: target.x,
                    y: target.y,
                });
            }
            let from = player.position.unwrap_or_default();
            PassRange::from_distance(from.distance(target))
                .ok_or(RulesError::Inadmissible("target out of range".to_string()))?;
            Ok(())
        }
        Action::HypnoticGaze {
            player_id,
            target_id,
        } => {
            let player = require_own(state, *player_id)?;
            require_standing(player)?;
            require_skill(player, Skill::HypnoticGaze)?;
            let target = get_player(state, *target_id)?;
            if target.side() == side || !target.is_standing() {
                return Err(RulesError::Inadmissible(
                    "gaze needs a standing opponent".to_string(),
                ));
            }
            let adjacent = player
                .position
                .zip(target.position)
                .is_some_and(|(a, t)| a.is_adjacent(&t));
            if !adjacent {
                return Err(RulesError::Inadmissible("target not adjacent".to_string()));
            }
            Ok(())
        }
        Action::BallAndChain { player_id } => {
            let player = require_own(state, *player_id)?;
            require_standing(player)?;
            require_skill(player, Skill::BallAndChain)?;
            Ok(())
        }
        Action::MultipleBlock {
            player_id,
            target_ids,
        } => {
            let player = require_own(state, *player_id)?;
            require_standing(player)?;
            require_skill(player, Skill::MultipleBlock)?;
            if player.flags.has_moved {
                return Err(RulesError::CannotAct(
                    *player_id,
                    "cannot block after moving".to_string(),
                ));
            }
            if target_ids[0] == target_ids[1] {
                return Err(RulesError::Inadmissible(
                    "multiple block needs two distinct targets".to_string(),
                ));
            }
            for target_id in target_ids {
                let target = get_player(state, *target_id)?;
                if target.side() == side || !target.is_standing() {
                    return Err(RulesError::Inadmissible(
                        "targets must be standing opponents".to_string(),
                    ));
                }
                let adjacent = player
                    .position
                    .zip(target.position)
                    .is_some_and(|(a, t)| a.is_adjacent(&t));
                if !adjacent {
                    return Err(RulesError::Inadmissible("target not adjacent".to_string()));
                }
            }
            Ok(())
        }
        Action::Setup { .. } => unreachable!("handled above"),
    }
}

fn require_pass_slot(state: &GameState, side: Side) -> Result<(), RulesError> {
    if state.team(side).pass_used_this_turn {
        return Err(RulesError::Inadmissible(
            "pass-type action already used this turn".to_string(),
        ));
    }
    Ok(())
}

fn require_skill(player: &Player, skill: Skill) -> Result<(), RulesError> {
    if !player.has_skill(skill) {
        return Err(RulesError::CannotAct(
            player.id,
            format!("lacks the {skill:?} skill"),
        ));
    }
    Ok(())
}

/// Enumerate the actions admissible from this state, in a deterministic
/// order. Empty outside the setup and play phases: the flow entry points
/// (`start_game`, `next_drive`) advance those.
pub fn available_actions(state: &GameState) -> Vec<Action> {
    let mut actions = Vec::new();
    match state.phase {
        Phase::Setup => {
            for formation in [
                Formation::Line,
                Formation::Spread,
                Formation::Wedge,
                Formation::Zone,
            ] {
                actions.push(Action::Setup {
                    formation,
                    kick_target: None,
                });
            }
        }
        Phase::Play => {
            let Some(side) = state.active_team else {
                return actions;
            };
            let ids: Vec<PlayerId> = state.players_of(side).map(|p| p.id).collect();
            for id in ids {
                push_player_actions(state, side, id, &mut actions);
            }
            actions.push(Action::EndTurn);
        }
        _ => {}
    }
    actions
}

fn push_player_actions(state: &GameState, side: Side, id: PlayerId, actions: &mut Vec<Action>) {
    let Some(player) = state.player(id) else {
        return;
    };
    if !player.is_on_pitch() || player.flags.has_acted || player.status == PlayerStatus::Stunned
    {
        return;
    }
    let Some(position) = player.position else {
        return;
    };

    if player.status == PlayerStatus::Prone {
        if player.flags.movement_remaining >= crate::model::constants::STAND_UP_COST {
            actions.push(Action::Move {
                player_id: id,
                x: position.x,
                y: position.y,
            });
        }
        return;
    }

    // Move destinations: every reachable target.
    let paths = match Pathfinder::new(state, player) {
        Ok(finder) => finder.find_all_paths(),
        Err(_) => Vec::new(),
    };
    for path in &paths {
        actions.push(Action::Move {
            player_id: id,
            x: path.target.x,
            y: path.target.y,
        });
    }

    // Blocks from where he stands.
    if !player.flags.has_moved {
        for opponent in state.adjacent_opponents(side, &position) {
            if opponent.is_standing() {
                actions.push(Action::Block {
                    attacker_id: id,
                    target_id: opponent.id,
                });
            }
        }
        if player.has_skill(Skill::MultipleBlock) {
            let standing: Vec<PlayerId> = state
                .adjacent_opponents(side, &position)
                .iter()
                .filter(|p| p.is_standing())
                .map(|p| p.id)
                .collect();
            for (i, a) in standing.iter().enumerate() {
                for b in standing.iter().skip(i + 1) {
                    actions.push(Action::MultipleBlock {
                        player_id: id,
                        target_ids: [*a, *b],
                    });
                }
            }
        }
    }

    // Blitz: one entry per reachable opponent, via the most reliable cell.
    if !state.team(side).blitz_used_this_turn && !player.flags.used_blitz {
        let mut scratch = player.clone();
        scratch.flags.movement_remaining -= 1;
        let blitz_paths = if scratch.flags.movement_remaining + scratch.gfi_allowance() >= 0 {
            Pathfinder::new(state, &scratch)
                .map(|f| f.find_all_paths())
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        for opponent in state.players_of(side.opponent()) {
            if !opponent.is_standing() {
                continue;
            }
            let Some(opp_pos) = opponent.position else {
                continue;
            };
            let mut best: Option<(f64, Square)> = None;
            if position.is_adjacent(&opp_pos) {
                best = Some((1.0, position));
            }
            for path in &blitz_paths {
                if !path.target.is_adjacent(&opp_pos) {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((prob, cell)) => {
                        path.prob > prob || (path.prob == prob && path.target < cell)
                    }
                };
                if better {
                    best = Some((path.prob, path.target));
                }
            }
            if let Some((_, cell)) = best {
                actions.push(Action::Blitz {
                    player_id: id,
                    x: cell.x,
                    y: cell.y,
                    target_id: opponent.id,
                });
            }
        }
    }

    // Ball-in-hand options.
    let pass_slot_free = !state.team(side).pass_used_this_turn;
    if state.ball.is_carried_by(id) && pass_slot_free {
        for teammate in state.players_of(side) {
            if teammate.id == id || !teammate.is_standing() {
                continue;
            }
            let Some(target) = teammate.position else {
                continue;
            };
            let Some(range) = PassRange::from_distance(position.distance(&target)) else {
                continue;
            };
            if state.weather == Weather::Blizzard && range > PassRange::Short {
                continue;
            }
            if position.is_adjacent(&target) {
                actions.push(Action::HandOff {
                    player_id: id,
                    target_id: teammate.id,
                });
            }
            actions.push(Action::Pass {
                player_id: id,
                target,
            });
        }
    }

    // Fouls.
    if !state.team(side).foul_used_this_turn {
        for opponent in state.adjacent_opponents(side, &position) {
            if matches!(opponent.status, PlayerStatus::Prone | PlayerStatus::Stunned) {
                actions.push(Action::Foul {
                    player_id: id,
                    target_id: opponent.id,
                });
            }
        }
    }

    // Skill-gated specials.
    if player.has_skill(Skill::HypnoticGaze) {
        for opponent in state.adjacent_opponents(side, &position) {
            if opponent.is_standing() {
                actions.push(Action::HypnoticGaze {
                    player_id: id,
                    target_id: opponent.id,
                });
            }
        }
    }
    if player.has_skill(Skill::BallAndChain) && !player.flags.has_moved {
        actions.push(Action::BallAndChain { player_id: id });
    }
    if player.has_skill(Skill::ThrowTeamMate) && pass_slot_free {
        for teammate in state.adjacent_teammates(side, &position) {
            if !teammate.is_standing() || !teammate.has_skill(Skill::RightStuff) {
                continue;
            }
            // Aim at the most advanced free cell in short range.
            let step = match side {
                Side::Home => 1,
                Side::Away => -1,
            };
            for distance in (1..=6).rev() {
                let target = Square::new(position.x + step * distance, position.y);
                if target.is_on_pitch() && !state.is_occupied(&target) {
                    actions.push(Action::ThrowTeammate {
                        player_id: id,
                        teammate_id: teammate.id,
                        target,
                    });
                    break;
                }
            }
        }
    }
    if player.has_skill(Skill::Bombardier) && pass_slot_free {
        for opponent in state.players_of(side.opponent()) {
            if !opponent.is_standing() {
                continue;
            }
            let Some(target) = opponent.position else {
                continue;
            };
            if PassRange::from_distance(position.distance(&target)).is_some() {
                actions.push(Action::BombThrow {
                    player_id: id,
                    target,
                });
            }
        }
    }
}
