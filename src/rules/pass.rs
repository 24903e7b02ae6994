use crate::dice::DiceSource;
use crate::model::ball::Ball;
use crate::model::constants::clamp_target;
use crate::model::enums::{ActionOutcome, PassOutcome, PassRange, Weather};
use crate::model::event::GameEvent;
use crate::model::game::GameState;
use crate::model::player::PlayerId;
use crate::model::position::Square;
use crate::model::skills::Skill;

use super::injury::{armour_roll, injury_roll, knock_down, InjuryContext};
use super::turn::{roll_with_cascade, RollSpec};

/// Hand the ball to an adjacent standing teammate. Counts against the
/// team's one pass-type action per turn.
pub fn resolve_handoff(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    player_id: PlayerId,
    target_id: PlayerId,
) -> Result<ActionOutcome, String> {
    let side = state
        .player(player_id)
        .ok_or_else(|| format!("handoff by unknown {player_id}"))?
        .side();
    state.team_mut(side).pass_used_this_turn = true;
    if let Some(player) = state.player_mut(player_id) {
        player.flags.has_acted = true;
    }

    state.ball = Ball::OnGround(
        state
            .player(target_id)
            .and_then(|p| p.position)
            .ok_or("handoff to off-pitch player")?,
    );
    super::ball::attempt_catch(state, events, dice, target_id, true)?;

    super::flow::check_touchdown(state, events)?;
    if state.ball.carrier().map(|id| id.side()) == Some(side) {
        Ok(ActionOutcome::Success)
    } else {
        state.turnover_pending = true;
        Ok(ActionOutcome::Turnover)
    }
}

struct ThrowNumbers {
    target: u8,
    penalty: i8,
    range: PassRange,
}

/// Pass target number and the net penalty, per the range/zone/skill table.
fn throw_numbers(
    state: &GameState,
    passer_id: PlayerId,
    target: &Square,
) -> Result<ThrowNumbers, String> {
    let passer = state
        .player(passer_id)
        .ok_or_else(|| format!("throw by unknown {passer_id}"))?;
    let from = passer.position.ok_or("throw by off-pitch player")?;
    let range = PassRange::from_distance(from.distance(target))
        .ok_or("target beyond bomb range")?;

    let mut penalty = range.modifier();
    if !passer.has_skill(Skill::NervesOfSteel) {
        penalty += state.tacklezones_at(passer.side(), &from, Some(passer_id)) as i8;
    }
    if passer.has_skill(Skill::Accurate) {
        penalty -= 1;
    }
    if passer.has_skill(Skill::StrongArm) && range >= PassRange::Long {
        penalty -= 1;
    }
    if state.weather == Weather::VerySunny {
        penalty += 1;
    }
    let target_number = clamp_target(7 - passer.get_ag() as i8 + penalty);
    Ok(ThrowNumbers {
        target: target_number,
        penalty,
        range,
    })
}

fn classify_throw(roll: u8, target: u8, penalty: i8) -> PassOutcome {
    if roll == 1 {
        PassOutcome::Fumble
    } else if roll as i8 - penalty <= 1 {
        PassOutcome::WildlyInaccurate
    } else if roll >= target {
        PassOutcome::Accurate
    } else {
        PassOutcome::Inaccurate
    }
}

/// Scatter a loose ball three single-cell hops and settle it.
fn scatter_and_land(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    from: Square,
) -> Result<(), String> {
    let mut current = from;
    for _ in 0..3 {
        let direction = dice.roll_d8();
        let next = current.compass_neighbour(direction);
        events.push(GameEvent::BallBounce {
            from: current,
            to: next,
            direction,
        });
        if !next.is_on_pitch() {
            return super::ball::throw_in(state, events, dice, current);
        }
        current = next;
    }
    super::ball::land_at(state, events, dice, current)
}

/// Resolve a Pass action: roll against the range/zone target, check for
/// interceptions on the corridor, fly or scatter the ball, settle it, and
/// call the turnover.
pub fn resolve_pass(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    passer_id: PlayerId,
    target: Square,
) -> Result<ActionOutcome, String> {
    let side = state
        .player(passer_id)
        .ok_or_else(|| format!("pass by unknown {passer_id}"))?
        .side();
    let from = state
        .player(passer_id)
        .and_then(|p| p.position)
        .ok_or("pass by off-pitch player")?;
    state.team_mut(side).pass_used_this_turn = true;
    if let Some(player) = state.player_mut(passer_id) {
        player.flags.has_acted = true;
    }

    let numbers = throw_numbers(state, passer_id, &target)?;
    let spec = RollSpec {
        player_id: passer_id,
        target: numbers.target,
        skill_reroll: Some(Skill::Pass),
        skill_reroll_blocked: false,
    };
    let mut last_roll = 0;
    roll_with_cascade(state, events, dice, &spec, &mut |events, roll, _| {
        last_roll = roll;
        events.push(GameEvent::PassAttempt {
            player_id: passer_id,
            target,
            range: numbers.range,
            roll,
            target_number: numbers.target,
            outcome: classify_throw(roll, numbers.target, numbers.penalty),
        });
    })?;
    let outcome = classify_throw(last_roll, numbers.target, numbers.penalty);

    if outcome == PassOutcome::Fumble {
        super::ball::drop_ball(state, events, dice, from)?;
        state.turnover_pending = true;
        return Ok(ActionOutcome::Turnover);
    }

    // Interception window on the corridor.
    if intercepted(state, events, dice, passer_id, &from, &target)? {
        state.turnover_pending = true;
        return Ok(ActionOutcome::Turnover);
    }

    match outcome {
        PassOutcome::Accurate => {
            state.ball = Ball::OnGround(target);
            let catcher = state.player_at(&target).map(|p| p.id);
            match catcher {
                Some(catcher) => {
                    super::ball::attempt_catch(state, events, dice, catcher, true)?;
                }
                None => super::ball::land_at(state, events, dice, target)?,
            }
        }
        PassOutcome::Inaccurate => {
            state.ball = Ball::OnGround(target);
            scatter_and_land(state, events, dice, target)?;
        }
        PassOutcome::WildlyInaccurate => {
            state.ball = Ball::OnGround(from);
            scatter_and_land(state, events, dice, from)?;
        }
        PassOutcome::Fumble => unreachable!("fumble handled above"),
    }

    super::flow::check_touchdown(state, events)?;
    if state.ball.carrier().map(|id| id.side()) == Some(side) {
        Ok(ActionOutcome::Success)
    } else {
        state.turnover_pending = true;
        Ok(ActionOutcome::Turnover)
    }
}

/// The best-placed standing opponent on the corridor gets one shot at the
/// ball; Safe Throw lets the passer cancel it.
fn intercepted(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    passer_id: PlayerId,
    from: &Square,
    target: &Square,
) -> Result<bool, String> {
    let side = state
        .player(passer_id)
        .ok_or("interception without passer")?
        .side();
    let corridor = from.pass_path(target);
    let interceptor = state
        .players_of(side.opponent())
        .filter(|p| p.is_standing())
        .filter(|p| {
            p.position.is_some_and(|pos| {
                pos != *from && pos != *target && corridor.contains(&pos)
            })
        })
        .max_by_key(|p| (p.get_ag(), std::cmp::Reverse(p.id)))
        .map(|p| p.id);
    let Some(interceptor_id) = interceptor else {
        return Ok(false);
    };

    let ag = state.player(interceptor_id).expect("interceptor vanished").get_ag();
    let target_number = clamp_target(7 - ag as i8 + 1);
    let roll = dice.roll_d6();
    let mut success = roll >= target_number;
    events.push(GameEvent::Interception {
        player_id: interceptor_id,
        roll,
        target: target_number,
        success,
    });
    if !success {
        return Ok(false);
    }

    if state
        .player(passer_id)
        .is_some_and(|p| p.has_skill(Skill::SafeThrow))
    {
        events.push(GameEvent::SkillUsed {
            player_id: passer_id,
            skill: Skill::SafeThrow,
        });
        let passer_ag = state.player(passer_id).expect("passer vanished").get_ag();
        let cancel_target = clamp_target(7 - passer_ag as i8);
        let cancel = dice.roll_d6();
        if cancel >= cancel_target {
            success = false;
        }
    }

    if success {
        state.ball = Ball::Carried(interceptor_id);
        return Ok(true);
    }
    Ok(false)
}

/// Throw a bomb: pass mechanics without the match ball, then a 3x3 burst
/// wherever it comes down. Not a turnover, whatever it hits.
pub fn resolve_bomb(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    passer_id: PlayerId,
    target: Square,
) -> Result<ActionOutcome, String> {
    let side = state
        .player(passer_id)
        .ok_or_else(|| format!("bomb by unknown {passer_id}"))?
        .side();
    let from = state
        .player(passer_id)
        .and_then(|p| p.position)
        .ok_or("bomb by off-pitch player")?;
    state.team_mut(side).pass_used_this_turn = true;
    if let Some(player) = state.player_mut(passer_id) {
        player.flags.has_acted = true;
    }

    let numbers = throw_numbers(state, passer_id, &target)?;
    let spec = RollSpec {
        player_id: passer_id,
        target: numbers.target,
        skill_reroll: Some(Skill::Pass),
        skill_reroll_blocked: false,
    };
    let mut last_roll = 0;
    roll_with_cascade(state, events, dice, &spec, &mut |events, roll, _| {
        last_roll = roll;
        events.push(GameEvent::PassAttempt {
            player_id: passer_id,
            target,
            range: numbers.range,
            roll,
            target_number: numbers.target,
            outcome: classify_throw(roll, numbers.target, numbers.penalty),
        });
    })?;
    let outcome = classify_throw(last_roll, numbers.target, numbers.penalty);

    let center = match outcome {
        PassOutcome::Accurate => Some(target),
        PassOutcome::Fumble => Some(from),
        PassOutcome::Inaccurate | PassOutcome::WildlyInaccurate => {
            let origin = if outcome == PassOutcome::Inaccurate {
                target
            } else {
                from
            };
            let mut current = origin;
            let mut fizzled = false;
            for _ in 0..3 {
                let direction = dice.roll_d8();
                let next = current.compass_neighbour(direction);
                if !next.is_on_pitch() {
                    fizzled = true;
                    break;
                }
                current = next;
            }
            if fizzled {
                None
            } else {
                Some(current)
            }
        }
    };

    if let Some(center) = center {
        detonate(state, events, dice, passer_id, center)?;
    }
    Ok(if outcome == PassOutcome::Accurate {
        ActionOutcome::Success
    } else {
        ActionOutcome::Failure
    })
}

fn detonate(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    _thrower_id: PlayerId,
    center: Square,
) -> Result<(), String> {
    let mut burst = vec![center];
    burst.extend(center.adjacent_squares());
    let hit: Vec<PlayerId> = burst
        .iter()
        .filter_map(|cell| state.player_at(cell))
        .map(|p| p.id)
        .collect();
    for victim in hit {
        let standing = state.player(victim).is_some_and(|p| p.is_standing());
        let ctx = InjuryContext::default();
        if standing {
            knock_down(state, events, dice, victim, &ctx)?;
        } else {
            let armour = armour_roll(state, events, dice, victim, &ctx)?;
            if armour.broken {
                injury_roll(state, events, dice, victim, &ctx)?;
            }
        }
    }
    Ok(())
}
