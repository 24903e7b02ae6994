use crate::dice::DiceSource;
use crate::model::ball::Ball;
use crate::model::constants::clamp_target;
use crate::model::enums::Weather;
use crate::model::event::GameEvent;
use crate::model::game::GameState;
use crate::model::player::PlayerId;
use crate::model::position::Square;
use crate::model::skills::Skill;

use super::turn::{roll_with_cascade, RollSpec};

/// Attempt to pick the ball up off the ground at the player's cell.
/// On failure the ball bounces; the caller decides whether that is a
/// turnover.
pub fn attempt_pickup(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    player_id: PlayerId,
) -> Result<bool, String> {
    let player = state
        .player(player_id)
        .ok_or_else(|| format!("pickup by unknown {player_id}"))?;
    let cell = player.position.ok_or("pickup by off-pitch player")?;
    if state.ball.on_ground_at() != Some(cell) {
        return Err("pickup attempted away from the ball".to_string());
    }

    if player.has_skill(Skill::NoHands) {
        events.push(GameEvent::Pickup {
            player_id,
            roll: 0,
            target: 6,
            success: false,
        });
        bounce(state, events, dice, cell)?;
        return Ok(false);
    }

    let side = player.side();
    let big_hand = player.has_skill(Skill::BigHand);
    let mut raw = 7 - player.get_ag() as i8;
    if !big_hand {
        raw += state.tacklezones_at(side, &cell, Some(player_id)) as i8;
        if state.weather == Weather::PouringRain {
            raw += 1;
        }
    }
    let target = clamp_target(raw);

    let spec = RollSpec {
        player_id,
        target,
        skill_reroll: Some(Skill::SureHands),
        skill_reroll_blocked: false,
    };
    let success = roll_with_cascade(state, events, dice, &spec, &mut |events, roll, success| {
        events.push(GameEvent::Pickup {
            player_id,
            roll,
            target,
            success,
        });
    })?;

    if success {
        state.ball = Ball::Carried(player_id);
    } else {
        bounce(state, events, dice, cell)?;
    }
    Ok(success)
}

/// Attempt to catch a ball arriving at the player's cell. `accurate` grants
/// the +1 for an accurate pass or a handoff.
pub fn attempt_catch(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    player_id: PlayerId,
    accurate: bool,
) -> Result<bool, String> {
    let player = state
        .player(player_id)
        .ok_or_else(|| format!("catch by unknown {player_id}"))?;
    let cell = player.position.ok_or("catch by off-pitch player")?;

    if !player.is_standing() || player.has_skill(Skill::NoHands) {
        events.push(GameEvent::Catch {
            player_id,
            roll: 0,
            target: 6,
            success: false,
        });
        bounce(state, events, dice, cell)?;
        return Ok(false);
    }

    let side = player.side();
    let mut raw = 7 - player.get_ag() as i8;
    if !player.has_skill(Skill::NervesOfSteel) {
        raw += state.tacklezones_at(side, &cell, Some(player_id)) as i8;
    }
    if accurate {
        raw -= 1;
    }
    if state.weather == Weather::PouringRain {
        raw += 1;
    }
    let target = clamp_target(raw);

    let spec = RollSpec {
        player_id,
        target,
        skill_reroll: Some(Skill::Catch),
        skill_reroll_blocked: false,
    };
    let success = roll_with_cascade(state, events, dice, &spec, &mut |events, roll, success| {
        events.push(GameEvent::Catch {
            player_id,
            roll,
            target,
            success,
        });
    })?;

    if success {
        state.ball = Ball::Carried(player_id);
    } else {
        bounce(state, events, dice, cell)?;
    }
    Ok(success)
}

/// Settle a loose ball arriving on `cell`: a standing player attempts a
/// catch, otherwise (prone, stunned or empty) the ball rests there.
pub fn land_at(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    cell: Square,
) -> Result<(), String> {
    let catcher = state
        .player_at(&cell)
        .filter(|p| p.is_standing())
        .map(|p| p.id);
    match catcher {
        Some(id) => {
            attempt_catch(state, events, dice, id, false)?;
        }
        None => {
            state.ball = Ball::OnGround(cell);
        }
    }
    Ok(())
}

/// Bounce the ball one cell in a D8 compass direction. Off-pitch bounces
/// become throw-ins from the boundary cell.
pub fn bounce(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    from: Square,
) -> Result<(), String> {
    let direction = dice.roll_d8();
    let to = from.compass_neighbour(direction);
    events.push(GameEvent::BallBounce {
        from,
        to,
        direction,
    });
    if !to.is_on_pitch() {
        return throw_in(state, events, dice, from);
    }
    land_at(state, events, dice, to)
}

/// The crowd hurls the ball back: D8 direction plus 2D6 squares from the
/// boundary cell where it left. Going out again triggers another throw-in
/// from the last cell the ball crossed.
pub fn throw_in(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    origin: Square,
) -> Result<(), String> {
    let direction = dice.roll_d8();
    let distance = dice.roll_2d6();
    let mut last_on_pitch = origin;
    let mut left_pitch = false;
    for step in 1..=distance {
        let cell = Square::new(
            origin.x + (cell_delta(direction).0 * step as i32),
            origin.y + (cell_delta(direction).1 * step as i32),
        );
        if cell.is_on_pitch() {
            last_on_pitch = cell;
        } else {
            left_pitch = true;
            break;
        }
    }
    events.push(GameEvent::ThrowIn {
        from: origin,
        to: last_on_pitch,
    });
    if left_pitch && last_on_pitch == origin {
        // Straight back into the crowd: thrown in again from the same spot.
        return throw_in(state, events, dice, origin);
    }
    if left_pitch {
        return throw_in(state, events, dice, last_on_pitch);
    }
    land_at(state, events, dice, last_on_pitch)
}

fn cell_delta(direction: u8) -> (i32, i32) {
    crate::model::constants::D8_COMPASS[(direction - 1) as usize]
}

/// A carrier lost the ball at `cell` (knocked down, stripped): it bounces
/// from there.
pub fn drop_ball(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    cell: Square,
) -> Result<(), String> {
    state.ball = Ball::OnGround(cell);
    bounce(state, events, dice, cell)
}
