use crate::dice::DiceSource;
use crate::model::ball::Ball;
use crate::model::enums::{Phase, PlayerStatus, Side, Weather};
use crate::model::event::GameEvent;
use crate::model::game::GameState;
use crate::model::player::PlayerId;
use crate::model::skills::Skill;

use super::kickoff::weather_from_2d6;

/// Open the match: roll the opening weather and the coin toss, then hand
/// the pitch to the kicking team for setup. The toss winner elects to
/// receive.
pub fn start_game(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
) -> Result<(), String> {
    if state.phase != Phase::CoinToss {
        return Err(format!("start_game in phase {:?}", state.phase));
    }
    let weather = weather_from_2d6(dice.roll_2d6());
    state.weather = weather;
    events.push(GameEvent::WeatherChange { weather });

    let toss = dice.roll_d6();
    let receiving = if toss >= 4 { Side::Away } else { Side::Home };
    state.kicking_team = Some(receiving.opponent());
    state.phase = Phase::Setup;
    state.active_team = state.kicking_team;
    Ok(())
}

/// Touchdown check: a standing carrier in the column he attacks scores
/// immediately. Sets up the next drive's kicking side (the scorer kicks).
pub fn check_touchdown(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
) -> Result<bool, String> {
    if state.phase != Phase::Play {
        return Ok(false);
    }
    let Some(carrier) = state.carrier() else {
        return Ok(false);
    };
    if !carrier.is_standing() {
        return Ok(false);
    }
    let Some(position) = carrier.position else {
        return Ok(false);
    };
    let side = carrier.side();
    if !position.is_endzone(side) {
        return Ok(false);
    }

    let id = carrier.id;
    events.push(GameEvent::Touchdown {
        player_id: id,
        side,
    });
    state.team_mut(side).score += 1;
    state.phase = Phase::Touchdown;
    state.kicking_team = Some(side);
    state.turnover_pending = false;
    Ok(true)
}

/// Close the half when both turn counters are spent. KO recovery and the
/// second-half setup happen in `next_drive`.
pub fn end_half(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    _dice: &mut dyn DiceSource,
) -> Result<(), String> {
    if state.half >= 2 {
        state.phase = Phase::GameOver;
        state.active_team = None;
        events.push(GameEvent::GameOver {
            home_score: state.home.score,
            away_score: state.away.score,
        });
    } else {
        state.phase = Phase::HalfTime;
        state.active_team = None;
        events.push(GameEvent::HalfTime);
    }
    Ok(())
}

/// Advance past a touchdown or half-time break: ejections, faint checks,
/// drive reset, KO recovery, and the next setup — or the final whistle.
pub fn next_drive(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
) -> Result<(), String> {
    match state.phase {
        Phase::Touchdown => {
            post_drive_cleanup(state, events, dice)?;
            if super::turn::half_exhausted(state) {
                end_half(state, events, dice)?;
            } else {
                state.phase = Phase::Setup;
                state.active_team = state.kicking_team;
            }
            Ok(())
        }
        Phase::HalfTime => {
            state.half = 2;
            ko_recovery(state, events, dice);
            leader_bonus(state, events);
            for side in [Side::Home, Side::Away] {
                let team = state.team_mut(side);
                team.turn_number = 0;
                team.begin_turn();
            }
            // Teams swap duties for the second half.
            state.kicking_team = state.kicking_team.map(|side| side.opponent());
            state.phase = Phase::Setup;
            state.active_team = state.kicking_team;
            Ok(())
        }
        Phase::GameOver => Err("the match is over".to_string()),
        other => Err(format!("next_drive in phase {other:?}")),
    }
}

/// Secret weapons get ejected, the heat claims the unlucky, everyone else
/// returns to the reserves box and the ball leaves the pitch.
fn post_drive_cleanup(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
) -> Result<(), String> {
    let on_pitch: Vec<PlayerId> = state
        .players
        .values()
        .filter(|p| p.is_on_pitch())
        .map(|p| p.id)
        .collect();

    for id in &on_pitch {
        if state.player(*id).is_some_and(|p| p.has_skill(Skill::SecretWeapon)) {
            events.push(GameEvent::SecretWeaponEjection { player_id: *id });
            let player = state.player_mut(*id).expect("player vanished");
            player.status = PlayerStatus::Ejected;
            player.position = None;
        }
    }

    if state.weather == Weather::SwelteringHeat {
        for id in &on_pitch {
            if !state.player(*id).is_some_and(|p| p.is_on_pitch()) {
                continue;
            }
            if dice.roll_d6() == 1 {
                let player = state.player_mut(*id).expect("player vanished");
                player.status = PlayerStatus::OffPitch;
                player.position = None;
            }
        }
    }

    for id in on_pitch {
        if let Some(player) = state.player_mut(id) {
            if player.is_on_pitch() {
                player.status = PlayerStatus::OffPitch;
                player.position = None;
            }
        }
    }
    state.ball = Ball::OffPitch;
    state.turnover_pending = false;
    state.active_team = None;
    Ok(())
}

fn ko_recovery(state: &mut GameState, events: &mut Vec<GameEvent>, dice: &mut dyn DiceSource) {
    let kod: Vec<PlayerId> = state
        .players
        .values()
        .filter(|p| p.status == PlayerStatus::KnockedOut)
        .map(|p| p.id)
        .collect();
    for id in kod {
        let roll = dice.roll_d6();
        let success = roll >= 4;
        events.push(GameEvent::KoRecovery {
            player_id: id,
            roll,
            success,
        });
        if success {
            state.player_mut(id).expect("player vanished").status = PlayerStatus::OffPitch;
        }
    }
}

/// A fit Leader is worth one extra team reroll for the new half.
fn leader_bonus(state: &mut GameState, events: &mut Vec<GameEvent>) {
    for side in [Side::Home, Side::Away] {
        let leader = state
            .players_of(side)
            .filter(|p| {
                !matches!(
                    p.status,
                    PlayerStatus::Injured | PlayerStatus::Dead | PlayerStatus::Ejected
                )
            })
            .find(|p| p.has_skill(Skill::Leader))
            .map(|p| p.id);
        if let Some(id) = leader {
            events.push(GameEvent::SkillUsed {
                player_id: id,
                skill: Skill::Leader,
            });
            state.team_mut(side).rerolls_total += 1;
        }
    }
}
