use crate::dice::DiceSource;
use crate::model::ball::Ball;
use crate::model::constants::{
    D8_COMPASS, LOS_AWAY_X, LOS_HOME_X, PITCH_HEIGHT, PITCH_WIDTH,
};
use crate::model::enums::{
    ActionOutcome, Formation, KickoffEvent, Phase, PlayerStatus, Side, Weather,
};
use crate::model::event::GameEvent;
use crate::model::game::GameState;
use crate::model::player::PlayerId;
use crate::model::position::Square;
use crate::model::skills::Skill;

/// The 2D6 weather table.
pub fn weather_from_2d6(roll: u8) -> Weather {
    match roll {
        2 => Weather::SwelteringHeat,
        3 => Weather::VerySunny,
        4..=10 => Weather::Nice,
        11 => Weather::PouringRain,
        _ => Weather::Blizzard,
    }
}

/// Formation templates as (columns-behind-LOS, row) offsets. Three on the
/// line of scrimmage always; the rest by taste.
fn formation_offsets(formation: Formation) -> [(i32, i32); 11] {
    match formation {
        Formation::Line => [
            (0, 6),
            (0, 7),
            (0, 8),
            (1, 5),
            (1, 6),
            (1, 7),
            (1, 8),
            (1, 9),
            (3, 6),
            (3, 7),
            (3, 8),
        ],
        Formation::Spread => [
            (0, 6),
            (0, 7),
            (0, 8),
            (1, 1),
            (1, 2),
            (1, 12),
            (1, 13),
            (2, 5),
            (2, 9),
            (4, 7),
            (4, 8),
        ],
        Formation::Wedge => [
            (0, 6),
            (0, 7),
            (0, 8),
            (1, 5),
            (1, 9),
            (2, 6),
            (2, 8),
            (3, 7),
            (5, 6),
            (5, 7),
            (5, 8),
        ],
        Formation::Zone => [
            (0, 6),
            (0, 7),
            (0, 8),
            (2, 2),
            (2, 12),
            (4, 4),
            (4, 10),
            (6, 6),
            (6, 8),
            (8, 7),
            (10, 7),
        ],
    }
}

fn formation_cells(side: Side, formation: Formation) -> Vec<Square> {
    formation_offsets(formation)
        .iter()
        .map(|(depth, y)| match side {
            Side::Home => Square::new(LOS_HOME_X - depth, *y),
            Side::Away => Square::new(LOS_AWAY_X + depth, *y),
        })
        .collect()
}

fn receiving_half_centre(receiving: Side) -> Square {
    match receiving {
        Side::Home => Square::new(LOS_HOME_X / 2, PITCH_HEIGHT / 2),
        Side::Away => Square::new((LOS_AWAY_X + PITCH_WIDTH) / 2, PITCH_HEIGHT / 2),
    }
}

fn in_half(square: &Square, side: Side) -> bool {
    square.is_on_pitch()
        && match side {
            Side::Home => square.x <= LOS_HOME_X,
            Side::Away => square.x >= LOS_AWAY_X,
        }
}

/// Resolve a Setup action for the active team. The kicking team goes
/// first and aims the kick; once the receiving team has set up, the whole
/// kickoff sequence runs and play begins.
pub fn resolve_setup(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    formation: Formation,
    kick_target: Option<Square>,
) -> Result<ActionOutcome, String> {
    let side = state.active_team.ok_or("setup without an active team")?;
    let kicking = state.kicking_team.ok_or("setup without a kicking team")?;

    let reserves: Vec<PlayerId> = state
        .players_of(side)
        .filter(|p| p.status == PlayerStatus::OffPitch)
        .map(|p| p.id)
        .collect();
    let cells = formation_cells(side, formation);
    for (id, cell) in reserves.iter().zip(cells.iter()) {
        let player = state.player_mut(*id).expect("reserve vanished");
        player.status = PlayerStatus::Standing;
        player.position = Some(*cell);
        player.begin_turn();
        player.flags.movement_remaining = 0;
    }

    if side == kicking {
        state.pending_kick_target = kick_target;
        state.active_team = Some(kicking.opponent());
        return Ok(ActionOutcome::Success);
    }

    // Receiving team has set up: kick off.
    state.phase = Phase::Kickoff;
    let target = state.pending_kick_target.take();
    run_kickoff(state, events, dice, target)?;

    let receiving = kicking.opponent();
    state.phase = Phase::Play;
    state.active_team = Some(receiving);
    super::turn::begin_team_turn(state, receiving);
    Ok(ActionOutcome::Success)
}

/// Kick placement, scatter, the 2D6 event table, then touchback or the
/// landing resolution.
pub fn run_kickoff(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    target: Option<Square>,
) -> Result<(), String> {
    let kicking = state.kicking_team.ok_or("kickoff without a kicking team")?;
    let receiving = kicking.opponent();

    let target = target
        .filter(|t| in_half(t, receiving))
        .unwrap_or_else(|| receiving_half_centre(receiving));

    // Scatter: D8 direction, 2D6 squares, halved by a kicker with Kick.
    let direction = dice.roll_d8();
    let mut distance = dice.roll_2d6() as i32;
    let has_kicker = state
        .players_of(kicking)
        .any(|p| p.is_standing() && p.has_skill(Skill::Kick));
    if has_kicker {
        distance /= 2;
    }
    let (dx, dy) = D8_COMPASS[(direction - 1) as usize];
    let landed = Square::new(target.x + dx * distance, target.y + dy * distance);

    let table_roll = dice.roll_2d6();
    let event = KickoffEvent::from_2d6(table_roll);
    apply_kickoff_event(state, events, dice, event, receiving, landed)?;

    if !in_half(&landed, receiving) {
        // Touchback: the receiving team hands the ball to a player.
        let carrier = state
            .players_of(receiving)
            .filter(|p| p.is_standing())
            .map(|p| p.id)
            .min();
        events.push(GameEvent::Kickoff {
            target,
            landed,
            touchback: true,
        });
        match carrier {
            Some(id) => state.ball = Ball::Carried(id),
            None => state.ball = Ball::OnGround(receiving_half_centre(receiving)),
        }
        return Ok(());
    }

    events.push(GameEvent::Kickoff {
        target,
        landed,
        touchback: false,
    });
    let catcher = state
        .player_at(&landed)
        .filter(|p| p.is_standing())
        .map(|p| p.id);
    match catcher {
        Some(id) => {
            state.ball = Ball::OnGround(landed);
            super::ball::attempt_catch(state, events, dice, id, false)?;
        }
        None => {
            // Lands and takes one bounce.
            state.ball = Ball::OnGround(landed);
            super::ball::bounce(state, events, dice, landed)?;
        }
    }
    Ok(())
}

fn apply_kickoff_event(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    event: KickoffEvent,
    receiving: Side,
    landed: Square,
) -> Result<(), String> {
    let kicking = receiving.opponent();
    match event {
        KickoffEvent::GetTheRef => {
            events.push(GameEvent::KickoffEventGetTheRef);
        }
        KickoffEvent::Riot => {
            let roll = dice.roll_d6();
            let forward = roll >= 4;
            events.push(GameEvent::KickoffEventRiot {
                roll,
                turns_forward: forward,
            });
            for side in [Side::Home, Side::Away] {
                let team = state.team_mut(side);
                if forward {
                    team.turn_number = (team.turn_number + 1).min(8);
                } else {
                    team.turn_number = team.turn_number.saturating_sub(1);
                }
            }
        }
        KickoffEvent::PerfectDefence => {
            events.push(GameEvent::KickoffEventPerfectDefence { side: kicking });
        }
        KickoffEvent::HighKick => {
            // One unmarked receiver may run under the ball.
            let candidate = if in_half(&landed, receiving) && !state.is_occupied(&landed) {
                state
                    .players_of(receiving)
                    .filter(|p| p.is_standing())
                    .filter(|p| {
                        p.position.is_some_and(|pos| {
                            state.tacklezones_at(receiving, &pos, Some(p.id)) == 0
                        })
                    })
                    .min_by_key(|p| {
                        (
                            p.position.map_or(u32::MAX, |pos| pos.distance(&landed)),
                            p.id,
                        )
                    })
                    .map(|p| p.id)
            } else {
                None
            };
            events.push(GameEvent::KickoffEventHighKick {
                player_id: candidate,
            });
            if let Some(id) = candidate {
                state.player_mut(id).expect("receiver vanished").position = Some(landed);
            }
        }
        KickoffEvent::CheeringFans | KickoffEvent::BrilliantCoaching => {
            let home_roll = dice.roll_d6();
            let away_roll = dice.roll_d6();
            if event == KickoffEvent::CheeringFans {
                events.push(GameEvent::KickoffEventCheeringFans {
                    home_roll,
                    away_roll,
                });
            } else {
                events.push(GameEvent::KickoffEventBrilliantCoaching {
                    home_roll,
                    away_roll,
                });
            }
            if home_roll >= away_roll {
                state.home.rerolls_total += 1;
            }
            if away_roll >= home_roll {
                state.away.rerolls_total += 1;
            }
        }
        KickoffEvent::WeatherChange => {
            events.push(GameEvent::KickoffEventWeatherChange);
            let weather = weather_from_2d6(dice.roll_2d6());
            state.weather = weather;
            events.push(GameEvent::WeatherChange { weather });
        }
        KickoffEvent::QuickSnap => {
            events.push(GameEvent::KickoffEventQuickSnap { side: receiving });
            // Every receiver shuffles one square towards the opposing half.
            let step = match receiving {
                Side::Home => 1,
                Side::Away => -1,
            };
            let ids: Vec<PlayerId> = state
                .players_of(receiving)
                .filter(|p| p.is_standing())
                .map(|p| p.id)
                .collect();
            for id in ids {
                let Some(pos) = state.player(id).and_then(|p| p.position) else {
                    continue;
                };
                let next = Square::new(pos.x + step, pos.y);
                if next.is_on_pitch() && !state.is_occupied(&next) {
                    state.player_mut(id).expect("receiver vanished").position = Some(next);
                }
            }
        }
        KickoffEvent::Blitz => {
            events.push(GameEvent::KickoffEventBlitz { side: kicking });
        }
        KickoffEvent::ThrowARock => {
            let side = if dice.roll_d6() <= 3 {
                Side::Home
            } else {
                Side::Away
            };
            let targets: Vec<PlayerId> = state
                .players_of(side)
                .filter(|p| p.is_standing())
                .map(|p| p.id)
                .collect();
            if !targets.is_empty() {
                let (r1, r2) = (dice.roll_d6(), dice.roll_d6());
                let index = ((r1 - 1) as usize * 6 + (r2 - 1) as usize) % targets.len();
                let victim = targets[index];
                events.push(GameEvent::KickoffEventThrowARock { player_id: victim });
                state.player_mut(victim).expect("victim vanished").status =
                    PlayerStatus::Stunned;
            }
        }
        KickoffEvent::PitchInvasion => {
            let mut stunned = Vec::new();
            for side in [Side::Home, Side::Away] {
                let count = dice.roll_d3() as usize;
                let ids: Vec<PlayerId> = state
                    .players_of(side)
                    .filter(|p| p.is_standing())
                    .map(|p| p.id)
                    .take(count)
                    .collect();
                for id in ids {
                    state.player_mut(id).expect("player vanished").status =
                        PlayerStatus::Stunned;
                    stunned.push(id);
                }
            }
            events.push(GameEvent::KickoffEventPitchInvasion { stunned });
        }
    }
    Ok(())
}
