#![allow(dead_code)]

use gridbowl_core::model::ball::Ball;
use gridbowl_core::model::enums::{Phase, PlayerStatus, Side};
use gridbowl_core::model::game::GameState;
use gridbowl_core::model::player::{Player, PlayerId};
use gridbowl_core::model::position::Square;
use gridbowl_core::model::skills::Skill;
use gridbowl_core::model::team::TeamState;

pub const HOME_PLAYER: PlayerId = PlayerId(1);
pub const AWAY_PLAYER: PlayerId = PlayerId(12);

/// A minimal in-play state: one home player, one away player, optionally a
/// loose ball. Home is active on turn 1.
pub fn two_player_match(
    home: (i32, i32),
    away: (i32, i32),
    ball: Option<(i32, i32)>,
) -> GameState {
    // No team rerolls: scripted dice scenarios count their rolls exactly,
    // and the cascade would otherwise spend a reroll on any failure.
    let mut state = GameState::new(
        TeamState::new("Reavers", "human", Side::Home, 0, false),
        TeamState::new("Raiders", "orc", Side::Away, 0, false),
    );
    state.phase = Phase::Play;
    state.active_team = Some(Side::Home);
    state.home.turn_number = 1;
    state.away.turn_number = 1;

    for (id, (x, y)) in [(HOME_PLAYER, home), (AWAY_PLAYER, away)] {
        let mut player = Player {
            id,
            ma: 6,
            st: 3,
            ag: 3,
            av: 8,
            status: PlayerStatus::Standing,
            position: Some(Square::new(x, y)),
            ..Default::default()
        };
        player.begin_turn();
        state.players.insert(player.id, player);
    }

    if let Some((x, y)) = ball {
        state.ball = Ball::OnGround(Square::new(x, y));
    }
    state
}

/// Add one more standing player to an existing state.
#[allow(dead_code)]
pub fn add_player(
    state: &mut GameState,
    id: u8,
    x: i32,
    y: i32,
    skills: &[Skill],
) -> PlayerId {
    let mut player = Player {
        id: PlayerId(id),
        ma: 6,
        st: 3,
        ag: 3,
        av: 8,
        status: PlayerStatus::Standing,
        position: Some(Square::new(x, y)),
        skills: skills.into(),
        ..Default::default()
    };
    player.begin_turn();
    state.players.insert(player.id, player);
    PlayerId(id)
}
