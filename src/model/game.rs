use super::ball::Ball;
use super::constants::{TEAM_SIZE, TURNS_PER_HALF};
use super::enums::{Phase, Side, Weather};
use super::player::{Player, PlayerId};
use super::position::Square;
use super::team::TeamState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// The authoritative match state. Advanced only through the action
/// resolver; every resolution returns a fresh value and never mutates the
/// caller's copy. Equality is structural.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub match_id: Uuid,
    pub half: u8,
    pub phase: Phase,
    pub active_team: Option<Side>,
    pub kicking_team: Option<Side>,
    pub home: TeamState,
    pub away: TeamState,
    /// Sparse map keyed by id; ordered so iteration is deterministic.
    pub players: BTreeMap<PlayerId, Player>,
    pub ball: Ball,
    #[serde(default)]
    pub turnover_pending: bool,
    #[serde(default)]
    pub weather: Weather,
    /// Cell the kicking team aimed the kick at, between its setup and the
    /// receiving team's.
    #[serde(default)]
    pub pending_kick_target: Option<Square>,
}

impl GameState {
    pub fn new(home: TeamState, away: TeamState) -> Self {
        GameState {
            match_id: Uuid::new_v4(),
            half: 1,
            phase: Phase::CoinToss,
            active_team: None,
            kicking_team: None,
            home,
            away,
            players: BTreeMap::new(),
            ball: Ball::OffPitch,
            turnover_pending: false,
            weather: Weather::default(),
            pending_kick_target: None,
        }
    }

    pub fn from_json(state: &str) -> Result<GameState, serde_json::Error> {
        serde_json::from_str(state)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn team(&self, side: Side) -> &TeamState {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    pub fn team_mut(&mut self, side: Side) -> &mut TeamState {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn players_of(&self, side: Side) -> impl Iterator<Item = &Player> {
        self.players.values().filter(move |p| p.side() == side)
    }

    /// The player occupying a cell, if any. At most one player per cell.
    pub fn player_at(&self, square: &Square) -> Option<&Player> {
        self.players
            .values()
            .find(|p| p.is_on_pitch() && p.position == Some(*square))
    }

    pub fn is_occupied(&self, square: &Square) -> bool {
        self.player_at(square).is_some()
    }

    /// Number of tacklezones exerted on `square` against a mover of
    /// `mover_side`, ignoring `ignore` (usually the player being tested).
    pub fn tacklezones_at(
        &self,
        mover_side: Side,
        square: &Square,
        ignore: Option<PlayerId>,
    ) -> u8 {
        self.players_of(mover_side.opponent())
            .filter(|p| Some(p.id) != ignore)
            .filter(|p| p.exerts_tacklezone())
            .filter(|p| p.position.is_some_and(|pos| pos.is_adjacent(square)))
            .count() as u8
    }

    /// Opposing players marking the cell: standing, tacklezone intact and
    /// adjacent. Their skills get inspected during movement.
    pub fn markers_at(&self, mover_side: Side, square: &Square) -> Vec<&Player> {
        self.players_of(mover_side.opponent())
            .filter(|p| p.exerts_tacklezone())
            .filter(|p| p.position.is_some_and(|pos| pos.is_adjacent(square)))
            .collect()
    }

    pub fn adjacent_opponents(&self, side: Side, square: &Square) -> Vec<&Player> {
        self.players_of(side.opponent())
            .filter(|p| p.position.is_some_and(|pos| pos.is_adjacent(square)))
            .collect()
    }

    pub fn adjacent_teammates(&self, side: Side, square: &Square) -> Vec<&Player> {
        self.players_of(side)
            .filter(|p| p.position.is_some_and(|pos| pos.is_adjacent(square)))
            .collect()
    }

    /// Where the ball is, whether loose or carried. None when off pitch.
    pub fn ball_square(&self) -> Option<Square> {
        match self.ball {
            Ball::OffPitch => None,
            Ball::OnGround(square) => Some(square),
            Ball::Carried(id) => self.player(id).and_then(|p| p.position),
        }
    }

    pub fn carrier(&self) -> Option<&Player> {
        self.ball.carrier().and_then(|id| self.player(id))
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Structural invariants every resolved state must satisfy. Exposed so
    /// tests can assert them after arbitrary resolutions.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for player in self.players.values() {
            match (player.is_on_pitch(), player.position) {
                (true, Some(pos)) => {
                    if !pos.is_on_pitch() {
                        return Err(format!("{} is at off-pitch cell {:?}", player.id, pos));
                    }
                    if !seen.insert(pos) {
                        return Err(format!("two players share cell {:?}", pos));
                    }
                }
                (true, None) => {
                    return Err(format!("{} is on pitch without a position", player.id))
                }
                (false, Some(_)) => {
                    return Err(format!("{} is off pitch but holds a position", player.id))
                }
                (false, None) => {}
            }
            if player.flags.movement_remaining < -3 {
                return Err(format!(
                    "{} movement_remaining {} below the sprint floor",
                    player.id, player.flags.movement_remaining
                ));
            }
        }
        if let Ball::Carried(id) = self.ball {
            let carrier = self
                .player(id)
                .ok_or_else(|| format!("ball carried by unknown {id}"))?;
            if carrier.position.is_none() {
                return Err(format!("ball carried by off-pitch {id}"));
            }
        }
        for side in [Side::Home, Side::Away] {
            if self.team(side).turn_number > TURNS_PER_HALF {
                return Err(format!("{side:?} turn counter past {TURNS_PER_HALF}"));
            }
        }
        Ok(())
    }

    /// Ids of a side's roster, in order: 1..=11 home, 12..=22 away.
    pub fn roster_ids(side: Side) -> impl Iterator<Item = PlayerId> {
        let base = match side {
            Side::Home => 0,
            Side::Away => TEAM_SIZE,
        };
        (1..=TEAM_SIZE).map(move |n| PlayerId(base + n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::enums::PlayerStatus;

    fn two_player_state() -> GameState {
        let mut state = GameState::new(
            TeamState::new("Home", "human", Side::Home, 3, false),
            TeamState::new("Away", "orc", Side::Away, 3, false),
        );
        for (id, x, y) in [(1u8, 10, 7), (12u8, 11, 7)] {
            let player = Player {
                id: PlayerId(id),
                status: PlayerStatus::Standing,
                position: Some(Square::new(x, y)),
                ..Default::default()
            };
            state.players.insert(player.id, player);
        }
        state
    }

    #[test]
    fn test_player_at() {
        let state = two_player_state();
        assert_eq!(
            state.player_at(&Square::new(10, 7)).map(|p| p.id),
            Some(PlayerId(1))
        );
        assert!(state.player_at(&Square::new(9, 9)).is_none());
    }

    #[test]
    fn test_tacklezones_count_opponents_only() {
        let state = two_player_state();
        // Home player at (10,7) is marked by the away player at (11,7).
        assert_eq!(state.tacklezones_at(Side::Home, &Square::new(10, 7), None), 1);
        // From the away side's perspective the home player marks back.
        assert_eq!(state.tacklezones_at(Side::Away, &Square::new(11, 7), None), 1);
        // Far away cell has no markers.
        assert_eq!(state.tacklezones_at(Side::Home, &Square::new(2, 2), None), 0);
    }

    #[test]
    fn test_tacklezones_ignore_prone_and_lost() {
        let mut state = two_player_state();
        state.player_mut(PlayerId(12)).unwrap().status = PlayerStatus::Prone;
        assert_eq!(state.tacklezones_at(Side::Home, &Square::new(10, 7), None), 0);
        state.player_mut(PlayerId(12)).unwrap().status = PlayerStatus::Standing;
        state.player_mut(PlayerId(12)).unwrap().flags.lost_tacklezones = true;
        assert_eq!(state.tacklezones_at(Side::Home, &Square::new(10, 7), None), 0);
    }

    #[test]
    fn test_ball_square_follows_carrier() {
        let mut state = two_player_state();
        state.ball = Ball::Carried(PlayerId(1));
        assert_eq!(state.ball_square(), Some(Square::new(10, 7)));
        state.ball = Ball::OnGround(Square::new(3, 3));
        assert_eq!(state.ball_square(), Some(Square::new(3, 3)));
        state.ball = Ball::OffPitch;
        assert_eq!(state.ball_square(), None);
    }

    #[test]
    fn test_invariants_catch_shared_cell() {
        let mut state = two_player_state();
        state.player_mut(PlayerId(12)).unwrap().position = Some(Square::new(10, 7));
        assert!(state.check_invariants().is_err());
    }

    #[test]
    fn test_invariants_pass_on_valid_state() {
        let state = two_player_state();
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_serde_round_trip() {
        let state = two_player_state();
        let json = state.to_json().unwrap();
        let back = GameState::from_json(&json).unwrap();
        assert_eq!(state, back);
    }
}
