use super::enums::Formation;
use super::player::PlayerId;
use super::position::Square;
use serde::{Deserialize, Serialize};

/// A declared action. Closed sum type: dispatch is exhaustive and an
/// unknown action is a compile-time impossibility.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Hash)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
pub enum Action {
    Move {
        player_id: PlayerId,
        x: i32,
        y: i32,
    },
    Block {
        attacker_id: PlayerId,
        target_id: PlayerId,
    },
    /// Move to (x, y) and block the target as one action.
    Blitz {
        player_id: PlayerId,
        x: i32,
        y: i32,
        target_id: PlayerId,
    },
    Pass {
        player_id: PlayerId,
        target: Square,
    },
    HandOff {
        player_id: PlayerId,
        target_id: PlayerId,
    },
    Foul {
        player_id: PlayerId,
        target_id: PlayerId,
    },
    ThrowTeammate {
        player_id: PlayerId,
        teammate_id: PlayerId,
        target: Square,
    },
    BombThrow {
        player_id: PlayerId,
        target: Square,
    },
    HypnoticGaze {
        player_id: PlayerId,
        target_id: PlayerId,
    },
    BallAndChain {
        player_id: PlayerId,
    },
    MultipleBlock {
        player_id: PlayerId,
        target_ids: [PlayerId; 2],
    },
    EndTurn,
    Setup {
        formation: Formation,
        kick_target: Option<Square>,
    },
}

/// Action type discriminant, used for the policy network's one-hot.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ActionKind {
    Move,
    Block,
    Blitz,
    Pass,
    HandOff,
    Foul,
    ThrowTeammate,
    BombThrow,
    HypnoticGaze,
    BallAndChain,
    MultipleBlock,
    EndTurn,
    Setup,
}

impl ActionKind {
    pub const COUNT: usize = 13;

    pub fn index(&self) -> usize {
        *self as u8 as usize
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Move { .. } => ActionKind::Move,
            Action::Block { .. } => ActionKind::Block,
            Action::Blitz { .. } => ActionKind::Blitz,
            Action::Pass { .. } => ActionKind::Pass,
            Action::HandOff { .. } => ActionKind::HandOff,
            Action::Foul { .. } => ActionKind::Foul,
            Action::ThrowTeammate { .. } => ActionKind::ThrowTeammate,
            Action::BombThrow { .. } => ActionKind::BombThrow,
            Action::HypnoticGaze { .. } => ActionKind::HypnoticGaze,
            Action::BallAndChain { .. } => ActionKind::BallAndChain,
            Action::MultipleBlock { .. } => ActionKind::MultipleBlock,
            Action::EndTurn => ActionKind::EndTurn,
            Action::Setup { .. } => ActionKind::Setup,
        }
    }

    /// The acting player, when the action names one.
    pub fn player_id(&self) -> Option<PlayerId> {
        match self {
            Action::Move { player_id, .. }
            | Action::Blitz { player_id, .. }
            | Action::Pass { player_id, .. }
            | Action::HandOff { player_id, .. }
            | Action::Foul { player_id, .. }
            | Action::ThrowTeammate { player_id, .. }
            | Action::BombThrow { player_id, .. }
            | Action::HypnoticGaze { player_id, .. }
            | Action::BallAndChain { player_id, .. }
            | Action::MultipleBlock { player_id, .. } => Some(*player_id),
            Action::Block { attacker_id, .. } => Some(*attacker_id),
            Action::EndTurn | Action::Setup { .. } => None,
        }
    }

    /// The cell the action is aimed at, when it has one.
    pub fn target_square(&self) -> Option<Square> {
        match self {
            Action::Move { x, y, .. } | Action::Blitz { x, y, .. } => Some(Square::new(*x, *y)),
            Action::Pass { target, .. }
            | Action::BombThrow { target, .. }
            | Action::ThrowTeammate { target, .. } => Some(*target),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_tagging() {
        let action = Action::Move {
            player_id: PlayerId(1),
            x: 11,
            y: 7,
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"type\":\"move\""));
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(action, back);
    }

    #[test]
    fn test_kind_and_player() {
        let action = Action::Block {
            attacker_id: PlayerId(3),
            target_id: PlayerId(14),
        };
        assert_eq!(action.kind(), ActionKind::Block);
        assert_eq!(action.player_id(), Some(PlayerId(3)));
        assert_eq!(Action::EndTurn.player_id(), None);
    }

    #[test]
    fn test_target_square() {
        let action = Action::Blitz {
            player_id: PlayerId(1),
            x: 5,
            y: 5,
            target_id: PlayerId(13),
        };
        assert_eq!(action.target_square(), Some(Square::new(5, 5)));
        assert_eq!(Action::EndTurn.target_square(), None);
    }
}
