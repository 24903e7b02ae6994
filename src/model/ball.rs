use super::player::PlayerId;
use super::position::Square;
use serde::{Deserialize, Serialize};

/// The single match ball. Exactly one of three states; transitions go
/// through the ball resolver only.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Hash, Default)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Ball {
    #[default]
    OffPitch,
    OnGround(Square),
    Carried(PlayerId),
}

impl Ball {
    pub fn is_off_pitch(&self) -> bool {
        matches!(self, Ball::OffPitch)
    }

    pub fn on_ground_at(&self) -> Option<Square> {
        match self {
            Ball::OnGround(square) => Some(*square),
            _ => None,
        }
    }

    pub fn carrier(&self) -> Option<PlayerId> {
        match self {
            Ball::Carried(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_carried_by(&self, id: PlayerId) -> bool {
        self.carrier() == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_states() {
        assert!(Ball::OffPitch.is_off_pitch());
        assert_eq!(
            Ball::OnGround(Square::new(4, 4)).on_ground_at(),
            Some(Square::new(4, 4))
        );
        assert_eq!(Ball::Carried(PlayerId(3)).carrier(), Some(PlayerId(3)));
        assert_eq!(Ball::OffPitch.carrier(), None);
    }

    #[test]
    fn test_serde_tags() {
        let json = serde_json::to_string(&Ball::OnGround(Square::new(1, 2))).unwrap();
        assert!(json.contains("on_ground"));
        let back: Ball = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Ball::OnGround(Square::new(1, 2)));
    }
}
