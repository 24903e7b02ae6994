use super::enums::Side;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TeamState {
    pub name: String,
    pub race: String,
    pub side: Side,
    pub score: u8,
    /// 1..=8 within the current half; 0 before the first kickoff.
    pub turn_number: u8,
    /// Remaining team rerolls for this half.
    pub rerolls_total: u8,
    pub reroll_used_this_turn: bool,
    pub blitz_used_this_turn: bool,
    pub pass_used_this_turn: bool,
    pub foul_used_this_turn: bool,
    pub has_apothecary: bool,
    pub apothecary_used: bool,
}

impl TeamState {
    pub fn new(name: &str, race: &str, side: Side, rerolls: u8, has_apothecary: bool) -> Self {
        TeamState {
            name: name.to_string(),
            race: race.to_string(),
            side,
            score: 0,
            turn_number: 0,
            rerolls_total: rerolls,
            reroll_used_this_turn: false,
            blitz_used_this_turn: false,
            pass_used_this_turn: false,
            foul_used_this_turn: false,
            has_apothecary,
            apothecary_used: false,
        }
    }

    /// Clear the once-per-turn markers when a new team turn begins.
    pub fn begin_turn(&mut self) {
        self.reroll_used_this_turn = false;
        self.blitz_used_this_turn = false;
        self.pass_used_this_turn = false;
        self.foul_used_this_turn = false;
    }

    pub fn can_use_reroll(&self) -> bool {
        self.rerolls_total > 0 && !self.reroll_used_this_turn
    }

    pub fn apothecary_available(&self) -> bool {
        self.has_apothecary && !self.apothecary_used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_turn_clears_markers() {
        let mut team = TeamState::new("Reavers", "human", Side::Home, 3, true);
        team.reroll_used_this_turn = true;
        team.blitz_used_this_turn = true;
        team.pass_used_this_turn = true;
        team.foul_used_this_turn = true;
        team.begin_turn();
        assert!(!team.reroll_used_this_turn);
        assert!(!team.blitz_used_this_turn);
        assert!(!team.pass_used_this_turn);
        assert!(!team.foul_used_this_turn);
    }

    #[test]
    fn test_reroll_availability() {
        let mut team = TeamState::new("Reavers", "human", Side::Home, 1, false);
        assert!(team.can_use_reroll());
        team.reroll_used_this_turn = true;
        assert!(!team.can_use_reroll());
        team.reroll_used_this_turn = false;
        team.rerolls_total = 0;
        assert!(!team.can_use_reroll());
    }
}
