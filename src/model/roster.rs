use super::constants::TEAM_SIZE;
use super::enums::Side;
use super::game::GameState;
use super::player::{Player, PlayerId};
use super::skills::{Skill, SkillSet};
use super::team::TeamState;
use serde::{Deserialize, Serialize};

/// One positional entry of a roster definition.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PositionalEntry {
    pub name: String,
    pub count: u8,
    pub ma: u8,
    pub st: u8,
    pub ag: u8,
    pub av: u8,
    pub skills: Vec<Skill>,
}

impl PositionalEntry {
    fn new(name: &str, count: u8, ma: u8, st: u8, ag: u8, av: u8, skills: &[Skill]) -> Self {
        PositionalEntry {
            name: name.to_string(),
            count,
            ma,
            st,
            ag,
            av,
            skills: skills.to_vec(),
        }
    }
}

/// A team roster: positional templates plus team-wide goods.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Roster {
    pub race: String,
    pub positionals: Vec<PositionalEntry>,
    pub rerolls: u8,
    pub has_apothecary: bool,
}

impl Roster {
    pub fn by_name(name: &str) -> Option<Roster> {
        match name {
            "human" => Some(Roster::human()),
            "orc" => Some(Roster::orc()),
            _ => None,
        }
    }

    pub fn human() -> Roster {
        Roster {
            race: "human".to_string(),
            positionals: vec![
                PositionalEntry::new("Blitzer", 2, 7, 3, 3, 8, &[Skill::Block]),
                PositionalEntry::new(
                    "Catcher",
                    2,
                    8,
                    2,
                    3,
                    7,
                    &[Skill::Catch, Skill::Dodge],
                ),
                PositionalEntry::new("Thrower", 1, 6, 3, 3, 8, &[Skill::SureHands, Skill::Pass]),
                PositionalEntry::new("Lineman", 6, 6, 3, 3, 8, &[]),
            ],
            rerolls: 3,
            has_apothecary: true,
        }
    }

    pub fn orc() -> Roster {
        Roster {
            race: "orc".to_string(),
            positionals: vec![
                PositionalEntry::new("Blitzer", 2, 6, 3, 3, 9, &[Skill::Block]),
                PositionalEntry::new("Black Orc", 2, 4, 4, 2, 9, &[]),
                PositionalEntry::new("Thrower", 1, 5, 3, 3, 8, &[Skill::SureHands, Skill::Pass]),
                PositionalEntry::new(
                    "Goblin",
                    1,
                    6,
                    2,
                    3,
                    7,
                    &[Skill::Dodge, Skill::RightStuff, Skill::Stunty],
                ),
                PositionalEntry::new("Lineman", 5, 5, 3, 3, 9, &[]),
            ],
            rerolls: 3,
            has_apothecary: true,
        }
    }

    /// Expand the roster into `TEAM_SIZE` players for a side, assigning the
    /// side's id range in positional order.
    fn build_players(&self, side: Side) -> Vec<Player> {
        let mut players = Vec::with_capacity(TEAM_SIZE as usize);
        let mut ids = GameState::roster_ids(side);
        'outer: for positional in &self.positionals {
            for n in 1..=positional.count {
                let Some(id) = ids.next() else { break 'outer };
                players.push(Player {
                    id,
                    name: format!("{} {}", positional.name, n),
                    ma: positional.ma,
                    st: positional.st,
                    ag: positional.ag,
                    av: positional.av,
                    skills: SkillSet::from(positional.skills.as_slice()),
                    ..Default::default()
                });
            }
        }
        players
    }
}

/// Build a fresh match state from two rosters. The state starts in the
/// coin-toss phase with everyone in the reserves and the ball off pitch.
pub fn build_match(home_name: &str, home: &Roster, away_name: &str, away: &Roster) -> GameState {
    let home_team = TeamState::new(home_name, &home.race, Side::Home, home.rerolls, home.has_apothecary);
    let away_team = TeamState::new(away_name, &away.race, Side::Away, away.rerolls, away.has_apothecary);
    let mut state = GameState::new(home_team, away_team);
    for player in home.build_players(Side::Home) {
        state.players.insert(player.id, player);
    }
    for player in away.build_players(Side::Away) {
        state.players.insert(player.id, player);
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rosters_fill_eleven_slots() {
        for roster in [Roster::human(), Roster::orc()] {
            let total: u8 = roster.positionals.iter().map(|p| p.count).sum();
            assert_eq!(total, TEAM_SIZE, "{} roster is not 11 players", roster.race);
        }
    }

    #[test]
    fn test_build_match_assigns_id_ranges() {
        let state = build_match("Reavers", &Roster::human(), "Raiders", &Roster::orc());
        assert_eq!(state.players.len(), 22);
        assert!(state.players.contains_key(&PlayerId(1)));
        assert!(state.players.contains_key(&PlayerId(22)));
        assert_eq!(state.player(PlayerId(1)).unwrap().side(), Side::Home);
        assert_eq!(state.player(PlayerId(12)).unwrap().side(), Side::Away);
    }

    #[test]
    fn test_positional_skills_applied() {
        let state = build_match("Reavers", &Roster::human(), "Raiders", &Roster::human());
        // Humans: ids 1-2 blitzers, 3-4 catchers.
        assert!(state.player(PlayerId(1)).unwrap().has_skill(Skill::Block));
        assert!(state.player(PlayerId(3)).unwrap().has_skill(Skill::Catch));
        assert!(!state.player(PlayerId(6)).unwrap().has_skill(Skill::Block));
    }

    #[test]
    fn test_by_name() {
        assert!(Roster::by_name("human").is_some());
        assert!(Roster::by_name("orc").is_some());
        assert!(Roster::by_name("dwarf").is_none());
    }
}
