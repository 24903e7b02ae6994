use super::constants::TEAM_SIZE;
use super::enums::{PlayerStatus, Side};
use super::position::Square;
use super::skills::{Skill, SkillSet};
use serde::{Deserialize, Serialize};

/// Stable player identity: 1..=11 home, 12..=22 away.
#[derive(
    Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize, Hash, Default,
)]
#[serde(transparent)]
pub struct PlayerId(pub u8);

impl PlayerId {
    pub fn side(&self) -> Side {
        if self.0 <= TEAM_SIZE {
            Side::Home
        } else {
            Side::Away
        }
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-turn bookkeeping, cleared when the owning team's turn begins.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct TurnFlags {
    pub movement_remaining: i8,
    pub has_moved: bool,
    pub has_acted: bool,
    pub used_blitz: bool,
    pub lost_tacklezones: bool,
    pub pro_used: bool,
}

impl Default for TurnFlags {
    fn default() -> Self {
        TurnFlags {
            movement_remaining: 0,
            has_moved: false,
            has_acted: false,
            used_blitz: false,
            lost_tacklezones: false,
            pro_used: false,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub ma: u8,
    pub st: u8,
    pub ag: u8,
    pub av: u8,
    pub skills: SkillSet,
    pub status: PlayerStatus,
    /// Valid iff the player is on the pitch.
    pub position: Option<Square>,
    #[serde(default)]
    pub flags: TurnFlags,
}

impl Default for Player {
    fn default() -> Self {
        Player {
            id: PlayerId(1),
            name: String::new(),
            ma: 6,
            st: 3,
            ag: 3,
            av: 8,
            skills: SkillSet::empty(),
            status: PlayerStatus::OffPitch,
            position: None,
            flags: TurnFlags::default(),
        }
    }
}

impl Player {
    pub fn side(&self) -> Side {
        self.id.side()
    }

    pub fn get_ma(&self) -> u8 {
        self.ma.clamp(1, 10)
    }

    pub fn get_st(&self) -> u8 {
        self.st.clamp(1, 10)
    }

    pub fn get_ag(&self) -> u8 {
        self.ag.clamp(1, 10)
    }

    pub fn get_av(&self) -> u8 {
        self.av.clamp(1, 12)
    }

    pub fn has_skill(&self, skill: Skill) -> bool {
        self.skills.has(skill)
    }

    pub fn is_standing(&self) -> bool {
        self.status.is_standing()
    }

    pub fn is_on_pitch(&self) -> bool {
        self.status.is_on_pitch()
    }

    /// Standing players project a tacklezone into their 8-cell
    /// neighbourhood, unless something (hypnotic gaze) switched it off.
    pub fn exerts_tacklezone(&self) -> bool {
        self.is_standing() && !self.flags.lost_tacklezones
    }

    /// Extra GFI squares available to this player per action.
    pub fn gfi_allowance(&self) -> i8 {
        if self.has_skill(Skill::Sprint) {
            super::constants::MAX_GFI_SPRINT
        } else {
            super::constants::MAX_GFI
        }
    }

    /// Reset the per-turn flags at the start of the owning team's turn.
    pub fn begin_turn(&mut self) {
        self.flags = TurnFlags {
            movement_remaining: self.get_ma() as i8,
            ..TurnFlags::default()
        };
    }

    /// True while the player can still be given a movement-bearing action.
    pub fn can_still_move(&self) -> bool {
        self.is_on_pitch()
            && !self.flags.has_acted
            && self.status != PlayerStatus::Stunned
            && self.flags.movement_remaining + self.gfi_allowance() > 0
    }
}
