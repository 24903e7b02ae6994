use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn opponent(&self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    CoinToss,
    Setup,
    Kickoff,
    Play,
    Touchdown,
    HalfTime,
    GameOver,
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Standing,
    Prone,
    Stunned,
    KnockedOut,
    Injured,
    Dead,
    Ejected,
    #[default]
    OffPitch,
}

impl PlayerStatus {
    /// Only standing players act or exert tacklezones.
    pub fn is_standing(&self) -> bool {
        *self == PlayerStatus::Standing
    }

    /// On the pitch in any posture (standing, prone or stunned).
    pub fn is_on_pitch(&self) -> bool {
        matches!(
            self,
            PlayerStatus::Standing | PlayerStatus::Prone | PlayerStatus::Stunned
        )
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    SwelteringHeat,
    VerySunny,
    #[default]
    Nice,
    PouringRain,
    Blizzard,
}

/// The six faces of a block die: push appears twice.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BlockFace {
    AttackerDown,
    BothDown,
    Push,
    Stumble,
    DefenderDown,
}

impl BlockFace {
    /// Map a d6 roll onto the face table.
    pub fn from_d6(roll: u8) -> BlockFace {
        match roll {
            1 => BlockFace::AttackerDown,
            2 => BlockFace::BothDown,
            3 | 4 => BlockFace::Push,
            5 => BlockFace::Stumble,
            _ => BlockFace::DefenderDown,
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PassRange {
    Quick,
    Short,
    Long,
    Bomb,
}

impl PassRange {
    /// Bucket a Chebyshev distance. Anything past bomb range is unthrowable.
    pub fn from_distance(distance: u32) -> Option<PassRange> {
        match distance {
            0..=3 => Some(PassRange::Quick),
            4..=6 => Some(PassRange::Short),
            7..=9 => Some(PassRange::Long),
            10..=13 => Some(PassRange::Bomb),
            _ => None,
        }
    }

    /// Pass roll modifier: quick -1, short 0, long +1, bomb +2.
    pub fn modifier(&self) -> i8 {
        match self {
            PassRange::Quick => -1,
            PassRange::Short => 0,
            PassRange::Long => 1,
            PassRange::Bomb => 2,
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CasualtyKind {
    BadlyHurt,
    SeriousInjury,
    Dead,
}

/// Injury roll bands: 2-7 stunned, 8-9 KO, 10+ casualty.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InjuryOutcome {
    Stunned,
    KnockedOut,
    Casualty,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    Accurate,
    Inaccurate,
    WildlyInaccurate,
    Fumble,
}

/// The 2D6 kickoff event table, 2..=12.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum KickoffEvent {
    GetTheRef,
    Riot,
    PerfectDefence,
    HighKick,
    CheeringFans,
    WeatherChange,
    BrilliantCoaching,
    QuickSnap,
    Blitz,
    ThrowARock,
    PitchInvasion,
}

impl KickoffEvent {
    pub fn from_2d6(roll: u8) -> KickoffEvent {
        match roll {
            2 => KickoffEvent::GetTheRef,
            3 => KickoffEvent::Riot,
            4 => KickoffEvent::PerfectDefence,
            5 => KickoffEvent::HighKick,
            6 => KickoffEvent::CheeringFans,
            7 => KickoffEvent::WeatherChange,
            8 => KickoffEvent::BrilliantCoaching,
            9 => KickoffEvent::QuickSnap,
            10 => KickoffEvent::Blitz,
            11 => KickoffEvent::ThrowARock,
            _ => KickoffEvent::PitchInvasion,
        }
    }
}

/// How an action resolution ended, as seen by the caller. In-rule failures
/// are normal game outcomes, not errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    Success,
    Failure,
    Turnover,
}

/// Setup formation templates.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Formation {
    Line,
    Spread,
    Wedge,
    Zone,
}
