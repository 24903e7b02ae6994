use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The finite skill vocabulary. Stored per player as a bitset so membership
/// tests are O(1) and allocation-free.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Skill {
    Accurate,
    BallAndChain,
    BigHand,
    Block,
    Bloodlust,
    Bombardier,
    BoneHead,
    Catch,
    Chainsaw,
    Claw,
    Decay,
    DirtyPlayer,
    DivingTackle,
    Dodge,
    Fend,
    FoulAppearance,
    Frenzy,
    Grab,
    Guard,
    HypnoticGaze,
    Juggernaut,
    Kick,
    Leader,
    Leap,
    Loner,
    MightyBlow,
    MultipleBlock,
    NervesOfSteel,
    NoHands,
    Pass,
    PilingOn,
    Pro,
    ReallyStupid,
    Regeneration,
    RightStuff,
    SafeThrow,
    SecretWeapon,
    Shadowing,
    SideStep,
    SneakyGit,
    Sprint,
    Stab,
    Stakes,
    StandFirm,
    StripBall,
    StrongArm,
    Stunty,
    SureFeet,
    SureHands,
    TakeRoot,
    Tackle,
    Tentacles,
    ThrowTeamMate,
    Titchy,
    TwoHeads,
    WildAnimal,
    Wrestle,
}

impl Skill {
    pub const ALL: [Skill; 57] = [
        Skill::Accurate,
        Skill::BallAndChain,
        Skill::BigHand,
        Skill::Block,
        Skill::Bloodlust,
        Skill::Bombardier,
        Skill::BoneHead,
        Skill::Catch,
        Skill::Chainsaw,
        Skill::Claw,
        Skill::Decay,
        Skill::DirtyPlayer,
        Skill::DivingTackle,
        Skill::Dodge,
        Skill::Fend,
        Skill::FoulAppearance,
        Skill::Frenzy,
        Skill::Grab,
        Skill::Guard,
        Skill::HypnoticGaze,
        Skill::Juggernaut,
        Skill::Kick,
        Skill::Leader,
        Skill::Leap,
        Skill::Loner,
        Skill::MightyBlow,
        Skill::MultipleBlock,
        Skill::NervesOfSteel,
        Skill::NoHands,
        Skill::Pass,
        Skill::PilingOn,
        Skill::Pro,
        Skill::ReallyStupid,
        Skill::Regeneration,
        Skill::RightStuff,
        Skill::SafeThrow,
        Skill::SecretWeapon,
        Skill::Shadowing,
        Skill::SideStep,
        Skill::SneakyGit,
        Skill::Sprint,
        Skill::Stab,
        Skill::Stakes,
        Skill::StandFirm,
        Skill::StripBall,
        Skill::StrongArm,
        Skill::Stunty,
        Skill::SureFeet,
        Skill::SureHands,
        Skill::TakeRoot,
        Skill::Tackle,
        Skill::Tentacles,
        Skill::ThrowTeamMate,
        Skill::Titchy,
        Skill::TwoHeads,
        Skill::WildAnimal,
        Skill::Wrestle,
    ];

    fn bit(&self) -> u64 {
        1u64 << (*self as u8)
    }
}

/// Fixed-width skill set. Append-only within a match: skills are granted at
/// roster build time and never removed.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash)]
pub struct SkillSet(u64);

impl SkillSet {
    pub fn empty() -> Self {
        SkillSet(0)
    }

    pub fn has(&self, skill: Skill) -> bool {
        self.0 & skill.bit() != 0
    }

    pub fn add(&mut self, skill: Skill) {
        self.0 |= skill.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Skill> + '_ {
        Skill::ALL.into_iter().filter(|s| self.has(*s))
    }
}

impl FromIterator<Skill> for SkillSet {
    fn from_iter<I: IntoIterator<Item = Skill>>(iter: I) -> Self {
        let mut set = SkillSet::empty();
        for skill in iter {
            set.add(skill);
        }
        set
    }
}

impl From<&[Skill]> for SkillSet {
    fn from(skills: &[Skill]) -> Self {
        skills.iter().copied().collect()
    }
}

// Serialised as the list of skill names so persisted states stay
// self-describing; the bit layout is an in-memory detail.
impl Serialize for SkillSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let skills: Vec<Skill> = self.iter().collect();
        skills.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SkillSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let skills = Vec::<Skill>::deserialize(deserializer)?;
        Ok(skills.into_iter().collect())
    }
}
