use super::enums::{
    BlockFace, CasualtyKind, InjuryOutcome, PassOutcome, PassRange, Side, Weather,
};
use super::player::PlayerId;
use super::position::Square;
use super::skills::Skill;
use serde::{Deserialize, Serialize};

/// One entry of the ordered event log. Entries serialise as
/// `{"type": <tag>, "data": {...}}`; the tag vocabulary is closed.
///
/// Events are appended in the temporal order they are produced, so a log
/// replay reconstructs the same final state the resolver returned.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GameEvent {
    Move {
        player_id: PlayerId,
        from: Square,
        to: Square,
    },
    Dodge {
        player_id: PlayerId,
        roll: u8,
        target: u8,
        success: bool,
    },
    Gfi {
        player_id: PlayerId,
        roll: u8,
        target: u8,
        success: bool,
    },
    Leap {
        player_id: PlayerId,
        roll: u8,
        target: u8,
        success: bool,
    },
    Block {
        attacker_id: PlayerId,
        target_id: PlayerId,
        dice: Vec<BlockFace>,
        chosen: BlockFace,
    },
    Push {
        player_id: PlayerId,
        from: Square,
        to: Square,
    },
    FollowUp {
        player_id: PlayerId,
        to: Square,
    },
    Pickup {
        player_id: PlayerId,
        roll: u8,
        target: u8,
        success: bool,
    },
    Catch {
        player_id: PlayerId,
        roll: u8,
        target: u8,
        success: bool,
    },
    PassAttempt {
        player_id: PlayerId,
        target: Square,
        range: PassRange,
        roll: u8,
        target_number: u8,
        outcome: PassOutcome,
    },
    Interception {
        player_id: PlayerId,
        roll: u8,
        target: u8,
        success: bool,
    },
    Touchdown {
        player_id: PlayerId,
        side: Side,
    },
    Turnover {
        side: Side,
    },
    PlayerFell {
        player_id: PlayerId,
        at: Square,
    },
    BallBounce {
        from: Square,
        to: Square,
        direction: u8,
    },
    CrowdSurf {
        player_id: PlayerId,
    },
    ThrowIn {
        from: Square,
        to: Square,
    },
    ArmourRoll {
        player_id: PlayerId,
        roll: u8,
        modified: u8,
        broken: bool,
    },
    InjuryRoll {
        player_id: PlayerId,
        roll: u8,
        modified: u8,
        outcome: InjuryOutcome,
    },
    Casualty {
        player_id: PlayerId,
        kind: CasualtyKind,
    },
    Apothecary {
        player_id: PlayerId,
    },
    Regeneration {
        player_id: PlayerId,
        roll: u8,
        success: bool,
    },
    KoRecovery {
        player_id: PlayerId,
        roll: u8,
        success: bool,
    },
    HalfTime,
    GameOver {
        home_score: u8,
        away_score: u8,
    },
    Kickoff {
        target: Square,
        landed: Square,
        touchback: bool,
    },
    WeatherChange {
        weather: Weather,
    },
    KickoffEventGetTheRef,
    KickoffEventRiot {
        roll: u8,
        turns_forward: bool,
    },
    KickoffEventPerfectDefence {
        side: Side,
    },
    KickoffEventHighKick {
        player_id: Option<PlayerId>,
    },
    KickoffEventCheeringFans {
        home_roll: u8,
        away_roll: u8,
    },
    KickoffEventWeatherChange,
    KickoffEventBrilliantCoaching {
        home_roll: u8,
        away_roll: u8,
    },
    KickoffEventQuickSnap {
        side: Side,
    },
    KickoffEventBlitz {
        side: Side,
    },
    KickoffEventThrowARock {
        player_id: PlayerId,
    },
    KickoffEventPitchInvasion {
        stunned: Vec<PlayerId>,
    },
    SkillUsed {
        player_id: PlayerId,
        skill: Skill,
    },
    RerollUsed {
        side: Side,
    },
    ProReroll {
        player_id: PlayerId,
        roll: u8,
        success: bool,
    },
    LonerCheck {
        player_id: PlayerId,
        roll: u8,
        success: bool,
    },
    SecretWeaponEjection {
        player_id: PlayerId,
    },
    Foul {
        player_id: PlayerId,
        target_id: PlayerId,
    },
    Ejection {
        player_id: PlayerId,
    },
    Tentacles {
        player_id: PlayerId,
        mover_id: PlayerId,
        held: bool,
    },
    Shadowing {
        player_id: PlayerId,
        mover_id: PlayerId,
        roll: u8,
        follows: bool,
    },
    DivingTackle {
        player_id: PlayerId,
    },
    Stab {
        attacker_id: PlayerId,
        target_id: PlayerId,
    },
    Chainsaw {
        attacker_id: PlayerId,
        target_id: PlayerId,
        kickback: bool,
    },
    FoulAppearance {
        player_id: PlayerId,
        roll: u8,
        success: bool,
    },
    Bloodlust {
        player_id: PlayerId,
        roll: u8,
        success: bool,
    },
    HypnoticGaze {
        player_id: PlayerId,
        target_id: PlayerId,
        roll: u8,
        target_number: u8,
        success: bool,
    },
    BallAndChainMove {
        player_id: PlayerId,
        to: Square,
    },
    BallAndChainBlock {
        attacker_id: PlayerId,
        target_id: PlayerId,
    },
    BigGuyCheck {
        player_id: PlayerId,
        skill: Skill,
        roll: u8,
        success: bool,
    },
}
