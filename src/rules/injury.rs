use crate::dice::DiceSource;
use crate::model::enums::{CasualtyKind, InjuryOutcome, PlayerStatus};
use crate::model::event::GameEvent;
use crate::model::game::GameState;
use crate::model::player::PlayerId;
use crate::model::skills::Skill;

/// Context threaded through armour and injury resolution. The attacker (if
/// any) contributes Mighty Blow, Claw, Piling On and Stakes; extra
/// modifiers come from the action (Dirty Player, foul assists).
#[derive(Debug, Default, Clone, Copy)]
pub struct InjuryContext {
    pub attacker: Option<PlayerId>,
    pub armour_modifier: i8,
    pub injury_modifier: i8,
    /// Fouls watch both rolls for doubles (the referee is watching too).
    pub foul: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ArmourResult {
    pub broken: bool,
    pub doubles: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct InjuryResult {
    pub outcome: InjuryOutcome,
    pub doubles: bool,
}

fn attacker_has(state: &GameState, ctx: &InjuryContext, skill: Skill) -> bool {
    ctx.attacker
        .and_then(|id| state.player(id))
        .is_some_and(|p| p.has_skill(skill))
}

/// 2D6 + modifiers against AV; greater breaks. Claw breaks on any raw 8+
/// regardless of armour. Piling On buys one armour reroll at the cost of
/// the attacker going prone and losing the rest of his activation.
pub fn armour_roll(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    target_id: PlayerId,
    ctx: &InjuryContext,
) -> Result<ArmourResult, String> {
    let av = state
        .player(target_id)
        .ok_or_else(|| format!("armour roll for unknown {target_id}"))?
        .get_av();

    let mut modifier = ctx.armour_modifier;
    if attacker_has(state, ctx, Skill::MightyBlow) {
        modifier += 1;
    }
    let claw = attacker_has(state, ctx, Skill::Claw);

    let (mut d1, mut d2) = (dice.roll_d6(), dice.roll_d6());
    let mut raw = d1 + d2;
    let mut modified = (raw as i8 + modifier).max(2) as u8;
    let mut broken = modified > av || (claw && raw >= 8);

    if !broken && attacker_has(state, ctx, Skill::PilingOn) {
        if let Some(attacker_id) = ctx.attacker {
            let standing = state
                .player(attacker_id)
                .is_some_and(|p| p.is_standing());
            if standing {
                events.push(GameEvent::SkillUsed {
                    player_id: attacker_id,
                    skill: Skill::PilingOn,
                });
                let attacker = state.player_mut(attacker_id).expect("attacker vanished");
                attacker.status = PlayerStatus::Prone;
                attacker.flags.has_acted = true;
                (d1, d2) = (dice.roll_d6(), dice.roll_d6());
                raw = d1 + d2;
                modified = (raw as i8 + modifier).max(2) as u8;
                broken = modified > av || (claw && raw >= 8);
            }
        }
    }

    events.push(GameEvent::ArmourRoll {
        player_id: target_id,
        roll: raw,
        modified,
        broken,
    });

    Ok(ArmourResult {
        broken,
        doubles: d1 == d2,
    })
}

fn classify(modified: u8) -> InjuryOutcome {
    match modified {
        0..=7 => InjuryOutcome::Stunned,
        8..=9 => InjuryOutcome::KnockedOut,
        _ => InjuryOutcome::Casualty,
    }
}

fn casualty_kind(roll: u8) -> CasualtyKind {
    match roll {
        1..=3 => CasualtyKind::BadlyHurt,
        4..=5 => CasualtyKind::SeriousInjury,
        _ => CasualtyKind::Dead,
    }
}

/// 2D6 + modifiers through the injury table, then apothecary, casualty
/// classification and regeneration. Applies the resulting status to the
/// target and returns what happened.
pub fn injury_roll(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    target_id: PlayerId,
    ctx: &InjuryContext,
) -> Result<InjuryResult, String> {
    let target = state
        .player(target_id)
        .ok_or_else(|| format!("injury roll for unknown {target_id}"))?;
    let mut modifier = ctx.injury_modifier;
    if target.has_skill(Skill::Stunty) {
        modifier += 1;
    }
    if attacker_has(state, ctx, Skill::MightyBlow) {
        modifier += 1;
    }
    let decay = target.has_skill(Skill::Decay);

    let (d1, d2) = (dice.roll_d6(), dice.roll_d6());
    let raw = d1 + d2;
    let mut modified = (raw as i8 + modifier).max(2) as u8;
    let mut outcome = classify(modified);
    let doubles = d1 == d2;

    if decay {
        // Roll again, keep the worse result.
        let second_raw = dice.roll_2d6();
        let second_modified = (second_raw as i8 + modifier).max(2) as u8;
        let second = classify(second_modified);
        if second > outcome {
            outcome = second;
            modified = second_modified;
        }
    }

    events.push(GameEvent::InjuryRoll {
        player_id: target_id,
        roll: raw,
        modified,
        outcome,
    });

    // Apothecary downgrades one outcome, once per match.
    if outcome > InjuryOutcome::Stunned {
        let side = target_id.side();
        if state.team(side).apothecary_available() {
            state.team_mut(side).apothecary_used = true;
            events.push(GameEvent::Apothecary {
                player_id: target_id,
            });
            outcome = match outcome {
                InjuryOutcome::Casualty => InjuryOutcome::KnockedOut,
                _ => InjuryOutcome::Stunned,
            };
        }
    }

    match outcome {
        InjuryOutcome::Stunned => {
            let player = state.player_mut(target_id).expect("target vanished");
            if player.is_on_pitch() {
                player.status = PlayerStatus::Stunned;
            }
        }
        InjuryOutcome::KnockedOut => {
            let player = state.player_mut(target_id).expect("target vanished");
            player.status = PlayerStatus::KnockedOut;
            player.position = None;
        }
        InjuryOutcome::Casualty => {
            let kind = casualty_kind(dice.roll_d6());
            events.push(GameEvent::Casualty {
                player_id: target_id,
                kind,
            });
            let regen_blocked = attacker_has(state, ctx, Skill::Stakes);
            let player = state.player_mut(target_id).expect("target vanished");
            player.status = if kind == CasualtyKind::Dead {
                PlayerStatus::Dead
            } else {
                PlayerStatus::Injured
            };
            player.position = None;

            if !regen_blocked && state.player(target_id).unwrap().has_skill(Skill::Regeneration)
            {
                let roll = dice.roll_d6();
                let success = roll >= 4;
                events.push(GameEvent::Regeneration {
                    player_id: target_id,
                    roll,
                    success,
                });
                if success {
                    let player = state.player_mut(target_id).expect("target vanished");
                    player.status = PlayerStatus::OffPitch;
                }
            }
        }
    }

    Ok(InjuryResult { outcome, doubles })
}

/// Knock a player down at his current cell: armour, then injury if the
/// armour broke, then the ball bounces loose if he was the carrier.
pub fn knock_down(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    target_id: PlayerId,
    ctx: &InjuryContext,
) -> Result<(), String> {
    let cell = state
        .player(target_id)
        .and_then(|p| p.position)
        .ok_or_else(|| format!("knock down for off-pitch {target_id}"))?;
    events.push(GameEvent::PlayerFell {
        player_id: target_id,
        at: cell,
    });
    let was_carrying = state.ball.is_carried_by(target_id);
    {
        let player = state.player_mut(target_id).expect("target vanished");
        player.status = PlayerStatus::Prone;
    }

    let armour = armour_roll(state, events, dice, target_id, ctx)?;
    if armour.broken {
        injury_roll(state, events, dice, target_id, ctx)?;
    }

    if was_carrying {
        super::ball::drop_ball(state, events, dice, cell)?;
    }
    Ok(())
}

/// A player shoved into the crowd: straight injury roll (no armour), the
/// crowd is not gentle. A stunned result means reserves.
pub fn crowd_injury(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    target_id: PlayerId,
) -> Result<(), String> {
    events.push(GameEvent::CrowdSurf {
        player_id: target_id,
    });
    let cell = state.player(target_id).and_then(|p| p.position);
    let was_carrying = state.ball.is_carried_by(target_id);
    {
        let player = state.player_mut(target_id).expect("target vanished");
        player.position = None;
        player.status = PlayerStatus::OffPitch;
    }
    let result = injury_roll(state, events, dice, target_id, &InjuryContext::default())?;
    if result.outcome == InjuryOutcome::Stunned {
        let player = state.player_mut(target_id).expect("target vanished");
        player.status = PlayerStatus::OffPitch;
        player.position = None;
    }
    if was_carrying {
        if let Some(cell) = cell {
            super::ball::throw_in(state, events, dice, cell)?;
        }
    }
    Ok(())
}
