use crate::dice::DiceSource;
use crate::model::constants::TURNS_PER_HALF;
use crate::model::enums::{ActionOutcome, PlayerStatus, Side};
use crate::model::event::GameEvent;
use crate::model::game::GameState;
use crate::model::player::PlayerId;
use crate::model::skills::Skill;

/// A single d6 test that may be retried through the reroll cascade.
pub struct RollSpec {
    pub player_id: PlayerId,
    pub target: u8,
    /// Skill granting a free reroll for this roll kind, if any.
    pub skill_reroll: Option<Skill>,
    /// Set when an opposing skill negates the skill reroll (Tackle vs Dodge).
    pub skill_reroll_blocked: bool,
}

/// Run one d6 test through the cascade the rules fix: skill reroll, then
/// Pro (4+ gate, once per turn), then a team reroll (once per turn,
/// Loner-gated). `log` records every attempt in order.
pub fn roll_with_cascade(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    spec: &RollSpec,
    log: &mut dyn FnMut(&mut Vec<GameEvent>, u8, bool),
) -> Result<bool, String> {
    let roll = dice.roll_d6();
    let success = roll >= spec.target;
    log(events, roll, success);
    if success {
        return Ok(true);
    }

    let player = state
        .player(spec.player_id)
        .ok_or_else(|| format!("cascade for unknown player {}", spec.player_id))?;
    let side = player.side();

    // 1. Skill reroll.
    if let Some(skill) = spec.skill_reroll {
        if player.has_skill(skill) && !spec.skill_reroll_blocked {
            events.push(GameEvent::SkillUsed {
                player_id: spec.player_id,
                skill,
            });
            let roll = dice.roll_d6();
            let success = roll >= spec.target;
            log(events, roll, success);
            if success {
                return Ok(true);
            }
            // A skill reroll spent closes the cascade: the rules allow one
            // reroll per dice roll.
            return Ok(false);
        }
    }

    // 2. Pro, gated on its own 4+ and once per turn.
    if player.has_skill(Skill::Pro) && !player.flags.pro_used {
        state
            .player_mut(spec.player_id)
            .expect("player vanished mid-cascade")
            .flags
            .pro_used = true;
        let gate = dice.roll_d6();
        events.push(GameEvent::ProReroll {
            player_id: spec.player_id,
            roll: gate,
            success: gate >= 4,
        });
        if gate >= 4 {
            let roll = dice.roll_d6();
            let success = roll >= spec.target;
            log(events, roll, success);
            return Ok(success);
        }
        return Ok(false);
    }

    // 3. Team reroll.
    if state.team(side).can_use_reroll() {
        if state.player(spec.player_id).is_some_and(|p| p.has_skill(Skill::Loner)) {
            let gate = dice.roll_d6();
            let passed = gate >= 4;
            events.push(GameEvent::LonerCheck {
                player_id: spec.player_id,
                roll: gate,
                success: passed,
            });
            // The reroll is spent whether or not the Loner check passes.
            let team = state.team_mut(side);
            team.rerolls_total -= 1;
            team.reroll_used_this_turn = true;
            events.push(GameEvent::RerollUsed { side });
            if !passed {
                return Ok(false);
            }
        } else {
            let team = state.team_mut(side);
            team.rerolls_total -= 1;
            team.reroll_used_this_turn = true;
            events.push(GameEvent::RerollUsed { side });
        }
        let roll = dice.roll_d6();
        let success = roll >= spec.target;
        log(events, roll, success);
        return Ok(success);
    }

    Ok(false)
}

/// Start a team's turn: bump the counter, clear per-turn flags, wake the
/// stunned.
pub fn begin_team_turn(state: &mut GameState, side: Side) {
    let team = state.team_mut(side);
    team.begin_turn();
    if team.turn_number < TURNS_PER_HALF {
        team.turn_number += 1;
    } else {
        team.turn_number = TURNS_PER_HALF;
    }
    let ids: Vec<PlayerId> = state.players_of(side).map(|p| p.id).collect();
    for id in ids {
        let player = state.player_mut(id).expect("roster id missing");
        if player.status == PlayerStatus::Stunned {
            player.status = PlayerStatus::Prone;
        }
        player.begin_turn();
    }
}

/// True once both counters have reached the last turn of the half: the next
/// turn end closes the half.
pub fn half_exhausted(state: &GameState) -> bool {
    state.home.turn_number >= TURNS_PER_HALF && state.away.turn_number >= TURNS_PER_HALF
}

/// Close the active team's turn (voluntarily or through a turnover) and
/// hand play over. The half transition is the flow resolver's job.
pub fn apply_end_of_turn(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
) -> Result<(), String> {
    let side = state
        .active_team
        .ok_or("end of turn without an active team")?;
    if state.turnover_pending {
        events.push(GameEvent::Turnover { side });
        state.turnover_pending = false;
    }
    if half_exhausted(state) {
        super::flow::end_half(state, events, dice)?;
    } else {
        let next = side.opponent();
        state.active_team = Some(next);
        begin_team_turn(state, next);
    }
    Ok(())
}

/// Pre-action gate for the big-guy negatraits. Returns `Some(outcome)` when
/// the action is consumed before it starts.
pub fn pre_action_check(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    player_id: PlayerId,
    is_block_or_blitz: bool,
) -> Result<Option<ActionOutcome>, String> {
    let player = state
        .player(player_id)
        .ok_or_else(|| format!("pre-action check for unknown {player_id}"))?;

    for (skill, target) in [
        (Skill::BoneHead, 2u8),
        (Skill::ReallyStupid, 4),
        (Skill::WildAnimal, if is_block_or_blitz { 2 } else { 4 }),
        (Skill::TakeRoot, 2),
    ] {
        if !player.has_skill(skill) {
            continue;
        }
        let roll = dice.roll_d6();
        let success = roll >= target;
        events.push(GameEvent::BigGuyCheck {
            player_id,
            skill,
            roll,
            success,
        });
        if !success {
            let player = state.player_mut(player_id).expect("player vanished");
            player.flags.has_acted = true;
            if matches!(skill, Skill::BoneHead | Skill::ReallyStupid) {
                player.flags.lost_tacklezones = true;
            }
            return Ok(Some(ActionOutcome::Failure));
        }
    }

    let player = state.player(player_id).expect("player vanished");
    if player.has_skill(Skill::Bloodlust) {
        let roll = dice.roll_d6();
        let success = roll >= 2;
        events.push(GameEvent::Bloodlust {
            player_id,
            roll,
            success,
        });
        if !success {
            let side = player.side();
            let position = player.position.ok_or("bloodlust check off pitch")?;
            let thrall = state
                .adjacent_teammates(side, &position)
                .iter()
                .filter(|p| p.is_on_pitch())
                .map(|p| p.id)
                .min();
            match thrall {
                Some(thrall_id) => {
                    // Bite: the thrall takes an injury roll, the vampire may
                    // still carry out the declared action.
                    super::injury::injury_roll(
                        state,
                        events,
                        dice,
                        thrall_id,
                        &super::injury::InjuryContext::default(),
                    )?;
                }
                None => {
                    let player = state.player_mut(player_id).expect("player vanished");
                    player.flags.has_acted = true;
                    state.turnover_pending = true;
                    return Ok(Some(ActionOutcome::Turnover));
                }
            }
        }
    }

    Ok(None)
}
