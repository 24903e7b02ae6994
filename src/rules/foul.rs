use crate::dice::DiceSource;
use crate::model::enums::{ActionOutcome, PlayerStatus};
use crate::model::event::GameEvent;
use crate::model::game::GameState;
use crate::model::player::PlayerId;
use crate::model::skills::Skill;

use super::injury::{armour_roll, injury_roll, InjuryContext};
use super::strength::assist_count;

/// A boot to a player already on the ground. Armour with assists; doubles
/// on either roll and the referee spots it — unless the fouler is sneaky.
pub fn resolve_foul(
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
    dice: &mut dyn DiceSource,
    fouler_id: PlayerId,
    target_id: PlayerId,
) -> Result<ActionOutcome, String> {
    let side = state
        .player(fouler_id)
        .ok_or_else(|| format!("foul by unknown {fouler_id}"))?
        .side();
    state.team_mut(side).foul_used_this_turn = true;
    if let Some(player) = state.player_mut(fouler_id) {
        player.flags.has_acted = true;
    }

    events.push(GameEvent::Foul {
        player_id: fouler_id,
        target_id,
    });

    let offensive = assist_count(state, fouler_id, target_id);
    let defensive = assist_count(state, target_id, fouler_id);
    let mut armour_modifier = offensive as i8 - defensive as i8;
    if state
        .player(fouler_id)
        .is_some_and(|p| p.has_skill(Skill::DirtyPlayer))
    {
        armour_modifier += 1;
    }

    let ctx = InjuryContext {
        armour_modifier,
        foul: true,
        ..Default::default()
    };
    let armour = armour_roll(state, events, dice, target_id, &ctx)?;
    let mut spotted = armour.doubles;
    let mut broken = armour.broken;
    if armour.broken {
        let injury = injury_roll(state, events, dice, target_id, &ctx)?;
        spotted = spotted || injury.doubles;
        broken = true;
    }

    if spotted
        && !state
            .player(fouler_id)
            .is_some_and(|p| p.has_skill(Skill::SneakyGit))
    {
        events.push(GameEvent::Ejection {
            player_id: fouler_id,
        });
        let fouler = state.player_mut(fouler_id).expect("fouler vanished");
        fouler.status = PlayerStatus::Ejected;
        fouler.position = None;
        state.turnover_pending = true;
        return Ok(ActionOutcome::Turnover);
    }

    Ok(if broken {
        ActionOutcome::Success
    } else {
        ActionOutcome::Failure
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::model::enums::Side;
    use crate::model::player::Player;
    use crate::model::position::Square;
    use crate::model::team::TeamState;

    fn foul_state(fouler_skills: &[Skill]) -> GameState {
        let mut state = GameState::new(
            TeamState::new("H", "human", Side::Home, 0, false),
            TeamState::new("A", "orc", Side::Away, 0, false),
        );
        let fouler = Player {
            id: PlayerId(1),
            status: PlayerStatus::Standing,
            position: Some(Square::new(10, 7)),
            skills: fouler_skills.into(),
            ..Default::default()
        };
        let victim = Player {
            id: PlayerId(12),
            av: 8,
            status: PlayerStatus::Prone,
            position: Some(Square::new(11, 7)),
            ..Default::default()
        };
        state.players.insert(fouler.id, fouler);
        state.players.insert(victim.id, victim);
        state.active_team = Some(Side::Home);
        state
    }

    #[test]
    fn test_foul_breaks_armour() {
        let mut state = foul_state(&[]);
        let mut events = vec![];
        // Armour 6+3 = 9 > 8 breaks; injury 4+3 = 7 stunned (already prone).
        let mut dice = ScriptedDice::new(&[6, 3, 4, 3]);
        let outcome =
            resolve_foul(&mut state, &mut events, &mut dice, PlayerId(1), PlayerId(12)).unwrap();
        assert_eq!(outcome, ActionOutcome::Success);
        assert!(state.home.foul_used_this_turn);
        assert_eq!(
            state.player(PlayerId(12)).unwrap().status,
            PlayerStatus::Stunned
        );
    }

    #[test]
    fn test_doubles_eject_the_fouler() {
        let mut state = foul_state(&[]);
        let mut events = vec![];
        // Armour 5+5 doubles (and breaks), injury 2+3 stunned: ejected.
        let mut dice = ScriptedDice::new(&[5, 5, 2, 3]);
        let outcome =
            resolve_foul(&mut state, &mut events, &mut dice, PlayerId(1), PlayerId(12)).unwrap();
        assert_eq!(outcome, ActionOutcome::Turnover);
        assert_eq!(
            state.player(PlayerId(1)).unwrap().status,
            PlayerStatus::Ejected
        );
        assert!(state.turnover_pending);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Ejection { .. })));
    }

    #[test]
    fn test_sneaky_git_avoids_ejection() {
        let mut state = foul_state(&[Skill::SneakyGit]);
        let mut events = vec![];
        let mut dice = ScriptedDice::new(&[5, 5, 2, 3]);
        let outcome =
            resolve_foul(&mut state, &mut events, &mut dice, PlayerId(1), PlayerId(12)).unwrap();
        assert_eq!(outcome, ActionOutcome::Success);
        assert!(state.player(PlayerId(1)).unwrap().is_standing());
    }

    #[test]
    fn test_dirty_player_bonus() {
        let mut state = foul_state(&[Skill::DirtyPlayer]);
        let mut events = vec![];
        // 4+4 = 8 + 1 = 9 > 8 breaks; doubles! Ejected despite the break.
        let mut dice = ScriptedDice::new(&[4, 4, 2, 4]);
        let outcome =
            resolve_foul(&mut state, &mut events, &mut dice, PlayerId(1), PlayerId(12)).unwrap();
        assert_eq!(outcome, ActionOutcome::Turnover);
    }
}
