use crate::model::action::{Action, ActionKind};
use crate::model::ball::Ball;
use crate::model::constants::{PITCH_HEIGHT, PITCH_WIDTH, TEAM_SIZE, TURNS_PER_HALF};
use crate::model::enums::{PlayerStatus, Side, Weather};
use crate::model::game::GameState;
use crate::model::position::Square;
use crate::model::skills::Skill;
use crate::pathfinding::Pathfinder;

/// Width of the state feature vector. The index-to-meaning mapping is
/// frozen: weight files are keyed positionally.
pub const FEATURE_COUNT: usize = 39;

/// Width of the per-action projection appended to the state features for
/// the policy network.
pub const ACTION_FEATURE_COUNT: usize = 18;

const SKILL_FEATURES: [Skill; 6] = [
    Skill::Block,
    Skill::Dodge,
    Skill::Guard,
    Skill::MightyBlow,
    Skill::Tackle,
    Skill::Claw,
];

fn status_counts(state: &GameState, side: Side) -> [f32; 5] {
    let mut counts = [0f32; 5];
    for player in state.players_of(side) {
        let slot = match player.status {
            PlayerStatus::Standing => 0,
            PlayerStatus::Prone => 1,
            PlayerStatus::Stunned => 2,
            PlayerStatus::KnockedOut => 3,
            PlayerStatus::Injured | PlayerStatus::Dead => 4,
            _ => continue,
        };
        counts[slot] += 1.0;
    }
    counts.map(|c| c / TEAM_SIZE as f32)
}

fn skill_fractions(state: &GameState, side: Side) -> [f32; 6] {
    let mut fractions = [0f32; 6];
    for player in state.players_of(side) {
        for (i, skill) in SKILL_FEATURES.iter().enumerate() {
            if player.has_skill(*skill) {
                fractions[i] += 1.0;
            }
        }
    }
    fractions.map(|c| c / TEAM_SIZE as f32)
}

fn target_column(side: Side) -> i32 {
    match side {
        Side::Home => PITCH_WIDTH - 1,
        Side::Away => 0,
    }
}

/// Whether the carrier can reach the endzone with the movement he has
/// left (a scoring threat this turn).
fn scoring_threat(state: &GameState, side: Side) -> bool {
    let Some(carrier) = state.carrier() else {
        return false;
    };
    if carrier.side() != side || !carrier.is_standing() {
        return false;
    }
    let Some(position) = carrier.position else {
        return false;
    };
    let distance = (position.x - target_column(side)).abs();
    let budget =
        (carrier.flags.movement_remaining.max(0) + carrier.gfi_allowance()) as i32;
    distance <= budget
}

/// Pure projection of a state into a fixed-width vector, from one side's
/// perspective. Swapping the perspective swaps the paired features.
pub fn extract_features(state: &GameState, perspective: Side) -> [f32; FEATURE_COUNT] {
    let mut features = [0f32; FEATURE_COUNT];
    let me = perspective;
    let opp = perspective.opponent();
    let my_team = state.team(me);
    let opp_team = state.team(opp);
    let mut index = 0;
    let mut push = |features: &mut [f32; FEATURE_COUNT], value: f32| {
        features[index] = value;
        index += 1;
    };

    // 0: bias
    push(&mut features, 1.0);
    // 1: score differential, clamped
    push(
        &mut features,
        ((my_team.score as f32 - opp_team.score as f32) / 3.0).clamp(-1.0, 1.0),
    );
    // 2-3: raw scores
    push(&mut features, my_team.score as f32 / 5.0);
    push(&mut features, opp_team.score as f32 / 5.0);
    // 4: turn progress across the match
    let total_turns = (TURNS_PER_HALF as f32) * 2.0;
    let played =
        (state.half as f32 - 1.0) * TURNS_PER_HALF as f32 + my_team.turn_number as f32;
    push(&mut features, (played / total_turns).clamp(0.0, 1.0));
    // 5-14: status counts per side
    for value in status_counts(state, me) {
        push(&mut features, value);
    }
    for value in status_counts(state, opp) {
        push(&mut features, value);
    }
    // 15-16: rerolls
    push(&mut features, my_team.rerolls_total as f32 / 8.0);
    push(&mut features, opp_team.rerolls_total as f32 / 8.0);
    // 17-19: ball possession
    let carrier_side = state.ball.carrier().map(|id| id.side());
    push(&mut features, (carrier_side == Some(me)) as u8 as f32);
    push(&mut features, (carrier_side == Some(opp)) as u8 as f32);
    push(
        &mut features,
        matches!(state.ball, Ball::OnGround(_)) as u8 as f32,
    );
    // 20: carrier distance to the target endzone (own carrier only)
    let carrier_distance = state
        .carrier()
        .filter(|p| p.side() == me)
        .and_then(|p| p.position)
        .map(|pos| (pos.x - target_column(me)).abs() as f32 / (PITCH_WIDTH - 1) as f32)
        .unwrap_or(1.0);
    push(&mut features, carrier_distance);
    // 21: scoring threat
    push(&mut features, scoring_threat(state, me) as u8 as f32);
    // 22-26: weather one-hot
    for weather in [
        Weather::SwelteringHeat,
        Weather::VerySunny,
        Weather::Nice,
        Weather::PouringRain,
        Weather::Blizzard,
    ] {
        push(&mut features, (state.weather == weather) as u8 as f32);
    }
    // 27-38: skill incidence per side
    for value in skill_fractions(state, me) {
        push(&mut features, value);
    }
    for value in skill_fractions(state, opp) {
        push(&mut features, value);
    }

    debug_assert_eq!(index, FEATURE_COUNT);
    features
}

/// Fixed-width projection of a candidate action, appended to the state
/// features when scoring policy logits.
pub fn action_features(state: &GameState, action: &Action) -> [f32; ACTION_FEATURE_COUNT] {
    let mut features = [0f32; ACTION_FEATURE_COUNT];
    features[action.kind().index()] = 1.0;

    let target = action.target_square().or_else(|| {
        match action {
            Action::Block { target_id, .. }
            | Action::HandOff { target_id, .. }
            | Action::Foul { target_id, .. }
            | Action::HypnoticGaze { target_id, .. } => {
                state.player(*target_id).and_then(|p| p.position)
            }
            _ => None,
        }
    });
    if let Some(Square { x, y }) = target {
        features[ActionKind::COUNT] = x as f32 / (PITCH_WIDTH - 1) as f32;
        features[ActionKind::COUNT + 1] = y as f32 / (PITCH_HEIGHT - 1) as f32;
    }

    let actor_is_carrier = action
        .player_id()
        .is_some_and(|id| state.ball.is_carried_by(id));
    features[ActionKind::COUNT + 2] = actor_is_carrier as u8 as f32;

    // Range bucket for throws.
    if let (Some(player_id), Some(target)) = (action.player_id(), action.target_square()) {
        if matches!(
            action.kind(),
            ActionKind::Pass | ActionKind::BombThrow | ActionKind::ThrowTeammate
        ) {
            if let Some(from) = state.player(player_id).and_then(|p| p.position) {
                if let Some(range) =
                    crate::model::enums::PassRange::from_distance(from.distance(&target))
                {
                    features[ActionKind::COUNT + 3] = range as u8 as f32 / 3.0;
                }
            }
        }
    }

    // Net block dice for blocks and blitzes: attacker-chooses positive.
    if let Action::Block {
        attacker_id,
        target_id,
    }
    | Action::Blitz {
        player_id: attacker_id,
        target_id,
        ..
    } = action
    {
        let (att, def) = crate::rules::strength::effective_strengths(state, *attacker_id, *target_id);
        let (count, chooser) = crate::rules::strength::block_dice(att, def);
        let signed = match chooser {
            crate::rules::strength::Chooser::Attacker => count as f32,
            crate::rules::strength::Chooser::Defender => -(count as f32),
        };
        features[ActionKind::COUNT + 4] = signed / 3.0;
    }

    features
}

/// Heuristic state score in [-1, 1] from a side's perspective: carrier
/// progress dominates, support and loose-ball proximity nudge.
pub fn heuristic_score(state: &GameState, perspective: Side) -> f64 {
    let score_diff = state.team(perspective).score as f64
        - state.team(perspective.opponent()).score as f64;
    let mut value = (score_diff / 3.0).clamp(-0.9, 0.9);

    let max_distance = (PITCH_WIDTH - 1) as f64;
    match state.ball {
        Ball::Carried(id) => {
            let Some(carrier) = state.player(id) else {
                return value;
            };
            let Some(pos) = carrier.position else {
                return value;
            };
            let side = carrier.side();
            let progress =
                1.0 - (pos.x - target_column(side)).abs() as f64 / max_distance;
            if side == perspective {
                value += 0.08 * progress + 0.02;
            } else {
                value -= 0.08 * progress + 0.02;
            }
        }
        Ball::OnGround(pos) => {
            let mine = nearest_distance(state, perspective, &pos);
            let theirs = nearest_distance(state, perspective.opponent(), &pos);
            value += 0.02 * (theirs - mine).clamp(-1.0, 1.0);
        }
        Ball::OffPitch => {}
    }

    let my_standing = state
        .players_of(perspective)
        .filter(|p| p.is_standing())
        .count() as f64;
    let opp_standing = state
        .players_of(perspective.opponent())
        .filter(|p| p.is_standing())
        .count() as f64;
    value += 0.01 * (my_standing - opp_standing) / TEAM_SIZE as f64;

    value.clamp(-1.0, 1.0)
}

fn nearest_distance(state: &GameState, side: Side, cell: &Square) -> f64 {
    state
        .players_of(side)
        .filter(|p| p.is_standing())
        .filter_map(|p| p.position)
        .map(|pos| pos.distance(cell) as f64)
        .fold(1.0, |best, d| best.min(d / (PITCH_WIDTH - 1) as f64))
}

/// True when the side's carrier could score this turn; exposed for the
/// greedy policy's tie-breaking.
pub fn can_score_now(state: &GameState, side: Side) -> bool {
    if !scoring_threat(state, side) {
        return false;
    }
    let Some(carrier) = state.carrier() else {
        return false;
    };
    let Ok(finder) = Pathfinder::new(state, carrier) else {
        return false;
    };
    finder
        .find_all_paths()
        .iter()
        .any(|p| p.target.is_endzone(side))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::player::{Player, PlayerId};
    use crate::model::roster::{build_match, Roster};
    use crate::model::team::TeamState;
    use crate::model::game::GameState;

    fn mirrored_state() -> GameState {
        let mut state = GameState::new(
            TeamState::new("H", "human", Side::Home, 3, false),
            TeamState::new("A", "orc", Side::Away, 2, false),
        );
        for (id, x, y, status) in [
            (1u8, 10, 7, PlayerStatus::Standing),
            (2u8, 9, 7, PlayerStatus::Prone),
            (12u8, 15, 7, PlayerStatus::Standing),
        ] {
            let player = Player {
                id: PlayerId(id),
                status,
                position: Some(Square::new(x, y)),
                ..Default::default()
            };
            state.players.insert(player.id, player);
        }
        state.ball = Ball::Carried(PlayerId(1));
        state
    }

    #[test]
    fn test_feature_vector_width_and_bias() {
        let state = mirrored_state();
        let features = extract_features(&state, Side::Home);
        assert_eq!(features.len(), FEATURE_COUNT);
        assert_eq!(features[0], 1.0);
    }

    #[test]
    fn test_perspective_swap_symmetry() {
        let state = mirrored_state();
        let home = extract_features(&state, Side::Home);
        let away = extract_features(&state, Side::Away);
        // i_have_ball and opp_has_ball swap.
        assert_eq!(home[17], 1.0);
        assert_eq!(home[18], 0.0);
        assert_eq!(away[17], 0.0);
        assert_eq!(away[18], 1.0);
        // Standing counts swap between the paired slots.
        assert_eq!(home[5], away[10]);
        assert_eq!(home[10], away[5]);
        // Prone counts too.
        assert_eq!(home[6], away[11]);
    }

    #[test]
    fn test_weather_one_hot() {
        let mut state = mirrored_state();
        state.weather = Weather::Blizzard;
        let features = extract_features(&state, Side::Home);
        let weather_slice = &features[22..27];
        assert_eq!(weather_slice.iter().filter(|v| **v == 1.0).count(), 1);
        assert_eq!(weather_slice[4], 1.0);
    }

    #[test]
    fn test_heuristic_prefers_carrier_progress() {
        let mut state = mirrored_state();
        let near = heuristic_score(&state, Side::Home);
        state.player_mut(PlayerId(1)).unwrap().position = Some(Square::new(22, 7));
        let nearer = heuristic_score(&state, Side::Home);
        assert!(nearer > near);
        // The opponent sees it the other way round.
        assert!(heuristic_score(&state, Side::Away) < 0.0);
    }

    #[test]
    fn test_action_features_one_hot() {
        let state = build_match("H", &Roster::human(), "A", &Roster::orc());
        let action = Action::EndTurn;
        let features = action_features(&state, &action);
        assert_eq!(features.len(), ACTION_FEATURE_COUNT);
        assert_eq!(features[ActionKind::EndTurn.index()], 1.0);
        assert_eq!(
            features.iter().take(ActionKind::COUNT).sum::<f32>(),
            1.0
        );
    }
}
