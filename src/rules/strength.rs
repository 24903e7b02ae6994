use crate::model::enums::BlockFace;
use crate::model::game::GameState;
use crate::model::player::PlayerId;
use crate::model::skills::Skill;

/// Who picks the block die result.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Chooser {
    Attacker,
    Defender,
}

/// Assists offered to `helper_of` against `against`: teammates standing
/// adjacent to the opponent and not themselves marked by anyone other than
/// that opponent — unless they have Guard.
pub fn assist_count(state: &GameState, helper_of: PlayerId, against: PlayerId) -> u8 {
    let Some(against_pos) = state.player(against).and_then(|p| p.position) else {
        return 0;
    };
    let side = helper_of.side();
    state
        .players_of(side)
        .filter(|p| p.id != helper_of)
        .filter(|p| p.exerts_tacklezone())
        .filter(|p| p.position.is_some_and(|pos| pos.is_adjacent(&against_pos)))
        .filter(|p| {
            if p.has_skill(Skill::Guard) {
                return true;
            }
            let pos = p.position.expect("filtered on position");
            // Marked by any opponent other than the block's own target?
            state
                .players_of(side.opponent())
                .filter(|o| o.id != against)
                .filter(|o| o.exerts_tacklezone())
                .all(|o| o.position.is_none_or(|opos| !opos.is_adjacent(&pos)))
        })
        .count() as u8
}

/// Effective strengths for a block: base ST plus assists on each side.
pub fn effective_strengths(
    state: &GameState,
    attacker_id: PlayerId,
    defender_id: PlayerId,
) -> (u8, u8) {
    let att_st = state.player(attacker_id).map_or(0, |p| p.get_st());
    let def_st = state.player(defender_id).map_or(0, |p| p.get_st());
    let att = att_st + assist_count(state, attacker_id, defender_id);
    let def = def_st + assist_count(state, defender_id, attacker_id);
    (att, def)
}

/// Dice count and chooser from the strength comparison.
pub fn block_dice(att_st: u8, def_st: u8) -> (u8, Chooser) {
    if att_st >= 2 * def_st {
        (3, Chooser::Attacker)
    } else if att_st > def_st {
        (2, Chooser::Attacker)
    } else if att_st == def_st {
        (1, Chooser::Attacker)
    } else if def_st >= 2 * att_st {
        (3, Chooser::Defender)
    } else {
        (2, Chooser::Defender)
    }
}

/// Rank a face from the attacker's point of view; the chooser maximises or
/// minimises it. The ranking folds in the skills that change what a face
/// does to each side.
fn face_value(face: BlockFace, att_block: bool, def_block: bool, def_dodges_push: bool) -> i32 {
    match face {
        BlockFace::AttackerDown => 0,
        BlockFace::BothDown => {
            if att_block && !def_block {
                4
            } else if att_block {
                2
            } else {
                1
            }
        }
        BlockFace::Push => 3,
        BlockFace::Stumble => {
            if def_dodges_push {
                3
            } else {
                5
            }
        }
        BlockFace::DefenderDown => 6,
    }
}

/// Pick one face from the rolled dice. Deterministic: the chooser takes the
/// best (or worst) face by rank, first rolled on ties.
pub fn choose_face(
    state: &GameState,
    faces: &[BlockFace],
    chooser: Chooser,
    attacker_id: PlayerId,
    defender_id: PlayerId,
) -> BlockFace {
    let att_block = state
        .player(attacker_id)
        .is_some_and(|p| p.has_skill(Skill::Block));
    let def_block = state
        .player(defender_id)
        .is_some_and(|p| p.has_skill(Skill::Block) || p.has_skill(Skill::Wrestle));
    let def_dodges_push = state
        .player(defender_id)
        .is_some_and(|p| p.has_skill(Skill::Dodge))
        && !state
            .player(attacker_id)
            .is_some_and(|p| p.has_skill(Skill::Tackle));

    let mut best = faces[0];
    for &face in &faces[1..] {
        let v = face_value(face, att_block, def_block, def_dodges_push);
        let best_v = face_value(best, att_block, def_block, def_dodges_push);
        let better = match chooser {
            Chooser::Attacker => v > best_v,
            Chooser::Defender => v < best_v,
        };
        if better {
            best = face;
        }
    }
    best
}
