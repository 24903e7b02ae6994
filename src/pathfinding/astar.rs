use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::model::constants::{
    clamp_target, GFI_TARGET_BLIZZARD, GFI_TARGET_NORMAL, LEAP_COST, PITCH_HEIGHT, PITCH_WIDTH,
};
use crate::model::enums::Weather;
use crate::model::game::GameState;
use crate::model::player::Player;
use crate::model::position::Square;
use crate::model::skills::Skill;

use super::path::{Path, PathStep};

/// Risk weight for the cost function: higher prefers safer routes over
/// shorter ones.
const RISK_WEIGHT: f64 = 10.0;

/// Paths below this success probability are discarded.
const MIN_PROB_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone)]
struct SearchNode {
    position: Square,
    parent: Option<usize>,
    step: Option<PathStep>,
    moves_left: i8,
    gfis_left: i8,
    leap_used: bool,
    prob: f64,
    cost: f64,
}

impl SearchNode {
    fn total_moves_left(&self) -> i8 {
        self.moves_left + self.gfis_left
    }
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl Eq for SearchNode {}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on cost; ties broken by probability, then by
        // lexicographic cell order so expansion is stable everywhere.
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                self.prob
                    .partial_cmp(&other.prob)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| other.position.cmp(&self.position))
    }
}

/// Pathfinder over the mover's remaining budget. Finds, for every reachable
/// square, the best route with its dodge/GFI/leap annotations.
pub struct Pathfinder<'a> {
    state: &'a GameState,
    player: &'a Player,
    start: Square,
    moves_left: i8,
    gfis_left: i8,
    can_leap: bool,
    gfi_target: u8,
    tzones: [[u8; PITCH_WIDTH as usize]; PITCH_HEIGHT as usize],
    tackle_marked: [[bool; PITCH_WIDTH as usize]; PITCH_HEIGHT as usize],
}

impl<'a> Pathfinder<'a> {
    pub fn new(state: &'a GameState, player: &'a Player) -> Result<Self, String> {
        let start = player
            .position
            .ok_or("pathfinding for a player without a position")?;

        let moves_left = player.flags.movement_remaining.max(0);
        let gfis_left = (player.gfi_allowance() + player.flags.movement_remaining.min(0)).max(0);

        let gfi_target = if state.weather == Weather::Blizzard {
            GFI_TARGET_BLIZZARD
        } else {
            GFI_TARGET_NORMAL
        };

        let mut pathfinder = Pathfinder {
            state,
            player,
            start,
            moves_left,
            gfis_left,
            can_leap: player.has_skill(Skill::Leap),
            gfi_target,
            tzones: [[0; PITCH_WIDTH as usize]; PITCH_HEIGHT as usize],
            tackle_marked: [[false; PITCH_WIDTH as usize]; PITCH_HEIGHT as usize],
        };
        pathfinder.precompute_zones();
        Ok(pathfinder)
    }

    fn precompute_zones(&mut self) {
        let side = self.player.side();
        for opponent in self.state.players_of(side.opponent()) {
            if !opponent.exerts_tacklezone() {
                continue;
            }
            let Some(pos) = opponent.position else {
                continue;
            };
            let tackler = opponent.has_skill(Skill::Tackle);
            for square in pos.adjacent_squares() {
                self.tzones[square.y as usize][square.x as usize] += 1;
                if tackler {
                    self.tackle_marked[square.y as usize][square.x as usize] = true;
                }
            }
        }
    }

    fn tz_at(&self, square: &Square) -> u8 {
        self.tzones[square.y as usize][square.x as usize]
    }

    /// Dodge target for a step leaving `from` into `to`: 7 - AG plus the
    /// destination's tacklezones, less the mover's dodge bonuses.
    fn dodge_target(&self, from: &Square, to: &Square) -> u8 {
        let mut raw = 7 - self.player.get_ag() as i8;
        if !self.player.has_skill(Skill::Stunty) {
            raw += self.tz_at(to) as i8;
        }
        if self.player.has_skill(Skill::TwoHeads) {
            raw -= 1;
        }
        if self.player.has_skill(Skill::Titchy) {
            raw -= 1;
        }
        // Tackle next to the mover negates the Dodge skill's target bonus.
        if self.player.has_skill(Skill::Dodge) && !self.tackle_marked[from.y as usize][from.x as usize]
        {
            raw -= 1;
        }
        clamp_target(raw)
    }

    fn leap_target(&self) -> u8 {
        clamp_target(7 - self.player.get_ag() as i8)
    }

    /// All best paths from the start, deduplicated by target.
    pub fn find_all_paths(&self) -> Vec<Path> {
        let start = SearchNode {
            position: self.start,
            parent: None,
            step: None,
            moves_left: self.moves_left,
            gfis_left: self.gfis_left,
            leap_used: false,
            prob: 1.0,
            cost: 0.0,
        };

        let mut best: HashMap<Square, (f64, i8)> = HashMap::new();
        let mut closed: Vec<SearchNode> = Vec::new();
        let mut open: BinaryHeap<SearchNode> = BinaryHeap::new();
        open.push(start);

        while let Some(current) = open.pop() {
            if let Some((prob, left)) = best.get(&current.position) {
                if *prob >= current.prob && *left >= current.total_moves_left() {
                    continue;
                }
            }
            best.insert(
                current.position,
                (current.prob, current.total_moves_left()),
            );
            let current_index = closed.len();
            closed.push(current.clone());

            if current.total_moves_left() == 0 {
                continue;
            }

            for neighbour in self.step_candidates(&current) {
                let dominated = best.get(&neighbour.position).is_some_and(|(prob, left)| {
                    *prob >= neighbour.prob && *left >= neighbour.total_moves_left()
                });
                if !dominated && neighbour.prob >= MIN_PROB_THRESHOLD {
                    let mut neighbour = neighbour;
                    neighbour.parent = Some(current_index);
                    open.push(neighbour);
                }
            }
        }

        self.extract_paths(&closed)
    }

    /// The best path to one square, if it is reachable.
    pub fn find_path_to(&self, target: Square) -> Option<Path> {
        self.find_all_paths().into_iter().find(|p| p.target == target)
    }

    fn step_candidates(&self, current: &SearchNode) -> Vec<SearchNode> {
        let mut candidates = Vec::new();
        let from_tz = self.tz_at(&current.position);

        // Single-square steps, in lexicographic order.
        for square in current.position.adjacent_squares() {
            if self.state.is_occupied(&square) {
                continue;
            }
            let is_gfi = current.moves_left == 0;
            if is_gfi && current.gfis_left == 0 {
                continue;
            }
            let requires_dodge = from_tz > 0;
            let dodge_target = if requires_dodge {
                self.dodge_target(&current.position, &square)
            } else {
                0
            };
            let mut prob = current.prob;
            if requires_dodge {
                prob *= (7 - dodge_target) as f64 / 6.0;
            }
            if is_gfi {
                prob *= (7 - self.gfi_target) as f64 / 6.0;
            }
            let (moves_left, gfis_left) = if is_gfi {
                (0, current.gfis_left - 1)
            } else {
                (current.moves_left - 1, current.gfis_left)
            };
            candidates.push(SearchNode {
                position: square,
                parent: None,
                step: Some(PathStep {
                    square,
                    requires_dodge,
                    dodge_target,
                    is_gfi,
                    is_leap: false,
                }),
                moves_left,
                gfis_left,
                leap_used: current.leap_used,
                prob,
                cost: 0.0,
            });
        }

        // Leap over an intermediate cell: two movement, one leap per action,
        // its own agility roll instead of a dodge.
        if self.can_leap && !current.leap_used && current.moves_left >= LEAP_COST {
            let target = self.leap_target();
            for square in current.position.squares_at_distance_two() {
                if self.state.is_occupied(&square) {
                    continue;
                }
                let prob = current.prob * (7 - target) as f64 / 6.0;
                candidates.push(SearchNode {
                    position: square,
                    parent: None,
                    step: Some(PathStep {
                        square,
                        requires_dodge: false,
                        dodge_target: target,
                        is_gfi: false,
                        is_leap: true,
                    }),
                    moves_left: current.moves_left - LEAP_COST,
                    gfis_left: current.gfis_left,
                    leap_used: true,
                    prob,
                    cost: 0.0,
                });
            }
        }

        for candidate in &mut candidates {
            let spent =
                (self.moves_left - candidate.moves_left) + (self.gfis_left - candidate.gfis_left);
            candidate.cost = spent as f64 + (1.0 - candidate.prob) * RISK_WEIGHT;
        }
        candidates
    }

    fn extract_paths(&self, closed: &[SearchNode]) -> Vec<Path> {
        let mut paths = Vec::new();
        for (idx, node) in closed.iter().enumerate() {
            if node.position == self.start {
                continue;
            }

            let mut steps = Vec::new();
            let mut cursor = idx;
            loop {
                let current = &closed[cursor];
                if let Some(step) = current.step {
                    steps.push(step);
                }
                match current.parent {
                    Some(parent) => cursor = parent,
                    None => break,
                }
            }
            steps.reverse();

            paths.push(Path {
                steps,
                target: node.position,
                prob: node.prob,
                moves_used: self.moves_left - node.moves_left,
                gfis_used: self.gfis_left - node.gfis_left,
            });
        }

        // Best path per target: probability first, then remaining budget,
        // then lexicographic target order for stability.
        paths.sort_by(|a, b| {
            a.target.cmp(&b.target).then_with(|| {
                b.prob
                    .partial_cmp(&a.prob)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| {
                        (a.moves_used + a.gfis_used).cmp(&(b.moves_used + b.gfis_used))
                    })
            })
        });
        let mut seen = std::collections::HashSet::new();
        paths.retain(|p| seen.insert(p.target));
        paths
    }
}
