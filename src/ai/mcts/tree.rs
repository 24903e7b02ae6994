use std::sync::Arc;

use crate::ai::features::{action_features, extract_features, heuristic_score};
use crate::ai::nets::{PolicyNet, ValueNet};
use crate::dice::{DiceSource, SeededDice};
use crate::model::action::Action;
use crate::model::enums::{Phase, Side};
use crate::model::game::GameState;
use crate::rules;

use super::node::SearchNode;

/// Knobs for one search. Iterations and wall-clock cap whichever bites
/// first; `widening_top_k` caps expansion when a policy ranks the moves.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub exploration_constant: f64,
    pub time_budget_ms: u64,
    pub max_iterations: usize,
    pub widening_top_k: usize,
    pub rollout_depth: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            exploration_constant: 1.4,
            time_budget_ms: 1000,
            max_iterations: 10_000,
            widening_top_k: 16,
            rollout_depth: 12,
        }
    }
}

/// The search tree proper: an arena of nodes addressed by index. States
/// are not stored — each iteration replays the action chain from the root
/// with fresh dice (open-loop search over a stochastic game).
pub struct SearchTree {
    pub nodes: Vec<SearchNode>,
    root_state: GameState,
    root_side: Side,
    config: SearchConfig,
    value_net: Option<Arc<ValueNet>>,
    policy_net: Option<Arc<PolicyNet>>,
}

/// What a replay ended on.
enum ReplayEnd {
    /// Reached the selected leaf with the state in hand.
    AtLeaf(GameState),
    /// Dice diverged from the recorded chain at `depth` along the path.
    Diverged(GameState, usize),
}

impl SearchTree {
    pub fn new(
        root_state: GameState,
        config: SearchConfig,
        value_net: Option<Arc<ValueNet>>,
        policy_net: Option<Arc<PolicyNet>>,
    ) -> Result<Self, String> {
        let root_side = root_state
            .active_team
            .ok_or("search from a state without an active team")?;
        Ok(SearchTree {
            nodes: vec![SearchNode::root()],
            root_state,
            root_side,
            config,
            value_net,
            policy_net,
        })
    }

    /// Play is over for the root team once the phase leaves `Play` or the
    /// turn passes to the opponent.
    fn is_terminal_state(&self, state: &GameState) -> bool {
        state.phase != Phase::Play || state.active_team != Some(self.root_side)
    }

    /// One MCTS iteration: select, replay, expand, evaluate, backpropagate.
    pub fn run_iteration(&mut self, seed: u64) -> Result<(), String> {
        let mut dice = SeededDice::new(seed);
        let path = self.select_path();
        let (state, eval_depth) = match self.replay(&path, &mut dice)? {
            ReplayEnd::AtLeaf(state) => (state, path.len() - 1),
            ReplayEnd::Diverged(state, depth) => (state, depth),
        };

        let leaf = path[eval_depth];
        if eval_depth == path.len() - 1 && !self.nodes[leaf].expanded {
            self.expand(leaf, &state)?;
        }

        let value = self.evaluate(&state, &mut dice)?;
        for index in path.iter().take(eval_depth + 1) {
            self.nodes[*index].add_visit(value);
        }
        Ok(())
    }

    /// Descend from the root by selection score until an unexpanded or
    /// terminal node turns up.
    fn select_path(&self) -> Vec<usize> {
        let mut path = vec![0usize];
        let mut current = 0usize;
        loop {
            let node = &self.nodes[current];
            if !node.expanded || node.terminal || node.children.is_empty() {
                return path;
            }
            let parent_visits = node.visits;
            let use_puct = self.policy_net.is_some();
            let fpu = if use_puct {
                let visited: Vec<&SearchNode> = node
                    .children
                    .iter()
                    .map(|c| &self.nodes[*c])
                    .filter(|c| c.visits > 0)
                    .collect();
                if visited.is_empty() {
                    0.0
                } else {
                    visited.iter().map(|c| c.q()).sum::<f64>() / visited.len() as f64
                }
            } else {
                0.0
            };
            let mut best = node.children[0];
            let mut best_score = f64::NEG_INFINITY;
            for child_index in &node.children {
                let child = &self.nodes[*child_index];
                let score = if use_puct {
                    child.puct(self.config.exploration_constant, parent_visits, fpu)
                } else {
                    child.ucb1(self.config.exploration_constant, parent_visits)
                };
                if score > best_score {
                    best_score = score;
                    best = *child_index;
                }
            }
            path.push(best);
            current = best;
        }
    }

    /// Re-execute the action chain from the root. The dice are fresh, so a
    /// recorded action may come up inadmissible (an earlier roll went the
    /// other way); the replay then stops where it stands.
    fn replay(&self, path: &[usize], dice: &mut dyn DiceSource) -> Result<ReplayEnd, String> {
        let mut state = self.root_state.clone();
        for (depth, index) in path.iter().enumerate().skip(1) {
            let action = self.nodes[*index]
                .action
                .clone()
                .ok_or("non-root node without an action")?;
            if self.is_terminal_state(&state) {
                return Ok(ReplayEnd::Diverged(state, depth - 1));
            }
            match rules::resolve(&state, &action, dice) {
                Ok(resolution) => state = resolution.state,
                Err(rules::RulesError::Internal(e)) => return Err(e),
                Err(_) => return Ok(ReplayEnd::Diverged(state, depth - 1)),
            }
        }
        Ok(ReplayEnd::AtLeaf(state))
    }

    /// Enumerate the leaf's actions and attach children. With a policy,
    /// progressive widening keeps only the top-K by prior.
    fn expand(&mut self, leaf: usize, state: &GameState) -> Result<(), String> {
        self.nodes[leaf].expanded = true;
        if self.is_terminal_state(state) {
            self.nodes[leaf].terminal = true;
            return Ok(());
        }
        let actions = rules::available_actions(state);
        if actions.is_empty() {
            self.nodes[leaf].terminal = true;
            return Ok(());
        }

        let mut scored: Vec<(Action, f32)> = match &self.policy_net {
            Some(policy) => {
                let state_features = extract_features(state, self.root_side);
                let logits: Vec<f32> = actions
                    .iter()
                    .map(|a| policy.logit(&state_features, &action_features(state, a)))
                    .collect();
                let priors = policy.priors(&logits);
                actions.into_iter().zip(priors).collect()
            }
            None => actions.into_iter().map(|a| (a, 1.0)).collect(),
        };

        if self.policy_net.is_some() && scored.len() > self.config.widening_top_k {
            scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(self.config.widening_top_k);
            let total: f32 = scored.iter().map(|(_, p)| p).sum();
            if total > f32::EPSILON {
                for (_, p) in scored.iter_mut() {
                    *p /= total;
                }
            }
        }

        for (action, prior) in scored {
            let child = SearchNode::child(action, leaf, prior);
            let index = self.nodes.len();
            self.nodes.push(child);
            self.nodes[leaf].children.push(index);
        }
        Ok(())
    }

    /// Leaf evaluation from the root team's perspective: the value network
    /// when loaded, otherwise a bounded random rollout ending in the
    /// heuristic score.
    fn evaluate(&self, state: &GameState, dice: &mut SeededDice) -> Result<f64, String> {
        if let Some(net) = &self.value_net {
            let features = extract_features(state, self.root_side);
            return Ok(net.evaluate(&features) as f64);
        }

        let mut rollout = state.clone();
        for _ in 0..self.config.rollout_depth {
            if rollout.phase != Phase::Play {
                break;
            }
            let actions = rules::available_actions(&rollout);
            if actions.is_empty() {
                break;
            }
            let pick = (dice.roll_d8() as usize * 31 + dice.roll_d8() as usize) % actions.len();
            match rules::resolve(&rollout, &actions[pick], dice) {
                Ok(resolution) => rollout = resolution.state,
                Err(rules::RulesError::Internal(e)) => return Err(e),
                Err(_) => break,
            }
        }
        Ok(heuristic_score(&rollout, self.root_side))
    }

    /// The root child with the most visits; ties go to the higher mean
    /// value.
    pub fn best_action(&self) -> Result<Action, String> {
        let root = &self.nodes[0];
        let best = root
            .children
            .iter()
            .map(|c| &self.nodes[*c])
            .max_by(|a, b| {
                a.visits
                    .cmp(&b.visits)
                    .then_with(|| a.q().partial_cmp(&b.q()).unwrap_or(std::cmp::Ordering::Equal))
            })
            .ok_or("no children at the root")?;
        best.action.clone().ok_or("root child without an action".to_string())
    }

    /// The only root child's action: the single-legal-action shortcut.
    pub fn best_action_single(&self) -> Result<Action, String> {
        let root = &self.nodes[0];
        if root.children.len() != 1 {
            return Err(format!(
                "single-action shortcut with {} children",
                root.children.len()
            ));
        }
        self.nodes[root.children[0]]
            .action
            .clone()
            .ok_or("root child without an action".to_string())
    }

    /// Visit counts per root child, for diagnostics.
    pub fn root_visit_counts(&self) -> Vec<(Action, u32)> {
        self.nodes[0]
            .children
            .iter()
            .filter_map(|c| {
                let child = &self.nodes[*c];
                child.action.clone().map(|a| (a, child.visits))
            })
            .collect()
    }

    pub fn best_q(&self) -> f64 {
        self.nodes[0]
            .children
            .iter()
            .map(|c| self.nodes[*c].q())
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Make sure the root has children before the loop starts; needed for
    /// the single-action short-circuit and empty-state errors.
    pub fn expand_root(&mut self) -> Result<usize, String> {
        let state = self.root_state.clone();
        if !self.nodes[0].expanded {
            self.expand(0, &state)?;
        }
        Ok(self.nodes[0].children.len())
    }
}
