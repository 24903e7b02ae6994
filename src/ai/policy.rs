use std::sync::Arc;

use crate::ai::features::{extract_features, heuristic_score};
use crate::ai::mcts::SearchPolicy;
use crate::ai::nets::ValueNet;
use crate::dice::SeededDice;
use crate::model::action::Action;
use crate::model::game::GameState;
use crate::rules;

/// A decision policy: hand it a state, get the action to declare.
/// Strategy seam between the engine and whoever is steering a team.
pub trait ActionPolicy {
    fn choose(&mut self, state: &GameState) -> Result<Action, String>;

    fn name(&self) -> &'static str;
}

/// Uniformly random over the legal actions. The floor every other policy
/// is measured against.
pub struct RandomPolicy {
    rng: fastrand::Rng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        RandomPolicy {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl ActionPolicy for RandomPolicy {
    fn choose(&mut self, state: &GameState) -> Result<Action, String> {
        let actions = rules::available_actions(state);
        if actions.is_empty() {
            return Err("no legal actions".to_string());
        }
        let index = self.rng.usize(0..actions.len());
        Ok(actions[index].clone())
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// One-ply lookahead: simulate each candidate once with private dice and
/// keep the best-scoring afterstate.
pub struct GreedyPolicy {
    rng: fastrand::Rng,
    value_net: Option<Arc<ValueNet>>,
}

impl GreedyPolicy {
    pub fn new(seed: u64) -> Self {
        GreedyPolicy {
            rng: fastrand::Rng::with_seed(seed),
            value_net: None,
        }
    }

    pub fn with_value_net(mut self, net: Arc<ValueNet>) -> Self {
        self.value_net = Some(net);
        self
    }

    fn score(&self, state: &GameState, side: crate::model::enums::Side) -> f64 {
        match &self.value_net {
            Some(net) => net.evaluate(&extract_features(state, side)) as f64,
            None => heuristic_score(state, side),
        }
    }
}

impl ActionPolicy for GreedyPolicy {
    fn choose(&mut self, state: &GameState) -> Result<Action, String> {
        let side = state.active_team.ok_or("no active team")?;
        let actions = rules::available_actions(state);
        if actions.is_empty() {
            return Err("no legal actions".to_string());
        }

        let mut best: Option<(f64, Action)> = None;
        for action in actions {
            let mut dice = SeededDice::new(self.rng.u64(..));
            let Ok(resolution) = rules::resolve(state, &action, &mut dice) else {
                continue;
            };
            let value = self.score(&resolution.state, side);
            let better = best.as_ref().is_none_or(|(b, _)| value > *b);
            if better {
                best = Some((value, action));
            }
        }
        best.map(|(_, action)| action)
            .ok_or("no action resolved cleanly".to_string())
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}

/// Full tree search behind the common policy seam.
pub struct MctsPolicy {
    search: SearchPolicy,
}

impl MctsPolicy {
    pub fn new(search: SearchPolicy) -> Self {
        MctsPolicy { search }
    }
}

impl ActionPolicy for MctsPolicy {
    fn choose(&mut self, state: &GameState) -> Result<Action, String> {
        let (action, _) = self.search.search(state)?;
        Ok(action)
    }

    fn name(&self) -> &'static str {
        "mcts"
    }
}
