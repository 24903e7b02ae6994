use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::ai::nets::{PolicyNet, ValueNet};
use crate::model::action::Action;
use crate::model::game::GameState;

use super::tree::{SearchConfig, SearchTree};

/// What the search did, alongside the action it picked.
#[derive(Debug, Clone)]
pub struct SearchDiagnostics {
    pub iterations: usize,
    pub best_q: f64,
    pub child_visits: Vec<(Action, u32)>,
}

/// Budgeted Monte-Carlo tree search. Deterministic for a fixed seed,
/// state, weights and iteration budget (wall-clock budgets cut the
/// iteration count, so determinism holds when `max_iterations` binds
/// first).
pub struct SearchPolicy {
    pub config: SearchConfig,
    value_net: Option<Arc<ValueNet>>,
    policy_net: Option<Arc<PolicyNet>>,
    rng: fastrand::Rng,
}

impl SearchPolicy {
    pub fn new(config: SearchConfig, seed: u64) -> Self {
        SearchPolicy {
            config,
            value_net: None,
            policy_net: None,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn with_value_net(mut self, net: Arc<ValueNet>) -> Self {
        self.value_net = Some(net);
        self
    }

    pub fn with_policy_net(mut self, net: Arc<PolicyNet>) -> Self {
        self.policy_net = Some(net);
        self
    }

    /// Pick an action for the active team. A single legal action
    /// short-circuits with zero iterations.
    pub fn search(
        &mut self,
        state: &GameState,
    ) -> Result<(Action, SearchDiagnostics), String> {
        let mut tree = SearchTree::new(
            state.clone(),
            self.config.clone(),
            self.value_net.clone(),
            self.policy_net.clone(),
        )?;
        let child_count = tree.expand_root()?;
        if child_count == 0 {
            return Err("no legal actions to search".to_string());
        }
        if child_count == 1 {
            let action = tree.best_action_single()?;
            return Ok((
                action,
                SearchDiagnostics {
                    iterations: 0,
                    best_q: 0.0,
                    child_visits: tree.root_visit_counts(),
                },
            ));
        }

        let deadline = Instant::now() + Duration::from_millis(self.config.time_budget_ms);
        let mut iterations = 0usize;
        while iterations < self.config.max_iterations {
            // The deadline is polled every 64 iterations, not every one.
            if iterations % 64 == 0 && Instant::now() >= deadline {
                break;
            }
            tree.run_iteration(self.rng.u64(..))?;
            iterations += 1;
        }

        let action = tree.best_action()?;
        Ok((
            action,
            SearchDiagnostics {
                iterations,
                best_q: tree.best_q(),
                child_visits: tree.root_visit_counts(),
            },
        ))
    }
}
