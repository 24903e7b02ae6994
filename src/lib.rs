pub mod ai;
pub mod dice;
pub mod model;
pub mod pathfinding;
pub mod rules;

pub use ai::features::{extract_features, FEATURE_COUNT};
pub use ai::mcts::{SearchConfig, SearchDiagnostics, SearchPolicy};
pub use ai::nets::{parse_weights, LoadedWeights, PolicyNet, ValueNet};
pub use ai::policy::{ActionPolicy, GreedyPolicy, MctsPolicy, RandomPolicy};
pub use dice::{DiceSource, ScriptedDice, SeededDice};
pub use model::action::Action;
pub use model::game::GameState;
pub use rules::{available_actions, next_drive, resolve, start_game, Resolution, RulesError};
