use clap::Parser;
use std::sync::Arc;

use gridbowl_core::ai::mcts::{SearchConfig, SearchPolicy};
use gridbowl_core::ai::nets::{parse_weights, LoadedWeights};
use gridbowl_core::ai::policy::{ActionPolicy, GreedyPolicy, MctsPolicy, RandomPolicy};
use gridbowl_core::dice::SeededDice;
use gridbowl_core::model::enums::{Phase, Side};
use gridbowl_core::model::roster::{build_match, Roster};
use gridbowl_core::rules;

/// Benchmark harness: pit two policies against each other over a number
/// of matches and report the tally.
#[derive(clap_derive::Parser, Debug)]
struct Args {
    /// Policy for the home team: random, greedy or mcts.
    #[clap(long, default_value = "random")]
    home: String,

    /// Policy for the away team: random, greedy or mcts.
    #[clap(long, default_value = "random")]
    away: String,

    /// Number of matches to play.
    #[clap(long, default_value_t = 1)]
    games: u32,

    /// MCTS time budget per decision, in milliseconds.
    #[clap(long, default_value_t = 200)]
    time: u64,

    /// Path to a JSON weights file (value and/or policy).
    #[clap(long)]
    weights: Option<String>,

    /// Exploration constant for the tree search.
    #[clap(long, default_value_t = 1.4)]
    exploration: f64,

    /// Master seed; every game derives its dice from it.
    #[clap(long, default_value_t = 42)]
    seed: u64,

    #[clap(long = "home-roster", default_value = "human")]
    home_roster: String,

    #[clap(long = "away-roster", default_value = "human")]
    away_roster: String,
}

fn load_weights(path: &Option<String>) -> Result<LoadedWeights, String> {
    let Some(path) = path else {
        return Ok(LoadedWeights::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?;
    parse_weights(&text)
}

fn build_policy(
    name: &str,
    args: &Args,
    weights: &LoadedWeights,
    seed: u64,
) -> Option<Box<dyn ActionPolicy>> {
    match name {
        "random" => Some(Box::new(RandomPolicy::new(seed))),
        "greedy" => {
            let mut policy = GreedyPolicy::new(seed);
            if let Some(net) = &weights.value {
                policy = policy.with_value_net(Arc::new(net.clone()));
            }
            Some(Box::new(policy))
        }
        "mcts" => {
            let config = SearchConfig {
                exploration_constant: args.exploration,
                time_budget_ms: args.time,
                ..Default::default()
            };
            let mut search = SearchPolicy::new(config, seed);
            if let Some(net) = &weights.value {
                search = search.with_value_net(Arc::new(net.clone()));
            }
            if let Some(net) = &weights.policy {
                search = search.with_policy_net(Arc::new(net.clone()));
            }
            Some(Box::new(MctsPolicy::new(search)))
        }
        _ => None,
    }
}

/// Upper bound on decisions per game; a safety net against a policy that
/// never ends its turn.
const MAX_DECISIONS: u32 = 4000;

fn play_game(
    game_index: u32,
    args: &Args,
    weights: &LoadedWeights,
    home_roster: &Roster,
    away_roster: &Roster,
) -> Result<(u8, u8), String> {
    let game_seed = args.seed.wrapping_add(game_index as u64).wrapping_mul(0x9e37_79b9);
    let mut dice = SeededDice::new(game_seed);
    let mut home_policy = build_policy(&args.home, args, weights, game_seed ^ 1)
        .expect("home policy validated in main");
    let mut away_policy = build_policy(&args.away, args, weights, game_seed ^ 2)
        .expect("away policy validated in main");

    let mut state = build_match("Home", home_roster, "Away", away_roster);
    state = rules::start_game(&state, &mut dice)
        .map_err(|e| e.to_string())?
        .state;

    let mut decisions = 0u32;
    while !state.is_game_over() && decisions < MAX_DECISIONS {
        decisions += 1;
        match state.phase {
            Phase::Touchdown | Phase::HalfTime => {
                state = rules::next_drive(&state, &mut dice)
                    .map_err(|e| e.to_string())?
                    .state;
            }
            Phase::Setup | Phase::Play => {
                let side = state.active_team.ok_or("no active team mid-game")?;
                let policy = match side {
                    Side::Home => &mut home_policy,
                    Side::Away => &mut away_policy,
                };
                let action = policy.choose(&state)?;
                state = rules::resolve(&state, &action, &mut dice)
                    .map_err(|e| e.to_string())?
                    .state;
            }
            Phase::CoinToss | Phase::Kickoff | Phase::GameOver => {
                return Err(format!("game loop stuck in phase {:?}", state.phase));
            }
        }
    }
    if decisions >= MAX_DECISIONS {
        log::warn!("game {game_index} hit the decision cap; scoring as it stands");
    }
    Ok((state.home.score, state.away.score))
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    for (label, name) in [("--home", &args.home), ("--away", &args.away)] {
        if !matches!(name.as_str(), "random" | "greedy" | "mcts") {
            eprintln!("{label}: unknown policy {name:?} (random, greedy, mcts)");
            std::process::exit(2);
        }
    }
    let Some(home_roster) = Roster::by_name(&args.home_roster) else {
        eprintln!("--home-roster: unknown roster {:?}", args.home_roster);
        std::process::exit(2);
    };
    let Some(away_roster) = Roster::by_name(&args.away_roster) else {
        eprintln!("--away-roster: unknown roster {:?}", args.away_roster);
        std::process::exit(2);
    };

    let weights = match load_weights(&args.weights) {
        Ok(weights) => weights,
        Err(e) => {
            eprintln!("failed to load weights: {e}");
            std::process::exit(1);
        }
    };

    let (mut home_wins, mut away_wins, mut draws) = (0u32, 0u32, 0u32);
    for game in 0..args.games {
        match play_game(game, &args, &weights, &home_roster, &away_roster) {
            Ok((home_score, away_score)) => {
                println!(
                    "game {:>3}: {} {} - {} {}",
                    game + 1,
                    args.home,
                    home_score,
                    away_score,
                    args.away
                );
                match home_score.cmp(&away_score) {
                    std::cmp::Ordering::Greater => home_wins += 1,
                    std::cmp::Ordering::Less => away_wins += 1,
                    std::cmp::Ordering::Equal => draws += 1,
                }
            }
            Err(e) => {
                eprintln!("game {} failed: {e}", game + 1);
                std::process::exit(1);
            }
        }
    }

    println!(
        "result over {} games: home ({}) {} / draws {} / away ({}) {}",
        args.games, args.home, home_wins, draws, args.away, away_wins
    );
}
