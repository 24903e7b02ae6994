use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gridbowl_core::ai::features::{extract_features, heuristic_score, FEATURE_COUNT};
use gridbowl_core::ai::nets::{PolicyNet, ValueNet};
use gridbowl_core::model::ball::Ball;
use gridbowl_core::model::enums::{Phase, PlayerStatus, Side};
use gridbowl_core::model::game::GameState;
use gridbowl_core::model::player::PlayerId;
use gridbowl_core::model::position::Square;
use gridbowl_core::model::roster::{build_match, Roster};
use gridbowl_core::rules;

/// A mid-drive state with both teams fielded and the ball carried.
fn benchmark_state() -> GameState {
    let mut state = build_match("Reavers", &Roster::human(), "Raiders", &Roster::orc());
    state.phase = Phase::Play;
    state.active_team = Some(Side::Home);
    state.home.turn_number = 3;
    state.away.turn_number = 3;
    let home_cells = [
        (12, 6),
        (12, 7),
        (12, 8),
        (10, 4),
        (10, 10),
        (8, 7),
        (7, 5),
        (7, 9),
        (5, 7),
        (4, 3),
        (4, 11),
    ];
    let away_cells = [
        (13, 6),
        (13, 7),
        (13, 8),
        (15, 4),
        (15, 10),
        (17, 7),
        (18, 5),
        (18, 9),
        (20, 7),
        (21, 3),
        (21, 11),
    ];
    for (n, (x, y)) in home_cells.iter().enumerate() {
        let player = state.player_mut(PlayerId(n as u8 + 1)).unwrap();
        player.status = PlayerStatus::Standing;
        player.position = Some(Square::new(*x, *y));
        player.begin_turn();
    }
    for (n, (x, y)) in away_cells.iter().enumerate() {
        let player = state.player_mut(PlayerId(n as u8 + 12)).unwrap();
        player.status = PlayerStatus::Standing;
        player.position = Some(Square::new(*x, *y));
        player.begin_turn();
    }
    state.ball = Ball::Carried(PlayerId(9));
    state
}

fn bench_feature_extraction(c: &mut Criterion) {
    let state = benchmark_state();
    c.bench_function("extract_features", |b| {
        b.iter(|| extract_features(black_box(&state), Side::Home))
    });
}

fn bench_value_nets(c: &mut Criterion) {
    let state = benchmark_state();
    let features = extract_features(&state, Side::Home);
    let linear = ValueNet::Linear {
        weights: vec![0.01; FEATURE_COUNT],
    };
    let two_layer = ValueNet::TwoLayer {
        hidden_size: 32,
        w1: vec![0.01; FEATURE_COUNT * 32],
        b1: vec![0.0; 32],
        w2: vec![0.01; 32],
        b2: 0.0,
    };
    c.bench_function("value_linear", |b| {
        b.iter(|| linear.evaluate(black_box(&features)))
    });
    c.bench_function("value_two_layer", |b| {
        b.iter(|| two_layer.evaluate(black_box(&features)))
    });
    c.bench_function("heuristic_score", |b| {
        b.iter(|| heuristic_score(black_box(&state), Side::Home))
    });
}

fn bench_policy_priors(c: &mut Criterion) {
    let policy = PolicyNet {
        weights: vec![0.01; PolicyNet::INPUT_WIDTH],
        bias: 0.0,
        temperature: 1.0,
    };
    let logits: Vec<f32> = (0..64).map(|i| (i as f32) * 0.1).collect();
    c.bench_function("policy_priors_64", |b| {
        b.iter(|| policy.priors(black_box(&logits)))
    });
}

fn bench_action_enumeration(c: &mut Criterion) {
    let state = benchmark_state();
    c.bench_function("available_actions_full_board", |b| {
        b.iter(|| rules::available_actions(black_box(&state)))
    });
}

criterion_group!(
    benches,
    bench_feature_extraction,
    bench_value_nets,
    bench_policy_priors,
    bench_action_enumeration
);
criterion_main!(benches);
