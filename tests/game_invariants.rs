//! Cross-game invariants over random seeded playouts.

use lobby::{Dispatcher, GameConfig, GameWrapper, MoveWrapper, Player, SessionConfig, StrategyConfig};
use proptest::prelude::*;

fn start(id: &str, seed: u64) -> GameWrapper {
    let config = SessionConfig {
        game: GameConfig::seeded(seed),
        ..SessionConfig::default()
    };
    Dispatcher::default()
        .start(id, &config)
        .unwrap()
        .initial_state()
        .clone()
}

/// Walks `picks.len()` plies picking moves by index, checking each step.
fn walk(id: &str, seed: u64, picks: &[usize]) -> Vec<MoveWrapper> {
    let initial = start(id, seed);
    let mut state = initial.clone();
    let mut played = Vec::new();
    for &pick in picks {
        let outcome = state.outcome();
        assert_eq!(outcome, state.outcome(), "{}: outcome not stable", id);
        let moves = state.legal_moves();
        assert_eq!(outcome.is_terminal(), moves.is_empty(), "{}: terminal/moves disagree at {:?}", id, played);
        if moves.is_empty() {
            break;
        }
        let mv = moves[pick % moves.len()].clone();
        assert!(state.is_legal(&mv));
        let next = state
            .apply(&mv)
            .unwrap_or_else(|e| panic!("{}: listed move {} refused: {}", id, mv, e));
        assert_ne!(next, initial, "{}: back to the starting position", id);
        state = next;
        played.push(mv);
    }
    played
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(4))]

    #[test]
    fn random_playouts_respect_the_contract(
        seed in 0u64..1_000,
        picks in proptest::collection::vec(any::<usize>(), 1..24),
    ) {
        for (id, _) in Dispatcher::default().games() {
            walk(id, seed, &picks);
        }
    }

    #[test]
    fn same_seed_same_start(seed in any::<u64>()) {
        for (id, _) in Dispatcher::default().games() {
            prop_assert_eq!(start(id, seed), start(id, seed));
        }
    }
}

#[test]
fn short_games_reach_an_end() {
    let dispatcher = Dispatcher::default();
    for id in ["tic-tac-toe", "connect-four", "othello", "dots-and-boxes", "mancala", "lights-out"] {
        for seed in 0..3u64 {
            let picks: Vec<usize> = (0..400).map(|i| (i * 7 + seed as usize * 13) % 101).collect();
            let played = walk(id, seed, &picks);
            let mut session = dispatcher
                .start(id, &SessionConfig { game: GameConfig::seeded(seed), ..SessionConfig::default() })
                .unwrap();
            for mv in played {
                session.play(mv).unwrap();
            }
            assert!(session.state().is_terminal(), "{} seed {} still running", id, seed);
            assert_eq!(&session.replay().unwrap(), session.state());
        }
    }
}

#[test]
fn computer_play_is_reproducible() {
    let dispatcher = Dispatcher::default();
    let strategy = StrategyConfig {
        depth: Some(1),
        iterations: Some(40),
        max_nodes: 5_000,
        ..StrategyConfig::default()
    }
    .with_seed(9);
    let config = SessionConfig {
        game: GameConfig::seeded(21),
        cpu_seats: vec![Player::First, Player::Second, Player::Solo],
    };
    for (id, _) in dispatcher.games() {
        let mut traces = Vec::new();
        for _ in 0..2 {
            let mut session = dispatcher.start(id, &config).unwrap();
            for _ in 0..3 {
                if session.state().is_terminal() {
                    break;
                }
                let (mv, state, _) = dispatcher.request_cpu_move(&mut session, &strategy).unwrap();
                assert_eq!(mv.game_id(), id);
                assert_eq!(&state, session.state());
            }
            traces.push(session.history().to_vec());
        }
        assert_eq!(traces[0], traces[1], "{} computer play differs between runs", id);
    }
}
