//! Monte Carlo Tree Search with UCB1 selection.
//!
//! Parallelism is at the root: every rayon worker grows its own tree from
//! its own seed, and the root visit counts are summed in legal-move order.
//! The chosen move therefore depends only on the state and the config, never
//! on how the workers happened to be scheduled.

use crate::config::StrategyConfig;
use crate::error::EngineError;
use crate::rng::GameRng;
use crate::search::forced_or_random;
use crate::{GameState, Outcome, Player};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::time::Instant;
use tracing::{trace, warn};

/// Tuning for one search.
#[derive(Debug, Clone)]
pub struct MctsConfig {
    /// A constant to tune the level of exploration.
    pub exploration_parameter: f64,
    /// Total simulations, split across workers.
    pub iterations: u32,
    /// Number of independent trees.
    pub workers: usize,
    /// Playouts longer than this are scored as a draw.
    pub max_playout_plies: u32,
    pub seed: u64,
}

impl MctsConfig {
    pub fn from_strategy(strategy: &StrategyConfig, default_iterations: u32) -> Self {
        Self {
            exploration_parameter: std::f64::consts::SQRT_2,
            iterations: strategy.iterations_or(default_iterations),
            workers: strategy.worker_threads(),
            max_playout_plies: 1_000,
            seed: strategy.seed,
        }
    }
}

/// A node in one worker's tree. Children are indices into the same arena.
struct Node<M> {
    /// The move that led here (None for the root).
    mv: Option<M>,
    /// Who made that move; rewards are counted from their side.
    mover: Player,
    children: Vec<usize>,
    untried: Vec<M>,
    /// Sum of rewards from the mover's perspective.
    wins: f64,
    /// Number of times this node has been visited.
    visits: u32,
}

impl<M> Node<M> {
    /// Calculates the UCB1 (Upper Confidence Bound 1) score for this node.
    /// This score balances exploration and exploitation.
    fn ucb1(&self, parent_visits: u32, exploration_parameter: f64) -> f64 {
        if self.visits == 0 {
            f64::INFINITY
        } else {
            let visits = self.visits as f64;
            self.wins / visits + exploration_parameter * ((parent_visits as f64).ln() / visits).sqrt()
        }
    }
}

fn reward(outcome: Outcome, mover: Player) -> f64 {
    match outcome {
        Outcome::Win(p) if p == mover => 1.0,
        Outcome::Win(_) => 0.0,
        _ => 0.5,
    }
}

/// Grows one tree and returns (visits, wins) per root move, aligned with `root_moves`.
fn grow_tree<G, R>(
    state: &G,
    root_moves: &[G::Move],
    config: &MctsConfig,
    iterations: u32,
    seed: u64,
    rollout: &R,
) -> Vec<(u32, f64)>
where
    G: GameState,
    R: Fn(&G, &mut GameRng) -> Option<G::Move>,
{
    let mut rng = GameRng::new(seed);
    let mut arena: Vec<Node<G::Move>> = vec![Node {
        mv: None,
        mover: state.current_player().opponent(),
        children: Vec::new(),
        untried: root_moves.to_vec(),
        wins: 0.0,
        visits: 0,
    }];

    for _ in 0..iterations {
        let mut current_state = state.clone();
        let mut path = vec![0usize];
        let mut node = 0usize;

        // --- Selection Phase ---
        while arena[node].untried.is_empty() && !arena[node].children.is_empty() {
            let parent_visits = arena[node].visits;
            let mut best = arena[node].children[0];
            let mut best_score = f64::NEG_INFINITY;
            for &child in &arena[node].children {
                let score = arena[child].ucb1(parent_visits, config.exploration_parameter);
                if score > best_score {
                    best_score = score;
                    best = child;
                }
            }
            if let Some(mv) = &arena[best].mv {
                current_state.make_move(mv);
            }
            node = best;
            path.push(node);
        }

        // --- Expansion Phase ---
        if !arena[node].untried.is_empty() && !current_state.is_terminal() {
            let pick = rng.gen_range(0..arena[node].untried.len());
            let mv = arena[node].untried.swap_remove(pick);
            let mover = current_state.current_player();
            current_state.make_move(&mv);
            let untried = current_state.legal_moves();
            arena.push(Node {
                mv: Some(mv),
                mover,
                children: Vec::new(),
                untried,
                wins: 0.0,
                visits: 0,
            });
            let child = arena.len() - 1;
            arena[node].children.push(child);
            node = child;
            path.push(node);
        }

        // --- Simulation Phase ---
        let mut plies = 0;
        while !current_state.is_terminal() && plies < config.max_playout_plies {
            match rollout(&current_state, &mut rng) {
                Some(mv) => current_state.make_move(&mv),
                None => break,
            }
            plies += 1;
        }
        let outcome = current_state.outcome();

        // --- Backpropagation Phase ---
        for &n in path.iter().rev() {
            arena[n].visits += 1;
            arena[n].wins += reward(outcome, arena[n].mover);
        }
    }

    let mut stats = vec![(0u32, 0.0f64); root_moves.len()];
    for &child in &arena[0].children {
        if let Some(mv) = &arena[child].mv {
            if let Some(i) = root_moves.iter().position(|m| m == mv) {
                stats[i] = (arena[child].visits, arena[child].wins);
            }
        }
    }
    stats
}

/// Runs the search and returns the most visited root move.
pub fn search<G, R>(state: &G, config: &MctsConfig, rollout: R) -> Option<G::Move>
where
    G: GameState,
    R: Fn(&G, &mut GameRng) -> Option<G::Move> + Sync,
{
    let root_moves = state.legal_moves();
    if root_moves.len() <= 1 {
        return root_moves.into_iter().next();
    }

    let started = Instant::now();
    let workers = config.workers.max(1);
    let per_worker = (config.iterations / workers as u32).max(1);
    let run = |w: usize| {
        let seed = config.seed ^ (w as u64).wrapping_mul(0x2545_F491_4F6C_DD1D);
        grow_tree(state, &root_moves, config, per_worker, seed, &rollout)
    };

    let per_tree: Vec<Vec<(u32, f64)>> = if workers == 1 {
        vec![run(0)]
    } else {
        match ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(|| (0..workers).into_par_iter().map(run).collect()),
            Err(err) => {
                warn!(%err, "could not build search thread pool; searching on the caller thread");
                (0..workers).map(run).collect()
            }
        }
    };

    let mut totals = vec![(0u64, 0.0f64); root_moves.len()];
    for tree in &per_tree {
        for (i, (visits, wins)) in tree.iter().enumerate() {
            totals[i].0 += u64::from(*visits);
            totals[i].1 += wins;
        }
    }

    // After all simulations, the best move is the one most visited.
    let mut best = 0;
    for (i, total) in totals.iter().enumerate() {
        if total.0 > totals[best].0 {
            best = i;
        }
    }
    trace!(
        workers,
        iterations = per_worker as u64 * workers as u64,
        visits = totals[best].0,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "mcts search finished"
    );
    root_moves.into_iter().nth(best)
}

/// Uniformly random playout policy.
pub fn uniform_rollout<G: GameState>(state: &G, rng: &mut GameRng) -> Option<G::Move> {
    let moves = state.legal_moves();
    rng.choose(&moves).cloned()
}

/// Full opponent move using MCTS and a custom playout policy.
pub fn choose<G, R>(
    state: &G,
    strategy: &StrategyConfig,
    default_iterations: u32,
    rollout: R,
) -> Result<G::Move, EngineError>
where
    G: GameState,
    R: Fn(&G, &mut GameRng) -> Option<G::Move> + Sync,
{
    let mut rng = GameRng::new(strategy.seed);
    if let Some(mv) = forced_or_random(state, strategy, &mut rng)? {
        return Ok(mv);
    }
    let config = MctsConfig::from_strategy(strategy, default_iterations);
    search(state, &config, rollout).ok_or(EngineError::GameOver)
}
