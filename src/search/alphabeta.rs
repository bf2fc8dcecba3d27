//! Iterative deepening minimax with alpha-beta pruning.
//!
//! Scores are always from the root player's point of view, and each node
//! maximizes or minimizes depending on who is to move there. That keeps
//! games with extra turns (mancala, dots and boxes) correct without the
//! strict alternation negamax assumes.

use crate::config::StrategyConfig;
use crate::error::EngineError;
use crate::rng::GameRng;
use crate::search::forced_or_random;
use crate::{GameState, Outcome, Player};
use std::time::{Duration, Instant};
use tracing::trace;

/// Score of a won position at the root; faster wins score higher.
pub const WIN_SCORE: i32 = 1_000_000;
const INF: i32 = i32::MAX - 1;
/// Static evaluations are clamped into this band so they never look like a forced result.
const EVAL_BOUND: i32 = WIN_SCORE / 2;

/// Bounds applied to one search.
#[derive(Debug, Clone)]
pub struct SearchLimits {
    pub max_depth: u8,
    pub max_nodes: u64,
    pub deadline: Option<Instant>,
}

impl SearchLimits {
    pub fn from_strategy(strategy: &StrategyConfig, default_depth: u8) -> Self {
        Self {
            max_depth: strategy.depth_or(default_depth),
            max_nodes: strategy.max_nodes.max(1),
            deadline: strategy
                .time_budget_ms
                .map(|ms| Instant::now() + Duration::from_millis(ms)),
        }
    }

    /// Search to the end of the game (bounded only by the node budget).
    pub fn exhaustive(max_nodes: u64) -> Self {
        Self {
            max_depth: u8::MAX,
            max_nodes,
            deadline: None,
        }
    }
}

/// What the search found.
#[derive(Debug, Clone)]
pub struct SearchReport<M> {
    pub best_move: Option<M>,
    pub score: i32,
    pub depth: u8,
    pub nodes: u64,
}

struct Searcher<'a, G: GameState, E, M> {
    root: Player,
    evaluate: &'a E,
    generate: &'a M,
    limits: &'a SearchLimits,
    nodes: u64,
    aborted: bool,
    horizon_hit: bool,
    _state: std::marker::PhantomData<G>,
}

impl<'a, G, E, M> Searcher<'a, G, E, M>
where
    G: GameState,
    E: Fn(&G, Player) -> i32,
    M: Fn(&G) -> Vec<G::Move>,
{
    fn out_of_budget(&self) -> bool {
        if self.nodes > self.limits.max_nodes {
            return true;
        }
        match self.limits.deadline {
            Some(deadline) if self.nodes % 1024 == 0 => Instant::now() >= deadline,
            _ => false,
        }
    }

    fn minimax(&mut self, state: &G, depth: u8, ply: i32, mut alpha: i32, mut beta: i32) -> i32 {
        self.nodes += 1;
        if self.out_of_budget() {
            self.aborted = true;
            return 0;
        }

        match state.outcome() {
            Outcome::Win(p) if p == self.root => return WIN_SCORE - ply,
            Outcome::Win(_) => return -WIN_SCORE + ply,
            Outcome::Draw | Outcome::Stalemate => return 0,
            Outcome::InProgress => {}
        }

        if depth == 0 {
            self.horizon_hit = true;
            return (self.evaluate)(state, self.root).clamp(-EVAL_BOUND, EVAL_BOUND);
        }

        let moves = (self.generate)(state);
        if moves.is_empty() {
            return (self.evaluate)(state, self.root).clamp(-EVAL_BOUND, EVAL_BOUND);
        }

        let maximizing = state.current_player() == self.root;
        let mut best = if maximizing { -INF } else { INF };
        for mv in &moves {
            let mut child = state.clone();
            child.make_move(mv);
            let score = self.minimax(&child, depth - 1, ply + 1, alpha, beta);
            if self.aborted {
                return 0;
            }
            if maximizing {
                best = best.max(score);
                alpha = alpha.max(best);
            } else {
                best = best.min(score);
                beta = beta.min(best);
            }
            if alpha >= beta {
                break;
            }
        }
        best
    }
}

/// Searches over every legal move.
pub fn search<G, E>(
    state: &G,
    limits: &SearchLimits,
    rng: &mut GameRng,
    evaluate: E,
) -> SearchReport<G::Move>
where
    G: GameState,
    E: Fn(&G, Player) -> i32,
{
    search_with(state, limits, rng, |s: &G| s.legal_moves(), evaluate)
}

/// Searches with a custom move generator.
///
/// `generate` must return a non-empty subset of `legal_moves()` for every
/// non-terminal state; it is how wide games prune candidate cells.
pub fn search_with<G, E, M>(
    state: &G,
    limits: &SearchLimits,
    rng: &mut GameRng,
    generate: M,
    evaluate: E,
) -> SearchReport<G::Move>
where
    G: GameState,
    E: Fn(&G, Player) -> i32,
    M: Fn(&G) -> Vec<G::Move>,
{
    let started = Instant::now();
    let mut moves = generate(state);
    // Shuffling the root order makes the seed decide between equal moves.
    rng.shuffle(&mut moves);

    let mut report = SearchReport {
        best_move: moves.first().cloned(),
        score: 0,
        depth: 0,
        nodes: 0,
    };
    if moves.len() <= 1 {
        return report;
    }

    let mut nodes_used = 0u64;
    for depth in 1..=limits.max_depth {
        let mut searcher = Searcher {
            root: state.current_player(),
            evaluate: &evaluate,
            generate: &generate,
            limits,
            nodes: nodes_used,
            aborted: false,
            horizon_hit: false,
            _state: std::marker::PhantomData,
        };

        let mut alpha = -INF;
        let mut best: Option<(usize, i32)> = None;
        for (i, mv) in moves.iter().enumerate() {
            let mut child = state.clone();
            child.make_move(mv);
            let score = searcher.minimax(&child, depth - 1, 1, alpha, INF);
            if searcher.aborted {
                break;
            }
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((i, score));
            }
            alpha = alpha.max(score);
        }
        nodes_used = searcher.nodes;

        if searcher.aborted {
            break;
        }
        if let Some((i, score)) = best {
            let mv = moves.remove(i);
            moves.insert(0, mv);
            report.best_move = Some(moves[0].clone());
            report.score = score;
            report.depth = depth;
        }
        if !searcher.horizon_hit || report.score.abs() >= WIN_SCORE - 1_000 {
            break;
        }
    }
    report.nodes = nodes_used;

    trace!(
        depth = report.depth,
        nodes = report.nodes,
        score = report.score,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "alpha-beta search finished"
    );
    report
}

/// Full opponent move: forced/random shortcut, then a bounded search.
pub fn choose<G, E>(
    state: &G,
    strategy: &StrategyConfig,
    default_depth: u8,
    evaluate: E,
) -> Result<G::Move, EngineError>
where
    G: GameState,
    E: Fn(&G, Player) -> i32,
{
    choose_with(state, strategy, default_depth, |s: &G| s.legal_moves(), evaluate)
}

/// Like [`choose`] with a pruned move generator.
pub fn choose_with<G, E, M>(
    state: &G,
    strategy: &StrategyConfig,
    default_depth: u8,
    generate: M,
    evaluate: E,
) -> Result<G::Move, EngineError>
where
    G: GameState,
    E: Fn(&G, Player) -> i32,
    M: Fn(&G) -> Vec<G::Move>,
{
    let mut rng = GameRng::new(strategy.seed);
    if let Some(mv) = forced_or_random(state, strategy, &mut rng)? {
        return Ok(mv);
    }
    let limits = SearchLimits::from_strategy(strategy, default_depth);
    search_with(state, &limits, &mut rng, generate, evaluate)
        .best_move
        .ok_or(EngineError::GameOver)
}
