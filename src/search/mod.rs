//! Opponent search shared by the game engines.
//!
//! - [`alphabeta`]: depth-bounded minimax with pruning and iterative deepening
//! - [`mcts`]: UCB1 Monte Carlo tree search over independent seeded trees
//!
//! Greedy and puzzle-solver opponents live next to their game.

pub mod alphabeta;
pub mod mcts;

use crate::config::StrategyConfig;
use crate::error::EngineError;
use crate::rng::GameRng;
use crate::GameState;

/// Handles the cases every opponent treats the same way.
///
/// Returns `Err(GameOver)` when there is nothing to play, `Some(move)` when
/// the choice is forced or the configured randomness fires, and `None` when
/// the caller should actually think.
pub fn forced_or_random<G: GameState>(
    state: &G,
    strategy: &StrategyConfig,
    rng: &mut GameRng,
) -> Result<Option<G::Move>, EngineError> {
    let moves = state.legal_moves();
    if moves.is_empty() {
        return Err(EngineError::GameOver);
    }
    if moves.len() == 1 {
        return Ok(moves.into_iter().next());
    }
    if strategy.randomness > 0.0 && rng.gen_bool(strategy.randomness) {
        return Ok(rng.choose(&moves).cloned());
    }
    Ok(None)
}
