//! # Tic-Tac-Toe
//!
//! n×n board, `line_size` in a row wins (3×3 / 3 by default). Small enough
//! that the computer searches every line to the end and never loses.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::rng::GameRng;
use crate::search::alphabeta::{self, SearchLimits};
use crate::search::forced_or_random;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct TicTacToeMove(pub usize, pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicTacToeState {
    board: Vec<Option<Player>>,
    size: usize,
    line_size: usize,
    current_player: Player,
    last_move: Option<(usize, usize)>,
}

impl TicTacToeState {
    pub fn new(size: usize, line_size: usize) -> Result<Self, EngineError> {
        if !(3..=5).contains(&size) || !(3..=size).contains(&line_size) {
            return Err(EngineError::config("tic-tac-toe needs 3 <= line <= size <= 5"));
        }
        Ok(Self {
            board: vec![None; size * size],
            size,
            line_size,
            current_player: Player::First,
            last_move: None,
        })
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Player> {
        self.board[row * self.size + col]
    }

    fn winner(&self) -> Option<Player> {
        let (r, c) = self.last_move?;
        let player = self.cell(r, c)?;
        let run = grid_lines::longest_run_through(&self.board, self.size, self.size, r, c, Some(player));
        (run >= self.line_size).then_some(player)
    }
}

impl fmt::Display for TicTacToeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.size {
            let row: Vec<&str> = (0..self.size)
                .map(|c| match self.cell(r, c) {
                    Some(Player::First) => "X",
                    Some(_) => "O",
                    None => " ",
                })
                .collect();
            writeln!(f, " {}", row.join(" | "))?;
            if r + 1 < self.size {
                writeln!(f, "{}", vec!["---"; self.size].join("+"))?;
            }
        }
        Ok(())
    }
}

impl GameState for TicTacToeState {
    type Move = TicTacToeMove;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        let size = config.board_size.unwrap_or(3);
        Self::new(size, config.line_size.unwrap_or(size))
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.winner().is_some() {
            return Vec::new();
        }
        let n = self.size;
        (0..n * n)
            .filter(|&i| self.board[i].is_none())
            .map(|i| TicTacToeMove(i / n, i % n))
            .collect()
    }

    fn make_move(&mut self, mv: &Self::Move) {
        self.board[mv.0 * self.size + mv.1] = Some(self.current_player);
        self.last_move = Some((mv.0, mv.1));
        self.current_player = self.current_player.opponent();
    }

    fn outcome(&self) -> Outcome {
        match self.winner() {
            Some(p) => Outcome::Win(p),
            None if self.board.iter().all(Option::is_some) => Outcome::Draw,
            None => Outcome::InProgress,
        }
    }

    fn current_player(&self) -> Player {
        self.current_player
    }
}

impl Opponent for TicTacToeState {
    fn select_move(&self, strategy: &StrategyConfig) -> Result<TicTacToeMove, EngineError> {
        let mut rng = GameRng::new(strategy.seed);
        if let Some(mv) = forced_or_random(self, strategy, &mut rng)? {
            return Ok(mv);
        }
        let limits = SearchLimits::exhaustive(strategy.max_nodes);
        alphabeta::search(self, &limits, &mut rng, |_: &Self, _| 0)
            .best_move
            .ok_or(EngineError::GameOver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_row_wins_for_first() {
        let mut game = TicTacToeState::initial_state(&GameConfig::default()).unwrap();
        for (r, c) in [(0, 0), (1, 1), (0, 1), (2, 2), (0, 2)] {
            game = game.apply(&TicTacToeMove(r, c)).unwrap();
        }
        assert_eq!(game.outcome(), Outcome::Win(Player::First));
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    fn cpu_takes_the_win_and_blocks() {
        let mut game = TicTacToeState::new(3, 3).unwrap();
        for (r, c) in [(0, 0), (1, 1), (0, 1)] {
            game = game.apply(&TicTacToeMove(r, c)).unwrap();
        }
        // Second must block at (0, 2).
        assert_eq!(game.select_move(&StrategyConfig::default()).unwrap(), TicTacToeMove(0, 2));
    }

    #[test]
    fn perfect_play_draws() {
        let mut game = TicTacToeState::new(3, 3).unwrap();
        let mut seed = 0;
        while !game.is_terminal() {
            let mv = game.select_move(&StrategyConfig::default().with_seed(seed)).unwrap();
            game = game.apply(&mv).unwrap();
            seed += 1;
        }
        assert_eq!(game.outcome(), Outcome::Draw);
    }
}
