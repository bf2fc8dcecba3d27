//! # Connect 4 Game Implementation
//!
//! Players take turns dropping pieces into columns, trying to get 4 pieces
//! in a row (horizontally, vertically, or diagonally).
//!
//! ## Rules
//! - Players alternate dropping pieces into columns
//! - Pieces fall to the lowest available spot in the column due to gravity
//! - First player to get `line_size` pieces in a row wins
//! - Game is a draw if the board fills up with no winner

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::search::alphabeta::{self, SearchLimits};
use crate::search::forced_or_random;
use crate::rng::GameRng;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Boards this small are searched to the end.
const EXHAUSTIVE_CELLS: usize = 16;

/// Represents a move in Connect 4
///
/// Contains the column number where a player wants to drop their piece.
/// Column numbers are 0-based indices.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Connect4Move(pub usize);

/// Represents the complete state of a Connect 4 game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connect4State {
    /// The game board as a flat vector (row-major, row 0 at the top)
    board: Vec<Option<Player>>,
    current_player: Player,
    width: usize,
    height: usize,
    /// Number of pieces needed in a row to win
    line_size: usize,
    /// Last move made, if any (row, column)
    last_move: Option<(usize, usize)>,
}

impl fmt::Display for Connect4State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.height {
            for c in 0..self.width {
                let symbol = match self.board[r * self.width + c] {
                    Some(Player::First) => "X",
                    Some(_) => "O",
                    None => ".",
                };
                write!(f, "{} ", symbol)?;
            }
            writeln!(f)?;
        }
        for c in 0..self.width {
            write!(f, "{} ", c % 10)?;
        }
        writeln!(f)
    }
}

impl Connect4State {
    /// Creates a new Connect 4 game with the specified configuration
    pub fn new(width: usize, height: usize, line_size: usize) -> Result<Self, EngineError> {
        if !(1..=20).contains(&width) || !(1..=20).contains(&height) {
            return Err(EngineError::config("connect four board must be 1..=20 in each direction"));
        }
        if line_size < 2 || line_size > width.max(height) {
            return Err(EngineError::config("line size does not fit on the board"));
        }
        Ok(Self {
            board: vec![None; width * height],
            current_player: Player::First,
            width,
            height,
            line_size,
            last_move: None,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Piece at (row, col), row 0 being the top.
    pub fn cell(&self, row: usize, col: usize) -> Option<Player> {
        self.board[row * self.width + col]
    }

    fn winner(&self) -> Option<Player> {
        let (r, c) = self.last_move?;
        let player = self.cell(r, c)?;
        let run = grid_lines::longest_run_through(&self.board, self.width, self.height, r, c, Some(player));
        (run >= self.line_size).then_some(player)
    }

    /// Window heuristic: every open line scores by how full it is.
    fn evaluate(&self, me: Player) -> i32 {
        let mut score = 0i32;
        grid_lines::for_each_window(self.width, self.height, self.line_size, |window| {
            let mut mine = 0;
            let mut theirs = 0;
            for &idx in window {
                match self.board[idx] {
                    Some(p) if p == me => mine += 1,
                    Some(_) => theirs += 1,
                    None => {}
                }
            }
            if theirs == 0 && mine > 0 {
                score += 4i32.pow(mine as u32);
            } else if mine == 0 && theirs > 0 {
                score -= 4i32.pow(theirs as u32);
            }
        });
        // Centre columns take part in more lines.
        let centre = self.width / 2;
        for r in 0..self.height {
            match self.cell(r, centre) {
                Some(p) if p == me => score += 3,
                Some(_) => score -= 3,
                None => {}
            }
        }
        score
    }
}

impl GameState for Connect4State {
    type Move = Connect4Move; // Column to drop a piece

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        Self::new(
            config.width.unwrap_or(7),
            config.height.unwrap_or(6),
            config.line_size.unwrap_or(4),
        )
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.winner().is_some() {
            return Vec::new();
        }
        (0..self.width)
            .filter(|&c| self.board[c].is_none())
            .map(Connect4Move)
            .collect()
    }

    fn make_move(&mut self, mv: &Self::Move) {
        for r in (0..self.height).rev() {
            let idx = r * self.width + mv.0;
            if self.board[idx].is_none() {
                self.board[idx] = Some(self.current_player);
                self.last_move = Some((r, mv.0));
                self.current_player = self.current_player.opponent();
                return;
            }
        }
    }

    fn outcome(&self) -> Outcome {
        if let Some(p) = self.winner() {
            Outcome::Win(p)
        } else if self.board[..self.width].iter().all(Option::is_some) {
            Outcome::Draw
        } else {
            Outcome::InProgress
        }
    }

    fn current_player(&self) -> Player {
        self.current_player
    }

    fn is_legal(&self, mv: &Connect4Move) -> bool {
        mv.0 < self.width && self.board[mv.0].is_none() && self.winner().is_none()
    }
}

impl Opponent for Connect4State {
    fn select_move(&self, strategy: &StrategyConfig) -> Result<Connect4Move, EngineError> {
        if self.width * self.height > EXHAUSTIVE_CELLS {
            return alphabeta::choose(self, strategy, 6, |s: &Self, me| s.evaluate(me));
        }
        let mut rng = GameRng::new(strategy.seed);
        if let Some(mv) = forced_or_random(self, strategy, &mut rng)? {
            return Ok(mv);
        }
        let limits = SearchLimits::exhaustive(strategy.max_nodes);
        alphabeta::search(self, &limits, &mut rng, |s: &Self, me| s.evaluate(me))
            .best_move
            .ok_or(EngineError::GameOver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(game: &mut Connect4State, cols: &[usize]) {
        for &c in cols {
            *game = game.apply(&Connect4Move(c)).unwrap();
        }
    }

    #[test]
    fn test_new_game() {
        let game = Connect4State::initial_state(&GameConfig::default()).unwrap();
        assert_eq!(game.current_player(), Player::First);
        assert_eq!(game.height(), 6);
        assert_eq!(game.width(), 7);
        assert_eq!(game.line_size, 4);
        assert_eq!(game.legal_moves().len(), 7);
    }

    #[test]
    fn test_make_move() {
        let mut game = Connect4State::new(7, 6, 4).unwrap();
        play(&mut game, &[3]);
        assert_eq!(game.cell(5, 3), Some(Player::First));
        assert_eq!(game.current_player(), Player::Second);
        play(&mut game, &[3]);
        assert_eq!(game.cell(4, 3), Some(Player::Second));
    }

    #[test]
    fn test_win_condition_horizontal() {
        let mut game = Connect4State::new(7, 6, 4).unwrap();
        play(&mut game, &[0, 0, 1, 1, 2, 2, 3]);
        assert_eq!(game.outcome(), Outcome::Win(Player::First));
        assert!(game.legal_moves().is_empty());
        assert_eq!(game.apply(&Connect4Move(4)), Err(EngineError::GameOver));
    }

    #[test]
    fn test_win_condition_diagonal() {
        let mut game = Connect4State::new(7, 6, 4).unwrap();
        play(&mut game, &[0, 1, 1, 2, 2, 3, 2, 3, 3, 0, 3]);
        assert_eq!(game.outcome(), Outcome::Win(Player::First));
    }

    #[test]
    fn full_column_is_rejected() {
        let mut game = Connect4State::new(7, 6, 4).unwrap();
        play(&mut game, &[0, 0, 0, 0, 0, 0]);
        assert!(matches!(game.apply(&Connect4Move(0)), Err(EngineError::IllegalMove(_))));
        assert!(matches!(game.apply(&Connect4Move(9)), Err(EngineError::IllegalMove(_))));
    }

    #[test]
    fn cpu_completes_four() {
        let mut game = Connect4State::new(7, 6, 4).unwrap();
        play(&mut game, &[0, 6, 1, 6, 2]);
        // Second must block at column 3.
        let mv = game.select_move(&StrategyConfig::default().with_depth(4)).unwrap();
        assert_eq!(mv, Connect4Move(3));
        play(&mut game, &[5]);
        let mv = game.select_move(&StrategyConfig::default().with_depth(2)).unwrap();
        assert_eq!(mv, Connect4Move(3));
    }

    #[test]
    fn tiny_board_is_solved_exhaustively() {
        let game = Connect4State::new(4, 4, 3).unwrap();
        let mv = game.select_move(&StrategyConfig::default()).unwrap();
        assert!(game.is_legal(&mv));
    }
}
