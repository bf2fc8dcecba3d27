//! # Gomoku (Five in a Row)
//!
//! Freestyle rules: any run of `line_size` or more wins, a full board draws.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::search::alphabeta;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct GomokuMove(pub usize, pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GomokuState {
    board: Vec<Option<Player>>,
    current_player: Player,
    board_size: usize,
    line_size: usize,
    last_move: Option<(usize, usize)>,
    stones: usize,
}

impl GomokuState {
    pub fn new(board_size: usize, line_size: usize) -> Result<Self, EngineError> {
        if !(5..=25).contains(&board_size) {
            return Err(EngineError::config("gomoku board size must be 5..=25"));
        }
        if !(3..=board_size).contains(&line_size) {
            return Err(EngineError::config("gomoku line size must be 3..=board size"));
        }
        Ok(GomokuState {
            board: vec![None; board_size * board_size],
            current_player: Player::First,
            board_size,
            line_size,
            last_move: None,
            stones: 0,
        })
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Player> {
        self.board[row * self.board_size + col]
    }

    fn winner(&self) -> Option<Player> {
        // Only the last stone can have completed a line.
        let (r, c) = self.last_move?;
        let player = self.cell(r, c)?;
        let n = self.board_size;
        let run = grid_lines::longest_run_through(&self.board, n, n, r, c, Some(player));
        (run >= self.line_size).then_some(player)
    }

    /// Empty cells within two steps of a stone; the centre on an empty board.
    fn candidate_moves(&self) -> Vec<GomokuMove> {
        let n = self.board_size;
        if self.stones == 0 {
            return vec![GomokuMove(n / 2, n / 2)];
        }
        let mut near = vec![false; n * n];
        for r in 0..n {
            for c in 0..n {
                if self.board[r * n + c].is_none() {
                    continue;
                }
                for nr in r.saturating_sub(2)..=(r + 2).min(n - 1) {
                    for nc in c.saturating_sub(2)..=(c + 2).min(n - 1) {
                        near[nr * n + nc] = true;
                    }
                }
            }
        }
        (0..n * n)
            .filter(|&i| near[i] && self.board[i].is_none())
            .map(|i| GomokuMove(i / n, i % n))
            .collect()
    }

    /// Scores every window of `line_size` cells by how far each side got in it.
    fn evaluate(&self, me: Player) -> i32 {
        let n = self.board_size;
        let mut score = 0i64;
        grid_lines::for_each_window(n, n, self.line_size, |window| {
            let mut mine = 0u32;
            let mut theirs = 0u32;
            for &idx in window {
                match self.board[idx] {
                    Some(p) if p == me => mine += 1,
                    Some(_) => theirs += 1,
                    None => {}
                }
            }
            if theirs == 0 && mine > 0 {
                score += 10i64.pow(mine);
            } else if mine == 0 && theirs > 0 {
                // Threats against us weigh a little more: the opponent may move next.
                score -= 12 * 10i64.pow(theirs) / 10;
            }
        });
        score.clamp(i32::MIN as i64 / 4, i32::MAX as i64 / 4) as i32
    }
}

impl fmt::Display for GomokuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.board_size;
        for r in 0..n {
            for c in 0..n {
                let symbol = match self.cell(r, c) {
                    Some(Player::First) => 'X',
                    Some(_) => 'O',
                    None => '.',
                };
                write!(f, "{} ", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl GameState for GomokuState {
    type Move = GomokuMove;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        Self::new(config.board_size.unwrap_or(15), config.line_size.unwrap_or(5))
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.winner().is_some() {
            return Vec::new();
        }
        let n = self.board_size;
        (0..n * n)
            .filter(|&i| self.board[i].is_none())
            .map(|i| GomokuMove(i / n, i % n))
            .collect()
    }

    fn make_move(&mut self, mv: &Self::Move) {
        self.board[mv.0 * self.board_size + mv.1] = Some(self.current_player);
        self.last_move = Some((mv.0, mv.1));
        self.stones += 1;
        self.current_player = self.current_player.opponent();
    }

    fn outcome(&self) -> Outcome {
        match self.winner() {
            Some(p) => Outcome::Win(p),
            None if self.stones == self.board.len() => Outcome::Draw,
            None => Outcome::InProgress,
        }
    }

    fn current_player(&self) -> Player {
        self.current_player
    }

    fn is_legal(&self, mv: &GomokuMove) -> bool {
        mv.0 < self.board_size
            && mv.1 < self.board_size
            && self.cell(mv.0, mv.1).is_none()
            && self.winner().is_none()
    }
}

impl Opponent for GomokuState {
    fn select_move(&self, strategy: &StrategyConfig) -> Result<GomokuMove, EngineError> {
        alphabeta::choose_with(
            self,
            strategy,
            2,
            |s: &Self| s.candidate_moves(),
            |s: &Self, me| s.evaluate(me),
        )
    }
}
