//! # Lights Out
//!
//! Pressing a cell toggles it and its orthogonal neighbours; the puzzle is
//! solved when every light is off. Starts are made by pressing a random set
//! of cells on a dark board, so each one is solvable.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::rng::GameRng;
use crate::search::forced_or_random;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Press(pub usize, pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightsOutState {
    size: usize,
    lights: Vec<bool>,
    presses: u32,
    max_plies: u32,
}

impl LightsOutState {
    pub fn new(size: usize, seed: u64, max_plies: u32) -> Result<Self, EngineError> {
        if !(2..=10).contains(&size) {
            return Err(EngineError::config("lights out size must be 2..=10"));
        }
        let mut state = Self {
            size,
            lights: vec![false; size * size],
            presses: 0,
            max_plies,
        };
        let mut rng = GameRng::new(seed);
        while state.lights.iter().all(|&on| !on) {
            for idx in 0..size * size {
                if rng.gen_bool(0.5) {
                    state.toggle(idx / size, idx % size);
                }
            }
        }
        Ok(state)
    }

    pub fn is_lit(&self, row: usize, col: usize) -> bool {
        self.lights[row * self.size + col]
    }

    pub fn lit_count(&self) -> usize {
        self.lights.iter().filter(|&&on| on).count()
    }

    fn toggle(&mut self, row: usize, col: usize) {
        let n = self.size;
        let mut flip = |r: usize, c: usize| self.lights[r * n + c] ^= true;
        flip(row, col);
        if row > 0 {
            flip(row - 1, col);
        }
        if row + 1 < n {
            flip(row + 1, col);
        }
        if col > 0 {
            flip(row, col - 1);
        }
        if col + 1 < n {
            flip(row, col + 1);
        }
    }

    /// Cells to press to turn every light off, by Gaussian elimination over GF(2).
    /// Free variables are left unpressed.
    pub fn solve(&self) -> Option<Vec<Press>> {
        let n = self.size;
        let cells = n * n;
        let rhs_bit = 1u128 << cells;
        // Row i: which presses toggle cell i, plus whether cell i is lit.
        let mut rows: Vec<u128> = (0..cells)
            .map(|i| {
                let (r, c) = (i / n, i % n);
                let mut row = 1u128 << i;
                if r > 0 {
                    row |= 1 << (i - n);
                }
                if r + 1 < n {
                    row |= 1 << (i + n);
                }
                if c > 0 {
                    row |= 1 << (i - 1);
                }
                if c + 1 < n {
                    row |= 1 << (i + 1);
                }
                if self.lights[i] {
                    row |= rhs_bit;
                }
                row
            })
            .collect();

        let mut pivots = Vec::with_capacity(cells);
        let mut rank = 0;
        for col in 0..cells {
            let bit = 1u128 << col;
            let Some(found) = (rank..cells).find(|&r| rows[r] & bit != 0) else {
                continue;
            };
            rows.swap(rank, found);
            for r in 0..cells {
                if r != rank && rows[r] & bit != 0 {
                    rows[r] ^= rows[rank];
                }
            }
            pivots.push(col);
            rank += 1;
        }
        if rows[rank..].iter().any(|&row| row & rhs_bit != 0) {
            return None;
        }
        let mut presses: Vec<Press> = pivots
            .iter()
            .enumerate()
            .filter(|&(r, _)| rows[r] & rhs_bit != 0)
            .map(|(_, &col)| Press(col / n, col % n))
            .collect();
        presses.sort_unstable_by_key(|p| (p.0, p.1));
        Some(presses)
    }
}

impl fmt::Display for LightsOutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.lights.chunks(self.size) {
            let line: String = row.iter().map(|&on| if on { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl GameState for LightsOutState {
    type Move = Press;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        let size = config.size_in(5, 2..=10)?;
        Self::new(size, config.seed, config.ply_limit((size * size * 8) as u32)?)
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.is_terminal() {
            return Vec::new();
        }
        let n = self.size;
        (0..n * n).map(|i| Press(i / n, i % n)).collect()
    }

    fn make_move(&mut self, mv: &Self::Move) {
        self.toggle(mv.0, mv.1);
        self.presses += 1;
    }

    fn outcome(&self) -> Outcome {
        if self.lit_count() == 0 {
            Outcome::Win(Player::Solo)
        } else if self.presses >= self.max_plies {
            Outcome::Stalemate
        } else {
            Outcome::InProgress
        }
    }

    fn current_player(&self) -> Player {
        Player::Solo
    }

    fn is_legal(&self, mv: &Press) -> bool {
        mv.0 < self.size && mv.1 < self.size && !self.is_terminal()
    }
}

impl Opponent for LightsOutState {
    fn select_move(&self, strategy: &StrategyConfig) -> Result<Press, EngineError> {
        let mut rng = GameRng::new(strategy.seed);
        if let Some(mv) = forced_or_random(self, strategy, &mut rng)? {
            return Ok(mv);
        }
        self.solve()
            .and_then(|presses| presses.into_iter().next())
            .ok_or_else(|| EngineError::config("lights out position has no solution"))
    }
}
