//! # Dots and Boxes
//!
//! An n×n grid of boxes. Players take turns drawing one line; completing a
//! box scores it and the same player moves again. Most boxes wins.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::rng::GameRng;
use crate::search::forced_or_random;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A line between two adjacent dots. `Horizontal(r, c)` runs from dot
/// (r, c) to (r, c + 1); `Vertical(r, c)` from (r, c) to (r + 1, c).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum DotsMove {
    Horizontal(usize, usize),
    Vertical(usize, usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DotsState {
    /// Boxes per side.
    size: usize,
    horizontal: Vec<bool>,
    vertical: Vec<bool>,
    owners: Vec<Option<Player>>,
    current_player: Player,
}

impl DotsState {
    pub fn new(size: usize) -> Result<Self, EngineError> {
        if !(1..=10).contains(&size) {
            return Err(EngineError::config("dots and boxes size must be 1..=10"));
        }
        Ok(Self {
            size,
            horizontal: vec![false; (size + 1) * size],
            vertical: vec![false; size * (size + 1)],
            owners: vec![None; size * size],
            current_player: Player::First,
        })
    }

    pub fn score(&self, player: Player) -> usize {
        self.owners.iter().filter(|&&o| o == Some(player)).count()
    }

    fn drawn(&self, mv: DotsMove) -> bool {
        let n = self.size;
        match mv {
            DotsMove::Horizontal(r, c) => self.horizontal[r * n + c],
            DotsMove::Vertical(r, c) => self.vertical[r * (n + 1) + c],
        }
    }

    fn sides_drawn(&self, r: usize, c: usize) -> usize {
        let n = self.size;
        [
            self.horizontal[r * n + c],
            self.horizontal[(r + 1) * n + c],
            self.vertical[r * (n + 1) + c],
            self.vertical[r * (n + 1) + c + 1],
        ]
        .iter()
        .filter(|&&d| d)
        .count()
    }

    /// Boxes on either side of a line.
    fn boxes_touching(&self, mv: DotsMove) -> Vec<(usize, usize)> {
        let n = self.size;
        let mut out = Vec::with_capacity(2);
        match mv {
            DotsMove::Horizontal(r, c) => {
                if r > 0 {
                    out.push((r - 1, c));
                }
                if r < n {
                    out.push((r, c));
                }
            }
            DotsMove::Vertical(r, c) => {
                if c > 0 {
                    out.push((r, c - 1));
                }
                if c < n {
                    out.push((r, c));
                }
            }
        }
        out
    }

    /// Boxes the line would complete.
    fn completes(&self, mv: DotsMove) -> usize {
        self.boxes_touching(mv)
            .into_iter()
            .filter(|&(r, c)| self.sides_drawn(r, c) == 3)
            .count()
    }

    /// True if the line gives some box its third side.
    fn opens_box(&self, mv: DotsMove) -> bool {
        self.boxes_touching(mv)
            .into_iter()
            .any(|(r, c)| self.sides_drawn(r, c) == 2)
    }

    /// Boxes the opponent collects if they keep taking completions after `mv`.
    fn boxes_conceded(&self, mv: DotsMove) -> usize {
        let mut state = self.clone();
        state.make_move(&mv);
        let taker = state.current_player;
        let before = state.score(taker);
        while state.current_player == taker {
            let Some(next) = state.legal_moves().into_iter().find(|m| state.completes(*m) > 0) else {
                break;
            };
            state.make_move(&next);
        }
        state.score(taker) - before
    }
}

impl fmt::Display for DotsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.size;
        for r in 0..=n {
            let mut line = String::from("+");
            for c in 0..n {
                line.push_str(if self.horizontal[r * n + c] { "---+" } else { "   +" });
            }
            writeln!(f, "{}", line)?;
            if r == n {
                break;
            }
            let mut line = String::new();
            for c in 0..=n {
                line.push(if self.vertical[r * (n + 1) + c] { '|' } else { ' ' });
                if c < n {
                    line.push_str(match self.owners[r * n + c] {
                        Some(Player::First) => " A ",
                        Some(_) => " B ",
                        None => "   ",
                    });
                }
            }
            writeln!(f, "{}", line)?;
        }
        writeln!(f, "A {}  B {}", self.score(Player::First), self.score(Player::Second))
    }
}

impl GameState for DotsState {
    type Move = DotsMove;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        Self::new(config.size_in(3, 1..=10)?)
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        let n = self.size;
        let horizontal = (0..=n)
            .flat_map(|r| (0..n).map(move |c| DotsMove::Horizontal(r, c)))
            .filter(|m| !self.drawn(*m));
        let vertical = (0..n)
            .flat_map(|r| (0..=n).map(move |c| DotsMove::Vertical(r, c)))
            .filter(|m| !self.drawn(*m));
        horizontal.chain(vertical).collect()
    }

    fn make_move(&mut self, mv: &Self::Move) {
        let n = self.size;
        match *mv {
            DotsMove::Horizontal(r, c) => self.horizontal[r * n + c] = true,
            DotsMove::Vertical(r, c) => self.vertical[r * (n + 1) + c] = true,
        }
        let mut scored = false;
        for (r, c) in self.boxes_touching(*mv) {
            if self.owners[r * n + c].is_none() && self.sides_drawn(r, c) == 4 {
                self.owners[r * n + c] = Some(self.current_player);
                scored = true;
            }
        }
        if !scored {
            self.current_player = self.current_player.opponent();
        }
    }

    fn outcome(&self) -> Outcome {
        if self.owners.iter().any(Option::is_none) {
            return Outcome::InProgress;
        }
        let (a, b) = (self.score(Player::First), self.score(Player::Second));
        match a.cmp(&b) {
            std::cmp::Ordering::Greater => Outcome::Win(Player::First),
            std::cmp::Ordering::Less => Outcome::Win(Player::Second),
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    fn current_player(&self) -> Player {
        self.current_player
    }

    fn is_legal(&self, mv: &DotsMove) -> bool {
        let n = self.size;
        let in_range = match *mv {
            DotsMove::Horizontal(r, c) => r <= n && c < n,
            DotsMove::Vertical(r, c) => r < n && c <= n,
        };
        in_range && !self.drawn(*mv)
    }
}

impl Opponent for DotsState {
    /// Greedy: take a box if one is open, otherwise play a line that hands
    /// nothing over, otherwise give away as few boxes as possible.
    fn select_move(&self, strategy: &StrategyConfig) -> Result<DotsMove, EngineError> {
        let mut rng = GameRng::new(strategy.seed);
        if let Some(mv) = forced_or_random(self, strategy, &mut rng)? {
            return Ok(mv);
        }
        let moves = self.legal_moves();
        if let Some(best) = moves.iter().copied().max_by_key(|m| self.completes(*m)).filter(|m| self.completes(*m) > 0) {
            return Ok(best);
        }
        let safe: Vec<DotsMove> = moves.iter().copied().filter(|m| !self.opens_box(*m)).collect();
        if let Some(mv) = rng.choose(&safe) {
            return Ok(*mv);
        }
        moves
            .into_iter()
            .min_by_key(|m| self.boxes_conceded(*m))
            .ok_or(EngineError::GameOver)
    }
}
