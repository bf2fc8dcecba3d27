//! # 2048
//!
//! Tiles are stored as exponents (`1` is a 2, `11` a 2048). Each slide
//! merges equal neighbours once per move and then spawns a 2 (90%) or a 4
//! in a random empty cell; the spawn is drawn from `(seed, spawns)` so the
//! state alone determines it. Slides that change nothing are not moves.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::rng::GameRng;
use crate::search::forced_or_random;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Slide {
    Up,
    Down,
    Left,
    Right,
}

impl Slide {
    pub const ALL: [Slide; 4] = [Slide::Up, Slide::Down, Slide::Left, Slide::Right];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Twenty48State {
    size: usize,
    cells: Vec<u8>,
    score: u64,
    /// Exponent of the winning tile.
    target: u8,
    seed: u64,
    spawns: u64,
}

/// Slides one line towards index 0. Returns the points scored.
fn collapse(line: &mut [u8]) -> u64 {
    let tiles: Vec<u8> = line.iter().copied().filter(|&t| t != 0).collect();
    let mut merged = Vec::with_capacity(line.len());
    let mut gained = 0;
    let mut i = 0;
    while i < tiles.len() {
        if i + 1 < tiles.len() && tiles[i] == tiles[i + 1] {
            merged.push(tiles[i] + 1);
            gained += 1u64 << (tiles[i] + 1);
            i += 2;
        } else {
            merged.push(tiles[i]);
            i += 1;
        }
    }
    merged.resize(line.len(), 0);
    line.copy_from_slice(&merged);
    gained
}

impl Twenty48State {
    pub fn new(size: usize, target: u8, seed: u64) -> Result<Self, EngineError> {
        if !(3..=8).contains(&size) {
            return Err(EngineError::config("2048 board must be 3..=8"));
        }
        if !(3..=17).contains(&target) {
            return Err(EngineError::config("2048 target exponent must be 3..=17"));
        }
        let mut state = Self {
            size,
            cells: vec![0; size * size],
            score: 0,
            target,
            seed,
            spawns: 0,
        };
        state.spawn();
        state.spawn();
        Ok(state)
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// Tile value at (row, col), 0 when empty.
    pub fn tile(&self, row: usize, col: usize) -> u32 {
        match self.cells[row * self.size + col] {
            0 => 0,
            e => 1 << e,
        }
    }

    fn spawn(&mut self) {
        let empty: Vec<usize> = (0..self.cells.len()).filter(|&i| self.cells[i] == 0).collect();
        let mut rng = GameRng::for_stream(self.seed, self.spawns);
        self.spawns += 1;
        if let Some(&idx) = rng.choose(&empty) {
            self.cells[idx] = if rng.gen_bool(0.1) { 2 } else { 1 };
        }
    }

    /// Cell indices of each line, ordered from the edge tiles slide towards.
    fn lines(&self, slide: Slide) -> Vec<Vec<usize>> {
        let n = self.size;
        (0..n)
            .map(|k| {
                (0..n)
                    .map(|j| match slide {
                        Slide::Left => k * n + j,
                        Slide::Right => k * n + (n - 1 - j),
                        Slide::Up => j * n + k,
                        Slide::Down => (n - 1 - j) * n + k,
                    })
                    .collect()
            })
            .collect()
    }

    /// The board after the slide before spawning, or `None` if nothing moves.
    fn slid(&self, slide: Slide) -> Option<(Vec<u8>, u64)> {
        let mut cells = self.cells.clone();
        let mut gained = 0;
        for line in self.lines(slide) {
            let mut values: Vec<u8> = line.iter().map(|&i| cells[i]).collect();
            gained += collapse(&mut values);
            for (&i, v) in line.iter().zip(values) {
                cells[i] = v;
            }
        }
        (cells != self.cells).then_some((cells, gained))
    }

    fn best_exponent(&self) -> u8 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Empty space, smooth monotone rows and columns, and the largest tile in a corner.
    fn heuristic(&self, cells: &[u8]) -> f64 {
        let n = self.size;
        let empty = cells.iter().filter(|&&c| c == 0).count() as f64;
        let mut monotone = 0.0;
        let mut rough = 0.0;
        for k in 0..n {
            let row: Vec<f64> = (0..n).map(|j| f64::from(cells[k * n + j])).collect();
            let col: Vec<f64> = (0..n).map(|j| f64::from(cells[j * n + k])).collect();
            for line in [row, col] {
                let (mut up, mut down) = (0.0, 0.0);
                for w in line.windows(2) {
                    if w[0] > w[1] {
                        down += w[0] - w[1];
                    } else {
                        up += w[1] - w[0];
                    }
                    if w[0] != 0.0 && w[1] != 0.0 {
                        rough += (w[0] - w[1]).abs();
                    }
                }
                monotone -= f64::min(up, down);
            }
        }
        let max = cells.iter().copied().max().unwrap_or(0);
        let corners = [0, n - 1, n * (n - 1), n * n - 1];
        let corner = if corners.iter().any(|&i| cells[i] == max) { f64::from(max) } else { 0.0 };
        empty * 2.7 + monotone * 1.0 - rough * 0.1 + corner * 1.0
    }

    fn expect(&self, cells: &[u8], depth: u8, nodes: &mut u64, budget: u64) -> f64 {
        let empty: Vec<usize> = (0..cells.len()).filter(|&i| cells[i] == 0).collect();
        if depth == 0 || empty.is_empty() || *nodes >= budget {
            return self.heuristic(cells);
        }
        let mut total = 0.0;
        for &idx in &empty {
            for (value, weight) in [(1u8, 0.9), (2u8, 0.1)] {
                let mut next = cells.to_vec();
                next[idx] = value;
                total += weight * self.maximise(&next, depth - 1, nodes, budget);
            }
        }
        total / empty.len() as f64
    }

    fn maximise(&self, cells: &[u8], depth: u8, nodes: &mut u64, budget: u64) -> f64 {
        *nodes += 1;
        let probe = Self {
            cells: cells.to_vec(),
            ..self.clone()
        };
        let mut best = None;
        for slide in Slide::ALL {
            if let Some((after, _)) = probe.slid(slide) {
                let value = self.expect(&after, depth, nodes, budget);
                best = Some(best.map_or(value, |b: f64| b.max(value)));
            }
        }
        // No slide left: heavily penalise the dead end.
        best.unwrap_or(-1.0e6)
    }
}

impl fmt::Display for Twenty48State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "score {}", self.score)?;
        for r in 0..self.size {
            let row: Vec<String> = (0..self.size)
                .map(|c| match self.tile(r, c) {
                    0 => format!("{:>6}", "."),
                    v => format!("{:>6}", v),
                })
                .collect();
            writeln!(f, "{}", row.join(""))?;
        }
        Ok(())
    }
}

impl GameState for Twenty48State {
    type Move = Slide;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        let target = config.line_size.unwrap_or(11);
        let target = u8::try_from(target).map_err(|_| EngineError::config("2048 target exponent must be 3..=17"))?;
        Self::new(config.size_in(4, 3..=8)?, target, config.seed)
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.best_exponent() >= self.target {
            return Vec::new();
        }
        Slide::ALL.into_iter().filter(|&s| self.slid(s).is_some()).collect()
    }

    fn make_move(&mut self, mv: &Self::Move) {
        if let Some((cells, gained)) = self.slid(*mv) {
            self.cells = cells;
            self.score += gained;
            self.spawn();
        }
    }

    fn outcome(&self) -> Outcome {
        if self.best_exponent() >= self.target {
            Outcome::Win(Player::Solo)
        } else if Slide::ALL.iter().all(|&s| self.slid(s).is_none()) {
            Outcome::Stalemate
        } else {
            Outcome::InProgress
        }
    }

    fn current_player(&self) -> Player {
        Player::Solo
    }
}

impl Opponent for Twenty48State {
    /// Expectimax: the player maximises, spawns are averaged.
    fn select_move(&self, strategy: &StrategyConfig) -> Result<Slide, EngineError> {
        let mut rng = GameRng::new(strategy.seed);
        if let Some(mv) = forced_or_random(self, strategy, &mut rng)? {
            return Ok(mv);
        }
        let depth = strategy.depth_or(2);
        let mut nodes = 0;
        let mut best: Option<(f64, Slide)> = None;
        for slide in self.legal_moves() {
            let Some((after, gained)) = self.slid(slide) else { continue };
            let value = self.expect(&after, depth, &mut nodes, strategy.max_nodes) + (gained as f64).log2().max(0.0);
            if best.map_or(true, |(b, _)| value > b) {
                best = Some((value, slide));
            }
        }
        trace!(nodes, depth, "expectimax finished");
        best.map(|(_, mv)| mv).ok_or(EngineError::GameOver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(cells: Vec<u8>) -> Twenty48State {
        let size = (cells.len() as f64).sqrt() as usize;
        Twenty48State {
            size,
            cells,
            score: 0,
            target: 11,
            seed: 0,
            spawns: 0,
        }
    }

    #[test]
    fn merges_happen_once_per_tile() {
        let mut line = [1, 1, 1, 1];
        assert_eq!(collapse(&mut line), 8);
        assert_eq!(line, [2, 2, 0, 0]);
        let mut line = [1, 1, 2, 0];
        collapse(&mut line);
        assert_eq!(line, [2, 2, 0, 0]);
        let mut line = [0, 3, 0, 3];
        collapse(&mut line);
        assert_eq!(line, [4, 0, 0, 0]);
    }

    #[test]
    fn start_has_two_tiles_and_is_reproducible() {
        let game = Twenty48State::new(4, 11, 8).unwrap();
        assert_eq!(game.cells.iter().filter(|&&c| c != 0).count(), 2);
        assert_eq!(game, Twenty48State::new(4, 11, 8).unwrap());
    }

    #[test]
    fn slides_that_change_nothing_are_illegal() {
        #[rustfmt::skip]
        let game = board(vec![
            1, 0, 0, 0,
            2, 0, 0, 0,
            0, 0, 0, 0,
            0, 0, 0, 0,
        ]);
        let moves = game.legal_moves();
        assert!(!moves.contains(&Slide::Left));
        assert!(!moves.contains(&Slide::Up));
        assert!(moves.contains(&Slide::Right));
        assert!(moves.contains(&Slide::Down));
        assert!(matches!(game.apply(&Slide::Left), Err(EngineError::IllegalMove(_))));
    }

    #[test]
    fn slide_scores_and_spawns() {
        #[rustfmt::skip]
        let game = board(vec![
            1, 1, 0, 0,
            0, 0, 0, 0,
            0, 0, 0, 0,
            0, 0, 0, 0,
        ]);
        let next = game.apply(&Slide::Left).unwrap();
        assert_eq!(next.tile(0, 0), 4);
        assert_eq!(next.score(), 4);
        assert_eq!(next.cells.iter().filter(|&&c| c != 0).count(), 2);
        assert_eq!(next, game.apply(&Slide::Left).unwrap());
    }

    #[test]
    fn reaching_the_target_wins() {
        #[rustfmt::skip]
        let mut game = board(vec![
            10, 10, 0,
            0, 0, 0,
            0, 0, 0,
        ]);
        game.target = 11;
        let next = game.apply(&Slide::Left).unwrap();
        assert_eq!(next.outcome(), Outcome::Win(Player::Solo));
        assert!(next.legal_moves().is_empty());
    }

    #[test]
    fn jammed_grid_is_a_stalemate() {
        #[rustfmt::skip]
        let game = board(vec![
            1, 2, 1,
            2, 1, 2,
            1, 2, 1,
        ]);
        assert_eq!(game.outcome(), Outcome::Stalemate);
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    fn cpu_move_is_legal_and_repeatable() {
        let game = Twenty48State::new(4, 11, 21).unwrap();
        let strategy = StrategyConfig::default();
        let mv = game.select_move(&strategy).unwrap();
        assert!(game.is_legal(&mv));
        assert_eq!(mv, game.select_move(&strategy).unwrap());
    }
}
