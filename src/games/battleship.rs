//! # Battleship
//!
//! Each side hides a fleet of five ships (5, 4, 3, 3, 2) on its own 10×10
//! grid, dealt by a seeded generator. Players alternate single shots at the
//! other grid; a ship sinks when every cell is hit and is announced as such.
//! Sinking the whole enemy fleet wins.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::rng::GameRng;
use crate::search::forced_or_random;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

const FLEET: [usize; 5] = [5, 4, 3, 3, 2];

/// A shot at (row, col) of the opponent's grid.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Shot(pub usize, pub usize);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Mark {
    Miss,
    Hit,
    /// Hit on a ship that has been sunk.
    Sunk,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waters {
    ships: Vec<Vec<usize>>,
    /// Shots received so far.
    marks: Vec<Option<Mark>>,
}

impl Waters {
    fn deal(size: usize, rng: &mut GameRng) -> Result<Self, EngineError> {
        let mut occupied = vec![false; size * size];
        let mut ships = Vec::with_capacity(FLEET.len());
        for &len in &FLEET {
            let mut placed = false;
            for _ in 0..10_000 {
                let horizontal = rng.gen_bool(0.5);
                let (rows, cols) = if horizontal { (size, size - len + 1) } else { (size - len + 1, size) };
                let (r, c) = (rng.gen_range(0..rows), rng.gen_range(0..cols));
                let cells: Vec<usize> = (0..len)
                    .map(|i| if horizontal { r * size + c + i } else { (r + i) * size + c })
                    .collect();
                if cells.iter().all(|&i| !occupied[i]) {
                    cells.iter().for_each(|&i| occupied[i] = true);
                    ships.push(cells);
                    placed = true;
                    break;
                }
            }
            if !placed {
                return Err(EngineError::config("could not fit the fleet on the board"));
            }
        }
        Ok(Self {
            ships,
            marks: vec![None; size * size],
        })
    }

    fn all_sunk(&self) -> bool {
        self.ships.iter().flatten().all(|&i| self.marks[i].is_some())
    }

    fn receive(&mut self, idx: usize) {
        let Some(ship) = self.ships.iter().find(|s| s.contains(&idx)) else {
            self.marks[idx] = Some(Mark::Miss);
            return;
        };
        self.marks[idx] = Some(Mark::Hit);
        if ship.iter().all(|&i| self.marks[i].is_some()) {
            for &i in ship {
                self.marks[i] = Some(Mark::Sunk);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleshipState {
    size: usize,
    /// Indexed by owner.
    waters: [Waters; 2],
    current_player: Player,
}

impl BattleshipState {
    pub fn new(size: usize, seed: u64) -> Result<Self, EngineError> {
        if !(6..=16).contains(&size) {
            return Err(EngineError::config("battleship grid must be 6..=16"));
        }
        let first = Waters::deal(size, &mut GameRng::for_stream(seed, 0))?;
        let second = Waters::deal(size, &mut GameRng::for_stream(seed, 1))?;
        Ok(Self {
            size,
            waters: [first, second],
            current_player: Player::First,
        })
    }

    /// What `shooter` knows about the cell of the enemy grid.
    pub fn mark(&self, shooter: Player, row: usize, col: usize) -> Option<Mark> {
        self.waters[shooter.opponent().index()].marks[row * self.size + col]
    }

    fn target_marks(&self) -> &[Option<Mark>] {
        &self.waters[self.current_player.opponent().index()].marks
    }

    /// Unknown cells next to unresolved hits, lined up with neighbouring hits first.
    fn target_cells(&self) -> Vec<usize> {
        let n = self.size;
        let marks = self.target_marks();
        let unknown_at = |r: i32, c: i32| -> Option<usize> {
            ((0..n as i32).contains(&r) && (0..n as i32).contains(&c))
                .then(|| (r as usize) * n + c as usize)
                .filter(|&i| marks[i].is_none())
        };
        let hit_at = |r: i32, c: i32| {
            (0..n as i32).contains(&r) && (0..n as i32).contains(&c) && marks[r as usize * n + c as usize] == Some(Mark::Hit)
        };
        let mut aligned = Vec::new();
        let mut adjacent = Vec::new();
        for idx in (0..n * n).filter(|&i| marks[i] == Some(Mark::Hit)) {
            let (r, c) = ((idx / n) as i32, (idx % n) as i32);
            for (dr, dc) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                if let Some(cell) = unknown_at(r + dr, c + dc) {
                    // Extends a line of hits through this one.
                    if hit_at(r - dr, c - dc) {
                        aligned.push(cell);
                    } else {
                        adjacent.push(cell);
                    }
                }
            }
        }
        if aligned.is_empty() {
            adjacent
        } else {
            aligned
        }
    }
}

impl fmt::Display for BattleshipState {
    /// First's view: own fleet on the left, shots at Second on the right.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.size;
        let own = &self.waters[0];
        let enemy = &self.waters[1];
        for r in 0..n {
            let mut left = String::new();
            let mut right = String::new();
            for c in 0..n {
                let i = r * n + c;
                let ship = own.ships.iter().any(|s| s.contains(&i));
                left.push(match (own.marks[i], ship) {
                    (Some(Mark::Miss), _) => 'o',
                    (Some(_), _) => 'X',
                    (None, true) => '#',
                    (None, false) => '.',
                });
                right.push(match enemy.marks[i] {
                    Some(Mark::Miss) => 'o',
                    Some(Mark::Hit) => 'x',
                    Some(Mark::Sunk) => 'X',
                    None => '.',
                });
            }
            writeln!(f, "{}   {}", left, right)?;
        }
        Ok(())
    }
}

impl GameState for BattleshipState {
    type Move = Shot;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        Self::new(config.size_in(10, 6..=16)?, config.seed)
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.is_terminal() {
            return Vec::new();
        }
        let n = self.size;
        let marks = self.target_marks();
        (0..n * n)
            .filter(|&i| marks[i].is_none())
            .map(|i| Shot(i / n, i % n))
            .collect()
    }

    fn make_move(&mut self, mv: &Self::Move) {
        let target = self.current_player.opponent().index();
        self.waters[target].receive(mv.0 * self.size + mv.1);
        self.current_player = self.current_player.opponent();
    }

    fn outcome(&self) -> Outcome {
        for player in [Player::First, Player::Second] {
            if self.waters[player.opponent().index()].all_sunk() {
                return Outcome::Win(player);
            }
        }
        Outcome::InProgress
    }

    fn current_player(&self) -> Player {
        self.current_player
    }

    fn is_legal(&self, mv: &Shot) -> bool {
        mv.0 < self.size && mv.1 < self.size && self.target_marks()[mv.0 * self.size + mv.1].is_none() && !self.is_terminal()
    }
}

impl Opponent for BattleshipState {
    /// Hunt on a checkerboard until something is hit, then work the hit.
    /// Only the shot marks are consulted, never the hidden fleet.
    fn select_move(&self, strategy: &StrategyConfig) -> Result<Shot, EngineError> {
        let mut rng = GameRng::new(strategy.seed);
        if let Some(mv) = forced_or_random(self, strategy, &mut rng)? {
            return Ok(mv);
        }
        let n = self.size;
        let to_shot = |i: usize| Shot(i / n, i % n);
        let targets = self.target_cells();
        if let Some(&i) = rng.choose(&targets) {
            return Ok(to_shot(i));
        }
        let open: Vec<Shot> = self.legal_moves();
        let parity: Vec<Shot> = open.iter().copied().filter(|s| (s.0 + s.1) % 2 == 0).collect();
        rng.choose(if parity.is_empty() { &open } else { &parity })
            .copied()
            .ok_or(EngineError::GameOver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fleets_are_dealt_without_overlap() {
        let game = BattleshipState::new(10, 3).unwrap();
        for waters in &game.waters {
            let mut cells: Vec<usize> = waters.ships.iter().flatten().copied().collect();
            assert_eq!(cells.len(), 17);
            cells.sort_unstable();
            cells.dedup();
            assert_eq!(cells.len(), 17);
        }
        assert_eq!(game, BattleshipState::new(10, 3).unwrap());
    }

    fn reply(game: BattleshipState) -> BattleshipState {
        let shot = game.legal_moves()[0];
        game.apply(&shot).unwrap()
    }

    #[test]
    fn shots_mark_and_sink() {
        let mut game = BattleshipState::new(10, 5).unwrap();
        let ship = game.waters[1].ships[4].clone();
        let miss = (0..100).find(|i| !game.waters[1].ships.iter().flatten().any(|c| c == i)).unwrap();
        game = game.apply(&Shot(miss / 10, miss % 10)).unwrap();
        assert_eq!(game.mark(Player::First, miss / 10, miss % 10), Some(Mark::Miss));
        assert_eq!(game.current_player(), Player::Second);

        for (k, &cell) in ship.iter().enumerate() {
            game = reply(game);
            game = game.apply(&Shot(cell / 10, cell % 10)).unwrap();
            let expected = if k + 1 == ship.len() { Mark::Sunk } else { Mark::Hit };
            assert_eq!(game.mark(Player::First, cell / 10, cell % 10), Some(expected));
        }
    }

    #[test]
    fn sinking_everything_wins() {
        let mut game = BattleshipState::new(10, 9).unwrap();
        let targets: Vec<usize> = game.waters[1].ships.iter().flatten().copied().collect();
        for (k, cell) in targets.into_iter().enumerate() {
            if k > 0 {
                game = reply(game);
            }
            game = game.apply(&Shot(cell / 10, cell % 10)).unwrap();
        }
        assert_eq!(game.outcome(), Outcome::Win(Player::First));
        assert!(game.legal_moves().is_empty());
        assert!(matches!(game.apply(&Shot(0, 0)), Err(EngineError::GameOver)));
    }

    #[test]
    fn cpu_follows_up_a_hit() {
        let mut game = BattleshipState::new(10, 11).unwrap();
        let cell = game.waters[1].ships[0][2];
        game.waters[1].receive(cell);
        let (r, c) = (cell / 10, cell % 10);
        let mv = game.select_move(&StrategyConfig::default()).unwrap();
        let distance = mv.0.abs_diff(r) + mv.1.abs_diff(c);
        assert_eq!(distance, 1);
    }
}
