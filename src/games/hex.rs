//! # Hex
//!
//! n×n rhombus of hexagons. First connects the top edge to the bottom edge,
//! Second connects left to right. A full board always has exactly one winner.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::search::alphabeta;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

const NEIGHBOURS: [(i32, i32); 6] = [(-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0)];

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct HexMove(pub usize, pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexState {
    board: Vec<Option<Player>>,
    size: usize,
    current_player: Player,
    stones: usize,
}

impl HexState {
    pub fn new(size: usize) -> Result<Self, EngineError> {
        if !(2..=19).contains(&size) {
            return Err(EngineError::config("hex board size must be 2..=19"));
        }
        Ok(Self {
            board: vec![None; size * size],
            size,
            current_player: Player::First,
            stones: 0,
        })
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Player> {
        self.board[row * self.size + col]
    }

    fn neighbours(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        let n = self.size as i32;
        let (r, c) = ((idx / self.size) as i32, (idx % self.size) as i32);
        NEIGHBOURS.iter().filter_map(move |(dr, dc)| {
            let (nr, nc) = (r + dr, c + dc);
            (nr >= 0 && nr < n && nc >= 0 && nc < n).then(|| (nr * n + nc) as usize)
        })
    }

    fn on_start_edge(&self, idx: usize, player: Player) -> bool {
        match player {
            Player::Second => idx % self.size == 0,
            _ => idx / self.size == 0,
        }
    }

    fn on_goal_edge(&self, idx: usize, player: Player) -> bool {
        match player {
            Player::Second => idx % self.size == self.size - 1,
            _ => idx / self.size == self.size - 1,
        }
    }

    fn connects(&self, player: Player) -> bool {
        let mut seen = vec![false; self.board.len()];
        let mut queue: VecDeque<usize> = (0..self.board.len())
            .filter(|&i| self.on_start_edge(i, player) && self.board[i] == Some(player))
            .collect();
        for &i in &queue {
            seen[i] = true;
        }
        while let Some(idx) = queue.pop_front() {
            if self.on_goal_edge(idx, player) {
                return true;
            }
            for next in self.neighbours(idx) {
                if !seen[next] && self.board[next] == Some(player) {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }
        false
    }

    /// Empty cells `player` still needs to connect their edges; `None` when cut off.
    ///
    /// 0-1 breadth-first search: own stones are free, empty cells cost one.
    pub fn connection_distance(&self, player: Player) -> Option<u32> {
        let cost = |idx: usize| match self.board[idx] {
            Some(p) if p == player => Some(0),
            Some(_) => None,
            None => Some(1),
        };
        let mut dist = vec![u32::MAX; self.board.len()];
        let mut deque = VecDeque::new();
        for idx in 0..self.board.len() {
            if self.on_start_edge(idx, player) {
                if let Some(c) = cost(idx) {
                    dist[idx] = c;
                    if c == 0 {
                        deque.push_front(idx);
                    } else {
                        deque.push_back(idx);
                    }
                }
            }
        }
        while let Some(idx) = deque.pop_front() {
            for next in self.neighbours(idx) {
                if let Some(c) = cost(next) {
                    let candidate = dist[idx] + c;
                    if candidate < dist[next] {
                        dist[next] = candidate;
                        if c == 0 {
                            deque.push_front(next);
                        } else {
                            deque.push_back(next);
                        }
                    }
                }
            }
        }
        (0..self.board.len())
            .filter(|&i| self.on_goal_edge(i, player))
            .map(|i| dist[i])
            .min()
            .filter(|&d| d != u32::MAX)
    }

    fn evaluate(&self, me: Player) -> i32 {
        let far = (self.board.len() + 1) as i32;
        let mine = self.connection_distance(me).map_or(far, |d| d as i32);
        let theirs = self.connection_distance(me.opponent()).map_or(far, |d| d as i32);
        (theirs - mine) * 100
    }
}

impl fmt::Display for HexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.size {
            write!(f, "{}", " ".repeat(r))?;
            for c in 0..self.size {
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

impl GameState for HexState {
    type Move = HexMove;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        Self::new(config.size_in(11, 2..=19)?)
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.is_terminal() {
            return Vec::new();
        }
        let n = self.size;
        (0..n * n)
            .filter(|&i| self.board[i].is_none())
            .map(|i| HexMove(i / n, i % n))
            .collect()
    }

    fn make_move(&mut self, mv: &Self::Move) {
        self.board[mv.0 * self.size + mv.1] = Some(self.current_player);
        self.stones += 1;
        self.current_player = self.current_player.opponent();
    }

    fn outcome(&self) -> Outcome {
        // Only the player who just moved can have completed a chain.
        let last = self.current_player.opponent();
        if self.stones >= 2 * self.size - 1 && self.connects(last) {
            Outcome::Win(last)
        } else {
            Outcome::InProgress
        }
    }

    fn current_player(&self) -> Player {
        self.current_player
    }

    fn is_legal(&self, mv: &HexMove) -> bool {
        mv.0 < self.size && mv.1 < self.size && self.cell(mv.0, mv.1).is_none() && !self.is_terminal()
    }
}

impl Opponent for HexState {
    fn select_move(&self, strategy: &StrategyConfig) -> Result<HexMove, EngineError> {
        alphabeta::choose(self, strategy, 2, |s: &Self, me| s.evaluate(me))
    }
}
