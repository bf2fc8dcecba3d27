//! # Chinese Checkers (two players)
//!
//! 121-hole star on axial hex coordinates `(q, r)`: the union of the two
//! big triangles `q, r, s >= -4` and `q, r, s <= 4` where `s = -q - r`.
//! First starts in the triangle `r >= 5` and must fill `r <= -5`; Second
//! the other way round. A move is a single step or any endpoint of a chain
//! of hops over adjacent marbles.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::search::alphabeta;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (-1, 0), (0, 1), (0, -1), (1, -1), (-1, 1)];

/// Holes of the star, ordered by `r` then `q`.
fn holes() -> Vec<(i32, i32)> {
    let mut out = Vec::with_capacity(121);
    for r in -8..=8 {
        for q in -8..=8 {
            let s = -q - r;
            let upward = q >= -4 && r >= -4 && s >= -4;
            let downward = q <= 4 && r <= 4 && s <= 4;
            if upward || downward {
                out.push((q, r));
            }
        }
    }
    out
}

fn home_of(player: Player, r: i32) -> bool {
    match player {
        Player::Second => r <= -5,
        _ => r >= 5,
    }
}

fn target_of(player: Player, r: i32) -> bool {
    home_of(player.opponent(), r)
}

/// Hole indices into the star ordering.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct HalmaMove {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChineseCheckersState {
    cells: Vec<Option<Player>>,
    current_player: Player,
    plies: u32,
    max_plies: u32,
}

impl ChineseCheckersState {
    pub fn new(max_plies: u32) -> Self {
        let cells = holes()
            .iter()
            .map(|&(_, r)| {
                if home_of(Player::First, r) {
                    Some(Player::First)
                } else if home_of(Player::Second, r) {
                    Some(Player::Second)
                } else {
                    None
                }
            })
            .collect();
        Self {
            cells,
            current_player: Player::First,
            plies: 0,
            max_plies,
        }
    }

    /// Index of the hole at (q, r), if it is on the star.
    pub fn hole(q: i32, r: i32) -> Option<usize> {
        holes().iter().position(|&h| h == (q, r))
    }

    pub fn marble(&self, idx: usize) -> Option<Player> {
        self.cells[idx]
    }

    fn neighbour(layout: &[(i32, i32)], idx: usize, (dq, dr): (i32, i32), times: i32) -> Option<usize> {
        let (q, r) = layout[idx];
        let want = (q + dq * times, r + dr * times);
        layout.iter().position(|&h| h == want)
    }

    fn destinations(&self, layout: &[(i32, i32)], from: usize) -> Vec<usize> {
        let mut out = Vec::new();
        for dir in DIRECTIONS {
            if let Some(to) = Self::neighbour(layout, from, dir, 1).filter(|&to| self.cells[to].is_none()) {
                out.push(to);
            }
        }
        let mut frontier = vec![from];
        let mut reached = vec![false; self.cells.len()];
        reached[from] = true;
        while let Some(here) = frontier.pop() {
            for dir in DIRECTIONS {
                let over = Self::neighbour(layout, here, dir, 1);
                let land = Self::neighbour(layout, here, dir, 2);
                if let (Some(over), Some(land)) = (over, land) {
                    if self.cells[over].is_some() && self.cells[land].is_none() && !reached[land] {
                        reached[land] = true;
                        frontier.push(land);
                        if !out.contains(&land) {
                            out.push(land);
                        }
                    }
                }
            }
        }
        out.sort_unstable();
        out
    }

    fn has_won(&self, layout: &[(i32, i32)], player: Player) -> bool {
        let mut own = false;
        for (idx, &(_, r)) in layout.iter().enumerate() {
            if target_of(player, r) {
                match self.cells[idx] {
                    None => return false,
                    Some(p) if p == player => own = true,
                    Some(_) => {}
                }
            }
        }
        own
    }

    /// Total rows still to travel for `player`'s marbles.
    fn remaining_distance(&self, layout: &[(i32, i32)], player: Player) -> i32 {
        layout
            .iter()
            .zip(&self.cells)
            .filter(|(_, c)| **c == Some(player))
            .map(|(&(_, r), _)| if player == Player::First { r + 8 } else { 8 - r })
            .sum()
    }

    fn evaluate(&self, me: Player) -> i32 {
        let layout = holes();
        self.remaining_distance(&layout, me.opponent()) - self.remaining_distance(&layout, me)
    }
}

impl fmt::Display for ChineseCheckersState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = holes();
        for r in -8..=8 {
            let row: Vec<char> = layout
                .iter()
                .zip(&self.cells)
                .filter(|((_, hr), _)| *hr == r)
                .map(|(_, c)| match c {
                    Some(Player::First) => '1',
                    Some(_) => '2',
                    None => '.',
                })
                .collect();
            let first_q = layout.iter().find(|h| h.1 == r).map_or(0, |h| h.0);
            // Shift each row so hex neighbours line up.
            let indent = (2 * first_q + r + 16) as usize;
            let text: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            writeln!(f, "{}{}", " ".repeat(indent), text.join(" "))?;
        }
        Ok(())
    }
}

impl GameState for ChineseCheckersState {
    type Move = HalmaMove;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        Ok(Self::new(config.ply_limit(400)?))
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.is_terminal() {
            return Vec::new();
        }
        let layout = holes();
        let mut moves = Vec::new();
        for from in 0..self.cells.len() {
            if self.cells[from] == Some(self.current_player) {
                for to in self.destinations(&layout, from) {
                    moves.push(HalmaMove { from, to });
                }
            }
        }
        moves
    }

    fn make_move(&mut self, mv: &Self::Move) {
        self.cells[mv.to] = self.cells[mv.from].take();
        self.plies += 1;
        self.current_player = self.current_player.opponent();
    }

    fn outcome(&self) -> Outcome {
        let layout = holes();
        for player in [Player::First, Player::Second] {
            if self.has_won(&layout, player) {
                return Outcome::Win(player);
            }
        }
        if self.plies >= self.max_plies {
            Outcome::Draw
        } else {
            Outcome::InProgress
        }
    }

    fn current_player(&self) -> Player {
        self.current_player
    }
}

impl Opponent for ChineseCheckersState {
    fn select_move(&self, strategy: &StrategyConfig) -> Result<HalmaMove, EngineError> {
        alphabeta::choose(self, strategy, 2, |s: &Self, me| s.evaluate(me))
    }
}
