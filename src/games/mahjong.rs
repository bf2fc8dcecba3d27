//! # Mahjong Solitaire
//!
//! Tiles sit on stacked layers. Positions use half-tile units so a tile on
//! an upper layer may straddle up to four tiles below it; every tile covers
//! a 2×2 footprint. A tile is free when nothing on a higher layer overlaps
//! its footprint and its left or right neighbour slot on its own layer is
//! empty. Removing two free tiles with the same face is the only move.
//!
//! Deals are built backwards: pairs of positions that are free in the
//! remaining layout are removed in turn and given a common face, so the
//! reverse of that order always clears the board.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::rng::GameRng;
use crate::search::forced_or_random;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

const DEAL_ATTEMPTS: usize = 200;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum Suit {
    Dots,
    Bamboo,
    Characters,
    Wind,
    Dragon,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct Face {
    pub suit: Suit,
    pub rank: u8,
}

impl Face {
    /// The 34 distinct faces of a standard set.
    fn all() -> Vec<Face> {
        let mut faces = Vec::with_capacity(34);
        for suit in [Suit::Dots, Suit::Bamboo, Suit::Characters] {
            faces.extend((1..=9).map(|rank| Face { suit, rank }));
        }
        faces.extend((1..=4).map(|rank| Face { suit: Suit::Wind, rank }));
        faces.extend((1..=3).map(|rank| Face { suit: Suit::Dragon, rank }));
        faces
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.suit {
            Suit::Dots => write!(f, "D{}", self.rank),
            Suit::Bamboo => write!(f, "B{}", self.rank),
            Suit::Characters => write!(f, "C{}", self.rank),
            Suit::Wind => write!(f, "W{}", ["e", "s", "w", "n"][usize::from(self.rank - 1) % 4]),
            Suit::Dragon => write!(f, "R{}", ["r", "g", "w"][usize::from(self.rank - 1) % 3]),
        }
    }
}

/// Top-left corner of a tile in half-tile units.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Slot {
    pub layer: u8,
    pub x: i32,
    pub y: i32,
}

impl Slot {
    fn overlaps(self, other: Slot) -> bool {
        (self.x - other.x).abs() < 2 && (self.y - other.y).abs() < 2
    }
}

/// Named layouts.
pub fn layout(name: &str) -> Option<Vec<Slot>> {
    // (width, height, offset) per layer, each centred on the one below.
    let layers: &[(i32, i32, i32)] = match name {
        "pyramid" => &[(8, 6, 0), (6, 4, 2), (4, 2, 4)],
        "tower" => &[(4, 4, 0), (3, 3, 1), (2, 2, 2), (1, 1, 3)],
        _ => return None,
    };
    let mut slots = Vec::new();
    for (layer, &(w, h, offset)) in layers.iter().enumerate() {
        for row in 0..h {
            for col in 0..w {
                slots.push(Slot {
                    layer: layer as u8,
                    x: offset + 2 * col,
                    y: offset + 2 * row,
                });
            }
        }
    }
    Some(slots)
}

fn is_free(slots: &[Slot], present: impl Fn(usize) -> bool, idx: usize) -> bool {
    let me = slots[idx];
    let mut left_open = true;
    let mut right_open = true;
    for (other, &slot) in slots.iter().enumerate() {
        if other == idx || !present(other) {
            continue;
        }
        if slot.layer > me.layer && slot.overlaps(me) {
            return false;
        }
        if slot.layer == me.layer && (slot.y - me.y).abs() < 2 {
            if slot.x == me.x - 2 {
                left_open = false;
            }
            if slot.x == me.x + 2 {
                right_open = false;
            }
        }
    }
    left_open || right_open
}

/// Removes two tiles, by slot index (`a < b`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct MahjongMove {
    pub a: usize,
    pub b: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MahjongState {
    layout: String,
    slots: Vec<Slot>,
    tiles: Vec<Option<Face>>,
}

impl MahjongState {
    pub fn new(layout_name: &str, seed: u64) -> Result<Self, EngineError> {
        let slots = layout(layout_name)
            .ok_or_else(|| EngineError::config(format!("unknown mahjong layout '{}'", layout_name)))?;
        let mut rng = GameRng::new(seed);
        for _ in 0..DEAL_ATTEMPTS {
            if let Some((tiles, _)) = deal(&slots, &mut rng) {
                return Ok(Self {
                    layout: layout_name.to_string(),
                    slots,
                    tiles,
                });
            }
        }
        Err(EngineError::config("could not deal a solvable layout"))
    }

    pub fn remaining(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_some()).count()
    }

    pub fn face(&self, idx: usize) -> Option<Face> {
        self.tiles[idx]
    }

    pub fn is_free(&self, idx: usize) -> bool {
        self.tiles[idx].is_some() && is_free(&self.slots, |i| self.tiles[i].is_some(), idx)
    }

    pub fn free_tiles(&self) -> Vec<usize> {
        (0..self.slots.len()).filter(|&i| self.is_free(i)).collect()
    }

    /// A removable pair, if any is left.
    pub fn hint(&self) -> Option<MahjongMove> {
        self.legal_moves().into_iter().next()
    }
}

/// One backwards deal attempt: the faces and the order that clears them.
fn deal(slots: &[Slot], rng: &mut GameRng) -> Option<(Vec<Option<Face>>, Vec<MahjongMove>)> {
    let mut pair_faces: Vec<Face> = Face::all().into_iter().flat_map(|f| [f, f]).collect();
    rng.shuffle(&mut pair_faces);
    if slots.len() % 2 != 0 || slots.len() / 2 > pair_faces.len() {
        return None;
    }
    let mut present = vec![true; slots.len()];
    let mut tiles = vec![None; slots.len()];
    let mut order = Vec::with_capacity(slots.len() / 2);
    for &face in pair_faces.iter().take(slots.len() / 2) {
        let mut free: Vec<usize> = (0..slots.len())
            .filter(|&i| present[i] && is_free(slots, |j| present[j], i))
            .collect();
        if free.len() < 2 {
            return None;
        }
        rng.shuffle(&mut free);
        let (a, b) = (free[0].min(free[1]), free[0].max(free[1]));
        present[a] = false;
        present[b] = false;
        tiles[a] = Some(face);
        tiles[b] = Some(face);
        order.push(MahjongMove { a, b });
    }
    order.reverse();
    Some((tiles, order))
}

impl fmt::Display for MahjongState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layers = self.slots.iter().map(|s| s.layer).max().unwrap_or(0);
        let width = self.slots.iter().map(|s| s.x).max().unwrap_or(0) as usize + 2;
        writeln!(f, "{} ({} tiles left)", self.layout, self.remaining())?;
        for layer in 0..=layers {
            writeln!(f, "layer {}", layer)?;
            let mut rows: Vec<i32> = self
                .slots
                .iter()
                .zip(&self.tiles)
                .filter(|(s, t)| s.layer == layer && t.is_some())
                .map(|(s, _)| s.y)
                .collect();
            rows.sort_unstable();
            rows.dedup();
            for y in rows {
                let mut line = vec![' '; width * 2 + 2];
                for (idx, (slot, tile)) in self.slots.iter().zip(&self.tiles).enumerate() {
                    let Some(face) = tile else { continue };
                    if slot.layer != layer || slot.y != y {
                        continue;
                    }
                    let text = format!("{}{}", face, if self.is_free(idx) { '*' } else { ' ' });
                    for (k, ch) in text.chars().enumerate() {
                        if let Some(cell) = line.get_mut(slot.x as usize * 2 + k) {
                            *cell = ch;
                        }
                    }
                }
                writeln!(f, "  {}", line.into_iter().collect::<String>().trim_end())?;
            }
        }
        Ok(())
    }
}

impl GameState for MahjongState {
    type Move = MahjongMove;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        Self::new(config.variant.as_deref().unwrap_or("pyramid"), config.seed)
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        let free = self.free_tiles();
        let mut moves = Vec::new();
        for (i, &a) in free.iter().enumerate() {
            for &b in &free[i + 1..] {
                if self.tiles[a] == self.tiles[b] {
                    moves.push(MahjongMove { a, b });
                }
            }
        }
        moves
    }

    fn make_move(&mut self, mv: &Self::Move) {
        self.tiles[mv.a] = None;
        self.tiles[mv.b] = None;
    }

    fn outcome(&self) -> Outcome {
        if self.remaining() == 0 {
            Outcome::Win(Player::Solo)
        } else if self.legal_moves().is_empty() {
            Outcome::Stalemate
        } else {
            Outcome::InProgress
        }
    }

    fn current_player(&self) -> Player {
        Player::Solo
    }

    fn is_legal(&self, mv: &MahjongMove) -> bool {
        mv.a < mv.b
            && mv.b < self.tiles.len()
            && self.tiles[mv.a].is_some()
            && self.tiles[mv.a] == self.tiles[mv.b]
            && self.is_free(mv.a)
            && self.is_free(mv.b)
    }
}

impl Opponent for MahjongState {
    /// Takes the pair that leaves the most tiles free, keeping a spare
    /// matching pair in view when it can.
    fn select_move(&self, strategy: &StrategyConfig) -> Result<MahjongMove, EngineError> {
        let mut rng = GameRng::new(strategy.seed);
        if let Some(mv) = forced_or_random(self, strategy, &mut rng)? {
            return Ok(mv);
        }
        let moves = self.legal_moves();
        let mut best: Option<((bool, usize), MahjongMove)> = None;
        for mv in moves {
            let mut next = self.clone();
            next.make_move(&mv);
            let key = (next.remaining() == 0 || next.hint().is_some(), next.free_tiles().len());
            if best.map_or(true, |(b, _)| key > b) {
                best = Some((key, mv));
            }
        }
        best.map(|(_, mv)| mv).ok_or(EngineError::GameOver)
    }
}
