//! # Dominoes (draw game)
//!
//! Double-six set, seven tiles each, the rest face down in the boneyard.
//! A player who cannot match either end of the line must draw until they
//! can, and passes once the boneyard is empty. Emptying the hand wins; two
//! passes in a row block the game and the lighter hand wins.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::rng::GameRng;
use crate::search::forced_or_random;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

const HAND: usize = 7;

/// A tile, stored low half first.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct Tile(pub u8, pub u8);

impl Tile {
    pub fn new(a: u8, b: u8) -> Self {
        Tile(a.min(b), a.max(b))
    }

    pub fn pips(self) -> u32 {
        u32::from(self.0) + u32::from(self.1)
    }

    fn matches(self, value: u8) -> bool {
        self.0 == value || self.1 == value
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}|{}]", self.0, self.1)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum End {
    Left,
    Right,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum DominoMove {
    Play { tile: Tile, end: End },
    /// Take the top boneyard tile; the same player moves again.
    Draw,
    Pass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DominoesState {
    hands: [Vec<Tile>; 2],
    boneyard: Vec<Tile>,
    /// Tiles on the table, oriented so neighbouring halves touch.
    line: Vec<(u8, u8)>,
    current_player: Player,
    passes: u8,
}

impl DominoesState {
    pub fn new(seed: u64) -> Self {
        let mut set: Vec<Tile> = (0..=6u8).flat_map(|a| (a..=6).map(move |b| Tile(a, b))).collect();
        GameRng::new(seed).shuffle(&mut set);
        let boneyard = set.split_off(2 * HAND);
        let mut second = set.split_off(HAND);
        let mut first = set;
        first.sort_unstable();
        second.sort_unstable();
        Self {
            hands: [first, second],
            boneyard,
            line: Vec::new(),
            current_player: Player::First,
            passes: 0,
        }
    }

    pub fn hand(&self, player: Player) -> &[Tile] {
        &self.hands[player.index()]
    }

    pub fn boneyard_len(&self) -> usize {
        self.boneyard.len()
    }

    /// Open values at the two ends of the line.
    pub fn ends(&self) -> Option<(u8, u8)> {
        Some((self.line.first()?.0, self.line.last()?.1))
    }

    fn hand_pips(&self, player: Player) -> u32 {
        self.hands[player.index()].iter().map(|t| t.pips()).sum()
    }

    fn plays(&self) -> Vec<DominoMove> {
        let hand = &self.hands[self.current_player.index()];
        let Some((left, right)) = self.ends() else {
            return hand.iter().map(|&tile| DominoMove::Play { tile, end: End::Left }).collect();
        };
        let mut out = Vec::new();
        for &tile in hand {
            if tile.matches(left) {
                out.push(DominoMove::Play { tile, end: End::Left });
            }
            if tile.matches(right) {
                out.push(DominoMove::Play { tile, end: End::Right });
            }
        }
        out
    }

    fn place(&mut self, tile: Tile, end: End) {
        let Some((left, right)) = self.ends() else {
            self.line.push((tile.0, tile.1));
            return;
        };
        match end {
            End::Left => {
                let oriented = if tile.1 == left { (tile.0, tile.1) } else { (tile.1, tile.0) };
                self.line.insert(0, oriented);
            }
            End::Right => {
                let oriented = if tile.0 == right { (tile.0, tile.1) } else { (tile.1, tile.0) };
                self.line.push(oriented);
            }
        }
    }
}

impl fmt::Display for DominoesState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line: Vec<String> = self.line.iter().map(|(a, b)| format!("[{}|{}]", a, b)).collect();
        writeln!(f, "table: {}", if line.is_empty() { "(empty)".to_string() } else { line.join("") })?;
        let hand: Vec<String> = self.hands[0].iter().map(Tile::to_string).collect();
        writeln!(f, "first hand: {}", hand.join(" "))?;
        writeln!(f, "second holds {} tiles, boneyard {}", self.hands[1].len(), self.boneyard.len())
    }
}

impl GameState for DominoesState {
    type Move = DominoMove;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        Ok(Self::new(config.seed))
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.is_terminal() {
            return Vec::new();
        }
        let plays = self.plays();
        if !plays.is_empty() {
            plays
        } else if !self.boneyard.is_empty() {
            vec![DominoMove::Draw]
        } else {
            vec![DominoMove::Pass]
        }
    }

    fn make_move(&mut self, mv: &Self::Move) {
        let me = self.current_player.index();
        match *mv {
            DominoMove::Play { tile, end } => {
                self.hands[me].retain(|&t| t != tile);
                self.place(tile, end);
                self.passes = 0;
                self.current_player = self.current_player.opponent();
            }
            DominoMove::Draw => {
                if let Some(tile) = self.boneyard.pop() {
                    let hand = &mut self.hands[me];
                    let at = hand.partition_point(|&t| t < tile);
                    hand.insert(at, tile);
                }
            }
            DominoMove::Pass => {
                self.passes += 1;
                self.current_player = self.current_player.opponent();
            }
        }
    }

    fn outcome(&self) -> Outcome {
        for player in [Player::First, Player::Second] {
            if self.hands[player.index()].is_empty() {
                return Outcome::Win(player);
            }
        }
        if self.passes < 2 {
            return Outcome::InProgress;
        }
        let (a, b) = (self.hand_pips(Player::First), self.hand_pips(Player::Second));
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Outcome::Win(Player::First),
            std::cmp::Ordering::Greater => Outcome::Win(Player::Second),
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    fn current_player(&self) -> Player {
        self.current_player
    }
}

impl Opponent for DominoesState {
    /// Sheds the heaviest playable tile, doubles first on equal weight.
    fn select_move(&self, strategy: &StrategyConfig) -> Result<DominoMove, EngineError> {
        let mut rng = GameRng::new(strategy.seed);
        if let Some(mv) = forced_or_random(self, strategy, &mut rng)? {
            return Ok(mv);
        }
        self.legal_moves()
            .into_iter()
            .max_by_key(|mv| match mv {
                DominoMove::Play { tile, .. } => (tile.pips(), tile.0 == tile.1),
                _ => (0, false),
            })
            .ok_or(EngineError::GameOver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(hands: [Vec<Tile>; 2], boneyard: Vec<Tile>, line: Vec<(u8, u8)>) -> DominoesState {
        DominoesState {
            hands,
            boneyard,
            line,
            current_player: Player::First,
            passes: 0,
        }
    }

    #[test]
    fn deal_uses_the_whole_set() {
        let game = DominoesState::new(4);
        assert_eq!(game.hand(Player::First).len(), 7);
        assert_eq!(game.hand(Player::Second).len(), 7);
        assert_eq!(game.boneyard_len(), 14);
        let mut all: Vec<Tile> = game.hands.iter().flatten().chain(&game.boneyard).copied().collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 28);
        // Any tile may open the line.
        assert_eq!(game.legal_moves().len(), 7);
        assert_eq!(game, DominoesState::new(4));
    }

    #[test]
    fn tiles_join_matching_ends() {
        let game = table(
            [vec![Tile(2, 5), Tile(3, 3)], vec![Tile(0, 0)]],
            vec![],
            vec![(5, 1)],
        );
        let moves = game.legal_moves();
        assert_eq!(moves, vec![DominoMove::Play { tile: Tile(2, 5), end: End::Left }]);
        let next = game.apply(&moves[0]).unwrap();
        assert_eq!(next.ends(), Some((2, 1)));
        assert_eq!(next.current_player(), Player::Second);
    }

    #[test]
    fn stuck_player_draws_then_passes() {
        let game = table(
            [vec![Tile(0, 0), Tile(4, 4)], vec![Tile(1, 2)]],
            vec![Tile(6, 6)],
            vec![(5, 5)],
        );
        assert_eq!(game.legal_moves(), vec![DominoMove::Draw]);
        let drawn = game.apply(&DominoMove::Draw).unwrap();
        assert_eq!(drawn.current_player(), Player::First);
        assert_eq!(drawn.hand(Player::First).len(), 3);
        assert_eq!(drawn.legal_moves(), vec![DominoMove::Pass]);
        let passed = drawn.apply(&DominoMove::Pass).unwrap();
        assert_eq!(passed.outcome(), Outcome::InProgress);
        // Second is stuck as well: the block is scored on pips.
        let blocked = passed.apply(&DominoMove::Pass).unwrap();
        assert_eq!(blocked.outcome(), Outcome::Win(Player::Second));
        assert!(blocked.legal_moves().is_empty());
    }

    #[test]
    fn emptying_the_hand_wins() {
        let game = table([vec![Tile(1, 5)], vec![Tile(0, 0)]], vec![], vec![(5, 5)]);
        let done = game.apply(&DominoMove::Play { tile: Tile(1, 5), end: End::Right }).unwrap();
        assert_eq!(done.outcome(), Outcome::Win(Player::First));
    }

    #[test]
    fn cpu_sheds_the_heaviest_tile() {
        let game = table(
            [vec![Tile(0, 3), Tile(3, 3), Tile(3, 6)], vec![Tile(0, 0)]],
            vec![],
            vec![(3, 1)],
        );
        let mv = game.select_move(&StrategyConfig::default()).unwrap();
        assert_eq!(mv, DominoMove::Play { tile: Tile(3, 6), end: End::Left });
    }
}
