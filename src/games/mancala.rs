//! # Mancala (Kalah)
//!
//! Each side has a row of pits and a store on its right. Sowing runs
//! counter-clockwise and skips the opponent's store. Ending in one's own
//! store earns another turn; ending in one's own empty pit captures that
//! seed together with the opposite pit. When either row empties, every
//! remaining seed goes to the store of the side it sits on.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::search::alphabeta;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pit index counted from the mover's left, 0-based.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct MancalaMove(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MancalaState {
    /// First's pits, First's store, Second's pits, Second's store.
    cells: Vec<u32>,
    pits: usize,
    current_player: Player,
    plies: u32,
    max_plies: u32,
}

impl MancalaState {
    pub fn new(pits: usize, seeds: u32, max_plies: u32) -> Result<Self, EngineError> {
        if !(1..=12).contains(&pits) || !(1..=12).contains(&seeds) {
            return Err(EngineError::config("mancala needs 1..=12 pits and 1..=12 seeds"));
        }
        let mut cells = vec![seeds; 2 * pits + 2];
        cells[pits] = 0;
        cells[2 * pits + 1] = 0;
        Ok(Self {
            cells,
            pits,
            current_player: Player::First,
            plies: 0,
            max_plies,
        })
    }

    fn store(&self, player: Player) -> usize {
        match player {
            Player::Second => 2 * self.pits + 1,
            _ => self.pits,
        }
    }

    fn first_pit(&self, player: Player) -> usize {
        match player {
            Player::Second => self.pits + 1,
            _ => 0,
        }
    }

    fn row(&self, player: Player) -> &[u32] {
        let start = self.first_pit(player);
        &self.cells[start..start + self.pits]
    }

    pub fn store_count(&self, player: Player) -> u32 {
        self.cells[self.store(player)]
    }

    pub fn pit(&self, player: Player, index: usize) -> u32 {
        self.cells[self.first_pit(player) + index]
    }

    fn row_empty(&self, player: Player) -> bool {
        self.row(player).iter().all(|&s| s == 0)
    }

    /// Seeds each side would end with if the game stopped now.
    fn final_counts(&self) -> (u32, u32) {
        let first = self.store_count(Player::First) + self.row(Player::First).iter().sum::<u32>();
        let second = self.store_count(Player::Second) + self.row(Player::Second).iter().sum::<u32>();
        (first, second)
    }

    fn finished(&self) -> bool {
        self.row_empty(Player::First) || self.row_empty(Player::Second) || self.plies >= self.max_plies
    }

    fn sweep(&mut self) {
        for player in [Player::First, Player::Second] {
            let start = self.first_pit(player);
            let store = self.store(player);
            let total: u32 = self.cells[start..start + self.pits].iter().sum();
            self.cells[start..start + self.pits].iter_mut().for_each(|s| *s = 0);
            self.cells[store] += total;
        }
    }
}

impl fmt::Display for MancalaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let second: Vec<String> = self.row(Player::Second).iter().rev().map(|s| format!("{:2}", s)).collect();
        let first: Vec<String> = self.row(Player::First).iter().map(|s| format!("{:2}", s)).collect();
        writeln!(f, "     {}", second.join(" "))?;
        writeln!(
            f,
            "{:2} {} {:2}",
            self.store_count(Player::Second),
            " ".repeat(self.pits * 3 + 1),
            self.store_count(Player::First)
        )?;
        writeln!(f, "     {}", first.join(" "))
    }
}

impl GameState for MancalaState {
    type Move = MancalaMove;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        let seeds = u32::try_from(config.line_size.unwrap_or(4))
            .map_err(|_| EngineError::config("mancala seed count out of range"))?;
        Self::new(config.board_size.unwrap_or(6), seeds, config.ply_limit(400)?)
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.finished() {
            return Vec::new();
        }
        (0..self.pits)
            .filter(|&i| self.pit(self.current_player, i) > 0)
            .map(MancalaMove)
            .collect()
    }

    fn make_move(&mut self, mv: &Self::Move) {
        let me = self.current_player;
        let len = self.cells.len();
        let skip = self.store(me.opponent());
        let mut pos = self.first_pit(me) + mv.0;
        let mut seeds = std::mem::take(&mut self.cells[pos]);
        while seeds > 0 {
            pos = (pos + 1) % len;
            if pos == skip {
                continue;
            }
            self.cells[pos] += 1;
            seeds -= 1;
        }

        let own_row = self.first_pit(me)..self.first_pit(me) + self.pits;
        if own_row.contains(&pos) && self.cells[pos] == 1 {
            let opposite = 2 * self.pits - pos;
            let captured = self.cells[pos] + std::mem::take(&mut self.cells[opposite]);
            self.cells[pos] = 0;
            let store = self.store(me);
            self.cells[store] += captured;
        }

        self.plies += 1;
        if pos != self.store(me) {
            self.current_player = me.opponent();
        }
        if self.row_empty(Player::First) || self.row_empty(Player::Second) {
            self.sweep();
        }
    }

    fn outcome(&self) -> Outcome {
        if !self.finished() {
            return Outcome::InProgress;
        }
        let (first, second) = self.final_counts();
        match first.cmp(&second) {
            std::cmp::Ordering::Greater => Outcome::Win(Player::First),
            std::cmp::Ordering::Less => Outcome::Win(Player::Second),
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    fn current_player(&self) -> Player {
        self.current_player
    }
}

impl Opponent for MancalaState {
    fn select_move(&self, strategy: &StrategyConfig) -> Result<MancalaMove, EngineError> {
        alphabeta::choose(self, strategy, 6, |s: &Self, me| {
            s.store_count(me) as i32 - s.store_count(me.opponent()) as i32
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landing_in_own_store_grants_another_turn() {
        let game = MancalaState::new(6, 4, 400).unwrap();
        assert_eq!(game.legal_moves().len(), 6);
        let next = game.apply(&MancalaMove(2)).unwrap();
        assert_eq!(next.store_count(Player::First), 1);
        assert_eq!(next.current_player(), Player::First);
        let next = next.apply(&MancalaMove(0)).unwrap();
        assert_eq!(next.current_player(), Player::Second);
    }

    #[test]
    fn sowing_skips_the_opponent_store() {
        let mut game = MancalaState::new(6, 4, 400).unwrap();
        game.cells[5] = 10;
        let next = game.apply(&MancalaMove(5)).unwrap();
        assert_eq!(next.store_count(Player::Second), 0);
        assert_eq!(next.store_count(Player::First), 1);
        // Ten seeds: store, six opposing pits, skip, then pits 0..=2.
        assert_eq!(next.pit(Player::First, 0), 5);
        assert_eq!(next.pit(Player::First, 3), 4);
    }

    #[test]
    fn empty_pit_landing_captures_the_opposite_pit() {
        let mut game = MancalaState::new(6, 4, 400).unwrap();
        game.cells[0] = 1;
        game.cells[1] = 0;
        // First's pit 1 faces Second's pit at cell 11.
        let next = game.apply(&MancalaMove(0)).unwrap();
        assert_eq!(next.store_count(Player::First), 5);
        assert_eq!(next.pit(Player::First, 1), 0);
        assert_eq!(next.cells[11], 0);
    }

    #[test]
    fn emptied_row_ends_the_game() {
        let mut game = MancalaState::new(2, 1, 400).unwrap();
        game.cells = vec![0, 1, 3, 2, 2, 0];
        // First sows into the store and empties the row; Second's seeds are swept.
        let next = game.apply(&MancalaMove(1)).unwrap();
        assert!(next.legal_moves().is_empty());
        assert_eq!(next.store_count(Player::First), 4);
        assert_eq!(next.store_count(Player::Second), 4);
        assert_eq!(next.outcome(), Outcome::Draw);
    }

    #[test]
    fn seed_count_is_checked() {
        let config = |seeds: usize| GameConfig {
            line_size: Some(seeds),
            ..GameConfig::default()
        };
        assert!(MancalaState::initial_state(&config(3)).is_ok());
        for seeds in [0, 13, (u32::MAX as usize).saturating_add(4), usize::MAX] {
            assert!(matches!(
                MancalaState::initial_state(&config(seeds)),
                Err(EngineError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn cpu_move_is_legal() {
        let game = MancalaState::new(6, 4, 400).unwrap();
        let mv = game.select_move(&StrategyConfig::default()).unwrap();
        assert!(game.is_legal(&mv));
    }
}
