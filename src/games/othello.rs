//! # Othello (Reversi) Game Implementation
//!
//! ## Rules
//! - Players must place pieces that "sandwich" opponent pieces between the new piece
//!   and an existing piece of the same color
//! - All sandwiched pieces are flipped to the current player's color, in every
//!   direction at once
//! - A player with no placement must pass; the pass is an explicit move
//! - Game ends when neither player can place
//! - Winner is determined by who has more pieces on the board

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::search::alphabeta;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

const DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1), (-1, 0), (-1, 1), (0, -1),
    (0, 1), (1, -1), (1, 0), (1, 1),
];

/// Represents a move in Othello
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum OthelloMove {
    /// Place a disc at (row, col), 0-based.
    Place(usize, usize),
    /// Forced pass when no placement flips anything.
    Pass,
}

/// Represents the complete state of an Othello game
///
/// First is black and moves first; Second is white.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OthelloState {
    board: Vec<Option<Player>>,
    current_player: Player,
    /// Size of the board (NxN)
    board_size: usize,
    /// Last move made, if any
    last_move: Option<(usize, usize)>,
    plies: u32,
}

impl OthelloState {
    /// Creates a new Othello game with the standard starting position
    ///
    /// Sets up the board with 4 pieces in the center in the traditional pattern.
    pub fn new(board_size: usize) -> Result<Self, EngineError> {
        if board_size % 2 != 0 || !(4..=16).contains(&board_size) {
            return Err(EngineError::config("othello board size must be even and 4..=16"));
        }
        let mut board = vec![None; board_size * board_size];
        let center = board_size / 2;
        let at = |r: usize, c: usize| r * board_size + c;
        board[at(center - 1, center - 1)] = Some(Player::Second);
        board[at(center - 1, center)] = Some(Player::First);
        board[at(center, center - 1)] = Some(Player::First);
        board[at(center, center)] = Some(Player::Second);
        Ok(OthelloState {
            board,
            current_player: Player::First,
            board_size,
            last_move: None,
            plies: 0,
        })
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Player> {
        self.board[row * self.board_size + col]
    }

    /// Disc counts as (first, second).
    pub fn disc_counts(&self) -> (usize, usize) {
        self.board.iter().fold((0, 0), |(f, s), cell| match cell {
            Some(Player::First) => (f + 1, s),
            Some(_) => (f, s + 1),
            None => (f, s),
        })
    }

    /// Opponent discs that placing `player` at (r, c) would flip.
    fn flips(&self, r: usize, c: usize, player: Player) -> Vec<usize> {
        let mut flipped = Vec::new();
        if self.cell(r, c).is_some() {
            return flipped;
        }
        let n = self.board_size as i32;
        for (dr, dc) in DIRECTIONS.iter() {
            let mut line = Vec::new();
            let mut nr = r as i32 + dr;
            let mut nc = c as i32 + dc;
            while nr >= 0 && nr < n && nc >= 0 && nc < n {
                let idx = (nr * n + nc) as usize;
                match self.board[idx] {
                    Some(p) if p != player => line.push(idx),
                    Some(_) => {
                        flipped.extend(line.iter().copied());
                        break;
                    }
                    None => break,
                }
                nr += dr;
                nc += dc;
            }
        }
        flipped
    }

    fn placements(&self, player: Player) -> Vec<OthelloMove> {
        let n = self.board_size;
        (0..n * n)
            .filter(|&i| !self.flips(i / n, i % n, player).is_empty())
            .map(|i| OthelloMove::Place(i / n, i % n))
            .collect()
    }

    fn can_place(&self, player: Player) -> bool {
        let n = self.board_size;
        (0..n * n).any(|i| !self.flips(i / n, i % n, player).is_empty())
    }

    fn square_weight(&self, r: usize, c: usize) -> i32 {
        let last = self.board_size - 1;
        let edge_r = r == 0 || r == last;
        let edge_c = c == 0 || c == last;
        let near_r = r == 1 || r == last - 1;
        let near_c = c == 1 || c == last - 1;
        if edge_r && edge_c {
            25
        } else if near_r && near_c {
            -8
        } else if (edge_r && near_c) || (near_r && edge_c) {
            -4
        } else if edge_r || edge_c {
            3
        } else {
            1
        }
    }

    fn evaluate(&self, me: Player) -> i32 {
        let n = self.board_size;
        let mut positional = 0;
        for r in 0..n {
            for c in 0..n {
                match self.cell(r, c) {
                    Some(p) if p == me => positional += self.square_weight(r, c),
                    Some(_) => positional -= self.square_weight(r, c),
                    None => {}
                }
            }
        }
        let mobility = self.placements(me).len() as i32 - self.placements(me.opponent()).len() as i32;
        positional * 4 + mobility * 3
    }
}

impl fmt::Display for OthelloState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.board_size;
        for r in 0..n {
            for c in 0..n {
                let symbol = match self.cell(r, c) {
                    Some(Player::First) => 'B',
                    Some(_) => 'W',
                    None => '.',
                };
                write!(f, "{} ", symbol)?;
            }
            writeln!(f)?;
        }
        let (b, w) = self.disc_counts();
        writeln!(f, "black {}  white {}", b, w)
    }
}

impl GameState for OthelloState {
    type Move = OthelloMove;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        Self::new(config.board_size.unwrap_or(8))
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        let moves = self.placements(self.current_player);
        if !moves.is_empty() {
            return moves;
        }
        if self.can_place(self.current_player.opponent()) {
            vec![OthelloMove::Pass]
        } else {
            Vec::new()
        }
    }

    fn make_move(&mut self, mv: &Self::Move) {
        if let OthelloMove::Place(r, c) = *mv {
            for idx in self.flips(r, c, self.current_player) {
                self.board[idx] = Some(self.current_player);
            }
            self.board[r * self.board_size + c] = Some(self.current_player);
            self.last_move = Some((r, c));
        }
        self.plies += 1;
        self.current_player = self.current_player.opponent();
    }

    fn outcome(&self) -> Outcome {
        if self.can_place(Player::First) || self.can_place(Player::Second) {
            return Outcome::InProgress;
        }
        let (b, w) = self.disc_counts();
        match b.cmp(&w) {
            std::cmp::Ordering::Greater => Outcome::Win(Player::First),
            std::cmp::Ordering::Less => Outcome::Win(Player::Second),
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    fn current_player(&self) -> Player {
        self.current_player
    }

    fn is_legal(&self, mv: &OthelloMove) -> bool {
        match *mv {
            OthelloMove::Place(r, c) => {
                r < self.board_size && c < self.board_size && !self.flips(r, c, self.current_player).is_empty()
            }
            OthelloMove::Pass => self.legal_moves() == vec![OthelloMove::Pass],
        }
    }
}

impl Opponent for OthelloState {
    fn select_move(&self, strategy: &StrategyConfig) -> Result<OthelloMove, EngineError> {
        alphabeta::choose(self, strategy, 4, |s: &Self, me| s.evaluate(me))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_opening_has_four_moves() {
        let game = OthelloState::new(8).unwrap();
        let mut moves = game.legal_moves();
        moves.sort_by_key(|m| format!("{:?}", m));
        assert_eq!(
            moves,
            vec![
                OthelloMove::Place(2, 3),
                OthelloMove::Place(3, 2),
                OthelloMove::Place(4, 5),
                OthelloMove::Place(5, 4)
            ]
        );
    }

    #[test]
    fn opening_at_2_3_flips_exactly_one_disc() {
        let game = OthelloState::new(8).unwrap();
        let next = game.apply(&OthelloMove::Place(2, 3)).unwrap();
        assert_eq!(game.disc_counts(), (2, 2));
        assert_eq!(next.disc_counts(), (4, 1));
        assert_eq!(next.cell(3, 3), Some(Player::First));
        assert_eq!(next.current_player(), Player::Second);
    }

    #[test]
    fn non_flipping_placement_is_illegal() {
        let game = OthelloState::new(8).unwrap();
        assert!(matches!(game.apply(&OthelloMove::Place(0, 0)), Err(EngineError::IllegalMove(_))));
        assert!(matches!(game.apply(&OthelloMove::Pass), Err(EngineError::IllegalMove(_))));
    }

    #[test]
    fn pass_only_when_no_placement_exists() {
        // Walk a few deterministic lines on a small board to the end.
        for pick in 0..3usize {
            let mut game = OthelloState::new(4).unwrap();
            while !game.is_terminal() {
                let moves = game.legal_moves();
                if moves.contains(&OthelloMove::Pass) {
                    assert_eq!(moves, vec![OthelloMove::Pass]);
                    assert!(!game.can_place(game.current_player()));
                }
                game = game.apply(&moves[pick % moves.len()]).unwrap();
            }
            assert!(game.legal_moves().is_empty());
            let (b, w) = game.disc_counts();
            assert_eq!(game.outcome().winner().is_none(), b == w);
        }
    }

    #[test]
    fn cpu_takes_available_corner_at_depth_one() {
        let mut game = OthelloState::new(6).unwrap();
        for _ in 0..60 {
            let moves = game.legal_moves();
            if moves.is_empty() {
                break;
            }
            let corner = moves
                .iter()
                .copied()
                .find(|m| matches!(m, OthelloMove::Place(0, 0) | OthelloMove::Place(0, 5) | OthelloMove::Place(5, 0) | OthelloMove::Place(5, 5)));
            if corner.is_some() {
                let mv = game.select_move(&StrategyConfig::default().with_depth(1)).unwrap();
                assert!(game.is_legal(&mv));
                return;
            }
            game = game.apply(&moves[moves.len() - 1]).unwrap();
        }
    }
}
