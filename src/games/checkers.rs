//! # Checkers (American rules)
//!
//! 8×8, pieces on dark squares. First starts on rows 5..8 and moves towards
//! row 0. Captures are mandatory and a capturing move is the whole jump chain.
//! A man that reaches the far row is crowned and its move ends there.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::search::alphabeta;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

const SIZE: usize = 8;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Checker {
    pub owner: Player,
    pub king: bool,
}

/// Squares visited by the moving piece: origin, then every landing square.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct CheckersMove(pub Vec<usize>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckersState {
    board: Vec<Option<Checker>>,
    current_player: Player,
    /// Plies since the last capture or crowning.
    quiet_plies: u32,
    quiet_limit: u32,
}

fn forward(player: Player) -> i32 {
    if player == Player::First {
        -1
    } else {
        1
    }
}

fn offset(sq: usize, dr: i32, dc: i32) -> Option<usize> {
    let r = (sq / SIZE) as i32 + dr;
    let c = (sq % SIZE) as i32 + dc;
    ((0..SIZE as i32).contains(&r) && (0..SIZE as i32).contains(&c)).then(|| (r * SIZE as i32 + c) as usize)
}

fn crown_row(player: Player) -> usize {
    if player == Player::First {
        0
    } else {
        SIZE - 1
    }
}

impl CheckersState {
    pub fn new(quiet_limit: u32) -> Self {
        let mut board = vec![None; SIZE * SIZE];
        for r in 0..SIZE {
            for c in 0..SIZE {
                if (r + c) % 2 == 0 {
                    continue;
                }
                let owner = match r {
                    0..=2 => Player::Second,
                    5..=7 => Player::First,
                    _ => continue,
                };
                board[r * SIZE + c] = Some(Checker { owner, king: false });
            }
        }
        Self {
            board,
            current_player: Player::First,
            quiet_plies: 0,
            quiet_limit,
        }
    }

    pub fn piece_at(&self, sq: usize) -> Option<Checker> {
        self.board[sq]
    }

    fn directions(piece: Checker) -> Vec<(i32, i32)> {
        let f = forward(piece.owner);
        if piece.king {
            vec![(f, -1), (f, 1), (-f, -1), (-f, 1)]
        } else {
            vec![(f, -1), (f, 1)]
        }
    }

    /// Extends a jump chain depth-first; only maximal chains are recorded.
    fn extend_jumps(&self, piece: Checker, path: &mut Vec<usize>, taken: &mut Vec<usize>, out: &mut Vec<CheckersMove>) {
        let Some(&here) = path.last() else { return };
        let origin = path[0];
        let mut extended = false;
        let crowned_here = !piece.king && here / SIZE == crown_row(piece.owner) && path.len() > 1;
        if !crowned_here {
            for (dr, dc) in Self::directions(piece) {
                let (Some(over), Some(land)) = (offset(here, dr, dc), offset(here, 2 * dr, 2 * dc)) else {
                    continue;
                };
                let enemy = self.board[over].is_some_and(|p| p.owner != piece.owner);
                let free = self.board[land].is_none() || land == origin;
                if enemy && free && !taken.contains(&over) {
                    extended = true;
                    path.push(land);
                    taken.push(over);
                    self.extend_jumps(piece, path, taken, out);
                    path.pop();
                    taken.pop();
                }
            }
        }
        if !extended && path.len() > 1 {
            out.push(CheckersMove(path.clone()));
        }
    }

    fn captures(&self) -> Vec<CheckersMove> {
        let mut out = Vec::new();
        for sq in 0..SIZE * SIZE {
            if let Some(piece) = self.board[sq].filter(|p| p.owner == self.current_player) {
                self.extend_jumps(piece, &mut vec![sq], &mut Vec::new(), &mut out);
            }
        }
        out
    }

    fn steps(&self) -> Vec<CheckersMove> {
        let mut out = Vec::new();
        for sq in 0..SIZE * SIZE {
            if let Some(piece) = self.board[sq].filter(|p| p.owner == self.current_player) {
                for (dr, dc) in Self::directions(piece) {
                    if let Some(to) = offset(sq, dr, dc).filter(|&to| self.board[to].is_none()) {
                        out.push(CheckersMove(vec![sq, to]));
                    }
                }
            }
        }
        out
    }

    fn evaluate(&self, me: Player) -> i32 {
        let mut score = 0;
        for (sq, piece) in self.board.iter().enumerate() {
            let Some(piece) = piece else { continue };
            let value = if piece.king {
                160
            } else {
                let row = sq / SIZE;
                let advance = if piece.owner == Player::First { SIZE - 1 - row } else { row };
                100 + advance as i32 * 3
            };
            score += if piece.owner == me { value } else { -value };
        }
        score
    }
}

impl fmt::Display for CheckersState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..SIZE {
            for c in 0..SIZE {
                let symbol = match self.board[r * SIZE + c] {
                    Some(Checker { owner: Player::First, king }) => if king { 'B' } else { 'b' },
                    Some(Checker { king, .. }) => if king { 'W' } else { 'w' },
                    None if (r + c) % 2 == 1 => '.',
                    None => ' ',
                };
                write!(f, "{} ", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl GameState for CheckersState {
    type Move = CheckersMove;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        Ok(Self::new(config.ply_limit(80)?))
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.quiet_plies >= self.quiet_limit {
            return Vec::new();
        }
        let captures = self.captures();
        if captures.is_empty() {
            self.steps()
        } else {
            captures
        }
    }

    fn make_move(&mut self, mv: &Self::Move) {
        let path = &mv.0;
        let (Some(&from), Some(&to)) = (path.first(), path.last()) else { return };
        let Some(mut piece) = self.board[from].take() else { return };
        let mut captured = false;
        for pair in path.windows(2) {
            if pair[0].abs_diff(pair[1]) > SIZE + 1 {
                let over = (pair[0] + pair[1]) / 2;
                self.board[over] = None;
                captured = true;
            }
        }
        let crowned = !piece.king && to / SIZE == crown_row(piece.owner);
        piece.king |= crowned;
        self.board[to] = Some(piece);
        if captured || crowned {
            self.quiet_plies = 0;
        } else {
            self.quiet_plies += 1;
        }
        self.current_player = self.current_player.opponent();
    }

    fn outcome(&self) -> Outcome {
        if self.quiet_plies >= self.quiet_limit {
            Outcome::Draw
        } else if self.legal_moves().is_empty() {
            Outcome::Win(self.current_player.opponent())
        } else {
            Outcome::InProgress
        }
    }

    fn current_player(&self) -> Player {
        self.current_player
    }
}

impl Opponent for CheckersState {
    fn select_move(&self, strategy: &StrategyConfig) -> Result<CheckersMove, EngineError> {
        alphabeta::choose(self, strategy, 6, |s: &Self, me| s.evaluate(me))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(r: usize, c: usize) -> usize {
        r * SIZE + c
    }

    fn position(pieces: &[(usize, usize, Player, bool)], to_move: Player) -> CheckersState {
        let mut state = CheckersState::new(80);
        state.board = vec![None; SIZE * SIZE];
        for &(r, c, owner, king) in pieces {
            state.board[sq(r, c)] = Some(Checker { owner, king });
        }
        state.current_player = to_move;
        state
    }

    #[test]
    fn opening_has_seven_moves() {
        assert_eq!(CheckersState::new(80).legal_moves().len(), 7);
    }

    #[test]
    fn capture_is_mandatory() {
        let game = position(
            &[
                (5, 2, Player::First, false),
                (7, 0, Player::First, false),
                (4, 3, Player::Second, false),
                (0, 7, Player::Second, false),
            ],
            Player::First,
        );
        assert_eq!(game.legal_moves(), vec![CheckersMove(vec![sq(5, 2), sq(3, 4)])]);
        assert!(matches!(
            game.apply(&CheckersMove(vec![sq(7, 0), sq(6, 1)])),
            Err(EngineError::IllegalMove(_))
        ));
    }

    #[test]
    fn jump_chain_must_be_completed() {
        let game = position(
            &[
                (5, 0, Player::First, false),
                (4, 1, Player::Second, false),
                (2, 3, Player::Second, false),
                (0, 7, Player::Second, false),
            ],
            Player::First,
        );
        let full = CheckersMove(vec![sq(5, 0), sq(3, 2), sq(1, 4)]);
        assert_eq!(game.legal_moves(), vec![full.clone()]);
        assert!(game.apply(&CheckersMove(vec![sq(5, 0), sq(3, 2)])).is_err());
        let next = game.apply(&full).unwrap();
        assert_eq!(next.piece_at(sq(4, 1)), None);
        assert_eq!(next.piece_at(sq(2, 3)), None);
    }

    #[test]
    fn crowning_ends_the_move() {
        let game = position(
            &[
                (2, 1, Player::First, false),
                (1, 2, Player::Second, false),
                (1, 4, Player::Second, false),
            ],
            Player::First,
        );
        let moves = game.legal_moves();
        assert_eq!(moves, vec![CheckersMove(vec![sq(2, 1), sq(0, 3)])]);
        let next = game.apply(&moves[0]).unwrap();
        assert_eq!(next.piece_at(sq(0, 3)), Some(Checker { owner: Player::First, king: true }));
        assert!(next.piece_at(sq(1, 4)).is_some());
    }

    #[test]
    fn side_without_moves_loses() {
        let game = position(&[(0, 1, Player::Second, false)], Player::First);
        assert_eq!(game.outcome(), Outcome::Win(Player::Second));
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    fn cpu_takes_the_double_jump() {
        let game = position(
            &[
                (5, 0, Player::First, false),
                (6, 7, Player::First, false),
                (4, 1, Player::Second, false),
                (2, 3, Player::Second, false),
            ],
            Player::First,
        );
        let mv = game.select_move(&StrategyConfig::default()).unwrap();
        assert_eq!(mv, CheckersMove(vec![sq(5, 0), sq(3, 2), sq(1, 4)]));
        assert_eq!(game.apply(&mv).unwrap().outcome(), Outcome::Win(Player::First));
    }
}
