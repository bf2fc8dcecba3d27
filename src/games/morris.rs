//! # Nine Men's Morris
//!
//! Three concentric squares of eight points, joined at the midpoints.
//! Points are numbered `ring * 8 + j`, ring 0 outermost, `j` running
//! clockwise from the top-left corner (even `j` are corners).
//!
//! Play goes through placing (nine pieces each), then sliding to adjacent
//! points, then flying anywhere once a player is down to three. Closing a
//! mill removes an opponent piece; the removal is part of the same move.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::search::alphabeta;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

const POINTS: usize = 24;
const PIECES_EACH: u8 = 9;

/// Placement when `from` is `None`; `remove` is set exactly when a mill closes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct MorrisMove {
    pub from: Option<usize>,
    pub to: usize,
    pub remove: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorrisState {
    board: Vec<Option<Player>>,
    in_hand: [u8; 2],
    current_player: Player,
    /// Plies since the last mill.
    quiet_plies: u32,
    quiet_limit: u32,
}

fn mills() -> Vec<[usize; 3]> {
    let mut out = Vec::with_capacity(16);
    for ring in 0..3 {
        for j in [0, 2, 4, 6] {
            out.push([ring * 8 + j, ring * 8 + j + 1, ring * 8 + (j + 2) % 8]);
        }
    }
    for j in [1, 3, 5, 7] {
        out.push([j, 8 + j, 16 + j]);
    }
    out
}

fn neighbours(point: usize) -> Vec<usize> {
    let (ring, j) = (point / 8, point % 8);
    let mut out = vec![ring * 8 + (j + 1) % 8, ring * 8 + (j + 7) % 8];
    if j % 2 == 1 {
        if ring > 0 {
            out.push(point - 8);
        }
        if ring < 2 {
            out.push(point + 8);
        }
    }
    out
}

impl MorrisState {
    pub fn new(quiet_limit: u32) -> Self {
        Self {
            board: vec![None; POINTS],
            in_hand: [PIECES_EACH; 2],
            current_player: Player::First,
            quiet_plies: 0,
            quiet_limit,
        }
    }

    pub fn point(&self, p: usize) -> Option<Player> {
        self.board[p]
    }

    pub fn on_board(&self, player: Player) -> usize {
        self.board.iter().filter(|&&c| c == Some(player)).count()
    }

    fn total(&self, player: Player) -> usize {
        self.on_board(player) + self.in_hand[player.index()] as usize
    }

    fn in_mill(board: &[Option<Player>], point: usize) -> bool {
        let Some(owner) = board[point] else { return false };
        mills()
            .iter()
            .any(|m| m.contains(&point) && m.iter().all(|&p| board[p] == Some(owner)))
    }

    fn removable(&self, board: &[Option<Player>], victim: Player) -> Vec<usize> {
        let theirs: Vec<usize> = (0..POINTS).filter(|&p| board[p] == Some(victim)).collect();
        let loose: Vec<usize> = theirs.iter().copied().filter(|&p| !Self::in_mill(board, p)).collect();
        if loose.is_empty() {
            theirs
        } else {
            loose
        }
    }

    /// Expands a piece movement into one move per possible removal.
    fn with_removals(&self, from: Option<usize>, to: usize, out: &mut Vec<MorrisMove>) {
        let me = self.current_player;
        let mut board = self.board.clone();
        if let Some(f) = from {
            board[f] = None;
        }
        board[to] = Some(me);
        if Self::in_mill(&board, to) {
            let victims = self.removable(&board, me.opponent());
            if !victims.is_empty() {
                for victim in victims {
                    out.push(MorrisMove { from, to, remove: Some(victim) });
                }
                return;
            }
        }
        out.push(MorrisMove { from, to, remove: None });
    }

    fn generate(&self) -> Vec<MorrisMove> {
        let me = self.current_player;
        let mut out = Vec::new();
        let empty: Vec<usize> = (0..POINTS).filter(|&p| self.board[p].is_none()).collect();
        if self.in_hand[me.index()] > 0 {
            for &to in &empty {
                self.with_removals(None, to, &mut out);
            }
            return out;
        }
        let flying = self.on_board(me) == 3;
        for from in (0..POINTS).filter(|&p| self.board[p] == Some(me)) {
            let targets = if flying {
                empty.clone()
            } else {
                neighbours(from).into_iter().filter(|&p| self.board[p].is_none()).collect()
            };
            for to in targets {
                self.with_removals(Some(from), to, &mut out);
            }
        }
        out
    }

    fn lost(&self, player: Player) -> bool {
        self.total(player) < 3
    }

    fn evaluate(&self, me: Player) -> i32 {
        let material = self.total(me) as i32 - self.total(me.opponent()) as i32;
        let mills_of = |p: Player| {
            mills()
                .iter()
                .filter(|m| m.iter().all(|&q| self.board[q] == Some(p)))
                .count() as i32
        };
        material * 100 + (mills_of(me) - mills_of(me.opponent())) * 20
    }
}

impl fmt::Display for MorrisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = |p: usize| match self.board[p] {
            Some(Player::First) => 'X',
            Some(_) => 'O',
            None => '.',
        };
        writeln!(f, "{}-----{}-----{}", s(0), s(1), s(2))?;
        writeln!(f, "| {}---{}---{} |", s(8), s(9), s(10))?;
        writeln!(f, "| | {}-{}-{} | |", s(16), s(17), s(18))?;
        writeln!(f, "{}-{}-{}   {}-{}-{}", s(7), s(15), s(23), s(19), s(11), s(3))?;
        writeln!(f, "| | {}-{}-{} | |", s(22), s(21), s(20))?;
        writeln!(f, "| {}---{}---{} |", s(14), s(13), s(12))?;
        writeln!(f, "{}-----{}-----{}", s(6), s(5), s(4))?;
        writeln!(f, "in hand: X {}  O {}", self.in_hand[0], self.in_hand[1])
    }
}

impl GameState for MorrisState {
    type Move = MorrisMove;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        Ok(Self::new(config.ply_limit(100)?))
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.quiet_plies >= self.quiet_limit || self.lost(self.current_player) {
            return Vec::new();
        }
        self.generate()
    }

    fn make_move(&mut self, mv: &Self::Move) {
        let me = self.current_player;
        match mv.from {
            Some(from) => self.board[from] = None,
            None => self.in_hand[me.index()] = self.in_hand[me.index()].saturating_sub(1),
        }
        self.board[mv.to] = Some(me);
        if let Some(victim) = mv.remove {
            self.board[victim] = None;
            self.quiet_plies = 0;
        } else {
            self.quiet_plies += 1;
        }
        self.current_player = me.opponent();
    }

    fn outcome(&self) -> Outcome {
        let me = self.current_player;
        if self.lost(me) {
            Outcome::Win(me.opponent())
        } else if self.quiet_plies >= self.quiet_limit {
            Outcome::Draw
        } else if self.generate().is_empty() {
            Outcome::Win(me.opponent())
        } else {
            Outcome::InProgress
        }
    }

    fn current_player(&self) -> Player {
        self.current_player
    }
}

impl Opponent for MorrisState {
    fn select_move(&self, strategy: &StrategyConfig) -> Result<MorrisMove, EngineError> {
        alphabeta::choose(self, strategy, 4, |s: &Self, me| s.evaluate(me))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(game: &mut MorrisState, to: usize) {
        *game = game.apply(&MorrisMove { from: None, to, remove: None }).unwrap();
    }

    #[test]
    fn board_geometry() {
        assert_eq!(mills().len(), 16);
        let degree: usize = (0..POINTS).map(|p| neighbours(p).len()).sum();
        assert_eq!(degree, 64);
        assert_eq!(MorrisState::new(100).legal_moves().len(), 24);
    }

    #[test]
    fn closing_a_mill_removes_a_loose_piece() {
        let mut game = MorrisState::new(100);
        // First builds 0-1 on the outer top row; Second scatters two corners.
        for to in [0, 8, 1, 16] {
            place(&mut game, to);
        }
        // Second's 8 and 16 are not a mill; both are removable.
        let moves = game.legal_moves();
        let closing: Vec<_> = moves.iter().filter(|m| m.to == 2).collect();
        assert_eq!(closing.len(), 2);
        assert!(closing.iter().all(|m| matches!(m.remove, Some(8) | Some(16))));
        assert!(!game.is_legal(&MorrisMove { from: None, to: 2, remove: None }));

        let next = game.apply(&MorrisMove { from: None, to: 2, remove: Some(8) }).unwrap();
        assert_eq!(next.point(8), None);
        assert_eq!(next.on_board(Player::Second), 1);
    }

    #[test]
    fn pieces_in_a_mill_are_protected() {
        let mut game = MorrisState::new(100);
        game.board[8] = Some(Player::Second);
        game.board[9] = Some(Player::Second);
        game.board[10] = Some(Player::Second);
        game.board[20] = Some(Player::Second);
        game.board[0] = Some(Player::First);
        game.board[1] = Some(Player::First);
        let removals: Vec<usize> = game
            .legal_moves()
            .iter()
            .filter(|m| m.to == 2)
            .filter_map(|m| m.remove)
            .collect();
        assert_eq!(removals, vec![20]);
    }

    #[test]
    fn three_pieces_fly_and_two_lose() {
        let mut game = MorrisState::new(100);
        game.in_hand = [0, 0];
        for p in [0, 12, 21] {
            game.board[p] = Some(Player::First);
        }
        for p in [5, 6, 7, 15] {
            game.board[p] = Some(Player::Second);
        }
        // Flying: every empty point is reachable from every piece.
        let empty = POINTS - 7;
        assert!(game.legal_moves().len() >= 3 * empty);

        game.board[21] = None;
        assert_eq!(game.outcome(), Outcome::Win(Player::Second));
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    fn cpu_closes_a_mill() {
        let mut game = MorrisState::new(100);
        for to in [0, 8, 1, 17] {
            place(&mut game, to);
        }
        let mv = game.select_move(&StrategyConfig::default().with_depth(1)).unwrap();
        assert_eq!(mv.to, 2);
        assert!(mv.remove.is_some());
    }
}
