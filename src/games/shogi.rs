//! # Shogi
//!
//! 9×9, full piece set. Captured pieces change sides and go to the captor's
//! hand, from where they can be dropped back on the board.
//!
//! ## Rules enforced
//! - Promotion in the farthest three ranks, optional unless the piece would
//!   be left with no further move (pawn/lance on the last rank, knight on the
//!   last two)
//! - Drops: no second unpromoted pawn in a file (nifu), no dead drops, no
//!   checkmate delivered by a pawn drop
//! - A move may not leave the mover's king attacked
//! - The side with no legal move loses; the ply limit draws
//!
//! Squares are `row * 9 + col` with row 0 on Second's side. First (sente)
//! moves towards row 0. `GameConfig::variant` may hold an SFEN position.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::search::alphabeta;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const START_SFEN: &str = "lnsgkgsnl/1r5b1/ppppppppp/9/9/9/PPPPPPPPP/1B5R1/LNSGKGSNL b - 1";

/// Kinds that can be held in hand, in hand-array order.
const HAND_KINDS: [ShogiKind; 7] = [
    ShogiKind::Rook,
    ShogiKind::Bishop,
    ShogiKind::Gold,
    ShogiKind::Silver,
    ShogiKind::Knight,
    ShogiKind::Lance,
    ShogiKind::Pawn,
];

/// How many of each hand kind exist in a full set.
const HAND_LIMITS: [u8; 7] = [2, 2, 4, 4, 4, 4, 18];

// Steps as (forward, sideways) from the owner's point of view.
const KING_STEPS: [(i32, i32); 8] = [(1, -1), (1, 0), (1, 1), (0, -1), (0, 1), (-1, -1), (-1, 0), (-1, 1)];
const GOLD_STEPS: [(i32, i32); 6] = [(1, -1), (1, 0), (1, 1), (0, -1), (0, 1), (-1, 0)];
const SILVER_STEPS: [(i32, i32); 5] = [(1, -1), (1, 0), (1, 1), (-1, -1), (-1, 1)];
const KNIGHT_STEPS: [(i32, i32); 2] = [(2, -1), (2, 1)];
const ORTHOGONAL: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ShogiKind {
    King,
    Rook,
    Bishop,
    Gold,
    Silver,
    Knight,
    Lance,
    Pawn,
}

impl ShogiKind {
    fn can_promote(self) -> bool {
        !matches!(self, ShogiKind::King | ShogiKind::Gold)
    }

    fn hand_index(self) -> Option<usize> {
        HAND_KINDS.iter().position(|&k| k == self)
    }

    fn letter(self) -> char {
        match self {
            ShogiKind::King => 'k',
            ShogiKind::Rook => 'r',
            ShogiKind::Bishop => 'b',
            ShogiKind::Gold => 'g',
            ShogiKind::Silver => 's',
            ShogiKind::Knight => 'n',
            ShogiKind::Lance => 'l',
            ShogiKind::Pawn => 'p',
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'k' => Some(ShogiKind::King),
            'r' => Some(ShogiKind::Rook),
            'b' => Some(ShogiKind::Bishop),
            'g' => Some(ShogiKind::Gold),
            's' => Some(ShogiKind::Silver),
            'n' => Some(ShogiKind::Knight),
            'l' => Some(ShogiKind::Lance),
            'p' => Some(ShogiKind::Pawn),
            _ => None,
        }
    }

    fn value(self, promoted: bool) -> i32 {
        match (self, promoted) {
            (ShogiKind::King, _) => 0,
            (ShogiKind::Rook, false) => 1000,
            (ShogiKind::Rook, true) => 1300,
            (ShogiKind::Bishop, false) => 800,
            (ShogiKind::Bishop, true) => 1100,
            (ShogiKind::Gold, _) => 550,
            (ShogiKind::Silver, false) => 500,
            (ShogiKind::Knight, false) => 350,
            (ShogiKind::Lance, false) => 300,
            (ShogiKind::Pawn, false) => 100,
            (_, true) => 550,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ShogiPiece {
    pub kind: ShogiKind,
    pub owner: Player,
    pub promoted: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ShogiMove {
    Board { from: usize, to: usize, promote: bool },
    Drop { kind: ShogiKind, to: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShogiState {
    board: Vec<Option<ShogiPiece>>,
    /// Pieces in hand per player, indexed like `HAND_KINDS`.
    hands: [[u8; 7]; 2],
    current_player: Player,
    plies: u32,
    max_plies: u32,
}

fn step(sq: usize, owner: Player, forward: i32, side: i32) -> Option<usize> {
    let dr = if owner == Player::First { -forward } else { forward };
    let row = (sq / 9) as i32 + dr;
    let col = (sq % 9) as i32 + side;
    ((0..9).contains(&row) && (0..9).contains(&col)).then(|| (row * 9 + col) as usize)
}

/// Row counted from the owner's far edge: 0 is the last rank for that player.
fn relative_row(sq: usize, owner: Player) -> usize {
    if owner == Player::First {
        sq / 9
    } else {
        8 - sq / 9
    }
}

fn must_promote(kind: ShogiKind, owner: Player, to: usize) -> bool {
    let row = relative_row(to, owner);
    match kind {
        ShogiKind::Pawn | ShogiKind::Lance => row == 0,
        ShogiKind::Knight => row <= 1,
        _ => false,
    }
}

impl ShogiState {
    /// Parses an SFEN position (`board side hands [move]`).
    pub fn from_sfen(sfen: &str, max_plies: u32) -> Result<Self, EngineError> {
        let bad = |what: &str| EngineError::config(format!("bad SFEN {}: '{}'", what, sfen));
        let fields: Vec<&str> = sfen.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(bad("field count"));
        }
        let rows: Vec<&str> = fields[0].split('/').collect();
        if rows.len() != 9 {
            return Err(bad("rank count"));
        }
        let mut board = vec![None; 81];
        for (row, text) in rows.iter().enumerate() {
            let mut col = 0usize;
            let mut promoted = false;
            for c in text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    col += skip as usize;
                    continue;
                }
                if c == '+' {
                    promoted = true;
                    continue;
                }
                let kind = ShogiKind::from_letter(c).ok_or_else(|| bad("piece"))?;
                if col >= 9 {
                    return Err(bad("rank length"));
                }
                let owner = if c.is_ascii_uppercase() { Player::First } else { Player::Second };
                board[row * 9 + col] = Some(ShogiPiece { kind, owner, promoted });
                promoted = false;
                col += 1;
            }
            if col != 9 {
                return Err(bad("rank length"));
            }
        }
        let current_player = match fields[1] {
            "b" => Player::First,
            "w" => Player::Second,
            _ => return Err(bad("side to move")),
        };
        let mut hands = [[0u8; 7]; 2];
        if fields[2] != "-" {
            let mut count = 0u8;
            for c in fields[2].chars() {
                if let Some(d) = c.to_digit(10) {
                    count = count
                        .checked_mul(10)
                        .and_then(|n| n.checked_add(d as u8))
                        .ok_or_else(|| bad("hand"))?;
                    continue;
                }
                let kind = ShogiKind::from_letter(c).ok_or_else(|| bad("hand"))?;
                let slot = kind.hand_index().ok_or_else(|| bad("hand"))?;
                let owner = if c.is_ascii_uppercase() { 0 } else { 1 };
                let held = hands[owner][slot]
                    .checked_add(count.max(1))
                    .filter(|&n| n <= HAND_LIMITS[slot])
                    .ok_or_else(|| bad("hand"))?;
                hands[owner][slot] = held;
                count = 0;
            }
        }
        for player in [Player::First, Player::Second] {
            let kings = board
                .iter()
                .flatten()
                .filter(|p| p.kind == ShogiKind::King && p.owner == player)
                .count();
            if kings != 1 {
                return Err(bad("king count"));
            }
        }
        Ok(Self {
            board,
            hands,
            current_player,
            plies: 0,
            max_plies,
        })
    }

    pub fn piece_at(&self, sq: usize) -> Option<ShogiPiece> {
        self.board[sq]
    }

    /// Pieces of `kind` that `player` holds in hand.
    pub fn in_hand(&self, player: Player, kind: ShogiKind) -> u8 {
        kind.hand_index().map_or(0, |i| self.hands[player.index()][i])
    }

    /// Squares the piece on `sq` attacks, including ones held by its own side.
    fn reach(&self, sq: usize, piece: ShogiPiece) -> Vec<usize> {
        let owner = piece.owner;
        let mut out = Vec::new();
        let steps = |dirs: &[(i32, i32)], out: &mut Vec<usize>| {
            out.extend(dirs.iter().filter_map(|&(f, s)| step(sq, owner, f, s)));
        };
        let slides = |dirs: &[(i32, i32)], out: &mut Vec<usize>| {
            for &(f, s) in dirs {
                let mut cur = sq;
                while let Some(next) = step(cur, owner, f, s) {
                    out.push(next);
                    if self.board[next].is_some() {
                        break;
                    }
                    cur = next;
                }
            }
        };
        match (piece.kind, piece.promoted) {
            (ShogiKind::King, _) => steps(&KING_STEPS, &mut out),
            (ShogiKind::Rook, promoted) => {
                slides(&ORTHOGONAL, &mut out);
                if promoted {
                    steps(&DIAGONAL, &mut out);
                }
            }
            (ShogiKind::Bishop, promoted) => {
                slides(&DIAGONAL, &mut out);
                if promoted {
                    steps(&ORTHOGONAL, &mut out);
                }
            }
            (ShogiKind::Gold, _) | (_, true) => steps(&GOLD_STEPS, &mut out),
            (ShogiKind::Silver, false) => steps(&SILVER_STEPS, &mut out),
            (ShogiKind::Knight, false) => steps(&KNIGHT_STEPS, &mut out),
            (ShogiKind::Lance, false) => slides(&[(1, 0)], &mut out),
            (ShogiKind::Pawn, false) => steps(&[(1, 0)], &mut out),
        }
        out
    }

    pub fn is_attacked(&self, sq: usize, by: Player) -> bool {
        self.board.iter().enumerate().any(|(from, piece)| match piece {
            Some(p) if p.owner == by => self.reach(from, *p).contains(&sq),
            _ => false,
        })
    }

    pub fn in_check(&self, player: Player) -> bool {
        self.board
            .iter()
            .position(|p| p.is_some_and(|p| p.kind == ShogiKind::King && p.owner == player))
            .is_some_and(|k| self.is_attacked(k, player.opponent()))
    }

    fn pseudo_moves(&self, check_drop_mate: bool) -> Vec<ShogiMove> {
        let me = self.current_player;
        let mut moves = Vec::new();
        for from in 0..81 {
            let Some(piece) = self.board[from] else { continue };
            if piece.owner != me {
                continue;
            }
            for to in self.reach(from, piece) {
                if self.board[to].is_some_and(|p| p.owner == me) {
                    continue;
                }
                let zone = relative_row(from, me) <= 2 || relative_row(to, me) <= 2;
                if piece.kind.can_promote() && !piece.promoted && zone {
                    moves.push(ShogiMove::Board { from, to, promote: true });
                    if must_promote(piece.kind, me, to) {
                        continue;
                    }
                }
                moves.push(ShogiMove::Board { from, to, promote: false });
            }
        }
        for (slot, &kind) in HAND_KINDS.iter().enumerate() {
            if self.hands[me.index()][slot] == 0 {
                continue;
            }
            for to in 0..81 {
                if self.board[to].is_some() || must_promote(kind, me, to) {
                    continue;
                }
                if kind == ShogiKind::Pawn {
                    if self.has_unpromoted_pawn_in_file(me, to % 9) {
                        continue;
                    }
                    if check_drop_mate && self.pawn_drop_mates(to) {
                        continue;
                    }
                }
                moves.push(ShogiMove::Drop { kind, to });
            }
        }
        moves
    }

    fn has_unpromoted_pawn_in_file(&self, player: Player, col: usize) -> bool {
        (0..9).any(|row| {
            self.board[row * 9 + col]
                .is_some_and(|p| p.owner == player && p.kind == ShogiKind::Pawn && !p.promoted)
        })
    }

    fn pawn_drop_mates(&self, to: usize) -> bool {
        let mut next = self.clone();
        next.make_move(&ShogiMove::Drop { kind: ShogiKind::Pawn, to });
        next.in_check(next.current_player) && !next.has_legal_move(false)
    }

    fn leaves_king_safe(&self, mv: &ShogiMove) -> bool {
        let mut next = self.clone();
        next.make_move(mv);
        !next.in_check(self.current_player)
    }

    fn has_legal_move(&self, check_drop_mate: bool) -> bool {
        self.pseudo_moves(check_drop_mate)
            .iter()
            .any(|mv| self.leaves_king_safe(mv))
    }

    fn evaluate(&self, me: Player) -> i32 {
        let mut score = 0;
        for piece in self.board.iter().flatten() {
            let value = piece.kind.value(piece.promoted);
            score += if piece.owner == me { value } else { -value };
        }
        for (slot, &kind) in HAND_KINDS.iter().enumerate() {
            let value = kind.value(false) * 11 / 10;
            score += value * self.hands[me.index()][slot] as i32;
            score -= value * self.hands[me.opponent().index()][slot] as i32;
        }
        score
    }
}

impl fmt::Display for ShogiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hand = |player: Player| -> String {
            HAND_KINDS
                .iter()
                .enumerate()
                .filter(|(slot, _)| self.hands[player.index()][*slot] > 0)
                .map(|(slot, kind)| format!("{}{}", kind.letter(), self.hands[player.index()][slot]))
                .collect::<Vec<_>>()
                .join(" ")
        };
        writeln!(f, "second hand: {}", hand(Player::Second))?;
        for row in 0..9 {
            for col in 0..9 {
                match self.board[row * 9 + col] {
                    Some(p) => {
                        let letter = if p.owner == Player::First {
                            p.kind.letter().to_ascii_uppercase()
                        } else {
                            p.kind.letter()
                        };
                        write!(f, "{}{}", if p.promoted { '+' } else { ' ' }, letter)?;
                    }
                    None => write!(f, " .")?,
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "first hand: {}", hand(Player::First))
    }
}

impl GameState for ShogiState {
    type Move = ShogiMove;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        let max_plies = config.ply_limit(500)?;
        match config.variant.as_deref() {
            None | Some("standard") => Self::from_sfen(START_SFEN, max_plies),
            Some(sfen) => Self::from_sfen(sfen, max_plies),
        }
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.plies >= self.max_plies {
            return Vec::new();
        }
        self.pseudo_moves(true)
            .into_iter()
            .filter(|mv| self.leaves_king_safe(mv))
            .collect()
    }

    fn make_move(&mut self, mv: &Self::Move) {
        let me = self.current_player;
        match *mv {
            ShogiMove::Board { from, to, promote } => {
                let Some(mut piece) = self.board[from].take() else { return };
                if let Some(captured) = self.board[to] {
                    if let Some(slot) = captured.kind.hand_index() {
                        self.hands[me.index()][slot] += 1;
                    }
                }
                piece.promoted |= promote;
                self.board[to] = Some(piece);
            }
            ShogiMove::Drop { kind, to } => {
                if let Some(slot) = kind.hand_index() {
                    self.hands[me.index()][slot] = self.hands[me.index()][slot].saturating_sub(1);
                }
                self.board[to] = Some(ShogiPiece {
                    kind,
                    owner: me,
                    promoted: false,
                });
            }
        }
        self.plies += 1;
        self.current_player = me.opponent();
    }

    fn outcome(&self) -> Outcome {
        if self.plies >= self.max_plies {
            Outcome::Draw
        } else if self.has_legal_move(true) {
            Outcome::InProgress
        } else {
            Outcome::Win(self.current_player.opponent())
        }
    }

    fn current_player(&self) -> Player {
        self.current_player
    }
}

impl Opponent for ShogiState {
    fn select_move(&self, strategy: &StrategyConfig) -> Result<ShogiMove, EngineError> {
        alphabeta::choose(self, strategy, 2, |s: &Self, me| s.evaluate(me))
    }
}
