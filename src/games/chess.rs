//! # Chess
//!
//! Full FIDE movement with castling, en passant and promotion. Legality is
//! checked by playing the move on a copy and re-scanning for attacks on the
//! mover's king, which is slow but leaves nothing to incremental bookkeeping.
//!
//! Squares are numbered `rank * 8 + file` with a1 = 0 and h8 = 63. White is
//! `Player::First`. A `GameConfig::variant` holding a FEN string sets up a
//! custom position.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::search::alphabeta;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

const KNIGHT_JUMPS: [(i32, i32); 8] = [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)];
const KING_STEPS: [(i32, i32); 8] = [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)];
const ORTHOGONAL: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    fn value(self) -> i32 {
        match self {
            PieceKind::Pawn => 100,
            PieceKind::Knight => 320,
            PieceKind::Bishop => 330,
            PieceKind::Rook => 500,
            PieceKind::Queen => 900,
            PieceKind::King => 0,
        }
    }

    fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub owner: Player,
}

/// A move from one square to another. Castling is the king's two-square move.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ChessMove {
    pub from: usize,
    pub to: usize,
    pub promotion: Option<PieceKind>,
}

impl ChessMove {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to, promotion: None }
    }

    /// Parses coordinate notation such as `e2e4` or `e7e8q`.
    pub fn parse(text: &str) -> Option<Self> {
        let bytes = text.trim().as_bytes();
        if bytes.len() != 4 && bytes.len() != 5 {
            return None;
        }
        let square = |f: u8, r: u8| -> Option<usize> {
            let file = f.checked_sub(b'a').filter(|&v| v < 8)?;
            let rank = r.checked_sub(b'1').filter(|&v| v < 8)?;
            Some(rank as usize * 8 + file as usize)
        };
        let promotion = match bytes.get(4) {
            Some(&c) => Some(PieceKind::from_letter(c as char)?),
            None => None,
        };
        Some(Self {
            from: square(bytes[0], bytes[1])?,
            to: square(bytes[2], bytes[3])?,
            promotion,
        })
    }
}

impl fmt::Display for ChessMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |sq: usize| format!("{}{}", (b'a' + (sq % 8) as u8) as char, sq / 8 + 1);
        write!(f, "{}{}", name(self.from), name(self.to))?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white_king_side: bool,
    pub white_queen_side: bool,
    pub black_king_side: bool,
    pub black_queen_side: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessState {
    board: Vec<Option<Piece>>,
    current_player: Player,
    castling: CastlingRights,
    /// Square a pawn skipped over on the previous move.
    en_passant: Option<usize>,
    /// Plies since the last capture or pawn move.
    halfmove_clock: u32,
    plies: u32,
    max_plies: u32,
}

fn offset(sq: usize, df: i32, dr: i32) -> Option<usize> {
    let file = (sq % 8) as i32 + df;
    let rank = (sq / 8) as i32 + dr;
    ((0..8).contains(&file) && (0..8).contains(&rank)).then(|| (rank * 8 + file) as usize)
}

fn forward(player: Player) -> i32 {
    if player == Player::First {
        1
    } else {
        -1
    }
}

impl ChessState {
    /// Parses a position in Forsyth-Edwards Notation.
    pub fn from_fen(fen: &str, max_plies: u32) -> Result<Self, EngineError> {
        let bad = |what: &str| EngineError::config(format!("bad FEN {}: '{}'", what, fen));
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(bad("field count"));
        }
        let mut board = vec![None; 64];
        let rows: Vec<&str> = fields[0].split('/').collect();
        if rows.len() != 8 {
            return Err(bad("rank count"));
        }
        for (i, row) in rows.iter().enumerate() {
            let rank = 7 - i;
            let mut file = 0usize;
            for c in row.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as usize;
                    continue;
                }
                let kind = PieceKind::from_letter(c).ok_or_else(|| bad("piece"))?;
                if file >= 8 {
                    return Err(bad("rank length"));
                }
                let owner = if c.is_ascii_uppercase() { Player::First } else { Player::Second };
                board[rank * 8 + file] = Some(Piece { kind, owner });
                file += 1;
            }
            if file != 8 {
                return Err(bad("rank length"));
            }
        }
        let current_player = match fields[1] {
            "w" => Player::First,
            "b" => Player::Second,
            _ => return Err(bad("side to move")),
        };
        let castling = CastlingRights {
            white_king_side: fields[2].contains('K'),
            white_queen_side: fields[2].contains('Q'),
            black_king_side: fields[2].contains('k'),
            black_queen_side: fields[2].contains('q'),
        };
        let en_passant = match fields[3] {
            "-" => None,
            square => Some(ChessMove::parse(&format!("{}{}", square, square)).ok_or_else(|| bad("en passant"))?.from),
        };
        let halfmove_clock = match fields.get(4) {
            Some(clock) => clock.parse().map_err(|_| bad("halfmove clock"))?,
            None => 0,
        };
        let state = Self {
            board,
            current_player,
            castling,
            en_passant,
            halfmove_clock,
            plies: 0,
            max_plies,
        };
        for player in [Player::First, Player::Second] {
            let kings = state
                .board
                .iter()
                .filter(|p| **p == Some(Piece { kind: PieceKind::King, owner: player }))
                .count();
            if kings != 1 {
                return Err(bad("king count"));
            }
        }
        Ok(state)
    }

    pub fn piece_at(&self, sq: usize) -> Option<Piece> {
        self.board[sq]
    }

    fn king_square(&self, player: Player) -> Option<usize> {
        self.board
            .iter()
            .position(|p| *p == Some(Piece { kind: PieceKind::King, owner: player }))
    }

    /// Whether `by` attacks `sq` on the current board.
    pub fn is_attacked(&self, sq: usize, by: Player) -> bool {
        let holds = |s: Option<usize>, kinds: &[PieceKind]| {
            s.and_then(|s| self.board[s])
                .is_some_and(|p| p.owner == by && kinds.contains(&p.kind))
        };
        let dr = -forward(by);
        if holds(offset(sq, -1, dr), &[PieceKind::Pawn]) || holds(offset(sq, 1, dr), &[PieceKind::Pawn]) {
            return true;
        }
        if KNIGHT_JUMPS.iter().any(|&(df, dr)| holds(offset(sq, df, dr), &[PieceKind::Knight])) {
            return true;
        }
        if KING_STEPS.iter().any(|&(df, dr)| holds(offset(sq, df, dr), &[PieceKind::King])) {
            return true;
        }
        let ray_hits = |dirs: &[(i32, i32)], kinds: &[PieceKind]| {
            dirs.iter().any(|&(df, dr)| {
                let mut cur = sq;
                while let Some(next) = offset(cur, df, dr) {
                    if let Some(p) = self.board[next] {
                        return p.owner == by && kinds.contains(&p.kind);
                    }
                    cur = next;
                }
                false
            })
        };
        ray_hits(&ORTHOGONAL, &[PieceKind::Rook, PieceKind::Queen])
            || ray_hits(&DIAGONAL, &[PieceKind::Bishop, PieceKind::Queen])
    }

    pub fn in_check(&self, player: Player) -> bool {
        self.king_square(player)
            .is_some_and(|k| self.is_attacked(k, player.opponent()))
    }

    /// Moves that follow piece movement but may leave the king in check.
    fn pseudo_moves(&self) -> Vec<ChessMove> {
        let me = self.current_player;
        let mut moves = Vec::new();
        for from in 0..64 {
            let Some(piece) = self.board[from] else { continue };
            if piece.owner != me {
                continue;
            }
            match piece.kind {
                PieceKind::Pawn => self.pawn_moves(from, &mut moves),
                PieceKind::Knight => self.step_moves(from, &KNIGHT_JUMPS, &mut moves),
                PieceKind::King => {
                    self.step_moves(from, &KING_STEPS, &mut moves);
                    self.castling_moves(from, &mut moves);
                }
                PieceKind::Bishop => self.slide_moves(from, &DIAGONAL, &mut moves),
                PieceKind::Rook => self.slide_moves(from, &ORTHOGONAL, &mut moves),
                PieceKind::Queen => {
                    self.slide_moves(from, &ORTHOGONAL, &mut moves);
                    self.slide_moves(from, &DIAGONAL, &mut moves);
                }
            }
        }
        moves
    }

    fn pawn_moves(&self, from: usize, moves: &mut Vec<ChessMove>) {
        let me = self.current_player;
        let dir = forward(me);
        let start_rank = if me == Player::First { 1 } else { 6 };
        let last_rank = if me == Player::First { 7 } else { 0 };
        let mut push = |to: usize| {
            if to / 8 == last_rank {
                for kind in [PieceKind::Queen, PieceKind::Rook, PieceKind::Bishop, PieceKind::Knight] {
                    moves.push(ChessMove { from, to, promotion: Some(kind) });
                }
            } else {
                moves.push(ChessMove::new(from, to));
            }
        };
        if let Some(one) = offset(from, 0, dir).filter(|&s| self.board[s].is_none()) {
            push(one);
            if from / 8 == start_rank {
                if let Some(two) = offset(one, 0, dir).filter(|&s| self.board[s].is_none()) {
                    push(two);
                }
            }
        }
        for df in [-1, 1] {
            if let Some(to) = offset(from, df, dir) {
                let enemy = self.board[to].is_some_and(|p| p.owner != me);
                if enemy || self.en_passant == Some(to) {
                    push(to);
                }
            }
        }
    }

    fn step_moves(&self, from: usize, steps: &[(i32, i32)], moves: &mut Vec<ChessMove>) {
        for &(df, dr) in steps {
            if let Some(to) = offset(from, df, dr) {
                if self.board[to].map_or(true, |p| p.owner != self.current_player) {
                    moves.push(ChessMove::new(from, to));
                }
            }
        }
    }

    fn slide_moves(&self, from: usize, dirs: &[(i32, i32)], moves: &mut Vec<ChessMove>) {
        for &(df, dr) in dirs {
            let mut cur = from;
            while let Some(to) = offset(cur, df, dr) {
                match self.board[to] {
                    None => moves.push(ChessMove::new(from, to)),
                    Some(p) => {
                        if p.owner != self.current_player {
                            moves.push(ChessMove::new(from, to));
                        }
                        break;
                    }
                }
                cur = to;
            }
        }
    }

    fn castling_moves(&self, from: usize, moves: &mut Vec<ChessMove>) {
        let me = self.current_player;
        let home = if me == Player::First { 4 } else { 60 };
        if from != home {
            return;
        }
        let (king_side, queen_side) = match me {
            Player::First => (self.castling.white_king_side, self.castling.white_queen_side),
            _ => (self.castling.black_king_side, self.castling.black_queen_side),
        };
        let them = me.opponent();
        let empty = |squares: &[usize]| squares.iter().all(|&s| self.board[s].is_none());
        let safe = |squares: &[usize]| squares.iter().all(|&s| !self.is_attacked(s, them));
        let rook = Some(Piece { kind: PieceKind::Rook, owner: me });
        if king_side && self.board[home + 3] == rook && empty(&[home + 1, home + 2]) && safe(&[home, home + 1, home + 2]) {
            moves.push(ChessMove::new(home, home + 2));
        }
        if queen_side
            && self.board[home - 4] == rook
            && empty(&[home - 1, home - 2, home - 3])
            && safe(&[home, home - 1, home - 2])
        {
            moves.push(ChessMove::new(home, home - 2));
        }
    }

    fn leaves_king_safe(&self, mv: &ChessMove) -> bool {
        let mut next = self.clone();
        next.make_move(mv);
        !next.in_check(self.current_player)
    }

    fn generate_legal(&self) -> Vec<ChessMove> {
        self.pseudo_moves()
            .into_iter()
            .filter(|mv| self.leaves_king_safe(mv))
            .collect()
    }

    fn has_legal_move(&self) -> bool {
        self.pseudo_moves().iter().any(|mv| self.leaves_king_safe(mv))
    }

    fn insufficient_material(&self) -> bool {
        let mut minors = 0;
        for piece in self.board.iter().flatten() {
            match piece.kind {
                PieceKind::King => {}
                PieceKind::Knight | PieceKind::Bishop => minors += 1,
                _ => return false,
            }
        }
        minors <= 1
    }

    fn drawn_by_rule(&self) -> bool {
        self.halfmove_clock >= 100 || self.plies >= self.max_plies || self.insufficient_material()
    }

    /// Captures first, most valuable victim first; keeps alpha-beta cutoffs early.
    fn ordered_moves(&self) -> Vec<ChessMove> {
        let mut moves = self.legal_moves();
        moves.sort_by_key(|mv| {
            let victim = self.board[mv.to].map_or(0, |p| p.kind.value());
            let promo = mv.promotion.map_or(0, |k| k.value());
            -(victim + promo)
        });
        moves
    }

    fn evaluate(&self, me: Player) -> i32 {
        let mut score = 0;
        for (sq, piece) in self.board.iter().enumerate() {
            let Some(piece) = piece else { continue };
            let (file, rank) = ((sq % 8) as i32, (sq / 8) as i32);
            let centre = 7 - (file * 2 - 7).abs().max((rank * 2 - 7).abs());
            let bonus = match piece.kind {
                PieceKind::Knight | PieceKind::Bishop => centre * 3,
                PieceKind::Queen => centre,
                PieceKind::Pawn => {
                    let advance = if piece.owner == Player::First { rank - 1 } else { 6 - rank };
                    advance * 4 + centre
                }
                _ => 0,
            };
            let value = piece.kind.value() + bonus;
            score += if piece.owner == me { value } else { -value };
        }
        score
    }
}

impl fmt::Display for ChessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8 {
                let symbol = match self.board[rank * 8 + file] {
                    Some(p) if p.owner == Player::First => p.kind.letter().to_ascii_uppercase(),
                    Some(p) => p.kind.letter(),
                    None => '.',
                };
                write!(f, "{} ", symbol)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "  a b c d e f g h")
    }
}

impl GameState for ChessState {
    type Move = ChessMove;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        let max_plies = config.ply_limit(600)?;
        match config.variant.as_deref() {
            None | Some("standard") => Self::from_fen(START_FEN, max_plies),
            Some(fen) => Self::from_fen(fen, max_plies),
        }
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.drawn_by_rule() {
            return Vec::new();
        }
        self.generate_legal()
    }

    fn make_move(&mut self, mv: &Self::Move) {
        let Some(piece) = self.board[mv.from] else { return };
        let me = piece.owner;
        let mut captured = self.board[mv.to].is_some();

        if piece.kind == PieceKind::Pawn && self.en_passant == Some(mv.to) && mv.from % 8 != mv.to % 8 && !captured {
            if let Some(victim) = offset(mv.to, 0, -forward(me)) {
                self.board[victim] = None;
                captured = true;
            }
        }

        self.board[mv.from] = None;
        self.board[mv.to] = Some(Piece {
            kind: mv.promotion.unwrap_or(piece.kind),
            owner: me,
        });

        if piece.kind == PieceKind::King && mv.from.abs_diff(mv.to) == 2 {
            let (rook_from, rook_to) = if mv.to > mv.from {
                (mv.from + 3, mv.from + 1)
            } else {
                (mv.from - 4, mv.from - 1)
            };
            self.board[rook_to] = self.board[rook_from].take();
        }

        if piece.kind == PieceKind::King {
            if me == Player::First {
                self.castling.white_king_side = false;
                self.castling.white_queen_side = false;
            } else {
                self.castling.black_king_side = false;
                self.castling.black_queen_side = false;
            }
        }
        for sq in [mv.from, mv.to] {
            match sq {
                0 => self.castling.white_queen_side = false,
                7 => self.castling.white_king_side = false,
                56 => self.castling.black_queen_side = false,
                63 => self.castling.black_king_side = false,
                _ => {}
            }
        }

        self.en_passant = (piece.kind == PieceKind::Pawn && mv.from.abs_diff(mv.to) == 16)
            .then(|| (mv.from + mv.to) / 2);
        if piece.kind == PieceKind::Pawn || captured {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        self.plies += 1;
        self.current_player = me.opponent();
    }

    fn outcome(&self) -> Outcome {
        if self.drawn_by_rule() {
            return Outcome::Draw;
        }
        if self.has_legal_move() {
            Outcome::InProgress
        } else if self.in_check(self.current_player) {
            Outcome::Win(self.current_player.opponent())
        } else {
            Outcome::Draw
        }
    }

    fn current_player(&self) -> Player {
        self.current_player
    }
}

impl Opponent for ChessState {
    fn select_move(&self, strategy: &StrategyConfig) -> Result<ChessMove, EngineError> {
        alphabeta::choose_with(
            self,
            strategy,
            3,
            |s: &Self| s.ordered_moves(),
            |s: &Self, me| s.evaluate(me),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perft(state: &ChessState, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }
        let moves = state.legal_moves();
        if depth == 1 {
            return moves.len() as u64;
        }
        moves
            .iter()
            .map(|mv| {
                let mut next = state.clone();
                next.make_move(mv);
                perft(&next, depth - 1)
            })
            .sum()
    }

    fn play(state: &mut ChessState, moves: &[&str]) {
        for text in moves {
            let mv = ChessMove::parse(text).unwrap();
            *state = state.apply(&mv).unwrap();
        }
    }

    #[test]
    fn start_position_perft() {
        let game = ChessState::initial_state(&GameConfig::default()).unwrap();
        assert_eq!(perft(&game, 1), 20);
        assert_eq!(perft(&game, 2), 400);
        assert_eq!(perft(&game, 3), 8_902);
    }

    #[test]
    fn kiwipete_perft_covers_castling_and_en_passant() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let game = ChessState::from_fen(fen, 600).unwrap();
        assert_eq!(perft(&game, 1), 48);
        assert_eq!(perft(&game, 2), 2_039);
    }

    #[test]
    fn fools_mate() {
        let mut game = ChessState::initial_state(&GameConfig::default()).unwrap();
        play(&mut game, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert_eq!(game.outcome(), Outcome::Win(Player::Second));
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    fn en_passant_removes_the_passed_pawn() {
        let mut game = ChessState::initial_state(&GameConfig::default()).unwrap();
        play(&mut game, &["e2e4", "a7a6", "e4e5", "d7d5", "e5d6"]);
        assert_eq!(game.piece_at(35), None); // d5
        assert_eq!(
            game.piece_at(43),
            Some(Piece { kind: PieceKind::Pawn, owner: Player::First })
        );
    }

    #[test]
    fn castling_moves_the_rook_and_is_refused_through_check() {
        let game = ChessState::from_fen("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1", 600).unwrap();
        let castled = game.apply(&ChessMove::parse("e1g1").unwrap()).unwrap();
        assert_eq!(castled.piece_at(5).map(|p| p.kind), Some(PieceKind::Rook));
        assert_eq!(castled.piece_at(7), None);

        // A rook on f8 covers f1, so the king may not pass through it.
        let game = ChessState::from_fen("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1", 600).unwrap();
        assert!(!game.is_legal(&ChessMove::parse("e1g1").unwrap()));
        assert!(game.is_legal(&ChessMove::parse("e1c1").unwrap()));
    }

    #[test]
    fn stalemate_and_bare_kings_draw() {
        let stalemate = ChessState::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 600).unwrap();
        assert!(stalemate.legal_moves().is_empty());
        assert_eq!(stalemate.outcome(), Outcome::Draw);

        let bare = ChessState::from_fen("8/8/3k4/8/8/4K3/8/8 w - - 0 1", 600).unwrap();
        assert_eq!(bare.outcome(), Outcome::Draw);
        assert!(bare.legal_moves().is_empty());
    }

    #[test]
    fn fifty_move_rule() {
        let game = ChessState::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 100 80", 600).unwrap();
        assert_eq!(game.outcome(), Outcome::Draw);
    }

    #[test]
    fn cpu_finds_back_rank_mate() {
        let game = ChessState::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", 600).unwrap();
        let mv = game.select_move(&StrategyConfig::default()).unwrap();
        assert_eq!(mv.to_string(), "a1a8");
    }

    #[test]
    fn bad_fen_is_a_config_error() {
        let config = GameConfig {
            variant: Some("8/8/8 w - -".into()),
            ..GameConfig::default()
        };
        assert!(matches!(ChessState::initial_state(&config), Err(EngineError::InvalidConfig(_))));
        for clock in ["99999999999999999999", "-3", "x"] {
            let fen = format!("4k3/8/8/8/8/8/8/4K3 w - - {} 1", clock);
            assert!(matches!(ChessState::from_fen(&fen, 600), Err(EngineError::InvalidConfig(_))));
        }
        let no_clock = ChessState::from_fen("4k3/8/8/8/8/8/8/4K3 w - -", 600).unwrap();
        assert_eq!(no_clock.halfmove_clock, 0);
    }
}
