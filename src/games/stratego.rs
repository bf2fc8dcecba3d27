//! # Stratego
//!
//! 10×10 with two 2×2 lakes. Each army of 40 is dealt into its home four
//! rows by a seeded shuffle; First owns rows 6..10 and moves first.
//! Ranks stay hidden until a piece fights. The computer only looks at
//! revealed ranks.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::rng::GameRng;
use crate::search::forced_or_random;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

const N: usize = 10;
const STEPS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Rank {
    Flag,
    Spy,
    Scout,
    Miner,
    Sergeant,
    Lieutenant,
    Captain,
    Major,
    Colonel,
    General,
    Marshal,
    Bomb,
}

impl Rank {
    fn count(self) -> usize {
        match self {
            Rank::Flag | Rank::Spy | Rank::General | Rank::Marshal => 1,
            Rank::Colonel => 2,
            Rank::Major => 3,
            Rank::Sergeant | Rank::Lieutenant | Rank::Captain => 4,
            Rank::Miner => 5,
            Rank::Bomb => 6,
            Rank::Scout => 8,
        }
    }

    fn movable(self) -> bool {
        !matches!(self, Rank::Flag | Rank::Bomb)
    }

    fn symbol(self) -> char {
        match self {
            Rank::Flag => 'F',
            Rank::Spy => 'S',
            Rank::Scout => '2',
            Rank::Miner => '3',
            Rank::Sergeant => '4',
            Rank::Lieutenant => '5',
            Rank::Captain => '6',
            Rank::Major => '7',
            Rank::Colonel => '8',
            Rank::General => '9',
            Rank::Marshal => 'M',
            Rank::Bomb => 'B',
        }
    }

    fn worth(self) -> i32 {
        match self {
            Rank::Flag => 1000,
            Rank::Bomb => 20,
            Rank::Spy => 60,
            other => (other as i32) * 10,
        }
    }

    const ALL: [Rank; 12] = [
        Rank::Flag,
        Rank::Spy,
        Rank::Scout,
        Rank::Miner,
        Rank::Sergeant,
        Rank::Lieutenant,
        Rank::Captain,
        Rank::Major,
        Rank::Colonel,
        Rank::General,
        Rank::Marshal,
        Rank::Bomb,
    ];
}

/// Result of `attacker` striking `defender`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Combat {
    AttackerWins,
    DefenderWins,
    BothRemoved,
}

pub fn resolve(attacker: Rank, defender: Rank) -> Combat {
    match (attacker, defender) {
        (_, Rank::Flag) => Combat::AttackerWins,
        (Rank::Miner, Rank::Bomb) => Combat::AttackerWins,
        (_, Rank::Bomb) => Combat::DefenderWins,
        (Rank::Spy, Rank::Marshal) => Combat::AttackerWins,
        (a, d) if a == d => Combat::BothRemoved,
        (a, d) if a > d => Combat::AttackerWins,
        _ => Combat::DefenderWins,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct StrategoPiece {
    pub rank: Rank,
    pub owner: Player,
    pub revealed: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct StrategoMove {
    pub from: (usize, usize),
    pub to: (usize, usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategoState {
    board: Vec<Option<StrategoPiece>>,
    current_player: Player,
    plies: u32,
    max_plies: u32,
}

fn is_lake(r: usize, c: usize) -> bool {
    (4..=5).contains(&r) && matches!(c, 2 | 3 | 6 | 7)
}

fn army() -> Vec<Rank> {
    Rank::ALL
        .iter()
        .flat_map(|&rank| std::iter::repeat(rank).take(rank.count()))
        .collect()
}

impl StrategoState {
    pub fn new(seed: u64, max_plies: u32) -> Self {
        let mut board = vec![None; N * N];
        for (stream, owner, rows) in [(0, Player::First, 6..N), (1, Player::Second, 0..4)] {
            let mut ranks = army();
            GameRng::for_stream(seed, stream).shuffle(&mut ranks);
            let squares = rows.flat_map(|r| (0..N).map(move |c| r * N + c));
            for (sq, rank) in squares.zip(ranks) {
                board[sq] = Some(StrategoPiece { rank, owner, revealed: false });
            }
        }
        Self {
            board,
            current_player: Player::First,
            plies: 0,
            max_plies,
        }
    }

    pub fn piece(&self, r: usize, c: usize) -> Option<StrategoPiece> {
        self.board[r * N + c]
    }

    fn step(&self, (r, c): (usize, usize), (dr, dc): (i32, i32)) -> Option<(usize, usize)> {
        let (nr, nc) = (r as i32 + dr, c as i32 + dc);
        if !(0..N as i32).contains(&nr) || !(0..N as i32).contains(&nc) {
            return None;
        }
        let (nr, nc) = (nr as usize, nc as usize);
        (!is_lake(nr, nc)).then_some((nr, nc))
    }

    fn moves_for(&self, player: Player) -> Vec<StrategoMove> {
        let mut out = Vec::new();
        for r in 0..N {
            for c in 0..N {
                let Some(piece) = self.piece(r, c).filter(|p| p.owner == player && p.rank.movable()) else {
                    continue;
                };
                for dir in STEPS {
                    let mut cur = (r, c);
                    while let Some(next) = self.step(cur, dir) {
                        match self.piece(next.0, next.1) {
                            None => out.push(StrategoMove { from: (r, c), to: next }),
                            Some(other) => {
                                if other.owner != player {
                                    out.push(StrategoMove { from: (r, c), to: next });
                                }
                                break;
                            }
                        }
                        if piece.rank != Rank::Scout {
                            break;
                        }
                        cur = next;
                    }
                }
            }
        }
        out
    }

    fn has_flag(&self, player: Player) -> bool {
        self.board
            .iter()
            .flatten()
            .any(|p| p.owner == player && p.rank == Rank::Flag)
    }

    /// Heuristic value of a move using only what `me` can see.
    fn judge(&self, mv: &StrategoMove, me: Player) -> i32 {
        let Some(mover) = self.piece(mv.from.0, mv.from.1) else { return i32::MIN };
        let forward = if me == Player::First { -1 } else { 1 };
        let advance = (mv.to.0 as i32 - mv.from.0 as i32) * forward;
        let mut score = advance;
        if let Some(target) = self.piece(mv.to.0, mv.to.1) {
            if target.revealed {
                score += match resolve(mover.rank, target.rank) {
                    Combat::AttackerWins => target.rank.worth() * 2,
                    Combat::BothRemoved => target.rank.worth() - mover.rank.worth(),
                    Combat::DefenderWins => -mover.rank.worth() * 2,
                };
            } else {
                // Probe unknown pieces with cheap ones.
                score += 15 - mover.rank.worth() / 5;
            }
        }
        for dir in STEPS {
            if let Some((r, c)) = self.step(mv.to, dir) {
                if let Some(enemy) = self.piece(r, c).filter(|p| p.owner != me && p.revealed && p.rank.movable()) {
                    if resolve(enemy.rank, mover.rank) == Combat::AttackerWins {
                        score -= mover.rank.worth();
                    }
                }
            }
        }
        score
    }
}

impl fmt::Display for StrategoState {
    /// First's view: Second's unrevealed pieces show as `#`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..N {
            for c in 0..N {
                let symbol = match self.piece(r, c) {
                    _ if is_lake(r, c) => '~',
                    Some(p) if p.owner == Player::First => p.rank.symbol(),
                    Some(p) if p.revealed => p.rank.symbol().to_ascii_lowercase(),
                    Some(_) => '#',
                    None => '.',
                };
                write!(f, "{} ", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl GameState for StrategoState {
    type Move = StrategoMove;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        Ok(Self::new(config.seed, config.ply_limit(1_000)?))
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.is_terminal() {
            return Vec::new();
        }
        self.moves_for(self.current_player)
    }

    fn make_move(&mut self, mv: &Self::Move) {
        let from = mv.from.0 * N + mv.from.1;
        let to = mv.to.0 * N + mv.to.1;
        let Some(mut attacker) = self.board[from].take() else { return };
        match self.board[to] {
            None => self.board[to] = Some(attacker),
            Some(mut defender) => {
                attacker.revealed = true;
                defender.revealed = true;
                self.board[to] = match resolve(attacker.rank, defender.rank) {
                    Combat::AttackerWins => Some(attacker),
                    Combat::DefenderWins => Some(defender),
                    Combat::BothRemoved => None,
                };
            }
        }
        self.plies += 1;
        self.current_player = self.current_player.opponent();
    }

    fn outcome(&self) -> Outcome {
        for player in [Player::First, Player::Second] {
            if !self.has_flag(player) {
                return Outcome::Win(player.opponent());
            }
        }
        if self.plies >= self.max_plies {
            return Outcome::Draw;
        }
        if self.moves_for(self.current_player).is_empty() {
            return Outcome::Win(self.current_player.opponent());
        }
        Outcome::InProgress
    }

    fn current_player(&self) -> Player {
        self.current_player
    }
}

impl Opponent for StrategoState {
    fn select_move(&self, strategy: &StrategyConfig) -> Result<StrategoMove, EngineError> {
        let mut rng = GameRng::new(strategy.seed);
        if let Some(mv) = forced_or_random(self, strategy, &mut rng)? {
            return Ok(mv);
        }
        let mut moves = self.legal_moves();
        rng.shuffle(&mut moves);
        let me = self.current_player;
        moves
            .into_iter()
            .max_by_key(|mv| self.judge(mv, me))
            .ok_or(EngineError::GameOver)
    }
}
