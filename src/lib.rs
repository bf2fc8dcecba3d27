//! # Lobby Game Engines
//!
//! Rules and computer opponents for every board on the lobby: chess, shogi,
//! go, checkers and the rest. Each game is a leaf module implementing the
//! shared [`GameState`] trait; [`game_wrapper::GameWrapper`] closes the set so
//! a board UI can drive any one of them through the [`dispatcher`].
//!
//! Control flow for one turn:
//! ```text
//! UI move ──► Dispatcher ──► Session ──► GameState::apply ──► new state / IllegalMove
//!                                  │
//!                                  └─ cpu seat to move? ──► Opponent::select_move ──► apply
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

pub mod ai_worker;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod game_controller;
pub mod game_wrapper;
pub mod games;
pub mod lobby;
pub mod rng;
pub mod search;

pub use config::{Difficulty, GameConfig, SessionConfig, StrategyConfig};
pub use dispatcher::{Dispatcher, Registry};
pub use error::EngineError;
pub use game_controller::Session;
pub use game_wrapper::{GameWrapper, MoveWrapper};

/// A seat at the table. Turn order lives inside each game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Player {
    First,
    Second,
    /// The only seat of a solitaire game.
    Solo,
}

impl Player {
    /// The other side of a two-player game. `Solo` is its own opponent.
    pub fn opponent(self) -> Player {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
            Player::Solo => Player::Solo,
        }
    }

    /// 0 for `First` and `Solo`, 1 for `Second`; handy for per-player arrays.
    pub fn index(self) -> usize {
        match self {
            Player::First | Player::Solo => 0,
            Player::Second => 1,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::First => write!(f, "first"),
            Player::Second => write!(f, "second"),
            Player::Solo => write!(f, "solo"),
        }
    }
}

/// Result of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    InProgress,
    Win(Player),
    Draw,
    /// A solitaire position with nothing left to play that was not solved.
    Stalemate,
}

impl Outcome {
    /// True for every outcome except `InProgress`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    /// The winning seat, if any.
    pub fn winner(&self) -> Option<Player> {
        match self {
            Outcome::Win(p) => Some(*p),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::InProgress => write!(f, "in progress"),
            Outcome::Win(Player::Solo) => write!(f, "solved"),
            Outcome::Win(p) => write!(f, "{} player wins", p),
            Outcome::Draw => write!(f, "draw"),
            Outcome::Stalemate => write!(f, "no moves left"),
        }
    }
}

/// The state of one game. Must be cloneable to be used in search.
/// `Send` and `Sync` are required for parallel processing.
///
/// Implementors keep `outcome().is_terminal()` and `legal_moves().is_empty()`
/// in agreement: a side that has to pass gets an explicit pass move.
pub trait GameState: Clone + PartialEq + Eq + fmt::Debug + Send + Sync + Serialize + DeserializeOwned {
    /// The type of a move in the game.
    type Move: Clone + Eq + Hash + fmt::Debug + Send + Sync + Serialize + DeserializeOwned;

    /// The starting position for the given setup options.
    fn initial_state(config: &GameConfig) -> Result<Self, EngineError>;

    /// Every move admissible from this state under full rules.
    fn legal_moves(&self) -> Vec<Self::Move>;

    /// Applies a move taken from `legal_moves`, modifying the state.
    ///
    /// Search code uses this on moves it generated itself; everything else
    /// goes through [`GameState::apply`].
    fn make_move(&mut self, mv: &Self::Move);

    /// Win/draw/in-progress, derived purely from the state.
    fn outcome(&self) -> Outcome;

    /// The seat to move.
    fn current_player(&self) -> Player;

    /// Returns true if the game is over.
    fn is_terminal(&self) -> bool {
        self.outcome().is_terminal()
    }

    /// Checks if a move is legal in the current state.
    fn is_legal(&self, mv: &Self::Move) -> bool {
        self.legal_moves().contains(mv)
    }

    /// Validated transition: the successor state, or why the move was refused.
    fn apply(&self, mv: &Self::Move) -> Result<Self, EngineError> {
        if self.is_terminal() {
            return Err(EngineError::GameOver);
        }
        if !self.is_legal(mv) {
            return Err(EngineError::illegal(mv));
        }
        let mut next = self.clone();
        next.make_move(mv);
        Ok(next)
    }
}

/// The computer opponent of one game.
pub trait Opponent: GameState {
    /// Picks one of `legal_moves()`. Deterministic for a fixed state and config.
    fn select_move(&self, strategy: &StrategyConfig) -> Result<Self::Move, EngineError>;
}
