//! # Game Controller Module - Session State
//!
//! A `Session` is the single source of truth for one game in progress. It
//! owns the authoritative [`GameWrapper`], the starting position and the
//! move history. Every move goes through [`Session::play`], which validates
//! it before anything is recorded, so a refused move leaves the session
//! untouched.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                   Session                     │
//! │  initial ──► move 1 ──► move 2 ──► ... state  │
//! └───────────────────────────────────────────────┘
//!          │ clone                 ▲ play(move)
//!          ▼                       │
//!   ┌──────────────┐        ┌──────────────┐
//!   │ CPU search   │───────►│ Dispatcher / │
//!   │ (snapshot)   │  move  │ ai_worker    │
//!   └──────────────┘        └──────────────┘
//! ```

use crate::config::StrategyConfig;
use crate::error::EngineError;
use crate::game_wrapper::{GameWrapper, MoveWrapper};
use crate::{Outcome, Player};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A single entry in the move history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveHistoryEntry {
    /// Move number, 1-indexed.
    pub move_number: usize,
    /// Seat that made the move.
    pub player: Player,
    pub move_made: MoveWrapper,
}

/// One game in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    initial: GameWrapper,
    state: GameWrapper,
    history: Vec<MoveHistoryEntry>,
    cpu_seats: Vec<Player>,
}

impl Session {
    pub fn new(initial: GameWrapper, cpu_seats: Vec<Player>) -> Self {
        Self {
            state: initial.clone(),
            initial,
            history: Vec::new(),
            cpu_seats,
        }
    }

    /// The authoritative current state.
    pub fn state(&self) -> &GameWrapper {
        &self.state
    }

    pub fn initial_state(&self) -> &GameWrapper {
        &self.initial
    }

    pub fn outcome(&self) -> Outcome {
        self.state.outcome()
    }

    pub fn history(&self) -> &[MoveHistoryEntry] {
        &self.history
    }

    pub fn cpu_seats(&self) -> &[Player] {
        &self.cpu_seats
    }

    /// Moves played so far; changes whenever the state does.
    pub fn revision(&self) -> usize {
        self.history.len()
    }

    pub fn legal_moves(&self) -> Vec<MoveWrapper> {
        self.state.legal_moves()
    }

    /// True when the game is live and a computer seat is to move.
    pub fn is_cpu_turn(&self) -> bool {
        !self.state.is_terminal() && self.cpu_seats.contains(&self.state.current_player())
    }

    /// Validates and applies a move. On error nothing changes.
    pub fn play(&mut self, mv: MoveWrapper) -> Result<&GameWrapper, EngineError> {
        let player = self.state.current_player();
        let next = self.state.apply(&mv)?;
        debug!(game = self.state.id(), %player, %mv, "move applied");
        self.state = next;
        self.history.push(MoveHistoryEntry {
            move_number: self.history.len() + 1,
            player,
            move_made: mv,
        });
        let outcome = self.state.outcome();
        if outcome.is_terminal() {
            info!(game = self.state.id(), %outcome, moves = self.history.len(), "game over");
        }
        Ok(&self.state)
    }

    /// Asks the computer for the side to move and plays its choice.
    pub fn play_cpu(&mut self, strategy: &StrategyConfig) -> Result<MoveWrapper, EngineError> {
        if self.state.is_terminal() {
            return Err(EngineError::GameOver);
        }
        if !self.is_cpu_turn() {
            return Err(EngineError::NotCpuTurn);
        }
        let mv = self.state.select_move(strategy)?;
        debug!(game = self.state.id(), %mv, "computer chose");
        self.play(mv.clone())?;
        Ok(mv)
    }

    /// Re-derives the current state from the starting position and the history.
    pub fn replay(&self) -> Result<GameWrapper, EngineError> {
        self.history
            .iter()
            .try_fold(self.initial.clone(), |state, entry| state.apply(&entry.move_made))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Plain-text listing of the moves and the result.
    pub fn format_history(&self) -> String {
        let mut output = format!("=== {} ===\n", self.state.title());
        for entry in &self.history {
            output.push_str(&format!("{}. {} - {}\n", entry.move_number, entry.player, entry.move_made));
        }
        match self.outcome() {
            Outcome::InProgress => {
                output.push_str(&format!("({} to move)\n", self.state.current_player()));
            }
            outcome => output.push_str(&format!("Result: {}\n", outcome)),
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::{TicTacToeMove, TicTacToeState};
    use crate::{GameConfig, GameState};

    fn session() -> Session {
        let state = TicTacToeState::initial_state(&GameConfig::default()).unwrap();
        Session::new(GameWrapper::TicTacToe(state), vec![Player::Second])
    }

    fn ttt(r: usize, c: usize) -> MoveWrapper {
        MoveWrapper::TicTacToe(TicTacToeMove(r, c))
    }

    #[test]
    fn valid_move_is_recorded() {
        let mut s = session();
        s.play(ttt(1, 1)).unwrap();
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.history()[0].player, Player::First);
        assert!(s.is_cpu_turn());
    }

    #[test]
    fn refused_move_changes_nothing() {
        let mut s = session();
        s.play(ttt(1, 1)).unwrap();
        let before = s.clone();
        assert!(matches!(s.play(ttt(1, 1)), Err(EngineError::IllegalMove(_))));
        assert_eq!(s, before);
    }

    #[test]
    fn cpu_only_moves_on_its_seat() {
        let mut s = session();
        let strategy = StrategyConfig::default();
        assert_eq!(s.play_cpu(&strategy), Err(EngineError::NotCpuTurn));
        s.play(ttt(0, 0)).unwrap();
        let mv = s.play_cpu(&strategy).unwrap();
        assert_eq!(s.history()[1].move_made, mv);
        assert_eq!(s.history()[1].player, Player::Second);
    }

    #[test]
    fn replay_and_json_reproduce_the_game() {
        let mut s = session();
        for mv in [ttt(0, 0), ttt(1, 1), ttt(0, 1), ttt(2, 2), ttt(0, 2)] {
            s.play(mv).unwrap();
        }
        assert_eq!(s.outcome(), Outcome::Win(Player::First));
        assert_eq!(&s.replay().unwrap(), s.state());
        assert_eq!(s.play(ttt(2, 0)), Err(EngineError::GameOver));
        let back = Session::from_json(&s.to_json().unwrap()).unwrap();
        assert_eq!(back, s);
        let text = s.format_history();
        assert!(text.contains("1. first - (0,0)"));
        assert!(text.contains("Result: first player wins"));
    }
}
