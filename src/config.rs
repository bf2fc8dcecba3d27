//! Setup and opponent-strength configuration.
//!
//! `GameConfig` is handed to `initial_state`; each engine reads only the
//! fields it understands and rejects values it cannot honour.
//! `StrategyConfig` is handed to `select_move` and never stored in a state.

use crate::error::EngineError;
use crate::Player;
use serde::{Deserialize, Serialize};

/// Game-specific setup options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Side length for square boards (Go, Gomoku, Hex, Othello, ...).
    pub board_size: Option<usize>,
    /// Width for rectangular boards (Connect Four).
    pub width: Option<usize>,
    /// Height for rectangular boards (Connect Four).
    pub height: Option<usize>,
    /// Pieces in a row needed to win, or a per-game count (seeds per pit, target tile).
    pub line_size: Option<usize>,
    /// Seed for shuffles and in-play randomness.
    pub seed: u64,
    /// Named layout or rule variant.
    pub variant: Option<String>,
    /// Ply limit for games that could otherwise go on forever.
    pub max_plies: Option<u32>,
}

impl GameConfig {
    /// Config with only a seed set.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Config with a square board size.
    pub fn with_board_size(mut self, size: usize) -> Self {
        self.board_size = Some(size);
        self
    }

    /// Reads `board_size`, falling back to `default`, and checks it lies in `range`.
    pub fn size_in(
        &self,
        default: usize,
        range: std::ops::RangeInclusive<usize>,
    ) -> Result<usize, EngineError> {
        let size = self.board_size.unwrap_or(default);
        if range.contains(&size) {
            Ok(size)
        } else {
            Err(EngineError::config(format!(
                "board size {} outside {}..={}",
                size,
                range.start(),
                range.end()
            )))
        }
    }

    /// Reads `max_plies`, falling back to `default`; zero is rejected.
    pub fn ply_limit(&self, default: u32) -> Result<u32, EngineError> {
        match self.max_plies {
            Some(0) => Err(EngineError::config("max_plies must be positive")),
            Some(n) => Ok(n),
            None => Ok(default),
        }
    }
}

/// Options for one session: the game setup plus which seats the computer plays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub game: GameConfig,
    pub cpu_seats: Vec<Player>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            cpu_seats: vec![Player::Second],
        }
    }
}

/// Named strength presets for the computer opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// Computer opponent strength.
///
/// `None` fields fall back to the per-game default, so one config can be
/// passed to any engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Search depth in plies for minimax-style opponents.
    pub depth: Option<u8>,
    /// Simulation count for Monte Carlo opponents.
    pub iterations: Option<u32>,
    /// Hard cap on searched nodes.
    pub max_nodes: u64,
    /// Optional wall-clock cap in milliseconds.
    pub time_budget_ms: Option<u64>,
    /// Probability of playing a uniformly random legal move instead of the searched one.
    pub randomness: f64,
    /// Seed for tie-breaking and random choices.
    pub seed: u64,
    /// Worker threads for parallel search; 0 means one per CPU.
    pub threads: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            depth: None,
            iterations: None,
            max_nodes: 2_000_000,
            time_budget_ms: None,
            randomness: 0.0,
            seed: 0,
            threads: 1,
        }
    }
}

impl StrategyConfig {
    /// Preset for a difficulty level.
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                depth: Some(1),
                iterations: Some(200),
                randomness: 0.25,
                ..Self::default()
            },
            Difficulty::Medium => Self::default(),
            Difficulty::Hard => Self {
                depth: Some(5),
                iterations: Some(8_000),
                max_nodes: 20_000_000,
                time_budget_ms: Some(10_000),
                threads: 0,
                ..Self::default()
            },
        }
    }

    /// Same config with a different seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Same config with an explicit depth.
    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Depth to search, falling back to the engine default.
    pub fn depth_or(&self, default: u8) -> u8 {
        self.depth.unwrap_or(default).max(1)
    }

    /// Simulations to run, falling back to the engine default.
    pub fn iterations_or(&self, default: u32) -> u32 {
        self.iterations.unwrap_or(default).max(1)
    }

    /// Worker count with 0 resolved to the machine's CPU count.
    pub fn worker_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get().max(1)
        } else {
            self.threads
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_validation() {
        let config = GameConfig::default().with_board_size(4);
        assert_eq!(config.size_in(9, 5..=19), Err(EngineError::config("board size 4 outside 5..=19")));
        assert_eq!(GameConfig::default().size_in(9, 5..=19), Ok(9));
    }

    #[test]
    fn strategy_config_round_trips_through_json() {
        let config = StrategyConfig::for_difficulty(Difficulty::Hard).with_seed(9);
        let json = serde_json::to_string(&config).unwrap();
        let back: StrategyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn partial_session_config_uses_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"game": {"seed": 5}}"#).unwrap();
        assert_eq!(config.game.seed, 5);
        assert_eq!(config.cpu_seats, vec![Player::Second]);
    }
}
