//! # Ultimate Tic-Tac-Toe
//!
//! Nine local 3×3 boards arranged in a 3×3 grid. The cell a player picks
//! inside a local board sends the opponent to the matching local board; if
//! that board is already decided, the opponent may play anywhere open.
//! Three local wins in a line win the game.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::search::mcts;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

/// (local board 0..9, cell 0..9), both row-major.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct UltimateMove {
    pub board: usize,
    pub cell: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum LocalStatus {
    Open,
    Won(Player),
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UltimateState {
    cells: Vec<Option<Player>>,
    locals: Vec<LocalStatus>,
    /// Board the next move is sent to, if it is still open.
    forced_board: Option<usize>,
    current_player: Player,
}

impl UltimateState {
    pub fn new() -> Self {
        Self {
            cells: vec![None; 81],
            locals: vec![LocalStatus::Open; 9],
            forced_board: None,
            current_player: Player::First,
        }
    }

    pub fn local_status(&self, board: usize) -> LocalStatus {
        self.locals[board]
    }

    pub fn forced_board(&self) -> Option<usize> {
        self.forced_board
    }

    fn local_cells(&self, board: usize) -> &[Option<Player>] {
        &self.cells[board * 9..board * 9 + 9]
    }

    fn global_winner(&self) -> Option<Player> {
        let owners: Vec<Option<Player>> = self
            .locals
            .iter()
            .map(|s| match s {
                LocalStatus::Won(p) => Some(*p),
                _ => None,
            })
            .collect();
        [Player::First, Player::Second]
            .into_iter()
            .find(|&p| grid_lines::check_line_win(&owners, 3, 3, Some(p), 3))
    }

    fn open_boards(&self) -> Vec<usize> {
        match self.forced_board {
            Some(b) if self.locals[b] == LocalStatus::Open => vec![b],
            _ => (0..9).filter(|&b| self.locals[b] == LocalStatus::Open).collect(),
        }
    }
}

impl Default for UltimateState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UltimateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for big_row in 0..3 {
            for small_row in 0..3 {
                let mut line = String::new();
                for big_col in 0..3 {
                    let board = big_row * 3 + big_col;
                    for small_col in 0..3 {
                        let symbol = match self.locals[board] {
                            LocalStatus::Won(Player::First) => 'X',
                            LocalStatus::Won(_) => 'O',
                            _ => match self.cells[board * 9 + small_row * 3 + small_col] {
                                Some(Player::First) => 'x',
                                Some(_) => 'o',
                                None => '.',
                            },
                        };
                        line.push(symbol);
                    }
                    if big_col < 2 {
                        line.push_str(" | ");
                    }
                }
                writeln!(f, "{}", line)?;
            }
            if big_row < 2 {
                writeln!(f, "----+-----+----")?;
            }
        }
        Ok(())
    }
}

impl GameState for UltimateState {
    type Move = UltimateMove;

    fn initial_state(_config: &GameConfig) -> Result<Self, EngineError> {
        Ok(Self::new())
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.global_winner().is_some() {
            return Vec::new();
        }
        self.open_boards()
            .into_iter()
            .flat_map(|board| {
                (0..9)
                    .filter(move |&cell| self.cells[board * 9 + cell].is_none())
                    .map(move |cell| UltimateMove { board, cell })
            })
            .collect()
    }

    fn make_move(&mut self, mv: &Self::Move) {
        let player = self.current_player;
        self.cells[mv.board * 9 + mv.cell] = Some(player);
        let local = self.local_cells(mv.board);
        let (row, col) = (mv.cell / 3, mv.cell % 3);
        if grid_lines::longest_run_through(local, 3, 3, row, col, Some(player)) >= 3 {
            self.locals[mv.board] = LocalStatus::Won(player);
        } else if local.iter().all(Option::is_some) {
            self.locals[mv.board] = LocalStatus::Full;
        }
        self.forced_board = Some(mv.cell);
        self.current_player = player.opponent();
    }

    fn outcome(&self) -> Outcome {
        if let Some(p) = self.global_winner() {
            Outcome::Win(p)
        } else if self.locals.iter().all(|s| *s != LocalStatus::Open) {
            Outcome::Draw
        } else {
            Outcome::InProgress
        }
    }

    fn current_player(&self) -> Player {
        self.current_player
    }
}

impl Opponent for UltimateState {
    fn select_move(&self, strategy: &StrategyConfig) -> Result<UltimateMove, EngineError> {
        mcts::choose(self, strategy, 3_000, mcts::uniform_rollout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_choice_sends_opponent_to_matching_board() {
        let game = UltimateState::new();
        assert_eq!(game.legal_moves().len(), 81);
        let game = game.apply(&UltimateMove { board: 4, cell: 2 }).unwrap();
        let moves = game.legal_moves();
        assert_eq!(moves.len(), 9);
        assert!(moves.iter().all(|m| m.board == 2));
        assert!(matches!(
            game.apply(&UltimateMove { board: 4, cell: 0 }),
            Err(EngineError::IllegalMove(_))
        ));
    }

    #[test]
    fn decided_board_frees_the_next_move() {
        let mut game = UltimateState::new();
        // First keeps sending Second back to board 0 until Second owns its right column.
        let script = [(0, 0), (0, 4), (4, 0), (0, 8), (8, 0), (0, 1), (1, 0), (0, 5), (5, 0), (0, 2)];
        for (board, cell) in script {
            game = game.apply(&UltimateMove { board, cell }).unwrap();
        }
        assert_eq!(game.local_status(0), LocalStatus::Won(Player::Second));
        // First was sent to board 2, which is open, so play stays there.
        assert!(game.legal_moves().iter().all(|m| m.board == 2));
        let game = game.apply(&UltimateMove { board: 2, cell: 0 }).unwrap();
        // Board 0 is decided: Second may now play in any open board.
        let boards: std::collections::BTreeSet<usize> = game.legal_moves().iter().map(|m| m.board).collect();
        assert!(!boards.contains(&0));
        assert_eq!(boards.len(), 8);
    }

    #[test]
    fn cpu_picks_a_legal_move() {
        let game = UltimateState::new().apply(&UltimateMove { board: 4, cell: 4 }).unwrap();
        let strategy = StrategyConfig {
            iterations: Some(300),
            ..StrategyConfig::default()
        };
        let mv = game.select_move(&strategy).unwrap();
        assert!(game.is_legal(&mv));
        assert_eq!(mv, game.select_move(&strategy).unwrap());
    }
}
