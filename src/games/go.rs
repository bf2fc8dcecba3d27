//! # Go
//!
//! ## Rules
//! - Black (First) and White (Second) alternate placing stones or passing
//! - Opponent groups left without liberties are captured before the mover's
//!   own group is checked, so capturing is never suicide
//! - Suicide is illegal; simple ko forbids the immediate single-stone recapture
//! - Two consecutive passes end the game
//! - Area scoring with 6.5 komi for White; the ply limit ends the game too

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::rng::GameRng;
use crate::search::mcts;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Komi in half points.
const KOMI_HALF_POINTS: i32 = 13;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum GoMove {
    Place(usize, usize),
    Pass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoState {
    board: Vec<Option<Player>>,
    size: usize,
    current_player: Player,
    /// Point the side to move may not play because of ko.
    ko_point: Option<usize>,
    consecutive_passes: u8,
    plies: u32,
    max_plies: u32,
}

impl GoState {
    pub fn new(size: usize, max_plies: u32) -> Result<Self, EngineError> {
        if !(5..=19).contains(&size) {
            return Err(EngineError::config("go board size must be 5..=19"));
        }
        Ok(Self {
            board: vec![None; size * size],
            size,
            current_player: Player::First,
            ko_point: None,
            consecutive_passes: 0,
            plies: 0,
            max_plies,
        })
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Player> {
        self.board[row * self.size + col]
    }

    fn neighbours(&self, idx: usize) -> impl Iterator<Item = usize> {
        let n = self.size;
        let (r, c) = (idx / n, idx % n);
        let up = (r > 0).then(|| idx - n);
        let down = (r + 1 < n).then(|| idx + n);
        let left = (c > 0).then(|| idx - 1);
        let right = (c + 1 < n).then(|| idx + 1);
        [up, down, left, right].into_iter().flatten()
    }

    /// Stones of the group at `idx` and its liberty count.
    fn group(&self, board: &[Option<Player>], idx: usize) -> (Vec<usize>, usize) {
        let colour = board[idx];
        let mut stones = vec![idx];
        let mut seen = vec![false; board.len()];
        let mut liberty_seen = vec![false; board.len()];
        let mut liberties = 0;
        seen[idx] = true;
        let mut i = 0;
        while i < stones.len() {
            let here = stones[i];
            for next in self.neighbours(here) {
                if board[next].is_none() {
                    if !liberty_seen[next] {
                        liberty_seen[next] = true;
                        liberties += 1;
                    }
                } else if board[next] == colour && !seen[next] {
                    seen[next] = true;
                    stones.push(next);
                }
            }
            i += 1;
        }
        (stones, liberties)
    }

    /// Board after `player` plays at `idx` plus the captured points, or `None` if illegal.
    fn try_place(&self, idx: usize, player: Player) -> Option<(Vec<Option<Player>>, Vec<usize>)> {
        if self.board[idx].is_some() || self.ko_point == Some(idx) {
            return None;
        }
        let mut board = self.board.clone();
        board[idx] = Some(player);
        let mut captured = Vec::new();
        for next in self.neighbours(idx) {
            if board[next] == Some(player.opponent()) {
                let (stones, liberties) = self.group(&board, next);
                if liberties == 0 {
                    for s in stones {
                        board[s] = None;
                        captured.push(s);
                    }
                }
            }
        }
        let (_, liberties) = self.group(&board, idx);
        (liberties > 0).then_some((board, captured))
    }

    /// Empty point fully surrounded by `player`'s stones.
    fn is_own_eye(&self, idx: usize, player: Player) -> bool {
        self.board[idx].is_none() && self.neighbours(idx).all(|n| self.board[n] == Some(player))
    }

    /// Area score in half points as (black, white), komi included.
    pub fn score(&self) -> (i32, i32) {
        let mut black = 0;
        let mut white = KOMI_HALF_POINTS;
        let mut seen = vec![false; self.board.len()];
        for idx in 0..self.board.len() {
            match self.board[idx] {
                Some(Player::First) => black += 2,
                Some(_) => white += 2,
                None if !seen[idx] => {
                    let mut region = vec![idx];
                    seen[idx] = true;
                    let (mut touches_black, mut touches_white) = (false, false);
                    let mut i = 0;
                    while i < region.len() {
                        for next in self.neighbours(region[i]) {
                            match self.board[next] {
                                Some(Player::First) => touches_black = true,
                                Some(_) => touches_white = true,
                                None if !seen[next] => {
                                    seen[next] = true;
                                    region.push(next);
                                }
                                None => {}
                            }
                        }
                        i += 1;
                    }
                    let area = 2 * region.len() as i32;
                    match (touches_black, touches_white) {
                        (true, false) => black += area,
                        (false, true) => white += area,
                        _ => {}
                    }
                }
                None => {}
            }
        }
        (black, white)
    }

    fn game_ended(&self) -> bool {
        self.consecutive_passes >= 2 || self.plies >= self.max_plies
    }
}

impl fmt::Display for GoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.size {
            write!(f, "{:2} ", r)?;
            for c in 0..self.size {
                let symbol = match self.cell(r, c) {
                    Some(Player::First) => 'X',
                    Some(_) => 'O',
                    None => '+',
                };
                write!(f, "{} ", symbol)?;
            }
            writeln!(f)?;
        }
        write!(f, "   ")?;
        for c in 0..self.size {
            write!(f, "{} ", c % 10)?;
        }
        writeln!(f)
    }
}

impl GameState for GoState {
    type Move = GoMove;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        let size = config.size_in(9, 5..=19)?;
        Self::new(size, config.ply_limit((size * size * 3) as u32)?)
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.game_ended() {
            return Vec::new();
        }
        let n = self.size;
        let mut moves: Vec<GoMove> = (0..n * n)
            .filter(|&i| self.try_place(i, self.current_player).is_some())
            .map(|i| GoMove::Place(i / n, i % n))
            .collect();
        moves.push(GoMove::Pass);
        moves
    }

    fn make_move(&mut self, mv: &Self::Move) {
        self.plies += 1;
        let player = self.current_player;
        self.current_player = player.opponent();
        let (r, c) = match *mv {
            GoMove::Pass => {
                self.consecutive_passes += 1;
                self.ko_point = None;
                return;
            }
            GoMove::Place(r, c) => (r, c),
        };
        let idx = r * self.size + c;
        let Some((board, captured)) = self.try_place(idx, player) else {
            return;
        };
        self.board = board;
        self.consecutive_passes = 0;
        let (stones, liberties) = self.group(&self.board, idx);
        self.ko_point = match captured.as_slice() {
            [single] if stones.len() == 1 && liberties == 1 => Some(*single),
            _ => None,
        };
    }

    fn outcome(&self) -> Outcome {
        if !self.game_ended() {
            return Outcome::InProgress;
        }
        let (black, white) = self.score();
        match black.cmp(&white) {
            std::cmp::Ordering::Greater => Outcome::Win(Player::First),
            std::cmp::Ordering::Less => Outcome::Win(Player::Second),
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    fn current_player(&self) -> Player {
        self.current_player
    }

    fn is_legal(&self, mv: &GoMove) -> bool {
        if self.game_ended() {
            return false;
        }
        match *mv {
            GoMove::Pass => true,
            GoMove::Place(r, c) => {
                r < self.size && c < self.size && self.try_place(r * self.size + c, self.current_player).is_some()
            }
        }
    }
}

/// Random playout move that never fills one of the mover's own eyes.
fn eye_preserving_rollout(state: &GoState, rng: &mut GameRng) -> Option<GoMove> {
    if state.game_ended() {
        return None;
    }
    let me = state.current_player;
    let mut points: Vec<usize> = (0..state.board.len())
        .filter(|&i| state.board[i].is_none() && !state.is_own_eye(i, me))
        .collect();
    rng.shuffle(&mut points);
    let n = state.size;
    points
        .into_iter()
        .find(|&i| state.try_place(i, me).is_some())
        .map(|i| GoMove::Place(i / n, i % n))
        .or(Some(GoMove::Pass))
}

impl Opponent for GoState {
    fn select_move(&self, strategy: &StrategyConfig) -> Result<GoMove, EngineError> {
        mcts::choose(self, strategy, 2_000, eye_preserving_rollout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(game: &mut GoState, moves: &[GoMove]) {
        for mv in moves {
            *game = game.apply(mv).unwrap();
        }
    }

    #[test]
    fn capture_and_ko() {
        let mut game = GoState::new(5, 100).unwrap();
        play(
            &mut game,
            &[
                GoMove::Place(0, 2),
                GoMove::Place(0, 1),
                GoMove::Place(1, 1),
                GoMove::Place(1, 0),
                GoMove::Place(0, 0),
            ],
        );
        // Black's corner stone captured the white stone at (0, 1).
        assert_eq!(game.cell(0, 1), None);
        assert_eq!(game.cell(0, 0), Some(Player::First));
        // Immediate recapture is ko.
        assert!(matches!(game.apply(&GoMove::Place(0, 1)), Err(EngineError::IllegalMove(_))));
        // After an exchange elsewhere the recapture becomes legal.
        play(&mut game, &[GoMove::Place(4, 4), GoMove::Place(3, 3)]);
        let game = game.apply(&GoMove::Place(0, 1)).unwrap();
        assert_eq!(game.cell(0, 0), None);
    }

    #[test]
    fn capture_comes_before_the_liberty_check_on_nine_by_nine() {
        let mut game = GoState::initial_state(&GameConfig::default()).unwrap();
        assert_eq!(game.size, 9);
        play(
            &mut game,
            &[
                GoMove::Place(0, 3),
                GoMove::Place(0, 4),
                GoMove::Place(0, 5),
                GoMove::Place(1, 3),
                GoMove::Place(8, 8),
                GoMove::Place(1, 5),
                GoMove::Place(8, 7),
                GoMove::Place(2, 4),
            ],
        );
        // (1, 4) touches only white stones, but it takes the last liberty of (0, 4).
        assert!(game.is_legal(&GoMove::Place(1, 4)));
        play(&mut game, &[GoMove::Place(1, 4)]);
        assert_eq!(game.cell(0, 4), None);
        assert_eq!(game.cell(1, 4), Some(Player::First));
        assert_eq!(game.cell(1, 3), Some(Player::Second));
        assert_eq!(game.cell(1, 5), Some(Player::Second));
        assert_eq!(game.cell(2, 4), Some(Player::Second));
    }

    #[test]
    fn suicide_is_illegal() {
        let mut game = GoState::new(5, 100).unwrap();
        play(&mut game, &[GoMove::Place(0, 1), GoMove::Place(4, 4), GoMove::Place(1, 0)]);
        assert!(!game.legal_moves().contains(&GoMove::Place(0, 0)));
        assert!(matches!(game.apply(&GoMove::Place(0, 0)), Err(EngineError::IllegalMove(_))));
    }

    #[test]
    fn two_passes_end_the_game_with_komi() {
        let mut game = GoState::new(9, 243).unwrap();
        play(&mut game, &[GoMove::Pass, GoMove::Pass]);
        assert!(game.legal_moves().is_empty());
        assert_eq!(game.score(), (0, KOMI_HALF_POINTS));
        assert_eq!(game.outcome(), Outcome::Win(Player::Second));
        assert_eq!(game.apply(&GoMove::Pass), Err(EngineError::GameOver));
    }

    #[test]
    fn territory_counts_for_the_surrounding_colour() {
        let mut game = GoState::new(5, 100).unwrap();
        // Black walls off column 0 and 1; White plays on the far side.
        for r in 0..5 {
            play(&mut game, &[GoMove::Place(r, 1), GoMove::Place(r, 3)]);
        }
        play(&mut game, &[GoMove::Pass, GoMove::Pass]);
        // Black: 5 stones + 5 territory; White: 5 stones + 5 territory + komi.
        assert_eq!(game.score(), (20, 20 + KOMI_HALF_POINTS));
    }

    #[test]
    fn ply_limit_ends_the_game() {
        let config = GameConfig {
            board_size: Some(5),
            max_plies: Some(2),
            ..GameConfig::default()
        };
        let mut game = GoState::initial_state(&config).unwrap();
        play(&mut game, &[GoMove::Place(2, 2), GoMove::Place(0, 0)]);
        assert!(game.is_terminal());
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    fn cpu_move_is_legal_and_reproducible() {
        let game = GoState::new(5, 75).unwrap().apply(&GoMove::Place(2, 2)).unwrap();
        let strategy = StrategyConfig {
            iterations: Some(200),
            ..StrategyConfig::default()
        };
        let mv = game.select_move(&strategy).unwrap();
        assert!(game.is_legal(&mv));
        assert_eq!(mv, game.select_move(&strategy).unwrap());
    }
}
