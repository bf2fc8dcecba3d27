//! # Quoridor
//!
//! 9×9 board, one pawn and ten walls per player. First starts at the bottom
//! centre and races to row 0; Second starts at the top and races to row 8.
//!
//! A wall is two cells long and is named by its top-left anchor `(r, c)`,
//! `0 <= r, c < 8`: a horizontal wall separates rows `r` and `r + 1` across
//! columns `c` and `c + 1`; a vertical wall separates columns `c` and `c + 1`
//! down rows `r` and `r + 1`. Walls may not overlap or cross, and must leave
//! both pawns a path to their goal.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::search::alphabeta;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

const N: usize = 9;
const SLOTS: usize = N - 1;
const WALLS_EACH: u8 = 10;
const STEPS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum QuoridorMove {
    /// Pawn move (including jumps) to the given cell.
    Step(usize, usize),
    HorizontalWall(usize, usize),
    VerticalWall(usize, usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoridorState {
    pawns: [(usize, usize); 2],
    walls_left: [u8; 2],
    horizontal: Vec<bool>,
    vertical: Vec<bool>,
    current_player: Player,
    plies: u32,
    max_plies: u32,
}

fn goal_row(player: Player) -> usize {
    if player == Player::First {
        0
    } else {
        N - 1
    }
}

impl QuoridorState {
    pub fn new(max_plies: u32) -> Self {
        Self {
            pawns: [(N - 1, N / 2), (0, N / 2)],
            walls_left: [WALLS_EACH; 2],
            horizontal: vec![false; SLOTS * SLOTS],
            vertical: vec![false; SLOTS * SLOTS],
            current_player: Player::First,
            plies: 0,
            max_plies,
        }
    }

    pub fn pawn(&self, player: Player) -> (usize, usize) {
        self.pawns[player.index()]
    }

    pub fn walls_left(&self, player: Player) -> u8 {
        self.walls_left[player.index()]
    }

    fn wall(walls: &[bool], r: i32, c: i32) -> bool {
        (0..SLOTS as i32).contains(&r) && (0..SLOTS as i32).contains(&c) && walls[(r * SLOTS as i32 + c) as usize]
    }

    /// Neighbouring cell in direction (dr, dc) unless a wall or the edge is in the way.
    fn open_step(&self, (r, c): (usize, usize), (dr, dc): (i32, i32)) -> Option<(usize, usize)> {
        let (nr, nc) = (r as i32 + dr, c as i32 + dc);
        if !(0..N as i32).contains(&nr) || !(0..N as i32).contains(&nc) {
            return None;
        }
        let (r, c) = (r as i32, c as i32);
        let blocked = match (dr, dc) {
            (-1, 0) => Self::wall(&self.horizontal, r - 1, c) || Self::wall(&self.horizontal, r - 1, c - 1),
            (1, 0) => Self::wall(&self.horizontal, r, c) || Self::wall(&self.horizontal, r, c - 1),
            (0, -1) => Self::wall(&self.vertical, r, c - 1) || Self::wall(&self.vertical, r - 1, c - 1),
            _ => Self::wall(&self.vertical, r, c) || Self::wall(&self.vertical, r - 1, c),
        };
        (!blocked).then_some((nr as usize, nc as usize))
    }

    /// Shortest wall-respecting path to the goal row, pawns ignored.
    pub fn shortest_path(&self, player: Player) -> Option<Vec<(usize, usize)>> {
        let start = self.pawn(player);
        let goal = goal_row(player);
        let mut parent: Vec<Option<(usize, usize)>> = vec![None; N * N];
        let mut seen = vec![false; N * N];
        let mut queue = VecDeque::from([start]);
        seen[start.0 * N + start.1] = true;
        while let Some(cell) = queue.pop_front() {
            if cell.0 == goal {
                let mut path = vec![cell];
                let mut cur = cell;
                while let Some(prev) = parent[cur.0 * N + cur.1] {
                    path.push(prev);
                    cur = prev;
                }
                path.reverse();
                return Some(path);
            }
            for dir in STEPS {
                if let Some(next) = self.open_step(cell, dir) {
                    let idx = next.0 * N + next.1;
                    if !seen[idx] {
                        seen[idx] = true;
                        parent[idx] = Some(cell);
                        queue.push_back(next);
                    }
                }
            }
        }
        None
    }

    fn distance(&self, player: Player) -> Option<usize> {
        self.shortest_path(player).map(|p| p.len() - 1)
    }

    fn pawn_moves(&self) -> Vec<QuoridorMove> {
        let me = self.pawn(self.current_player);
        let them = self.pawn(self.current_player.opponent());
        let mut out = Vec::new();
        for dir in STEPS {
            let Some(next) = self.open_step(me, dir) else { continue };
            if next != them {
                out.push(QuoridorMove::Step(next.0, next.1));
                continue;
            }
            if let Some(beyond) = self.open_step(them, dir) {
                out.push(QuoridorMove::Step(beyond.0, beyond.1));
                continue;
            }
            let sides = if dir.0 == 0 { [(-1, 0), (1, 0)] } else { [(0, -1), (0, 1)] };
            for side in sides {
                if let Some(diag) = self.open_step(them, side) {
                    out.push(QuoridorMove::Step(diag.0, diag.1));
                }
            }
        }
        out
    }

    fn wall_fits(&self, horizontal: bool, r: usize, c: usize) -> bool {
        if r >= SLOTS || c >= SLOTS || self.walls_left[self.current_player.index()] == 0 {
            return false;
        }
        let (ri, ci) = (r as i32, c as i32);
        let idx = r * SLOTS + c;
        if self.horizontal[idx] || self.vertical[idx] {
            return false;
        }
        let overlaps = if horizontal {
            Self::wall(&self.horizontal, ri, ci - 1) || Self::wall(&self.horizontal, ri, ci + 1)
        } else {
            Self::wall(&self.vertical, ri - 1, ci) || Self::wall(&self.vertical, ri + 1, ci)
        };
        if overlaps {
            return false;
        }
        let mut probe = self.clone();
        if horizontal {
            probe.horizontal[idx] = true;
        } else {
            probe.vertical[idx] = true;
        }
        probe.distance(Player::First).is_some() && probe.distance(Player::Second).is_some()
    }

    fn wall_moves_near(&self, cells: &[(usize, usize)]) -> Vec<QuoridorMove> {
        let mut anchors: Vec<(usize, usize)> = Vec::new();
        for &(r, c) in cells {
            for (ar, ac) in [(r, c), (r.wrapping_sub(1), c), (r, c.wrapping_sub(1)), (r.wrapping_sub(1), c.wrapping_sub(1))] {
                if ar < SLOTS && ac < SLOTS && !anchors.contains(&(ar, ac)) {
                    anchors.push((ar, ac));
                }
            }
        }
        let mut out = Vec::new();
        for (r, c) in anchors {
            if self.wall_fits(true, r, c) {
                out.push(QuoridorMove::HorizontalWall(r, c));
            }
            if self.wall_fits(false, r, c) {
                out.push(QuoridorMove::VerticalWall(r, c));
            }
        }
        out
    }

    /// Pawn moves plus walls that touch the opponent's current shortest path.
    fn candidate_moves(&self) -> Vec<QuoridorMove> {
        let mut moves = self.pawn_moves();
        if let Some(path) = self.shortest_path(self.current_player.opponent()) {
            moves.extend(self.wall_moves_near(&path));
        }
        moves
    }

    fn evaluate(&self, me: Player) -> i32 {
        let far = (N * N) as i32;
        let mine = self.distance(me).map_or(far, |d| d as i32);
        let theirs = self.distance(me.opponent()).map_or(far, |d| d as i32);
        let walls = self.walls_left[me.index()] as i32 - self.walls_left[me.opponent().index()] as i32;
        (theirs - mine) * 10 + walls
    }
}

impl fmt::Display for QuoridorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..N {
            let mut cells = String::new();
            let mut under = String::new();
            for c in 0..N {
                cells.push(if self.pawns[0] == (r, c) {
                    '1'
                } else if self.pawns[1] == (r, c) {
                    '2'
                } else {
                    '.'
                });
                if c + 1 < N {
                    cells.push(if self.open_step((r, c), (0, 1)).is_some() { ' ' } else { '|' });
                }
                under.push(if r + 1 < N && self.open_step((r, c), (1, 0)).is_none() { '-' } else { ' ' });
                under.push(' ');
            }
            writeln!(f, "{}", cells)?;
            writeln!(f, "{}", under)?;
        }
        writeln!(f, "walls left: 1={} 2={}", self.walls_left[0], self.walls_left[1])
    }
}

impl GameState for QuoridorState {
    type Move = QuoridorMove;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        Ok(Self::new(config.ply_limit(200)?))
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.is_terminal() {
            return Vec::new();
        }
        let mut moves = self.pawn_moves();
        for r in 0..SLOTS {
            for c in 0..SLOTS {
                if self.wall_fits(true, r, c) {
                    moves.push(QuoridorMove::HorizontalWall(r, c));
                }
                if self.wall_fits(false, r, c) {
                    moves.push(QuoridorMove::VerticalWall(r, c));
                }
            }
        }
        moves
    }

    fn make_move(&mut self, mv: &Self::Move) {
        let me = self.current_player.index();
        match *mv {
            QuoridorMove::Step(r, c) => self.pawns[me] = (r, c),
            QuoridorMove::HorizontalWall(r, c) => {
                self.horizontal[r * SLOTS + c] = true;
                self.walls_left[me] -= 1;
            }
            QuoridorMove::VerticalWall(r, c) => {
                self.vertical[r * SLOTS + c] = true;
                self.walls_left[me] -= 1;
            }
        }
        self.plies += 1;
        self.current_player = self.current_player.opponent();
    }

    fn outcome(&self) -> Outcome {
        for player in [Player::First, Player::Second] {
            if self.pawn(player).0 == goal_row(player) {
                return Outcome::Win(player);
            }
        }
        if self.plies >= self.max_plies {
            Outcome::Draw
        } else {
            Outcome::InProgress
        }
    }

    fn current_player(&self) -> Player {
        self.current_player
    }

    fn is_legal(&self, mv: &QuoridorMove) -> bool {
        if self.is_terminal() {
            return false;
        }
        match *mv {
            QuoridorMove::Step(..) => self.pawn_moves().contains(mv),
            QuoridorMove::HorizontalWall(r, c) => self.wall_fits(true, r, c),
            QuoridorMove::VerticalWall(r, c) => self.wall_fits(false, r, c),
        }
    }
}

impl Opponent for QuoridorState {
    fn select_move(&self, strategy: &StrategyConfig) -> Result<QuoridorMove, EngineError> {
        alphabeta::choose_with(
            self,
            strategy,
            2,
            |s: &Self| s.candidate_moves(),
            |s: &Self, me| s.evaluate(me),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_moves() {
        let game = QuoridorState::new(200);
        let steps = game
            .legal_moves()
            .into_iter()
            .filter(|m| matches!(m, QuoridorMove::Step(..)))
            .count();
        assert_eq!(steps, 3);
        assert_eq!(game.legal_moves().len(), 3 + 2 * SLOTS * SLOTS);
    }

    #[test]
    fn walls_must_leave_a_path() {
        let mut game = QuoridorState::new(200);
        let walls = [
            QuoridorMove::HorizontalWall(3, 0),
            QuoridorMove::HorizontalWall(3, 2),
            QuoridorMove::HorizontalWall(3, 4),
            QuoridorMove::HorizontalWall(3, 6),
            QuoridorMove::VerticalWall(3, 7),
        ];
        for (i, wall) in walls.iter().enumerate() {
            game = game.apply(wall).unwrap();
            let shuffle = if i % 2 == 0 { QuoridorMove::Step(0, 5) } else { QuoridorMove::Step(0, 4) };
            game = game.apply(&shuffle).unwrap();
        }
        assert_eq!(game.walls_left(Player::First), 5);
        // The only crossing left is the (3,8)-(4,8) corridor; sealing it is refused.
        assert!(matches!(
            game.apply(&QuoridorMove::HorizontalWall(2, 7)),
            Err(EngineError::IllegalMove(_))
        ));
        assert!(game.apply(&QuoridorMove::HorizontalWall(5, 0)).is_ok());
    }

    #[test]
    fn last_wall_cannot_seal_the_board() {
        let mut game = QuoridorState::new(200);
        let walls = [
            QuoridorMove::HorizontalWall(3, 0),
            QuoridorMove::HorizontalWall(3, 2),
            QuoridorMove::HorizontalWall(3, 4),
            QuoridorMove::HorizontalWall(3, 6),
            QuoridorMove::VerticalWall(3, 7),
            QuoridorMove::HorizontalWall(6, 0),
            QuoridorMove::HorizontalWall(6, 2),
            QuoridorMove::HorizontalWall(6, 4),
            QuoridorMove::HorizontalWall(6, 6),
        ];
        for (i, wall) in walls.iter().enumerate() {
            game = game.apply(wall).unwrap();
            let shuffle = if i % 2 == 0 { QuoridorMove::Step(0, 5) } else { QuoridorMove::Step(0, 4) };
            game = game.apply(&shuffle).unwrap();
        }
        assert_eq!(game.walls_left(Player::First), 1);
        // Column 8 is the only way through both barriers; the tenth wall may not close it.
        assert!(matches!(
            game.apply(&QuoridorMove::HorizontalWall(2, 7)),
            Err(EngineError::IllegalMove(_))
        ));
        assert_eq!(game.walls_left(Player::First), 1);
        let spent = game.apply(&QuoridorMove::HorizontalWall(0, 0)).unwrap();
        assert_eq!(spent.walls_left(Player::First), 0);
    }

    #[test]
    fn overlapping_and_crossing_walls_are_refused() {
        let game = QuoridorState::new(200).apply(&QuoridorMove::HorizontalWall(4, 4)).unwrap();
        assert!(!game.is_legal(&QuoridorMove::HorizontalWall(4, 4)));
        assert!(!game.is_legal(&QuoridorMove::HorizontalWall(4, 5)));
        assert!(!game.is_legal(&QuoridorMove::HorizontalWall(4, 3)));
        assert!(!game.is_legal(&QuoridorMove::VerticalWall(4, 4)));
        assert!(game.is_legal(&QuoridorMove::HorizontalWall(4, 6)));
        assert!(game.is_legal(&QuoridorMove::VerticalWall(3, 4)));
    }

    #[test]
    fn facing_pawns_jump_or_sidestep() {
        let mut game = QuoridorState::new(200);
        game.pawns = [(4, 4), (3, 4)];
        assert!(game.legal_moves().contains(&QuoridorMove::Step(2, 4)));

        game.horizontal[2 * SLOTS + 4] = true;
        let steps: Vec<_> = game
            .legal_moves()
            .into_iter()
            .filter(|m| matches!(m, QuoridorMove::Step(..)))
            .collect();
        assert!(!steps.contains(&QuoridorMove::Step(2, 4)));
        assert!(steps.contains(&QuoridorMove::Step(3, 3)));
        assert!(steps.contains(&QuoridorMove::Step(3, 5)));
    }

    #[test]
    fn reaching_the_far_row_wins() {
        let mut game = QuoridorState::new(200);
        game.pawns = [(1, 0), (7, 8)];
        let mv = game.select_move(&StrategyConfig::default()).unwrap();
        assert_eq!(mv, QuoridorMove::Step(0, 0));
        let done = game.apply(&mv).unwrap();
        assert_eq!(done.outcome(), Outcome::Win(Player::First));
        assert!(done.legal_moves().is_empty());
    }

    #[test]
    fn no_walls_once_spent() {
        let mut game = QuoridorState::new(200);
        game.walls_left = [0, 10];
        assert!(game
            .legal_moves()
            .iter()
            .all(|m| matches!(m, QuoridorMove::Step(..))));
    }
}
