//! # Backgammon
//!
//! Points are indexed 0..24. First's checkers travel downwards and bear off
//! below point 0; Second's travel upwards and bear off above point 23.
//! `points[i] > 0` counts First's checkers, `< 0` Second's.
//!
//! A move is one checker stepping by one die. The dice are rolled inside
//! `make_move` whenever a turn ends, from the stream `(seed, rolls)`, so the
//! whole game is a pure function of the recorded seed and moves. Players
//! must use as many dice as the position allows, and the larger die when
//! only one of two can be played.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::rng::GameRng;
use crate::search::forced_or_random;
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

const CHECKERS: u8 = 15;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BackgammonMove {
    /// Bring a checker in from the bar.
    Enter { die: u8 },
    /// Move a checker from `from`; stepping past the last point bears it off.
    Step { from: usize, die: u8 },
    /// No die can be played; hand the dice over.
    Pass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgammonState {
    points: Vec<i8>,
    bar: [u8; 2],
    off: [u8; 2],
    /// Dice still to be played this turn, largest first.
    dice: Vec<u8>,
    current_player: Player,
    seed: u64,
    rolls: u64,
    plies: u32,
    max_plies: u32,
}

impl BackgammonState {
    pub fn new(seed: u64, max_plies: u32) -> Self {
        let mut points = vec![0i8; 24];
        for (idx, count) in [(23, 2), (12, 5), (7, 3), (5, 5)] {
            points[idx] = count;
            points[23 - idx] = -count;
        }
        let mut state = Self {
            points,
            bar: [0; 2],
            off: [0; 2],
            dice: Vec::new(),
            current_player: Player::First,
            seed,
            rolls: 0,
            plies: 0,
            max_plies,
        };
        state.roll();
        state
    }

    pub fn dice(&self) -> &[u8] {
        &self.dice
    }

    /// Checkers `player` has on point `idx`.
    pub fn checkers_at(&self, player: Player, idx: usize) -> u8 {
        let n = self.points[idx];
        match player {
            Player::Second if n < 0 => n.unsigned_abs(),
            Player::First if n > 0 => n as u8,
            _ => 0,
        }
    }

    /// Total distance `player` still has to travel.
    pub fn pip_count(&self, player: Player) -> u32 {
        let on_board: u32 = (0..24)
            .map(|i| u32::from(self.checkers_at(player, i)) * Self::distance(player, i))
            .sum();
        on_board + u32::from(self.bar[player.index()]) * 25
    }

    fn distance(player: Player, idx: usize) -> u32 {
        match player {
            Player::Second => 24 - idx as u32,
            _ => idx as u32 + 1,
        }
    }

    fn roll(&mut self) {
        let mut rng = GameRng::for_stream(self.seed, self.rolls);
        self.rolls += 1;
        let a = rng.gen_range(0..6) as u8 + 1;
        let b = rng.gen_range(0..6) as u8 + 1;
        self.dice = if a == b { vec![a; 4] } else { vec![a.max(b), a.min(b)] };
    }

    fn sign(player: Player) -> i8 {
        if player == Player::Second {
            -1
        } else {
            1
        }
    }

    fn open_for(&self, player: Player, idx: usize) -> bool {
        self.checkers_at(player.opponent(), idx) < 2
    }

    fn all_home(&self, player: Player) -> bool {
        self.bar[player.index()] == 0
            && (0..24)
                .filter(|&i| self.checkers_at(player, i) > 0)
                .all(|i| Self::distance(player, i) <= 6)
    }

    /// Where a checker lands, or `None` for bearing off.
    fn target(player: Player, from: usize, die: u8) -> Option<usize> {
        let to = match player {
            Player::Second => from as i32 + i32::from(die),
            _ => from as i32 - i32::from(die),
        };
        (0..24).contains(&to).then_some(to as usize)
    }

    fn step_allowed(&self, from: usize, die: u8) -> bool {
        let me = self.current_player;
        if self.checkers_at(me, from) == 0 {
            return false;
        }
        match Self::target(me, from, die) {
            Some(to) => self.open_for(me, to),
            None => {
                if !self.all_home(me) {
                    return false;
                }
                let needed = Self::distance(me, from);
                // Overshooting is only allowed from the farthest occupied point.
                u32::from(die) == needed
                    || (0..24)
                        .filter(|&i| self.checkers_at(me, i) > 0)
                        .all(|i| Self::distance(me, i) <= needed)
            }
        }
    }

    /// Single steps for each distinct remaining die, ignoring the use-all-dice rule.
    fn step_options(&self) -> Vec<BackgammonMove> {
        let me = self.current_player;
        let mut dice = self.dice.clone();
        dice.dedup();
        let mut out = Vec::new();
        for die in dice {
            if self.bar[me.index()] > 0 {
                let entry = match me {
                    Player::Second => usize::from(die) - 1,
                    _ => 24 - usize::from(die),
                };
                if self.open_for(me, entry) {
                    out.push(BackgammonMove::Enter { die });
                }
                continue;
            }
            for from in 0..24 {
                if self.step_allowed(from, die) {
                    out.push(BackgammonMove::Step { from, die });
                }
            }
        }
        out
    }

    /// Moves one checker and spends the die, without ending the turn.
    fn play_step(&mut self, mv: BackgammonMove) {
        let me = self.current_player;
        let sign = Self::sign(me);
        let (to, die) = match mv {
            BackgammonMove::Enter { die } => {
                self.bar[me.index()] -= 1;
                let entry = match me {
                    Player::Second => usize::from(die) - 1,
                    _ => 24 - usize::from(die),
                };
                (Some(entry), die)
            }
            BackgammonMove::Step { from, die } => {
                self.points[from] -= sign;
                (Self::target(me, from, die), die)
            }
            BackgammonMove::Pass => return,
        };
        match to {
            Some(to) => {
                if self.checkers_at(me.opponent(), to) == 1 {
                    self.points[to] = 0;
                    self.bar[me.opponent().index()] += 1;
                }
                self.points[to] += sign;
            }
            None => self.off[me.index()] += 1,
        }
        if let Some(pos) = self.dice.iter().position(|&d| d == die) {
            self.dice.remove(pos);
        }
    }

    /// Most dice that can still be played this turn.
    fn playable_dice(&self) -> usize {
        if self.off[self.current_player.index()] == CHECKERS {
            return 0;
        }
        let mut best = 0;
        for mv in self.step_options() {
            let mut next = self.clone();
            next.play_step(mv);
            best = best.max(1 + next.playable_dice());
            if best == self.dice.len() {
                break;
            }
        }
        best
    }

    fn end_turn(&mut self) {
        self.dice.clear();
        if self.outcome().is_terminal() {
            return;
        }
        self.current_player = self.current_player.opponent();
        self.roll();
    }

    fn evaluate(&self, me: Player) -> i32 {
        let them = me.opponent();
        let mut score = self.pip_count(them) as i32 - self.pip_count(me) as i32;
        for idx in 0..24 {
            match self.checkers_at(me, idx) {
                1 => score -= 6,
                n if n >= 2 => score += 4,
                _ => {}
            }
        }
        score + 10 * i32::from(self.off[me.index()])
    }

    /// Every way to finish the current turn, deduplicated by resulting position.
    fn turn_endings(&self) -> Vec<(BackgammonMove, BackgammonState)> {
        let mut finished = Vec::new();
        let mut frontier: Vec<(BackgammonMove, BackgammonState)> = self
            .legal_moves()
            .into_iter()
            .map(|mv| {
                let mut next = self.clone();
                next.play_step(mv);
                (mv, next)
            })
            .collect();
        let mut seen = HashSet::new();
        while let Some((first, state)) = frontier.pop() {
            let continuations: Vec<BackgammonMove> = if state.dice.is_empty() || state.is_terminal() {
                Vec::new()
            } else {
                state.legal_moves().into_iter().filter(|m| *m != BackgammonMove::Pass).collect()
            };
            if continuations.is_empty() {
                finished.push((first, state));
                continue;
            }
            for mv in continuations {
                let mut next = state.clone();
                next.play_step(mv);
                if seen.insert((next.points.clone(), next.bar, next.off, next.dice.len())) {
                    frontier.push((first, next));
                }
            }
        }
        finished
    }
}

impl fmt::Display for BackgammonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = |i: usize| match self.points[i] {
            0 => " .".to_string(),
            n if n > 0 => format!("{}x", n),
            n => format!("{}o", -n),
        };
        let top: Vec<String> = (12..24).map(|i| format!("{:>3}", cell(i))).collect();
        let bottom: Vec<String> = (0..12).rev().map(|i| format!("{:>3}", cell(i))).collect();
        writeln!(f, "{}", top.join(""))?;
        writeln!(f, "{}", bottom.join(""))?;
        writeln!(
            f,
            "bar x{} o{}  off x{} o{}  dice {:?}  {} to move",
            self.bar[0], self.bar[1], self.off[0], self.off[1], self.dice, self.current_player
        )
    }
}

impl GameState for BackgammonState {
    type Move = BackgammonMove;

    fn initial_state(config: &GameConfig) -> Result<Self, EngineError> {
        Ok(Self::new(config.seed, config.ply_limit(2_000)?))
    }

    fn legal_moves(&self) -> Vec<Self::Move> {
        if self.is_terminal() {
            return Vec::new();
        }
        let usable = self.playable_dice();
        if usable == 0 {
            return vec![BackgammonMove::Pass];
        }
        let mut moves: Vec<BackgammonMove> = self
            .step_options()
            .into_iter()
            .filter(|&mv| {
                let mut next = self.clone();
                next.play_step(mv);
                1 + next.playable_dice() == usable
            })
            .collect();
        let two_distinct = self.dice.len() == 2 && self.dice[0] != self.dice[1];
        if usable == 1 && two_distinct {
            let larger = self.dice[0];
            let die_of = |mv: &BackgammonMove| match *mv {
                BackgammonMove::Enter { die } | BackgammonMove::Step { die, .. } => die,
                BackgammonMove::Pass => 0,
            };
            if moves.iter().any(|m| die_of(m) == larger) {
                moves.retain(|m| die_of(m) == larger);
            }
        }
        moves
    }

    fn make_move(&mut self, mv: &Self::Move) {
        self.plies += 1;
        if *mv == BackgammonMove::Pass {
            self.end_turn();
            return;
        }
        self.play_step(*mv);
        if self.dice.is_empty() || self.is_terminal() || self.playable_dice() == 0 {
            self.end_turn();
        }
    }

    fn outcome(&self) -> Outcome {
        for player in [Player::First, Player::Second] {
            if self.off[player.index()] == CHECKERS {
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
}

impl Opponent for BackgammonState {
    /// Plays the first step of the complete turn with the best static value.
    fn select_move(&self, strategy: &StrategyConfig) -> Result<BackgammonMove, EngineError> {
        let mut rng = GameRng::new(strategy.seed);
        if let Some(mv) = forced_or_random(self, strategy, &mut rng)? {
            return Ok(mv);
        }
        let me = self.current_player;
        let mut best: Option<(i32, BackgammonMove)> = None;
        for (first, end) in self.turn_endings() {
            let value = if end.outcome() == Outcome::Win(me) {
                i32::MAX
            } else {
                end.evaluate(me)
            };
            if best.map_or(true, |(b, _)| value > b) {
                best = Some((value, first));
            }
        }
        best.map(|(_, mv)| mv).ok_or(EngineError::GameOver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// First to move with the given dice on an otherwise empty board.
    fn position(first: &[(usize, i8)], second: &[(usize, i8)], dice: Vec<u8>) -> BackgammonState {
        let mut game = BackgammonState::new(0, 2_000);
        game.points = vec![0; 24];
        for &(idx, n) in first {
            game.points[idx] = n;
        }
        for &(idx, n) in second {
            game.points[idx] = -n;
        }
        let on_board = |p: Player| (0..24).map(|i| game.checkers_at(p, i)).sum::<u8>();
        game.off = [CHECKERS - on_board(Player::First), CHECKERS - on_board(Player::Second)];
        game.dice = dice;
        game
    }

    #[test]
    fn standard_setup() {
        let game = BackgammonState::new(3, 2_000);
        assert_eq!(game.pip_count(Player::First), 167);
        assert_eq!(game.pip_count(Player::Second), 167);
        assert_eq!(game.current_player(), Player::First);
        assert!(game.dice().len() == 2 || game.dice().len() == 4);
        assert_eq!(game, BackgammonState::new(3, 2_000));
    }

    #[test]
    fn both_dice_must_be_used_when_possible() {
        // The 6 alone is blocked; 1 then 6 plays both dice.
        let game = position(&[(10, 1), (0, 2)], &[(4, 2), (20, 2)], vec![6, 1]);
        let moves = game.legal_moves();
        assert!(moves.contains(&BackgammonMove::Step { from: 10, die: 1 }));
        assert!(!moves.contains(&BackgammonMove::Step { from: 10, die: 6 }));
    }

    #[test]
    fn larger_die_when_only_one_fits() {
        let game = position(&[(10, 1)], &[(3, 2), (8, 2), (20, 2)], vec![6, 1]);
        assert_eq!(game.legal_moves(), vec![BackgammonMove::Step { from: 10, die: 6 }]);
    }

    #[test]
    fn bar_checkers_enter_first_and_blocked_dice_pass() {
        let mut game = position(&[(10, 2)], &[(3, 2), (20, 2), (18, 2)], vec![4, 6]);
        game.bar[0] = 1;
        game.off[0] -= 1;
        // Entry on 24 - 4 = 20 is blocked, 24 - 6 = 18 too.
        assert_eq!(game.legal_moves(), vec![BackgammonMove::Pass]);
        game.dice = vec![5, 4];
        assert_eq!(game.legal_moves(), vec![BackgammonMove::Enter { die: 5 }]);
    }

    #[test]
    fn hitting_a_blot_sends_it_to_the_bar() {
        let game = position(&[(10, 2)], &[(7, 1), (20, 2)], vec![3, 3, 3, 3]);
        let next = game.apply(&BackgammonMove::Step { from: 10, die: 3 }).unwrap();
        assert_eq!(next.bar[1], 1);
        assert_eq!(next.checkers_at(Player::First, 7), 1);
        assert_eq!(next.dice(), &[3, 3, 3]);
    }

    #[test]
    fn bearing_off_needs_everyone_home_and_overshoots_from_the_back() {
        let game = position(&[(1, 1), (3, 1)], &[(20, 2)], vec![6, 5]);
        let moves = game.legal_moves();
        // Only the checker on the farthest point may overshoot.
        assert!(moves.contains(&BackgammonMove::Step { from: 3, die: 6 }));
        assert!(!moves.contains(&BackgammonMove::Step { from: 1, die: 6 }));

        let not_home = position(&[(1, 1), (9, 1)], &[(20, 2)], vec![2, 1]);
        assert!(!not_home.legal_moves().contains(&BackgammonMove::Step { from: 1, die: 2 }));
    }

    #[test]
    fn last_checker_off_wins() {
        let game = position(&[(0, 1)], &[(20, 2)], vec![2, 1]);
        let done = game.apply(&BackgammonMove::Step { from: 0, die: 2 }).unwrap();
        assert_eq!(done.outcome(), Outcome::Win(Player::First));
        assert!(done.legal_moves().is_empty());
    }

    #[test]
    fn turn_passes_with_fresh_dice() {
        let game = position(&[(10, 1)], &[(3, 2), (8, 2), (20, 2)], vec![6, 1]);
        let next = game.apply(&BackgammonMove::Step { from: 10, die: 6 }).unwrap();
        assert_eq!(next.current_player(), Player::Second);
        assert!(next.dice().len() == 2 || next.dice().len() == 4);
        assert_eq!(next, game.apply(&BackgammonMove::Step { from: 10, die: 6 }).unwrap());
    }

    #[test]
    fn cpu_hits_the_lone_blot() {
        let game = position(&[(12, 2), (5, 13)], &[(9, 1), (18, 14)], vec![3, 3, 3, 3]);
        let mv = game.select_move(&StrategyConfig::default()).unwrap();
        assert!(game.is_legal(&mv));
        let ends = game.turn_endings();
        let (_, best) = ends
            .iter()
            .max_by_key(|(_, s)| s.evaluate(Player::First))
            .unwrap();
        assert_eq!(best.bar[1], 1);
    }
}
