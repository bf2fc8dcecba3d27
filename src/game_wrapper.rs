//! # Game Wrapper Module - Unified Game Interface
//!
//! Closes the set of games behind two enums so the session layer, the
//! dispatcher and the terminal driver can hold any game without knowing its
//! types. Dispatch is generated by `impl_game_dispatch!`: one match arm per
//! game, so adding a game is one line in the invocation at the bottom.
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │   Dispatcher    │◄──►│   GameWrapper    │◄──►│  Game-Specific  │
//! │   Session       │    │   MoveWrapper    │    │  GameState +    │
//! │   play binary   │    │                  │    │  Opponent impls │
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//! ```
//!
//! Both enums serialize externally tagged by variant, so a saved state or
//! move names its game.

use crate::config::{GameConfig, StrategyConfig};
use crate::error::EngineError;
use crate::games::backgammon::{BackgammonMove, BackgammonState};
use crate::games::battleship::{BattleshipState, Shot};
use crate::games::checkers::{CheckersMove, CheckersState};
use crate::games::chess::{ChessMove, ChessState};
use crate::games::chinese_checkers::{ChineseCheckersState, HalmaMove};
use crate::games::connect4::{Connect4Move, Connect4State};
use crate::games::dominoes::{DominoMove, DominoesState};
use crate::games::dots_and_boxes::{DotsMove, DotsState};
use crate::games::go::{GoMove, GoState};
use crate::games::gomoku::{GomokuMove, GomokuState};
use crate::games::hex::{HexMove, HexState};
use crate::games::lights_out::{LightsOutState, Press};
use crate::games::mahjong::{MahjongMove, MahjongState};
use crate::games::mancala::{MancalaMove, MancalaState};
use crate::games::morris::{MorrisMove, MorrisState};
use crate::games::othello::{OthelloMove, OthelloState};
use crate::games::quoridor::{QuoridorMove, QuoridorState};
use crate::games::shogi::{ShogiMove, ShogiState};
use crate::games::stratego::{StrategoMove, StrategoState};
use crate::games::tictactoe::{TicTacToeMove, TicTacToeState};
use crate::games::twenty48::{Slide, Twenty48State};
use crate::games::ultimate_tictactoe::{UltimateMove, UltimateState};
use crate::{GameState, Opponent, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Builds the starting position of one game.
pub type StartFn = fn(&GameConfig) -> Result<GameWrapper, EngineError>;

/// The state of any supported game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameWrapper {
    TicTacToe(TicTacToeState),
    Connect4(Connect4State),
    Gomoku(GomokuState),
    Hex(HexState),
    Go(GoState),
    Othello(OthelloState),
    Chess(ChessState),
    Shogi(ShogiState),
    Checkers(CheckersState),
    Morris(MorrisState),
    Mancala(MancalaState),
    DotsAndBoxes(DotsState),
    Quoridor(QuoridorState),
    ChineseCheckers(ChineseCheckersState),
    Stratego(StrategoState),
    Battleship(BattleshipState),
    Dominoes(DominoesState),
    Backgammon(BackgammonState),
    Mahjong(MahjongState),
    LightsOut(LightsOutState),
    Twenty48(Twenty48State),
    UltimateTicTacToe(UltimateState),
}

/// A move of any supported game. Only meaningful against a `GameWrapper`
/// of the same variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveWrapper {
    TicTacToe(TicTacToeMove),
    Connect4(Connect4Move),
    Gomoku(GomokuMove),
    Hex(HexMove),
    Go(GoMove),
    Othello(OthelloMove),
    Chess(ChessMove),
    Shogi(ShogiMove),
    Checkers(CheckersMove),
    Morris(MorrisMove),
    Mancala(MancalaMove),
    DotsAndBoxes(DotsMove),
    Quoridor(QuoridorMove),
    ChineseCheckers(HalmaMove),
    Stratego(StrategoMove),
    Battleship(Shot),
    Dominoes(DominoMove),
    Backgammon(BackgammonMove),
    Mahjong(MahjongMove),
    LightsOut(Press),
    Twenty48(Slide),
    UltimateTicTacToe(UltimateMove),
}

impl fmt::Display for MoveWrapper {
    /// Compact move text for prompts and history listings.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveWrapper::TicTacToe(m) => write!(f, "({},{})", m.0, m.1),
            MoveWrapper::Connect4(m) => write!(f, "column {}", m.0),
            MoveWrapper::Gomoku(m) => write!(f, "({},{})", m.0, m.1),
            MoveWrapper::Hex(m) => write!(f, "({},{})", m.0, m.1),
            MoveWrapper::Go(m) => write!(f, "{:?}", m),
            MoveWrapper::Othello(m) => write!(f, "{:?}", m),
            MoveWrapper::Chess(m) => write!(f, "{}", m),
            MoveWrapper::Shogi(m) => write!(f, "{:?}", m),
            MoveWrapper::Checkers(m) => {
                let path: Vec<String> = m.0.iter().map(usize::to_string).collect();
                write!(f, "{}", path.join("-"))
            }
            MoveWrapper::Morris(m) => write!(f, "{:?}", m),
            MoveWrapper::Mancala(m) => write!(f, "pit {}", m.0),
            MoveWrapper::DotsAndBoxes(m) => write!(f, "{:?}", m),
            MoveWrapper::Quoridor(m) => write!(f, "{:?}", m),
            MoveWrapper::ChineseCheckers(m) => write!(f, "{}->{}", m.from, m.to),
            MoveWrapper::Stratego(m) => write!(f, "{:?}->{:?}", m.from, m.to),
            MoveWrapper::Battleship(m) => write!(f, "fire ({},{})", m.0, m.1),
            MoveWrapper::Dominoes(m) => write!(f, "{:?}", m),
            MoveWrapper::Backgammon(m) => write!(f, "{:?}", m),
            MoveWrapper::Mahjong(m) => write!(f, "{}+{}", m.a, m.b),
            MoveWrapper::LightsOut(m) => write!(f, "press ({},{})", m.0, m.1),
            MoveWrapper::Twenty48(m) => write!(f, "{:?}", m),
            MoveWrapper::UltimateTicTacToe(m) => write!(f, "board {} cell {}", m.board, m.cell),
        }
    }
}

/// Starts a game of type `G` and wraps it.
fn launch<G>(config: &GameConfig) -> Result<GameWrapper, EngineError>
where
    G: GameState + Into<GameWrapper>,
{
    G::initial_state(config).map(Into::into)
}

macro_rules! impl_game_dispatch {
    ($($variant:ident($state:ty) => $id:literal, $title:literal;)*) => {
        $(
            impl From<$state> for GameWrapper {
                fn from(state: $state) -> Self {
                    GameWrapper::$variant(state)
                }
            }
        )*

        /// `(id, title, start)` for every game, in declaration order.
        pub(crate) fn catalogue() -> Vec<(&'static str, &'static str, StartFn)> {
            vec![$(($id, $title, launch::<$state> as StartFn),)*]
        }

        impl GameWrapper {
            /// Registry identifier of the game.
            pub fn id(&self) -> &'static str {
                match self {
                    $(GameWrapper::$variant(_) => $id,)*
                }
            }

            /// Human-readable name of the game.
            pub fn title(&self) -> &'static str {
                match self {
                    $(GameWrapper::$variant(_) => $title,)*
                }
            }

            pub fn legal_moves(&self) -> Vec<MoveWrapper> {
                match self {
                    $(GameWrapper::$variant(g) => g
                        .legal_moves()
                        .into_iter()
                        .map(MoveWrapper::$variant)
                        .collect(),)*
                }
            }

            /// Validated transition. A move of another game is illegal here.
            pub fn apply(&self, mv: &MoveWrapper) -> Result<GameWrapper, EngineError> {
                match (self, mv) {
                    $((GameWrapper::$variant(g), MoveWrapper::$variant(m)) => {
                        g.apply(m).map(GameWrapper::$variant)
                    })*
                    _ if self.is_terminal() => Err(EngineError::GameOver),
                    _ => Err(EngineError::IllegalMove(format!(
                        "{} is a {} move, not a {} move",
                        mv,
                        mv.game_id(),
                        self.id()
                    ))),
                }
            }

            pub fn outcome(&self) -> Outcome {
                match self {
                    $(GameWrapper::$variant(g) => g.outcome(),)*
                }
            }

            pub fn current_player(&self) -> Player {
                match self {
                    $(GameWrapper::$variant(g) => g.current_player(),)*
                }
            }

            pub fn is_terminal(&self) -> bool {
                self.outcome().is_terminal()
            }

            pub fn is_legal(&self, mv: &MoveWrapper) -> bool {
                match (self, mv) {
                    $((GameWrapper::$variant(g), MoveWrapper::$variant(m)) => !g.is_terminal() && g.is_legal(m),)*
                    _ => false,
                }
            }

            /// The computer's choice for the side to move.
            pub fn select_move(&self, strategy: &StrategyConfig) -> Result<MoveWrapper, EngineError> {
                match self {
                    $(GameWrapper::$variant(g) => g.select_move(strategy).map(MoveWrapper::$variant),)*
                }
            }
        }

        impl MoveWrapper {
            /// Registry identifier of the game this move belongs to.
            pub fn game_id(&self) -> &'static str {
                match self {
                    $(MoveWrapper::$variant(_) => $id,)*
                }
            }
        }

        impl fmt::Display for GameWrapper {
            /// Delegates to the specific game's board rendering.
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(GameWrapper::$variant(g) => write!(f, "{}", g),)*
                }
            }
        }
    };
}

impl_game_dispatch! {
    TicTacToe(TicTacToeState) => "tic-tac-toe", "Tic-Tac-Toe";
    Connect4(Connect4State) => "connect-four", "Connect Four";
    Gomoku(GomokuState) => "gomoku", "Gomoku";
    Hex(HexState) => "hex", "Hex";
    Go(GoState) => "go", "Go";
    Othello(OthelloState) => "othello", "Othello";
    Chess(ChessState) => "chess", "Chess";
    Shogi(ShogiState) => "shogi", "Shogi";
    Checkers(CheckersState) => "checkers", "Checkers";
    Morris(MorrisState) => "morris", "Nine Men's Morris";
    Mancala(MancalaState) => "mancala", "Mancala";
    DotsAndBoxes(DotsState) => "dots-and-boxes", "Dots and Boxes";
    Quoridor(QuoridorState) => "quoridor", "Quoridor";
    ChineseCheckers(ChineseCheckersState) => "chinese-checkers", "Chinese Checkers";
    Stratego(StrategoState) => "stratego", "Stratego";
    Battleship(BattleshipState) => "battleship", "Battleship";
    Dominoes(DominoesState) => "dominoes", "Dominoes";
    Backgammon(BackgammonState) => "backgammon", "Backgammon";
    Mahjong(MahjongState) => "mahjong", "Mahjong Solitaire";
    LightsOut(LightsOutState) => "lights-out", "Lights Out";
    Twenty48(Twenty48State) => "2048", "2048";
    UltimateTicTacToe(UltimateState) => "ultimate-tic-tac-toe", "Ultimate Tic-Tac-Toe";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_game_is_catalogued_once() {
        let ids: Vec<&str> = catalogue().iter().map(|(id, _, _)| *id).collect();
        assert_eq!(ids.len(), 22);
        let mut unique = ids.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn wrapped_moves_dispatch_to_their_game() {
        let game = GameWrapper::TicTacToe(TicTacToeState::initial_state(&GameConfig::default()).unwrap());
        assert_eq!(game.id(), "tic-tac-toe");
        assert_eq!(game.legal_moves().len(), 9);
        let next = game.apply(&MoveWrapper::TicTacToe(TicTacToeMove(1, 1))).unwrap();
        assert_eq!(next.current_player(), Player::Second);
        assert_eq!(format!("{}", MoveWrapper::TicTacToe(TicTacToeMove(1, 2))), "(1,2)");
    }

    #[test]
    fn foreign_moves_are_illegal() {
        let game = GameWrapper::TicTacToe(TicTacToeState::initial_state(&GameConfig::default()).unwrap());
        let foreign = MoveWrapper::Connect4(Connect4Move(3));
        assert!(!game.is_legal(&foreign));
        assert!(matches!(game.apply(&foreign), Err(EngineError::IllegalMove(_))));
    }

    #[test]
    fn states_round_trip_through_json_with_their_tag() {
        let game = GameWrapper::Mancala(MancalaState::initial_state(&GameConfig::default()).unwrap());
        let json = serde_json::to_string(&game).unwrap();
        assert!(json.starts_with("{\"Mancala\""));
        let back: GameWrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back, game);
    }
}
