//! # Game Implementations
//!
//! One module per game. Each implements [`GameState`](crate::GameState) for
//! its rules and [`Opponent`](crate::Opponent) for its computer player.
//!
//! ## Supported Games
//! - **Line games**: tic-tac-toe, connect four, gomoku, ultimate tic-tac-toe
//! - **Connection and territory**: hex, go, othello
//! - **Chess family**: chess, shogi, checkers, stratego
//! - **Race and movement**: quoridor, chinese checkers, backgammon, nine men's morris
//! - **Counting and capture**: mancala, dots and boxes
//! - **Hidden information**: battleship, dominoes
//! - **Solitaire puzzles**: mahjong, lights out, 2048
//!
//! ## Adding New Games
//! Create a module with a move type and a state type, implement both traits,
//! then add a line to the dispatch list in `game_wrapper.rs`.

pub mod backgammon;
pub mod battleship;
pub mod checkers;
pub mod chess;
pub mod chinese_checkers;
pub mod connect4;
pub mod dominoes;
pub mod dots_and_boxes;
pub mod go;
pub mod gomoku;
pub mod hex;
pub mod lights_out;
pub mod mahjong;
pub mod mancala;
pub mod morris;
pub mod othello;
pub mod quoridor;
pub mod shogi;
pub mod stratego;
pub mod tictactoe;
pub mod twenty48;
pub mod ultimate_tictactoe;
