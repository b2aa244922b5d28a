//! Stack4: a Monte Carlo Tree Search player for 3D four-in-a-row.
//!
//! The game is played on a 4x4 grid of vertical columns, each holding up to
//! five pieces that fall to the lowest free height. Four in a row along any
//! of the 13 lines through a cell wins.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions, line directions, search parameters
//! - [`board`] - Board, player and move types
//! - [`rules`] - Move generation, win/draw evaluation, the [`rules::Game`] trait
//! - [`tactics`] - Immediate win and forced block detection
//! - [`mcts`] - Arena-backed Monte Carlo Tree Search with UCB1
//! - [`playout`] - Random game simulation for position evaluation
//! - [`config`] - Search configuration and difficulty presets
//! - [`engine`] - `decide_move` and `apply_and_evaluate` entry points
//! - [`protocol`] - Line-oriented text protocol
//!
//! ## Example
//!
//! ```
//! use stack4::board::{Board, Move, Player};
//! use stack4::config::SearchConfig;
//! use stack4::engine::{apply_and_evaluate, decide_move, Outcome};
//!
//! // Player 1 opens in a corner column
//! let board = Board::new();
//! let (board, outcome) = apply_and_evaluate(&board, Move::new(0, 0, 0), Player::One);
//! assert_eq!(outcome, Outcome::Continue);
//!
//! // Ask the engine for player 2's reply
//! let config = SearchConfig::new(200, 1.0).unwrap();
//! let mut rng = fastrand::Rng::with_seed(7);
//! let reply = decide_move(&board, Player::Two, &config, &mut rng).unwrap();
//! println!("Engine plays {reply}");
//! ```

pub mod board;
pub mod config;
pub mod constants;
pub mod engine;
pub mod mcts;
pub mod playout;
pub mod protocol;
pub mod rules;
pub mod tactics;
