//! Entry points for callers: choose a move for the engine, or apply and
//! judge a move made by someone else.

use std::fmt;

use log::debug;
use thiserror::Error;

use crate::board::{Board, Move, MoveError, Player};
use crate::config::SearchConfig;
use crate::mcts::{dump_children, tree_search};
use crate::rules::{self, FourInARow, Status};
use crate::tactics::{self, Tactic};

/// Errors from [`decide`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("board has no valid moves left")]
    NoValidMoves,
}

/// Result of applying a move with [`apply_and_evaluate`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The game goes on.
    Continue,
    Win(Player),
    Draw,
    /// The move was rejected and the board is unchanged.
    Invalid,
}

impl Outcome {
    /// True for a win or a draw.
    pub fn is_over(&self) -> bool {
        matches!(self, Outcome::Win(_) | Outcome::Draw)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Continue => write!(f, "continue"),
            Outcome::Win(p) => write!(f, "win {p}"),
            Outcome::Draw => write!(f, "draw"),
            Outcome::Invalid => write!(f, "invalid"),
        }
    }
}

/// How a move was chosen.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Reason {
    /// The move wins immediately.
    ImmediateWin,
    /// The only move that stops an immediate opponent win.
    ForcedBlock,
    /// Most visited root child after the tree search.
    Search {
        /// Playouts through the chosen child
        visits: u32,
        /// Average reward of the chosen child for the mover
        winrate: f64,
        /// Whether the choice was limited to safe moves
        restricted: bool,
    },
    /// The search produced no children; a random valid move was taken.
    Fallback,
}

/// A chosen move and why it was chosen.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Decision {
    pub mv: Move,
    pub reason: Reason,
}

/// Choose a move for `player`.
///
/// Tactical shortcuts run first: a winning move is returned at once, and a
/// unique safe move is returned as a forced block. Otherwise the tree search
/// runs for the configured budget and the most visited root child is taken,
/// preferring moves that leave the opponent no immediate win.
pub fn decide(
    board: &Board,
    player: Player,
    config: &SearchConfig,
    rng: &mut fastrand::Rng,
) -> Result<Decision, EngineError> {
    let moves = rules::valid_moves(board);
    if moves.is_empty() {
        return Err(EngineError::NoValidMoves);
    }

    let safe = match tactics::analyze(&FourInARow, board, player) {
        Tactic::Win(mv) => {
            debug!("player {player} wins at {mv}");
            return Ok(Decision {
                mv,
                reason: Reason::ImmediateWin,
            });
        }
        Tactic::Block(mv) => {
            debug!("player {player} blocks at {mv}");
            return Ok(Decision {
                mv,
                reason: Reason::ForcedBlock,
            });
        }
        Tactic::Search { safe } => safe,
    };

    let tree = tree_search(&FourInARow, *board, player, config, rng);
    dump_children(&tree);

    let allowed = (!safe.is_empty()).then_some(safe.as_slice());
    let decision = match tree.best_child(allowed) {
        Some(id) => {
            let child = tree.node(id);
            let mv = child.move_in();
            Decision {
                mv,
                reason: Reason::Search {
                    visits: child.visits,
                    winrate: child.winrate(),
                    restricted: allowed.is_some_and(|s| s.contains(&mv)),
                },
            }
        }
        None => Decision {
            mv: moves[rng.usize(..moves.len())],
            reason: Reason::Fallback,
        },
    };
    debug!(
        "player {player} plays {} after {} simulations ({} safe moves): {:?}",
        decision.mv,
        config.simulations(),
        safe.len(),
        decision.reason
    );
    Ok(decision)
}

/// Choose a move for `player`; see [`decide`].
pub fn decide_move(
    board: &Board,
    player: Player,
    config: &SearchConfig,
    rng: &mut fastrand::Rng,
) -> Result<Move, EngineError> {
    decide(board, player, config, rng).map(|d| d.mv)
}

/// Validate and apply a move, then report the game state.
///
/// Out-of-range, full-column, or wrong-height moves yield
/// [`Outcome::Invalid`] with the board returned unchanged.
pub fn apply_and_evaluate(board: &Board, mv: Move, player: Player) -> (Board, Outcome) {
    match try_apply(board, mv, player) {
        Ok(result) => result,
        Err(err) => {
            debug!("rejected move {mv} for player {player}: {err}");
            (*board, Outcome::Invalid)
        }
    }
}

/// Like [`apply_and_evaluate`], but reports why an invalid move was
/// rejected.
pub fn try_apply(board: &Board, mv: Move, player: Player) -> Result<(Board, Outcome), MoveError> {
    board.check_move(mv)?;
    let next = rules::apply_move(board, mv, player);
    let outcome = match rules::evaluate(&next, mv, player) {
        Status::Win => Outcome::Win(player),
        Status::Draw => Outcome::Draw,
        Status::Ongoing => Outcome::Continue,
    };
    Ok((next, outcome))
}

/// Drop a piece for `player` into column (x, y).
pub fn drop_piece(
    board: &Board,
    x: usize,
    y: usize,
    player: Player,
) -> Result<(Board, Move, Outcome), MoveError> {
    let mv = board.drop_move(x, y)?;
    let (next, outcome) = try_apply(board, mv, player)?;
    Ok((next, mv, outcome))
}
