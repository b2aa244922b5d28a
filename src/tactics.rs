//! One- and two-ply tactical checks run before the tree search.
//!
//! Random playouts are weakest at exactly these two situations: an open win
//! on the board, and a move that hands the opponent a win. With at most 16
//! moves per ply both checks are exhaustive and cheap.

use crate::board::Player;
use crate::rules::{Game, Status};

/// What the tactical layer found for the player to move.
#[derive(Clone, Debug, PartialEq)]
pub enum Tactic<M> {
    /// This move wins on the spot.
    Win(M),
    /// This is the only move that does not hand the opponent a win.
    Block(M),
    /// No shortcut. `safe` lists the moves after which the opponent has no
    /// immediate win; it may be empty if every move loses.
    Search { safe: Vec<M> },
}

/// First move (in [`Game::valid_moves`] order) that wins for `player`.
pub fn immediate_win<G: Game>(game: &G, state: &G::State, player: Player) -> Option<G::Move> {
    game.valid_moves(state).into_iter().find(|&mv| {
        let next = game.apply(state, mv, player);
        game.evaluate(&next, mv, player) == Status::Win
    })
}

/// True if the opponent has a winning reply in `state`.
fn opponent_can_win<G: Game>(game: &G, state: &G::State, player: Player) -> bool {
    immediate_win(game, state, game.opponent(player)).is_some()
}

/// Moves for `player` after which the opponent has no immediate winning
/// reply, in [`Game::valid_moves`] order.
pub fn safe_moves<G: Game>(game: &G, state: &G::State, player: Player) -> Vec<G::Move> {
    game.valid_moves(state)
        .into_iter()
        .filter(|&mv| {
            let next = game.apply(state, mv, player);
            if game.evaluate(&next, mv, player) != Status::Ongoing {
                return true;
            }
            !opponent_can_win(game, &next, player)
        })
        .collect()
}

/// Run both checks: an immediate win first, then the forced block.
pub fn analyze<G: Game>(game: &G, state: &G::State, player: Player) -> Tactic<G::Move> {
    if let Some(mv) = immediate_win(game, state, player) {
        return Tactic::Win(mv);
    }
    let safe = safe_moves(game, state, player);
    if let [only] = safe.as_slice() {
        return Tactic::Block(*only);
    }
    Tactic::Search { safe }
}
