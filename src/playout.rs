//! Monte Carlo playouts (random game simulation).
//!
//! A playout plays uniformly random legal moves, alternating players, until
//! a placement wins or draws or no move remains.

use crate::board::Player;
use crate::constants::{REWARD_DRAW, REWARD_LOSS, REWARD_WIN};
use crate::rules::{Game, Status};

/// Play out a game from `state` to the end.
///
/// `last` is the placement that produced `state` and who made it, if any;
/// it is checked first so a playout from a finished position returns
/// immediately. `to_move` makes the first random move.
///
/// Returns the winner, or `None` for a draw.
pub fn playout<G: Game>(
    game: &G,
    state: &G::State,
    last: Option<(G::Move, Player)>,
    to_move: Player,
    rng: &mut fastrand::Rng,
) -> Option<Player> {
    let mut state = state.clone();
    let mut player = to_move;

    if let Some((mv, mover)) = last {
        match game.evaluate(&state, mv, mover) {
            Status::Win => return Some(mover),
            Status::Draw => return None,
            Status::Ongoing => {}
        }
    }

    loop {
        let moves = game.valid_moves(&state);
        if moves.is_empty() {
            return None;
        }
        let mv = moves[rng.usize(..moves.len())];
        state = game.apply(&state, mv, player);
        match game.evaluate(&state, mv, player) {
            Status::Win => return Some(player),
            Status::Draw => return None,
            Status::Ongoing => player = game.opponent(player),
        }
    }
}

/// Score a playout result from `perspective`'s point of view: 1 for a
/// win, 0 for a loss, 0.5 for a draw.
#[inline]
pub fn reward(winner: Option<Player>, perspective: Player) -> f64 {
    match winner {
        Some(p) if p == perspective => REWARD_WIN,
        Some(_) => REWARD_LOSS,
        None => REWARD_DRAW,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Move};
    use crate::rules::FourInARow;

    #[test]
    fn test_playout_from_won_position() {
        let mut board = Board::new();
        for _ in 0..4 {
            board = board.apply(board.drop_move(1, 1).unwrap(), Player::Two);
        }
        let mut rng = fastrand::Rng::with_seed(7);
        let winner = playout(
            &FourInARow,
            &board,
            Some((Move::new(1, 1, 3), Player::Two)),
            Player::One,
            &mut rng,
        );
        assert_eq!(winner, Some(Player::Two));
    }

    #[test]
    fn test_playout_is_reproducible() {
        let board = Board::new();
        let run = |seed| {
            let mut rng = fastrand::Rng::with_seed(seed);
            playout(&FourInARow, &board, None, Player::One, &mut rng)
        };
        let (a, b) = (run(42), run(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_reward_perspective() {
        assert_eq!(reward(Some(Player::One), Player::One), 1.0);
        assert_eq!(reward(Some(Player::Two), Player::One), 0.0);
        assert_eq!(reward(None, Player::Two), 0.5);
    }
}
