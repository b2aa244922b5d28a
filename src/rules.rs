//! Game rules: move generation, win/draw evaluation, and the [`Game`]
//! trait the search is written against.

use std::fmt::Debug;

use crate::board::{Board, Move, Player};
use crate::constants::{DIRECTIONS, HEIGHT, MAX_REACH, SIZE, WIN_LENGTH};

/// State of a game after a placement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    /// The player who just moved completed a line.
    Win,
    /// The board is full and nobody won.
    Draw,
    Ongoing,
}

/// Capabilities the tactics and search modules need from a two-player game.
pub trait Game {
    type State: Clone;
    type Move: Copy + PartialEq + Debug;

    /// Legal moves from `state`, in a deterministic order.
    fn valid_moves(&self, state: &Self::State) -> Vec<Self::Move>;

    /// Return the state after `player` makes `mv`. `mv` must come from
    /// [`Game::valid_moves`].
    fn apply(&self, state: &Self::State, mv: Self::Move, player: Player) -> Self::State;

    /// Status of `state` right after `player` made `last`.
    fn evaluate(&self, state: &Self::State, last: Self::Move, player: Player) -> Status;

    fn opponent(&self, player: Player) -> Player {
        player.opponent()
    }

    /// True if the last placement ended the game or no move remains.
    fn is_terminal(&self, state: &Self::State, last: Option<(Self::Move, Player)>) -> bool {
        if let Some((mv, player)) = last {
            if self.evaluate(state, mv, player) != Status::Ongoing {
                return true;
            }
        }
        self.valid_moves(state).is_empty()
    }
}

/// 3D four-in-a-row on a 4x4x5 gravity board.
#[derive(Copy, Clone, Debug, Default)]
pub struct FourInARow;

impl Game for FourInARow {
    type State = Board;
    type Move = Move;

    fn valid_moves(&self, state: &Board) -> Vec<Move> {
        valid_moves(state)
    }

    fn apply(&self, state: &Board, mv: Move, player: Player) -> Board {
        apply_move(state, mv, player)
    }

    fn evaluate(&self, state: &Board, last: Move, player: Player) -> Status {
        evaluate(state, last, player)
    }
}

/// One move per non-full column at its drop height, columns in row-major
/// (x, y) order.
pub fn valid_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::with_capacity(SIZE * SIZE);
    for x in 0..SIZE {
        for y in 0..SIZE {
            let z = board.height(x, y);
            if z < HEIGHT {
                moves.push(Move::new(x, y, z));
            }
        }
    }
    moves
}

/// Place `player` at `mv` on a copy of `board`.
///
/// # Panics
///
/// Panics if the cell is occupied; see [`Board::apply`].
#[inline]
pub fn apply_move(board: &Board, mv: Move, player: Player) -> Board {
    board.apply(mv, player)
}

#[inline]
pub fn opponent(player: Player) -> Player {
    player.opponent()
}

/// Count consecutive `player` cells from `last` along `(dx, dy, dz)`,
/// not counting `last` itself.
fn run_length(
    board: &Board,
    last: Move,
    player: Player,
    (dx, dy, dz): (isize, isize, isize),
) -> usize {
    let (x, y, z) = (last.x as isize, last.y as isize, last.z as isize);
    let mut count = 0;
    for i in 1..=MAX_REACH {
        if board.get_signed(x + dx * i, y + dy * i, z + dz * i) != Some(player) {
            break;
        }
        count += 1;
    }
    count
}

/// True if `player` has four in a row on some line through `last`.
pub fn is_win(board: &Board, last: Move, player: Player) -> bool {
    DIRECTIONS.iter().any(|&(dx, dy, dz)| {
        let forward = run_length(board, last, player, (dx, dy, dz));
        let backward = run_length(board, last, player, (-dx, -dy, -dz));
        1 + forward + backward >= WIN_LENGTH
    })
}

/// Status of the board right after `player` placed at `last`.
///
/// A win takes precedence over a full board.
pub fn evaluate(board: &Board, last: Move, player: Player) -> Status {
    if is_win(board, last, player) {
        Status::Win
    } else if board.is_full() {
        Status::Draw
    } else {
        Status::Ongoing
    }
}

/// See [`Game::is_terminal`].
pub fn is_terminal(board: &Board, last: Option<(Move, Player)>) -> bool {
    FourInARow.is_terminal(board, last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CELLS, COLUMNS};

    /// Place pieces in order, each dropped onto its column.
    fn place(board: Board, cells: &[(usize, usize, Player)]) -> Board {
        cells.iter().fold(board, |b, &(x, y, p)| {
            let mv = b.drop_move(x, y).unwrap();
            b.apply(mv, p)
        })
    }

    #[test]
    fn test_valid_moves_empty_board() {
        let moves = valid_moves(&Board::new());
        assert_eq!(moves.len(), COLUMNS);
        assert_eq!(moves[0], Move::new(0, 0, 0));
        assert_eq!(moves[1], Move::new(0, 1, 0));
        assert_eq!(moves[15], Move::new(3, 3, 0));
    }

    #[test]
    fn test_valid_moves_skip_full_column() {
        let board = place(Board::new(), &[(1, 1, Player::One); HEIGHT]);
        let moves = valid_moves(&board);
        assert_eq!(moves.len(), COLUMNS - 1);
        assert!(moves.iter().all(|m| (m.x, m.y) != (1, 1)));
    }

    #[test]
    fn test_horizontal_win() {
        let mut board = Board::new();
        for y in 0..3 {
            board = board.apply(Move::new(2, y, 0), Player::Two);
        }
        let last = Move::new(2, 3, 0);
        board = board.apply(last, Player::Two);
        assert_eq!(evaluate(&board, last, Player::Two), Status::Win);
        assert_eq!(evaluate(&board, last, Player::One), Status::Ongoing);
    }

    #[test]
    fn test_vertical_win() {
        let board = place(Board::new(), &[(0, 0, Player::One); 4]);
        assert_eq!(
            evaluate(&board, Move::new(0, 0, 3), Player::One),
            Status::Win
        );
    }

    #[test]
    fn test_space_diagonal_win() {
        // (i, i, i) for i in 0..4, with filler so each piece rests on a stack.
        let mut board = Board::new();
        for i in 0..4 {
            for _ in 0..i {
                board = board.apply(board.drop_move(i, i).unwrap(), Player::Two);
            }
            board = board.apply(Move::new(i, i, i), Player::One);
        }
        assert_eq!(
            evaluate(&board, Move::new(3, 3, 3), Player::One),
            Status::Win
        );
        assert_eq!(
            evaluate(&board, Move::new(1, 1, 1), Player::One),
            Status::Win
        );
    }

    #[test]
    fn test_three_is_not_a_win() {
        let board = place(Board::new(), &[(3, 0, Player::One); 3]);
        assert_eq!(
            evaluate(&board, Move::new(3, 0, 2), Player::One),
            Status::Ongoing
        );
    }

    #[test]
    fn test_full_board_is_terminal() {
        // Fill layer by layer, alternating owners in 2x2 blocks.
        let mut board = Board::new();
        let mut last = Move::new(0, 0, 0);
        let mut last_player = Player::One;
        for z in 0..HEIGHT {
            for x in 0..SIZE {
                for y in 0..SIZE {
                    let block = (x / 2 + y / 2 + z) % 2;
                    let player = if (x + y + block) % 2 == 0 {
                        Player::One
                    } else {
                        Player::Two
                    };
                    last = Move::new(x, y, z);
                    last_player = player;
                    board = board.apply(last, player);
                }
            }
        }
        assert_eq!(board.filled(), CELLS);
        assert!(valid_moves(&board).is_empty());
        let expected = if is_win(&board, last, last_player) {
            Status::Win
        } else {
            Status::Draw
        };
        assert_eq!(evaluate(&board, last, last_player), expected);
        assert!(is_terminal(&board, None));
    }

    #[test]
    fn test_is_terminal_after_win_only() {
        let board = place(Board::new(), &[(0, 0, Player::One); 3]);
        assert!(!is_terminal(&board, Some((Move::new(0, 0, 2), Player::One))));
        let board = board.apply(Move::new(0, 0, 3), Player::One);
        assert!(is_terminal(&board, Some((Move::new(0, 0, 3), Player::One))));
        assert!(!is_terminal(&board, None));
    }

    #[test]
    fn test_opponent() {
        assert_eq!(opponent(Player::One), Player::Two);
        assert_eq!(opponent(Player::Two), Player::One);
        assert_eq!(FourInARow.opponent(Player::Two), Player::One);
    }
}
