//! Board model: a 4x4 grid of gravity columns, 5 cells high.
//!
//! A [`Board`] is a small `Copy` value. Every search node and every playout
//! owns its own board; there is no shared board anywhere in the crate.

use std::fmt;

use thiserror::Error;

use crate::constants::{CELLS, COLUMNS, HEIGHT, SIZE};

/// One of the two players. The discriminant is the cell value used in
/// caller snapshots.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    One = 1,
    Two = 2,
}

impl Player {
    /// The other player.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Numeric identifier (1 or 2).
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Parse a numeric identifier.
    pub fn from_id(id: u8) -> Option<Player> {
        match id {
            1 => Some(Player::One),
            2 => Some(Player::Two),
            _ => None,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A placement: column (x, y) and the height z the piece comes to rest at.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Move {
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Column index in row-major (x, y) order.
    #[inline]
    pub fn column(&self) -> usize {
        self.x * SIZE + self.y
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

/// Why a caller-supplied move was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("column ({x}, {y}) is off the board")]
    OutOfRange { x: usize, y: usize },
    #[error("column ({x}, {y}) is full")]
    ColumnFull { x: usize, y: usize },
    #[error("column ({x}, {y}) drops to height {expected}, not {got}")]
    WrongHeight {
        x: usize,
        y: usize,
        expected: usize,
        got: usize,
    },
}

/// Why a caller-supplied board snapshot was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("cell ({x}, {y}, {z}) holds {value}, expected 0, 1 or 2")]
    InvalidCell { x: usize, y: usize, z: usize, value: u8 },
    #[error("cell ({x}, {y}, {z}) is occupied above an empty cell")]
    Floating { x: usize, y: usize, z: usize },
}

/// Snapshot layout accepted from and returned to callers: `grid[x][y][z]`,
/// 0 for empty, otherwise a player id.
pub type Grid = [[[u8; HEIGHT]; SIZE]; SIZE];

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Option<Player>; CELLS],
    /// Number of pieces in each column; also the next drop height.
    heights: [u8; COLUMNS],
    /// Total number of pieces on the board.
    filled: u8,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// An empty board.
    pub fn new() -> Self {
        Self {
            cells: [None; CELLS],
            heights: [0; COLUMNS],
            filled: 0,
        }
    }

    /// Build a board from a caller snapshot, checking cell values and the
    /// gravity invariant.
    pub fn from_grid(grid: &Grid) -> Result<Self, BoardError> {
        let mut board = Board::new();
        for (x, plane) in grid.iter().enumerate() {
            for (y, column) in plane.iter().enumerate() {
                let mut seen_empty = false;
                for (z, &value) in column.iter().enumerate() {
                    if value == 0 {
                        seen_empty = true;
                        continue;
                    }
                    let player = Player::from_id(value)
                        .ok_or(BoardError::InvalidCell { x, y, z, value })?;
                    if seen_empty {
                        return Err(BoardError::Floating { x, y, z });
                    }
                    board = board.apply(Move::new(x, y, z), player);
                }
            }
        }
        Ok(board)
    }

    /// Export the board as a caller snapshot.
    pub fn to_grid(&self) -> Grid {
        let mut grid = [[[0u8; HEIGHT]; SIZE]; SIZE];
        for (x, plane) in grid.iter_mut().enumerate() {
            for (y, column) in plane.iter_mut().enumerate() {
                for (z, cell) in column.iter_mut().enumerate() {
                    *cell = self.get(x, y, z).map_or(0, Player::id);
                }
            }
        }
        grid
    }

    #[inline]
    fn idx(x: usize, y: usize, z: usize) -> usize {
        (x * SIZE + y) * HEIGHT + z
    }

    /// Owner of a cell; `None` for empty or off-board cells.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<Player> {
        if x >= SIZE || y >= SIZE || z >= HEIGHT {
            return None;
        }
        self.cells[Self::idx(x, y, z)]
    }

    /// Owner of a cell given signed coordinates, for walking lines.
    #[inline]
    pub(crate) fn get_signed(&self, x: isize, y: isize, z: isize) -> Option<Player> {
        if x < 0 || y < 0 || z < 0 {
            return None;
        }
        self.get(x as usize, y as usize, z as usize)
    }

    /// Number of pieces in column (x, y).
    #[inline]
    pub fn height(&self, x: usize, y: usize) -> usize {
        self.heights[x * SIZE + y] as usize
    }

    /// Number of pieces on the board.
    #[inline]
    pub fn filled(&self) -> usize {
        self.filled as usize
    }

    /// True when no empty cell remains.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.filled() == CELLS
    }

    /// The move a piece dropped into column (x, y) would make.
    pub fn drop_move(&self, x: usize, y: usize) -> Result<Move, MoveError> {
        if x >= SIZE || y >= SIZE {
            return Err(MoveError::OutOfRange { x, y });
        }
        let z = self.height(x, y);
        if z >= HEIGHT {
            return Err(MoveError::ColumnFull { x, y });
        }
        Ok(Move::new(x, y, z))
    }

    /// Check that `mv` is exactly the drop move for its column.
    pub fn check_move(&self, mv: Move) -> Result<(), MoveError> {
        let expected = self.drop_move(mv.x, mv.y)?;
        if expected.z != mv.z {
            return Err(MoveError::WrongHeight {
                x: mv.x,
                y: mv.y,
                expected: expected.z,
                got: mv.z,
            });
        }
        Ok(())
    }

    /// Return a new board with `player` placed at `mv`.
    ///
    /// # Panics
    ///
    /// Panics if the target cell is occupied or is not the column's drop
    /// height. Moves must come from [`crate::rules::valid_moves`] or pass
    /// [`Board::check_move`] first.
    pub fn apply(&self, mv: Move, player: Player) -> Board {
        assert!(
            mv.x < SIZE && mv.y < SIZE && mv.z < HEIGHT,
            "move {mv} is off the board"
        );
        let i = Self::idx(mv.x, mv.y, mv.z);
        assert!(self.cells[i].is_none(), "cell {mv} is already occupied");
        assert_eq!(
            self.height(mv.x, mv.y),
            mv.z,
            "move {mv} does not rest on top of its column"
        );
        let mut next = *self;
        next.cells[i] = Some(player);
        next.heights[mv.column()] += 1;
        next.filled += 1;
        next
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board {{ filled: {} }}\n{self}", self.filled)
    }
}

/// Renders one 4x4 layer per height, top layer first. Rows are x, columns y.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for z in (0..HEIGHT).rev() {
            writeln!(f, "z={z}")?;
            for x in 0..SIZE {
                for y in 0..SIZE {
                    let ch = match self.get(x, y, z) {
                        Some(Player::One) => 'X',
                        Some(Player::Two) => 'O',
                        None => '.',
                    };
                    write!(f, "{ch} ")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
