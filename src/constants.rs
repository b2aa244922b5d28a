//! Constants for board dimensions, line directions, and search parameters.
//!
//! The board is a 4x4 grid of vertical columns, each holding up to 5 pieces.
//! Cells are stored in a flat array, column-major by (x, y) then height z.

// =============================================================================
// Board Geometry
// =============================================================================

/// Number of columns along each horizontal axis (x and y).
pub const SIZE: usize = 4;

/// Maximum number of pieces stacked in one column.
pub const HEIGHT: usize = 5;

/// Number of vertical columns on the board.
pub const COLUMNS: usize = SIZE * SIZE;

/// Total number of cells.
pub const CELLS: usize = COLUMNS * HEIGHT;

/// Pieces in a row needed to win.
pub const WIN_LENGTH: usize = 4;

/// Furthest step taken from the last move in each direction of a line.
pub const MAX_REACH: isize = WIN_LENGTH as isize - 1;

// =============================================================================
// Line Directions
// =============================================================================

/// The 13 distinct lines through a cell in 3D.
///
/// These are the 26 unit vectors of {-1, 0, 1}^3 minus the origin, with each
/// vector and its negation collapsed into one entry. Win detection walks
/// both ways along every entry.
pub const DIRECTIONS: [(isize, isize, isize); 13] = [
    // Axis-aligned
    (1, 0, 0),
    (0, 1, 0),
    (0, 0, 1),
    // Planar diagonals
    (1, 1, 0),
    (1, -1, 0),
    (1, 0, 1),
    (1, 0, -1),
    (0, 1, 1),
    (0, 1, -1),
    // Space diagonals
    (1, 1, 1),
    (1, 1, -1),
    (1, -1, 1),
    (1, -1, -1),
];

// =============================================================================
// MCTS Parameters
// =============================================================================

/// Default number of simulations per move.
pub const N_SIMS: u32 = 1000;

/// Default UCB1 exploration constant (sqrt 2).
pub const EXPLORATION: f64 = std::f64::consts::SQRT_2;

/// Exploration constant for the easy preset.
pub const EXPLORATION_EASY: f64 = 0.5;

/// Exploration constant for the medium preset.
pub const EXPLORATION_MEDIUM: f64 = 0.6;

/// Exploration constant for the hard preset.
pub const EXPLORATION_HARD: f64 = 0.7;

/// Simulation budget for the easy preset.
pub const N_SIMS_EASY: u32 = 250;

/// Simulation budget for the medium preset.
pub const N_SIMS_MEDIUM: u32 = 1000;

/// Simulation budget for the hard preset.
pub const N_SIMS_HARD: u32 = 2500;

// =============================================================================
// Rewards
// =============================================================================

/// Reward for a playout won by the searching player.
pub const REWARD_WIN: f64 = 1.0;

/// Reward for a drawn playout.
pub const REWARD_DRAW: f64 = 0.5;

/// Reward for a playout lost by the searching player.
pub const REWARD_LOSS: f64 = 0.0;
