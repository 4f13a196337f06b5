use rand::Rng;
use tracing::{debug, instrument};

use crate::data::{Board, MIN_COLS, MIN_ROWS, Position};

/// Raises the dimensions to their minimums and falls back to `rows + cols`
/// mines when the requested count is outside `[1, rows * cols]`.
pub fn normalize(rows: usize, cols: usize, mines: usize) -> (usize, usize, usize) {
    let rows = rows.max(MIN_ROWS);
    let cols = cols.max(MIN_COLS);
    let mines = if mines < 1 || mines > rows * cols {
        rows + cols
    } else {
        mines
    };

    (rows, cols, mines)
}

/// Builds a board and scatters `mines` mines over it by rejection sampling.
#[instrument(level = "trace", skip(rng))]
pub fn generate<R: Rng>(rows: usize, cols: usize, mines: usize, rng: &mut R) -> Board {
    let (rows, cols, mines) = normalize(rows, cols, mines);
    let mut board = Board::new(rows, cols);

    let mut placed = 0;
    let mut draws = 0;
    while placed < mines {
        let pos = Position::new(rng.random_range(0..rows), rng.random_range(0..cols));
        draws += 1;
        if place_mine(&mut board, pos) {
            placed += 1;
        }
    }

    debug!(
        "Generated {}x{} board with {} mines in {} draws",
        rows, cols, mines, draws
    );
    board
}

/// Builds a board with mines at exactly the given positions.
pub fn with_mines(rows: usize, cols: usize, mines: &[Position]) -> Board {
    let mut board = Board::new(rows, cols);
    for &pos in mines {
        place_mine(&mut board, pos);
    }
    board
}

/// Turns `pos` into a mine and bumps the count of each non-mine neighbour.
/// Returns `false` when `pos` is off the board or already a mine.
pub fn place_mine(board: &mut Board, pos: Position) -> bool {
    match board.get_mut(pos) {
        Some(field) if !field.is_mine => {
            field.is_mine = true;
            field.adjacent_mines = 0;
        }
        _ => return false,
    }

    for neighbor in board.neighbors(pos) {
        if let Some(field) = board.get_mut(neighbor)
            && !field.is_mine
        {
            field.adjacent_mines += 1;
        }
    }

    true
}
