use serde::{Deserialize, Serialize};

use crate::data::{Field, MAX_COLS, MAX_ROWS, MIN_COLS, MIN_ROWS};

pub mod client;
pub mod server;

/// What a caller is allowed to see of a single field.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "state")]
pub enum CellView {
    #[serde(rename = "hidden")]
    Hidden,
    #[serde(rename = "flagged")]
    Flagged,
    #[serde(rename = "revealed")]
    Revealed { adjacent: u8 },
    #[serde(rename = "mine")]
    Mine,
}

impl CellView {
    /// Projects a field, exposing unrevealed mines only when `show_mines` is set.
    pub fn of(field: &Field, show_mines: bool) -> Self {
        match field {
            Field { flagged: true, .. } => Self::Flagged,
            Field { is_mine: true, revealed, .. } if *revealed || show_mines => Self::Mine,
            Field {
                revealed: true,
                adjacent_mines,
                ..
            } => Self::Revealed {
                adjacent: *adjacent_mines,
            },
            _ => Self::Hidden,
        }
    }
}

impl From<&Field> for CellView {
    fn from(value: &Field) -> Self {
        Self::of(value, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GameParams {
    pub rows: usize,
    pub cols: usize,
    pub mines: usize,
}

impl GameParams {
    pub fn new(rows: usize, cols: usize, mines: usize) -> Self {
        Self { rows, cols, mines }
    }

    /// Applies the creation policy: dimensions within `[3, 50]`, and the
    /// `rows + cols` fallback for a mine count outside `[1, rows * cols]`.
    pub fn normalized(self) -> Self {
        let rows = self.rows.clamp(MIN_ROWS, MAX_ROWS);
        let cols = self.cols.clamp(MIN_COLS, MAX_COLS);
        let mines = if (1..=rows * cols).contains(&self.mines) {
            self.mines
        } else {
            rows + cols
        };

        Self { rows, cols, mines }
    }
}

impl Default for GameParams {
    fn default() -> Self {
        Self {
            rows: 9,
            cols: 9,
            mines: 10,
        }
    }
}
