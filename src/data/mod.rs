use std::fmt;

use derive_more::Display;
use serde::{Deserialize, Serialize};

pub const MIN_ROWS: usize = 3;
pub const MIN_COLS: usize = 3;
pub const MAX_ROWS: usize = 50;
pub const MAX_COLS: usize = 50;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[display("created")]
    Created,
    #[display("started")]
    Started,
    #[display("defeat")]
    Defeat,
    #[display("victory")]
    Victory,
}

impl GameStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Defeat | Self::Victory)
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.row, self.col)
    }
}

/// One cell of the minefield.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub is_mine: bool,
    pub revealed: bool,
    pub flagged: bool,
    /// Only meaningful when `is_mine` is false.
    pub adjacent_mines: u8,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revealed_by: Option<String>,
}

impl Field {
    pub fn new(position: Position) -> Self {
        Self {
            is_mine: false,
            revealed: false,
            flagged: false,
            adjacent_mines: 0,
            position,
            revealed_by: None,
        }
    }
}

/// Row-major grid of fields.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct Board(Vec<Vec<Field>>);

impl Board {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self(
            (0..rows)
                .map(|row| (0..cols).map(|col| Field::new(Position { row, col })).collect())
                .collect(),
        )
    }

    pub fn rows(&self) -> usize {
        self.0.len()
    }

    pub fn cols(&self) -> usize {
        self.0.first().map_or(0, Vec::len)
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows() && pos.col < self.cols()
    }

    pub fn get(&self, pos: Position) -> Option<&Field> {
        self.0.get(pos.row)?.get(pos.col)
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Field> {
        self.0.get_mut(pos.row)?.get_mut(pos.col)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.0.iter().flatten()
    }

    pub fn rows_iter(&self) -> impl Iterator<Item = &[Field]> {
        self.0.iter().map(Vec::as_slice)
    }

    pub fn mine_count(&self) -> usize {
        self.fields().filter(|field| field.is_mine).count()
    }

    /// Positions of the up to eight cells surrounding `pos`, clipped at the edges.
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + use<> {
        let rows = self.rows() as i64;
        let cols = self.cols() as i64;
        let (row, col) = (pos.row as i64, pos.col as i64);

        (-1..=1_i64)
            .flat_map(|dr| (-1..=1_i64).map(move |dc| (dr, dc)))
            .filter(|&(dr, dc)| !(dr == 0 && dc == 0))
            .filter_map(move |(dr, dc)| {
                let new_row = row + dr;
                let new_col = col + dc;

                if new_row >= 0 && new_row < rows && new_col >= 0 && new_col < cols {
                    Some(Position::new(new_row as usize, new_col as usize))
                } else {
                    None
                }
            })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows_iter() {
            for field in row {
                let symbol = if field.flagged {
                    "F".to_string()
                } else if field.revealed && !field.is_mine && field.adjacent_mines > 0 {
                    field.adjacent_mines.to_string()
                } else if field.revealed {
                    "C".to_string()
                } else if field.is_mine {
                    "*".to_string()
                } else {
                    " ".to_string()
                };
                write!(f, "[{}] ", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
