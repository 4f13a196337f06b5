use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CellView;
use crate::data::{GameStatus, Position};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub pos: Position,
    pub value: CellView,
}

/// A game as shown to players: the board is projected through [`CellView`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub id: String,
    pub rows: usize,
    pub cols: usize,
    pub mines: usize,
    pub status: GameStatus,
    pub field: Vec<Vec<CellView>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub created_by: String,
}

impl GameView {
    pub fn cell(&self, pos: Position) -> Option<&CellView> {
        self.field.get(pos.row)?.get(pos.col)
    }

    pub fn won(&self) -> bool {
        self.status == GameStatus::Victory
    }

    pub fn lost(&self) -> bool {
        self.status == GameStatus::Defeat
    }
}
