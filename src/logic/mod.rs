use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};

use crate::{
    data::{Board, Field, GameStatus, Position},
    error::GameError,
    model::{
        CellView, GameParams,
        client::ClickKind,
        server::{CellUpdate, GameView},
    },
};

pub mod generate;

/// Result of a click that the game accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The target was already revealed.
    Unchanged,
    Applied { updates: Vec<CellUpdate> },
    Victory { updates: Vec<CellUpdate> },
    /// An unflagged mine went off at `at`. `updates` shows every mine.
    Defeat { at: Position, updates: Vec<CellUpdate> },
}

impl ClickOutcome {
    pub fn updates(&self) -> &[CellUpdate] {
        match self {
            Self::Unchanged => &[],
            Self::Applied { updates } | Self::Victory { updates } | Self::Defeat { updates, .. } => {
                updates.as_slice()
            }
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self, Self::Victory { .. } | Self::Defeat { .. })
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    id: String,
    rows: usize,
    cols: usize,
    mines: usize,
    status: GameStatus,
    board: Board,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    finished_at: Option<DateTime<Utc>>,
    created_by: String,
}

fn reveal_field(field: &mut Field, actor: &str) {
    field.revealed = true;
    field.revealed_by = Some(actor.to_string());
}

impl Game {
    pub fn new(id: impl Into<String>, params: GameParams, creator: &str) -> Self {
        Self::with_rng(id, params, creator, &mut rand::rng())
    }

    pub fn with_rng<R: Rng>(
        id: impl Into<String>,
        params: GameParams,
        creator: &str,
        rng: &mut R,
    ) -> Self {
        let params = params.normalized();
        let board = generate::generate(params.rows, params.cols, params.mines, rng);
        Self::from_board(id, board, creator)
    }

    /// Wraps an already generated board in a fresh game in `Created` status.
    pub fn from_board(id: impl Into<String>, board: Board, creator: &str) -> Self {
        let id = id.into();
        info!(
            "Creating new game {}: {}x{} with {} mines",
            id,
            board.rows(),
            board.cols(),
            board.mine_count()
        );
        Self {
            id,
            rows: board.rows(),
            cols: board.cols(),
            mines: board.mine_count(),
            status: GameStatus::Created,
            board,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            created_by: creator.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn mines(&self) -> usize {
        self.mines
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn field(&self, pos: Position) -> Option<&Field> {
        self.board.get(pos)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn is_active(&self) -> bool {
        self.status == GameStatus::Started
    }

    #[instrument(level = "trace", skip(self), fields(game_id = %self.id))]
    pub fn start(&mut self) -> Result<(), GameError> {
        if self.status != GameStatus::Created {
            warn!("Cannot start game {} in status {}", self.id, self.status);
            return Err(GameError::InvalidTransition {
                status: self.status,
            });
        }

        self.status = GameStatus::Started;
        self.started_at = Some(Utc::now());
        info!("Game {} started", self.id);
        Ok(())
    }

    #[instrument(level = "trace", skip(self), fields(game_id = %self.id, row = pos.row, col = pos.col))]
    pub fn click(
        &mut self,
        actor: &str,
        kind: ClickKind,
        pos: Position,
    ) -> Result<ClickOutcome, GameError> {
        if !self.is_active() {
            debug!("Ignoring click on game {} in status {}", self.id, self.status);
            return Err(GameError::NotActive {
                status: self.status,
            });
        }

        if pos.row >= self.rows || pos.col >= self.cols {
            warn!("Invalid click position {} on game {}", pos, self.id);
            return Err(GameError::OutOfBounds {
                row: pos.row,
                col: pos.col,
            });
        }

        let Some(field) = self.board.get_mut(pos) else {
            warn!("Board of game {} has no field at {}", self.id, pos);
            return Err(GameError::OutOfBounds {
                row: pos.row,
                col: pos.col,
            });
        };

        if field.revealed {
            debug!("Ignoring click on revealed field {}", pos);
            return Ok(ClickOutcome::Unchanged);
        }

        reveal_field(field, actor);

        let outcome = match kind {
            ClickKind::Flag => {
                field.flagged = true;
                debug!("Field {} flagged by {}", pos, actor);
                ClickOutcome::Applied {
                    updates: vec![CellUpdate {
                        pos,
                        value: CellView::from(&*field),
                    }],
                }
            }
            ClickKind::Normal if field.is_mine && !field.flagged => {
                warn!("{} hit a mine at {} - game over!", actor, pos);
                self.finish(GameStatus::Defeat);
                ClickOutcome::Defeat {
                    at: pos,
                    updates: self.mine_updates(pos),
                }
            }
            ClickKind::Normal => {
                let mut updates = vec![CellUpdate {
                    pos,
                    value: CellView::from(&*field),
                }];
                if !field.is_mine && field.adjacent_mines == 0 {
                    self.cascade(actor, pos, &mut updates);
                    debug!("Cascade from {} revealed {} fields", pos, updates.len());
                }

                if self.all_safe_revealed() {
                    info!("Game {} won! All safe fields revealed.", self.id);
                    self.finish(GameStatus::Victory);
                    ClickOutcome::Victory { updates }
                } else {
                    ClickOutcome::Applied { updates }
                }
            }
        };

        trace!("Board of game {} after click:\n{}", self.id, self.board);
        Ok(outcome)
    }

    /// Reveals the region reachable from the zero-count field `origin`
    /// through other zero-count fields, plus its numbered border.
    fn cascade(&mut self, actor: &str, origin: Position, updates: &mut Vec<CellUpdate>) {
        let mut visited = HashSet::from([origin]);
        let mut stack = vec![origin];

        while let Some(pos) = stack.pop() {
            for next in self.board.neighbors(pos) {
                if !visited.insert(next) {
                    continue;
                }

                let Some(field) = self.board.get_mut(next) else {
                    continue;
                };
                if field.is_mine || field.revealed {
                    continue;
                }

                reveal_field(field, actor);
                updates.push(CellUpdate {
                    pos: next,
                    value: CellView::from(&*field),
                });

                if field.adjacent_mines == 0 {
                    stack.push(next);
                }
            }
        }
    }

    fn all_safe_revealed(&self) -> bool {
        self.board
            .fields()
            .all(|field| field.is_mine || (field.revealed && !field.flagged))
    }

    fn finish(&mut self, status: GameStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
    }

    fn mine_updates(&self, hit: Position) -> Vec<CellUpdate> {
        let mut updates: Vec<CellUpdate> = self
            .board
            .fields()
            .filter(|field| field.is_mine && !field.flagged && field.position != hit)
            .map(|field| CellUpdate {
                pos: field.position,
                value: CellView::of(field, true),
            })
            .collect();
        updates.insert(
            0,
            CellUpdate {
                pos: hit,
                value: CellView::Mine,
            },
        );
        updates
    }

    /// Caller-facing projection. Unrevealed mines are only shown after a defeat.
    pub fn view(&self) -> GameView {
        let show_mines = self.status == GameStatus::Defeat;
        GameView {
            id: self.id.clone(),
            rows: self.rows,
            cols: self.cols,
            mines: self.mines,
            status: self.status,
            field: self
                .board
                .rows_iter()
                .map(|row| row.iter().map(|field| CellView::of(field, show_mines)).collect())
                .collect(),
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            created_by: self.created_by.clone(),
        }
    }

    pub fn to_document(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub fn from_document(document: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(document)
    }
}
