//! Error types returned by games and the registry.
//!
//! Losing a game is not an error: a click that hits a mine returns
//! [`ClickOutcome::Defeat`](crate::logic::ClickOutcome::Defeat).

use derive_more::{Display, Error};

use crate::data::GameStatus;

/// A rejected operation on a single game. The game is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum GameError {
    #[display("cannot start a game that is in status: {status}")]
    InvalidTransition { status: GameStatus },
    #[display("game not active (status: {status})")]
    NotActive { status: GameStatus },
    #[display("field [{row}, {col}] out of bounds")]
    OutOfBounds { row: usize, col: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum RegistryError {
    #[display("game not found: {id}")]
    NotFound { id: String },
    #[display("snapshot of game {found} cannot replace game {expected}")]
    IdMismatch { expected: String, found: String },
    #[display("{_0}")]
    Game(GameError),
}

impl From<GameError> for RegistryError {
    fn from(err: GameError) -> Self {
        Self::Game(err)
    }
}
