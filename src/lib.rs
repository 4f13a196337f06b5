//! Minesweeper game engine.
//!
//! Boards are generated by [`logic::generate`], played through [`logic::Game`]
//! and kept in a [`registry::Registry`] that serializes access per game.
//!
//! ```rust,no_run
//! use minesweeper_engine::{ClickKind, ClickOutcome, GameParams, Position, Registry};
//!
//! # async fn run() -> Result<(), minesweeper_engine::RegistryError> {
//! let registry = Registry::new();
//! let game = registry.create_game(GameParams::new(9, 9, 10), "alice");
//!
//! registry.start_game(game.id()).await?;
//! match registry
//!     .click(game.id(), "alice", ClickKind::Normal, Position::new(4, 4))
//!     .await?
//! {
//!     ClickOutcome::Defeat { at, .. } => println!("boom at {}", at),
//!     outcome => println!("{} fields changed", outcome.updates().len()),
//! }
//!
//! // Persist the full state as a JSON document.
//! let document = registry.get_game(game.id()).await?.to_document();
//! # let _ = document;
//! # Ok(())
//! # }
//! ```

pub mod cleanup;
pub mod config;
pub mod data;
pub mod error;
pub mod logic;
pub mod model;
pub mod registry;

pub use data::{Board, Field, GameStatus, Position};
pub use error::{GameError, RegistryError};
pub use logic::{ClickOutcome, Game};
pub use model::{CellView, GameParams, client::ClickKind, server::GameView};
pub use registry::{GameSession, Registry};
