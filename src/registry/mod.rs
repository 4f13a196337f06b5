//! Concurrent store of live games.
//!
//! Every game sits behind its own lock, so operations on one game are applied
//! one at a time while different games never wait on each other. A caller that
//! needs several steps to be atomic (load from storage, click, save) takes a
//! [`GameSession`] and holds it for the whole sequence.

use std::{sync::Arc, time::Duration};

use dashmap::{DashMap, Entry};
use nanoid::nanoid;
use rand::Rng;
use tokio::{
    sync::{Mutex, OwnedMutexGuard},
    time::Instant,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    data::Position,
    error::{GameError, RegistryError},
    logic::{ClickOutcome, Game, generate},
    model::{GameParams, client::ClickKind, server::GameView},
};

struct Slot {
    game: Game,
    last_activity: Instant,
}

impl Slot {
    fn new(game: Game) -> Self {
        Self {
            game,
            last_activity: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn should_cleanup(&self, inactive_timeout: Duration) -> bool {
        self.last_activity.elapsed() >= inactive_timeout
    }
}

type Games = DashMap<String, Arc<Mutex<Slot>>>;

#[derive(Clone, Default)]
pub struct Registry {
    games: Arc<Games>,
}

/// Exclusive access to one game for as long as the session lives.
pub struct GameSession {
    slot: OwnedMutexGuard<Slot>,
}

impl GameSession {
    pub fn id(&self) -> &str {
        self.slot.game.id()
    }

    pub fn game(&self) -> &Game {
        &self.slot.game
    }

    pub fn snapshot(&self) -> Game {
        self.slot.game.clone()
    }

    pub fn view(&self) -> GameView {
        self.slot.game.view()
    }

    pub fn start(&mut self) -> Result<(), GameError> {
        self.slot.touch();
        self.slot.game.start()
    }

    pub fn click(
        &mut self,
        actor: &str,
        kind: ClickKind,
        pos: Position,
    ) -> Result<ClickOutcome, GameError> {
        self.slot.touch();
        self.slot.game.click(actor, kind, pos)
    }

    /// Overwrites the held game, e.g. with a copy loaded from storage.
    pub fn replace(&mut self, game: Game) -> Result<(), RegistryError> {
        if game.id() != self.id() {
            return Err(RegistryError::IdMismatch {
                expected: self.id().to_string(),
                found: game.id().to_string(),
            });
        }
        self.slot.touch();
        self.slot.game = game;
        Ok(())
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn create_game(&self, params: GameParams, creator: &str) -> Game {
        self.create_game_with_rng(params, creator, &mut rand::rng())
    }

    #[instrument(level = "trace", skip(self, rng))]
    pub fn create_game_with_rng<R: Rng>(
        &self,
        params: GameParams,
        creator: &str,
        rng: &mut R,
    ) -> Game {
        let params = params.normalized();
        let board = generate::generate(params.rows, params.cols, params.mines, rng);

        let mut id_length = 5;
        let max_attempts_per_length = 10;

        loop {
            for _ in 0..max_attempts_per_length {
                let id = nanoid!(id_length);
                match self.games.entry(id.clone()) {
                    Entry::Occupied(_) => {
                        debug!("Game ID collision, trying another: {}", id);
                        continue;
                    }
                    Entry::Vacant(entry) => {
                        let game = Game::from_board(id, board, creator);
                        entry.insert(Arc::new(Mutex::new(Slot::new(game.clone()))));
                        info!("Created new game with ID: {}", game.id());
                        return game;
                    }
                }
            }

            warn!(
                "Exhausted ID attempts at length {}, increasing to {}",
                id_length,
                id_length + 1
            );
            id_length += 1;
        }
    }

    fn slot(&self, id: &str) -> Result<Arc<Mutex<Slot>>, RegistryError> {
        match self.games.get(id) {
            Some(entry) => Ok(entry.value().clone()),
            None => {
                debug!("Lookup for non-existent game: {}", id);
                Err(RegistryError::NotFound { id: id.to_string() })
            }
        }
    }

    /// Waits for exclusive access to a game.
    pub async fn session(&self, id: &str) -> Result<GameSession, RegistryError> {
        let slot = self.slot(id)?.lock_owned().await;
        Ok(GameSession { slot })
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn start_game(&self, id: &str) -> Result<(), RegistryError> {
        self.session(id).await?.start()?;
        Ok(())
    }

    #[instrument(level = "trace", skip(self), fields(row = pos.row, col = pos.col))]
    pub async fn click(
        &self,
        id: &str,
        actor: &str,
        kind: ClickKind,
        pos: Position,
    ) -> Result<ClickOutcome, RegistryError> {
        Ok(self.session(id).await?.click(actor, kind, pos)?)
    }

    pub async fn get_game(&self, id: &str) -> Result<Game, RegistryError> {
        Ok(self.session(id).await?.snapshot())
    }

    pub async fn view(&self, id: &str) -> Result<GameView, RegistryError> {
        Ok(self.session(id).await?.view())
    }

    /// Snapshots of every stored game, in no particular order.
    pub async fn list_games(&self) -> Vec<Game> {
        let slots: Vec<Arc<Mutex<Slot>>> =
            self.games.iter().map(|entry| entry.value().clone()).collect();

        let mut games = Vec::with_capacity(slots.len());
        for slot in slots {
            games.push(slot.lock().await.game.clone());
        }
        games
    }

    /// Stores `game` under `id`, replacing the live copy or inserting it when
    /// the registry does not hold that game yet.
    #[instrument(level = "trace", skip(self, game))]
    pub async fn replace_game_state(&self, id: &str, game: Game) -> Result<(), RegistryError> {
        if game.id() != id {
            warn!("Refusing to store game {} under ID {}", game.id(), id);
            return Err(RegistryError::IdMismatch {
                expected: id.to_string(),
                found: game.id().to_string(),
            });
        }

        let slot = match self.games.entry(id.to_string()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Mutex::new(Slot::new(game))));
                info!("Restored game {} into the registry", id);
                return Ok(());
            }
        };

        let mut session = GameSession {
            slot: slot.lock_owned().await,
        };
        session.replace(game)?;
        debug!("Replaced state of game {}", id);
        Ok(())
    }

    pub fn evict(&self, id: &str) -> bool {
        let removed = self.games.remove(id).is_some();
        if removed {
            debug!("Evicted game: {}", id);
        }
        removed
    }

    /// Drops games untouched for at least `inactive_timeout`. Games that are
    /// locked right now are in use and are kept.
    pub fn evict_idle(&self, inactive_timeout: Duration) -> usize {
        let candidates: Vec<String> = self
            .games
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .try_lock()
                    .is_ok_and(|slot| slot.should_cleanup(inactive_timeout))
            })
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for id in candidates {
            let evicted = self.games.remove_if(&id, |_, slot| {
                slot.try_lock()
                    .is_ok_and(|slot| slot.should_cleanup(inactive_timeout))
            });
            if evicted.is_some() {
                debug!("Cleaned up game: {}", id);
                removed += 1;
            }
        }
        removed
    }
}
