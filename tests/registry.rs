use std::{collections::BTreeMap, time::Duration};

use rand::{SeedableRng, rngs::StdRng};

use minesweeper_engine::{
    ClickKind, ClickOutcome, Game, GameError, GameParams, GameStatus, Position, Registry,
    RegistryError, cleanup::start_cleanup_task, config::CleanupConfig, logic::generate,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn pos(row: usize, col: usize) -> Position {
    Position::new(row, col)
}

/// Stores a game with a known layout and starts it.
async fn fixed_game(registry: &Registry, id: &str, rows: usize, cols: usize, mines: &[Position]) {
    let game = Game::from_board(id, generate::with_mines(rows, cols, mines), "alice");
    registry.replace_game_state(id, game).await.unwrap();
    registry.start_game(id).await.unwrap();
}

fn revealed_map(game: &Game) -> BTreeMap<Position, (bool, Option<String>)> {
    game.board()
        .fields()
        .map(|field| (field.position, (field.revealed, field.revealed_by.clone())))
        .collect()
}

#[tokio::test]
async fn test_create_get_and_list() {
    init_tracing();
    let registry = Registry::new();

    let first = registry.create_game(GameParams::new(5, 6, 4), "alice");
    let second = registry.create_game(GameParams::new(2, 80, 0), "bob");

    assert_eq!(first.status(), GameStatus::Created);
    assert_eq!((first.rows(), first.cols(), first.mines()), (5, 6, 4));
    assert_eq!(first.board().mine_count(), 4);
    assert_eq!(first.created_by(), "alice");
    assert_eq!((second.rows(), second.cols(), second.mines()), (3, 50, 53));
    assert_ne!(first.id(), second.id());

    assert_eq!(registry.get_game(first.id()).await.unwrap(), first);
    assert_eq!(registry.len(), 2);

    let mut ids: Vec<String> = registry
        .list_games()
        .await
        .iter()
        .map(|game| game.id().to_string())
        .collect();
    ids.sort();
    let mut expected = vec![first.id().to_string(), second.id().to_string()];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let registry = Registry::new();
    let not_found = RegistryError::NotFound {
        id: "missing".to_string(),
    };

    assert_eq!(registry.get_game("missing").await, Err(not_found.clone()));
    assert_eq!(registry.start_game("missing").await, Err(not_found.clone()));
    assert_eq!(
        registry
            .click("missing", "alice", ClickKind::Normal, pos(0, 0))
            .await,
        Err(not_found.clone())
    );
    assert!(registry.view("missing").await.is_err());
    assert!(registry.session("missing").await.is_err());
    assert!(!registry.evict("missing"));
}

#[tokio::test]
async fn test_lifecycle_errors_propagate() {
    let registry = Registry::new();
    let game = registry.create_game(GameParams::new(4, 4, 2), "alice");
    let id = game.id();

    assert_eq!(
        registry.click(id, "alice", ClickKind::Normal, pos(0, 0)).await,
        Err(RegistryError::Game(GameError::NotActive {
            status: GameStatus::Created
        }))
    );

    registry.start_game(id).await.unwrap();
    assert_eq!(
        registry.start_game(id).await,
        Err(RegistryError::Game(GameError::InvalidTransition {
            status: GameStatus::Started
        }))
    );

    assert_eq!(
        registry.click(id, "alice", ClickKind::Flag, pos(4, 0)).await,
        Err(RegistryError::Game(GameError::OutOfBounds { row: 4, col: 0 }))
    );
    assert!(registry.get_game(id).await.unwrap().started_at().is_some());
}

#[tokio::test]
async fn test_defeat_is_an_outcome() {
    let registry = Registry::new();
    fixed_game(&registry, "boom", 3, 3, &[pos(1, 1)]).await;

    let outcome = registry
        .click("boom", "alice", ClickKind::Normal, pos(1, 1))
        .await
        .unwrap();
    assert!(matches!(outcome, ClickOutcome::Defeat { at, .. } if at == pos(1, 1)));

    let game = registry.get_game("boom").await.unwrap();
    assert_eq!(game.status(), GameStatus::Defeat);
    assert!(game.finished_at().is_some());
    assert!(registry.view("boom").await.unwrap().lost());
}

#[tokio::test]
async fn test_single_mine_corner_click() {
    let registry = Registry::new();
    fixed_game(&registry, "corner", 3, 3, &[pos(1, 1)]).await;

    let outcome = registry
        .click("corner", "alice", ClickKind::Normal, pos(0, 0))
        .await
        .unwrap();
    assert_eq!(outcome.updates().len(), 1);

    let game = registry.get_game("corner").await.unwrap();
    let revealed: Vec<Position> = game
        .board()
        .fields()
        .filter(|field| field.revealed)
        .map(|field| field.position)
        .collect();
    assert_eq!(revealed, vec![pos(0, 0)]);
}

#[tokio::test]
async fn test_replace_game_state_rehydrates() {
    let registry = Registry::new();
    let game = registry.create_game(GameParams::new(5, 5, 3), "alice");
    let id = game.id().to_string();
    registry.start_game(&id).await.unwrap();
    registry
        .click(&id, "alice", ClickKind::Flag, pos(0, 0))
        .await
        .unwrap();

    // Persist, drop from memory, then restore from the document.
    let document = registry.get_game(&id).await.unwrap().to_document().unwrap();
    assert!(registry.evict(&id));
    assert!(registry.get_game(&id).await.is_err());

    let restored = Game::from_document(document).unwrap();
    registry.replace_game_state(&id, restored).await.unwrap();
    let game = registry.get_game(&id).await.unwrap();
    assert_eq!(game.status(), GameStatus::Started);
    assert!(game.field(pos(0, 0)).unwrap().flagged);

    // Overwriting an existing game replaces it wholesale.
    registry.replace_game_state(&id, game.clone()).await.unwrap();
    assert_eq!(registry.get_game(&id).await.unwrap(), game);
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_replace_game_state_rejects_other_id() {
    let registry = Registry::new();
    let game = registry.create_game(GameParams::default(), "alice");
    let other = Game::new("other", GameParams::default(), "bob");

    assert_eq!(
        registry.replace_game_state(game.id(), other.clone()).await,
        Err(RegistryError::IdMismatch {
            expected: game.id().to_string(),
            found: "other".to_string(),
        })
    );

    let mut session = registry.session(game.id()).await.unwrap();
    assert!(session.replace(other).is_err());
    assert_eq!(session.snapshot(), game);
}

#[tokio::test]
async fn test_session_spans_load_click_save() {
    let registry = Registry::new();
    fixed_game(&registry, "session", 4, 4, &[pos(3, 3)]).await;
    let stored = registry.get_game("session").await.unwrap();

    let saved = {
        let mut session = registry.session("session").await.unwrap();
        session.replace(stored).unwrap();
        let outcome = session.click("alice", ClickKind::Normal, pos(3, 2)).unwrap();
        assert!(matches!(outcome, ClickOutcome::Applied { .. }));
        session.snapshot()
    };

    assert_eq!(registry.get_game("session").await.unwrap(), saved);
    assert!(saved.field(pos(3, 2)).unwrap().revealed);
}

#[tokio::test]
async fn test_locked_game_does_not_block_others() {
    let registry = Registry::new();
    fixed_game(&registry, "a", 4, 4, &[pos(0, 0)]).await;
    fixed_game(&registry, "b", 4, 4, &[pos(0, 0)]).await;

    let held = registry.session("a").await.unwrap();

    let other = tokio::time::timeout(
        Duration::from_secs(1),
        registry.click("b", "bob", ClickKind::Normal, pos(0, 1)),
    )
    .await;
    assert!(matches!(other, Ok(Ok(_))));

    let same = tokio::time::timeout(
        Duration::from_millis(50),
        registry.click("a", "bob", ClickKind::Normal, pos(0, 1)),
    )
    .await;
    assert!(same.is_err(), "click on a locked game must wait");

    drop(held);
    let after = registry
        .click("a", "bob", ClickKind::Normal, pos(0, 1))
        .await
        .unwrap();
    assert!(matches!(after, ClickOutcome::Applied { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_clicks_on_one_game_serialize() {
    init_tracing();
    let mines = [pos(1, 1), pos(1, 4), pos(4, 1), pos(4, 4)];
    let registry = Registry::new();
    fixed_game(&registry, "shared", 6, 6, &mines).await;
    fixed_game(&registry, "sequential", 6, 6, &mines).await;

    // Numbered fields only, leaving one out so the game cannot be won.
    let game = registry.get_game("shared").await.unwrap();
    let mut targets: Vec<Position> = game
        .board()
        .fields()
        .filter(|field| !field.is_mine && field.adjacent_mines > 0)
        .map(|field| field.position)
        .collect();
    targets.pop();
    let (left, right) = targets.split_at(targets.len() / 2);
    let (left, right) = (left.to_vec(), right.to_vec());

    let mut handles = Vec::new();
    for (actor, cells) in [("left", left.clone()), ("right", right.clone())] {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            for cell in cells {
                registry
                    .click("shared", actor, ClickKind::Normal, cell)
                    .await
                    .unwrap();
                tokio::task::yield_now().await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for (actor, cells) in [("right", right), ("left", left)] {
        for cell in cells {
            registry
                .click("sequential", actor, ClickKind::Normal, cell)
                .await
                .unwrap();
        }
    }

    let shared = registry.get_game("shared").await.unwrap();
    let sequential = registry.get_game("sequential").await.unwrap();
    assert_eq!(revealed_map(&shared), revealed_map(&sequential));
    assert_eq!(shared.status(), GameStatus::Started);
}

#[tokio::test]
async fn test_seeded_creation_is_reproducible() {
    let registry = Registry::new();
    let params = GameParams::new(9, 9, 10);
    let first = registry.create_game_with_rng(params, "alice", &mut StdRng::seed_from_u64(8));
    let second = registry.create_game_with_rng(params, "alice", &mut StdRng::seed_from_u64(8));

    assert_ne!(first.id(), second.id());
    assert_eq!(first.board(), second.board());
}

#[tokio::test(start_paused = true)]
async fn test_evict_idle_skips_recent_and_locked_games() {
    let registry = Registry::new();
    let idle = registry.create_game(GameParams::default(), "alice");
    let locked = registry.create_game(GameParams::default(), "bob");

    tokio::time::advance(Duration::from_secs(601)).await;
    let fresh = registry.create_game(GameParams::default(), "carol");

    let session = registry.session(locked.id()).await.unwrap();
    assert_eq!(registry.evict_idle(Duration::from_secs(600)), 1);
    drop(session);

    assert!(registry.get_game(idle.id()).await.is_err());
    assert!(registry.get_game(locked.id()).await.is_ok());
    assert!(registry.get_game(fresh.id()).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_cleanup_task_evicts_inactive_games() {
    let registry = Registry::new();
    registry.create_game(GameParams::default(), "alice");

    let task = tokio::spawn(start_cleanup_task(
        registry.clone(),
        CleanupConfig {
            interval: Duration::from_secs(60),
            inactive_timeout: Duration::from_secs(600),
        },
    ));

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(registry.len(), 1);

    tokio::time::sleep(Duration::from_secs(400)).await;
    assert!(registry.is_empty());
    task.abort();
}
