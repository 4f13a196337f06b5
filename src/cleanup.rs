use tokio::time;
use tracing::info;

use crate::{config::CleanupConfig, registry::Registry};

/// Periodically evicts idle games. Runs until the surrounding task is dropped.
pub async fn start_cleanup_task(registry: Registry, config: CleanupConfig) {
    let mut interval = time::interval(config.interval);

    info!(
        "Started game cleanup task: checking every {}s, inactive timeout: {}s",
        config.interval.as_secs(),
        config.inactive_timeout.as_secs()
    );

    loop {
        interval.tick().await;
        cleanup_games(&registry, &config);
    }
}

fn cleanup_games(registry: &Registry, config: &CleanupConfig) {
    let removed_count = registry.evict_idle(config.inactive_timeout);
    if removed_count > 0 {
        info!(
            "Cleaned up {} inactive games, {} remaining",
            removed_count,
            registry.len()
        );
    }
}
