use std::{env, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupConfig {
    pub interval: Duration,
    pub inactive_timeout: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            inactive_timeout: Duration::from_secs(600),
        }
    }
}

impl CleanupConfig {
    /// Reads `CLEANUP_INTERVAL_SECONDS` and `INACTIVE_GAME_TIMEOUT_SECONDS`,
    /// keeping the default for anything missing or unparsable.
    pub fn from_env() -> Self {
        Self {
            interval: seconds(env::var("CLEANUP_INTERVAL_SECONDS").ok(), 60),
            inactive_timeout: seconds(env::var("INACTIVE_GAME_TIMEOUT_SECONDS").ok(), 600),
        }
    }
}

// Zero would make the cleanup interval panic.
fn seconds(value: Option<String>, default: u64) -> Duration {
    let secs = value
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default);
    Duration::from_secs(secs.max(1))
}
