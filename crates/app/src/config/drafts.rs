//! Draft Session Config

use std::time::Duration;

use clap::Args;

/// Draft session settings.
#[derive(Debug, Clone, Args)]
pub struct DraftConfig {
    /// How long a save waits for in-flight uploads and syncs, in milliseconds.
    #[arg(long, env = "DRAFT_SETTLE_TIMEOUT_MS", default_value_t = 5_000_u64)]
    pub settle_timeout_ms: u64,

    /// Delete the remote asset when media is removed during a save.
    #[arg(long, env = "DRAFT_PURGE_REMOTE_ON_DETACH", default_value_t = false)]
    pub purge_remote_on_detach: bool,
}

impl DraftConfig {
    /// The settle wait as a [`Duration`].
    #[must_use]
    pub const fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            settle_timeout_ms: 5_000,
            purge_remote_on_detach: false,
        }
    }
}
