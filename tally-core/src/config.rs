use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Reconciliation poll settings (`[sync]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Seconds between reconcile passes.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    30
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl SyncSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

/// Startup identity validation settings (`[identity]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentitySettings {
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// A cached identity younger than this is trusted without a network call.
    #[serde(default = "default_revalidate_after_hours")]
    pub revalidate_after_hours: u64,
}

fn default_retry_delay_ms() -> u64 {
    400
}

fn default_max_attempts() -> u32 {
    2
}

fn default_revalidate_after_hours() -> u64 {
    24
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
            max_attempts: default_max_attempts(),
            revalidate_after_hours: default_revalidate_after_hours(),
        }
    }
}

impl IdentitySettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn revalidate_after(&self) -> time::Duration {
        time::Duration::hours(self.revalidate_after_hours as i64)
    }
}
