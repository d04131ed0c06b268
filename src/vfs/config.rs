/*!
 * Host Configuration
 *
 * Buffer sizes for change streams and provider reads
 */

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::limits::{
    DEFAULT_EVENT_CAPACITY, DEFAULT_PROVIDER_EVENT_CAPACITY, DEFAULT_READ_CHUNK_SIZE,
};

pub const ENV_EVENT_CAPACITY: &str = "VFS_EVENT_CAPACITY";
pub const ENV_PROVIDER_EVENT_CAPACITY: &str = "VFS_PROVIDER_EVENT_CAPACITY";
pub const ENV_READ_CHUNK_SIZE: &str = "VFS_READ_CHUNK_SIZE";

/// File system host configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Unified change stream buffer, in batches (default: 1024)
    pub event_capacity: usize,

    /// Per-provider change buffer for `ObservableProvider` (default: 1024)
    pub provider_event_capacity: usize,

    /// Chunk size for `MemFS` reads, in bytes (default: 64 KiB)
    pub read_chunk_size: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            provider_event_capacity: DEFAULT_PROVIDER_EVENT_CAPACITY,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

impl HostConfig {
    /// Defaults overridden by `VFS_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let overrides: [(&str, &mut usize); 3] = [
            (ENV_EVENT_CAPACITY, &mut config.event_capacity),
            (ENV_PROVIDER_EVENT_CAPACITY, &mut config.provider_event_capacity),
            (ENV_READ_CHUNK_SIZE, &mut config.read_chunk_size),
        ];
        for (key, slot) in overrides {
            let Some(raw) = lookup(key) else { continue };
            match raw.trim().parse::<usize>() {
                Ok(value) => *slot = value,
                Err(e) => warn!(variable = key, value = %raw, error = %e, "ignoring invalid setting"),
            }
        }
        config.normalized()
    }

    /// Clamp every size to at least 1
    pub fn normalized(self) -> Self {
        Self {
            event_capacity: self.event_capacity.max(1),
            provider_event_capacity: self.provider_event_capacity.max(1),
            read_chunk_size: self.read_chunk_size.max(1),
        }
    }
}
