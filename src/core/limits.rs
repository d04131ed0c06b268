/*!
 * Host Limits and Constants
 *
 * Centralized location for buffer sizes and defaults used across the host.
 * Every value here can be overridden through `HostConfig`.
 */

// =============================================================================
// CHANGE NOTIFICATION
// =============================================================================

/// Unified change stream buffer (in batches, not individual changes)
/// Subscribers that fall further behind than this skip the oldest batches
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Per-provider change buffer used by `ObservableProvider`
pub const DEFAULT_PROVIDER_EVENT_CAPACITY: usize = 1024;

// =============================================================================
// I/O
// =============================================================================

/// Chunk size for streamed reads (64KB)
/// [PERF] Large enough to amortize sink calls, small enough to keep peak memory flat
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

// =============================================================================
// OBSERVABILITY
// =============================================================================

/// Routed operations slower than this are logged at warn level (ms)
pub const SLOW_OPERATION_THRESHOLD_MS: u128 = 100;
