/*!
 * Observable Providers
 * Opt-in change-event capability for filesystem providers
 */

use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::FileChange;

/// Change-event source - opt-in for providers that can report mutations
///
/// Each call to `subscribe` returns an independent receiver that sees every
/// batch emitted after the call, in emission order.
pub trait Observable: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<Vec<FileChange>>;
}

/// Batch broadcaster for provider implementations
/// Uses tokio broadcast channel for lock-free MPMC
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: Arc<broadcast::Sender<Vec<FileChange>>>,
}

impl EventBroadcaster {
    /// Create new broadcaster with specified capacity (in batches)
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Emit a batch to all subscribers; empty batches are dropped
    pub fn emit(&self, changes: Vec<FileChange>) {
        if changes.is_empty() {
            return;
        }
        // No subscribers is not an error
        let _ = self.sender.send(changes);
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Observable for EventBroadcaster {
    fn subscribe(&self) -> broadcast::Receiver<Vec<FileChange>> {
        self.sender.subscribe()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(crate::core::limits::DEFAULT_PROVIDER_EVENT_CAPACITY)
    }
}
