/*!
 * Change Notification Hub
 * Republishes every provider's change batches on one unified stream
 */

use parking_lot::{Mutex, ReentrantMutex};
use std::cell::Cell;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use super::disposable::Disposable;
use super::observable::Observable;
use super::resource::Authority;
use super::types::{ChangeBatch, FileChange, VfsError, VfsResult};

/// Lifecycle of one provider's change subscription
///
/// `Pending` holds batches in the provider receiver until the registration
/// commits. `Unsubscribed` is terminal: a closed provider stream or a disposed
/// registration is never resubscribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Pending,
    Subscribed,
    Unsubscribed,
}

/// Unified change stream shared by every consumer of a registry
///
/// Batches from one provider keep their emission order. Batches from
/// different providers interleave in no particular order.
#[derive(Clone)]
pub struct ChangeHub {
    sender: broadcast::Sender<ChangeBatch>,
}

impl ChangeHub {
    /// Create a hub buffering up to `capacity` batches per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive every batch published after this call
    ///
    /// A receiver that falls more than `capacity` batches behind gets
    /// `RecvError::Lagged(n)` and resumes with the oldest retained batch.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeBatch> {
        self.sender.subscribe()
    }

    /// `Stream` view of `subscribe`
    pub fn stream(&self) -> BroadcastStream<ChangeBatch> {
        BroadcastStream::new(self.subscribe())
    }

    /// Invoke `listener` for every batch until the returned disposable is disposed
    ///
    /// Once `dispose` returns the listener is never called again. A call
    /// already running on another thread finishes first, so `dispose` may
    /// block for as long as the listener takes. Disposing from inside the
    /// listener is allowed.
    pub fn on_did_change<F>(&self, listener: F) -> VfsResult<Disposable>
    where
        F: Fn(ChangeBatch) + Send + Sync + 'static,
    {
        let handle = Handle::try_current().map_err(|_| VfsError::RuntimeUnavailable)?;
        let mut receiver = self.subscribe();
        // Held for the duration of every listener call
        let active = Arc::new(ReentrantMutex::new(Cell::new(true)));

        let task_active = active.clone();
        let task = handle.spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(batch) => {
                        let active = task_active.lock();
                        if !active.get() {
                            break;
                        }
                        listener(batch);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "change listener lagged; batches dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Ok(Disposable::new(move || {
            active.lock().set(false);
            task.abort();
        }))
    }

    /// Number of live receivers on the unified stream
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Take a provider receiver now, ready to start forwarding later
    ///
    /// Fails when called outside a Tokio runtime, before the provider has
    /// been made reachable.
    pub(crate) fn attach(
        &self,
        authority: &Authority,
        source: &dyn Observable,
    ) -> VfsResult<Subscription> {
        let runtime = Handle::try_current().map_err(|_| VfsError::RuntimeUnavailable)?;
        Ok(Subscription {
            authority: authority.clone(),
            sender: self.sender.clone(),
            runtime,
            gate: Arc::new(Mutex::new(SubscriptionState::Pending)),
            pending: Mutex::new(Some(source.subscribe())),
            task: Mutex::new(None),
        })
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new(crate::core::limits::DEFAULT_EVENT_CAPACITY)
    }
}

/// Forwarding link between one provider and the hub
pub(crate) struct Subscription {
    authority: Authority,
    sender: broadcast::Sender<ChangeBatch>,
    runtime: Handle,
    // Held while publishing, so `close` returning means nothing more is sent
    gate: Arc<Mutex<SubscriptionState>>,
    pending: Mutex<Option<broadcast::Receiver<Vec<FileChange>>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Subscription {
    pub fn state(&self) -> SubscriptionState {
        *self.gate.lock()
    }

    /// Start publishing, including anything buffered while pending
    pub fn activate(&self) {
        let Some(mut receiver) = self.pending.lock().take() else {
            return;
        };
        {
            let mut state = self.gate.lock();
            if *state != SubscriptionState::Pending {
                return;
            }
            *state = SubscriptionState::Subscribed;
        }
        debug!(authority = %self.authority, "change subscription active");

        let authority = self.authority.clone();
        let sender = self.sender.clone();
        let gate = self.gate.clone();

        let task = self.runtime.spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(changes) => {
                        let reported = changes.len();
                        let changes: Vec<FileChange> = changes
                            .into_iter()
                            .filter(|change| change.resource.authority() == &authority)
                            .collect();
                        if changes.len() != reported {
                            warn!(
                                authority = %authority,
                                dropped = reported - changes.len(),
                                "provider reported changes outside its authority"
                            );
                            if changes.is_empty() {
                                continue;
                            }
                        }

                        let state = gate.lock();
                        if *state != SubscriptionState::Subscribed {
                            break;
                        }
                        // No consumers is not an error
                        let _ = sender.send(ChangeBatch::new(authority.clone(), changes));
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(authority = %authority, skipped, "hub lagged behind provider; batches dropped");
                    }
                    Err(RecvError::Closed) => {
                        *gate.lock() = SubscriptionState::Unsubscribed;
                        warn!(authority = %authority, "provider change stream closed; unsubscribed");
                        break;
                    }
                }
            }
        });
        *self.task.lock() = Some(task);
    }

    /// Stop forwarding; idempotent
    pub fn close(&self) {
        {
            let mut state = self.gate.lock();
            if *state == SubscriptionState::Unsubscribed && self.task.lock().is_none() {
                return;
            }
            *state = SubscriptionState::Unsubscribed;
        }
        self.pending.lock().take();
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
        debug!(authority = %self.authority, "change subscription closed");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}
