/*!
 * Disposable
 * One-shot release capability returned by registrations and subscriptions
 */

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

type Release = Box<dyn FnOnce() + Send + 'static>;

/// Releases a registration or subscription exactly once
///
/// The first `dispose` runs the release action; later calls, from any clone
/// or thread, do nothing. Dropping a `Disposable` does *not* release: the
/// resource lives until it is disposed explicitly or its owner is torn down.
#[derive(Clone)]
pub struct Disposable {
    release: Arc<Mutex<Option<Release>>>,
}

impl Disposable {
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            release: Arc::new(Mutex::new(Some(Box::new(release)))),
        }
    }

    /// A disposable with nothing to release
    pub fn noop() -> Self {
        Self {
            release: Arc::new(Mutex::new(None)),
        }
    }

    /// Combine several disposables into one that releases all of them in order
    pub fn from_many<I>(disposables: I) -> Self
    where
        I: IntoIterator<Item = Disposable>,
    {
        let all: Vec<Disposable> = disposables.into_iter().collect();
        Self::new(move || {
            for disposable in &all {
                disposable.dispose();
            }
        })
    }

    /// Release the resource; idempotent
    pub fn dispose(&self) {
        // Take under the lock, run outside it so release actions may dispose others
        let release = self.release.lock().take();
        if let Some(release) = release {
            release();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.release.lock().is_none()
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
