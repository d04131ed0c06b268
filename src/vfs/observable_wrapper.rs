/*!
 * Observable Wrapper - Add change events to any provider
 * Decorator that reports successful mutations without modifying the inner provider
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;

use super::observable::{EventBroadcaster, Observable};
use super::progress::ProgressSink;
use super::resource::ResourceId;
use super::traits::FileSystemProvider;
use super::types::*;

/// Wrapper that adds a change source to any `FileSystemProvider`
///
/// Each successful mutation emits exactly one batch. Failed operations emit
/// nothing.
pub struct ObservableProvider<P: FileSystemProvider> {
    inner: Arc<P>,
    broadcaster: EventBroadcaster,
}

impl<P: FileSystemProvider> ObservableProvider<P> {
    /// Wrap a provider with observability
    pub fn new(inner: P) -> Self {
        Self::from_arc(Arc::new(inner))
    }

    /// Wrap an Arc'd provider
    pub fn from_arc(inner: Arc<P>) -> Self {
        Self {
            inner,
            broadcaster: EventBroadcaster::default(),
        }
    }

    /// Set the per-provider event buffer, in batches
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.broadcaster = EventBroadcaster::new(capacity);
        self
    }

    /// Get reference to inner provider
    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn emit(&self, changes: Vec<FileChange>) {
        self.broadcaster.emit(changes);
    }
}

#[async_trait]
impl<P: FileSystemProvider + 'static> FileSystemProvider for ObservableProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn root(&self) -> Option<ResourceId> {
        self.inner.root()
    }

    fn observable(&self) -> Option<&dyn Observable> {
        Some(&self.broadcaster)
    }

    async fn stat(&self, resource: &ResourceId) -> FsResult<FileStat> {
        self.inner.stat(resource).await
    }

    async fn read(
        &self,
        resource: &ResourceId,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> FsResult<()> {
        self.inner.read(resource, progress, cancel).await
    }

    async fn write(&self, resource: &ResourceId, content: Bytes) -> FsResult<()> {
        self.write_tracked(resource, content).await.map(|_| ())
    }

    async fn write_tracked(&self, resource: &ResourceId, content: Bytes) -> FsResult<WriteOutcome> {
        let outcome = self.inner.write_tracked(resource, content).await?;
        self.emit(vec![outcome.change_for(resource.clone())]);
        Ok(outcome)
    }

    async fn unlink(&self, resource: &ResourceId) -> FsResult<()> {
        self.inner.unlink(resource).await?;
        self.emit(vec![FileChange::deleted(resource.clone())]);
        Ok(())
    }

    async fn rename(&self, resource: &ResourceId, target: &ResourceId) -> FsResult<()> {
        self.inner.rename(resource, target).await?;
        if resource != target {
            self.emit(vec![
                FileChange::deleted(resource.clone()),
                FileChange::added(target.clone()),
            ]);
        }
        Ok(())
    }

    async fn mkdir(&self, resource: &ResourceId) -> FsResult<()> {
        self.inner.mkdir(resource).await?;
        self.emit(vec![FileChange::added(resource.clone())]);
        Ok(())
    }

    async fn readdir(&self, resource: &ResourceId) -> FsResult<Vec<FileStat>> {
        self.inner.readdir(resource).await
    }

    async fn rmdir(&self, resource: &ResourceId) -> FsResult<()> {
        self.inner.rmdir(resource).await?;
        self.emit(vec![FileChange::deleted(resource.clone())]);
        Ok(())
    }

    async fn utimes(&self, resource: &ResourceId, mtime: SystemTime) -> FsResult<FileStat> {
        let stat = self.inner.utimes(resource, mtime).await?;
        self.emit(vec![FileChange::updated(resource.clone())]);
        Ok(stat)
    }
}

impl<P: FileSystemProvider> Clone for ObservableProvider<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            broadcaster: self.broadcaster.clone(),
        }
    }
}
