/*!
 * Test Providers
 * Instrumented providers shared by the VFS integration tests
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;

use vfs_host::vfs::{FileStat, FileSystemProvider, FsError, FsResult, MemFS, ProgressSink, ResourceId};

/// MemFS that counts every call it receives
#[derive(Default)]
pub struct CountingProvider {
    inner: MemFS,
    calls: AtomicUsize,
}

impl CountingProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileSystemProvider for CountingProvider {
    fn name(&self) -> &str {
        "counting"
    }

    async fn stat(&self, resource: &ResourceId) -> FsResult<FileStat> {
        self.hit();
        self.inner.stat(resource).await
    }

    async fn read(
        &self,
        resource: &ResourceId,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> FsResult<()> {
        self.hit();
        self.inner.read(resource, progress, cancel).await
    }

    async fn write(&self, resource: &ResourceId, content: Bytes) -> FsResult<()> {
        self.hit();
        self.inner.write(resource, content).await
    }

    async fn unlink(&self, resource: &ResourceId) -> FsResult<()> {
        self.hit();
        self.inner.unlink(resource).await
    }

    async fn rename(&self, resource: &ResourceId, target: &ResourceId) -> FsResult<()> {
        self.hit();
        self.inner.rename(resource, target).await
    }

    async fn mkdir(&self, resource: &ResourceId) -> FsResult<()> {
        self.hit();
        self.inner.mkdir(resource).await
    }

    async fn readdir(&self, resource: &ResourceId) -> FsResult<Vec<FileStat>> {
        self.hit();
        self.inner.readdir(resource).await
    }

    async fn rmdir(&self, resource: &ResourceId) -> FsResult<()> {
        self.hit();
        self.inner.rmdir(resource).await
    }

    async fn utimes(&self, resource: &ResourceId, mtime: SystemTime) -> FsResult<FileStat> {
        self.hit();
        self.inner.utimes(resource, mtime).await
    }
}

/// Provider whose reads report one chunk and then never finish
pub struct StallingProvider;

#[async_trait]
impl FileSystemProvider for StallingProvider {
    fn name(&self) -> &str {
        "stalling"
    }

    async fn stat(&self, resource: &ResourceId) -> FsResult<FileStat> {
        Err(FsError::NotFound(resource.to_string()))
    }

    async fn read(
        &self,
        _resource: &ResourceId,
        progress: &dyn ProgressSink,
        _cancel: &CancellationToken,
    ) -> FsResult<()> {
        progress.report(Bytes::from_static(b"partial"));
        std::future::pending::<()>().await;
        Ok(())
    }

    async fn write(&self, _resource: &ResourceId, _content: Bytes) -> FsResult<()> {
        Err(FsError::NotSupported("read-only".into()))
    }

    async fn unlink(&self, _resource: &ResourceId) -> FsResult<()> {
        Err(FsError::NotSupported("read-only".into()))
    }

    async fn rename(&self, _resource: &ResourceId, _target: &ResourceId) -> FsResult<()> {
        Err(FsError::NotSupported("read-only".into()))
    }

    async fn mkdir(&self, _resource: &ResourceId) -> FsResult<()> {
        Err(FsError::NotSupported("read-only".into()))
    }

    async fn readdir(&self, _resource: &ResourceId) -> FsResult<Vec<FileStat>> {
        Ok(Vec::new())
    }

    async fn rmdir(&self, _resource: &ResourceId) -> FsResult<()> {
        Err(FsError::NotSupported("read-only".into()))
    }

    async fn utimes(&self, resource: &ResourceId, _mtime: SystemTime) -> FsResult<FileStat> {
        Err(FsError::NotFound(resource.to_string()))
    }
}

/// Current-thread runtime for async bodies inside proptest cases
pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}
