/*!
 * VFS Traits
 * The contract every filesystem provider implements
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;

use super::observable::Observable;
use super::progress::ProgressSink;
use super::resource::ResourceId;
use super::types::*;

/// Backend for every resource under one authority
///
/// Providers are independent, possibly untrusted implementations. The host
/// gives them no ordering or concurrency guarantees: concurrent calls against
/// the same resource may arrive at any time and the provider must keep its own
/// invariants. Every resource passed in belongs to the provider's authority
/// and is already normalized.
#[async_trait]
pub trait FileSystemProvider: Send + Sync {
    /// Provider name, for diagnostics
    fn name(&self) -> &str;

    /// Root resource this provider serves, if it declares one
    ///
    /// When present, its authority must match the authority the provider is
    /// registered under.
    fn root(&self) -> Option<ResourceId> {
        None
    }

    /// Change-event capability
    ///
    /// Probed once at registration. Providers that return `None` are routed
    /// normally but contribute nothing to the unified change stream.
    fn observable(&self) -> Option<&dyn Observable> {
        None
    }

    async fn stat(&self, resource: &ResourceId) -> FsResult<FileStat>;

    /// Stream the content of `resource` into `progress`
    ///
    /// Resolves once every chunk has been reported. Implementations should
    /// check `cancel` between chunks and fail with `FsError::Cancelled`.
    async fn read(
        &self,
        resource: &ResourceId,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> FsResult<()>;

    /// Create or replace a file with `content`
    async fn write(&self, resource: &ResourceId, content: Bytes) -> FsResult<()>;

    /// `write`, also reporting whether the file was created or replaced
    ///
    /// The default classifies with a `stat` before writing, which is only
    /// accurate when nothing else mutates `resource` in between. Providers
    /// that know the answer as part of the write should override it.
    async fn write_tracked(&self, resource: &ResourceId, content: Bytes) -> FsResult<WriteOutcome> {
        let existed = self.stat(resource).await.is_ok();
        self.write(resource, content).await?;
        Ok(if existed {
            WriteOutcome::Replaced
        } else {
            WriteOutcome::Created
        })
    }

    /// Delete a file
    async fn unlink(&self, resource: &ResourceId) -> FsResult<()>;

    /// Move `resource` to `target`; both share this provider's authority
    async fn rename(&self, resource: &ResourceId, target: &ResourceId) -> FsResult<()>;

    /// Create a single directory; the parent must exist
    async fn mkdir(&self, resource: &ResourceId) -> FsResult<()>;

    async fn readdir(&self, resource: &ResourceId) -> FsResult<Vec<FileStat>>;

    /// Remove an empty directory
    async fn rmdir(&self, resource: &ResourceId) -> FsResult<()>;

    /// Set the modification time, returning the updated stat
    async fn utimes(&self, resource: &ResourceId, mtime: SystemTime) -> FsResult<FileStat>;
}
