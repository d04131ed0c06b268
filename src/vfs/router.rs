/*!
 * Operation Router
 * Dispatches filesystem primitives to the provider owning each authority
 */

use bytes::Bytes;
use std::future::Future;
use std::sync::Arc;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::progress::{BufferSink, ProgressSink};
use super::registry::ProviderRegistry;
use super::resource::ResourceId;
use super::traits::FileSystemProvider;
use super::types::*;
use crate::monitoring::{span_operation, OperationSpan};

/// Routes each operation by the authority of its resource
///
/// Addressing and lookup failures are returned before any provider is
/// touched. Provider failures come back as `VfsError::Provider` carrying the
/// authority, the operation and the untouched cause. Nothing is retried.
#[derive(Clone)]
pub struct Router {
    registry: ProviderRegistry,
}

impl Router {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    fn resolve(&self, resource: &ResourceId) -> VfsResult<Arc<dyn FileSystemProvider>> {
        self.registry
            .resolve(resource.authority())
            .ok_or_else(|| VfsError::NoProvider(resource.authority().to_string()))
    }

    async fn route<T, F, Fut>(&self, operation: Operation, raw: &str, invoke: F) -> VfsResult<T>
    where
        F: FnOnce(Arc<dyn FileSystemProvider>, ResourceId) -> Fut,
        Fut: Future<Output = FsResult<T>>,
    {
        let resource = ResourceId::parse(raw)?;
        let provider = self.resolve(&resource)?;
        let authority = resource.authority().to_string();

        let span = span_operation(operation.as_str(), &authority);
        let result = invoke(provider, resource)
            .instrument(span.span().clone())
            .await;
        finish(&span, authority, operation, result)
    }

    pub async fn stat(&self, resource: impl AsRef<str>) -> VfsResult<FileStat> {
        self.route(Operation::Stat, resource.as_ref(), |provider, resource| async move {
            provider.stat(&resource).await
        })
        .await
    }

    /// Stream a resource's content into `progress`
    ///
    /// Resolves once the provider has delivered every chunk. If `cancel`
    /// fires first the router stops waiting and returns `Cancelled`; a token
    /// that is already cancelled fails before the provider is invoked.
    pub async fn read(
        &self,
        resource: impl AsRef<str>,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> VfsResult<()> {
        let resource = ResourceId::parse(resource.as_ref())?;
        let provider = self.resolve(&resource)?;
        let authority = resource.authority().to_string();

        let cancelled = |authority: String| VfsError::Cancelled {
            authority,
            operation: Operation::Read,
        };
        if cancel.is_cancelled() {
            return Err(cancelled(authority));
        }

        let span = span_operation(Operation::Read.as_str(), &authority);
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = provider.read(&resource, progress, cancel).instrument(span.span().clone()) => Some(result),
        };

        match outcome {
            Some(Err(FsError::Cancelled)) | None if cancel.is_cancelled() => {
                span.record_error("cancelled");
                Err(cancelled(authority))
            }
            Some(result) => finish(&span, authority, Operation::Read, result),
            None => Err(cancelled(authority)),
        }
    }

    /// Read a whole resource into memory
    pub async fn read_to_end(
        &self,
        resource: impl AsRef<str>,
        cancel: &CancellationToken,
    ) -> VfsResult<Bytes> {
        let sink = BufferSink::new();
        self.read(resource, &sink, cancel).await?;
        Ok(sink.take())
    }

    pub async fn write(&self, resource: impl AsRef<str>, content: impl Into<Bytes>) -> VfsResult<()> {
        let content = content.into();
        self.route(Operation::Write, resource.as_ref(), |provider, resource| async move {
            provider.write(&resource, content).await
        })
        .await
    }

    pub async fn unlink(&self, resource: impl AsRef<str>) -> VfsResult<()> {
        self.route(Operation::Unlink, resource.as_ref(), |provider, resource| async move {
            provider.unlink(&resource).await
        })
        .await
    }

    /// Move a resource within one authority
    ///
    /// Source and target on different authorities fail with
    /// `CrossAuthorityUnsupported` before either provider is looked up.
    pub async fn rename(&self, resource: impl AsRef<str>, target: impl AsRef<str>) -> VfsResult<()> {
        let target = ResourceId::parse(target.as_ref())?;
        let source = ResourceId::parse(resource.as_ref())?;
        if source.authority() != target.authority() {
            return Err(VfsError::CrossAuthorityUnsupported {
                from: source.authority().to_string(),
                to: target.authority().to_string(),
            });
        }

        self.route(Operation::Rename, source.as_str(), |provider, source| async move {
            provider.rename(&source, &target).await
        })
        .await
    }

    pub async fn mkdir(&self, resource: impl AsRef<str>) -> VfsResult<()> {
        self.route(Operation::Mkdir, resource.as_ref(), |provider, resource| async move {
            provider.mkdir(&resource).await
        })
        .await
    }

    pub async fn readdir(&self, resource: impl AsRef<str>) -> VfsResult<Vec<FileStat>> {
        self.route(Operation::Readdir, resource.as_ref(), |provider, resource| async move {
            provider.readdir(&resource).await
        })
        .await
    }

    pub async fn rmdir(&self, resource: impl AsRef<str>) -> VfsResult<()> {
        self.route(Operation::Rmdir, resource.as_ref(), |provider, resource| async move {
            provider.rmdir(&resource).await
        })
        .await
    }

    pub async fn utimes(&self, resource: impl AsRef<str>, mtime: SystemTime) -> VfsResult<FileStat> {
        self.route(Operation::Utimes, resource.as_ref(), |provider, resource| async move {
            provider.utimes(&resource, mtime).await
        })
        .await
    }
}

fn finish<T>(
    span: &OperationSpan,
    authority: String,
    operation: Operation,
    result: FsResult<T>,
) -> VfsResult<T> {
    match result {
        Ok(value) => {
            span.record_result(true);
            Ok(value)
        }
        Err(cause) => {
            span.record_error(&cause.to_string());
            Err(VfsError::provider(authority, operation, cause))
        }
    }
}
