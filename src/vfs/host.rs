/*!
 * File System Host
 * Owns the registry, router and change hub for one process
 */

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;

use super::config::HostConfig;
use super::disposable::Disposable;
use super::hub::ChangeHub;
use super::memory::MemFS;
use super::observable_wrapper::ObservableProvider;
use super::registry::ProviderRegistry;
use super::resource::Authority;
use super::router::Router;
use super::traits::FileSystemProvider;
use super::types::{ChangeBatch, VfsResult};

/// Explicitly constructed host state
///
/// Every provider registration goes through
/// `register_file_system_provider`. `teardown` releases all registrations
/// and leaves the host usable for new ones.
pub struct FileSystemHost {
    config: HostConfig,
    registry: ProviderRegistry,
    router: Router,
}

impl FileSystemHost {
    pub fn new(config: HostConfig) -> Self {
        let config = config.normalized();
        let registry = ProviderRegistry::new(ChangeHub::new(config.event_capacity));
        let router = Router::new(registry.clone());

        info!(
            event_capacity = config.event_capacity,
            provider_event_capacity = config.provider_event_capacity,
            read_chunk_size = config.read_chunk_size,
            "file system host initialized"
        );

        Self {
            config,
            registry,
            router,
        }
    }

    /// Host configured from `VFS_*` environment variables
    pub fn from_env() -> Self {
        Self::new(HostConfig::from_env())
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Bind `authority` to `provider`
    ///
    /// Fails with `DuplicateAuthority` if the authority is taken. Providers
    /// exposing a change source must be registered from within a Tokio
    /// runtime.
    pub fn register_file_system_provider(
        &self,
        authority: &str,
        provider: Arc<dyn FileSystemProvider>,
    ) -> VfsResult<Disposable> {
        self.registry.register(authority, provider)
    }

    /// Router for the nine filesystem primitives
    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn hub(&self) -> &ChangeHub {
        self.registry.hub()
    }

    /// Receive every change batch published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeBatch> {
        self.hub().subscribe()
    }

    pub fn stream(&self) -> BroadcastStream<ChangeBatch> {
        self.hub().stream()
    }

    /// Invoke `listener` for every change batch until disposed
    pub fn on_did_change<F>(&self, listener: F) -> VfsResult<Disposable>
    where
        F: Fn(ChangeBatch) + Send + Sync + 'static,
    {
        self.hub().on_did_change(listener)
    }

    /// Registered `(authority, provider name)` pairs
    pub fn providers(&self) -> Vec<(Authority, String)> {
        self.registry.list()
    }

    /// In-memory provider using the configured read chunk size
    pub fn memfs(&self) -> MemFS {
        MemFS::new().with_chunk_size(self.config.read_chunk_size)
    }

    /// Change-reporting in-memory provider using the configured buffers
    pub fn observable_memfs(&self) -> ObservableProvider<MemFS> {
        ObservableProvider::new(self.memfs()).with_capacity(self.config.provider_event_capacity)
    }

    /// Release every registration; returns how many were released
    pub fn teardown(&self) -> usize {
        let released = self.registry.dispose_all();
        info!(released, "file system host torn down");
        released
    }
}

impl Default for FileSystemHost {
    fn default() -> Self {
        Self::new(HostConfig::default())
    }
}
