/*!
 * In-Memory Filesystem Provider
 * Fast, volatile provider for testing and scratch authorities
 */

mod dir_ops;
mod file_ops;
mod node;

use ahash::RandomState;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;

use super::progress::ProgressSink;
use super::resource::ResourceId;
use super::traits::FileSystemProvider;
use super::types::*;
use crate::core::limits::DEFAULT_READ_CHUNK_SIZE;
use node::Node;

/// In-memory filesystem provider
///
/// Nodes are keyed by normalized path. Lookups go straight to the map;
/// operations that change the shape of the tree (create, delete, move) are
/// serialized by `structure` so parent/child links stay consistent.
#[derive(Debug, Clone)]
pub struct MemFS {
    nodes: Arc<DashMap<String, Node, RandomState>>,
    structure: Arc<Mutex<()>>,
    max_size: Option<usize>,
    current_size: Arc<AtomicUsize>,
    chunk_size: usize,
}

impl MemFS {
    /// Create new in-memory filesystem containing only the root directory
    pub fn new() -> Self {
        let nodes = DashMap::with_hasher(RandomState::new());
        nodes.insert("/".to_string(), Node::empty_dir());

        Self {
            nodes: Arc::new(nodes),
            structure: Arc::new(Mutex::new(())),
            max_size: None,
            current_size: Arc::new(AtomicUsize::new(0)),
            chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }

    /// Create with a limit on total file content, in bytes
    pub fn with_capacity(max_size: usize) -> Self {
        let mut fs = Self::new();
        fs.max_size = Some(max_size);
        fs
    }

    /// Set the size of chunks reported by `read`
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Total bytes of file content currently stored
    pub fn used_bytes(&self) -> usize {
        self.current_size.load(Ordering::SeqCst)
    }

    /// Check if space is available and reserve it atomically
    fn check_and_reserve_space(&self, additional: usize) -> FsResult<()> {
        let Some(max) = self.max_size else {
            self.current_size.fetch_add(additional, Ordering::SeqCst);
            return Ok(());
        };
        self.current_size
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                current.checked_add(additional).filter(|next| *next <= max)
            })
            .map(|_| ())
            .map_err(|_| FsError::OutOfSpace)
    }

    fn release_space(&self, amount: usize) {
        self.current_size.fetch_sub(amount, Ordering::SeqCst);
    }

    fn stat_of(resource: &ResourceId, node: &Node) -> FileStat {
        FileStat {
            resource: resource.clone(),
            mtime: node.mtime(),
            size: node.size(),
            file_type: node.file_type(),
        }
    }

    /// Parent must exist and be a directory
    fn check_parent(&self, resource: &ResourceId) -> FsResult<ResourceId> {
        let parent = resource
            .parent()
            .ok_or_else(|| FsError::InvalidArgument(format!("{resource} has no parent")))?;
        match self.nodes.get(parent.path()) {
            Some(node) if node.is_dir() => Ok(parent),
            Some(_) => Err(FsError::NotADirectory(parent.to_string())),
            None => Err(FsError::NotFound(parent.to_string())),
        }
    }

    fn link_child(&self, parent: &ResourceId, name: &str, now: SystemTime) {
        if let Some(mut entry) = self.nodes.get_mut(parent.path()) {
            if let Node::Directory { children, mtime } = entry.value_mut() {
                children.insert(name.to_string());
                *mtime = now;
            }
        }
    }

    fn unlink_child(&self, parent: &ResourceId, name: &str, now: SystemTime) {
        if let Some(mut entry) = self.nodes.get_mut(parent.path()) {
            if let Node::Directory { children, mtime } = entry.value_mut() {
                children.remove(name);
                *mtime = now;
            }
        }
    }
}

impl Default for MemFS {
    fn default() -> Self {
        Self::new()
    }
}

/// Final segment of a non-root resource
fn leaf_name(resource: &ResourceId) -> FsResult<&str> {
    resource
        .file_name()
        .ok_or_else(|| FsError::InvalidArgument(format!("{resource} is the root")))
}

#[async_trait]
impl FileSystemProvider for MemFS {
    fn name(&self) -> &str {
        "memfs"
    }

    async fn stat(&self, resource: &ResourceId) -> FsResult<FileStat> {
        self.stat_impl(resource)
    }

    async fn read(
        &self,
        resource: &ResourceId,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> FsResult<()> {
        self.read_impl(resource, progress, cancel).await
    }

    async fn write(&self, resource: &ResourceId, content: Bytes) -> FsResult<()> {
        self.write_impl(resource, content).map(|_| ())
    }

    async fn write_tracked(&self, resource: &ResourceId, content: Bytes) -> FsResult<WriteOutcome> {
        self.write_impl(resource, content)
    }

    async fn unlink(&self, resource: &ResourceId) -> FsResult<()> {
        self.unlink_impl(resource)
    }

    async fn rename(&self, resource: &ResourceId, target: &ResourceId) -> FsResult<()> {
        self.rename_impl(resource, target)
    }

    async fn mkdir(&self, resource: &ResourceId) -> FsResult<()> {
        self.mkdir_impl(resource)
    }

    async fn readdir(&self, resource: &ResourceId) -> FsResult<Vec<FileStat>> {
        self.readdir_impl(resource)
    }

    async fn rmdir(&self, resource: &ResourceId) -> FsResult<()> {
        self.rmdir_impl(resource)
    }

    async fn utimes(&self, resource: &ResourceId, mtime: SystemTime) -> FsResult<FileStat> {
        self.utimes_impl(resource, mtime)
    }
}
