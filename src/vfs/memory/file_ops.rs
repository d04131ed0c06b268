/*!
 * File Operations Implementation
 * Provider methods for file content and metadata
 */

use bytes::Bytes;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;

use super::super::progress::ProgressSink;
use super::super::resource::ResourceId;
use super::super::types::*;
use super::node::Node;
use super::{leaf_name, MemFS};

impl MemFS {
    pub(super) fn stat_impl(&self, resource: &ResourceId) -> FsResult<FileStat> {
        self.nodes
            .get(resource.path())
            .map(|node| Self::stat_of(resource, node.value()))
            .ok_or_else(|| FsError::NotFound(resource.to_string()))
    }

    pub(super) async fn read_impl(
        &self,
        resource: &ResourceId,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> FsResult<()> {
        // Clone the handle out so no map guard is held across await points
        let data = match self.nodes.get(resource.path()).map(|n| n.value().clone()) {
            Some(Node::File { data, .. }) => data,
            Some(Node::Directory { .. }) => return Err(FsError::IsADirectory(resource.to_string())),
            None => return Err(FsError::NotFound(resource.to_string())),
        };

        let mut offset = 0;
        while offset < data.len() {
            if cancel.is_cancelled() {
                return Err(FsError::Cancelled);
            }
            let end = (offset + self.chunk_size).min(data.len());
            progress.report(data.slice(offset..end));
            offset = end;
            tokio::task::yield_now().await;
        }
        Ok(())
    }

    pub(super) fn write_impl(&self, resource: &ResourceId, content: Bytes) -> FsResult<WriteOutcome> {
        let name = leaf_name(resource).map_err(|_| FsError::IsADirectory(resource.to_string()))?;
        let _structure = self.structure.lock();
        let parent = self.check_parent(resource)?;

        let old_size = match self.nodes.get(resource.path()).map(|n| n.value().clone()) {
            Some(Node::Directory { .. }) => {
                return Err(FsError::IsADirectory(resource.to_string()));
            }
            Some(Node::File { data, .. }) => Some(data.len()),
            None => None,
        };

        let new_size = content.len();
        match old_size {
            Some(old) if new_size > old => self.check_and_reserve_space(new_size - old)?,
            Some(old) => self.release_space(old - new_size),
            None => self.check_and_reserve_space(new_size)?,
        }

        let now = SystemTime::now();
        self.nodes.insert(
            resource.path().to_string(),
            Node::File {
                data: content,
                mtime: now,
            },
        );
        if old_size.is_none() {
            self.link_child(&parent, name, now);
            return Ok(WriteOutcome::Created);
        }
        Ok(WriteOutcome::Replaced)
    }

    pub(super) fn unlink_impl(&self, resource: &ResourceId) -> FsResult<()> {
        let name = leaf_name(resource).map_err(|_| FsError::IsADirectory(resource.to_string()))?;
        let _structure = self.structure.lock();

        let size = match self.nodes.get(resource.path()).map(|n| n.value().clone()) {
            Some(Node::File { data, .. }) => data.len(),
            Some(Node::Directory { .. }) => {
                return Err(FsError::IsADirectory(resource.to_string()));
            }
            None => return Err(FsError::NotFound(resource.to_string())),
        };

        self.nodes.remove(resource.path());
        self.release_space(size);
        if let Some(parent) = resource.parent() {
            self.unlink_child(&parent, name, SystemTime::now());
        }
        Ok(())
    }

    pub(super) fn utimes_impl(&self, resource: &ResourceId, mtime: SystemTime) -> FsResult<FileStat> {
        let mut node = self
            .nodes
            .get_mut(resource.path())
            .ok_or_else(|| FsError::NotFound(resource.to_string()))?;
        node.value_mut().set_mtime(mtime);
        Ok(Self::stat_of(resource, node.value()))
    }
}
