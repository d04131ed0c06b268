/*!
 * Directory Operations Implementation
 * Provider methods for directory management and moves
 */

use std::time::SystemTime;

use super::super::resource::ResourceId;
use super::super::types::*;
use super::node::Node;
use super::{leaf_name, MemFS};

impl MemFS {
    pub(super) fn mkdir_impl(&self, resource: &ResourceId) -> FsResult<()> {
        if resource.is_root() {
            return Err(FsError::AlreadyExists(resource.to_string()));
        }
        let name = leaf_name(resource)?;
        let _structure = self.structure.lock();
        let parent = self.check_parent(resource)?;

        if self.nodes.contains_key(resource.path()) {
            return Err(FsError::AlreadyExists(resource.to_string()));
        }

        let now = SystemTime::now();
        self.nodes.insert(resource.path().to_string(), Node::empty_dir());
        self.link_child(&parent, name, now);
        Ok(())
    }

    pub(super) fn readdir_impl(&self, resource: &ResourceId) -> FsResult<Vec<FileStat>> {
        let children = match self.nodes.get(resource.path()).map(|n| n.value().clone()) {
            Some(Node::Directory { children, .. }) => children,
            Some(Node::File { .. }) => return Err(FsError::NotADirectory(resource.to_string())),
            None => return Err(FsError::NotFound(resource.to_string())),
        };

        let mut entries = Vec::with_capacity(children.len());
        for name in children {
            let child = resource
                .join(&name)
                .map_err(|e| FsError::InvalidArgument(e.to_string()))?;
            // A child removed since the listing snapshot is simply skipped
            if let Some(node) = self.nodes.get(child.path()) {
                entries.push(Self::stat_of(&child, node.value()));
            }
        }
        Ok(entries)
    }

    pub(super) fn rmdir_impl(&self, resource: &ResourceId) -> FsResult<()> {
        if resource.is_root() {
            return Err(FsError::PermissionDenied("cannot remove the root directory".into()));
        }
        let name = leaf_name(resource)?;
        let _structure = self.structure.lock();

        match self.nodes.get(resource.path()).map(|n| n.value().clone()) {
            Some(Node::Directory { children, .. }) if !children.is_empty() => {
                return Err(FsError::DirectoryNotEmpty(resource.to_string()));
            }
            Some(Node::Directory { .. }) => {}
            Some(Node::File { .. }) => return Err(FsError::NotADirectory(resource.to_string())),
            None => return Err(FsError::NotFound(resource.to_string())),
        }

        self.nodes.remove(resource.path());
        if let Some(parent) = resource.parent() {
            self.unlink_child(&parent, name, SystemTime::now());
        }
        Ok(())
    }

    /// Move a file or a whole directory subtree
    ///
    /// The target must not exist; moving a directory beneath itself is rejected.
    pub(super) fn rename_impl(&self, source: &ResourceId, target: &ResourceId) -> FsResult<()> {
        if source.is_root() || target.is_root() {
            return Err(FsError::InvalidArgument("cannot move the root directory".into()));
        }
        let source_name = leaf_name(source)?;
        let target_name = leaf_name(target)?;
        let _structure = self.structure.lock();

        if !self.nodes.contains_key(source.path()) {
            return Err(FsError::NotFound(source.to_string()));
        }
        if source == target {
            return Ok(());
        }
        if target.starts_with(source) {
            return Err(FsError::InvalidArgument(format!(
                "cannot move {source} beneath itself"
            )));
        }
        let target_parent = self.check_parent(target)?;
        if self.nodes.contains_key(target.path()) {
            return Err(FsError::AlreadyExists(target.to_string()));
        }

        // Collect the subtree first; never mutate the map while iterating it
        let moved: Vec<String> = self
            .nodes
            .iter()
            .filter(|entry| is_within(entry.key(), source.path()))
            .map(|entry| entry.key().clone())
            .collect();

        for old_path in moved {
            if let Some((_, node)) = self.nodes.remove(&old_path) {
                let new_path = format!("{}{}", target.path(), &old_path[source.path().len()..]);
                self.nodes.insert(new_path, node);
            }
        }

        let now = SystemTime::now();
        if let Some(source_parent) = source.parent() {
            self.unlink_child(&source_parent, source_name, now);
        }
        self.link_child(&target_parent, target_name, now);
        Ok(())
    }
}

/// True if `path` is `prefix` or lies beneath it (segment-aware)
fn is_within(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
}
