/*!
 * VFS Change Events
 * Mutations reported by providers and the tagged batches the hub republishes
 */

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::vfs::resource::{Authority, ResourceId};

/// Kind of mutation
///
/// Discriminants match the extension API wire values.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FileChangeType {
    Updated = 0,
    Added = 1,
    Deleted = 2,
}

impl From<FileChangeType> for u8 {
    fn from(change_type: FileChangeType) -> Self {
        change_type as u8
    }
}

impl TryFrom<u8> for FileChangeType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FileChangeType::Updated),
            1 => Ok(FileChangeType::Added),
            2 => Ok(FileChangeType::Deleted),
            other => Err(format!("unknown change type {other}")),
        }
    }
}

/// Whether a write created a new file or replaced an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Replaced,
}

impl WriteOutcome {
    /// The change a successful write of `resource` reports
    pub fn change_for(self, resource: ResourceId) -> FileChange {
        match self {
            WriteOutcome::Created => FileChange::added(resource),
            WriteOutcome::Replaced => FileChange::updated(resource),
        }
    }
}

/// A single mutation emitted by a provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileChange {
    #[serde(rename = "type")]
    pub change_type: FileChangeType,
    pub resource: ResourceId,
}

impl FileChange {
    pub fn updated(resource: ResourceId) -> Self {
        Self {
            change_type: FileChangeType::Updated,
            resource,
        }
    }

    pub fn added(resource: ResourceId) -> Self {
        Self {
            change_type: FileChangeType::Added,
            resource,
        }
    }

    pub fn deleted(resource: ResourceId) -> Self {
        Self {
            change_type: FileChangeType::Deleted,
            resource,
        }
    }
}

/// One provider batch as seen on the unified stream, tagged with its origin
///
/// Cheap to clone; the changes are shared between all subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    pub authority: Authority,
    pub changes: Arc<[FileChange]>,
}

impl ChangeBatch {
    pub fn new(authority: Authority, changes: Vec<FileChange>) -> Self {
        Self {
            authority,
            changes: changes.into(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
