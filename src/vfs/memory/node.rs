/*!
 * Filesystem Node Types
 * Internal representation of files and directories
 */

use bytes::Bytes;
use std::collections::BTreeSet;
use std::time::SystemTime;

use super::super::types::FileType;

/// In-memory filesystem node
#[derive(Debug, Clone)]
pub(super) enum Node {
    File {
        data: Bytes,
        mtime: SystemTime,
    },
    Directory {
        children: BTreeSet<String>,
        mtime: SystemTime,
    },
}

impl Node {
    pub fn empty_dir() -> Self {
        Node::Directory {
            children: BTreeSet::new(),
            mtime: SystemTime::now(),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory { .. })
    }

    pub fn file_type(&self) -> FileType {
        match self {
            Node::File { .. } => FileType::File,
            Node::Directory { .. } => FileType::Directory,
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Node::File { data, .. } => data.len() as u64,
            Node::Directory { .. } => 0,
        }
    }

    pub fn mtime(&self) -> SystemTime {
        match self {
            Node::File { mtime, .. } | Node::Directory { mtime, .. } => *mtime,
        }
    }

    pub fn set_mtime(&mut self, value: SystemTime) {
        match self {
            Node::File { mtime, .. } | Node::Directory { mtime, .. } => *mtime = value,
        }
    }
}
