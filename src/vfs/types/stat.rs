/*!
 * VFS File Stat
 * Read-only snapshot of a resource produced by `stat` and `readdir`
 */

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use super::file_type::FileType;
use crate::core::serde::{is_zero_u64, system_time_millis};
use crate::vfs::resource::ResourceId;

/// Snapshot of a resource at the time it was produced
///
/// Every call yields a fresh value; nothing in the host caches or mutates it.
/// `mtime` is serialized as milliseconds since the UNIX epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileStat {
    pub resource: ResourceId,
    #[serde(with = "system_time_millis")]
    pub mtime: SystemTime,
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub size: u64,
    #[serde(rename = "type")]
    pub file_type: FileType,
}

impl FileStat {
    #[inline]
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.file_type, FileType::Directory)
    }

    #[inline]
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.file_type, FileType::File)
    }

    #[inline]
    #[must_use]
    pub const fn is_symlink(&self) -> bool {
        matches!(self.file_type, FileType::Symlink)
    }
}
