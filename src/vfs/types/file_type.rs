/*!
 * VFS File Type Enum
 * Defines the type of filesystem objects
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of object a `FileStat` describes
///
/// Discriminants match the extension API wire values (File = 0, Dir = 1, Symlink = 2).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FileType {
    File = 0,
    Directory = 1,
    Symlink = 2,
}

impl From<FileType> for u8 {
    fn from(file_type: FileType) -> Self {
        file_type as u8
    }
}

impl TryFrom<u8> for FileType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FileType::File),
            1 => Ok(FileType::Directory),
            2 => Ok(FileType::Symlink),
            other => Err(format!("unknown file type {other}")),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FileType::File => write!(f, "file"),
            FileType::Directory => write!(f, "directory"),
            FileType::Symlink => write!(f, "symlink"),
        }
    }
}
