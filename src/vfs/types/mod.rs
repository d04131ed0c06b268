/*!
 * VFS Types
 * Shared types for routed filesystem operations
 */

mod change;
mod errors;
mod file_type;
mod stat;

pub use change::{ChangeBatch, FileChange, FileChangeType, WriteOutcome};
pub use errors::{FsError, FsResult, Operation, VfsError, VfsResult};
pub use file_type::FileType;
pub use stat::FileStat;
