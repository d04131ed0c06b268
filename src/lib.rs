/*!
 * VFS Host Library
 * Authority-routed virtual file system with pluggable providers
 */

pub mod api;
pub mod core;
pub mod monitoring;
pub mod vfs;

// Re-exports
pub use monitoring::init_tracing;
pub use vfs::{
    Authority, ChangeBatch, Disposable, FileChange, FileChangeType, FileStat, FileSystemHost,
    FileSystemProvider, FileType, FsError, HostConfig, MemFS, ObservableProvider, Operation,
    ResourceId, Router, VfsError, VfsResult,
};
