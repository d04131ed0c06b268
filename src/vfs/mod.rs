/*!
 * Virtual File System Module
 * Provider registry, operation routing and change notification
 */

pub mod config;
pub mod disposable;
pub mod host;
pub mod hub;
pub mod memory;
pub mod observable;
pub mod observable_wrapper;
pub mod progress;
pub mod registry;
pub mod resource;
pub mod router;
pub mod traits;
pub mod types;

// Re-exports
pub use config::HostConfig;
pub use disposable::Disposable;
pub use host::FileSystemHost;
pub use hub::{ChangeHub, SubscriptionState};
pub use memory::MemFS;
pub use observable::{EventBroadcaster, Observable};
pub use observable_wrapper::ObservableProvider;
pub use progress::{BufferSink, ChannelSink, ProgressSink};
pub use registry::ProviderRegistry;
pub use resource::{Authority, ResourceId};
pub use router::Router;
pub use traits::FileSystemProvider;
pub use types::{
    ChangeBatch, FileChange, FileChangeType, FileStat, FileType, FsError, FsResult, Operation,
    VfsError, VfsResult, WriteOutcome,
};
