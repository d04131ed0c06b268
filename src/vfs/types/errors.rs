/*!
 * VFS Error Types
 * Routing errors raised by the host and failures raised by providers
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::core::serde::deserialize_nonempty_string;

/// Result of a routed host operation
///
/// # Must Use
/// Filesystem operations can fail and must be handled to prevent data loss
#[must_use = "VFS operations can fail and must be handled"]
pub type VfsResult<T> = Result<T, VfsError>;

/// Result of a provider operation
#[must_use = "provider operations can fail and must be handled"]
pub type FsResult<T> = Result<T, FsError>;

/// The nine filesystem primitives a provider implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Stat,
    Read,
    Write,
    Unlink,
    Rename,
    Mkdir,
    Readdir,
    Rmdir,
    Utimes,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::Stat,
        Operation::Read,
        Operation::Write,
        Operation::Unlink,
        Operation::Rename,
        Operation::Mkdir,
        Operation::Readdir,
        Operation::Rmdir,
        Operation::Utimes,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Operation::Stat => "stat",
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Unlink => "unlink",
            Operation::Rename => "rename",
            Operation::Mkdir => "mkdir",
            Operation::Readdir => "readdir",
            Operation::Rmdir => "rmdir",
            Operation::Utimes => "utimes",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host errors
///
/// Addressing and registry variants are detected before any provider is
/// invoked. Provider failures arrive wrapped in `Provider` with the authority
/// and operation that produced them.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum VfsError {
    #[error("Malformed address: {0}")]
    #[diagnostic(
        code(vfs::malformed_address),
        help("Resources are addressed as `authority:/path`; `..` may not climb above the root.")
    )]
    MalformedAddress(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("A provider is already registered for authority '{0}'")]
    #[diagnostic(
        code(vfs::duplicate_authority),
        help("Dispose the existing registration before registering a new provider.")
    )]
    DuplicateAuthority(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("No provider registered for authority '{0}'")]
    #[diagnostic(code(vfs::no_provider))]
    NoProvider(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Cannot move resources from '{from}' to '{to}': different authorities")]
    #[diagnostic(
        code(vfs::cross_authority),
        help("Copy the content through read and write, then unlink the source explicitly.")
    )]
    CrossAuthorityUnsupported { from: String, to: String },

    #[error("{operation} on '{authority}' failed: {cause}")]
    #[diagnostic(code(vfs::provider_error))]
    Provider {
        authority: String,
        operation: Operation,
        #[source]
        cause: FsError,
    },

    #[error("{operation} on '{authority}' was cancelled")]
    #[diagnostic(code(vfs::cancelled))]
    Cancelled {
        authority: String,
        operation: Operation,
    },

    #[error("Change subscriptions require a running Tokio runtime")]
    #[diagnostic(
        code(vfs::runtime_unavailable),
        help("Register observable providers from within a Tokio runtime.")
    )]
    RuntimeUnavailable,
}

impl VfsError {
    /// Wrap a provider failure with its origin
    pub fn provider(authority: impl Into<String>, operation: Operation, cause: FsError) -> Self {
        VfsError::Provider {
            authority: authority.into(),
            operation,
            cause,
        }
    }

    /// Provider failure cause, if this error came from a provider
    pub fn provider_cause(&self) -> Option<&FsError> {
        match self {
            VfsError::Provider { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// Provider-level failures
///
/// Providers report these; the host wraps them in `VfsError::Provider`
/// without altering them.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum FsError {
    #[error("Not found: {0}")]
    NotFound(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Already exists: {0}")]
    AlreadyExists(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Not a directory: {0}")]
    NotADirectory(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Is a directory: {0}")]
    IsADirectory(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Permission denied: {0}")]
    PermissionDenied(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Not supported: {0}")]
    NotSupported(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Out of space")]
    OutOfSpace,

    #[error("Cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[serde(deserialize_with = "deserialize_nonempty_string")] String),
}

impl From<std::io::Error> for FsError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        let message = err.to_string();
        match err.kind() {
            ErrorKind::NotFound => FsError::NotFound(message),
            ErrorKind::AlreadyExists => FsError::AlreadyExists(message),
            ErrorKind::PermissionDenied => FsError::PermissionDenied(message),
            ErrorKind::InvalidInput => FsError::InvalidArgument(message),
            ErrorKind::Unsupported => FsError::NotSupported(message),
            _ => FsError::Io(message),
        }
    }
}
