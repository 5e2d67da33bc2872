//! Crate-wide error type.
//!
//! Every public operation returns `Result<T, FsError>`. `FsError` exists so
//! that callers (and tests) can match on *why* an operation failed, while
//! still collapsing cleanly to "the operation did not succeed" for callers
//! that just want a yes/no.

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FsError>;

/// Collapses a [`Result`] into a C-style `0`/`-1` sentinel, for callers
/// that want that convention instead of matching on [`FsError`].
pub trait AsRaw {
    /// 0 on success (or the success value truncated to `i32` for handle-
    /// and byte-count-returning operations), -1 on any error.
    fn as_raw(&self) -> i32;
}

impl AsRaw for Result<()> {
    fn as_raw(&self) -> i32 {
        if self.is_ok() { 0 } else { -1 }
    }
}

impl AsRaw for Result<usize> {
    fn as_raw(&self) -> i32 {
        match self {
            Ok(n) => i32::try_from(*n).unwrap_or(i32::MAX),
            Err(_) => -1,
        }
    }
}

/// Which fixed-size table was exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Inode,
    DataBlock,
    OpenFile,
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Inode => "inode",
            Self::DataBlock => "data block",
            Self::OpenFile => "open file",
        };
        f.write_str(name)
    }
}

/// Recoverable failure of a TecnicoFS operation.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("invalid parameters: {0}")]
    InvalidParams(&'static str),

    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    #[error("{0} table is full")]
    TableFull(TableKind),

    #[error("no such entry: {0:?}")]
    NotFound(String),

    #[error("entry already exists: {0:?}")]
    AlreadyExists(String),

    #[error("invalid handle: {0}")]
    InvalidHandle(i32),

    #[error("inode was concurrently deleted")]
    InodeGone,

    #[error("target is a directory")]
    NotADirectory,

    #[error("cannot hard-link a symbolic link")]
    IsSymlink,

    #[error("file is currently open")]
    FileOpen,

    #[error("symbolic link chain exceeds the resolution depth limit")]
    TooDeepSymlinkChain,

    #[error("failed to import {path:?} from the host file system: {source}")]
    HostIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("host file {path:?} ({size} bytes) exceeds the block size")]
    HostFileTooLarge { path: PathBuf, size: u64 },
}
