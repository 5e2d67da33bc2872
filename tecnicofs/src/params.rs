//! Process-wide sizing for a [`crate::TecnicoFs`] instance.

use crate::error::{FsError, Result};

/// Default number of inode slots (root directory occupies one of them).
pub const DEFAULT_MAX_INODE_COUNT: usize = 64;
/// Default number of data-block slots.
pub const DEFAULT_MAX_BLOCK_COUNT: usize = 1024;
/// Default number of open-file-table slots.
pub const DEFAULT_MAX_OPEN_FILES_COUNT: usize = 16;
/// Default data-block size, in bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Immutable sizing parameters for a filesystem instance, fixed for its
/// whole lifetime.
#[derive(Debug, Clone, Copy)]
pub struct Params {
    pub(crate) max_inode_count: usize,
    pub(crate) max_block_count: usize,
    pub(crate) max_open_files_count: usize,
    pub(crate) block_size: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            max_inode_count: DEFAULT_MAX_INODE_COUNT,
            max_block_count: DEFAULT_MAX_BLOCK_COUNT,
            max_open_files_count: DEFAULT_MAX_OPEN_FILES_COUNT,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl Params {
    /// Builds a validated parameter set.
    ///
    /// `block_size` must be large enough to hold at least one directory
    /// entry, since the root directory's block is reinterpreted as an
    /// array of those.
    pub fn new(
        max_inode_count: usize,
        max_block_count: usize,
        max_open_files_count: usize,
        block_size: usize,
    ) -> Result<Self> {
        if max_inode_count == 0 || max_block_count == 0 || max_open_files_count == 0 {
            return Err(FsError::InvalidParams("table sizes must be nonzero"));
        }
        if block_size < crate::dir::DIR_ENTRY_SIZE {
            return Err(FsError::InvalidParams(
                "block_size must hold at least one directory entry",
            ));
        }
        Ok(Self {
            max_inode_count,
            max_block_count,
            max_open_files_count,
            block_size,
        })
    }

    #[must_use]
    pub fn max_inode_count(&self) -> usize {
        self.max_inode_count
    }

    #[must_use]
    pub fn max_block_count(&self) -> usize {
        self.max_block_count
    }

    #[must_use]
    pub fn max_open_files_count(&self) -> usize {
        self.max_open_files_count
    }

    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of directory entry slots a directory block can hold.
    #[must_use]
    pub(crate) fn dir_entries_per_block(&self) -> usize {
        self.block_size / crate::dir::DIR_ENTRY_SIZE
    }
}
