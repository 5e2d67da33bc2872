//! The fixed-capacity pool of data blocks.
//!
//! A `Vec<u8>` per slot, plus a parallel allocation-state array protected
//! by one mutex. Allocation is first-fit.

use std::sync::Mutex;

use crate::error::{FsError, Result, TableKind};

/// Index into the data-block pool. Numbers may be reused after a block is
/// freed.
pub type BlockNo = usize;

struct AllocState {
    taken: Vec<bool>,
}

impl AllocState {
    fn first_fit(&mut self) -> Option<BlockNo> {
        let idx = self.taken.iter().position(|&t| !t)?;
        self.taken[idx] = true;
        Some(idx)
    }
}

/// Pool of fixed-size byte buffers, first-fit allocated.
pub struct BlockPool {
    block_size: usize,
    blocks: Vec<Mutex<Vec<u8>>>,
    alloc: Mutex<AllocState>,
}

impl BlockPool {
    pub fn new(count: usize, block_size: usize) -> Self {
        Self {
            block_size,
            blocks: (0..count).map(|_| Mutex::new(vec![0u8; block_size])).collect(),
            alloc: Mutex::new(AllocState {
                taken: vec![false; count],
            }),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Allocates the first free block and zero-fills it.
    pub fn alloc(&self) -> Result<BlockNo> {
        let mut state = self.alloc.lock().unwrap_or_else(|e| e.into_inner());
        let block_no = state.first_fit().ok_or_else(|| {
            log::warn!("data block table exhausted");
            FsError::TableFull(TableKind::DataBlock)
        })?;
        drop(state);
        self.with_block_mut(block_no, |buf| buf.iter_mut().for_each(|b| *b = 0));
        log::trace!("block_no={block_no} allocated");
        Ok(block_no)
    }

    /// Frees a previously allocated block.
    ///
    /// Caller must hold the write lock of the inode that owned this block.
    pub fn free(&self, block_no: BlockNo) {
        let mut state = self.alloc.lock().unwrap_or_else(|e| e.into_inner());
        debug_assert!(state.taken[block_no], "double free of block {block_no}");
        state.taken[block_no] = false;
        log::trace!("block_no={block_no} freed");
    }

    /// Runs `f` with read access to the block's bytes.
    pub fn with_block<R>(&self, block_no: BlockNo, f: impl FnOnce(&[u8]) -> R) -> R {
        let guard = self.blocks[block_no].lock().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    /// Runs `f` with mutable access to the block's bytes.
    pub fn with_block_mut<R>(&self, block_no: BlockNo, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let mut guard = self.blocks[block_no].lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}
