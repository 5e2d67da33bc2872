//! The inode table: typed inode records behind a per-inode read/write lock.
//!
//! Backs files, symbolic links, and the single root directory: a
//! fixed-size arena of slots, a tagged in-memory record per inode, and a
//! lock-then-revalidate idiom so a thread that blocked on a slot's lock can
//! tell whether the slot was freed and reallocated out from under it while
//! it waited.

use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::block::BlockNo;
use crate::error::{FsError, Result, TableKind};

/// Index into the inode table. Numbers may be reused after a slot is freed.
pub type Inumber = usize;

/// Inode number of the (always-present) root directory.
pub const ROOT_INUM: Inumber = 0;

/// The tagged kind of an inode. Fields meaningful only to one kind live in
/// that variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeKind {
    File,
    Directory,
    Symlink,
}

/// The mutable, lock-guarded portion of an inode.
#[derive(Debug)]
pub struct InodeBody {
    pub kind: InodeKind,
    pub size: usize,
    pub data_block: Option<BlockNo>,
    /// Reference count. Meaningful for `File` only; `Directory` and
    /// `Symlink` behave as if permanently 1.
    pub hard_links: u32,
}

impl InodeBody {
    fn fresh(kind: InodeKind) -> Self {
        Self {
            kind,
            size: 0,
            data_block: None,
            hard_links: 1,
        }
    }
}

/// One slot in the inode table.
struct InodeSlot {
    body: RwLock<InodeBody>,
}

struct AllocState {
    taken: Vec<bool>,
}

impl AllocState {
    fn first_fit(&mut self) -> Option<Inumber> {
        let idx = self.taken.iter().position(|&t| !t)?;
        self.taken[idx] = true;
        Some(idx)
    }
}

/// The fixed-capacity table of inodes.
pub struct InodeTable {
    slots: Vec<InodeSlot>,
    alloc: Mutex<AllocState>,
}

impl InodeTable {
    pub fn new(count: usize) -> Self {
        Self {
            slots: (0..count)
                .map(|_| InodeSlot {
                    body: RwLock::new(InodeBody::fresh(InodeKind::File)),
                })
                .collect(),
            alloc: Mutex::new(AllocState {
                taken: vec![false; count],
            }),
        }
    }

    /// Allocates an inode of the given kind. Does not allocate a data block
    /// even for `Directory` — the caller (the filesystem façade) does that
    /// and rolls back the slot if it fails.
    pub fn alloc(&self, kind: InodeKind) -> Result<Inumber> {
        let mut state = self.alloc.lock().unwrap_or_else(|e| e.into_inner());
        let inum = state.first_fit().ok_or_else(|| {
            log::warn!("inode table exhausted");
            FsError::TableFull(TableKind::Inode)
        })?;
        drop(state);

        *self.slots[inum].body.write().unwrap_or_else(|e| e.into_inner()) = InodeBody::fresh(kind);
        log::trace!("inum={inum} allocated as {kind:?}");
        Ok(inum)
    }

    /// Releases a just-allocated slot whose subsequent setup (e.g.
    /// allocating the root directory block) failed.
    pub fn rollback_alloc(&self, inum: Inumber) {
        let mut state = self.alloc.lock().unwrap_or_else(|e| e.into_inner());
        state.taken[inum] = false;
        log::trace!("inum={inum} rolled back");
    }

    /// Marks the slot free. Caller must hold the write lock of this inode
    /// (passed in as proof) and must already have freed any data block it
    /// referenced.
    pub fn delete(&self, inum: Inumber, _proof: &RwLockWriteGuard<'_, InodeBody>) {
        let mut state = self.alloc.lock().unwrap_or_else(|e| e.into_inner());
        state.taken[inum] = false;
        log::trace!("inum={inum} deleted");
    }

    /// True iff `inum` is in range and currently allocated. Must be
    /// consulted under the allocation lock, and re-checked as the first act
    /// after acquiring an inode's rwlock — a thread can block on that lock
    /// for long enough that the inode it wanted is freed and reallocated
    /// before the lock is granted.
    pub fn is_taken(&self, inum: Inumber) -> bool {
        if inum >= self.slots.len() {
            return false;
        }
        let state = self.alloc.lock().unwrap_or_else(|e| e.into_inner());
        state.taken[inum]
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Read-locks the inode at `inum`. Returns `None` if out of range.
    pub fn read(&self, inum: Inumber) -> Option<RwLockReadGuard<'_, InodeBody>> {
        self.slots
            .get(inum)
            .map(|slot| slot.body.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Write-locks the inode at `inum`. Returns `None` if out of range.
    pub fn write(&self, inum: Inumber) -> Option<RwLockWriteGuard<'_, InodeBody>> {
        self.slots
            .get(inum)
            .map(|slot| slot.body.write().unwrap_or_else(|e| e.into_inner()))
    }
}
