//! The open-file table.
//!
//! Handles index into a fixed-size arena of `(inumber, offset)` pairs, each
//! behind its own mutex, so `read` and `write` can update a handle's cursor
//! without taking any wider lock.

use std::sync::Mutex;

use crate::error::{FsError, Result, TableKind};
use crate::inode::Inumber;

/// Index into the open-file table, returned by `open` and consumed by
/// `read`/`write`/`close`.
pub type Handle = usize;

struct Entry {
    inumber: Option<Inumber>,
    offset: usize,
}

/// The fixed-capacity table of open-file entries.
pub struct OpenFileTable {
    entries: Vec<Mutex<Entry>>,
}

impl OpenFileTable {
    pub fn new(count: usize) -> Self {
        Self {
            entries: (0..count)
                .map(|_| {
                    Mutex::new(Entry {
                        inumber: None,
                        offset: 0,
                    })
                })
                .collect(),
        }
    }

    /// Allocates a free slot for `(inumber, offset)`. First-fit, like the
    /// other tables.
    pub fn add(&self, inumber: Inumber, offset: usize) -> Result<Handle> {
        for (handle, entry) in self.entries.iter().enumerate() {
            let mut entry = entry.lock().unwrap_or_else(|e| e.into_inner());
            if entry.inumber.is_none() {
                entry.inumber = Some(inumber);
                entry.offset = offset;
                log::trace!("handle={handle} opened for inum={inumber} offset={offset}");
                return Ok(handle);
            }
        }
        log::warn!("open-file table exhausted");
        Err(FsError::TableFull(TableKind::OpenFile))
    }

    /// Frees `handle`.
    pub fn remove(&self, handle: Handle) -> Result<()> {
        let mut entry = self
            .entries
            .get(handle)
            .ok_or(FsError::InvalidHandle(handle as i32))?
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if entry.inumber.take().is_none() {
            return Err(FsError::InvalidHandle(handle as i32));
        }
        entry.offset = 0;
        log::trace!("handle={handle} closed");
        Ok(())
    }

    /// True iff some open entry currently references `inumber`.
    pub fn is_file_open(&self, inumber: Inumber) -> bool {
        self.entries.iter().any(|entry| {
            let entry = entry.lock().unwrap_or_else(|e| e.into_inner());
            entry.inumber == Some(inumber)
        })
    }

    /// Returns the inumber a handle currently refers to, erroring on an
    /// invalid or closed handle.
    pub fn inumber_of(&self, handle: Handle) -> Result<Inumber> {
        let entry = self
            .entries
            .get(handle)
            .ok_or(FsError::InvalidHandle(handle as i32))?
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        entry.inumber.ok_or(FsError::InvalidHandle(handle as i32))
    }

    /// Runs `f` with the entry's offset, under the entry mutex, and stores
    /// back whatever `f` returns as the new offset. Used by both `read` and
    /// `write` so that the offset mutation is always serialized per handle,
    /// closing the race that would otherwise let two writers on the same
    /// handle clobber each other's offset update.
    pub fn with_offset<R>(
        &self,
        handle: Handle,
        f: impl FnOnce(usize) -> Result<(usize, R)>,
    ) -> Result<R> {
        let mut entry = self
            .entries
            .get(handle)
            .ok_or(FsError::InvalidHandle(handle as i32))?
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if entry.inumber.is_none() {
            return Err(FsError::InvalidHandle(handle as i32));
        }
        let (new_offset, ret) = f(entry.offset)?;
        entry.offset = new_offset;
        Ok(ret)
    }
}
