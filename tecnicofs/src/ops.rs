//! The operation layer: the user-visible verbs that compose the allocation
//! tables, inode table, directory entries, and open-file table under one
//! locking protocol — parallel readers, serialized writers and structural
//! changes, and a lock-then-revalidate step everywhere an inode lock is
//! acquired.

use crate::dir;
use crate::error::{FsError, Result};
use crate::inode::{InodeKind, Inumber};
use crate::mode::OpenMode;
use crate::open_file::Handle;
use crate::path;
use crate::TecnicoFs;

/// Symlink chains longer than this are rejected rather than followed, so a
/// cyclic chain fails cleanly instead of recursing without bound.
const MAX_SYMLINK_DEPTH: u32 = 16;

impl TecnicoFs {
    fn find_in_root(&self, name: &str) -> Option<Inumber> {
        dir::find_in_dir(&self.blocks, self.root_block, self.dir_entry_count, name)
    }

    fn add_to_root(&self, name: &str, inum: Inumber) -> Result<()> {
        dir::add_dir_entry(&self.blocks, self.root_block, self.dir_entry_count, name, inum)
    }

    fn clear_from_root(&self, name: &str) -> Result<()> {
        dir::clear_dir_entry(&self.blocks, self.root_block, self.dir_entry_count, name)
    }

    /// Opens `path`, creating it first if `mode` contains `CREAT` and it
    /// does not yet exist.
    pub fn open(&self, path: &str, mode: OpenMode) -> Result<Handle> {
        let handle = self.open_inner(path, mode, 0)?;
        log::debug!("open({path:?}, {mode:?}) -> handle={handle}");
        Ok(handle)
    }

    fn open_inner(&self, path: &str, mode: OpenMode, depth: u32) -> Result<Handle> {
        let name = path::validate(path)?;

        let inum = match self.find_in_root(name) {
            Some(inum) => {
                let offset = {
                    let mut body = self
                        .inodes
                        .write(inum)
                        .ok_or_else(|| FsError::NotFound(path.to_string()))?;
                    if !self.inodes.is_taken(inum) {
                        return Err(FsError::InodeGone);
                    }

                    match body.kind {
                        InodeKind::Symlink => {
                            if depth >= MAX_SYMLINK_DEPTH {
                                return Err(FsError::TooDeepSymlinkChain);
                            }
                            let symlink_block = body.data_block.unwrap_or_else(|| {
                                log::error!("symlink inum={inum} has no data block");
                                unreachable!("symlink inum={inum} has no data block");
                            });
                            let target = self.blocks.with_block(symlink_block, |buf| {
                                String::from_utf8_lossy(&buf[..body.size]).into_owned()
                            });
                            drop(body);
                            return self.open_inner(&target, mode, depth + 1).inspect_err(|_| {
                                log::warn!("dangling symlink: {path:?} -> {target:?}");
                            });
                        }
                        InodeKind::Directory => return Err(FsError::NotADirectory),
                        InodeKind::File => {}
                    }

                    if mode.contains(OpenMode::TRUNC) && body.size > 0 {
                        if let Some(block_no) = body.data_block.take() {
                            self.blocks.free(block_no);
                        }
                        body.size = 0;
                    }

                    if mode.contains(OpenMode::APPEND) {
                        body.size
                    } else {
                        0
                    }
                };
                return self.finish_open(inum, offset);
            }
            None => None,
        };

        let inum = match inum {
            Some(inum) => inum,
            None => {
                if !mode.contains(OpenMode::CREAT) {
                    return Err(FsError::NotFound(path.to_string()));
                }
                let new_inum = self.inodes.alloc(InodeKind::File)?;
                if let Err(e) = self.add_to_root(name, new_inum) {
                    self.rollback_created_inode(new_inum);
                    return Err(e);
                }
                new_inum
            }
        };

        self.finish_open(inum, 0)
    }

    fn rollback_created_inode(&self, inum: Inumber) {
        let guard = self.inodes.write(inum).unwrap_or_else(|| {
            log::error!("inum={inum} missing immediately after its own allocation");
            unreachable!("inum={inum} missing immediately after its own allocation");
        });
        self.inodes.delete(inum, &guard);
    }

    fn finish_open(&self, inum: Inumber, offset: usize) -> Result<Handle> {
        // A fresh CREAT whose open-file-table allocation then fails leaves
        // the file created: rolling it back here would need to distinguish
        // "just created" from "pre-existing", which the caller already
        // decided.
        self.open_files.add(inum, offset)
    }

    /// Closes `handle`.
    pub fn close(&self, handle: Handle) -> Result<()> {
        self.open_files.remove(handle)?;
        log::debug!("close(handle={handle})");
        Ok(())
    }

    /// Reads up to `buf.len()` bytes starting at the handle's current
    /// offset, advancing it by the number of bytes actually read.
    pub fn read(&self, handle: Handle, buf: &mut [u8]) -> Result<usize> {
        let inum = self.open_files.inumber_of(handle)?;
        let body = self.inodes.read(inum).ok_or(FsError::InodeGone)?;
        if !self.inodes.is_taken(inum) {
            return Err(FsError::InodeGone);
        }

        let size = body.size;
        let data_block = body.data_block;

        let (offset_snapshot, to_read) = self.open_files.with_offset(handle, |offset| {
            let to_read = size.saturating_sub(offset).min(buf.len());
            Ok((offset + to_read, (offset, to_read)))
        })?;

        if to_read > 0 {
            let block_no = data_block.unwrap_or_else(|| {
                log::error!("inum={inum} has nonzero size but no data block");
                unreachable!("inum={inum} has nonzero size but no data block");
            });
            self.blocks.with_block(block_no, |block| {
                buf[..to_read].copy_from_slice(&block[offset_snapshot..offset_snapshot + to_read]);
            });
        }

        log::debug!("read(handle={handle}, len={}) -> {to_read}", buf.len());
        Ok(to_read)
    }

    /// Writes `buf` starting at the handle's current offset, advancing it
    /// (and the file's size, if extended) by the number of bytes actually
    /// written. Writes never cross a block boundary — a single file
    /// occupies at most one block.
    pub fn write(&self, handle: Handle, buf: &[u8]) -> Result<usize> {
        let inum = self.open_files.inumber_of(handle)?;
        let mut body = self.inodes.write(inum).ok_or(FsError::InodeGone)?;
        if !self.inodes.is_taken(inum) {
            return Err(FsError::InodeGone);
        }

        let block_size = self.params.block_size();
        let blocks = &self.blocks;

        let to_write = self.open_files.with_offset(handle, |offset| {
            let cap = block_size.saturating_sub(offset);
            let to_write = cap.min(buf.len());
            if to_write == 0 {
                return Ok((offset, 0));
            }

            let block_no = match body.data_block {
                Some(b) => b,
                None => {
                    let b = blocks.alloc()?;
                    body.data_block = Some(b);
                    b
                }
            };

            blocks.with_block_mut(block_no, |block| {
                block[offset..offset + to_write].copy_from_slice(&buf[..to_write]);
            });

            let new_offset = offset + to_write;
            if new_offset > body.size {
                body.size = new_offset;
            }
            Ok((new_offset, to_write))
        })?;

        log::debug!("write(handle={handle}, len={}) -> {to_write}", buf.len());
        Ok(to_write)
    }

    /// Adds `link_name` as an additional directory entry for the existing
    /// file `target`, incrementing its hard-link count. Hard links to
    /// symbolic links are disallowed.
    pub fn link(&self, target: &str, link_name: &str) -> Result<()> {
        let target_name = path::validate(target)?;
        let link_name_seg = path::validate(link_name)?;

        let inum = self
            .find_in_root(target_name)
            .ok_or_else(|| FsError::NotFound(target.to_string()))?;

        let mut body = self.inodes.write(inum).ok_or(FsError::InodeGone)?;
        if !self.inodes.is_taken(inum) {
            return Err(FsError::InodeGone);
        }
        if body.kind == InodeKind::Symlink {
            return Err(FsError::IsSymlink);
        }

        body.hard_links += 1;
        if let Err(e) = self.add_to_root(link_name_seg, inum) {
            body.hard_links -= 1;
            return Err(e);
        }

        log::debug!("link({target:?}, {link_name:?}) -> inum={inum}");
        Ok(())
    }

    /// Creates a symbolic link `link_name` whose content is the path
    /// `target`. `target` must already resolve to an existing entry at the
    /// time of creation, but the link itself does not keep it alive — a
    /// symlink may later dangle.
    pub fn sym_link(&self, target: &str, link_name: &str) -> Result<()> {
        let target_name = path::validate(target)?;
        let link_name_seg = path::validate(link_name)?;

        self.find_in_root(target_name)
            .ok_or_else(|| FsError::NotFound(target.to_string()))?;

        let sym_inum = self.inodes.alloc(InodeKind::Symlink)?;

        let result = (|| {
            let block_no = self.blocks.alloc()?;
            self.blocks.with_block_mut(block_no, |buf| {
                buf[..target.len()].copy_from_slice(target.as_bytes());
            });

            {
                let mut body = self.inodes.write(sym_inum).unwrap_or_else(|| {
                    log::error!("inum={sym_inum} missing immediately after its own allocation");
                    unreachable!("inum={sym_inum} missing immediately after its own allocation");
                });
                body.data_block = Some(block_no);
                body.size = target.len();
            }

            if let Err(e) = self.add_to_root(link_name_seg, sym_inum) {
                self.blocks.free(block_no);
                return Err(e);
            }
            Ok(())
        })();

        if let Err(e) = result {
            self.rollback_created_inode(sym_inum);
            return Err(e);
        }

        log::debug!("sym_link({target:?}, {link_name:?}) -> inum={sym_inum}");
        Ok(())
    }

    /// Removes the directory entry `path`, decrementing the target's
    /// hard-link count and freeing it once that count reaches zero.
    /// Refuses to unlink a currently-open file.
    pub fn unlink(&self, path: &str) -> Result<()> {
        let name = path::validate(path)?;
        let inum = self
            .find_in_root(name)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;

        if self.open_files.is_file_open(inum) {
            return Err(FsError::FileOpen);
        }

        {
            let mut body = self.inodes.write(inum).ok_or(FsError::InodeGone)?;
            if !self.inodes.is_taken(inum) {
                return Err(FsError::InodeGone);
            }

            body.hard_links = body.hard_links.saturating_sub(1);
            if body.hard_links == 0 {
                if let Some(block_no) = body.data_block.take() {
                    self.blocks.free(block_no);
                }
                body.size = 0;
                self.inodes.delete(inum, &body);
            }
        }

        self.clear_from_root(name)?;
        log::debug!("unlink({path:?}) -> inum={inum}");
        Ok(())
    }
}
