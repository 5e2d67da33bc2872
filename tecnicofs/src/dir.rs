//! Directory entries.
//!
//! The root inode's data block is reinterpreted as an array of fixed-size
//! `(name, inumber)` slots: each slot is `MAX_FILE_NAME` bytes of name
//! followed by a `u32` inumber-or-free marker.

use crate::block::BlockPool;
use crate::error::{FsError, Result};
use crate::inode::Inumber;

/// Maximum length of a single path segment, including the implicit
/// NUL terminator.
pub const MAX_FILE_NAME: usize = 40;

const INUM_FIELD_SIZE: usize = 4;
/// Size in bytes of one directory entry slot.
pub const DIR_ENTRY_SIZE: usize = MAX_FILE_NAME + INUM_FIELD_SIZE;

const FREE_MARKER: u32 = u32::MAX;

fn slot_range(slot: usize) -> std::ops::Range<usize> {
    let start = slot * DIR_ENTRY_SIZE;
    start..start + DIR_ENTRY_SIZE
}

fn decode_slot(raw: &[u8]) -> (&[u8], Option<Inumber>) {
    let (name_bytes, inum_bytes) = raw.split_at(MAX_FILE_NAME);
    let name_len = name_bytes.iter().position(|&b| b == 0).unwrap_or(MAX_FILE_NAME);
    let inum_raw = u32::from_le_bytes(inum_bytes.try_into().unwrap());
    let inum = if inum_raw == FREE_MARKER {
        None
    } else {
        Some(inum_raw as Inumber)
    };
    (&name_bytes[..name_len], inum)
}

fn encode_slot(buf: &mut [u8], name: &[u8], inum: Option<Inumber>) {
    let (name_field, inum_field) = buf.split_at_mut(MAX_FILE_NAME);
    name_field.fill(0);
    name_field[..name.len()].copy_from_slice(name);
    let raw = match inum {
        Some(i) => u32::try_from(i).expect("inumber fits in u32"),
        None => FREE_MARKER,
    };
    inum_field.copy_from_slice(&raw.to_le_bytes());
}

/// Zero-fills a freshly allocated directory block: every slot starts free.
pub fn init_dir_block(blocks: &BlockPool, block_no: crate::block::BlockNo, entry_count: usize) {
    blocks.with_block_mut(block_no, |buf| {
        for slot in 0..entry_count {
            encode_slot(&mut buf[slot_range(slot)], b"", None);
        }
    });
}

/// Finds the inumber for `name`, or `None` if absent.
pub fn find_in_dir(
    blocks: &BlockPool,
    block_no: crate::block::BlockNo,
    entry_count: usize,
    name: &str,
) -> Option<Inumber> {
    blocks.with_block(block_no, |buf| {
        for slot in 0..entry_count {
            let (slot_name, inum) = decode_slot(&buf[slot_range(slot)]);
            if inum.is_some() && slot_name == name.as_bytes() {
                return inum;
            }
        }
        None
    })
}

/// Writes a new `(name, inumber)` pair into the first free slot.
///
/// Rejects `name` containing `/`, exceeding `MAX_FILE_NAME - 1` bytes, a
/// duplicate of an existing entry, or a full directory block.
pub fn add_dir_entry(
    blocks: &BlockPool,
    block_no: crate::block::BlockNo,
    entry_count: usize,
    name: &str,
    inum: Inumber,
) -> Result<()> {
    if name.as_bytes().contains(&b'/') || name.len() >= MAX_FILE_NAME {
        return Err(FsError::InvalidPath(name.to_string()));
    }

    blocks.with_block_mut(block_no, |buf| {
        let mut free_slot = None;
        for slot in 0..entry_count {
            let (slot_name, slot_inum) = decode_slot(&buf[slot_range(slot)]);
            if slot_inum.is_some() {
                if slot_name == name.as_bytes() {
                    return Err(FsError::AlreadyExists(name.to_string()));
                }
                continue;
            }
            if free_slot.is_none() {
                free_slot = Some(slot);
            }
        }
        let slot = free_slot.ok_or_else(|| {
            FsError::TableFull(crate::error::TableKind::DataBlock)
        })?;
        encode_slot(&mut buf[slot_range(slot)], name.as_bytes(), Some(inum));
        Ok(())
    })
}

/// Clears the entry matching `name`, if any.
pub fn clear_dir_entry(
    blocks: &BlockPool,
    block_no: crate::block::BlockNo,
    entry_count: usize,
    name: &str,
) -> Result<()> {
    blocks.with_block_mut(block_no, |buf| {
        for slot in 0..entry_count {
            let (slot_name, slot_inum) = decode_slot(&buf[slot_range(slot)]);
            if slot_inum.is_some() && slot_name == name.as_bytes() {
                encode_slot(&mut buf[slot_range(slot)], b"", None);
                return Ok(());
            }
        }
        Err(FsError::NotFound(name.to_string()))
    })
}
