//! TecnicoFS: a concurrent, in-memory, single-level file system exposing a
//! POSIX-flavored open/read/write/close surface with hard links, symbolic
//! links, and unlink.
//!
//! State lives only in process memory — there is no on-disk format and no
//! persistence across process restarts. The crate's core is the
//! concurrent state layer (fixed-capacity inode table, data-block pool,
//! root-directory entries, open-file table) plus the operation layer built
//! atop it; see `DESIGN.md` for the grounding of each module.
//!
//! ```
//! use tecnicofs::{TecnicoFs, OpenMode};
//!
//! let fs = TecnicoFs::new(None).unwrap();
//! let f = fs.open("/greeting", OpenMode::CREAT).unwrap();
//! fs.write(f, b"hello").unwrap();
//! fs.close(f).unwrap();
//!
//! let f = fs.open("/greeting", OpenMode::empty()).unwrap();
//! let mut buf = [0u8; 5];
//! assert_eq!(fs.read(f, &mut buf).unwrap(), 5);
//! assert_eq!(&buf, b"hello");
//! ```

mod block;
mod dir;
mod error;
mod external;
mod inode;
mod mode;
mod open_file;
mod ops;
mod params;

pub use error::{AsRaw, FsError, Result, TableKind};
pub use inode::Inumber;
pub use mode::OpenMode;
pub use open_file::Handle;
pub use params::Params;

use block::BlockPool;
use inode::{InodeTable, ROOT_INUM};
use open_file::OpenFileTable;

/// A single TecnicoFS instance.
///
/// This is a plain value rather than a process-global singleton, so
/// multiple independent instances can coexist in one process — handy for
/// running tests in parallel without sharing state.
pub struct TecnicoFs {
    pub(crate) params: Params,
    pub(crate) inodes: InodeTable,
    pub(crate) blocks: BlockPool,
    pub(crate) open_files: OpenFileTable,
    /// The root directory's data block. Allocated once at construction and
    /// never reallocated, so reading it needs no lock of its own — only
    /// the bytes inside it are protected (by the block's own mutex inside
    /// [`BlockPool`]).
    pub(crate) root_block: block::BlockNo,
    pub(crate) dir_entry_count: usize,
}

impl TecnicoFs {
    /// Creates a new, empty filesystem with the given parameters (or
    /// [`Params::default`] if `None`).
    pub fn new(params: Option<Params>) -> Result<Self> {
        let params = params.unwrap_or_default();
        let inodes = InodeTable::new(params.max_inode_count());
        let blocks = BlockPool::new(params.max_block_count(), params.block_size());
        let open_files = OpenFileTable::new(params.max_open_files_count());

        let root_inum = inodes.alloc(inode::InodeKind::Directory)?;
        debug_assert_eq!(root_inum, ROOT_INUM, "root must be the first inode allocated");

        let root_block = match blocks.alloc() {
            Ok(b) => b,
            Err(e) => {
                inodes.rollback_alloc(root_inum);
                return Err(e);
            }
        };

        let dir_entry_count = params.dir_entries_per_block();
        dir::init_dir_block(&blocks, root_block, dir_entry_count);

        {
            let mut root = inodes.write(root_inum).unwrap_or_else(|| {
                log::error!("root inode slot missing immediately after its own allocation");
                unreachable!("root inode slot missing immediately after its own allocation");
            });
            root.data_block = Some(root_block);
            root.size = dir_entry_count * dir::DIR_ENTRY_SIZE;
        }

        log::debug!(
            "filesystem initialized: inodes={} blocks={} open_files={} block_size={}",
            params.max_inode_count(),
            params.max_block_count(),
            params.max_open_files_count(),
            params.block_size()
        );

        Ok(Self {
            params,
            inodes,
            blocks,
            open_files,
            root_block,
            dir_entry_count,
        })
    }

    /// The parameters this instance was constructed with.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Tears down this filesystem instance.
    ///
    /// Consumes `self`, so all of its tables, locks, and data blocks are
    /// dropped and their memory reclaimed. Exposed as an explicit, fallible
    /// verb (mirroring `init`) for callers that want a deliberate shutdown
    /// point rather than relying on scope exit.
    pub fn destroy(self) -> Result<()> {
        log::debug!("filesystem destroyed");
        Ok(())
    }
}
