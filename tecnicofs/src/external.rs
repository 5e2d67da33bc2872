//! `copy_from_external_fs`: the one boundary that touches the host file
//! system. Reads a host file fully into memory, then drives it into
//! TecnicoFS purely through the public `open`/`write`/`close` API.

use std::fs::File;
use std::io::Read;

use crate::error::{FsError, Result};
use crate::mode::OpenMode;
use crate::TecnicoFs;

impl TecnicoFs {
    /// Streams the contents of `src` (a host file system path) into `dst`
    /// (a TecnicoFS path), creating `dst` if absent and truncating it if
    /// present.
    ///
    /// `src` must fit in a single data block: TecnicoFS has no concept of
    /// a file spanning more than one block.
    pub fn copy_from_external_fs(&self, src: &std::path::Path, dst: &str) -> Result<()> {
        let mut file = File::open(src).map_err(|source| FsError::HostIo {
            path: src.to_path_buf(),
            source,
        })?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf).map_err(|source| FsError::HostIo {
            path: src.to_path_buf(),
            source,
        })?;

        if buf.len() > self.params.block_size() {
            return Err(FsError::HostFileTooLarge {
                path: src.to_path_buf(),
                size: buf.len() as u64,
            });
        }

        let handle = self.open(dst, OpenMode::CREAT | OpenMode::TRUNC)?;
        let result = (|| {
            let mut written = 0;
            while written < buf.len() {
                let n = self.write(handle, &buf[written..])?;
                if n == 0 {
                    break;
                }
                written += n;
            }
            Ok(())
        })();
        self.close(handle)?;

        log::debug!(
            "copy_from_external_fs({src:?}, {dst:?}) -> {} bytes",
            buf.len()
        );
        result
    }
}
