//! `open` mode flags.

bitflags::bitflags! {
    /// Flags accepted by [`crate::TecnicoFs::open`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenMode: u32 {
        /// Create the file if it does not already exist.
        const CREAT = 0b001;
        /// Truncate an existing file to empty.
        const TRUNC = 0b010;
        /// Start the offset at the end of the file instead of at 0.
        const APPEND = 0b100;
    }
}
