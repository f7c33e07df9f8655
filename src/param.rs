/// Block size in bytes.
pub const BSIZE: usize = 4096;

/// Root i-number. Inode 0 is reserved and means "no inode".
pub const ROOTINO: u32 = 1;

/// Maximum length of a directory-entry name, in bytes. Longer leaf
/// names are silently truncated on lookup and insertion.
pub const DIRSIZ: usize = 27;
