/// Attributes reported by `getattr`.
///
/// `atime` is not stored on disk; it is reported as the modification
/// time, and `ctime` likewise tracks `mtime`.
#[derive(Clone, Copy, Debug)]
pub struct Stat {
    /// Inode number
    pub ino: u32,

    /// Mode, including the file-type bits
    pub mode: u32,

    /// Number of links to file (always 1; hard links are unsupported)
    pub nlink: u32,

    pub uid: u32,
    pub gid: u32,

    /// Size of file in bytes
    pub size: u64,

    /// Number of 512-byte units spanned by the file
    pub blocks: u64,

    pub atime: u32,
    pub mtime: u32,
    pub ctime: u32,
}

impl Stat {
    pub fn is_dir(&self) -> bool {
        self.mode & libc::S_IFMT as u32 == libc::S_IFDIR as u32
    }

    pub fn is_file(&self) -> bool {
        self.mode & libc::S_IFMT as u32 == libc::S_IFREG as u32
    }
}

/// File-system-wide figures reported by `statfs`.
#[derive(Clone, Copy, Debug)]
pub struct StatVfs {
    pub bsize: u32,
    pub blocks: u32,
    pub bfree: u32,
    pub bavail: u32,
    pub namemax: u32,
}
