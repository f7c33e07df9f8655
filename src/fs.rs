//! File system implementation. Five layers:
//!   + Blocks: allocator for raw disk blocks.
//!   + Files: inode allocator, reading, writing, metadata.
//!   + Directories: inode with special contents (list of other inodes!)
//!   + Names: paths like /dir3/subdir/file.4k- for convenient naming.
//!   + Operations: the externally visible calls the mount bridge makes.
//!
//! Every operation takes an absolute path, resolves it from the root,
//! and reads or rewrites the affected blocks in full before returning.
//! Execution is single-threaded; nothing carries over between calls
//! except the image contents.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::block::BlockDevice;
use crate::error::FsError;
use crate::inode::Dinode;
use crate::param::{BSIZE, DIRSIZ};
use crate::path::Path;
use crate::stat::{Stat, StatVfs};
use crate::superblock::Superblock;

/// Ambient identity stamped on new files, supplied by the mount bridge
/// from its fuse context.
#[derive(Clone, Copy, Default, Debug)]
pub struct Ident {
    pub uid: u16,
    pub gid: u16,
}

/// A mounted file system: the open image plus its cached superblock.
pub struct Fs5600 {
    pub(crate) dev: BlockDevice,
    pub(crate) sb: Superblock,
    pub ident: Ident,
}

pub(crate) fn timestamp() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

fn stat_of(ino: u32, ip: &Dinode) -> Stat {
    Stat {
        ino,
        mode: ip.mode.into(),
        nlink: 1,
        uid: ip.uid.into(),
        gid: ip.gid.into(),
        size: ip.size.into(),
        blocks: (u64::from(ip.size) + 511) / 512,
        atime: ip.mtime,
        mtime: ip.mtime,
        ctime: ip.mtime,
    }
}

impl Fs5600 {
    /// Reads and verifies the superblock, then hands back a ready file
    /// system. Called once per image; there is no separate close.
    pub fn mount(mut dev: BlockDevice) -> Result<Self, FsError> {
        let sb = Superblock::read(&mut dev)?;
        log::info!(
            "mounted image: {} blocks, {} inodes",
            sb.nblocks,
            sb.ninodes
        );
        Ok(Self {
            dev,
            sb,
            ident: Ident::default(),
        })
    }

    /// Attributes of the file or directory at `path`.
    pub fn getattr(&mut self, path: &str) -> Result<Stat, FsError> {
        let ino = self.namei(Path::new(path))?;
        let ip = self.inode_load(ino)?;
        Ok(stat_of(ino, &ip))
    }

    /// Invokes `f` on each entry name of the directory at `path`, in
    /// slot order. Iteration stops early when `f` returns false. `.`
    /// and `..` are never produced.
    pub fn readdir<F>(&mut self, path: &str, f: F) -> Result<(), FsError>
    where
        F: FnMut(&str) -> bool,
    {
        let ino = self.namei(Path::new(path))?;
        let dp = self.inode_load(ino)?;
        if !dp.is_dir() {
            return Err(FsError::NotADirectory);
        }
        self.dir_for_each(&dp, f)
    }

    /// Reads up to `buf.len()` bytes at byte offset `off`, returning
    /// the short count at end-of-file.
    pub fn read(&mut self, path: &str, buf: &mut [u8], off: u64) -> Result<usize, FsError> {
        let ino = self.namei(Path::new(path))?;
        let ip = self.inode_load(ino)?;
        if ip.is_dir() {
            return Err(FsError::IsADirectory);
        }
        if off >= u64::from(ip.size) {
            return Ok(0);
        }
        self.read_inode(&ip, buf, off as u32)
    }

    /// Writes `data` at byte offset `off`, which must not exceed the
    /// current size. Extends the file when the write runs past the end.
    pub fn write(&mut self, path: &str, data: &[u8], off: u64) -> Result<usize, FsError> {
        let ino = self.namei(Path::new(path))?;
        let mut ip = self.inode_load(ino)?;
        if ip.is_dir() {
            return Err(FsError::IsADirectory);
        }
        if off > u64::from(ip.size) {
            return Err(FsError::InvalidArgument);
        }
        let res = self.write_inode(&mut ip, data, off as u32);
        let now = timestamp();
        ip.mtime = now;
        ip.ctime = now;
        // Store even on failure: blocks installed before the bitmap ran
        // dry must stay reachable from the inode.
        self.inode_store(ino, &ip)?;
        res
    }

    /// Creates an empty regular file. The mode is stored as given.
    pub fn create(&mut self, path: &str, mode: u32) -> Result<(), FsError> {
        let (parent, name) = self.nameiparent(Path::new(path))?;
        let dp = self.inode_load(parent)?;
        if self.dirlookup(&dp, &name)?.is_some() {
            return Err(FsError::AlreadyExists);
        }
        let ino = self.inode_alloc(mode as u16)?;
        let now = timestamp();
        let mut ip = self.inode_load(ino)?;
        ip.uid = self.ident.uid;
        ip.gid = self.ident.gid;
        ip.ctime = now;
        ip.mtime = now;
        self.inode_store(ino, &ip)?;
        if let Err(e) = self.dirlink(&dp, &name, ino) {
            self.inode_free(ino)?;
            return Err(e);
        }
        Ok(())
    }

    /// Creates an empty directory: one zeroed data block, size 4096,
    /// mode OR'd with the directory type bit.
    pub fn mkdir(&mut self, path: &str, mode: u32) -> Result<(), FsError> {
        let (parent, name) = self.nameiparent(Path::new(path))?;
        let dp = self.inode_load(parent)?;
        if self.dirlookup(&dp, &name)?.is_some() {
            return Err(FsError::AlreadyExists);
        }
        let ino = self.inode_alloc(mode as u16 | libc::S_IFDIR as u16)?;
        let lba = match self.balloc() {
            Ok(lba) => lba,
            Err(e) => {
                self.inode_free(ino)?;
                return Err(e);
            }
        };
        // A new directory has no entries, not even "." or "..".
        self.dev.write(lba, &[0u8; BSIZE])?;
        let now = timestamp();
        let mut ip = self.inode_load(ino)?;
        ip.uid = self.ident.uid;
        ip.gid = self.ident.gid;
        ip.ctime = now;
        ip.mtime = now;
        ip.size = BSIZE as u32;
        ip.direct[0] = lba;
        self.inode_store(ino, &ip)?;
        if let Err(e) = self.dirlink(&dp, &name, ino) {
            self.bfree(lba)?;
            self.inode_free(ino)?;
            return Err(e);
        }
        Ok(())
    }

    /// Removes a regular file, releasing its data blocks, its indirect
    /// block, its inode, and the parent entry.
    pub fn unlink(&mut self, path: &str) -> Result<(), FsError> {
        let (parent, name) = self.nameiparent(Path::new(path))?;
        let dp = self.inode_load(parent)?;
        let (ino, slot) = self.dirlookup(&dp, &name)?.ok_or(FsError::NotFound)?;
        let mut ip = self.inode_load(ino)?;
        if ip.is_dir() {
            return Err(FsError::IsADirectory);
        }
        self.itrunc(&mut ip)?;
        self.inode_free(ino)?;
        self.dirremove(slot)
    }

    /// Removes an empty directory. The root has no parent entry and
    /// cannot be removed.
    pub fn rmdir(&mut self, path: &str) -> Result<(), FsError> {
        let (parent, name) = self.nameiparent(Path::new(path))?;
        let dp = self.inode_load(parent)?;
        let (ino, slot) = self.dirlookup(&dp, &name)?.ok_or(FsError::NotFound)?;
        let mut ip = self.inode_load(ino)?;
        if !ip.is_dir() {
            return Err(FsError::NotADirectory);
        }
        if !self.dir_is_empty(&ip)? {
            return Err(FsError::NotEmpty);
        }
        self.itrunc(&mut ip)?;
        self.inode_free(ino)?;
        self.dirremove(slot)
    }

    /// Renames within a single directory: the entry's name is rewritten
    /// in place. There is no atomic replacement and no cross-directory
    /// move.
    pub fn rename(&mut self, src: &str, dst: &str) -> Result<(), FsError> {
        let (src_parent, src_name) = self.nameiparent(Path::new(src))?;
        let sdp = self.inode_load(src_parent)?;
        let (_, slot) = self
            .dirlookup(&sdp, &src_name)?
            .ok_or(FsError::NotFound)?;
        let (dst_parent, dst_name) = self.nameiparent(Path::new(dst))?;
        let ddp = self.inode_load(dst_parent)?;
        if self.dirlookup(&ddp, &dst_name)?.is_some() {
            return Err(FsError::AlreadyExists);
        }
        if src_parent != dst_parent {
            return Err(FsError::InvalidArgument);
        }
        self.dir_set_name(slot, &dst_name)
    }

    /// Discards the file's contents. Only length 0 is accepted.
    pub fn truncate(&mut self, path: &str, length: u64) -> Result<(), FsError> {
        let ino = self.namei(Path::new(path))?;
        let mut ip = self.inode_load(ino)?;
        if ip.is_dir() {
            return Err(FsError::IsADirectory);
        }
        if length != 0 {
            return Err(FsError::InvalidArgument);
        }
        self.itrunc(&mut ip)?;
        let now = timestamp();
        ip.mtime = now;
        ip.ctime = now;
        self.inode_store(ino, &ip)
    }

    /// Replaces the low twelve mode bits, preserving the file type.
    pub fn chmod(&mut self, path: &str, mode: u32) -> Result<(), FsError> {
        let ino = self.namei(Path::new(path))?;
        let mut ip = self.inode_load(ino)?;
        ip.mode = (ip.mode & libc::S_IFMT as u16) | (mode as u16 & 0o7777);
        self.inode_store(ino, &ip)
    }

    /// Sets the modification time (and with it the change time; access
    /// times are not stored). Everything else is untouched.
    pub fn utime(&mut self, path: &str, modtime: u32) -> Result<(), FsError> {
        let ino = self.namei(Path::new(path))?;
        let mut ip = self.inode_load(ino)?;
        ip.mtime = modtime;
        ip.ctime = modtime;
        self.inode_store(ino, &ip)
    }

    /// File-system-wide figures: geometry and the live free count.
    pub fn statfs(&mut self) -> Result<StatVfs, FsError> {
        let free = self.count_free()?;
        Ok(StatVfs {
            bsize: BSIZE as u32,
            blocks: self.sb.nblocks,
            bfree: free,
            bavail: free,
            namemax: DIRSIZ as u32,
        })
    }
}
