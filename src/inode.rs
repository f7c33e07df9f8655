//! Inodes.
//!
//! An inode describes a single unnamed file. The on-disk structure
//! holds the metadata: mode (with the file-type bits), ownership,
//! times, size, and the list of blocks holding the file's content.
//!
//! Inodes are laid out sequentially on disk starting at `INODE_START`.
//! Each inode has a number indicating its position in the table; an
//! inode whose `mode` is zero is free. There is no in-memory inode
//! table: operations load the record, work on the copy, and store it
//! back before returning.
//!
//! The content of each inode is addressed through two levels: the
//! first `NDIRECT` block numbers live in `direct`, the next `NINDIRECT`
//! in the block named by `indirect`. The indirect block exists only
//! while some over-direct offset is populated.

use std::cmp;
use std::mem;

use static_assertions::const_assert;
use zerocopy::{AsBytes, FromBytes};

use crate::error::FsError;
use crate::fs::Fs5600;
use crate::param::BSIZE;
use crate::superblock::IPB;

/// Direct slots per inode.
pub const NDIRECT: usize = 2;

/// Block addresses held by the indirect block.
pub const NINDIRECT: usize = BSIZE / mem::size_of::<u32>();

/// Largest file, in blocks.
pub const MAXFILE: usize = NDIRECT + NINDIRECT;

/// On-disk inode structure, little-endian and packed.
#[repr(C)]
#[derive(Clone, Copy, Default, AsBytes, FromBytes)]
pub struct Dinode {
    /// Mode, including the `S_IFDIR`/`S_IFREG` type bits. Zero marks a
    /// free table slot.
    pub mode: u16,

    pub uid: u16,
    pub gid: u16,

    pub _pad: u16,

    /// Metadata change time, seconds since the epoch
    pub ctime: u32,

    /// Content modification time, seconds since the epoch
    pub mtime: u32,

    /// Size of file (bytes)
    pub size: u32,

    /// Direct data block addresses; unused slots are 0
    pub direct: [u32; NDIRECT],

    /// Indirect data block address, or 0
    pub indirect: u32,
}

pub const DINODE_SIZE: usize = mem::size_of::<Dinode>();

const_assert!(DINODE_SIZE == 32);
const_assert!(BSIZE % DINODE_SIZE == 0);

impl Dinode {
    pub fn is_dir(&self) -> bool {
        u32::from(self.mode) & libc::S_IFMT as u32 == libc::S_IFDIR as u32
    }

    pub fn is_file(&self) -> bool {
        u32::from(self.mode) & libc::S_IFMT as u32 == libc::S_IFREG as u32
    }
}

/// Reads slot `i` of an indirect block.
fn slot(buf: &[u8], i: usize) -> u32 {
    let off = i * 4;
    u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

/// Writes slot `i` of an indirect block.
fn set_slot(buf: &mut [u8], i: usize, lba: u32) {
    buf[i * 4..i * 4 + 4].copy_from_slice(&lba.to_le_bytes());
}

impl Fs5600 {
    /// Reads inode `ino` from its table block.
    pub(crate) fn inode_load(&mut self, ino: u32) -> Result<Dinode, FsError> {
        let mut buf = [0u8; BSIZE];
        self.dev.read(self.sb.iblock(ino), &mut buf)?;
        let mut dip = Dinode::default();
        let off = ino as usize % IPB * DINODE_SIZE;
        dip.as_bytes_mut().copy_from_slice(&buf[off..off + DINODE_SIZE]);
        Ok(dip)
    }

    /// Read-modify-writes the table block holding inode `ino`.
    pub(crate) fn inode_store(&mut self, ino: u32, dip: &Dinode) -> Result<(), FsError> {
        let lba = self.sb.iblock(ino);
        let mut buf = [0u8; BSIZE];
        self.dev.read(lba, &mut buf)?;
        let off = ino as usize % IPB * DINODE_SIZE;
        buf[off..off + DINODE_SIZE].copy_from_slice(dip.as_bytes());
        self.dev.write(lba, &buf)?;
        Ok(())
    }

    /// Claims the lowest free inode, initializing its mode and zeroing
    /// everything else.
    pub(crate) fn inode_alloc(&mut self, mode: u16) -> Result<u32, FsError> {
        for ino in 1..self.sb.ninodes {
            let dip = self.inode_load(ino)?;
            if dip.mode == 0 {
                let dip = Dinode {
                    mode,
                    ..Dinode::default()
                };
                self.inode_store(ino, &dip)?;
                return Ok(ino);
            }
        }
        log::debug!("inode table full ({} inodes)", self.sb.ninodes);
        Err(FsError::NoSpace)
    }

    /// Releases inode `ino`. All of its data blocks must already have
    /// been returned to the bitmap.
    pub(crate) fn inode_free(&mut self, ino: u32) -> Result<(), FsError> {
        self.inode_store(ino, &Dinode::default())
    }

    /// Disk block address of the `bn`th content block, or 0 if there is
    /// no backing block.
    pub(crate) fn bmap(&mut self, ip: &Dinode, bn: usize) -> Result<u32, FsError> {
        if bn < NDIRECT {
            return Ok(ip.direct[bn]);
        }
        let bn = bn - NDIRECT;
        if bn >= NINDIRECT {
            return Err(FsError::InvalidArgument);
        }
        if ip.indirect == 0 {
            return Ok(0);
        }
        let mut buf = [0u8; BSIZE];
        self.dev.read(ip.indirect, &mut buf)?;
        Ok(slot(&buf, bn))
    }

    /// Like `bmap`, but allocates the content block (and, on demand, a
    /// zeroed indirect block) when it is missing. Returns the address
    /// plus whether it was freshly allocated, so the caller knows the
    /// block's contents are garbage.
    pub(crate) fn bmap_or_alloc(
        &mut self,
        ip: &mut Dinode,
        bn: usize,
    ) -> Result<(u32, bool), FsError> {
        if bn < NDIRECT {
            if ip.direct[bn] != 0 {
                return Ok((ip.direct[bn], false));
            }
            let lba = self.balloc()?;
            ip.direct[bn] = lba;
            return Ok((lba, true));
        }
        let bn = bn - NDIRECT;
        if bn >= NINDIRECT {
            return Err(FsError::InvalidArgument);
        }

        let mut buf = [0u8; BSIZE];
        if ip.indirect == 0 {
            // The indirect block must hit the disk zeroed before any
            // slot in it can be trusted.
            ip.indirect = self.balloc()?;
            self.dev.write(ip.indirect, &buf)?;
        } else {
            self.dev.read(ip.indirect, &mut buf)?;
        }

        let mut lba = slot(&buf, bn);
        if lba == 0 {
            lba = self.balloc()?;
            set_slot(&mut buf, bn, lba);
            self.dev.write(ip.indirect, &buf)?;
            return Ok((lba, true));
        }
        Ok((lba, false))
    }

    /// Truncate inode (discard contents). The caller is responsible for
    /// storing the updated record.
    pub(crate) fn itrunc(&mut self, ip: &mut Dinode) -> Result<(), FsError> {
        for addr in ip.direct.iter_mut() {
            if *addr != 0 {
                self.bfree(*addr)?;
                *addr = 0;
            }
        }

        if ip.indirect != 0 {
            let mut buf = [0u8; BSIZE];
            self.dev.read(ip.indirect, &mut buf)?;
            for bn in 0..NINDIRECT {
                let a = slot(&buf, bn);
                if a != 0 {
                    self.bfree(a)?;
                }
            }
            self.bfree(ip.indirect)?;
            ip.indirect = 0;
        }

        ip.size = 0;
        Ok(())
    }

    /// Copies file content into `dst` starting at byte `off`. Reads
    /// past the end of the file return the short count; holes read as
    /// zeros.
    pub(crate) fn read_inode(
        &mut self,
        ip: &Dinode,
        dst: &mut [u8],
        off: u32,
    ) -> Result<usize, FsError> {
        if off >= ip.size {
            return Ok(0);
        }
        let n = cmp::min(dst.len(), (ip.size - off) as usize);
        let mut tot = 0;
        while tot < n {
            let pos = off as usize + tot;
            let begin = pos % BSIZE;
            let m = cmp::min(n - tot, BSIZE - begin);
            let lba = self.bmap(ip, pos / BSIZE)?;
            if lba == 0 {
                for b in dst[tot..tot + m].iter_mut() {
                    *b = 0;
                }
            } else {
                let mut buf = [0u8; BSIZE];
                self.dev.read(lba, &mut buf)?;
                dst[tot..tot + m].copy_from_slice(&buf[begin..begin + m]);
            }
            tot += m;
        }
        Ok(tot)
    }

    /// Copies `src` into the file content at byte `off`, allocating
    /// (zero-filled) blocks for every index that has none, and growing
    /// `ip.size` past the last byte written. The caller stores the
    /// record afterwards, so blocks installed before a failure are not
    /// leaked.
    pub(crate) fn write_inode(
        &mut self,
        ip: &mut Dinode,
        src: &[u8],
        off: u32,
    ) -> Result<usize, FsError> {
        let end = off as usize + src.len();
        if end > MAXFILE * BSIZE {
            return Err(FsError::InvalidArgument);
        }
        let mut tot = 0;
        while tot < src.len() {
            let pos = off as usize + tot;
            let begin = pos % BSIZE;
            let m = cmp::min(src.len() - tot, BSIZE - begin);
            let (lba, fresh) = self.bmap_or_alloc(ip, pos / BSIZE)?;
            let mut buf = [0u8; BSIZE];
            if !fresh {
                self.dev.read(lba, &mut buf)?;
            }
            buf[begin..begin + m].copy_from_slice(&src[tot..tot + m]);
            self.dev.write(lba, &buf)?;
            tot += m;
            if pos + m > ip.size as usize {
                ip.size = (pos + m) as u32;
            }
        }
        Ok(tot)
    }
}
