//! Directories.
//!
//! A directory is a file whose content is a fixed-width table of
//! `Dirent` records. An entry is live iff its `valid` byte is set;
//! removal only clears that byte, and insertion reuses the first dead
//! slot, so entries are never compacted. There are no `.` or `..`
//! entries on disk.
//!
//! `mkdir` only ever allocates a single block, but every scan below
//! walks the whole block map of the directory, so images formatted
//! with multi-block directories list correctly.

use std::mem;

use static_assertions::const_assert;
use zerocopy::{AsBytes, FromBytes};

use crate::error::FsError;
use crate::fs::Fs5600;
use crate::inode::Dinode;
use crate::param::{BSIZE, DIRSIZ};
use crate::path::FileName;

/// On-disk directory entry. The name is NUL-terminated with room for
/// `DIRSIZ` bytes plus the terminator.
#[repr(C)]
#[derive(Clone, Copy, Default, AsBytes, FromBytes)]
pub struct Dirent {
    pub ino: u32,
    pub valid: u8,
    name: [u8; DIRSIZ + 1],
    _pad: [u8; 31],
}

pub const DIRENT_SIZE: usize = mem::size_of::<Dirent>();

/// Entries per directory block.
pub const DPB: usize = BSIZE / DIRENT_SIZE;

const_assert!(DIRENT_SIZE == 64);
const_assert!(BSIZE % DIRENT_SIZE == 0);

impl Dirent {
    fn new(ino: u32, name: &FileName<'_>) -> Self {
        let mut de = Dirent {
            ino,
            valid: 1,
            ..Dirent::default()
        };
        de.set_name(name);
        de
    }

    /// Fill in name. Shorter names keep their NUL terminator from the
    /// zeroed array.
    fn set_name(&mut self, name: &FileName<'_>) {
        let name = name.as_bytes();
        self.name = [0; DIRSIZ + 1];
        self.name[..name.len()].copy_from_slice(name);
    }

    /// The stored name, without terminator or padding.
    pub fn name_bytes(&self) -> &[u8] {
        let len = self.name.iter().position(|ch| *ch == 0).unwrap_or(DIRSIZ);
        &self.name[..len]
    }
}

/// Where a live entry sits: which block, which slot.
#[derive(Clone, Copy)]
pub(crate) struct DirSlot {
    lba: u32,
    idx: usize,
}

fn dirent_at(buf: &[u8], i: usize) -> Dirent {
    let mut de = Dirent::default();
    de.as_bytes_mut()
        .copy_from_slice(&buf[i * DIRENT_SIZE..(i + 1) * DIRENT_SIZE]);
    de
}

fn put_dirent(buf: &mut [u8], i: usize, de: &Dirent) {
    buf[i * DIRENT_SIZE..(i + 1) * DIRENT_SIZE].copy_from_slice(de.as_bytes());
}

impl Fs5600 {
    fn dir_blocks(dp: &Dinode) -> usize {
        (dp.size as usize + BSIZE - 1) / BSIZE
    }

    /// Look for a directory entry by name. If found, returns the child
    /// i-number and the entry's location.
    pub(crate) fn dirlookup(
        &mut self,
        dp: &Dinode,
        name: &FileName<'_>,
    ) -> Result<Option<(u32, DirSlot)>, FsError> {
        for bn in 0..Self::dir_blocks(dp) {
            let lba = self.bmap(dp, bn)?;
            if lba == 0 {
                continue;
            }
            let mut buf = [0u8; BSIZE];
            self.dev.read(lba, &mut buf)?;
            for i in 0..DPB {
                let de = dirent_at(&buf, i);
                if de.valid != 0 && de.name_bytes() == name.as_bytes() {
                    return Ok(Some((de.ino, DirSlot { lba, idx: i })));
                }
            }
        }
        Ok(None)
    }

    /// Write a new directory entry (name, ino) into the directory dp,
    /// reusing the first dead slot. The directory is not grown.
    pub(crate) fn dirlink(
        &mut self,
        dp: &Dinode,
        name: &FileName<'_>,
        ino: u32,
    ) -> Result<(), FsError> {
        for bn in 0..Self::dir_blocks(dp) {
            let lba = self.bmap(dp, bn)?;
            if lba == 0 {
                continue;
            }
            let mut buf = [0u8; BSIZE];
            self.dev.read(lba, &mut buf)?;
            for i in 0..DPB {
                if dirent_at(&buf, i).valid == 0 {
                    put_dirent(&mut buf, i, &Dirent::new(ino, name));
                    self.dev.write(lba, &buf)?;
                    return Ok(());
                }
            }
        }
        Err(FsError::NoSpace)
    }

    /// Clears the valid byte of the entry at `slot`. The rest of the
    /// record is left behind; only listing must not observe it.
    pub(crate) fn dirremove(&mut self, slot: DirSlot) -> Result<(), FsError> {
        let mut buf = [0u8; BSIZE];
        self.dev.read(slot.lba, &mut buf)?;
        let mut de = dirent_at(&buf, slot.idx);
        de.valid = 0;
        put_dirent(&mut buf, slot.idx, &de);
        self.dev.write(slot.lba, &buf)?;
        Ok(())
    }

    /// Rewrites the name of the entry at `slot` in place.
    pub(crate) fn dir_set_name(
        &mut self,
        slot: DirSlot,
        name: &FileName<'_>,
    ) -> Result<(), FsError> {
        let mut buf = [0u8; BSIZE];
        self.dev.read(slot.lba, &mut buf)?;
        let mut de = dirent_at(&buf, slot.idx);
        de.set_name(name);
        put_dirent(&mut buf, slot.idx, &de);
        self.dev.write(slot.lba, &buf)?;
        Ok(())
    }

    /// Is every slot of the directory dead?
    pub(crate) fn dir_is_empty(&mut self, dp: &Dinode) -> Result<bool, FsError> {
        let mut empty = true;
        self.dir_for_each(dp, |_| {
            empty = false;
            false
        })?;
        Ok(empty)
    }

    /// Invokes `f` on the name of each live entry. Iteration stops
    /// early when `f` returns false.
    pub(crate) fn dir_for_each<F>(&mut self, dp: &Dinode, mut f: F) -> Result<(), FsError>
    where
        F: FnMut(&str) -> bool,
    {
        for bn in 0..Self::dir_blocks(dp) {
            let lba = self.bmap(dp, bn)?;
            if lba == 0 {
                continue;
            }
            let mut buf = [0u8; BSIZE];
            self.dev.read(lba, &mut buf)?;
            for i in 0..DPB {
                let de = dirent_at(&buf, i);
                if de.valid != 0 && !f(&String::from_utf8_lossy(de.name_bytes())) {
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}
