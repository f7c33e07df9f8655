//! Free-block bitmap.
//!
//! Block 1 holds one bit per block, LSB-first within each byte: bit `i`
//! lives at byte `i / 8`, position `i % 8`, and is set iff block `i` is
//! in use. The bits covering the superblock, the bitmap itself, and the
//! inode table are set at format time and never cleared.
//!
//! Allocation is strictly first-fit by ascending block number. That
//! ordering is observable through `statfs` accounting, so it must not
//! be replaced by a next-fit or random-fit policy.

use crate::error::FsError;
use crate::fs::Fs5600;
use crate::param::BSIZE;
use crate::superblock::BITMAP_BLOCK;

impl Fs5600 {
    /// Allocates the first free data block. The contents of the
    /// returned block are undefined; callers that expose it must zero
    /// it first.
    pub(crate) fn balloc(&mut self) -> Result<u32, FsError> {
        let mut buf = [0u8; BSIZE];
        self.dev.read(BITMAP_BLOCK, &mut buf)?;
        for b in self.sb.data_start()..self.sb.nblocks {
            let m = 1u8 << (b % 8);
            if buf[b as usize / 8] & m == 0 {
                buf[b as usize / 8] |= m;
                self.dev.write(BITMAP_BLOCK, &buf)?;
                return Ok(b);
            }
        }
        log::debug!("out of data blocks ({} total)", self.sb.nblocks);
        Err(FsError::NoSpace)
    }

    /// Returns block `b` to the free pool.
    pub(crate) fn bfree(&mut self, b: u32) -> Result<(), FsError> {
        let mut buf = [0u8; BSIZE];
        self.dev.read(BITMAP_BLOCK, &mut buf)?;
        let m = 1u8 << (b % 8);
        debug_assert_ne!(buf[b as usize / 8] & m, 0, "freeing free block");
        buf[b as usize / 8] &= !m;
        self.dev.write(BITMAP_BLOCK, &buf)?;
        Ok(())
    }

    /// Number of blocks not marked in use.
    pub(crate) fn count_free(&mut self) -> Result<u32, FsError> {
        let mut buf = [0u8; BSIZE];
        self.dev.read(BITMAP_BLOCK, &mut buf)?;
        let mut free = 0;
        for b in 0..self.sb.nblocks {
            if buf[b as usize / 8] & (1 << (b % 8)) == 0 {
                free += 1;
            }
        }
        Ok(free)
    }
}
