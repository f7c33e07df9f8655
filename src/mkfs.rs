//! Image formatter.
//!
//! Lays down a fresh, empty file system on a block device: superblock,
//! free-block bitmap with the metadata bits pre-set, a zeroed inode
//! table, and a root directory occupying one data block.

use zerocopy::AsBytes;

use crate::block::BlockDevice;
use crate::error::FsError;
use crate::fs::timestamp;
use crate::inode::{Dinode, DINODE_SIZE, NDIRECT};
use crate::param::{BSIZE, ROOTINO};
use crate::superblock::{Superblock, BITMAP_BLOCK, FS_MAGIC, IPB};

/// Marks blocks `0..end` in use.
fn fill_bitmap(buf: &mut [u8], end: u32) {
    for b in 0..end {
        buf[b as usize / 8] |= 1 << (b % 8);
    }
}

/// Formats `dev` with `nblocks` total blocks and an inode table of
/// `ninodes` entries (rounded up to whole blocks). Everything on the
/// device is considered garbage and overwritten or orphaned.
pub fn mkfs(dev: &mut BlockDevice, nblocks: u32, ninodes: u32) -> Result<(), FsError> {
    let sb = Superblock {
        magic: FS_MAGIC,
        nblocks,
        ninodes,
        root_ino: ROOTINO,
    };

    // A single bitmap block bounds the geometry, and there must be room
    // for the metadata plus the root directory's data block.
    let root_lba = sb.data_start();
    if nblocks as usize > BSIZE * 8 || nblocks <= root_lba || ninodes < 2 {
        return Err(FsError::InvalidArgument);
    }

    let mut buf = [0u8; BSIZE];
    buf[..sb.as_bytes().len()].copy_from_slice(sb.as_bytes());
    dev.write(0, &buf)?;

    let mut buf = [0u8; BSIZE];
    fill_bitmap(&mut buf, root_lba + 1);
    dev.write(BITMAP_BLOCK, &buf)?;

    // Zero the table, then plant the root directory at inode 1.
    let now = timestamp();
    let root = Dinode {
        mode: libc::S_IFDIR as u16 | 0o777,
        ctime: now,
        mtime: now,
        size: BSIZE as u32,
        direct: {
            let mut d = [0; NDIRECT];
            d[0] = root_lba;
            d
        },
        ..Dinode::default()
    };
    for blk in 0..sb.inode_blocks() {
        let mut buf = [0u8; BSIZE];
        if blk == 0 {
            let off = ROOTINO as usize % IPB * DINODE_SIZE;
            buf[off..off + DINODE_SIZE].copy_from_slice(root.as_bytes());
        }
        dev.write(sb.iblock(blk * IPB as u32), &buf)?;
    }

    // The root starts with no entries at all.
    let buf = [0u8; BSIZE];
    dev.write(root_lba, &buf)?;

    // Push the image file out to its full size so later block reads
    // never run past end-of-file.
    if nblocks - 1 > root_lba {
        dev.write(nblocks - 1, &buf)?;
    }

    log::info!("formatted image: {} blocks, {} inodes", nblocks, ninodes);
    Ok(())
}
