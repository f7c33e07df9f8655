use std::mem;

use static_assertions::const_assert;
use zerocopy::{AsBytes, FromBytes};

use crate::block::BlockDevice;
use crate::error::FsError;
use crate::inode::Dinode;
use crate::param::BSIZE;

/// Must be the first word of block 0.
pub const FS_MAGIC: u32 = u32::from_le_bytes(*b"5600");

/// Inodes per inode-table block.
pub const IPB: usize = BSIZE / mem::size_of::<Dinode>();

/// Disk layout:
/// [ super block | free-block bitmap | inode blocks | data blocks ]
///
/// The formatter computes the super block and builds an initial file
/// system. The super block describes the disk layout:
#[repr(C)]
#[derive(Clone, Copy, Default, AsBytes, FromBytes)]
pub struct Superblock {
    /// Must be FS_MAGIC
    pub magic: u32,

    /// Size of file system image (blocks)
    pub nblocks: u32,

    /// Number of inodes
    pub ninodes: u32,

    /// I-number of the root directory
    pub root_ino: u32,
}

const_assert!(mem::size_of::<Superblock>() <= BSIZE);

/// LBA of the free-block bitmap.
pub const BITMAP_BLOCK: u32 = 1;

/// LBA of the first inode-table block.
pub const INODE_START: u32 = 2;

impl Superblock {
    /// Reads block 0 and verifies the magic number.
    pub fn read(dev: &mut BlockDevice) -> Result<Self, FsError> {
        let mut buf = [0u8; BSIZE];
        dev.read(0, &mut buf)?;
        let mut sb = Superblock::default();
        let n = mem::size_of::<Superblock>();
        sb.as_bytes_mut().copy_from_slice(&buf[..n]);
        if sb.magic != FS_MAGIC {
            return Err(FsError::InvalidArgument);
        }
        Ok(sb)
    }

    /// Number of blocks occupied by the inode table.
    pub fn inode_blocks(&self) -> u32 {
        ((self.ninodes as usize + IPB - 1) / IPB) as u32
    }

    /// LBA of the inode-table block containing inode `i`.
    pub fn iblock(&self, i: u32) -> u32 {
        INODE_START + i / IPB as u32
    }

    /// LBA of the first data block. Everything below it is metadata and
    /// stays marked in the bitmap forever.
    pub fn data_start(&self) -> u32 {
        INODE_START + self.inode_blocks()
    }
}
