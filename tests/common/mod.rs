//! Shared helpers for the operation-level tests: a freshly formatted
//! image in a temporary file, and the deterministic data pattern the
//! round-trip tests write and read back.
#![allow(dead_code)]

use fs5600::{mkfs, BlockDevice, Fs5600, Ident, BSIZE};

pub const NBLOCKS: u32 = 400;
pub const NINODES: u32 = 128;

/// Blocks consumed by the formatter itself: superblock, bitmap, one
/// inode-table block, and the root directory's data block.
pub const META_BLOCKS: u32 = 4;

pub fn fresh_fs() -> Fs5600 {
    let file = tempfile::tempfile().expect("tempfile");
    file.set_len(NBLOCKS as u64 * BSIZE as u64).expect("set_len");
    let mut dev = BlockDevice::new(file);
    mkfs(&mut dev, NBLOCKS, NINODES).expect("mkfs");
    let mut fs = Fs5600::mount(dev).expect("mount");
    fs.ident = Ident { uid: 500, gid: 500 };
    fs
}

/// Decimal-counter fill ("0 1 2 3 ..."), leaving the unpatterned tail
/// zeroed, the same shape the original harness generated.
pub fn pattern(len: usize, start: i32) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    let mut pos = 0;
    let mut i = start;
    while pos + 10 < len {
        let s = format!("{} ", i);
        let end = (pos + s.len()).min(len);
        buf[pos..end].copy_from_slice(&s.as_bytes()[..end - pos]);
        pos += s.len();
        i += 1;
    }
    buf
}

/// All entry names of a directory, sorted.
pub fn list(fs: &mut Fs5600, path: &str) -> Vec<String> {
    let mut names = Vec::new();
    fs.readdir(path, |name| {
        names.push(name.to_string());
        true
    })
    .expect("readdir");
    names.sort();
    names
}

/// Creates a file and writes `data` into it in one call.
pub fn put_file(fs: &mut Fs5600, path: &str, mode: u32, data: &[u8]) {
    fs.create(path, mode).expect("create");
    assert_eq!(fs.write(path, data, 0).expect("write"), data.len());
}

/// Blocks a file of `len` bytes occupies, counting the indirect block
/// when the file spills past the direct slots.
pub fn blocks_for(len: usize) -> u32 {
    let data = (len + BSIZE - 1) / BSIZE;
    let indirect = if data > 2 { 1 } else { 0 };
    (data + indirect) as u32
}
