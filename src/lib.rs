//! fs5600: a POSIX-style user-space file system over a fixed-size
//! block-device image.
//!
//! The image is a flat array of 4096-byte blocks: a superblock, a
//! free-block bitmap, an inode table, and data blocks. Files are
//! addressed through a two-level block map (direct slots plus one
//! indirect block); directories are fixed-width entry tables. The
//! thirteen externally visible operations live on [`Fs5600`] and
//! return [`FsError`], whose [`FsError::errno`] value follows the
//! negative-errno convention the mount bridge expects.
//!
//! ```no_run
//! use fs5600::{BlockDevice, Fs5600};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dev = BlockDevice::open("test.img")?;
//! let mut fs = Fs5600::mount(dev)?;
//! let st = fs.getattr("/")?;
//! assert!(st.is_dir());
//! # Ok(())
//! # }
//! ```

mod bitmap;
mod block;
mod dir;
mod error;
mod fs;
mod inode;
mod mkfs;
mod param;
mod path;
mod stat;
mod superblock;

pub use block::BlockDevice;
pub use error::FsError;
pub use fs::{Fs5600, Ident};
pub use mkfs::mkfs;
pub use param::{BSIZE, DIRSIZ};
pub use stat::{Stat, StatVfs};
