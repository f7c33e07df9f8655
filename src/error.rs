//! Error type shared by every file-system operation.
//!
//! The mount bridge speaks POSIX: every operation returns either a
//! non-negative count or a negative errno. `FsError` is the typed side
//! of that contract; `errno` produces the value handed back to the
//! bridge.

use std::io;

use libc::c_int;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    /// A path component (or the target itself) does not exist.
    #[error("no such file or directory")]
    NotFound,

    /// A non-final path component, or an operation target that must be
    /// a directory, is a regular file.
    #[error("not a directory")]
    NotADirectory,

    /// A file operation was aimed at a directory.
    #[error("is a directory")]
    IsADirectory,

    /// Create-time collision: the leaf already exists.
    #[error("file exists")]
    AlreadyExists,

    /// Malformed request (non-zero truncate length, cross-directory
    /// rename, write past end-of-file, bad superblock, ...).
    #[error("invalid argument")]
    InvalidArgument,

    /// rmdir on a directory that still has entries.
    #[error("directory not empty")]
    NotEmpty,

    /// The free-block bitmap or the inode table is exhausted.
    #[error("no space left on device")]
    NoSpace,

    /// The block device failed underneath us.
    #[error("block device error: {0}")]
    Io(#[from] io::Error),
}

impl FsError {
    /// The negative errno for the operation-vector bridge.
    pub fn errno(&self) -> c_int {
        let e = match self {
            FsError::NotFound => libc::ENOENT,
            FsError::NotADirectory => libc::ENOTDIR,
            FsError::IsADirectory => libc::EISDIR,
            FsError::AlreadyExists => libc::EEXIST,
            FsError::InvalidArgument => libc::EINVAL,
            FsError::NotEmpty => libc::ENOTEMPTY,
            FsError::NoSpace => libc::ENOSPC,
            FsError::Io(_) => libc::EIO,
        };
        -e
    }
}
