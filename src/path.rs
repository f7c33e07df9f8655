//! Path resolution.
//!
//! Paths are absolute, `/`-separated byte strings. Resolution always
//! starts at the root inode and walks one directory at a time; nothing
//! is cached across operations.

use std::cmp;

use crate::error::FsError;
use crate::fs::Fs5600;
use crate::param::{DIRSIZ, ROOTINO};

/// One path component, truncated to at most `DIRSIZ` bytes.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct FileName<'s> {
    inner: &'s [u8],
}

impl<'s> FileName<'s> {
    /// Keeps the first `DIRSIZ` bytes and silently drops the rest, so
    /// an over-long leaf resolves to the entry its truncation created.
    pub fn new(bytes: &'s [u8]) -> Self {
        Self {
            inner: &bytes[..cmp::min(DIRSIZ, bytes.len())],
        }
    }

    pub fn as_bytes(&self) -> &'s [u8] {
        self.inner
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Path<'s> {
    inner: &'s [u8],
}

impl<'s> Path<'s> {
    pub fn new(path: &'s str) -> Self {
        Self {
            inner: path.as_bytes(),
        }
    }

    /// Returns `Some((path, name))` where,
    ///  - `name` is the next path element from `self`, and
    ///  - `path` is the remaining path.
    ///
    /// The returned path has no leading slashes, so the caller can check
    /// `path.is_empty()` to see if the name is the last one.
    ///
    /// If there is no name to remove, returns `None`.
    pub fn skipelem(&self) -> Option<(Path<'s>, FileName<'s>)> {
        let mut bytes = self.inner;

        let name_start = bytes.iter().position(|ch| *ch != b'/')?;
        bytes = &bytes[name_start..];

        let len = bytes
            .iter()
            .position(|ch| *ch == b'/')
            .unwrap_or(bytes.len());

        let name = FileName::new(&bytes[..len]);

        bytes = &bytes[len..];

        let next_start = bytes
            .iter()
            .position(|ch| *ch != b'/')
            .unwrap_or(bytes.len());

        Some((
            Path {
                inner: &bytes[next_start..],
            },
            name,
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Fs5600 {
    /// Resolves `path` to its inode number.
    pub(crate) fn namei(&mut self, path: Path<'_>) -> Result<u32, FsError> {
        Ok(self.namex(path, false)?.0)
    }

    /// Resolves `path` to its parent directory's inode number plus the
    /// leaf name, tolerating a missing leaf. The bare root has no
    /// parent.
    pub(crate) fn nameiparent<'s>(
        &mut self,
        path: Path<'s>,
    ) -> Result<(u32, FileName<'s>), FsError> {
        let (ino, name) = self.namex(path, true)?;
        Ok((ino, name.ok_or(FsError::InvalidArgument)?))
    }

    fn namex<'s>(
        &mut self,
        mut path: Path<'s>,
        parent: bool,
    ) -> Result<(u32, Option<FileName<'s>>), FsError> {
        let mut ino = ROOTINO;

        while let Some((rest, name)) = path.skipelem() {
            let dp = self.inode_load(ino)?;
            if !dp.is_dir() {
                return Err(FsError::NotADirectory);
            }
            if parent && rest.is_empty() {
                // Stop one level early.
                return Ok((ino, Some(name)));
            }
            ino = self
                .dirlookup(&dp, &name)?
                .ok_or(FsError::NotFound)?
                .0;
            path = rest;
        }
        if parent {
            return Err(FsError::InvalidArgument);
        }
        Ok((ino, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(path: &'static str) -> Vec<(&'static [u8], bool)> {
        let mut out = Vec::new();
        let mut p = Path::new(path);
        while let Some((rest, name)) = p.skipelem() {
            out.push((name.as_bytes(), rest.is_empty()));
            p = rest;
        }
        out
    }

    #[test]
    fn skipelem_splits_components() {
        assert_eq!(
            parts("/a/bb/c"),
            vec![(&b"a"[..], false), (&b"bb"[..], false), (&b"c"[..], true)]
        );
        assert_eq!(
            parts("///a//bb"),
            vec![(&b"a"[..], false), (&b"bb"[..], true)]
        );
        assert_eq!(parts("/a"), vec![(&b"a"[..], true)]);
    }

    #[test]
    fn skipelem_exhausts_bare_root() {
        assert!(Path::new("/").skipelem().is_none());
        assert!(Path::new("////").skipelem().is_none());
        assert!(Path::new("").skipelem().is_none());
    }

    #[test]
    fn file_name_truncates() {
        let long = "veryylongggfileeenameeeetesttttpurpose";
        let name = FileName::new(long.as_bytes());
        assert_eq!(name.as_bytes(), b"veryylongggfileeenameeeetes");
        assert_eq!(name.as_bytes().len(), DIRSIZ);
    }
}
