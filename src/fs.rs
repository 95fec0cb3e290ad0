//! Filesystem access injected into transformers and completers.
//!
//! Working-directory lookups and path resolution go through [`Filesystem`] so
//! tests can swap in a fixed tree instead of touching the process state.

use std::io;
use std::path::{Component, Path, PathBuf};

/// One directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Minimal filesystem surface used by the engine.
pub trait Filesystem {
    fn current_dir(&self) -> io::Result<PathBuf>;

    /// Entries of `path`, in no particular order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Resolve `path` against the current directory and clean `.`/`..`.
    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        if path.is_absolute() {
            return Ok(normalize(path));
        }
        Ok(normalize(&self.current_dir()?.join(path)))
    }
}

/// The real filesystem of this process.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            // Follow symlinks so linked directories complete like directories.
            let is_dir = std::fs::metadata(entry.path())
                .map(|m| m.is_dir())
                .unwrap_or(false);
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        Ok(entries)
    }
}

/// Lexically clean a path: drop `.` and fold `..` into its parent.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCwd;

    impl Filesystem for FixedCwd {
        fn current_dir(&self) -> io::Result<PathBuf> {
            Ok(PathBuf::from("/home/user/src"))
        }

        fn read_dir(&self, _path: &Path) -> io::Result<Vec<DirEntry>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_absolute_joins_current_dir() {
        let fs = FixedCwd;
        assert_eq!(
            fs.absolute(Path::new("../docs/./a.md")).unwrap(),
            PathBuf::from("/home/user/docs/a.md")
        );
        assert_eq!(
            fs.absolute(Path::new("/tmp/../etc")).unwrap(),
            PathBuf::from("/etc")
        );
    }

    #[test]
    fn test_os_filesystem_lists_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("file.txt"), "x").unwrap();

        let mut entries = OsFilesystem.read_dir(dir.path()).unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            entries,
            vec![DirEntry::file("file.txt"), DirEntry::dir("sub")]
        );
    }
}
