//! Filesystem access used by staging and requirements loading.
//!
//! `OsFileSystem` talks to the real disk. `MemoryFileSystem` keeps files
//! and directories in a map so the installer can be exercised without
//! touching the host. Both follow the same rules: `create_dir` is not
//! recursive, and `copy` overwrites an existing destination.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Operations the installer needs from a filesystem.
pub trait FileSystem {
    /// True if `path` exists and is a regular file
    fn is_file(&self, path: &Path) -> bool;

    /// True if `path` exists and is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Create a single directory. The parent must already exist.
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Copy `from` to `to`, replacing `to` if present. Returns bytes copied.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;

    /// Read a whole file as UTF-8
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn is_file(&self, path: &Path) -> bool {
        (**self).is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        (**self).is_dir(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        (**self).create_dir(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        (**self).copy(from, to)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }
}

/// The host filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        std::fs::copy(from, to)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    files: HashMap<PathBuf, Vec<u8>>,
    dirs: HashSet<PathBuf>,
}

impl MemoryState {
    fn parent_exists(&self, path: &Path) -> bool {
        match path.parent() {
            None => true,
            Some(p) if p.as_os_str().is_empty() => true,
            Some(p) => self.dirs.contains(p),
        }
    }

    fn add_ancestors(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if !ancestor.as_os_str().is_empty() {
                self.dirs.insert(ancestor.to_path_buf());
            }
        }
    }
}

/// In-memory filesystem
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    state: Mutex<MemoryState>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory and all of its ancestors
    pub fn with_dir(self, path: impl AsRef<Path>) -> Self {
        {
            let mut state = self.lock();
            let path = path.as_ref();
            state.add_ancestors(path);
            state.dirs.insert(path.to_path_buf());
        }
        self
    }

    /// Add a file, creating its ancestor directories
    pub fn with_file(self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        {
            let mut state = self.lock();
            let path = path.as_ref();
            state.add_ancestors(path);
            state.files.insert(path.to_path_buf(), contents.into());
        }
        self
    }

    /// Contents of a file, if present
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.lock().files.get(path.as_ref()).cloned()
    }

    /// Number of files currently stored
    pub fn file_count(&self) -> usize {
        self.lock().files.len()
    }

    /// Number of directories currently stored
    pub fn dir_count(&self) -> usize {
        self.lock().dirs.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A panic while holding the lock leaves the maps intact
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FileSystem for MemoryFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        self.lock().files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.lock().dirs.contains(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        if state.dirs.contains(path) || state.files.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            ));
        }
        if !state.parent_exists(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("parent of {} does not exist", path.display()),
            ));
        }
        state.dirs.insert(path.to_path_buf());
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        let mut state = self.lock();
        let data = state.files.get(from).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", from.display()),
            )
        })?;
        if !state.parent_exists(to) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("parent of {} does not exist", to.display()),
            ));
        }
        if state.dirs.contains(to) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is a directory", to.display()),
            ));
        }
        let len = data.len() as u64;
        state.files.insert(to.to_path_buf(), data);
        Ok(len)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let state = self.lock();
        let data = state.files.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )
        })?;
        String::from_utf8(data.clone()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_create_dir_requires_parent() {
        let fs = MemoryFileSystem::new().with_dir("/work");
        let err = fs.create_dir(Path::new("/work/pkg/data")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        fs.create_dir(Path::new("/work/pkg")).unwrap();
        fs.create_dir(Path::new("/work/pkg/data")).unwrap();
        assert!(fs.is_dir(Path::new("/work/pkg/data")));
    }

    #[test]
    fn test_memory_with_file_creates_ancestors() {
        let fs = MemoryFileSystem::new().with_file("/work/a/b.txt", "hi");
        assert!(fs.is_dir(Path::new("/work/a")));
        assert!(fs.is_dir(Path::new("/work")));
        assert!(fs.is_file(Path::new("/work/a/b.txt")));
        assert!(!fs.is_file(Path::new("/work/a")));
    }

    #[test]
    fn test_memory_copy_overwrites() {
        let fs = MemoryFileSystem::new()
            .with_file("/src.db", vec![1, 2, 3])
            .with_file("/dst.db", vec![9; 10]);

        let n = fs.copy(Path::new("/src.db"), Path::new("/dst.db")).unwrap();
        assert_eq!(n, 3);
        assert_eq!(fs.contents("/dst.db"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_memory_copy_missing_source() {
        let fs = MemoryFileSystem::new().with_dir("/out");
        let err = fs.copy(Path::new("/nope"), Path::new("/out/x")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(fs.file_count(), 0);
    }

    #[test]
    fn test_memory_read_to_string() {
        let fs = MemoryFileSystem::new().with_file("/r.txt", "numpy\npandas\n");
        assert_eq!(fs.read_to_string(Path::new("/r.txt")).unwrap(), "numpy\npandas\n");
        assert!(fs.read_to_string(Path::new("/missing.txt")).is_err());
    }

    #[test]
    fn test_os_create_dir_is_not_recursive() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        assert!(OsFileSystem.create_dir(&nested).is_err());

        OsFileSystem.create_dir(&dir.path().join("a")).unwrap();
        OsFileSystem.create_dir(&nested).unwrap();
        assert!(OsFileSystem.is_dir(&nested));
    }
}
